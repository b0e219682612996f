//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! Every context gets its own temporary database on the process-wide shared
//! cluster, migrated with the same embedded migrations the server runs at
//! startup. Set `SKIP_TEST_CLUSTER=1` where the cluster cannot start.

use std::time::Duration;

use carbontrack::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;

const CLUSTER_RETRIES: usize = 5;
const CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Migrated temporary database plus a pool and a runtime to drive it.
pub struct PgContext {
    pub runtime: Runtime,
    pub pool: DbPool,
    _database: TemporaryDatabase,
}

fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) if attempt >= CLUSTER_RETRIES => return Err(err.to_string()),
            Err(_) => {
                std::thread::sleep(CLUSTER_RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

fn setup(max_connections: u32) -> Result<PgContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let database = shared_cluster()?
        .create_temporary_database()
        .map_err(|err| format!("create database: {err:?}"))?;
    let url = database.url().to_owned();
    run_migrations(&url).map_err(|err| err.to_string())?;

    let config = PoolConfig::new(url)
        .with_max_size(max_connections)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(PgContext {
        runtime,
        pool,
        _database: database,
    })
}

/// Whether `SKIP_TEST_CLUSTER` is set to `1`, `true` or `yes`.
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Provision a context, or `None` when the cluster is unavailable and
/// skipping is allowed. Panics otherwise so CI failures stay visible.
#[expect(clippy::print_stderr, reason = "skip marker for test logs")]
pub fn pg_context(max_connections: u32) -> Option<PgContext> {
    match setup(max_connections) {
        Ok(context) => Some(context),
        Err(reason) if should_skip_test_cluster() => {
            eprintln!("SKIP-TEST-CLUSTER: {reason}");
            None
        }
        Err(reason) => {
            panic!("test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.")
        }
    }
}
