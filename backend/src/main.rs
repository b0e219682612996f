//! Backend entry-point: loads settings, prepares adapters and serves the API.

mod server;

use std::io;

use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use carbontrack::inbound::http::health::HealthState;
use carbontrack::outbound::persistence::{DbPool, run_migrations};
use server::{ServerConfig, ServerSettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load()
        .map_err(|err| io::Error::other(format!("failed to load configuration: {err}")))?;
    let config = build_config(&settings).await?;
    let bind_addr = config.bind_addr;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "carbontrack listening");
    let result = server.await;
    health_state.mark_unhealthy();
    result
}

async fn build_config(settings: &ServerSettings) -> io::Result<ServerConfig> {
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let policy = settings.allocation_policy().map_err(io::Error::other)?;
    let mut config = ServerConfig::new(bind_addr).with_allocation_policy(policy);
    info!(%policy, "offset allocation policy selected");

    match settings.pool_config().map_err(io::Error::other)? {
        Some(pool_config) => {
            if settings.run_migrations() {
                let url = pool_config.database_url().to_owned();
                let applied = web::block(move || run_migrations(&url))
                    .await
                    .map_err(|err| io::Error::other(err.to_string()))?
                    .map_err(io::Error::other)?;
                info!(applied, "database migrations complete");
            }
            let max_size = pool_config.max_size();
            let pool = DbPool::new(pool_config).await.map_err(io::Error::other)?;
            info!(max_size, "database pool ready");
            config = config.with_db_pool(pool);
        }
        None => warn!("no database_url configured; using the in-memory store"),
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(make_metrics()?));
    }

    Ok(config)
}

#[cfg(feature = "metrics")]
fn make_metrics() -> io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("carbontrack")
        .endpoint("/metrics")
        .build()
        .map_err(|err| io::Error::other(format!("configure Prometheus metrics: {err}")))
}
