//! Builders for the HTTP state: adapter selection and service wiring.

use std::sync::Arc;

use actix_web::web;

use carbontrack::domain::emissions::EmissionsEstimator;
use carbontrack::domain::offsets::OffsetAllocator;
use carbontrack::domain::ports::{
    AllocationMetrics, NoOpAllocationMetrics, OffsetRepository, ProductRepository, UserRepository,
};
use carbontrack::domain::{OffsetService, ProductService, UserService};
use carbontrack::inbound::http::state::HttpState;
use carbontrack::outbound::memory::InMemoryStore;
#[cfg(feature = "metrics")]
use carbontrack::outbound::metrics::PrometheusAllocationMetrics;
use carbontrack::outbound::persistence::{
    DieselOffsetRepository, DieselProductRepository, DieselUserRepository,
};

use super::ServerConfig;

/// Wrap the three repositories in domain services and expose them as
/// driving ports.
fn wire_services<U, P, O, M>(
    users: Arc<U>,
    products: Arc<P>,
    offsets: Arc<O>,
    metrics: Arc<M>,
    allocator: OffsetAllocator,
) -> HttpState
where
    U: UserRepository + 'static,
    P: ProductRepository + 'static,
    O: OffsetRepository + 'static,
    M: AllocationMetrics + 'static,
{
    let estimator = Arc::new(EmissionsEstimator::default());
    HttpState::new(
        Arc::new(UserService::new(Arc::clone(&users), Arc::clone(&products))),
        Arc::new(ProductService::new(
            Arc::clone(&products),
            users,
            estimator,
        )),
        Arc::new(OffsetService::new(offsets, products, metrics, allocator)),
    )
}

/// Select Diesel adapters when a pool is configured, otherwise a fresh
/// in-memory store shared by all three repositories.
fn build_with_metrics<M>(config: &ServerConfig, metrics: Arc<M>) -> HttpState
where
    M: AllocationMetrics + 'static,
{
    let allocator = OffsetAllocator::new(config.allocation_policy);
    match &config.db_pool {
        Some(pool) => wire_services(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselProductRepository::new(pool.clone())),
            Arc::new(DieselOffsetRepository::new(pool.clone())),
            metrics,
            allocator,
        ),
        None => {
            let store = Arc::new(InMemoryStore::new());
            wire_services(
                Arc::clone(&store),
                Arc::clone(&store),
                store,
                metrics,
                allocator,
            )
        }
    }
}

/// Build the shared HTTP state.
///
/// With the `metrics` feature and a Prometheus registry available,
/// allocation outcomes are exported; otherwise a no-op recorder is used.
///
/// # Errors
///
/// Returns [`std::io::Error`] if Prometheus metric registration fails.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    #[cfg(feature = "metrics")]
    if let Some(prometheus) = &config.prometheus {
        let metrics = PrometheusAllocationMetrics::new(&prometheus.registry).map_err(|err| {
            std::io::Error::other(format!("allocation metrics registration failed: {err}"))
        })?;
        return Ok(web::Data::new(build_with_metrics(config, Arc::new(metrics))));
    }

    Ok(web::Data::new(build_with_metrics(
        config,
        Arc::new(NoOpAllocationMetrics),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbontrack::domain::offsets::{AllocationPolicy, NewOffset, NewOffsetFields};
    use carbontrack::domain::{CarbonMass, NewUser};
    use rstest::rstest;

    fn config(policy: AllocationPolicy) -> ServerConfig {
        ServerConfig::new("127.0.0.1:0".parse().expect("addr")).with_allocation_policy(policy)
    }

    #[rstest]
    #[tokio::test]
    async fn missing_pool_selects_a_shared_in_memory_store() {
        let state = build_http_state(&config(AllocationPolicy::OldestFirst)).expect("state");

        let user = state
            .users
            .register(NewUser::try_from_parts("ada@example.com", "Ada").expect("user"))
            .await
            .expect("registered");
        let listed = state.users.list().await.expect("listed");
        assert_eq!(listed, vec![user.clone()]);

        let products = state
            .users
            .list_products(user.id())
            .await
            .expect("products");
        assert!(products.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn each_build_starts_from_an_empty_store() {
        let config = config(AllocationPolicy::CheapestFirst);
        let first = build_http_state(&config).expect("first");
        first
            .offsets
            .register(
                NewOffset::try_from_fields(NewOffsetFields {
                    project_name: "Peatland restoration",
                    description: "",
                    location: None,
                    source_url: "https://registry.example.org/p/1",
                    price_per_tonne_cents: 1500,
                    tonnes: CarbonMass::from_whole_tonnes(10),
                })
                .expect("offset"),
            )
            .await
            .expect("registered");

        let second = build_http_state(&config).expect("second");
        assert!(second.offsets.list(false).await.expect("listed").is_empty());
    }
}
