//! Shared harness for HTTP tests against the in-memory adapters.

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use carbontrack::Trace;
use carbontrack::domain::emissions::EmissionsEstimator;
use carbontrack::domain::offsets::{AllocationPolicy, OffsetAllocator};
use carbontrack::domain::ports::NoOpAllocationMetrics;
use carbontrack::domain::{OffsetService, ProductService, UserService};
use carbontrack::inbound::http::routes::configure_api;
use carbontrack::inbound::http::state::HttpState;
use carbontrack::outbound::memory::InMemoryStore;
use serde_json::Value;

/// Services over one fresh store, allocating with `policy`.
pub fn http_state(policy: AllocationPolicy) -> HttpState {
    let store = Arc::new(InMemoryStore::new());
    HttpState::new(
        Arc::new(UserService::new(Arc::clone(&store), Arc::clone(&store))),
        Arc::new(ProductService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::new(EmissionsEstimator::default()),
        )),
        Arc::new(OffsetService::new(
            Arc::clone(&store),
            store,
            Arc::new(NoOpAllocationMetrics),
            OffsetAllocator::new(policy),
        )),
    )
}

/// The API scope wrapped in the trace middleware, as the server mounts it.
pub async fn init_app(
    state: HttpState,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(Trace)
            .configure(configure_api),
    )
    .await
}

/// Send `req` and decode the JSON body, `Null` when empty.
pub async fn send<S>(app: &S, req: TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}
