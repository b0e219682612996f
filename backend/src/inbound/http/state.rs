//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see the driving ports,
//! so they stay testable with mocks or the in-memory adapters.

use std::sync::Arc;

use crate::domain::ports::{OffsetRegistry, ProductCatalogue, UserDirectory};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserDirectory>,
    pub products: Arc<dyn ProductCatalogue>,
    pub offsets: Arc<dyn OffsetRegistry>,
}

impl HttpState {
    /// Bundle the driving ports.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        products: Arc<dyn ProductCatalogue>,
        offsets: Arc<dyn OffsetRegistry>,
    ) -> Self {
        Self {
            users,
            products,
            offsets,
        }
    }
}
