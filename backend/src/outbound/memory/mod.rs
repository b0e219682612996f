//! In-process adapters for the driven repository ports.
//!
//! Used when no database URL is configured and by the HTTP integration
//! tests. Behaviour mirrors the PostgreSQL adapters: emails are unique,
//! products require an existing owner, and allocation is atomic.

mod store;

pub use store::InMemoryStore;
