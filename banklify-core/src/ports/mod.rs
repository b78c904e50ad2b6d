//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, not on concrete implementations.

mod banking_api;
mod session_storage;

pub use banking_api::BankingApi;
pub use session_storage::SessionStorage;
