//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the BankingApi port
//! - JSON file and in-memory stores for the SessionStorage port

pub mod file_session;
pub mod http;
pub mod memory_session;

#[cfg(test)]
pub mod mock_bank;
