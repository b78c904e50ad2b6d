//! Core domain entities
//!
//! Pure data structures with their client-side validation rules - no I/O.

mod auth;
mod balance;
pub mod money;
pub mod result;
mod session;
pub mod transaction;
pub mod transfer;

pub use auth::{LoginCredentials, LoginResponse, RegisterRequest, RegistrationForm, MIN_PASSWORD_LEN};
pub use balance::Balance;
pub use session::{BearerToken, Session};
pub use transaction::TransactionRecord;
pub use transfer::{TransferForm, TransferReceipt, TransferRequest};
