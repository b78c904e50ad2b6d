//! Banking backend port
//!
//! The services talk to the backend only through this trait. The HTTP
//! adapter is the production implementation; tests substitute fakes.

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{
    Balance, LoginCredentials, LoginResponse, RegisterRequest, TransactionRecord, TransferReceipt,
    TransferRequest,
};
use crate::services::cancel::CancelToken;

/// Remote banking API
///
/// Authenticated calls report a rejected credential as
/// `Error::Unauthorized`; deciding what to do about it belongs to the
/// caller's error boundary, never to the implementation.
#[async_trait]
pub trait BankingApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, credentials: &LoginCredentials, cancel: &CancelToken)
        -> Result<LoginResponse>;

    /// `POST /auth/register`
    async fn register(&self, request: &RegisterRequest, cancel: &CancelToken) -> Result<()>;

    /// `GET /accounts/{iban}/balance`
    async fn balance(&self, iban: &str, cancel: &CancelToken) -> Result<Balance>;

    /// `GET /accounts/{iban}/movimenti?limit=N`
    async fn transactions(
        &self,
        iban: &str,
        limit: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<TransactionRecord>>;

    /// `POST /transactions/transfer`
    async fn transfer(&self, request: &TransferRequest, cancel: &CancelToken)
        -> Result<TransferReceipt>;
}
