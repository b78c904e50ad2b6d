//! Banklify Core - client library for the Banklify retail banking API
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: Session, balance, transactions, transfer and registration forms
//! - **ports**: Trait definitions for external dependencies (BankingApi, SessionStorage)
//! - **services**: Session store, dashboard, transfer, routing, error boundary
//! - **adapters**: Concrete implementations (reqwest client, session file)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::file_session::FileSessionStorage;
use adapters::http::HttpBankingApi;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, ErrorKind, OperationResult};
pub use domain::{
    Balance, BearerToken, LoginCredentials, RegistrationForm, Session, TransactionRecord,
    TransferForm, TransferReceipt,
};
pub use ports::BankingApi;

/// Lock file serializing transfer submissions across processes
pub const TRANSFER_LOCK_FILENAME: &str = "transfer.lock";

/// Main context for Banklify operations
///
/// Owns the session store and the HTTP client, and wires the services
/// around them. One context per process.
pub struct BanklifyContext {
    pub config: Config,
    pub banklify_dir: PathBuf,
    pub session_store: Arc<SessionStore>,
    pub api: Arc<HttpBankingApi>,
    pub dashboard_service: DashboardService,
    pub transfer_service: TransferService,
    pub boundary: ErrorBoundary,
}

impl BanklifyContext {
    /// Create a context from the settings in `banklify_dir`
    pub fn new(banklify_dir: &Path) -> Result<Self> {
        let config = Config::load(banklify_dir)?;
        Self::with_config(banklify_dir, config)
    }

    pub fn with_config(banklify_dir: &Path, config: Config) -> Result<Self> {
        std::fs::create_dir_all(banklify_dir)?;

        let storage = Arc::new(FileSessionStorage::new(banklify_dir));
        let session_store = Arc::new(SessionStore::open(storage)?);

        // the client reads the credential from the store on every request
        let api = Arc::new(HttpBankingApi::new(&config, session_store.subscribe())?);

        let transfer_service = TransferService::new(SubmitGate::with_lock_file(
            banklify_dir.join(TRANSFER_LOCK_FILENAME),
        ));
        let boundary = ErrorBoundary::new(Arc::clone(&session_store));

        Ok(Self {
            config,
            banklify_dir: banklify_dir.to_path_buf(),
            session_store,
            api,
            dashboard_service: DashboardService::new(),
            transfer_service,
            boundary,
        })
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.session_store.current()
    }

    pub fn api(&self) -> &dyn BankingApi {
        self.api.as_ref()
    }
}
