//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// User-facing variants carry Italian messages, matching the product locale.
/// `Display` output is what the views show in their single error slot.
#[derive(Error, Debug)]
pub enum Error {
    /// No response from the backend (timeout, refused connection, DNS...)
    #[error("Errore di rete: {0}")]
    Network(String),

    /// Structured error body returned by the backend
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// 401/403 from the backend; the error boundary forces a logout
    #[error("Sessione scaduta o non autorizzata (HTTP {status}). Effettua di nuovo l'accesso.")]
    Unauthorized { status: u16 },

    #[error("Sessione non attiva. Effettua l'accesso.")]
    SessionRequired,

    #[error("Credenziali non valide.")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("Fondi insufficienti: saldo disponibile {available}.")]
    InsufficientFunds { available: String },

    #[error("Un'operazione è già in corso, attendi il completamento.")]
    InFlight,

    #[error("Operazione annullata.")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by the error boundary and the event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Backend,
    Unauthorized,
    Validation,
    Conflict,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Backend => "backend",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::Backend { .. } => ErrorKind::Backend,
            Error::Unauthorized { .. } | Error::SessionRequired => ErrorKind::Unauthorized,
            Error::InvalidCredentials
            | Error::Validation(_)
            | Error::InsufficientFunds { .. } => ErrorKind::Validation,
            Error::InFlight => ErrorKind::Conflict,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Config(_) | Error::Storage(_) | Error::Io(_) | Error::Json(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP status attached to the error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Backend { status, .. } | Error::Unauthorized { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error means the session is no longer usable
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for `--json` output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            context: None,
        }
    }

    /// Attach a context value
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(&e),
        }
    }
}
