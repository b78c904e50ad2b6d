//! Session domain model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque bearer credential issued by `/auth/login`
///
/// `Debug` is redacted so the token never ends up in logs or panics.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Current authentication state
///
/// Persisted as `session.json` in the data directory. Created on login,
/// cleared on logout or when the backend rejects the credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, rename = "token")]
    pub credential: Option<BearerToken>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build an authenticated session from a login response
    pub fn authenticated(
        credential: BearerToken,
        iban: impl Into<String>,
        first_name: Option<String>,
    ) -> Self {
        Self {
            credential: Some(credential),
            iban: Some(iban.into()),
            first_name,
            created_at: Some(Utc::now()),
        }
    }

    /// A session is usable only when both the credential and the account are known
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some() && self.iban.as_deref().is_some_and(|i| !i.is_empty())
    }

    pub fn iban(&self) -> Option<&str> {
        self.iban.as_deref()
    }

    /// Greeting name, falling back to a neutral label
    pub fn display_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or("Cliente")
    }
}
