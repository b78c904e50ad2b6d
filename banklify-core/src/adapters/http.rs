//! Banklify REST API client
//!
//! Every request goes through [`HttpBankingApi::send`], which:
//! - attaches `Authorization: Bearer <token>` when the session holds one
//! - tags the request with an `X-Request-Id`
//! - races the request against the caller's [`CancelToken`]
//! - maps 401/403 to [`Error::Unauthorized`] and every other non-2xx status
//!   to [`Error::Backend`] carrying the backend's `error` message
//!
//! Nothing here clears the session or navigates; that is the error
//! boundary's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{
    Balance, LoginCredentials, LoginResponse, RegisterRequest, TransactionRecord, TransferReceipt,
    TransferRequest,
};
use crate::ports::BankingApi;
use crate::services::cancel::CancelToken;
use crate::services::session::SessionWatch;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

pub const NETWORK_TIMEOUT: &str = "il server non ha risposto in tempo";
pub const NETWORK_UNREACHABLE: &str = "impossibile contattare il server";
pub const NETWORK_INTERRUPTED: &str = "risposta del server interrotta";
pub const NETWORK_FAILED: &str = "richiesta non riuscita";

/// Every message an [`Error::Network`] built here can carry
pub const NETWORK_MESSAGES: [&str; 4] = [
    NETWORK_TIMEOUT,
    NETWORK_UNREACHABLE,
    NETWORK_INTERRUPTED,
    NETWORK_FAILED,
];

const GENERIC_BACKEND_ERROR: &str =
    "Si è verificato un errore del server senza messaggio specifico.";

/// Error body returned by the backend on failures
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Whether a request carries the session credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Anonymous,
    Bearer,
}

/// HTTP implementation of [`BankingApi`]
#[derive(Debug)]
pub struct HttpBankingApi {
    client: Client,
    base_url: Url,
    session: SessionWatch,
}

impl HttpBankingApi {
    /// Create a client for the configured backend
    pub fn new(config: &Config, session: SessionWatch) -> Result<Self> {
        Self::new_with_base_url(&config.api_base_url, config.timeout, session)
    }

    /// Create a client for an explicit base URL (tests, `--api-url`)
    pub fn new_with_base_url(base_url: &str, timeout: Duration, session: SessionWatch) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("API base URL '{}' cannot be a base", base_url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("banklify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Build `<base>/<segments...>`, escaping each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::Config("API base URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, auth: Auth) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if auth == Auth::Bearer {
            if let Some(header) = self.session.credential_header() {
                builder = builder.header(AUTHORIZATION, header);
            }
        }
        builder
    }

    /// Send and classify the response status
    async fn send(&self, builder: RequestBuilder, cancel: &CancelToken) -> Result<Response> {
        let response = cancel
            .run(async { builder.send().await.map_err(Self::map_request_error) })
            .await?;
        self.check_response_status(response, cancel).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response, cancel: &CancelToken) -> Result<T> {
        let status = response.status().as_u16();
        cancel
            .run(async {
                response.json::<T>().await.map_err(|e| Error::Backend {
                    status,
                    message: format!("Risposta del server non valida: {}", e),
                })
            })
            .await
    }

    /// Map request errors to a fixed message per failure class.
    ///
    /// reqwest's own text embeds the request URL, which carries the IBAN,
    /// so it never reaches the error (and from there the event log).
    fn map_request_error(error: reqwest::Error) -> Error {
        let error = error.without_url();
        let message = if error.is_timeout() {
            NETWORK_TIMEOUT
        } else if error.is_connect() {
            NETWORK_UNREACHABLE
        } else if error.is_body() || error.is_decode() {
            NETWORK_INTERRUPTED
        } else {
            NETWORK_FAILED
        };
        Error::network(message)
    }

    /// Check response status and return appropriate errors
    async fn check_response_status(&self, response: Response, cancel: &CancelToken) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized {
                status: status.as_u16(),
            });
        }

        let body = cancel
            .run(async { Ok(response.text().await.unwrap_or_default()) })
            .await?;
        Err(Error::Backend {
            status: status.as_u16(),
            message: backend_message(&body),
        })
    }
}

/// Extract the human message from an error body
pub fn backend_message(body: &str) -> String {
    serde_json::from_str::<BackendErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_BACKEND_ERROR.to_string())
}

#[async_trait]
impl BankingApi for HttpBankingApi {
    async fn login(
        &self,
        credentials: &LoginCredentials,
        cancel: &CancelToken,
    ) -> Result<LoginResponse> {
        let url = self.endpoint(&["auth", "login"])?;
        let response = self
            .send(self.request(Method::POST, url, Auth::Anonymous).json(credentials), cancel)
            .await?;
        Self::read_json(response, cancel).await
    }

    async fn register(&self, request: &RegisterRequest, cancel: &CancelToken) -> Result<()> {
        let url = self.endpoint(&["auth", "register"])?;
        self.send(self.request(Method::POST, url, Auth::Anonymous).json(request), cancel)
            .await?;
        Ok(())
    }

    async fn balance(&self, iban: &str, cancel: &CancelToken) -> Result<Balance> {
        let url = self.endpoint(&["accounts", iban, "balance"])?;
        let response = self
            .send(self.request(Method::GET, url, Auth::Bearer), cancel)
            .await?;
        Self::read_json(response, cancel).await
    }

    async fn transactions(
        &self,
        iban: &str,
        limit: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<TransactionRecord>> {
        let mut url = self.endpoint(&["accounts", iban, "movimenti"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let response = self
            .send(self.request(Method::GET, url, Auth::Bearer), cancel)
            .await?;
        Self::read_json(response, cancel).await
    }

    async fn transfer(
        &self,
        request: &TransferRequest,
        cancel: &CancelToken,
    ) -> Result<TransferReceipt> {
        let url = self.endpoint(&["transactions", "transfer"])?;
        let response = self
            .send(self.request(Method::POST, url, Auth::Bearer).json(request), cancel)
            .await?;

        // the receipt body is optional; an empty or non-JSON 2xx still succeeded
        let body = cancel
            .run(async { Ok(response.text().await.unwrap_or_default()) })
            .await?;
        Ok(serde_json::from_str(&body).unwrap_or(TransferReceipt { message: None }))
    }
}
