//! Mock Banklify backend for testing
//!
//! A small blocking HTTP server that answers the REST endpoints under
//! `/api/v1`:
//! - POST /auth/login returns { token, accountIdentifier, firstName }
//! - POST /auth/register returns 201 with an empty body
//! - GET /accounts/{iban}/balance returns { iban, ledgerBalance, availableBalance }
//! - GET /accounts/{iban}/movimenti?limit=N returns up to N movements, oldest first
//! - POST /transactions/transfer returns { message }
//!
//! Every request is recorded so tests can assert on headers and bodies.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

pub const MOCK_EMAIL: &str = "a@b.it";
pub const MOCK_PASSWORD: &str = "secret1";
pub const MOCK_TOKEN: &str = "t1";
pub const MOCK_IBAN: &str = "IT60X0542811101000000123456";

const API_PREFIX: &str = "/api/v1";

/// Mock backend for testing
pub struct MockBankServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for the simulated backend
#[derive(Debug, Clone)]
pub struct MockBankConfig {
    /// Movements available on the account
    pub num_transactions: usize,
    /// Answer account endpoints with 403 even for a valid token
    pub forbid_accounts: bool,
    /// Status and message returned by the transfer endpoint
    pub transfer_error: Option<(u16, String)>,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockBankConfig {
    fn default() -> Self {
        Self {
            num_transactions: 3,
            forbid_accounts: false,
            transfer_error: None,
            delay_ms: 0,
        }
    }
}

/// What the server saw for a single request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub body: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MockLogin {
    token: &'static str,
    account_identifier: &'static str,
    first_name: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MockBalance {
    iban: String,
    ledger_balance: &'static str,
    available_balance: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MockMovement {
    transaction_id: i64,
    event_timestamp: String,
    amount: String,
    transaction_type: &'static str,
    description: String,
}

impl MockBankServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockBankConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(Vec::new()));

        listener.set_nonblocking(true)?;

        let running_clone = Arc::clone(&running);
        let requests_clone = Arc::clone(&requests);
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let log = Arc::clone(&requests_clone);
                        thread::spawn(move || handle_connection(stream, &cfg, &log));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    /// Base URL including the `/api/v1` prefix
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, API_PREFIX)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockBankServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(mut stream: TcpStream, config: &MockBankConfig, log: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_nonblocking(false);
    let Some(request) = read_request(&mut stream) else {
        send_response(&mut stream, 400, "Bad Request", r#"{"error":"Richiesta non valida"}"#);
        return;
    };
    if let Ok(mut log) = log.lock() {
        log.push(request.clone());
    }

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    let Some(route) = request.path.strip_prefix(API_PREFIX) else {
        send_response(&mut stream, 404, "Not Found", r#"{"error":"Risorsa non trovata"}"#);
        return;
    };
    let path = route.split('?').next().unwrap_or(route);
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let expected = format!("Bearer {}", MOCK_TOKEN);
    let authorized = request.authorization.as_deref() == Some(expected.as_str());

    match (request.method.as_str(), segments.as_slice()) {
        ("POST", ["auth", "login"]) => {
            let body: serde_json::Value = serde_json::from_str(&request.body).unwrap_or_default();
            if body["email"] == MOCK_EMAIL && body["password"] == MOCK_PASSWORD {
                let login = MockLogin {
                    token: MOCK_TOKEN,
                    account_identifier: MOCK_IBAN,
                    first_name: "Anna",
                };
                send_json(&mut stream, 200, "OK", &login);
            } else {
                send_response(&mut stream, 401, "Unauthorized", r#"{"error":"Credenziali non valide"}"#);
            }
        }
        ("POST", ["auth", "register"]) => {
            send_response(&mut stream, 201, "Created", "");
        }
        ("GET", ["accounts", _, _]) if !authorized => {
            send_response(&mut stream, 401, "Unauthorized", r#"{"error":"Token non valido"}"#);
        }
        ("GET", ["accounts", _, _]) if config.forbid_accounts => {
            send_response(&mut stream, 403, "Forbidden", r#"{"error":"Accesso negato"}"#);
        }
        ("GET", ["accounts", iban, "balance"]) => {
            let balance = MockBalance {
                iban: iban.to_string(),
                ledger_balance: "1500.00",
                available_balance: "1250.50",
            };
            send_json(&mut stream, 200, "OK", &balance);
        }
        ("GET", ["accounts", _, "movimenti"]) => {
            let limit = query_param(route, "limit")
                .and_then(|l| l.parse().ok())
                .unwrap_or(config.num_transactions);
            send_json(&mut stream, 200, "OK", &generate_movements(config.num_transactions.min(limit)));
        }
        ("POST", ["transactions", "transfer"]) if !authorized => {
            send_response(&mut stream, 401, "Unauthorized", r#"{"error":"Token non valido"}"#);
        }
        ("POST", ["transactions", "transfer"]) => match &config.transfer_error {
            Some((status, message)) => {
                let body = serde_json::json!({ "error": message, "status": status, "path": request.path });
                send_response(&mut stream, *status, "Error", &body.to_string());
            }
            None => send_response(&mut stream, 200, "OK", r#"{"message":"Bonifico eseguito"}"#),
        },
        _ => send_response(&mut stream, 404, "Not Found", r#"{"error":"Risorsa non trovata"}"#),
    }
}

/// Read the request head and a `Content-Length` body
fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut raw = Vec::new();
    let mut buffer = [0; 4096];

    let head_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&buffer[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
    let header = |name: &str| {
        head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    };

    let content_length: usize = header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while raw.len() < head_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buffer[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let body_end = raw.len().min(head_end + content_length);

    Some(RecordedRequest {
        method,
        path,
        authorization: header("authorization"),
        request_id: header("x-request-id"),
        body: String::from_utf8_lossy(&raw[head_end..body_end]).to_string(),
    })
}

fn query_param<'a>(path: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = path.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

fn send_json<T: Serialize>(stream: &mut TcpStream, status: u16, status_text: &str, body: &T) {
    let json = serde_json::to_string(body).unwrap_or_default();
    send_response(stream, status, status_text, &json);
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Movements one day apart, oldest first, alternating debit and credit
fn generate_movements(count: usize) -> Vec<MockMovement> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap_or_default();

    (0..count)
        .map(|i| {
            let debit = i % 2 == 0;
            MockMovement {
                transaction_id: (i + 1) as i64,
                event_timestamp: (start + Duration::days(i as i64))
                    .format("%Y-%m-%dT%H:%M:%S")
                    .to_string(),
                amount: if debit {
                    format!("-{}.50", 10 + i)
                } else {
                    format!("{}.00", 100 + i)
                },
                transaction_type: if debit { "PAGAMENTO_POS" } else { "BONIFICO_IN" },
                description: format!("Movimento {}", i + 1),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("/accounts/x/movimenti?limit=10", "limit"), Some("10"));
        assert_eq!(query_param("/accounts/x/movimenti?a=1&limit=5", "limit"), Some("5"));
        assert_eq!(query_param("/accounts/x/movimenti", "limit"), None);
    }

    #[test]
    fn test_generated_movements_are_chronological() {
        let movements = generate_movements(4);
        assert_eq!(movements.len(), 4);
        assert!(movements[0].event_timestamp < movements[3].event_timestamp);
        assert!(movements[0].amount.starts_with('-'));
        assert!(!movements[1].amount.starts_with('-'));
    }
}
