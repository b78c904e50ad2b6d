//! Logging service - structured event logging to DuckDB
//!
//! Provides a privacy-safe logging system that stores events in logs.duckdb.
//! No user data (tokens, IBANs, amounts, descriptions, names) is ever logged:
//! only the event name, the route or command, the HTTP status and a
//! redacted error message.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use duckdb::Connection;
use serde::{Deserialize, Serialize};

use crate::adapters::http::NETWORK_MESSAGES;
use crate::domain::result::Error;
use crate::log_migrations::LOG_MIGRATIONS;

pub const LOGS_FILENAME: &str = "logs.duckdb";

/// Event names written by the CLI
pub mod events {
    pub const COMMAND_EXECUTED: &str = "command_executed";
    pub const PAGE_OPENED: &str = "page_opened";
    pub const LOGIN_SUCCEEDED: &str = "login_succeeded";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const REGISTER_SUCCEEDED: &str = "register_succeeded";
    pub const REGISTER_FAILED: &str = "register_failed";
    pub const LOGOUT: &str = "logout";
    pub const SESSION_EXPIRED: &str = "session_expired";
    pub const TRANSFER_SUBMITTED: &str = "transfer_submitted";
    pub const TRANSFER_FAILED: &str = "transfer_failed";
    pub const DASHBOARD_FAILED: &str = "dashboard_failed";
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// How the user is driving the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    /// One-shot subcommands
    Cli,
    /// The interactive `banklify shell`
    Shell,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Shell => "shell",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Default::default()
        }
    }

    /// Set the page context (shell navigation)
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Set the command context (CLI subcommands)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }

    /// Attach a failure, keeping only what is safe to store
    pub fn with_failure(mut self, error: &Error) -> Self {
        self.http_status = error.status();
        self.error_kind = Some(error.kind().as_str().to_string());
        self.error_message = Some(redacted_message(error));
        self
    }
}

/// Error text stripped of anything the user typed or the backend echoed
fn redacted_message(error: &Error) -> String {
    match error {
        // backend messages may echo IBANs or names
        Error::Backend { status, .. } => format!("backend error (HTTP {})", status),
        Error::InsufficientFunds { .. } => "insufficient funds".to_string(),
        Error::Unauthorized { status } => format!("unauthorized (HTTP {})", status),
        // validation messages are fixed strings, never user input
        Error::Validation(message) => message.clone(),
        Error::Network(message) if NETWORK_MESSAGES.contains(&message.as_str()) => message.clone(),
        Error::Network(_) => "network error".to_string(),
        other => other.to_string(),
    }
}

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub page: Option<String>,
    pub command: Option<String>,
    pub http_status: Option<u16>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

const SELECT_COLUMNS: &str = "SELECT id, timestamp, entry_point, app_version, platform, \
     event, page, command, http_status, error_kind, error_message, error_details \
     FROM sys_logs";

fn map_entry(row: &duckdb::Row<'_>) -> duckdb::Result<LogEntry> {
    let http_status: Option<i32> = row.get(8)?;
    Ok(LogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        entry_point: row.get(2)?,
        app_version: row.get(3)?,
        platform: row.get(4)?,
        event: row.get(5)?,
        page: row.get(6)?,
        command: row.get(7)?,
        http_status: http_status.and_then(|s| u16::try_from(s).ok()),
        error_kind: row.get(9)?,
        error_message: row.get(10)?,
        error_details: row.get(11)?,
    })
}

/// Event log backed by `logs.duckdb` in the data directory
///
/// Opening the service applies pending migrations. Every entry is stamped
/// with the entry point, app version and OS it was opened with.
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
}

impl LoggingService {
    pub fn new(
        banklify_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        std::fs::create_dir_all(banklify_dir)?;
        let db_path = banklify_dir.join(LOGS_FILENAME);
        let service = Self {
            conn: Mutex::new(Connection::open(&db_path)?),
            db_path,
            entry_point,
            app_version: app_version.into(),
        };
        service.run_migrations()?;
        Ok(service)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("log connection poisoned: {}", e))
    }

    /// The first migration creates the bookkeeping table and is idempotent,
    /// so it runs before the applied set is read.
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        let (bootstrap, _) = LOG_MIGRATIONS
            .split_first()
            .ok_or_else(|| anyhow!("no log migrations embedded"))?;
        conn.execute_batch(bootstrap.1)?;

        let applied: HashSet<String> = conn
            .prepare("SELECT migration_name FROM sys_migrations")?
            .query_map([], |row| row.get(0))?
            .collect::<duckdb::Result<_>>()?;

        for (name, sql) in LOG_MIGRATIONS {
            if applied.contains(*name) {
                continue;
            }
            if *name != bootstrap.0 {
                conn.execute_batch(sql)?;
            }
            conn.execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [name])?;
        }
        Ok(())
    }

    fn query_entries(&self, filter: &str, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} {} ORDER BY timestamp DESC, id DESC LIMIT ?",
            SELECT_COLUMNS, filter
        ))?;
        let entries = stmt
            .query_map([limit as i64], map_entry)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn count_where(&self, filter: &str) -> Result<u64> {
        let count: i64 = self.conn()?.query_row(
            &format!("SELECT COUNT(*) FROM sys_logs {}", filter),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Record an event; entry point, version and platform are added here
    pub fn log(&self, event: LogEvent) -> Result<()> {
        self.conn()?.execute(
            r#"
            INSERT INTO sys_logs (
                timestamp, entry_point, app_version, platform, event,
                page, command, http_status, error_kind, error_message, error_details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            duckdb::params![
                now_ms(),
                self.entry_point.as_str(),
                &self.app_version,
                std::env::consts::OS,
                &event.event,
                &event.page,
                &event.command,
                event.http_status.map(i32::from),
                &event.error_kind,
                &event.error_message,
                &event.error_details,
            ],
        )?;

        Ok(())
    }

    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new(events::COMMAND_EXECUTED).with_command(command))
    }

    pub fn log_page(&self, page: &str) -> Result<()> {
        self.log(LogEvent::new(events::PAGE_OPENED).with_page(page))
    }

    /// Log a failed operation with its redacted error
    pub fn log_failure(&self, event: &str, error: &Error) -> Result<()> {
        self.log(LogEvent::new(event).with_failure(error))
    }

    /// Most recent entries first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.query_entries("", limit)
    }

    /// Entries that carry an error, most recent first
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.query_entries("WHERE error_message IS NOT NULL", limit)
    }

    pub fn count(&self) -> Result<u64> {
        self.count_where("")
    }

    pub fn error_count(&self) -> Result<u64> {
        self.count_where("WHERE error_message IS NOT NULL")
    }

    /// Number of entries per event name, busiest first
    pub fn event_counts(&self) -> Result<Vec<(String, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT event, COUNT(*) AS n FROM sys_logs GROUP BY event ORDER BY n DESC, event",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let n: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, n.max(0) as u64))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(counts)
    }

    /// Delete logs older than the given unix timestamp (ms)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
