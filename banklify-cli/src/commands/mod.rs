//! CLI command implementations

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod logs;
pub mod shell;
pub mod status;
pub mod transfer;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use banklify_core::domain::result::Result as CoreResult;
use banklify_core::services::logging::events;
use banklify_core::services::{CancelToken, EntryPoint, LogEvent, LoggingService, Route, ViewScope};
use banklify_core::{BanklifyContext, Error, OperationResult};

use crate::output;

pub const BANKLIFY_DIR_ENV: &str = "BANKLIFY_DIR";
pub const PASSWORD_ENV: &str = "BANKLIFY_PASSWORD";

/// The process-wide event log; `None` when it failed to open
///
/// Each `LoggingService` owns its own DuckDB instance, and two instances on
/// the same file overwrite each other's writes. `main` opens exactly one and
/// every command borrows it.
pub type Logger = Option<LoggingService>;

/// Open the event log, or `None` if it fails (never blocks an operation)
pub fn open_logger(entry_point: EntryPoint) -> Logger {
    let banklify_dir = get_banklify_dir().ok()?;
    LoggingService::new(&banklify_dir, entry_point, env!("CARGO_PKG_VERSION")).ok()
}

/// Run a logging call, ignoring any errors (logging never breaks the app)
pub fn log_with(logger: &Logger, f: impl FnOnce(&LoggingService) -> Result<()>) {
    if let Some(service) = logger {
        let _ = f(service);
    }
}

/// Data directory from `BANKLIFY_DIR`, or `~/.banklify`
pub fn get_banklify_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(BANKLIFY_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".banklify"))
        .context("Could not find home directory; set BANKLIFY_DIR")
}

pub fn get_context() -> Result<BanklifyContext> {
    let banklify_dir = get_banklify_dir()?;
    std::fs::create_dir_all(&banklify_dir)
        .with_context(|| format!("Failed to create banklify directory: {:?}", banklify_dir))?;
    BanklifyContext::new(&banklify_dir).context("Failed to initialize banklify context")
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A failure that has already been shown to the user
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation failed")
    }
}

impl std::error::Error for Reported {}

/// Run a view's async work under its own scope.
///
/// Ctrl-C cancels the scope; the call then resolves to `Error::Cancelled`
/// instead of the process dying mid-request.
pub async fn run_view<T, F, Fut>(name: &'static str, spinner_msg: &str, f: F) -> CoreResult<T>
where
    F: FnOnce(CancelToken) -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let scope = ViewScope::new(name);
    let call = f(scope.token());
    tokio::pin!(call);

    let spinner = output::spinner(spinner_msg);
    let result = tokio::select! {
        result = &mut call => result,
        _ = tokio::signal::ctrl_c() => {
            spinner.set_message(format!("Interruzione di {}...", scope.name()));
            scope.cancel();
            call.await
        }
    };
    spinner.finish_and_clear();
    result
}

/// Route a failure through the error boundary, show it and log it.
///
/// Returns the error to propagate so the process exits non-zero.
pub fn report_failure(
    ctx: &BanklifyContext,
    logger: &Logger,
    event: &str,
    error: &Error,
    json: bool,
) -> anyhow::Error {
    let handled = ctx.boundary.handle(error);

    if handled.session_cleared {
        log_with(logger, |l| l.log_failure(events::SESSION_EXPIRED, error));
    }
    if !matches!(error, Error::Cancelled) {
        let mut entry = LogEvent::new(event).with_failure(error);
        if let Some(route) = handled.redirect {
            entry = entry.with_error_details(format!("redirect {}", route.path()));
        }
        log_with(logger, |l| l.log(entry));
    }

    if json {
        let mut result = OperationResult::<()>::fail(error);
        if let Some(route) = handled.redirect {
            result = result.with_context("redirect", serde_json::json!(route.path()));
        }
        let _ = print_json(&result);
    } else {
        output::error(&handled.message);
        if handled.redirect == Some(Route::Login) {
            output::info("Esegui `banklify login` per accedere.");
        }
    }

    anyhow::Error::new(Reported)
}
