//! Logs command - inspect and prune the local event log
//!
//! The log never holds tokens, IBANs or amounts, so it is safe to share
//! `banklify logs list --json` output when reporting a problem.

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use serde_json::json;

use banklify_core::services::{LogEntry, LoggingService};

use super::{print_json, Logger};
use crate::output;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only failed operations
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old log entries
    Clear {
        /// Keep the last N days
        #[arg(long, default_value = "30")]
        older_than_days: u32,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Event counts and database location
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Works on the process-wide log so this command's own entry is included
pub fn run(logger: &Logger, command: LogsCommands) -> Result<()> {
    let service = logger
        .as_ref()
        .context("Impossibile aprire il registro eventi")?;

    match command {
        LogsCommands::List { limit, errors, json } => list(service, limit, errors, json),
        LogsCommands::Clear { older_than_days, force, json } => {
            clear(service, older_than_days, force, json)
        }
        LogsCommands::Stats { json } => stats(service, json),
    }
}

fn local_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
        None => timestamp_ms.to_string(),
    }
}

/// Where the event happened: the page in the shell, the command otherwise
fn location(entry: &LogEntry) -> String {
    entry
        .page
        .as_deref()
        .or(entry.command.as_deref())
        .unwrap_or("-")
        .to_string()
}

fn list(service: &LoggingService, limit: usize, errors: bool, json: bool) -> Result<()> {
    let entries = if errors {
        service.get_errors(limit)?
    } else {
        service.get_recent(limit)?
    };

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("{}", "Nessun evento registrato.".dimmed());
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Quando", "Origine", "Evento", "Dove", "HTTP", "Errore"]);
    for entry in &entries {
        let failure = match (&entry.error_kind, &entry.error_message) {
            (Some(kind), Some(message)) => format!("[{}] {}", kind, message).red().to_string(),
            (None, Some(message)) => message.red().to_string(),
            _ => String::new(),
        };
        table.add_row(vec![
            local_time(entry.timestamp),
            entry.entry_point.clone(),
            entry.event.clone(),
            location(entry),
            entry.http_status.map(|s| s.to_string()).unwrap_or_default(),
            failure,
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn clear(service: &LoggingService, older_than_days: u32, force: bool, json: bool) -> Result<()> {
    let cutoff = chrono::Utc::now().timestamp_millis() - i64::from(older_than_days) * MS_PER_DAY;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Eliminare gli eventi più vecchi di {} giorni?", older_than_days))
            .default(false)
            .interact()?;
        if !confirmed {
            output::warning("Operazione annullata.");
            return Ok(());
        }
    }

    let deleted = service.delete_before(cutoff)?;
    if json {
        print_json(&json!({ "deleted": deleted }))
    } else {
        output::success(&format!("{} eventi eliminati.", deleted));
        Ok(())
    }
}

fn stats(service: &LoggingService, json: bool) -> Result<()> {
    let total = service.count()?;
    let failures = service.error_count()?;
    let by_event = service.event_counts()?;
    let db_path = service.db_path();
    let size_bytes = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        let by_event: serde_json::Map<String, serde_json::Value> =
            by_event.into_iter().map(|(event, n)| (event, n.into())).collect();
        return print_json(&json!({
            "totalEntries": total,
            "errorCount": failures,
            "byEvent": by_event,
            "databasePath": db_path.to_string_lossy(),
            "databaseSizeBytes": size_bytes,
        }));
    }

    println!("{}", "Registro eventi".bold());
    let mut table = output::create_table();
    table.set_header(vec!["Evento", "Conteggio"]);
    for (event, n) in &by_event {
        table.add_row(vec![event.clone(), n.to_string()]);
    }
    println!("{}", table);
    println!("  Totale: {}  (errori: {})", total, failures);
    println!("  {} {} ({} byte)", "Database:".dimmed(), db_path.display(), size_bytes);
    Ok(())
}
