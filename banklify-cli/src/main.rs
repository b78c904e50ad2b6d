//! Banklify CLI - your bank account in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use banklify_core::services::EntryPoint;
use commands::{auth, config, dashboard, logs, shell, status, transfer, Logger};

/// Banklify - your bank account in the terminal
#[derive(Parser)]
#[command(name = "banklify", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to your account
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Password (or set BANKLIFY_PASSWORD)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a new account and log in
    Register(auth::RegisterArgs),

    /// Log out and forget the stored session
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show session and connection status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show balance and recent transactions
    Dashboard {
        /// Number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a bank transfer
    Transfer {
        /// Receiver IBAN
        #[arg(long)]
        to: Option<String>,
        /// Amount in euros, e.g. 100.00 or 100,00
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        /// Transfer description (causale)
        #[arg(long)]
        description: Option<String>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session across all views
    Shell,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Register(_) => "register",
            Commands::Logout { .. } => "logout",
            Commands::Status { .. } => "status",
            Commands::Dashboard { .. } => "dashboard",
            Commands::Transfer { .. } => "transfer",
            Commands::Shell => "shell",
            Commands::Config { .. } => "config",
            Commands::Logs { .. } => "logs",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let entry_point = match cli.command {
        Commands::Shell => EntryPoint::Shell,
        _ => EntryPoint::Cli,
    };
    // the only event log handle in this process
    let logger = commands::open_logger(entry_point);
    let name = cli.command.name();
    commands::log_with(&logger, |l| l.log_command(name));

    match run(cli, &logger).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // failures routed through the error boundary were already shown
            if e.downcast_ref::<commands::Reported>().is_none() {
                output::error(&format!("{:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, logger: &Logger) -> Result<()> {
    match cli.command {
        Commands::Login { email, password, json } => {
            auth::run_login(logger, email, password, json).await
        }
        Commands::Register(args) => auth::run_register(logger, args).await,
        Commands::Logout { json } => auth::run_logout(logger, json),
        Commands::Status { json } => status::run(json),
        Commands::Dashboard { limit, json } => dashboard::run(logger, limit, json).await,
        Commands::Transfer { to, amount, description, yes, json } => {
            transfer::run(logger, to, amount, description, yes, json).await
        }
        Commands::Shell => shell::run(logger).await,
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(logger, command),
    }
}
