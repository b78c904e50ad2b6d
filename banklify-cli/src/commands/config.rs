//! Config command - inspect and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;

use banklify_core::config::{Config, API_URL_ENV, BALANCE_PRECHECK_ENV, SETTINGS_FILENAME};

use super::{get_banklify_dir, print_json};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Point the client at another backend
    SetApiUrl {
        /// Base URL, e.g. https://bank.example/api/v1
        url: String,
    },
    /// Turn the advisory balance check before transfers on or off
    Precheck {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let banklify_dir = get_banklify_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&banklify_dir)?;
            if json {
                return print_json(&json!({
                    "apiBaseUrl": config.api_base_url,
                    "timeoutSecs": config.timeout.as_secs(),
                    "transactionLimit": config.transaction_limit,
                    "balancePrecheck": config.balance_precheck,
                    "settingsPath": banklify_dir.join(SETTINGS_FILENAME),
                }));
            }

            let mut table = output::create_table();
            table.add_row(vec!["API".to_string(), config.api_base_url.clone()]);
            table.add_row(vec!["Timeout".to_string(), format!("{} s", config.timeout.as_secs())]);
            table.add_row(vec!["Transazioni in dashboard".to_string(), config.transaction_limit.to_string()]);
            table.add_row(vec![
                "Controllo saldo".to_string(),
                if config.balance_precheck { "on" } else { "off" }.to_string(),
            ]);
            println!("{}", table);
            println!(
                "{}",
                format!("File: {}", banklify_dir.join(SETTINGS_FILENAME).display()).dimmed()
            );
            for var in [API_URL_ENV, BALANCE_PRECHECK_ENV] {
                if std::env::var(var).is_ok() {
                    output::warning(&format!("{} è impostata e ha la precedenza su settings.json", var));
                }
            }
        }
        ConfigCommands::SetApiUrl { url } => {
            let mut config = Config::load(&banklify_dir)?;
            config.set_api_base_url(&url)?;
            config.save(&banklify_dir)?;
            output::success(&format!("API impostata su {}", config.api_base_url));
            output::info("La sessione corrente resta valida solo se il server è lo stesso.");
        }
        ConfigCommands::Precheck { state } => {
            let mut config = Config::load(&banklify_dir)?;
            config.balance_precheck = state == "on";
            config.save(&banklify_dir)?;
            output::success(&format!("Controllo saldo: {}", state));
        }
    }

    Ok(())
}
