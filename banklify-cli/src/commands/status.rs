//! Status command - show session and backend settings

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use banklify_core::services::{Route, RouteGuard};

use super::{get_context, print_json};
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = ctx.session();
    let landing = RouteGuard::resolve(Route::Dashboard, &session);

    if json {
        return print_json(&json!({
            "authenticated": session.is_authenticated(),
            "iban": session.iban(),
            "firstName": session.first_name,
            "since": session.created_at,
            "apiUrl": ctx.config.api_base_url,
            "balancePrecheck": ctx.config.balance_precheck,
            "landing": landing.path(),
        }));
    }

    println!("{}", "Banklify".bold());
    println!();

    let mut table = output::create_table();
    if session.is_authenticated() {
        table.add_row(vec!["Sessione", "attiva"]);
        table.add_row(vec!["Cliente", session.display_name()]);
        table.add_row(vec!["IBAN", session.iban().unwrap_or("-")]);
        if let Some(since) = session.created_at {
            table.add_row(vec![
                "Accesso".to_string(),
                since.with_timezone(&chrono::Local).format("%d/%m/%Y %H:%M").to_string(),
            ]);
        }
    } else {
        table.add_row(vec!["Sessione", "non attiva"]);
    }
    table.add_row(vec!["Server", ctx.config.api_base_url.as_str()]);
    table.add_row(vec![
        "Controllo saldo",
        if ctx.config.balance_precheck { "attivo" } else { "disattivo" },
    ]);
    println!("{}", table);

    if landing == Route::Login {
        println!();
        output::info("Esegui `banklify login` per accedere.");
    }

    Ok(())
}
