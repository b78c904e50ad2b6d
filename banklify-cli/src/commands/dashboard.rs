//! Dashboard command - balance card and recent movements

use anyhow::Result;
use colored::Colorize;

use banklify_core::services::logging::events;
use banklify_core::services::{DashboardSnapshot, Route};
use banklify_core::{BanklifyContext, OperationResult, Session};

use super::{get_context, print_json, report_failure, run_view, Logger};
use crate::output;

/// Fetch the dashboard, routing failures through the boundary
pub async fn load(
    ctx: &BanklifyContext,
    logger: &Logger,
    limit: usize,
    json: bool,
) -> Result<DashboardSnapshot> {
    let session = ctx.session();
    let service = &ctx.dashboard_service;

    let result = run_view(Route::Dashboard.name(), "Caricamento del conto...", |cancel| {
        let session = session.clone();
        async move { service.load(ctx.api(), &session, limit, &cancel).await }
    })
    .await;

    result.map_err(|e| report_failure(ctx, logger, events::DASHBOARD_FAILED, &e, json))
}

pub fn render(session: &Session, snapshot: &DashboardSnapshot) {
    println!("{}", format!("Ciao, {}!", session.display_name()).bold());
    println!();

    let balance = &snapshot.balance;
    let mut card = output::create_table();
    card.add_row(vec!["IBAN".to_string(), balance.iban.clone()]);
    card.add_row(vec![
        "Saldo disponibile".to_string(),
        output::colored_amount(balance.available_balance),
    ]);
    card.add_row(vec![
        "Saldo contabile".to_string(),
        output::colored_amount(balance.ledger_balance),
    ]);
    println!("{}", card);
    println!();

    println!("{}", "Ultime transazioni".bold());
    if snapshot.is_empty() {
        println!("{}", "Nessuna transazione recente.".dimmed());
        return;
    }

    let mut table = output::create_table();
    table.set_header(vec!["Data", "Descrizione", "Tipo", "Importo"]);
    for tx in &snapshot.transactions {
        table.add_row(vec![
            tx.timestamp.format("%d/%m/%Y %H:%M").to_string(),
            tx.description.clone(),
            tx.category.replace('_', " "),
            output::colored_amount(tx.amount),
        ]);
    }
    println!("{}", table);
}

pub async fn run(logger: &Logger, limit: Option<usize>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let limit = limit.filter(|l| *l > 0).unwrap_or(ctx.config.transaction_limit);

    let snapshot = load(&ctx, logger, limit, json).await?;

    if json {
        return print_json(&OperationResult::ok(snapshot));
    }
    render(&ctx.session(), &snapshot);
    Ok(())
}
