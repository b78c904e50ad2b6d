//! Transfer command - send a bank transfer from the session account

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Confirm, Input};
use serde_json::json;

use banklify_core::domain::money::{format_eur, parse_amount};
use banklify_core::domain::result::Result as CoreResult;
use banklify_core::services::logging::events;
use banklify_core::services::Route;
use banklify_core::{BanklifyContext, Error, OperationResult, TransferForm, TransferReceipt};

use super::{get_context, log_with, print_json, report_failure, run_view, Logger};
use crate::output;

/// Fill in whatever the flags left empty
pub fn prompt_missing(form: &mut TransferForm) -> Result<()> {
    if form.receiver_iban.trim().is_empty() {
        form.receiver_iban = Input::new().with_prompt("IBAN destinatario").interact_text()?;
    }
    if form.amount.trim().is_empty() {
        form.amount = Input::new().with_prompt("Importo (€)").interact_text()?;
    }
    if form.description.trim().is_empty() {
        form.description = Input::new().with_prompt("Causale").interact_text()?;
    }
    Ok(())
}

/// Summary shown before asking for confirmation
pub fn print_summary(form: &TransferForm) {
    println!("{}", "Riepilogo bonifico".bold());
    let mut table = output::create_table();
    table.add_row(vec!["Da", form.sender_iban.as_str()]);
    table.add_row(vec!["A", form.receiver_iban.as_str()]);
    let amount = parse_amount(&form.amount)
        .map(format_eur)
        .unwrap_or_else(|| form.amount.clone());
    table.add_row(vec!["Importo".to_string(), amount]);
    table.add_row(vec!["Causale", form.description.as_str()]);
    println!("{}", table);
}

/// Submit the form through the transfer service; shared with the shell
///
/// On success the form is cleared except for the sender IBAN. On failure it
/// is left as typed.
pub async fn submit(
    ctx: &BanklifyContext,
    logger: &Logger,
    form: &mut TransferForm,
    json: bool,
) -> Result<TransferReceipt> {
    let session = ctx.session();
    let service = &ctx.transfer_service;
    let precheck = ctx.config.balance_precheck;

    let result = run_view(Route::Transfer.name(), "Invio del bonifico...", |cancel| async move {
        service
            .submit(ctx.api(), &session, form, precheck, &cancel)
            .await
    })
    .await;

    match result {
        Ok(receipt) => {
            log_with(logger, |l| l.log_event(events::TRANSFER_SUBMITTED));
            Ok(receipt)
        }
        Err(e) => Err(report_failure(ctx, logger, events::TRANSFER_FAILED, &e, json)),
    }
}

/// `--json` runs are non-interactive, so they only submit with `--yes`
fn json_confirmation(yes: bool) -> CoreResult<()> {
    if yes {
        Ok(())
    } else {
        Err(Error::validation(
            "Con --json il bonifico va confermato esplicitamente con --yes.",
        ))
    }
}

pub async fn run(
    logger: &Logger,
    to: Option<String>,
    amount: Option<String>,
    description: Option<String>,
    yes: bool,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;

    let mut form = match TransferForm::for_session(&ctx.session()) {
        Ok(form) => form,
        Err(e) => return Err(report_failure(&ctx, logger, events::TRANSFER_FAILED, &e, json)),
    };
    form.receiver_iban = to.unwrap_or_default();
    form.amount = amount.unwrap_or_default();
    form.description = description.unwrap_or_default();

    if json {
        if let Err(e) = json_confirmation(yes) {
            return Err(report_failure(&ctx, logger, events::TRANSFER_FAILED, &e, json));
        }
    } else {
        prompt_missing(&mut form)?;
    }

    if !yes {
        print_summary(&form);
        if !Confirm::new()
            .with_prompt("Confermi l'invio?")
            .default(false)
            .interact()?
        {
            output::warning("Bonifico annullato.");
            return Ok(());
        }
    }

    let receipt = submit(&ctx, logger, &mut form, json).await?;

    if json {
        print_json(&OperationResult::ok(json!({ "message": receipt.message() })))?;
    } else {
        output::success(receipt.message());
    }
    Ok(())
}
