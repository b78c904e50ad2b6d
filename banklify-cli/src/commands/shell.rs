//! Interactive shell - navigate login, register, dashboard and transfer
//!
//! Every navigation goes through the route guard, so a session that expires
//! in any view lands the user back on login at the next step.

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Confirm, Input, Password, Select};

use banklify_core::services::logging::events;
use banklify_core::services::{Route, RouteGuard};
use banklify_core::{BanklifyContext, LoginCredentials, TransferForm};

use super::auth::{self, RegisterArgs};
use super::{dashboard, get_context, log_with, report_failure, transfer, Logger, Reported};
use crate::output;

/// Where to go next; `None` closes the shell
type Next = Option<Route>;

fn already_reported(error: &anyhow::Error) -> bool {
    error.downcast_ref::<Reported>().is_some()
}

fn choose(prompt: &str, items: &[&str]) -> Result<usize> {
    Ok(Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()?)
}

pub async fn run(logger: &Logger) -> Result<()> {
    let ctx = get_context()?;
    let mut requested = Route::from_path("/");

    loop {
        let route = RouteGuard::resolve(requested, &ctx.session());
        log_with(logger, |l| l.log_page(route.name()));
        println!();
        println!("{}", format!("── {} ──", route.title()).bold());

        let next = match route {
            Route::Login => login_view(&ctx, logger).await?,
            Route::Register => register_view(&ctx, logger).await?,
            Route::Dashboard => dashboard_view(&ctx, logger).await?,
            Route::Transfer => transfer_view(&ctx, logger).await?,
            Route::NotFound => {
                output::warning("Pagina non trovata.");
                Some(Route::Dashboard)
            }
        };

        match next {
            Some(route) => requested = route,
            None => break,
        }
    }

    println!("{}", "Arrivederci!".dimmed());
    Ok(())
}

async fn login_view(ctx: &BanklifyContext, logger: &Logger) -> Result<Next> {
    match choose("Cosa vuoi fare?", &["Accedi", "Registrati", "Esci"])? {
        0 => {
            let email: String = Input::new().with_prompt("Email").interact_text()?;
            let password = Password::new().with_prompt("Password").interact()?;
            match auth::login(ctx, logger, LoginCredentials::new(email, password), false).await {
                Ok(_) => Ok(Some(Route::Dashboard)),
                Err(e) if already_reported(&e) => Ok(Some(Route::Login)),
                Err(e) => Err(e),
            }
        }
        1 => Ok(Some(Route::Register)),
        _ => Ok(None),
    }
}

async fn register_view(ctx: &BanklifyContext, logger: &Logger) -> Result<Next> {
    if choose("Nuovo cliente", &["Compila il modulo", "Torna all'accesso"])? == 1 {
        return Ok(Some(Route::Login));
    }

    let form = auth::collect_registration(RegisterArgs::default())?;
    match auth::register(ctx, logger, form, false).await {
        Ok(_) => Ok(Some(Route::Dashboard)),
        Err(e) if already_reported(&e) => Ok(Some(Route::Register)),
        Err(e) => Err(e),
    }
}

async fn dashboard_view(ctx: &BanklifyContext, logger: &Logger) -> Result<Next> {
    match dashboard::load(ctx, logger, ctx.config.transaction_limit, false).await {
        Ok(snapshot) => dashboard::render(&ctx.session(), &snapshot),
        // an expired session is sent to login by the guard on the next step
        Err(e) if already_reported(&e) => {
            if !ctx.session_store.is_authenticated() {
                return Ok(Some(Route::Login));
            }
        }
        Err(e) => return Err(e),
    }

    println!();
    match choose(
        "Cosa vuoi fare?",
        &["Aggiorna", "Nuovo bonifico", "Esci dall'account", "Chiudi"],
    )? {
        0 => Ok(Some(Route::Dashboard)),
        1 => Ok(Some(Route::Transfer)),
        2 => {
            auth::logout(ctx, logger)?;
            output::success("Disconnessione effettuata.");
            Ok(Some(Route::Login))
        }
        _ => Ok(None),
    }
}

/// Re-prompt every editable field, pre-filled with what was typed
fn edit_form(form: &mut TransferForm) -> Result<()> {
    form.receiver_iban = Input::new()
        .with_prompt("IBAN destinatario")
        .with_initial_text(form.receiver_iban.clone())
        .interact_text()?;
    form.amount = Input::new()
        .with_prompt("Importo (€)")
        .with_initial_text(form.amount.clone())
        .interact_text()?;
    form.description = Input::new()
        .with_prompt("Causale")
        .with_initial_text(form.description.clone())
        .interact_text()?;
    Ok(())
}

async fn transfer_view(ctx: &BanklifyContext, logger: &Logger) -> Result<Next> {
    let mut form = match TransferForm::for_session(&ctx.session()) {
        Ok(form) => form,
        Err(e) => {
            let _ = report_failure(ctx, logger, events::TRANSFER_FAILED, &e, false);
            return Ok(Some(Route::Login));
        }
    };
    println!("{} {}", "Conto di addebito:".dimmed(), form.sender_iban);
    transfer::prompt_missing(&mut form)?;

    loop {
        transfer::print_summary(&form);
        let confirmed = Confirm::new()
            .with_prompt("Confermi l'invio?")
            .default(false)
            .interact()?;

        if confirmed {
            match transfer::submit(ctx, logger, &mut form, false).await {
                Ok(receipt) => {
                    output::success(receipt.message());
                    return match choose("E ora?", &["Nuovo bonifico", "Torna alla dashboard"])? {
                        0 => Ok(Some(Route::Transfer)),
                        _ => Ok(Some(Route::Dashboard)),
                    };
                }
                Err(e) if already_reported(&e) => {
                    if !ctx.session_store.is_authenticated() {
                        return Ok(Some(Route::Login));
                    }
                }
                Err(e) => return Err(e),
            }
        }

        match choose("Cosa vuoi fare?", &["Modifica i dati", "Torna alla dashboard"])? {
            0 => edit_form(&mut form)?,
            _ => return Ok(Some(Route::Dashboard)),
        }
    }
}
