//! Login, register and logout commands

use std::env;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dialoguer::{Input, Password};
use serde_json::json;

use banklify_core::services::logging::events;
use banklify_core::services::{Route, RouteGuard};
use banklify_core::{BanklifyContext, LoginCredentials, OperationResult, RegistrationForm, Session};

use super::{get_context, log_with, print_json, report_failure, run_view, Logger, PASSWORD_ENV};
use crate::output;

/// Get password from the flag, BANKLIFY_PASSWORD, or an interactive prompt
fn get_password_or_prompt(password_flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }
    if let Ok(p) = env::var(PASSWORD_ENV) {
        return Ok(p);
    }
    Ok(Password::new().with_prompt(prompt).interact()?)
}

fn prompt_if_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

/// Session fields safe to print (never the token)
fn session_summary(session: &Session) -> serde_json::Value {
    json!({
        "authenticated": session.is_authenticated(),
        "iban": session.iban(),
        "firstName": session.first_name,
        "redirect": RouteGuard::resolve(Route::Dashboard, session).path(),
    })
}

/// Log in and report the outcome; shared with the shell
pub async fn login(
    ctx: &BanklifyContext,
    logger: &Logger,
    credentials: LoginCredentials,
    json: bool,
) -> Result<Session> {
    let store = &ctx.session_store;

    let result = run_view(Route::Login.name(), "Accesso in corso...", |cancel| async move {
        store.login(ctx.api(), &credentials, &cancel).await
    })
    .await;

    match result {
        Ok(session) => {
            log_with(logger, |l| l.log_event(events::LOGIN_SUCCEEDED));
            if json {
                print_json(&OperationResult::ok(session_summary(&session)))?;
            } else {
                output::success(&format!("Benvenuto, {}!", session.display_name()));
            }
            Ok(session)
        }
        Err(e) => Err(report_failure(ctx, logger, events::LOGIN_FAILED, &e, json)),
    }
}

pub async fn run_login(
    logger: &Logger,
    email: Option<String>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let email = prompt_if_missing(email, "Email")?;
    let password = get_password_or_prompt(password, "Password")?;

    login(&ctx, logger, LoginCredentials::new(email, password), json).await?;
    Ok(())
}

/// Registration profile; anything not given as a flag is prompted
#[derive(Args, Debug, Default)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: Option<String>,
    /// Password (or set BANKLIFY_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// Codice fiscale
    #[arg(long)]
    pub tax_code: Option<String>,
    #[arg(long)]
    pub street: Option<String>,
    #[arg(long)]
    pub house_number: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    /// Two-letter province code
    #[arg(long)]
    pub province: Option<String>,
    #[arg(long)]
    pub zip_code: Option<String>,
    #[arg(long)]
    pub phone_number: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Fill the registration form, prompting for missing fields
pub fn collect_registration(args: RegisterArgs) -> Result<RegistrationForm> {
    let first_name = prompt_if_missing(args.first_name, "Nome")?;
    let last_name = prompt_if_missing(args.last_name, "Cognome")?;
    let tax_code = prompt_if_missing(args.tax_code, "Codice Fiscale")?;
    let street = prompt_if_missing(args.street, "Via / Piazza")?;
    let house_number = prompt_if_missing(args.house_number, "N° Civico")?;
    let zip_code = prompt_if_missing(args.zip_code, "CAP")?;
    let city = prompt_if_missing(args.city, "Città")?;
    let province = prompt_if_missing(args.province, "Provincia")?;
    let phone_number = prompt_if_missing(args.phone_number, "Telefono")?;
    let email = prompt_if_missing(args.email, "Email")?;

    let (password, confirm_password) = match args.password.or_else(|| env::var(PASSWORD_ENV).ok()) {
        Some(p) => (p.clone(), p),
        None => {
            let p1 = Password::new().with_prompt("Password").interact()?;
            let p2 = Password::new().with_prompt("Conferma Password").interact()?;
            (p1, p2)
        }
    };

    Ok(RegistrationForm {
        email,
        password,
        confirm_password,
        first_name,
        last_name,
        tax_code,
        street,
        house_number,
        city,
        province,
        zip_code,
        phone_number,
    })
}

/// Register, then log in with the same credentials; shared with the shell
pub async fn register(
    ctx: &BanklifyContext,
    logger: &Logger,
    form: RegistrationForm,
    json: bool,
) -> Result<Session> {
    let store = &ctx.session_store;

    let result = run_view(Route::Register.name(), "Registrazione in corso...", |cancel| async move {
        store.register(ctx.api(), &form, &cancel).await
    })
    .await;

    match result {
        Ok(session) => {
            log_with(logger, |l| l.log_event(events::REGISTER_SUCCEEDED));
            if json {
                print_json(&OperationResult::ok(session_summary(&session)))?;
            } else {
                output::success("Registrazione completata!");
                output::success(&format!("Benvenuto, {}!", session.display_name()));
            }
            Ok(session)
        }
        Err(e) => Err(report_failure(ctx, logger, events::REGISTER_FAILED, &e, json)),
    }
}

pub async fn run_register(logger: &Logger, args: RegisterArgs) -> Result<()> {
    let ctx = get_context()?;
    let json = args.json;
    let form = collect_registration(args)?;
    register(&ctx, logger, form, json).await?;
    Ok(())
}

/// Drop the session; shared with the shell
pub fn logout(ctx: &BanklifyContext, logger: &Logger) -> Result<()> {
    ctx.session_store.logout()?;
    log_with(logger, |l| l.log_event(events::LOGOUT));
    Ok(())
}

pub fn run_logout(logger: &Logger, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let was_authenticated = ctx.session_store.is_authenticated();
    logout(&ctx, logger)?;

    if json {
        print_json(&OperationResult::ok(json!({ "loggedOut": was_authenticated })))?;
    } else if was_authenticated {
        output::success("Disconnessione effettuata.");
    } else {
        println!("{}", "Nessuna sessione attiva.".dimmed());
    }
    Ok(())
}
