// UI layer: terminal prompts (dialoguer), spinners (indicatif) and the
// handlers behind each CLI command. Handlers print results and return the
// process exit code; library errors are wrapped with `anyhow` context.

use crate::api::ApiClient;
use crate::auth::{AuthFlow, LoginOutcome, Prompter};
use crate::credentials::{CredentialStore, FileCredentialStore};
use crate::pagination::Listing;
use crate::printing::{pretty_int, terminal_size, Palette};
use crate::resource::{Dataset, DatasetField, FieldTable, Resource};
use crate::session::Session;
use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

/// Prompts on the controlling terminal. The password is read without echo.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn domain(&mut self) -> io::Result<String> {
        Input::new()
            .with_prompt("Domain (e.g. <domain>.solvebio.com)")
            .interact_text()
    }

    fn email(&mut self) -> io::Result<String> {
        Input::new().with_prompt("Email").interact_text()
    }

    fn password(&mut self) -> io::Result<String> {
        Password::new()
            .with_prompt("Password (typing will be hidden)")
            .interact()
    }
}

/// Run `f` with a spinner on stderr. The spinner is cleared before returning.
fn with_spinner<T>(msg: &str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = f();
    spinner.finish_and_clear();
    result
}

/// Exit code for a command.
pub type ExitCode = i32;

pub fn login(
    api: &ApiClient,
    store: &FileCredentialStore,
    session: Session,
    api_key: Option<&str>,
) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut flow = AuthFlow::new(session, api, store, api, stdout.lock());
    let outcome = flow
        .login(&mut TerminalPrompter, api_key)
        .context("Login aborted")?;
    Ok(login_exit_code(&outcome))
}

/// SSO-only domains end the command with a failure status, like a
/// rejected login.
pub fn login_exit_code(outcome: &LoginOutcome) -> ExitCode {
    match outcome {
        LoginOutcome::LoggedIn { .. } => 0,
        LoginOutcome::Failed | LoginOutcome::SsoRequired { .. } => 1,
    }
}

pub fn logout(api: &ApiClient, store: &FileCredentialStore, session: Session) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut flow = AuthFlow::new(session, api, store, api, stdout.lock());
    let logged_out = flow.logout().context("Failed to remove stored credentials")?;
    Ok(if logged_out { 0 } else { 1 })
}

pub fn whoami(api: &ApiClient, store: &FileCredentialStore, session: Session) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut flow = AuthFlow::new(session, api, store, api, stdout.lock());
    let identity = flow.whoami(false)?;
    Ok(if identity.is_some() { 0 } else { 1 })
}

/// Resolve the key to use for data commands: explicit session key, else the
/// stored credential.
pub fn authenticated(store: &FileCredentialStore, mut session: Session) -> Result<Session> {
    if session.api_key().is_none() {
        let cred = store
            .get()
            .with_context(|| format!("Failed to read {}", store.path().display()))?;
        if let Some(cred) = cred {
            session.set_api_key(&cred.api_key);
        }
    }
    Ok(session)
}

pub fn show_dataset(api: &ApiClient, session: &Session, id: &str, palette: Palette) -> Result<ExitCode> {
    let dataset = with_spinner("Fetching dataset...", || Dataset::retrieve(api, session, id))
        .with_context(|| format!("Failed to retrieve dataset {}", id))?;

    let cols = terminal_size().map(|(cols, _)| cols as usize).unwrap_or(80);
    println!("{}", palette.blue(&dataset.display_name()));
    println!("{}", "-".repeat(cols.min(80)));
    for (key, value) in dataset.to_map() {
        let text = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        println!("{:<24} {}", palette.yellow(&key), text);
    }
    Ok(0)
}

pub fn dataset_fields(api: &ApiClient, session: &Session, id: &str) -> Result<ExitCode> {
    let fields = with_spinner("Fetching fields...", || -> crate::error::Result<Vec<DatasetField>> {
        let dataset = Dataset::retrieve(api, session, id)?;
        let listing: Listing<DatasetField> = dataset.fields(api, session)?;
        listing.collect_all()
    })
    .with_context(|| format!("Failed to list fields of dataset {}", id))?;

    println!("{}", FieldTable(&fields));
    Ok(0)
}

pub fn field_facets(
    api: &ApiClient,
    session: &Session,
    id: &str,
    field: &str,
    limit: Option<u32>,
    palette: Palette,
) -> Result<ExitCode> {
    let facets = with_spinner("Fetching facets...", || -> crate::error::Result<_> {
        let dataset = Dataset::retrieve(api, session, id)?;
        dataset.field(api, session, field)?.facets(api, session, limit)
    })
    .with_context(|| format!("Failed to fetch facets for {}", field))?;

    let total = i64::try_from(facets.total).unwrap_or(i64::MAX);
    println!("{} {}", palette.green("Total:"), pretty_int(total));
    for facet in &facets.facets {
        println!("  {}", facet);
    }
    Ok(0)
}
