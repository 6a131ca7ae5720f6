// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, build the session and the API
//   client, then hand off to the handler in `ui`.
// - Handlers return the exit code; unexpected errors are printed here.

use clap::Parser;
use solvebio::cli::{Cli, Commands, DatasetCommands};
use solvebio::{config, logging, ui, ApiClient, FileCredentialStore, Palette, Session};

fn run(cli: Cli) -> anyhow::Result<ui::ExitCode> {
    let env = Session::from_env();
    let flag_key = cli.api_key;
    let session = Session::new(
        cli.api_host.as_deref().unwrap_or(env.api_host()),
        flag_key.clone().or_else(|| env.api_key().map(str::to_string)),
    );

    let api = ApiClient::new()?;
    let store = FileCredentialStore::new(config::credentials_path(), session.api_host());
    let palette = Palette::detect();

    match cli.command {
        Commands::Login => ui::login(&api, &store, session, flag_key.as_deref()),
        Commands::Logout => ui::logout(&api, &store, session),
        Commands::Whoami => ui::whoami(&api, &store, session),
        Commands::Dataset { command } => {
            let session = ui::authenticated(&store, session)?;
            match command {
                DatasetCommands::Show { id } => ui::show_dataset(&api, &session, &id, palette),
                DatasetCommands::Fields { id } => ui::dataset_fields(&api, &session, &id),
                DatasetCommands::Facets { id, field, limit } => {
                    ui::field_facets(&api, &session, &id, &field, limit, palette)
                }
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_level.as_deref());

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            let palette = Palette::detect();
            eprintln!("{} {:#}", palette.red("Error:"), e);
            1
        }
    };
    std::process::exit(code);
}
