// Library root
// -----------
// Client SDK for the SolveBio REST API. The binary (`main.rs`) wires these
// modules into the `solvebio` command.
//
// Module responsibilities:
// - `api`: blocking HTTP client, typed auth endpoints, install report.
// - `auth`: login / logout / whoami flow over an explicit `Session`.
// - `credentials`: local persistence of the (email, api_key) pair.
// - `resource` / `pagination`: typed Dataset, DatasetField and Facets
//   records and lazy paginated listings.
// - `printing`: colors, number formatting, tables.
// - `ui` / `cli`: terminal prompts and command handlers.
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod pagination;
pub mod printing;
pub mod resource;
pub mod session;
pub mod ui;

pub use api::{ApiClient, AuthApi, InstallReport, InstallReporter};
pub use auth::{AuthFlow, Identity, LoginOutcome, Prompter};
pub use credentials::{Credential, CredentialStore, FileCredentialStore};
pub use error::{ApiError, Error, Result};
pub use pagination::Listing;
pub use printing::Palette;
pub use resource::{Dataset, DatasetField, Facets, FieldTable, Resource};
pub use session::Session;
