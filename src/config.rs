//! Configuration constants and environment lookups.
//!
//! Every value here can be overridden from the environment; the CLI flags in
//! `main.rs` take precedence over both.

use std::path::PathBuf;

/// Production API host used when nothing else is configured.
pub const DEFAULT_API_HOST: &str = "https://api.solvebio.com";

/// Environment variable overriding the API host.
pub const API_HOST_ENV_VAR: &str = "SOLVEBIO_API_HOST";

/// Environment variable providing an API key for the current process only.
pub const API_KEY_ENV_VAR: &str = "SOLVEBIO_API_KEY";

/// Environment variable overriding the credential file location.
pub const CREDENTIALS_PATH_ENV_VAR: &str = "SOLVEBIO_CREDENTIALS_PATH";

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "SOLVEBIO_LOG";

/// Suffix users commonly type after their domain name.
pub const DOMAIN_SUFFIX: &str = ".solvebio.com";

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var_os(name)
        .and_then(|val| val.into_string().ok())
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

/// API host from the environment, falling back to [`DEFAULT_API_HOST`].
pub fn api_host() -> String {
    normalize_host(&non_empty_var(API_HOST_ENV_VAR).unwrap_or_else(|| DEFAULT_API_HOST.into()))
}

/// API key from the environment, if any.
pub fn api_key() -> Option<String> {
    non_empty_var(API_KEY_ENV_VAR)
}

/// Location of the credential file: `$SOLVEBIO_CREDENTIALS_PATH`, else
/// `~/.solvebio/credentials`.
pub fn credentials_path() -> PathBuf {
    if let Some(path) = non_empty_var(CREDENTIALS_PATH_ENV_VAR) {
        return PathBuf::from(path);
    }
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(".solvebio").join("credentials")
}

/// Strips trailing slashes so paths can be appended with a leading `/`.
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host_strips_trailing_slashes() {
        assert_eq!(normalize_host("https://api.example.com//"), "https://api.example.com");
        assert_eq!(normalize_host(" http://localhost:8000 "), "http://localhost:8000");
    }

    #[test]
    fn test_default_host_is_already_normalized() {
        assert_eq!(normalize_host(DEFAULT_API_HOST), DEFAULT_API_HOST);
    }

    #[test]
    fn test_credentials_path_env_override() {
        let original = std::env::var_os(CREDENTIALS_PATH_ENV_VAR);

        std::env::set_var(CREDENTIALS_PATH_ENV_VAR, "/custom/credentials");
        assert_eq!(credentials_path(), PathBuf::from("/custom/credentials"));

        match original {
            Some(val) => std::env::set_var(CREDENTIALS_PATH_ENV_VAR, val),
            None => std::env::remove_var(CREDENTIALS_PATH_ENV_VAR),
        }
    }
}
