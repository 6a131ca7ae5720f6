// Session state: the API host and the key used to authenticate requests.
// A `Session` is built once per CLI invocation and passed explicitly to the
// HTTP client and the auth flow instead of living in a global.

use crate::config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    api_host: String,
    api_key: Option<String>,
}

impl Session {
    pub fn new(api_host: &str, api_key: Option<String>) -> Self {
        Session {
            api_host: config::normalize_host(api_host),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Create a session from `SOLVEBIO_API_HOST` / `SOLVEBIO_API_KEY`.
    pub fn from_env() -> Self {
        Session::new(&config::api_host(), config::api_key())
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, key: &str) {
        self.api_key = Some(key.to_string());
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    pub fn is_default_host(&self) -> bool {
        self.api_host == config::DEFAULT_API_HOST
    }

    /// Appends ` (<host>)` to user-facing messages when talking to a
    /// non-production host.
    pub fn annotate(&self, msg: &str) -> String {
        if self.is_default_host() {
            msg.to_string()
        } else {
            format!("{} ({})", msg, self.api_host)
        }
    }

    /// Whether `url` points at this session's host. Relative paths always do.
    pub fn is_api_url(&self, url: &str) -> bool {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return true;
        }
        match url.strip_prefix(self.api_host.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }

    /// Join a relative API path onto the host. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.api_host, path)
        } else {
            format!("{}/{}", self.api_host, path)
        }
    }
}
