// API client module: a small blocking HTTP client that talks to the
// SolveBio REST API. Requests are synchronous; every call blocks until the
// server answers or the transport fails. Nothing is retried here, callers
// decide what to do with an error.

use crate::error::{ApiError, Result};
use crate::session::Session;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for the best-effort install report; the login flow should
/// never hang on telemetry.
const INSTALL_REPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking client wrapping a reqwest `Client`. The host and key come from
/// the `Session` passed to each call.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

/// Public account descriptor returned by `GET /p/accounts/{domain}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub authentication: AuthDescriptor,
}

/// How a domain lets users sign in.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AuthDescriptor {
    #[serde(default)]
    pub login: bool,
    #[serde(rename = "SAML", default)]
    pub saml: Option<SamlDescriptor>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SamlDescriptor {
    #[serde(default)]
    pub simple_login: bool,
}

impl AuthDescriptor {
    /// Password login is possible directly or through SAML simple login.
    pub fn supports_password(&self) -> bool {
        self.login || self.saml.as_ref().map_or(false, |s| s.simple_login)
    }
}

/// Token exchange payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenRequest {
    pub domain: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct TokenResponse {
    token: String,
}

/// Identity returned by `GET /v1/user`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    pub account: UserAccount,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub domain: String,
}

/// Anonymous install details posted after a successful login.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstallReport {
    pub client: String,
    pub client_version: String,
    pub platform: String,
    pub architecture: String,
    pub os_family: String,
}

impl InstallReport {
    pub fn current() -> Self {
        InstallReport {
            client: "rust".into(),
            client_version: env!("CARGO_PKG_VERSION").into(),
            platform: std::env::consts::OS.into(),
            architecture: std::env::consts::ARCH.into(),
            os_family: std::env::consts::FAMILY.into(),
        }
    }
}

/// Endpoints used by the login/logout/whoami flow.
pub trait AuthApi {
    fn account(&self, session: &Session, domain: &str) -> Result<Account>;
    fn exchange_token(&self, session: &Session, req: &TokenRequest) -> Result<String>;
    fn current_user(&self, session: &Session) -> Result<User>;
}

/// Fire-and-forget install telemetry. Implementations must discard every
/// error; the caller never learns whether the report arrived.
pub trait InstallReporter {
    fn send_install_report(&self, session: &Session, report: &InstallReport);
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("solvebio-rust/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ApiClient { client })
    }

    /// Attach the bearer token when the session carries a key and `url` is on
    /// the session's host. Links to other hosts are fetched without it.
    fn authorize(&self, req: RequestBuilder, session: &Session, url: &str) -> RequestBuilder {
        match session.api_key() {
            Some(key) if session.is_api_url(url) => req.bearer_auth(key),
            Some(_) => {
                tracing::debug!(%url, "not sending credentials to a foreign host");
                req
            }
            None => req,
        }
    }

    /// Translate non-success statuses into `ApiError`, then decode JSON.
    fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
        let status = res.status();
        if !status.is_success() {
            let txt = res.text().unwrap_or_default();
            let err = ApiError::from_body(status.as_u16(), status.canonical_reason(), &txt);
            tracing::debug!(status = err.status, message = %err.message, "API request failed");
            return Err(err.into());
        }
        let body = res.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET `path` with query parameters.
    pub fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = session.url(path);
        tracing::debug!(%url, "GET");
        let req = self.authorize(self.client.get(&url), session, &url).query(query);
        Self::decode(req.send()?)
    }

    /// POST `body` as JSON to `path`.
    pub fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = session.url(path);
        tracing::debug!(%url, "POST json");
        let req = self.authorize(self.client.post(&url), session, &url).json(body);
        Self::decode(req.send()?)
    }

    /// POST `form` url-encoded to `path`.
    pub fn post_form<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        form: &B,
    ) -> Result<T> {
        self.post_form_with(session, path, form, None)
    }

    fn post_form_with<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        form: &B,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let url = session.url(path);
        tracing::debug!(%url, "POST form");
        let mut req = self.authorize(self.client.post(&url), session, &url).form(form);
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }
        Self::decode(req.send()?)
    }
}

impl AuthApi for ApiClient {
    fn account(&self, session: &Session, domain: &str) -> Result<Account> {
        self.get(session, &format!("/p/accounts/{}", domain), &[])
    }

    fn exchange_token(&self, session: &Session, req: &TokenRequest) -> Result<String> {
        let resp: TokenResponse = self.post_json(session, "/v1/auth/token", req)?;
        Ok(resp.token)
    }

    fn current_user(&self, session: &Session) -> Result<User> {
        self.get(session, "/v1/user", &[])
    }
}

impl InstallReporter for ApiClient {
    fn send_install_report(&self, session: &Session, report: &InstallReport) {
        let result: Result<serde_json::Value> = self.post_form_with(
            session,
            "/v1/reports/install",
            report,
            Some(INSTALL_REPORT_TIMEOUT),
        );
        if let Err(e) = result {
            tracing::debug!(error = %e, "install report discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_password_login() {
        let auth: AuthDescriptor = serde_json::from_str(r#"{"login": true}"#).unwrap();
        assert!(auth.supports_password());
    }

    #[test]
    fn test_descriptor_saml_simple_login() {
        let auth: AuthDescriptor =
            serde_json::from_str(r#"{"login": false, "SAML": {"simple_login": true}}"#).unwrap();
        assert!(auth.supports_password());
    }

    #[test]
    fn test_descriptor_sso_only() {
        let auth: AuthDescriptor = serde_json::from_str(r#"{"login": false, "SAML": {}}"#).unwrap();
        assert!(!auth.supports_password());
        let empty: AuthDescriptor = serde_json::from_str("{}").unwrap();
        assert!(!empty.supports_password());
    }

    #[test]
    fn test_user_parses_nested_domain() {
        let user: User = serde_json::from_str(
            r#"{"email": "user@example.com", "role": "owner", "account": {"domain": "example", "id": 4}}"#,
        )
        .unwrap();
        assert_eq!(user.account.domain, "example");
        assert_eq!(user.role.as_deref(), Some("owner"));
    }

    #[test]
    fn test_install_report_describes_this_build() {
        let report = InstallReport::current();
        assert_eq!(report.client, "rust");
        assert_eq!(report.client_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(report.platform, std::env::consts::OS);
    }
}
