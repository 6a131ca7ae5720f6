// Authentication flow: interactive login, logout and whoami.
//
// Login moves through: prompt for domain -> fetch the domain's auth
// descriptor -> (SSO required: stop) | prompt for email/password -> exchange
// for an API key -> persist. A failure before the key is persisted leaves the
// stored credential and the session untouched.
//
// Every public operation reports to the user through the `out` sink and
// turns recoverable failures into a falsy result. `Err` is reserved for
// local problems: terminal I/O or an unusable credential file.

use crate::api::{AuthApi, InstallReport, InstallReporter, TokenRequest};
use crate::config::DOMAIN_SUFFIX;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::session::Session;
use std::io::{self, Write};

/// Source of interactive login input.
pub trait Prompter {
    fn domain(&mut self) -> io::Result<String>;
    fn email(&mut self) -> io::Result<String>;
    /// Must not echo the input.
    fn password(&mut self) -> io::Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn { email: String },
    Failed,
    /// The domain only allows single sign-on. Terminal: the CLI exits
    /// non-zero and nothing is retried.
    SsoRequired { domain: String },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::LoggedIn { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub domain: String,
    pub email: String,
    pub role: Option<String>,
    pub api_key: String,
}

enum Collected {
    Credentials {
        domain: String,
        email: String,
        password: String,
    },
    SsoRequired(String),
    Failed,
}

pub struct AuthFlow<'a, W: Write> {
    session: Session,
    api: &'a dyn AuthApi,
    store: &'a dyn CredentialStore,
    reporter: &'a dyn InstallReporter,
    out: W,
}

/// `acme.solvebio.com` and `acme` name the same domain.
pub fn normalize_domain(input: &str) -> String {
    let domain = input.trim();
    domain
        .strip_suffix(DOMAIN_SUFFIX)
        .unwrap_or(domain)
        .to_string()
}

impl<'a, W: Write> AuthFlow<'a, W> {
    pub fn new(
        session: Session,
        api: &'a dyn AuthApi,
        store: &'a dyn CredentialStore,
        reporter: &'a dyn InstallReporter,
        out: W,
    ) -> Self {
        AuthFlow {
            session,
            api,
            store,
            reporter,
            out,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn say(&mut self, msg: &str) -> Result<()> {
        let line = self.session.annotate(msg);
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    /// Public endpoints are called without a key so a stale one cannot
    /// get in the way.
    fn anonymous(&self) -> Session {
        Session::new(self.session.api_host(), None)
    }

    /// Log in with `api_key` when given, otherwise interactively.
    pub fn login(
        &mut self,
        prompter: &mut dyn Prompter,
        api_key: Option<&str>,
    ) -> Result<LoginOutcome> {
        let (email, api_key) = match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => {
                self.session.set_api_key(key);
                match self.whoami(true)? {
                    Some(identity) => (identity.email, identity.api_key),
                    None => {
                        self.say("Login failed: the API key was rejected.")?;
                        return Ok(LoginOutcome::Failed);
                    }
                }
            }
            None => {
                let (domain, email, password) = match self.ask_for_credentials(prompter)? {
                    Collected::Credentials {
                        domain,
                        email,
                        password,
                    } => (domain, email, password),
                    Collected::SsoRequired(domain) => {
                        return Ok(LoginOutcome::SsoRequired { domain })
                    }
                    Collected::Failed => return Ok(LoginOutcome::Failed),
                };

                let req = TokenRequest {
                    domain,
                    email: email.clone(),
                    password,
                };
                match self.api.exchange_token(&self.anonymous(), &req) {
                    Ok(token) => (email, token),
                    Err(e) => {
                        tracing::debug!(error = %e, "token exchange failed");
                        self.say(&format!("Login failed: {}", e))?;
                        return Ok(LoginOutcome::Failed);
                    }
                }
            }
        };

        self.store.delete()?;
        self.store.save(&email.to_lowercase(), &api_key)?;
        self.session.set_api_key(&api_key);
        self.reporter
            .send_install_report(&self.session, &InstallReport::current());
        self.say(&format!("You are now logged-in as {}.", email))?;
        Ok(LoginOutcome::LoggedIn { email })
    }

    fn ask_for_credentials(&mut self, prompter: &mut dyn Prompter) -> Result<Collected> {
        self.say("Please enter your SolveBio credentials")?;
        let domain = normalize_domain(&prompter.domain()?);
        if domain.is_empty() {
            self.say("Domain, email, and password are all required.")?;
            return Ok(Collected::Failed);
        }

        let account = match self.api.account(&self.anonymous(), &domain) {
            Ok(account) => account,
            Err(e) => {
                tracing::debug!(%domain, error = %e, "domain lookup failed");
                self.say(&format!("Invalid domain: {}", domain))?;
                return Ok(Collected::Failed);
            }
        };

        if !account.authentication.supports_password() {
            self.say(&format!(
                "Your domain uses Single Sign-On (SSO). \
                 Please visit https://{}{}/settings/security \
                 for instructions on how to log in.",
                domain, DOMAIN_SUFFIX
            ))?;
            return Ok(Collected::SsoRequired(domain));
        }

        let email = prompter.email()?.trim().to_string();
        let password = prompter.password()?;
        if email.is_empty() || password.is_empty() {
            self.say("Domain, email, and password are all required.")?;
            return Ok(Collected::Failed);
        }
        Ok(Collected::Credentials {
            domain,
            email,
            password,
        })
    }

    /// Delete the stored credential. Returns `false` when nobody was logged in.
    pub fn logout(&mut self) -> Result<bool> {
        let stored = match self.store.get() {
            Ok(cred) => cred.is_some(),
            Err(e @ Error::Credentials { .. }) => {
                tracing::warn!(error = %e, "discarding unreadable credentials");
                true
            }
            Err(e) => return Err(e),
        };
        if stored {
            self.store.delete()?;
            self.session.clear_api_key();
            self.say("You have been logged out.")?;
            return Ok(true);
        }
        self.say("You are not logged-in.")?;
        Ok(false)
    }

    /// Resolve the current identity. The session key wins over the stored
    /// credential; a rejected key is cleared from the session.
    pub fn whoami(&mut self, silent: bool) -> Result<Option<Identity>> {
        if self.session.api_key().is_none() {
            match self.store.get() {
                Ok(Some(cred)) => self.session.set_api_key(&cred.api_key),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "ignoring unreadable credentials"),
            }
        }

        let api_key = match self.session.api_key() {
            Some(key) => key.to_string(),
            None => {
                if !silent {
                    self.say("You are not logged-in.")?;
                }
                return Ok(None);
            }
        };

        match self.api.current_user(&self.session) {
            Ok(user) => {
                let identity = Identity {
                    domain: user.account.domain,
                    email: user.email,
                    role: user.role,
                    api_key,
                };
                if !silent {
                    self.say(&format!(
                        "You are logged-in to the \"{}\" domain as {} with role {}.",
                        identity.domain,
                        identity.email,
                        identity.role.as_deref().unwrap_or("unknown")
                    ))?;
                }
                Ok(Some(identity))
            }
            Err(e) => {
                self.session.clear_api_key();
                if !silent {
                    self.say(&format!("Error: {}", e))?;
                    self.say("Invalid credentials. You may not be logged-in.")?;
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Account, AuthDescriptor, SamlDescriptor, User, UserAccount};
    use crate::config::DEFAULT_API_HOST;
    use crate::credentials::Credential;
    use crate::error::ApiError;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeApi {
        accounts: HashMap<String, AuthDescriptor>,
        users: HashMap<String, User>,
        token: Option<String>,
        exchanges: RefCell<Vec<TokenRequest>>,
    }

    impl FakeApi {
        fn with_example() -> Self {
            let mut api = FakeApi::default();
            api.accounts.insert(
                "example".into(),
                AuthDescriptor {
                    login: true,
                    saml: None,
                },
            );
            api.accounts.insert(
                "sso-co".into(),
                AuthDescriptor {
                    login: false,
                    saml: Some(SamlDescriptor::default()),
                },
            );
            api.users.insert(
                "abc123".into(),
                User {
                    email: "user@example.com".into(),
                    role: Some("member".into()),
                    account: UserAccount {
                        domain: "example".into(),
                    },
                },
            );
            api.token = Some("abc123".into());
            api
        }
    }

    fn unauthorized() -> crate::error::Error {
        ApiError {
            status: 401,
            message: "Invalid token.".into(),
        }
        .into()
    }

    impl AuthApi for FakeApi {
        fn account(&self, session: &Session, domain: &str) -> Result<Account> {
            assert_eq!(session.api_key(), None);
            self.accounts
                .get(domain)
                .map(|auth| Account {
                    domain: Some(domain.to_string()),
                    authentication: auth.clone(),
                })
                .ok_or_else(|| {
                    ApiError {
                        status: 404,
                        message: "Not found.".into(),
                    }
                    .into()
                })
        }

        fn exchange_token(&self, _session: &Session, req: &TokenRequest) -> Result<String> {
            self.exchanges.borrow_mut().push(req.clone());
            match (&self.token, req.password.as_str()) {
                (Some(token), "secret") => Ok(token.clone()),
                _ => Err(ApiError {
                    status: 400,
                    message: "Unable to log in with provided credentials.".into(),
                }
                .into()),
            }
        }

        fn current_user(&self, session: &Session) -> Result<User> {
            session
                .api_key()
                .and_then(|key| self.users.get(key).cloned())
                .ok_or_else(unauthorized)
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        cred: RefCell<Option<Credential>>,
        deletes: Cell<usize>,
    }

    impl CredentialStore for MemoryStore {
        fn save(&self, email: &str, api_key: &str) -> Result<()> {
            *self.cred.borrow_mut() = Some(Credential {
                email: email.into(),
                api_key: api_key.into(),
            });
            Ok(())
        }

        fn get(&self) -> Result<Option<Credential>> {
            Ok(self.cred.borrow().clone())
        }

        fn delete(&self) -> Result<()> {
            self.deletes.set(self.deletes.get() + 1);
            *self.cred.borrow_mut() = None;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        reports: RefCell<Vec<InstallReport>>,
    }

    impl InstallReporter for RecordingReporter {
        fn send_install_report(&self, _session: &Session, report: &InstallReport) {
            self.reports.borrow_mut().push(report.clone());
        }
    }

    struct ScriptedPrompter {
        domain: String,
        email: String,
        password: String,
        asked_password: bool,
    }

    impl ScriptedPrompter {
        fn new(domain: &str, email: &str, password: &str) -> Self {
            ScriptedPrompter {
                domain: domain.into(),
                email: email.into(),
                password: password.into(),
                asked_password: false,
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn domain(&mut self) -> io::Result<String> {
            Ok(self.domain.clone())
        }

        fn email(&mut self) -> io::Result<String> {
            Ok(self.email.clone())
        }

        fn password(&mut self) -> io::Result<String> {
            self.asked_password = true;
            Ok(self.password.clone())
        }
    }

    /// Prompter for flows that must never prompt.
    struct NoPrompt;

    impl Prompter for NoPrompt {
        fn domain(&mut self) -> io::Result<String> {
            panic!("unexpected domain prompt")
        }

        fn email(&mut self) -> io::Result<String> {
            panic!("unexpected email prompt")
        }

        fn password(&mut self) -> io::Result<String> {
            panic!("unexpected password prompt")
        }
    }

    fn session() -> Session {
        Session::new(DEFAULT_API_HOST, None)
    }

    #[test]
    fn test_interactive_login_persists_token() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();
        let mut prompter = ScriptedPrompter::new("example", "User@Example.com", "secret");

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        let outcome = flow.login(&mut prompter, None).unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::LoggedIn {
                email: "User@Example.com".into()
            }
        );
        assert_eq!(flow.session().api_key(), Some("abc123"));
        drop(flow);

        assert_eq!(
            store.get().unwrap(),
            Some(Credential {
                email: "user@example.com".into(),
                api_key: "abc123".into()
            })
        );
        assert_eq!(store.deletes.get(), 1);
        assert_eq!(reporter.reports.borrow().len(), 1);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("You are now logged-in as User@Example.com."));
    }

    #[test]
    fn test_login_then_whoami_returns_same_identity() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();
        let mut prompter = ScriptedPrompter::new("example.solvebio.com", "user@example.com", "secret");

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        assert!(flow.login(&mut prompter, None).unwrap().is_success());
        let identity = flow.whoami(false).unwrap().unwrap();
        assert_eq!(identity.domain, "example");
        assert_eq!(identity.email, "user@example.com");
        assert_eq!(identity.api_key, "abc123");
        drop(flow);

        assert_eq!(api.exchanges.borrow()[0].domain, "example");
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("You are logged-in to the \"example\" domain as user@example.com with role member."));
    }

    #[test]
    fn test_sso_domain_stops_before_password_prompt() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();
        let mut prompter = ScriptedPrompter::new("sso-co", "user@sso.co", "secret");

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        let outcome = flow.login(&mut prompter, None).unwrap();
        drop(flow);

        assert_eq!(
            outcome,
            LoginOutcome::SsoRequired {
                domain: "sso-co".into()
            }
        );
        assert!(!prompter.asked_password);
        assert!(api.exchanges.borrow().is_empty());
        assert_eq!(store.get().unwrap(), None);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("https://sso-co.solvebio.com/settings/security"));
    }

    #[test]
    fn test_invalid_domain_fails_without_side_effects() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        store.save("old@example.com", "old").unwrap();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();
        let mut prompter = ScriptedPrompter::new("nope", "user@example.com", "secret");

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        assert_eq!(flow.login(&mut prompter, None).unwrap(), LoginOutcome::Failed);
        drop(flow);

        assert_eq!(store.get().unwrap().unwrap().api_key, "old");
        assert!(reporter.reports.borrow().is_empty());
        assert!(String::from_utf8(out).unwrap().contains("Invalid domain: nope"));
    }

    #[test]
    fn test_failed_exchange_keeps_stored_credential() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        store.save("old@example.com", "old").unwrap();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();
        let mut prompter = ScriptedPrompter::new("example", "user@example.com", "wrong");

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        assert_eq!(flow.login(&mut prompter, None).unwrap(), LoginOutcome::Failed);
        assert_eq!(flow.session().api_key(), None);
        drop(flow);

        assert_eq!(store.deletes.get(), 0);
        assert_eq!(store.get().unwrap().unwrap().api_key, "old");
        assert!(reporter.reports.borrow().is_empty());
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Login failed: Unable to log in with provided credentials."));
    }

    #[test]
    fn test_missing_email_is_rejected() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();
        let mut prompter = ScriptedPrompter::new("example", "  ", "secret");

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        assert_eq!(flow.login(&mut prompter, None).unwrap(), LoginOutcome::Failed);
        drop(flow);

        assert!(api.exchanges.borrow().is_empty());
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Domain, email, and password are all required."));
    }

    #[test]
    fn test_login_with_api_key_validates_and_persists() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        let outcome = flow.login(&mut NoPrompt, Some("abc123")).unwrap();
        assert!(outcome.is_success());
        drop(flow);

        assert_eq!(store.get().unwrap().unwrap().email, "user@example.com");
        assert_eq!(reporter.reports.borrow().len(), 1);
    }

    #[test]
    fn test_login_with_rejected_api_key() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        assert_eq!(flow.login(&mut NoPrompt, Some("bogus")).unwrap(), LoginOutcome::Failed);
        assert_eq!(flow.session().api_key(), None);
        drop(flow);

        assert_eq!(store.get().unwrap(), None);
        assert!(reporter.reports.borrow().is_empty());
    }

    #[test]
    fn test_logout_twice() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        store.save("user@example.com", "abc123").unwrap();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();

        let mut flow = AuthFlow::new(session(), &api, &store, &reporter, &mut out);
        assert!(flow.logout().unwrap());
        assert!(!flow.logout().unwrap());
        drop(flow);

        assert_eq!(store.get().unwrap(), None);
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed, "You have been logged out.\nYou are not logged-in.\n");
    }

    #[test]
    fn test_logout_annotates_non_default_host() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();

        let local = Session::new("http://localhost:8000", None);
        let mut flow = AuthFlow::new(local, &api, &store, &reporter, &mut out);
        assert!(!flow.logout().unwrap());
        drop(flow);

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "You are not logged-in. (http://localhost:8000)\n"
        );
    }

    #[test]
    fn test_whoami_rejected_key_is_cleared() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();

        let stale = Session::new(DEFAULT_API_HOST, Some("expired".into()));
        let mut flow = AuthFlow::new(stale, &api, &store, &reporter, &mut out);
        assert_eq!(flow.whoami(false).unwrap(), None);
        assert_eq!(flow.session().api_key(), None);
        drop(flow);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Error: Invalid token."));
        assert!(printed.contains("Invalid credentials. You may not be logged-in."));
    }

    #[test]
    fn test_whoami_silent_never_prints() {
        let api = FakeApi::with_example();
        let store = MemoryStore::default();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();

        let mut flow = AuthFlow::new(
            Session::new(DEFAULT_API_HOST, Some("expired".into())),
            &api,
            &store,
            &reporter,
            &mut out,
        );
        assert_eq!(flow.whoami(true).unwrap(), None);
        assert_eq!(flow.whoami(true).unwrap(), None);
        store.save("user@example.com", "abc123").unwrap();
        assert!(flow.whoami(true).unwrap().is_some());
        drop(flow);

        assert!(out.is_empty());
    }

    #[test]
    fn test_session_key_overrides_stored_credential() {
        let mut api = FakeApi::with_example();
        api.users.insert(
            "session-key".into(),
            User {
                email: "other@example.com".into(),
                role: None,
                account: UserAccount {
                    domain: "example".into(),
                },
            },
        );
        let store = MemoryStore::default();
        store.save("user@example.com", "abc123").unwrap();
        let reporter = RecordingReporter::default();
        let mut out = Vec::new();

        let mut flow = AuthFlow::new(
            Session::new(DEFAULT_API_HOST, Some("session-key".into())),
            &api,
            &store,
            &reporter,
            &mut out,
        );
        let identity = flow.whoami(true).unwrap().unwrap();
        assert_eq!(identity.email, "other@example.com");
        assert_eq!(identity.api_key, "session-key");
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain(" acme.solvebio.com "), "acme");
        assert_eq!(normalize_domain("acme"), "acme");
    }
}
