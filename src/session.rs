//! The logged-in session: user plus bearer token, mirrored to a `LocalStore`.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::auth;
use crate::error::{PortalError, PortalResult};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, Session, User};
use crate::store::LocalStore;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Credential exchange and token checks against the backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> PortalResult<LoginResponse>;
    async fn register(&self, new_user: &RegisterRequest) -> PortalResult<RegisterResponse>;
    async fn current_user(&self, token: &str) -> PortalResult<User>;
}

/// What `restore` does with the stored token when the user check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// Any failure logs the user out and forgets the token.
    #[default]
    ClearOnAnyFailure,
    /// Network errors and 5xx keep the token for the next start; the
    /// current run is still logged out.
    KeepOnTransient,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    LoggedOut,
    Active(Session),
}

pub struct SessionHolder<B, S> {
    backend: B,
    store: S,
    policy: RestorePolicy,
    state: SessionState,
}

impl<B: AuthBackend, S: LocalStore> SessionHolder<B, S> {
    pub fn new(backend: B, store: S, policy: RestorePolicy) -> Self {
        Self {
            backend,
            store,
            policy,
            state: SessionState::Loading,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|s| s.token.as_str())
    }

    /// Startup check: turns a persisted token back into a session.
    pub async fn restore(&mut self) -> &SessionState {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no stored token");
                self.state = SessionState::LoggedOut;
                return &self.state;
            }
            Err(e) => {
                warn!(error = %e, "could not read stored token");
                self.state = SessionState::LoggedOut;
                return &self.state;
            }
        };

        if auth::is_expired(&token) == Some(true) {
            info!("stored token has expired");
            self.forget_token();
            self.state = SessionState::LoggedOut;
            return &self.state;
        }

        self.state = match self.backend.current_user(&token).await {
            Ok(user) => {
                info!(user = %user.email, role = %user.role, "session restored");
                SessionState::Active(Session { user, token })
            }
            Err(e) if e.is_transient() && self.policy == RestorePolicy::KeepOnTransient => {
                warn!(error = %e, "token check failed, keeping token for next start");
                SessionState::LoggedOut
            }
            Err(e) => {
                warn!(error = %e, "token check failed, clearing token");
                self.forget_token();
                SessionState::LoggedOut
            }
        };
        &self.state
    }

    pub async fn login(&mut self, email: &str, password: &str) -> PortalResult<Session> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(PortalError::Validation("password is required".into()));
        }

        let response = self
            .backend
            .login(&LoginRequest {
                email: email.trim().to_owned(),
                password: password.to_owned(),
            })
            .await?;
        self.start(response.user, response.token)
    }

    /// Registers a user. A token in the response logs them in straight away.
    pub async fn register(&mut self, new_user: RegisterRequest) -> PortalResult<User> {
        validate_email(&new_user.email)?;
        validate_password(&new_user.password)?;
        if new_user.full_name.trim().is_empty() {
            return Err(PortalError::Validation("full name is required".into()));
        }

        let response = self.backend.register(&new_user).await?;
        match response.token {
            Some(token) => Ok(self.start(response.user, token)?.user),
            None => {
                info!(user = %response.user.email, "registered, login required");
                Ok(response.user)
            }
        }
    }

    pub fn logout(&mut self) -> PortalResult<()> {
        if let SessionState::Active(session) = &self.state {
            info!(user = %session.user.email, "logged out");
        }
        self.state = SessionState::LoggedOut;
        self.store.clear()
    }

    fn start(&mut self, user: User, token: String) -> PortalResult<Session> {
        self.store.save(&token)?;
        info!(user = %user.email, role = %user.role, "logged in");
        let session = Session { user, token };
        self.state = SessionState::Active(session.clone());
        Ok(session)
    }

    fn forget_token(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear stored token");
        }
    }
}

/// Loose `local@domain.tld` shape check.
pub fn validate_email(email: &str) -> PortalResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(PortalError::Validation(format!("{email:?} is not an email address")))
    }
}

pub fn validate_password(password: &str) -> PortalResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PortalError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
