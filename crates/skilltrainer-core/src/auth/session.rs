use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::store::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Default login entry point used when the session is terminated
pub const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    RefreshPending,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unauthenticated => write!(f, "unauthenticated"),
            SessionState::Authenticated => write!(f, "authenticated"),
            SessionState::RefreshPending => write!(f, "refresh pending"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: String,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Never print token values
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Sink that sends the user back to the login entry point.
pub trait LoginRedirect: Send + Sync {
    fn redirect(&self, login_path: &str);
}

impl<F> LoginRedirect for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, login_path: &str) {
        self(login_path)
    }
}

/// Redirect that only records the event in the log.
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect(&self, login_path: &str) {
        warn!(login_path = login_path, "Session terminated, redirecting to login");
    }
}

/// Credential pair lifecycle shared by every request of an `ApiClient`.
///
/// The session owns the token store and the login redirect. A session built
/// with [`Session::detached`] has no store: no bearer header is attached and
/// no refresh can happen.
pub struct Session {
    store: Option<Arc<dyn TokenStore>>,
    redirect: Arc<dyn LoginRedirect>,
    login_path: String,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(
        store: Arc<dyn TokenStore>,
        redirect: Arc<dyn LoginRedirect>,
        login_path: impl Into<String>,
    ) -> Self {
        let session = Self {
            store: Some(store),
            redirect,
            login_path: login_path.into(),
            state: Mutex::new(SessionState::Unauthenticated),
        };
        // A refresh token left by an earlier process keeps the session alive
        if session.refresh_token().is_some() {
            session.set_state(SessionState::Authenticated);
        }
        session
    }

    pub fn detached(redirect: Arc<dyn LoginRedirect>, login_path: impl Into<String>) -> Self {
        Self {
            store: None,
            redirect,
            login_path: login_path.into(),
            state: Mutex::new(SessionState::Unauthenticated),
        }
    }

    /// True when a persisted store is reachable from this context
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn state(&self) -> SessionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(SessionState::Unauthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() != SessionState::Unauthenticated
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Persist a freshly issued pair (login, registration).
    pub fn set_credentials(&self, pair: &CredentialPair) -> anyhow::Result<()> {
        let store = self.require_store()?;
        store.set(ACCESS_TOKEN_KEY, &pair.access)?;
        store.set(REFRESH_TOKEN_KEY, &pair.refresh)?;
        self.set_state(SessionState::Authenticated);
        info!("Session established");
        Ok(())
    }

    /// Persist a rotated access token; the refresh token is kept.
    pub fn set_access_token(&self, access: &str) -> anyhow::Result<()> {
        self.require_store()?.set(ACCESS_TOKEN_KEY, access)?;
        self.set_state(SessionState::Authenticated);
        Ok(())
    }

    /// Persist a rotated refresh token.
    pub fn set_refresh_token(&self, refresh: &str) -> anyhow::Result<()> {
        self.require_store()?.set(REFRESH_TOKEN_KEY, refresh)
    }

    pub(crate) fn begin_refresh(&self) {
        self.set_state(SessionState::RefreshPending);
    }

    /// Remove both tokens. Best effort: store errors are logged, not returned.
    pub fn clear(&self) {
        if let Some(store) = &self.store {
            for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
                if let Err(e) = store.remove(key) {
                    warn!(key = key, error = %e, "Failed to clear stored token");
                }
            }
        }
        self.set_state(SessionState::Unauthenticated);
    }

    /// End the session: clear tokens and send the user to the login entry point.
    pub fn terminate(&self) {
        self.clear();
        self.redirect.redirect(&self.login_path);
    }

    fn read(&self, key: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read stored token");
                None
            }
        }
    }

    fn require_store(&self) -> anyhow::Result<&Arc<dyn TokenStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Session has no token store"))
    }

    fn set_state(&self, next: SessionState) {
        if let Ok(mut state) = self.state.lock() {
            let previous = *state;
            if previous != next {
                debug!(from = %previous, to = %next, "Session state change");
            }
            *state = next;
        }
    }
}
