//! Client session context
//!
//! A [`Session`] owns the credential store used by an API client and
//! publishes the authentication state machine:
//!
//! ```text
//! Authenticated --401--> Refreshing --refreshed--> Authenticated
//!                            |
//!                            +--failed / no refresh token--> LoggedOut
//! ```
//!
//! `LoggedOut` is left only when new credentials are stored. Hosts watch
//! the state through [`Session::subscribe`] and decide how to send the user
//! back to the login entry point.

use crate::error::SessionResult;
use crate::store::CredentialStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Storage key of the access token
pub const ACCESS_KEY: &str = "access";

/// Storage key of the refresh token
pub const REFRESH_KEY: &str = "refresh";

/// Access/refresh token pair issued at login
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Authentication state of a session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Credentials are present and assumed valid
    Authenticated,
    /// An access token refresh is in flight
    Refreshing,
    /// Credentials were cleared; the user must log in at `redirect_to`
    LoggedOut { redirect_to: String },
}

impl SessionState {
    pub fn is_logged_out(&self) -> bool {
        matches!(self, Self::LoggedOut { .. })
    }
}

/// Credential context shared by every request of a client
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
    state: Arc<watch::Sender<SessionState>>,
    login_path: String,
}

impl Session {
    /// Create a session over `store`
    ///
    /// The initial state is `Authenticated` when the store already holds an
    /// access or refresh token, `LoggedOut` otherwise.
    pub fn new(store: Arc<dyn CredentialStore>, login_path: impl Into<String>) -> Self {
        let login_path = login_path.into();
        let has_credentials = matches!(read_token(store.as_ref(), ACCESS_KEY), Ok(Some(_)))
            || matches!(read_token(store.as_ref(), REFRESH_KEY), Ok(Some(_)));

        let initial = if has_credentials {
            SessionState::Authenticated
        } else {
            SessionState::LoggedOut {
                redirect_to: login_path.clone(),
            }
        };
        let (state, _) = watch::channel(initial);

        Self {
            store,
            state: Arc::new(state),
            login_path,
        }
    }

    /// Login entry point users are sent to once the session is invalidated
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Current access token, if any
    pub fn access_token(&self) -> SessionResult<Option<String>> {
        read_token(self.store.as_ref(), ACCESS_KEY)
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> SessionResult<Option<String>> {
        read_token(self.store.as_ref(), REFRESH_KEY)
    }

    /// Persist a freshly issued access token
    ///
    /// Returns `false` without touching the store when the session was
    /// logged out in the meantime; only a new login leaves `LoggedOut`.
    pub fn set_access_token(&self, access: &str) -> SessionResult<bool> {
        let mut stored = Ok(false);
        self.transition_with(|state| {
            if state.is_logged_out() {
                return None;
            }
            stored = self.store.set(ACCESS_KEY, access).map(|()| true);
            stored.as_ref().ok().map(|_| SessionState::Authenticated)
        });
        stored
    }

    /// Persist both tokens after a successful login
    pub fn store_credentials(&self, credentials: &Credentials) -> SessionResult<()> {
        let mut stored = Ok(());
        self.transition_with(|_| {
            stored = self
                .store
                .set(ACCESS_KEY, &credentials.access)
                .and_then(|()| self.store.set(REFRESH_KEY, &credentials.refresh));
            stored.as_ref().ok().map(|()| SessionState::Authenticated)
        });
        stored
    }

    /// Remove both tokens from storage
    pub fn clear(&self) -> SessionResult<()> {
        // Attempt both removals even if the first fails
        let access = self.store.remove(ACCESS_KEY);
        let refresh = self.store.remove(REFRESH_KEY);
        access.and(refresh)
    }

    /// Mark the start of a token refresh; a logged out session stays logged out
    pub fn begin_refresh(&self) {
        self.transition_with(|state| (!state.is_logged_out()).then_some(SessionState::Refreshing));
    }

    /// Clear credentials and move to `LoggedOut`
    ///
    /// The state changes even when clearing the store fails, so observers
    /// always learn the session is gone. Returns the login redirect target.
    pub fn invalidate(&self) -> String {
        let redirect_to = self.login_path.clone();
        self.transition_with(|_| {
            if let Err(e) = self.clear() {
                warn!("Failed to clear stored credentials: {e}");
            }
            Some(SessionState::LoggedOut {
                redirect_to: redirect_to.clone(),
            })
        });
        redirect_to
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Run `step` while holding the state lock and apply the state it returns
    ///
    /// Store writes made inside `step` are therefore ordered with every other
    /// transition. `None` keeps the current state.
    fn transition_with<F>(&self, step: F)
    where
        F: FnOnce(&SessionState) -> Option<SessionState>,
    {
        self.state.send_if_modified(|state| {
            let Some(next) = step(state) else {
                return false;
            };
            if *state == next {
                return false;
            }
            debug!(previous = ?state, ?next, "Session state changed");
            *state = next;
            true
        });
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state.borrow())
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

/// Empty values count as absent
fn read_token(store: &dyn CredentialStore, key: &str) -> SessionResult<Option<String>> {
    Ok(store.get(key)?.filter(|token| !token.is_empty()))
}
