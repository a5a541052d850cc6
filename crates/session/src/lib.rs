//! Who is logged in, and how the dashboard finds out.
//!
//! A [`SessionStore`] is built once by the UI root and handed to whatever
//! needs the current user. Its state moves
//! `Uninitialized -> Loading -> Ready(user) | Error(message)` and is
//! published over a `watch` channel so views can follow it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use trialdesk_api::{Identity, ServiceError, User};
use trialdesk_api_client::TrialApi;
use trialdesk_local_store::{KeyValueStore, get_json};

/// Local-storage key holding the logged-in user as JSON.
pub const SESSION_USER_KEY: &str = "trialdesk.session.user";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    /// The bootstrap login is running. Entered once per `init`.
    Loading,
    Ready(Option<User>),
    Error(String),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Ready(user) => user.as_ref(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

pub struct SessionStore {
    api: Arc<dyn TrialApi>,
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn TrialApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            api,
            storage,
            state,
        }
    }

    /// Log in `identity` unless the session has already been initialized.
    ///
    /// Failures land in [`SessionState::Error`]; this never returns an error.
    pub async fn init(&self, identity: Identity) -> SessionState {
        let started = self.state.send_if_modified(|state| {
            if *state == SessionState::Uninitialized {
                *state = SessionState::Loading;
                true
            } else {
                false
            }
        });
        if !started {
            debug!("session already initialized");
            return self.state();
        }

        debug!(%identity, "session bootstrap");
        let next = match self.api.login(identity).await {
            Ok(user) => SessionState::Ready(Some(user)),
            Err(e) => {
                warn!(%identity, error = %e, "session bootstrap failed");
                SessionState::Error(e.to_string())
            }
        };

        // A logout or teardown while the login was in flight wins, and the
        // dropped login must not reach storage either.
        // Persisting under the state lock orders it against `logout`.
        let applied = self.state.send_if_modified(|state| {
            if !state.is_loading() {
                return false;
            }
            if let Some(user) = next.user() {
                self.persist(user);
            }
            *state = next.clone();
            true
        });
        if !applied {
            debug!("session changed during bootstrap, result dropped");
        } else if let Some(user) = next.user() {
            info!(user = user.id(), role = %user.role(), "logged in");
        }
        self.state()
    }

    /// Switch to another account. Does not pass through `Loading`.
    pub async fn login(&self, identity: Identity) -> Result<User, ServiceError> {
        let user = self.api.login(identity).await?;
        self.persist(&user);
        info!(user = user.id(), role = %user.role(), "logged in");
        self.state.send_replace(SessionState::Ready(Some(user.clone())));
        Ok(user)
    }

    pub fn logout(&self) {
        self.state.send_replace(SessionState::Ready(None));
        if let Err(e) = self.storage.remove(SESSION_USER_KEY) {
            warn!(error = %e, "failed to clear persisted session");
        }
        info!("logged out");
    }

    /// Forget the in-memory session. Persisted data is left alone.
    pub fn teardown(&self) {
        self.state.send_replace(SessionState::Uninitialized);
        debug!("session torn down");
    }

    /// The user saved by the last login, if readable.
    pub fn persisted_user(&self) -> Option<User> {
        match get_json(self.storage.as_ref(), SESSION_USER_KEY) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable persisted session");
                None
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error().map(str::to_string)
    }

    fn persist(&self, user: &User) {
        if let Err(e) = trialdesk_local_store::set_json(self.storage.as_ref(), SESSION_USER_KEY, user)
        {
            warn!(error = %e, "failed to persist session");
        }
    }
}
