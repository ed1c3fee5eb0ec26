//! The session credential lifecycle.

use crate::cache::QueryCache;
use crate::client::ApiClient;
use crate::error::{ChatError, Result};
use crate::traits::SessionStorage;
use crate::types::{LoginResponse, Session, UserProfile};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Key of the token in the durable store.
pub const TOKEN_KEY: &str = "auth_token";

/// Session lifecycle notifications for the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Authenticated,
    ProfileLoaded,
    LoggedOut,
    /// The server rejected the token; the shell should show the login view.
    LoginRequired,
}

/// Owns the in-memory session and its durable mirror.
///
/// The write lock is held while the durable copy is updated, so readers
/// never observe the two copies disagreeing.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    state: RwLock<Session>,
    events: broadcast::Sender<SessionEvent>,
    /// Caches holding data of the current identity, dropped on every reset.
    caches: Mutex<Vec<Arc<QueryCache>>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            storage,
            state: RwLock::new(Session::default()),
            events,
            caches: Mutex::new(Vec::new()),
        }
    }

    /// Load the token left in the durable store by an earlier run.
    pub fn initialize(&self) -> Result<Session> {
        let stored = self.storage.get(TOKEN_KEY)?;
        let mut state = self.state.write();
        *state = match stored {
            Some(token) if !token.is_empty() => {
                tracing::info!("Restored session token from durable store");
                Session::with_token(token)
            }
            _ => Session::default(),
        };
        Ok(state.clone())
    }

    /// Exchange credentials for a token.
    ///
    /// The returned session has no profile; call [`Self::fetch_profile`].
    /// Any failure leaves the session cleared.
    pub async fn authenticate(
        &self,
        api: &ApiClient,
        username: &str,
        password: &str,
    ) -> Result<Session> {
        tracing::info!("Attempting login...");

        let outcome = match api.login(username, password).await {
            Ok(LoginResponse {
                access_token: Some(token),
            }) if !token.is_empty() => Ok(token),
            Ok(_) => Err(ChatError::Auth(
                "No access token received from server".to_string(),
            )),
            Err(ChatError::Http { status }) if status == 401 || status == 403 => {
                Err(ChatError::Auth("Invalid credentials".to_string()))
            }
            Err(e) => Err(ChatError::Auth(e.to_string())),
        };

        let token = match outcome {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.clear();
                return Err(e);
            }
        };

        if let Err(e) = self.store_token(&token) {
            self.clear();
            return Err(e);
        }

        tracing::info!("Login successful");
        let _ = self.events.send(SessionEvent::Authenticated);
        Ok(self.session())
    }

    /// Fetch the profile of the current token and attach it to the session.
    pub async fn fetch_profile(&self, api: &ApiClient) -> Result<UserProfile> {
        let token = self
            .current_token()
            .ok_or(ChatError::Unauthenticated("fetch user profile"))?;

        let profile = api.profile().await?;

        // The token may have changed while the request was in flight.
        let mut state = self.state.write();
        if state.token.as_deref() == Some(token.as_str()) {
            state.profile = Some(profile.clone());
            drop(state);
            let _ = self.events.send(SessionEvent::ProfileLoaded);
        } else {
            tracing::debug!("Discarding profile fetched for a superseded token");
        }
        Ok(profile)
    }

    /// Wipe the in-memory and durable copies. Idempotent.
    pub fn clear(&self) {
        let mut state = self.state.write();
        self.reset_locked(&mut state);
    }

    /// Explicit logout by the user.
    pub fn logout(&self) {
        tracing::info!("Logging out...");
        self.clear();
        let _ = self.events.send(SessionEvent::LoggedOut);
    }

    /// Forced reset after the server rejected the token.
    pub fn expire(&self) {
        self.clear();
        let _ = self.events.send(SessionEvent::LoginRequired);
    }

    /// Expire only if `token` is still the current one.
    ///
    /// A 401 for a token that has since been replaced by a fresh login must
    /// not log the new session out.
    pub fn expire_if_current(&self, token: &str) -> bool {
        let mut state = self.state.write();
        if state.token.as_deref() != Some(token) {
            return false;
        }
        self.reset_locked(&mut state);
        drop(state);
        let _ = self.events.send(SessionEvent::LoginRequired);
        true
    }

    /// Clear `cache` whenever the session is reset or the token changes.
    pub fn attach_cache(&self, cache: Arc<QueryCache>) {
        let mut caches = self.caches.lock();
        if !caches.iter().any(|c| Arc::ptr_eq(c, &cache)) {
            caches.push(cache);
        }
    }

    pub fn current_token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn session(&self) -> Session {
        self.state.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn reset_locked(&self, state: &mut Session) {
        *state = Session::default();
        self.clear_caches();
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            tracing::error!("Failed to remove token from durable store: {}", e);
        }
    }

    pub(crate) fn store_token(&self, token: &str) -> Result<()> {
        let mut state = self.state.write();
        self.storage.set(TOKEN_KEY, token)?;
        if state.token.as_deref() != Some(token) {
            self.clear_caches();
        }
        *state = Session::with_token(token);
        Ok(())
    }

    fn clear_caches(&self) {
        for cache in self.caches.lock().iter() {
            cache.clear();
        }
    }
}
