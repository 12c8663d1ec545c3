//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and user-aware pages to coordinate login redirects
//! and identity-dependent output. `SessionStore` is created once by the
//! application root and shared by reference; there is no global instance.
//!
//! DESIGN
//! ======
//! State lives in a `watch` channel so observers see every mutation as it
//! is applied. State-mutating operations are serialized through an async
//! gate: a second call waits for the first to finish, so the call issued
//! last always decides the final state.
//!
//! ERROR HANDLING
//! ==============
//! Operations never return errors. Provider rejections surface verbatim in
//! `last_error`; transport and decode failures surface as a generic message.
//! A failed session reload is treated as "signed out" and sets no error.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use crate::net::provider::AuthProvider;
use crate::net::types::{AccountMetadata, Principal, ProviderError};
use crate::util::persistence::{KeyValueStore, load_json, save_json};

/// Storage key of the persisted identity fragment.
pub const PERSIST_KEY: &str = "auth-storage";

pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";

// =============================================================================
// IDENTITY
// =============================================================================

/// The signed-in user's normalized attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Identity {
    /// Normalize a provider principal. Missing email becomes `""`; missing or
    /// empty optional fields become `None`.
    #[must_use]
    pub fn from_principal(principal: Principal) -> Self {
        let metadata = principal.user_metadata.unwrap_or_default();
        Self {
            id: principal.id,
            email: principal.email.unwrap_or_default(),
            full_name: metadata.full_name.filter(|s| !s.is_empty()),
            avatar_url: metadata.avatar_url.filter(|s| !s.is_empty()),
            created_at: principal.created_at,
            updated_at: principal.updated_at,
        }
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Authentication state tracking the current user, loading status, and last error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// The part of `SessionState` that survives a restart.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedAuth {
    #[serde(default)]
    user: Option<Identity>,
}

// =============================================================================
// SESSION STORE
// =============================================================================

pub struct SessionStore {
    provider: Arc<dyn AuthProvider>,
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
    gate: Mutex<()>,
}

impl SessionStore {
    /// Create the store, restoring any identity persisted by an earlier run.
    pub fn new(provider: Arc<dyn AuthProvider>, storage: Arc<dyn KeyValueStore>) -> Self {
        let identity = restore_identity(storage.as_ref());
        if let Some(identity) = &identity {
            tracing::debug!(user_id = %identity.id, "restored persisted identity");
        }
        let (state, _) = watch::channel(SessionState { identity, loading: false, last_error: None });
        Self { provider, storage, state, gate: Mutex::new(()) }
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    /// Sign in with email and password. Returns whether an identity was set.
    pub async fn sign_in(&self, email: &str, password: &str) -> bool {
        let _gate = self.gate.lock().await;
        self.begin();
        tracing::info!("sign in started");

        match self.provider.verify_credentials(email, password).await {
            Ok(Some(principal)) => {
                let identity = Identity::from_principal(principal);
                tracing::info!(user_id = %identity.id, "sign in succeeded");
                self.finish_signed_in(identity);
                true
            }
            Ok(None) => {
                tracing::warn!("sign in returned no user");
                self.finish_failed(AUTHENTICATION_FAILED.to_owned());
                false
            }
            Err(e) => {
                self.finish_failed(failure_message(&e, LOGIN_FAILED, "sign in"));
                false
            }
        }
    }

    /// Create an account and sign it in. The identity always carries
    /// `full_name` exactly as given, since a new account may not echo it back.
    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> bool {
        let _gate = self.gate.lock().await;
        self.begin();
        tracing::info!("sign up started");

        let metadata = AccountMetadata { full_name: full_name.to_owned() };
        match self.provider.create_account(email, password, &metadata).await {
            Ok(Some(principal)) => {
                let identity = Identity { full_name: Some(full_name.to_owned()), ..Identity::from_principal(principal) };
                tracing::info!(user_id = %identity.id, "sign up succeeded");
                self.finish_signed_in(identity);
                true
            }
            Ok(None) => {
                tracing::warn!("sign up returned no user");
                self.finish_failed(REGISTRATION_FAILED.to_owned());
                false
            }
            Err(e) => {
                self.finish_failed(failure_message(&e, REGISTRATION_FAILED, "sign up"));
                false
            }
        }
    }

    /// Sign out. Always clears the local identity, even when the provider
    /// call fails.
    pub async fn sign_out(&self) {
        let _gate = self.gate.lock().await;
        self.begin();

        if let Err(e) = self.provider.invalidate_session().await {
            tracing::warn!(error = %e, "provider sign out failed; clearing local session anyway");
        }
        self.apply(|state| {
            state.identity = None;
            state.last_error = None;
            state.loading = false;
        });
        tracing::info!("signed out");
    }

    /// Re-validate the session held by the environment and rebuild the
    /// identity from it. Any doubt about the session clears the identity.
    pub async fn load_user(&self) {
        let _gate = self.gate.lock().await;
        self.begin();

        match self.provider.current_principal().await {
            Ok(Some(principal)) => {
                let identity = Identity::from_principal(principal);
                tracing::debug!(user_id = %identity.id, "session is valid");
                self.finish_signed_in(identity);
            }
            Ok(None) => {
                tracing::debug!("no active session");
                self.finish_signed_out();
            }
            Err(e) => {
                tracing::warn!(error = %e, "session check failed; treating as signed out");
                self.finish_signed_out();
            }
        }
    }

    pub fn clear_error(&self) {
        self.apply(|state| state.last_error = None);
    }

    fn begin(&self) {
        self.apply(|state| {
            state.loading = true;
            state.last_error = None;
        });
    }

    fn finish_signed_in(&self, identity: Identity) {
        self.apply(|state| {
            state.identity = Some(identity);
            state.last_error = None;
            state.loading = false;
        });
    }

    fn finish_signed_out(&self) {
        self.apply(|state| {
            state.identity = None;
            state.loading = false;
        });
    }

    fn finish_failed(&self, message: String) {
        self.apply(|state| {
            state.last_error = Some(message);
            state.loading = false;
        });
    }

    /// Mutate state, notify observers, and persist the identity if it changed.
    fn apply(&self, mutate: impl FnOnce(&mut SessionState)) {
        let mut changed = None;
        self.state.send_modify(|state| {
            let before = state.identity.clone();
            mutate(state);
            if state.identity != before {
                changed = Some(state.identity.clone());
            }
        });
        if let Some(identity) = changed {
            self.persist(identity);
        }
    }

    fn persist(&self, identity: Option<Identity>) {
        let fragment = PersistedAuth { user: identity };
        if let Err(e) = save_json(self.storage.as_ref(), PERSIST_KEY, &fragment) {
            tracing::warn!(error = %e, "failed to persist session identity");
        }
    }
}

fn restore_identity(storage: &dyn KeyValueStore) -> Option<Identity> {
    match load_json::<PersistedAuth>(storage, PERSIST_KEY) {
        Ok(fragment) => fragment.and_then(|f| f.user),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable persisted identity");
            None
        }
    }
}

/// Message stored in `last_error` for a failed sign-in or sign-up.
fn failure_message(error: &ProviderError, generic: &str, operation: &str) -> String {
    match error.provider_message() {
        Some(message) => {
            tracing::warn!(error = %error, "{operation} rejected by provider");
            message.to_owned()
        }
        None => {
            tracing::error!(error = %error, "{operation} failed");
            generic.to_owned()
        }
    }
}
