//! Supabase-compatible HTTP client for auth (`/auth/v1`) and rows (`/rest/v1`).
//!
//! DESIGN
//! ======
//! Thin wrapper over `reqwest`. The client owns the provider-side session
//! (access/refresh token pair) and mirrors it into the key-value store under
//! `provider-session`, so a fresh process can re-validate an old session.
//! Response parsing lives in pure functions for testability.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx answers become `ProviderError::Rejected` carrying the provider's
//! own message. Anything that prevents an answer becomes `Transport`, and an
//! undecodable 2xx body becomes `Malformed`.

#[cfg(test)]
#[path = "supabase_test.rs"]
mod supabase_test;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::provider::{AuthProvider, ProfileStore};
use super::types::{AccountMetadata, Principal, ProfileRow, ProfileUpdate, ProviderError};
use crate::config::ProviderConfig;
use crate::util::persistence::{KeyValueStore, load_json, save_json};

pub const SESSION_KEY: &str = "provider-session";
pub const PROFILE_TABLE: &str = "users";
pub const PROFILE_COLUMNS: &str = "id,email,full_name,created_at,updated_at,avatar_url";

/// Refresh this many seconds before the provider's stated expiry.
const EXPIRY_MARGIN_SECS: i64 = 10;

// =============================================================================
// SESSION
// =============================================================================

/// Provider-side session tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds at which the access token stops being valid.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl ProviderSession {
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at - EXPIRY_MARGIN_SECS <= now)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    storage: Option<Arc<dyn KeyValueStore>>,
    session: Mutex<Option<ProviderSession>>,
}

impl SupabaseClient {
    /// Build a client with no persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            storage: None,
            session: Mutex::new(None),
        })
    }

    /// Attach durable storage and restore any session saved there.
    #[must_use]
    pub fn with_storage(self, storage: Arc<dyn KeyValueStore>) -> Self {
        let restored = match load_json::<ProviderSession>(storage.as_ref(), SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable provider session");
                None
            }
        };
        Self { storage: Some(storage), session: Mutex::new(restored), ..self }
    }

    /// Current provider session, if any.
    #[must_use]
    pub fn session(&self) -> Option<ProviderSession> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_session(&self, session: Option<ProviderSession>) {
        if let Some(storage) = &self.storage {
            let result = match &session {
                Some(s) => save_json(storage.as_ref(), SESSION_KEY, s),
                None => storage.remove(SESSION_KEY),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "failed to persist provider session");
            }
        }
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Keep the session of a sign-in or sign-up only when it came with a
    /// user; a bare token must not sign anyone in on the next reload.
    fn adopt(&self, outcome: AuthOutcome) -> Option<Principal> {
        match (outcome.session, outcome.principal) {
            (Some(session), Some(principal)) => {
                self.store_session(Some(session));
                Some(principal)
            }
            (Some(_), None) => {
                tracing::warn!("auth response carried a session but no user; discarding it");
                None
            }
            (None, principal) => principal,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        auth_endpoint(&self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        rest_endpoint(&self.base_url, table)
    }

    /// Bearer token: the session's access token, else the API key.
    fn bearer(&self) -> String {
        self.session()
            .map_or_else(|| self.api_key.clone(), |s| s.access_token)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ProviderError> {
        let response = request
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(parse_error(status, &text));
        }
        Ok(text)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<(), ProviderError> {
        tracing::debug!("refreshing expired provider session");
        let body = self
            .send(
                self.http
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "refresh_token")])
                    .bearer_auth(&self.api_key)
                    .json(&serde_json::json!({ "refresh_token": refresh_token })),
            )
            .await?;
        let outcome = parse_auth_response(&body, unix_now())?;
        match outcome.session {
            Some(session) => {
                self.store_session(Some(session));
                Ok(())
            }
            None => Err(ProviderError::Malformed("refresh response carried no session".into())),
        }
    }
}

#[async_trait::async_trait]
impl AuthProvider for SupabaseClient {
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<Principal>, ProviderError> {
        let body = self
            .send(
                self.http
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "password")])
                    .bearer_auth(&self.api_key)
                    .json(&serde_json::json!({ "email": email, "password": password })),
            )
            .await?;
        Ok(self.adopt(parse_auth_response(&body, unix_now())?))
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: &AccountMetadata,
    ) -> Result<Option<Principal>, ProviderError> {
        let body = self
            .send(
                self.http
                    .post(self.auth_url("signup"))
                    .bearer_auth(&self.api_key)
                    .json(&serde_json::json!({ "email": email, "password": password, "data": metadata })),
            )
            .await?;
        Ok(self.adopt(parse_auth_response(&body, unix_now())?))
    }

    async fn invalidate_session(&self) -> Result<(), ProviderError> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        // Local session goes first so a failed remote call cannot resurrect it.
        self.store_session(None);
        self.send(
            self.http
                .post(self.auth_url("logout"))
                .bearer_auth(&session.access_token),
        )
        .await?;
        Ok(())
    }

    async fn current_principal(&self) -> Result<Option<Principal>, ProviderError> {
        let Some(mut session) = self.session() else {
            return Ok(None);
        };

        if session.is_expired(unix_now()) {
            let Some(refresh_token) = session.refresh_token.clone() else {
                self.store_session(None);
                return Ok(None);
            };
            if let Err(e) = self.refresh(&refresh_token).await {
                if e.provider_message().is_some() {
                    self.store_session(None);
                }
                return Err(e);
            }
            session = self.session().unwrap_or(session);
        }

        let result = self
            .send(
                self.http
                    .get(self.auth_url("user"))
                    .bearer_auth(&session.access_token),
            )
            .await;
        match result {
            Ok(body) => parse_principal(&body).map(Some),
            Err(e) => {
                if e.is_unauthorized() {
                    self.store_session(None);
                }
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl ProfileStore for SupabaseClient {
    async fn update_profile_row(&self, id: &str, update: &ProfileUpdate) -> Result<(), ProviderError> {
        self.send(
            self.http
                .patch(self.rest_url(PROFILE_TABLE))
                .query(&[("id", format!("eq.{id}"))])
                .bearer_auth(self.bearer())
                .header("Prefer", "return=minimal")
                .json(update),
        )
        .await?;
        Ok(())
    }

    async fn fetch_profile_row(&self, id: &str) -> Result<Option<ProfileRow>, ProviderError> {
        let body = self
            .send(
                self.http
                    .get(self.rest_url(PROFILE_TABLE))
                    .query(&[("id", format!("eq.{id}")), ("select", PROFILE_COLUMNS.to_owned())])
                    .bearer_auth(self.bearer()),
            )
            .await?;
        parse_profile_rows(&body)
    }
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn auth_endpoint(base_url: &str, path: &str) -> String {
    format!("{base_url}/auth/v1/{path}")
}

pub(crate) fn rest_endpoint(base_url: &str, table: &str) -> String {
    format!("{base_url}/rest/v1/{table}")
}

/// Result of a token or sign-up call.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct AuthOutcome {
    pub(crate) session: Option<ProviderSession>,
    pub(crate) principal: Option<Principal>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<Principal>,
}

/// Decode a token or sign-up response. Sign-up answers with a bare user
/// object when email confirmation is pending, and with a full session otherwise.
pub(crate) fn parse_auth_response(body: &str, now: i64) -> Result<AuthOutcome, ProviderError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if value.get("access_token").is_some() {
        let token: TokenResponse = serde_json::from_value(value).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let expires_at = token
            .expires_at
            .or_else(|| token.expires_in.map(|secs| now + secs));
        return Ok(AuthOutcome {
            session: Some(ProviderSession {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                expires_at,
            }),
            principal: token.user,
        });
    }

    if value.get("id").is_some() {
        let principal: Principal = serde_json::from_value(value).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        return Ok(AuthOutcome { session: None, principal: Some(principal) });
    }

    let principal = match value.get("user") {
        Some(user) if !user.is_null() => {
            Some(serde_json::from_value(user.clone()).map_err(|e| ProviderError::Malformed(e.to_string()))?)
        }
        _ => None,
    };
    Ok(AuthOutcome { session: None, principal })
}

pub(crate) fn parse_principal(body: &str) -> Result<Principal, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

pub(crate) fn parse_profile_rows(body: &str) -> Result<Option<ProfileRow>, ProviderError> {
    let rows: Vec<ProfileRow> = serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    Ok(rows.into_iter().next())
}

/// Build a rejection from a non-2xx answer, preferring the provider's own wording.
pub(crate) fn parse_error(status: u16, body: &str) -> ProviderError {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|field| value.get(*field).and_then(|v| v.as_str()).map(str::to_owned))
        });
    let message = from_json
        .or_else(|| Some(body.trim().to_owned()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("request failed with status {status}"));
    ProviderError::Rejected { status, message }
}

fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
