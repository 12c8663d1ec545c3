//! Provider wire DTOs and the provider error taxonomy.
//!
//! DESIGN
//! ======
//! These types mirror the hosted provider's JSON so serde decoding stays
//! lossless. Normalization into the app's own `Identity` happens in
//! `state::auth`, never here.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

// =============================================================================
// PRINCIPAL
// =============================================================================

/// Raw authenticated-user object returned by the auth provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque unique identifier.
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata supplied at sign-up.
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The subset of `user_metadata` the app reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub avatar_url: Option<String>,
}

/// Metadata attached to a freshly created account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountMetadata {
    pub full_name: String,
}

// =============================================================================
// PROFILE ROWS
// =============================================================================

/// A row of the provider's `users` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Column set written by a profile edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    /// RFC 3339 timestamp of the edit.
    pub updated_at: String,
}

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by provider calls.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered and refused the request. `message` is the
    /// provider's own wording and is safe to show to the user.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a provider answer (network, timeout).
    #[error("provider request failed: {0}")]
    Transport(String),

    /// The provider answered with a body we could not decode.
    #[error("provider response malformed: {0}")]
    Malformed(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ProviderError {
    /// Provider-authored message, present only for rejections.
    #[must_use]
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => Some(message),
            Self::Transport(_) | Self::Malformed(_) | Self::ClientBuild(_) => None,
        }
    }

    /// Whether the failure means the current access token is no longer valid.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401 | 403, .. })
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}
