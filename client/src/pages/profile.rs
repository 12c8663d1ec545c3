//! Profile page: view and edit the signed-in user's display name.
//!
//! DESIGN
//! ======
//! The edit writes the provider's `users` row directly, then reloads the
//! session so every observer sees the refreshed identity.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::register::NAME_TOO_SHORT;
use crate::net::provider::ProfileStore;
use crate::net::types::ProfileUpdate;
use crate::state::auth::{Identity, SessionStore};
use crate::util::validate::{MIN_FULL_NAME_LEN, has_min_chars};

pub const PROFILE_UPDATED: &str = "Profile updated successfully!";
pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("not signed in")]
    NotSignedIn,
    /// Shown to the user as-is.
    #[error("{0}")]
    Provider(String),
}

/// Form fields shown on the profile page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileView {
    pub full_name: String,
    /// Read-only.
    pub email: String,
}

impl ProfileView {
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        Self { full_name: identity.full_name.clone().unwrap_or_default(), email: identity.email.clone() }
    }
}

pub fn validate_profile_input(full_name: &str) -> Result<String, &'static str> {
    let full_name = full_name.trim();
    if !has_min_chars(full_name, MIN_FULL_NAME_LEN) {
        return Err(NAME_TOO_SHORT);
    }
    Ok(full_name.to_owned())
}

/// Save a new display name for the signed-in user.
///
/// # Errors
///
/// Fails without calling the provider when nobody is signed in or the name
/// is invalid; otherwise surfaces the provider's rejection message.
pub async fn update_profile(
    store: &SessionStore,
    profiles: &dyn ProfileStore,
    full_name: &str,
    now: OffsetDateTime,
) -> Result<&'static str, ProfileError> {
    let identity = store.identity().ok_or(ProfileError::NotSignedIn)?;
    let full_name = validate_profile_input(full_name).map_err(ProfileError::Invalid)?;
    let updated_at = now.format(&Rfc3339).map_err(|e| {
        tracing::error!(error = %e, "failed to format profile timestamp");
        ProfileError::Provider(PROFILE_UPDATE_FAILED.to_owned())
    })?;

    profiles.update_profile_row(&identity.id, &ProfileUpdate { full_name, updated_at }).await.map_err(|e| {
        tracing::warn!(user_id = %identity.id, error = %e, "profile update failed");
        ProfileError::Provider(e.provider_message().unwrap_or(PROFILE_UPDATE_FAILED).to_owned())
    })?;

    tracing::info!(user_id = %identity.id, "profile updated");
    store.load_user().await;
    Ok(PROFILE_UPDATED)
}
