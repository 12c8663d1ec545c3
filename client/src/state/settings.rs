//! Per-user preferences: account, notifications, and privacy.
//!
//! SYSTEM CONTEXT
//! ==============
//! Settings are local preferences kept in the same key-value store as the
//! session fragment, one entry per user under `settings:{user id}`. They are
//! never sent to the provider.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::state::auth::Identity;
use crate::util::persistence::{KeyValueStore, StorageError, load_json, save_json};

/// Storage key for one user's settings.
#[must_use]
pub fn settings_key(user_id: &str) -> String {
    format!("settings:{user_id}")
}

// =============================================================================
// MODEL
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    /// Public display name.
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub marketing_emails: bool,
    pub security_alerts: bool,
    pub account_updates: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { email_notifications: true, marketing_emails: false, security_alerts: true, account_updates: true }
    }
}

/// Who may see the user's profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileVisibility {
    #[default]
    Public,
    Private,
    Contacts,
}

impl ProfileVisibility {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Contacts => "contacts",
        }
    }
}

impl fmt::Display for ProfileVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown profile visibility: {0}")]
pub struct UnknownVisibility(pub String);

impl FromStr for ProfileVisibility {
    type Err = UnknownVisibility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "contacts" => Ok(Self::Contacts),
            _ => Err(UnknownVisibility(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    pub two_factor_auth: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub account: AccountSettings,
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
}

impl UserSettings {
    /// Defaults for a user who has never saved settings. The account section
    /// is seeded from the identity.
    #[must_use]
    pub fn defaults_for(identity: &Identity) -> Self {
        Self {
            account: AccountSettings {
                username: identity.full_name.clone().unwrap_or_default(),
                email: identity.email.clone(),
            },
            ..Self::default()
        }
    }
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Load the user's settings, falling back to defaults when none were saved.
///
/// # Errors
///
/// Returns a storage error if the stored entry cannot be read or decoded.
pub fn load_settings(storage: &dyn KeyValueStore, identity: &Identity) -> Result<UserSettings, StorageError> {
    let saved = load_json::<UserSettings>(storage, &settings_key(&identity.id))?;
    Ok(saved.unwrap_or_else(|| UserSettings::defaults_for(identity)))
}

/// Persist the user's settings, replacing any earlier entry.
///
/// # Errors
///
/// Returns a storage error if the entry cannot be encoded or written.
pub fn save_settings(storage: &dyn KeyValueStore, user_id: &str, settings: &UserSettings) -> Result<(), StorageError> {
    save_json(storage, &settings_key(user_id), settings)?;
    tracing::debug!(user_id, "saved user settings");
    Ok(())
}
