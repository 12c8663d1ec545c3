//! Settings page: account, notification, and privacy preferences.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use crate::state::auth::Identity;
use crate::state::settings::{AccountSettings, NotificationSettings, PrivacySettings, UserSettings, load_settings, save_settings};
use crate::util::persistence::{KeyValueStore, StorageError};
use crate::util::validate::{MIN_USERNAME_LEN, has_min_chars, is_valid_email, normalize_email};

pub const USERNAME_TOO_SHORT: &str = "Username must be at least 2 characters.";
pub const INVALID_EMAIL_ADDRESS: &str = "Please enter a valid email address.";

pub const ACCOUNT_SAVED: &str = "Account settings saved!";
pub const NOTIFICATIONS_SAVED: &str = "Notification settings saved!";
pub const PRIVACY_SAVED: &str = "Privacy settings saved!";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("failed to save settings: {0}")]
    Storage(#[from] StorageError),
}

pub fn validate_account(username: &str, email: &str) -> Result<AccountSettings, &'static str> {
    let username = username.trim();
    if !has_min_chars(username, MIN_USERNAME_LEN) {
        return Err(USERNAME_TOO_SHORT);
    }
    if !is_valid_email(email) {
        return Err(INVALID_EMAIL_ADDRESS);
    }
    Ok(AccountSettings { username: username.to_owned(), email: normalize_email(email) })
}

/// Load, change one section, and save back.
fn update_section(
    storage: &dyn KeyValueStore,
    identity: &Identity,
    change: impl FnOnce(&mut UserSettings),
) -> Result<UserSettings, SettingsError> {
    let mut settings = load_settings(storage, identity)?;
    change(&mut settings);
    save_settings(storage, &identity.id, &settings)?;
    Ok(settings)
}

/// # Errors
///
/// Validation failures and storage failures.
pub fn save_account(
    storage: &dyn KeyValueStore,
    identity: &Identity,
    username: &str,
    email: &str,
) -> Result<&'static str, SettingsError> {
    let account = validate_account(username, email).map_err(SettingsError::Invalid)?;
    update_section(storage, identity, |s| s.account = account)?;
    Ok(ACCOUNT_SAVED)
}

/// # Errors
///
/// Storage failures.
pub fn save_notifications(
    storage: &dyn KeyValueStore,
    identity: &Identity,
    notifications: NotificationSettings,
) -> Result<&'static str, SettingsError> {
    update_section(storage, identity, |s| s.notifications = notifications)?;
    Ok(NOTIFICATIONS_SAVED)
}

/// # Errors
///
/// Storage failures.
pub fn save_privacy(
    storage: &dyn KeyValueStore,
    identity: &Identity,
    privacy: PrivacySettings,
) -> Result<&'static str, SettingsError> {
    update_section(storage, identity, |s| s.privacy = privacy)?;
    Ok(PRIVACY_SAVED)
}
