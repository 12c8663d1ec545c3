use super::*;
use crate::state::settings::ProfileVisibility;
use crate::util::persistence::MemoryStore;

fn identity() -> Identity {
    Identity {
        id: "u1".into(),
        email: "ada@example.com".into(),
        full_name: Some("Ada".into()),
        avatar_url: None,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn validate_account_checks_username_then_email() {
    assert_eq!(validate_account(" a ", "ada@example.com"), Err("Username must be at least 2 characters."));
    assert_eq!(validate_account("Ada", "ada"), Err("Please enter a valid email address."));
    assert_eq!(
        validate_account(" Ada ", "Ada@Example.com"),
        Ok(AccountSettings { username: "Ada".into(), email: "ada@example.com".into() })
    );
}

#[test]
fn save_account_persists_and_reports() {
    let store = MemoryStore::new();
    assert_eq!(save_account(&store, &identity(), "Countess", "ada@example.com").unwrap(), ACCOUNT_SAVED);
    assert_eq!(load_settings(&store, &identity()).unwrap().account.username, "Countess");
}

#[test]
fn save_account_invalid_leaves_storage_untouched() {
    let store = MemoryStore::new();
    let err = save_account(&store, &identity(), "A", "ada@example.com").unwrap_err();
    assert!(matches!(err, SettingsError::Invalid(USERNAME_TOO_SHORT)));
    assert_eq!(store.get("settings:u1").unwrap(), None);
}

#[test]
fn sections_save_independently() {
    let store = MemoryStore::new();
    let notifications = NotificationSettings { marketing_emails: true, ..NotificationSettings::default() };
    let privacy = PrivacySettings { profile_visibility: ProfileVisibility::Contacts, two_factor_auth: true };

    assert_eq!(save_notifications(&store, &identity(), notifications.clone()).unwrap(), NOTIFICATIONS_SAVED);
    assert_eq!(save_privacy(&store, &identity(), privacy.clone()).unwrap(), PRIVACY_SAVED);

    let settings = load_settings(&store, &identity()).unwrap();
    assert_eq!(settings.notifications, notifications);
    assert_eq!(settings.privacy, privacy);
    assert_eq!(settings.account.username, "Ada");
}
