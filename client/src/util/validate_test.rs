use super::*;

#[test]
fn accepts_plain_addresses() {
    assert!(is_valid_email("a@b.com"));
    assert!(is_valid_email("  ada.lovelace+test@example.co.uk "));
}

#[test]
fn rejects_missing_parts() {
    assert!(!is_valid_email(""));
    assert!(!is_valid_email("ada"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("ada@"));
    assert!(!is_valid_email("ada@example"));
}

#[test]
fn rejects_malformed_domains_and_whitespace() {
    assert!(!is_valid_email("ada@@example.com"));
    assert!(!is_valid_email("ada@example..com"));
    assert!(!is_valid_email("ada@.com"));
    assert!(!is_valid_email("a da@example.com"));
}

#[test]
fn normalize_email_trims_and_lowercases() {
    assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
}

#[test]
fn has_min_chars_counts_characters() {
    assert!(has_min_chars("secret", MIN_PASSWORD_LEN));
    assert!(!has_min_chars("short", MIN_PASSWORD_LEN));
    assert!(has_min_chars("  ab  ", MIN_FULL_NAME_LEN));
    assert!(!has_min_chars("  ab  ".trim(), MIN_FULL_NAME_LEN));
    assert!(has_min_chars("Zoë", MIN_FULL_NAME_LEN));
}
