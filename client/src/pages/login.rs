//! Login page: email + password sign-in.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use super::SubmitOutcome;
use crate::state::auth::{LOGIN_FAILED, SessionStore};
use crate::util::auth::LANDING_PATH;
use crate::util::validate::{MIN_PASSWORD_LEN, has_min_chars, is_valid_email, normalize_email};

pub const INVALID_EMAIL: &str = "Please enter a valid email";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

/// Validate the login form and return `(email, password)` ready to submit.
pub fn validate_login_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    if !is_valid_email(email) {
        return Err(INVALID_EMAIL);
    }
    if !has_min_chars(password, MIN_PASSWORD_LEN) {
        return Err(PASSWORD_TOO_SHORT);
    }
    Ok((normalize_email(email), password.to_owned()))
}

/// Validate, sign in, and pick where to go next.
pub async fn submit_login(store: &SessionStore, email: &str, password: &str) -> SubmitOutcome {
    let (email, password) = match validate_login_input(email, password) {
        Ok(input) => input,
        Err(message) => return SubmitOutcome::Invalid(message),
    };
    if store.sign_in(&email, &password).await {
        SubmitOutcome::Redirect(LANDING_PATH)
    } else {
        SubmitOutcome::Failed(store.snapshot().last_error.unwrap_or_else(|| LOGIN_FAILED.to_owned()))
    }
}
