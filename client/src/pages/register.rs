//! Registration page: create an account and sign it in.

#[cfg(test)]
#[path = "register_test.rs"]
mod register_test;

use super::SubmitOutcome;
use super::login::{INVALID_EMAIL, PASSWORD_TOO_SHORT};
use crate::state::auth::{REGISTRATION_FAILED, SessionStore};
use crate::util::auth::LANDING_PATH;
use crate::util::validate::{MIN_FULL_NAME_LEN, MIN_PASSWORD_LEN, has_min_chars, is_valid_email, normalize_email};

pub const NAME_TOO_SHORT: &str = "Name must be at least 3 characters";
pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";

/// Validated registration form.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterInput {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterInput")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fields are checked in form order; the first failure wins.
pub fn validate_register_input(
    email: &str,
    full_name: &str,
    password: &str,
    confirm_password: &str,
) -> Result<RegisterInput, &'static str> {
    if !is_valid_email(email) {
        return Err(INVALID_EMAIL);
    }
    let full_name = full_name.trim();
    if !has_min_chars(full_name, MIN_FULL_NAME_LEN) {
        return Err(NAME_TOO_SHORT);
    }
    if !has_min_chars(password, MIN_PASSWORD_LEN) || !has_min_chars(confirm_password, MIN_PASSWORD_LEN) {
        return Err(PASSWORD_TOO_SHORT);
    }
    if password != confirm_password {
        return Err(PASSWORDS_DO_NOT_MATCH);
    }
    Ok(RegisterInput { email: normalize_email(email), full_name: full_name.to_owned(), password: password.to_owned() })
}

pub async fn submit_register(store: &SessionStore, input: &RegisterInput) -> SubmitOutcome {
    if store.sign_up(&input.email, &input.password, &input.full_name).await {
        SubmitOutcome::Redirect(LANDING_PATH)
    } else {
        SubmitOutcome::Failed(store.snapshot().last_error.unwrap_or_else(|| REGISTRATION_FAILED.to_owned()))
    }
}
