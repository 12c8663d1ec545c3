//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration: input validation, the store or
//! provider call, and the view model the front end prints. Rendering lives
//! with the caller.

pub mod dashboard;
pub mod login;
pub mod navbar;
pub mod profile;
pub mod register;
pub mod settings;

/// Result of submitting the login or registration form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Signed in; go to this path.
    Redirect(&'static str),
    /// Rejected before reaching the store.
    Invalid(&'static str),
    /// The store reported a failure.
    Failed(String),
}
