//! Dashboard page: the authenticated landing route.
//!
//! SYSTEM CONTEXT
//! ==============
//! Summarizes the signed-in identity. Pure view model; the route guard has
//! already ensured an identity is present before this is built.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::state::auth::Identity;

pub const NOT_SET: &str = "Not set";
pub const NO_DATE: &str = "N/A";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Name used in the welcome line.
    pub greeting_name: String,
    pub initials: String,
    pub full_name: String,
    pub email: String,
    pub user_id: String,
    pub joined: String,
    pub account_age_days: i64,
}

impl DashboardSummary {
    #[must_use]
    pub fn build(identity: &Identity, now: OffsetDateTime) -> Self {
        let created = identity.created_at.as_deref().and_then(parse_timestamp);
        let full_name = identity.full_name.as_deref().filter(|n| !n.trim().is_empty());
        Self {
            greeting_name: full_name.map_or_else(|| email_local_part(&identity.email).to_owned(), str::to_owned),
            initials: initials(full_name.unwrap_or(&identity.email)),
            full_name: full_name.unwrap_or(NOT_SET).to_owned(),
            email: identity.email.clone(),
            user_id: identity.id.clone(),
            joined: created.map_or_else(|| NO_DATE.to_owned(), format_date),
            account_age_days: created.map_or(0, |c| (now - c).whole_days().max(0)),
        }
    }
}

fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// First letter of up to two words, uppercased.
#[must_use]
pub fn initials(name: &str) -> String {
    name.split_whitespace().filter_map(|word| word.chars().next()).take(2).flat_map(char::to_uppercase).collect()
}

/// `March 5, 2024`.
#[must_use]
pub fn format_date(at: OffsetDateTime) -> String {
    format!("{} {}, {}", at.month(), at.day(), at.year())
}
