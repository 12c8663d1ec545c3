//! Top navigation shown on authenticated pages.

#[cfg(test)]
#[path = "navbar_test.rs"]
mod navbar_test;

use crate::state::auth::SessionState;
use crate::util::auth::normalize_path;

pub const APP_TITLE: &str = "User App";

const ROUTES: [(&str, &str); 3] = [("/dashboard", "Dashboard"), ("/profile", "Profile"), ("/settings", "Settings")];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navbar {
    pub title: &'static str,
    pub items: Vec<NavItem>,
    /// Full name, else email.
    pub user_label: String,
}

#[must_use]
pub fn nav_items(current_path: &str) -> Vec<NavItem> {
    let current = normalize_path(current_path);
    ROUTES.iter().map(|&(href, label)| NavItem { href, label, active: current == href }).collect()
}

/// Navigation for the current session, or `None` when signed out.
#[must_use]
pub fn build_navbar(state: &SessionState, current_path: &str) -> Option<Navbar> {
    let identity = state.identity.as_ref()?;
    let user_label = identity.full_name.clone().filter(|n| !n.is_empty()).unwrap_or_else(|| identity.email.clone());
    Some(Navbar { title: APP_TITLE, items: nav_items(current_path), user_label })
}
