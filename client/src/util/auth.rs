//! Route guard shared by every page.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every route applies identical redirect behavior: unauthenticated users are
//! sent to `/login` from protected pages, authenticated users are sent to the
//! landing page from `/login` and `/register`.
//!
//! DESIGN
//! ======
//! Redirect decisions are a pure function of (phase, session state, path) so
//! they can be tested without a store. `RouteGuard` wraps that function with
//! the two pieces of state it needs: whether the first session reload has
//! finished, and the path the user is currently on.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use tokio::sync::watch;

use crate::state::auth::{SessionState, SessionStore};

pub const LANDING_PATH: &str = "/dashboard";
pub const LOGIN_PATH: &str = "/login";

// =============================================================================
// POLICY
// =============================================================================

/// Which paths are reachable without a session, and where redirects go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePolicy {
    /// Reachable without a session.
    pub public_paths: Vec<String>,
    /// Pointless for a signed-in user; always a subset of `public_paths`.
    pub auth_paths: Vec<String>,
    pub landing_path: String,
    pub login_path: String,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            public_paths: vec!["/".into(), "/login".into(), "/register".into()],
            auth_paths: vec!["/login".into(), "/register".into()],
            landing_path: LANDING_PATH.into(),
            login_path: LOGIN_PATH.into(),
        }
    }
}

impl RoutePolicy {
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.public_paths.iter().any(|p| *p == path)
    }

    #[must_use]
    pub fn is_auth_page(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.auth_paths.iter().any(|p| *p == path)
    }
}

/// Strip any query or fragment and a trailing slash (root stays `/`).
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

// =============================================================================
// DECISIONS
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GuardPhase {
    /// The first session reload has not finished yet.
    #[default]
    Uninitialized,
    Ready,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render nothing yet.
    Block,
    Allow,
    Redirect(String),
}

/// Decide what to do with `path` given the current session state.
#[must_use]
pub fn decide(policy: &RoutePolicy, phase: GuardPhase, state: &SessionState, path: &str) -> GuardDecision {
    if phase == GuardPhase::Uninitialized {
        return GuardDecision::Block;
    }
    if state.loading {
        return GuardDecision::Allow;
    }
    match (state.is_authenticated(), policy.is_auth_page(path), policy.is_public(path)) {
        (true, true, _) => GuardDecision::Redirect(policy.landing_path.clone()),
        (false, _, false) => GuardDecision::Redirect(policy.login_path.clone()),
        _ => GuardDecision::Allow,
    }
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Clone, Debug)]
pub struct RouteGuard {
    policy: RoutePolicy,
    phase: GuardPhase,
    current_path: String,
}

impl RouteGuard {
    #[must_use]
    pub fn new(policy: RoutePolicy, path: &str) -> Self {
        Self { policy, phase: GuardPhase::Uninitialized, current_path: normalize_path(path) }
    }

    #[must_use]
    pub fn phase(&self) -> GuardPhase {
        self.phase
    }

    #[must_use]
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    #[must_use]
    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Decision for the current path without following it.
    #[must_use]
    pub fn evaluate(&self, state: &SessionState) -> GuardDecision {
        decide(&self.policy, self.phase, state, &self.current_path)
    }

    /// Evaluate and follow a redirect by moving to its target.
    pub fn reevaluate(&mut self, state: &SessionState) -> GuardDecision {
        let decision = self.evaluate(state);
        if let GuardDecision::Redirect(target) = &decision {
            tracing::debug!(from = %self.current_path, to = %target, "route guard redirect");
            self.current_path.clone_from(target);
        }
        decision
    }

    /// Move to `path` and re-evaluate.
    pub fn navigate(&mut self, path: &str, state: &SessionState) -> GuardDecision {
        self.current_path = normalize_path(path);
        self.reevaluate(state)
    }

    /// Run the application-load session reload once and leave
    /// `Uninitialized`, whatever the reload's outcome. Later calls only
    /// re-evaluate.
    pub async fn initialize(&mut self, store: &SessionStore) -> GuardDecision {
        if self.phase == GuardPhase::Uninitialized {
            store.load_user().await;
            self.phase = GuardPhase::Ready;
        }
        self.reevaluate(&store.snapshot())
    }

    /// Wait for the next store change and re-evaluate. Returns `None` once
    /// the store has been dropped.
    pub async fn follow(&mut self, rx: &mut watch::Receiver<SessionState>) -> Option<GuardDecision> {
        rx.changed().await.ok()?;
        let state = rx.borrow_and_update().clone();
        Some(self.reevaluate(&state))
    }
}
