use std::sync::Arc;

use super::*;
use crate::net::provider::AuthProvider;
use crate::net::types::{AccountMetadata, Principal, ProviderError};
use crate::state::auth::Identity;
use crate::util::persistence::MemoryStore;

fn signed_in() -> SessionState {
    SessionState {
        identity: Some(Identity {
            id: "u1".into(),
            email: "a@b.com".into(),
            full_name: None,
            avatar_url: None,
            created_at: None,
            updated_at: None,
        }),
        loading: false,
        last_error: None,
    }
}

fn signed_out() -> SessionState {
    SessionState::default()
}

fn ready(path: &str) -> RouteGuard {
    let mut guard = RouteGuard::new(RoutePolicy::default(), path);
    guard.phase = GuardPhase::Ready;
    guard
}

/// Provider whose session check always answers with the same result.
struct FixedSession(Result<Option<Principal>, ProviderError>);

#[async_trait::async_trait]
impl AuthProvider for FixedSession {
    async fn verify_credentials(&self, _email: &str, _password: &str) -> Result<Option<Principal>, ProviderError> {
        Ok(None)
    }

    async fn create_account(
        &self,
        _email: &str,
        _password: &str,
        _metadata: &AccountMetadata,
    ) -> Result<Option<Principal>, ProviderError> {
        Ok(None)
    }

    async fn invalidate_session(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn current_principal(&self) -> Result<Option<Principal>, ProviderError> {
        self.0.clone()
    }
}

fn store_with(session: Result<Option<Principal>, ProviderError>) -> SessionStore {
    SessionStore::new(Arc::new(FixedSession(session)), Arc::new(MemoryStore::new()))
}

fn principal() -> Principal {
    Principal { id: "u1".into(), email: Some("a@b.com".into()), ..Principal::default() }
}

// =============================================================================
// normalize_path
// =============================================================================

#[test]
fn normalize_strips_trailing_slash_query_and_fragment() {
    assert_eq!(normalize_path("/dashboard/"), "/dashboard");
    assert_eq!(normalize_path("/login?next=/profile"), "/login");
    assert_eq!(normalize_path("/register#form"), "/register");
}

#[test]
fn normalize_keeps_root() {
    assert_eq!(normalize_path("/"), "/");
    assert_eq!(normalize_path(""), "/");
    assert_eq!(normalize_path("/?x=1"), "/");
}

#[test]
fn normalize_adds_leading_slash() {
    assert_eq!(normalize_path("profile"), "/profile");
}

// =============================================================================
// RoutePolicy
// =============================================================================

#[test]
fn default_policy_classifies_paths() {
    let policy = RoutePolicy::default();
    assert!(policy.is_public("/"));
    assert!(policy.is_public("/login/"));
    assert!(policy.is_auth_page("/register"));
    assert!(!policy.is_auth_page("/"));
    assert!(!policy.is_public("/dashboard"));
    assert!(!policy.is_public("/settings"));
}

// =============================================================================
// decide
// =============================================================================

#[test]
fn uninitialized_blocks_everything() {
    let policy = RoutePolicy::default();
    for path in ["/", "/login", "/dashboard"] {
        assert_eq!(decide(&policy, GuardPhase::Uninitialized, &signed_out(), path), GuardDecision::Block);
        assert_eq!(decide(&policy, GuardPhase::Uninitialized, &signed_in(), path), GuardDecision::Block);
    }
}

#[test]
fn protected_path_without_identity_redirects_to_login() {
    let decision = decide(&RoutePolicy::default(), GuardPhase::Ready, &signed_out(), "/dashboard");
    assert_eq!(decision, GuardDecision::Redirect("/login".into()));
}

#[test]
fn login_with_identity_redirects_to_landing() {
    let decision = decide(&RoutePolicy::default(), GuardPhase::Ready, &signed_in(), "/login");
    assert_eq!(decision, GuardDecision::Redirect("/dashboard".into()));
}

#[test]
fn register_with_identity_redirects_to_landing() {
    let decision = decide(&RoutePolicy::default(), GuardPhase::Ready, &signed_in(), "/register/");
    assert_eq!(decision, GuardDecision::Redirect("/dashboard".into()));
}

#[test]
fn root_without_identity_is_allowed() {
    let decision = decide(&RoutePolicy::default(), GuardPhase::Ready, &signed_out(), "/");
    assert_eq!(decision, GuardDecision::Allow);
}

#[test]
fn root_with_identity_is_allowed() {
    let decision = decide(&RoutePolicy::default(), GuardPhase::Ready, &signed_in(), "/");
    assert_eq!(decision, GuardDecision::Allow);
}

#[test]
fn protected_path_with_identity_is_allowed() {
    let decision = decide(&RoutePolicy::default(), GuardPhase::Ready, &signed_in(), "/profile");
    assert_eq!(decision, GuardDecision::Allow);
}

#[test]
fn loading_suppresses_redirects() {
    let mut state = signed_out();
    state.loading = true;
    let decision = decide(&RoutePolicy::default(), GuardPhase::Ready, &state, "/dashboard");
    assert_eq!(decision, GuardDecision::Allow);
}

// =============================================================================
// RouteGuard
// =============================================================================

#[test]
fn new_guard_is_uninitialized_and_normalizes_path() {
    let guard = RouteGuard::new(RoutePolicy::default(), "/dashboard/?tab=1");
    assert_eq!(guard.phase(), GuardPhase::Uninitialized);
    assert_eq!(guard.current_path(), "/dashboard");
    assert_eq!(guard.evaluate(&signed_out()), GuardDecision::Block);
}

#[test]
fn evaluate_does_not_move() {
    let guard = ready("/dashboard");
    assert_eq!(guard.evaluate(&signed_out()), GuardDecision::Redirect("/login".into()));
    assert_eq!(guard.current_path(), "/dashboard");
}

#[test]
fn reevaluate_follows_redirect_then_settles() {
    let mut guard = ready("/dashboard");
    assert_eq!(guard.reevaluate(&signed_out()), GuardDecision::Redirect("/login".into()));
    assert_eq!(guard.current_path(), "/login");
    assert_eq!(guard.reevaluate(&signed_out()), GuardDecision::Allow);
}

#[test]
fn navigate_updates_path() {
    let mut guard = ready("/");
    assert_eq!(guard.navigate("/profile", &signed_in()), GuardDecision::Allow);
    assert_eq!(guard.current_path(), "/profile");
    assert_eq!(guard.navigate("/login", &signed_in()), GuardDecision::Redirect("/dashboard".into()));
    assert_eq!(guard.current_path(), "/dashboard");
}

#[tokio::test]
async fn initialize_becomes_ready_after_successful_reload() {
    let store = store_with(Ok(Some(principal())));
    let mut guard = RouteGuard::new(RoutePolicy::default(), "/login");

    let decision = guard.initialize(&store).await;

    assert_eq!(guard.phase(), GuardPhase::Ready);
    assert_eq!(decision, GuardDecision::Redirect("/dashboard".into()));
    assert!(store.snapshot().is_authenticated());
}

#[tokio::test]
async fn initialize_becomes_ready_after_failed_reload() {
    let store = store_with(Err(ProviderError::Transport("offline".into())));
    let mut guard = RouteGuard::new(RoutePolicy::default(), "/dashboard");

    let decision = guard.initialize(&store).await;

    assert_eq!(guard.phase(), GuardPhase::Ready);
    assert_eq!(decision, GuardDecision::Redirect("/login".into()));
}

#[tokio::test]
async fn follow_reacts_to_sign_out() {
    let store = store_with(Ok(Some(principal())));
    let mut guard = RouteGuard::new(RoutePolicy::default(), "/settings");
    assert_eq!(guard.initialize(&store).await, GuardDecision::Allow);

    let mut rx = store.subscribe();
    store.sign_out().await;

    // Intermediate loading states collapse into the latest value.
    let decision = guard.follow(&mut rx).await;
    assert_eq!(decision, Some(GuardDecision::Redirect("/login".into())));
    assert_eq!(guard.current_path(), "/login");
}

#[tokio::test]
async fn follow_ends_when_store_dropped() {
    let store = store_with(Ok(None));
    let mut rx = store.subscribe();
    drop(store);

    let mut guard = ready("/");
    assert_eq!(guard.follow(&mut rx).await, None);
}
