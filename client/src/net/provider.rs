//! Provider seams consumed by the session store, pages, and the server route.
//!
//! The hosted provider is reached only through these traits so tests can
//! substitute scripted fakes for network calls.

use super::types::{AccountMetadata, Principal, ProfileRow, ProfileUpdate, ProviderError};

/// Authentication operations of the hosted provider.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Check an email/password pair. `Ok(None)` means the provider accepted
    /// the request but returned no user.
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<Principal>, ProviderError>;

    /// Create an account carrying `metadata`.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: &AccountMetadata,
    ) -> Result<Option<Principal>, ProviderError>;

    /// End the provider-side session.
    async fn invalidate_session(&self) -> Result<(), ProviderError>;

    /// Resolve the user behind whatever session the environment holds.
    async fn current_principal(&self) -> Result<Option<Principal>, ProviderError>;
}

/// Row access to the provider's `users` table.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn update_profile_row(&self, id: &str, update: &ProfileUpdate) -> Result<(), ProviderError>;

    async fn fetch_profile_row(&self, id: &str) -> Result<Option<ProfileRow>, ProviderError>;
}
