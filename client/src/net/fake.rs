//! In-memory provider doubles for page and guard tests.

use std::sync::Mutex;

use super::provider::{AuthProvider, ProfileStore};
use super::types::{AccountMetadata, Principal, ProfileRow, ProfileUpdate, ProviderError};

/// Accepts one fixed account and echoes it from every session check.
pub(crate) struct FakeAuth {
    pub email: String,
    pub password: String,
    pub principal: Principal,
    /// When set, every call fails with this error.
    pub fail_with: Option<ProviderError>,
    /// Set by a successful sign-in or sign-up, cleared by sign-out.
    pub signed_in: Mutex<bool>,
}

impl FakeAuth {
    pub fn new(email: &str, password: &str, full_name: Option<&str>) -> Self {
        Self {
            email: email.to_owned(),
            password: password.to_owned(),
            principal: Principal {
                id: "u1".into(),
                email: Some(email.to_owned()),
                user_metadata: Some(super::types::UserMetadata {
                    full_name: full_name.map(str::to_owned),
                    avatar_url: None,
                }),
                created_at: Some("2024-01-01T00:00:00Z".into()),
                updated_at: None,
            },
            fail_with: None,
            signed_in: Mutex::new(false),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self { fail_with: Some(error), ..Self::new("a@b.com", "secret1", None) }
    }

    fn check(&self) -> Result<(), ProviderError> {
        self.fail_with.clone().map_or(Ok(()), Err)
    }
}

#[async_trait::async_trait]
impl AuthProvider for FakeAuth {
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<Principal>, ProviderError> {
        self.check()?;
        if email != self.email || password != self.password {
            return Err(ProviderError::Rejected { status: 400, message: "Invalid login credentials".into() });
        }
        *self.signed_in.lock().unwrap() = true;
        Ok(Some(self.principal.clone()))
    }

    async fn create_account(
        &self,
        email: &str,
        _password: &str,
        metadata: &AccountMetadata,
    ) -> Result<Option<Principal>, ProviderError> {
        self.check()?;
        if email == self.email {
            return Err(ProviderError::Rejected { status: 422, message: "User already registered".into() });
        }
        *self.signed_in.lock().unwrap() = true;
        let mut principal = self.principal.clone();
        principal.email = Some(email.to_owned());
        principal.user_metadata =
            Some(super::types::UserMetadata { full_name: Some(metadata.full_name.clone()), avatar_url: None });
        Ok(Some(principal))
    }

    async fn invalidate_session(&self) -> Result<(), ProviderError> {
        *self.signed_in.lock().unwrap() = false;
        self.check()
    }

    async fn current_principal(&self) -> Result<Option<Principal>, ProviderError> {
        self.check()?;
        Ok(self.signed_in.lock().unwrap().then(|| self.principal.clone()))
    }
}

/// Profile rows kept in memory; records every update.
#[derive(Default)]
pub(crate) struct FakeProfiles {
    pub rows: Mutex<Vec<ProfileRow>>,
    pub updates: Mutex<Vec<(String, ProfileUpdate)>>,
    pub fail_with: Option<ProviderError>,
}

#[async_trait::async_trait]
impl ProfileStore for FakeProfiles {
    async fn update_profile_row(&self, id: &str, update: &ProfileUpdate) -> Result<(), ProviderError> {
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }
        self.updates.lock().unwrap().push((id.to_owned(), update.clone()));
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
            row.full_name = Some(update.full_name.clone());
            row.updated_at = Some(update.updated_at.clone());
        }
        Ok(())
    }

    async fn fetch_profile_row(&self, id: &str) -> Result<Option<ProfileRow>, ProviderError> {
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }
}
