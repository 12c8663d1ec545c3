//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the provider row source behind the `ProfileStore` trait so handlers
//! can be exercised against an in-memory fake.

use std::sync::Arc;

use userapp_client::net::provider::ProfileStore;

/// Clone is required by Axum; the row source is shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }
}
