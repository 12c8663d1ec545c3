use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use userapp_client::net::provider::ProfileStore;
use userapp_client::net::types::{ProfileUpdate, ProviderError};

use super::*;

/// Rows kept in memory; `fail` makes every lookup error.
#[derive(Default)]
struct FakeRows {
    rows: Vec<ProfileRow>,
    fail: Option<ProviderError>,
    lookups: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ProfileStore for FakeRows {
    async fn update_profile_row(&self, _id: &str, _update: &ProfileUpdate) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn fetch_profile_row(&self, id: &str) -> Result<Option<ProfileRow>, ProviderError> {
        self.lookups.lock().unwrap().push(id.to_owned());
        if let Some(e) = &self.fail {
            return Err(e.clone());
        }
        Ok(self.rows.iter().find(|r| r.id == id).cloned())
    }
}

fn ada() -> ProfileRow {
    ProfileRow {
        id: "u1".into(),
        email: "ada@example.com".into(),
        full_name: Some("Ada".into()),
        created_at: Some("2024-01-01T00:00:00Z".into()),
        updated_at: Some("2024-01-02T00:00:00Z".into()),
        avatar_url: None,
    }
}

async fn call(rows: Arc<FakeRows>, id: &str) -> (StatusCode, serde_json::Value) {
    let state = AppState::new(rows);
    let response = get_user(State(state), Path(id.to_owned())).await.into_response();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn existing_user_is_returned_in_camel_case() {
    let rows = Arc::new(FakeRows { rows: vec![ada()], ..FakeRows::default() });
    let (status, body) = call(rows, "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "id": "u1",
            "email": "ada@example.com",
            "fullName": "Ada",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
            "avatarUrl": null
        })
    );
}

#[tokio::test]
async fn unknown_user_is_404() {
    let rows = Arc::new(FakeRows { rows: vec![ada()], ..FakeRows::default() });
    let (status, body) = call(rows, "nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "error": "User not found" }));
}

#[tokio::test]
async fn provider_failure_is_500() {
    let rows = Arc::new(FakeRows {
        fail: Some(ProviderError::Rejected { status: 401, message: "Invalid API key".into() }),
        ..FakeRows::default()
    });
    let (status, body) = call(rows, "u1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "error": "Failed to fetch user" }));
}

#[tokio::test]
async fn blank_id_is_400_without_lookup() {
    let rows = Arc::new(FakeRows::default());
    let (status, body) = call(rows.clone(), "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "User ID is required" }));
    assert!(rows.lookups.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_id_route_is_400() {
    let response = missing_user_id().await.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&body).unwrap(), serde_json::json!({ "error": "User ID is required" }));
}

#[test]
fn user_response_from_row_keeps_fields() {
    let response = UserResponse::from(ada());
    assert_eq!(response.id, "u1");
    assert_eq!(response.full_name.as_deref(), Some("Ada"));
}
