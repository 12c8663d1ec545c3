//! User lookup route.
//!
//! ERROR HANDLING
//! ==============
//! Every failure answers `{"error": "..."}` with a fixed message. Provider
//! details are logged, never returned.

#[cfg(test)]
#[path = "users_test.rs"]
mod users_test;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use userapp_client::net::types::ProfileRow;

use crate::state::AppState;

/// Public shape of a user row.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<ProfileRow> for UserResponse {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            avatar_url: row.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserLookupError {
    MissingId,
    NotFound,
    Upstream,
}

impl UserLookupError {
    fn status(self) -> StatusCode {
        match self {
            Self::MissingId => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::MissingId => "User ID is required",
            Self::NotFound => "User not found",
            Self::Upstream => "Failed to fetch user",
        }
    }
}

impl IntoResponse for UserLookupError {
    fn into_response(self) -> Response {
        (self.status(), Json(serde_json::json!({ "error": self.message() }))).into_response()
    }
}

/// `GET /api/user/{id}` — return the user row in camelCase.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, UserLookupError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(UserLookupError::MissingId);
    }

    let row = state.profiles.fetch_profile_row(id).await.map_err(|e| {
        tracing::error!(user_id = %id, error = %e, "user lookup failed");
        UserLookupError::Upstream
    })?;

    match row {
        Some(row) => Ok(Json(row.into())),
        None => {
            tracing::debug!(user_id = %id, "user not found");
            Err(UserLookupError::NotFound)
        }
    }
}

/// `GET /api/user` and `GET /api/user/`.
pub async fn missing_user_id() -> UserLookupError {
    UserLookupError::MissingId
}
