//! User API routes — on-demand profile fetch and password change.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::routes::guards::ApiSession;
use crate::services::user::PasswordChangeError;
use crate::state::AppState;

/// Public projection of a user record. Deliberately has no hash field, so
/// the hash cannot leak through serialization.
#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

/// `GET /api/users/me` — resolve the session identity to the full user
/// record. This is the one place the weak id reference is re-checked against
/// the store; a vanished user reads as an unauthorized session.
pub async fn me(
    State(state): State<AppState>,
    session: ApiSession,
) -> Result<Json<CurrentUser>, StatusCode> {
    let user = state
        .users
        .find_by_id(session.identity.id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "user fetch failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    Ok(Json(CurrentUser { id: user.id, email: user.email }))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `POST /api/users/me/password` — re-verify the current password, then
/// re-hash and overwrite.
pub async fn change_password(
    State(state): State<AppState>,
    session: ApiSession,
    Json(body): Json<ChangePasswordRequest>,
) -> Response {
    if body.new_password.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "empty password" })),
        )
            .into_response();
    }

    match state
        .users
        .change_password(session.identity.id, &body.current_password, &body.new_password)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(PasswordChangeError::WrongPassword) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "invalid credentials" })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, user_id = %session.identity.id, "password change failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "internal error" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
