//! Auth routes — login, logout, and session cookie plumbing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;

use crate::routes::guards::{Anonymous, ViewerSession};
use crate::services::session::LoginError;
use crate::services::strategy::LocalStrategy;
use crate::services::user::RejectReason;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session.sid";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn cookie_secure() -> bool {
    // TODO: flip the default once the deployment terminates TLS.
    env_bool("COOKIE_SECURE").unwrap_or(false)
}

fn session_cookie(token: String, ttl: std::time::Duration) -> Cookie<'static> {
    let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .max_age(time::Duration::seconds(max_age))
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .max_age(time::Duration::ZERO)
        .build()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn login_failure(err: &LoginError) -> Response {
    let (status, reason) = match err {
        LoginError::Rejected(
            reason @ (RejectReason::MalformedEmail | RejectReason::InvalidCredentials),
        ) => (StatusCode::UNAUTHORIZED, *reason),
        LoginError::Rejected(RejectReason::Internal) => {
            (StatusCode::INTERNAL_SERVER_ERROR, RejectReason::Internal)
        }
        LoginError::UnknownStrategy(_) => {
            tracing::error!(error = %err, "login misconfiguration");
            (StatusCode::INTERNAL_SERVER_ERROR, RejectReason::Internal)
        }
    };
    (status, Json(json!({ "message": reason.to_string() }))).into_response()
}

/// `POST /auth/login` — verify credentials through the local strategy; on
/// success set the session cookie and send the client to the dashboard, on
/// failure answer with the collapsed reason only.
pub async fn login(
    State(state): State<AppState>,
    _guard: Anonymous,
    Json(body): Json<LoginRequest>,
) -> Response {
    match state
        .sessions
        .login(LocalStrategy::NAME, &body.email, &body.password)
        .await
    {
        Ok(established) => {
            tracing::info!(user_id = %established.identity.id, "login succeeded");
            let jar = CookieJar::new().add(session_cookie(established.token, state.sessions.ttl()));
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => login_failure(&err),
    }
}

/// `GET /auth/logout` — destroy the session, clear the cookie, return to the
/// login view.
pub async fn logout(State(state): State<AppState>, session: ViewerSession) -> impl IntoResponse {
    if let Err(err) = state.sessions.logout(&session.token).await {
        tracing::error!(error = %err, "session teardown failed");
    }

    let jar = CookieJar::new().add(clear_session_cookie());
    (jar, Redirect::to("/login"))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
