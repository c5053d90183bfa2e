//! Route guards — extractors gating handlers on session state.
//!
//! DESIGN
//! ======
//! All three guards run the same check (cookie token, session lookup with
//! rolling refresh) and differ only in the failure channel: view guards
//! redirect, the API guard answers 401 with no body, and the anonymous
//! guard inverts the predicate to keep logged-in users off the login flow.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{error, warn};

use crate::routes::auth::COOKIE_NAME;
use crate::services::session::SessionIdentity;
use crate::state::AppState;

fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(COOKIE_NAME)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Requires a valid session; rejects with a redirect to the login view.
/// Use on view routes and flows that end in a rendered page.
pub struct ViewerSession {
    pub identity: SessionIdentity,
    pub token: String,
}

impl<S> FromRequestParts<S> for ViewerSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Err(Redirect::to("/login"));
        };

        let app = AppState::from_ref(state);
        match app.sessions.authenticate(&token).await {
            Ok(Some(identity)) => Ok(Self { identity, token }),
            Ok(None) => Err(Redirect::to("/login")),
            Err(e) => {
                error!(error = %e, "session lookup failed");
                Err(Redirect::to("/login"))
            }
        }
    }
}

/// Requires a valid session; rejects with a bare 401. Use on `/api` routes,
/// which must never answer with a redirect.
pub struct ApiSession {
    pub identity: SessionIdentity,
    pub token: String,
}

impl<S> FromRequestParts<S> for ApiSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Err(StatusCode::UNAUTHORIZED);
        };

        let app = AppState::from_ref(state);
        match app.sessions.authenticate(&token).await {
            Ok(Some(identity)) => Ok(Self { identity, token }),
            Ok(None) => Err(StatusCode::UNAUTHORIZED),
            Err(e) => {
                error!(error = %e, "session lookup failed");
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// Passes only when no valid session is attached; an authenticated request
/// is bounced to the dashboard instead of re-entering the login flow.
pub struct Anonymous;

impl<S> FromRequestParts<S> for Anonymous
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Ok(Self);
        };

        let app = AppState::from_ref(state);
        match app.sessions.authenticate(&token).await {
            Ok(Some(_)) => Err(Redirect::to("/")),
            Ok(None) => Ok(Self),
            Err(e) => {
                // Fail open so the login page stays reachable while the
                // session store is down.
                warn!(error = %e, "session lookup failed; treating request as anonymous");
                Ok(Self)
            }
        }
    }
}

#[cfg(test)]
#[path = "guards_test.rs"]
mod tests;
