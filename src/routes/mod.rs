//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module stitches view shells, auth flows, and the guarded `/api`
//! surface under a single Axum router, with static assets served from disk
//! and everything unregistered falling through to 404.

pub mod auth;
pub mod guards;
pub mod users;
pub mod views;

use std::path::PathBuf;

use axum::Router;
use axum::http::{HeaderValue, StatusCode, header};
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Resolve the directory holding the built client bundle.
fn assets_dir() -> PathBuf {
    std::env::var("ASSETS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(views::dashboard))
        .route("/login", get(views::login))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout))
        .route("/api/users/me", get(users::me))
        .route("/api/users/me/password", post(users::change_password))
        .nest_service("/assets", ServeDir::new(assets_dir()))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
