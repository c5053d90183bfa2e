mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use crate::services::password::PasswordHasher;
use crate::services::session::{PgSessionStore, SessionConfig, SessionManager, spawn_expiry_sweep};
use crate::services::store::PgUserStore;
use crate::services::strategy::LocalStrategy;
use crate::services::user::UserDirectory;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    let users = UserDirectory::new(
        Arc::new(PgUserStore::new(pool.clone())),
        PasswordHasher::from_env(),
    );
    let sessions = SessionManager::new(Arc::new(PgSessionStore::new(pool)), SessionConfig::from_env())
        .with_strategy(Arc::new(LocalStrategy::new(users.clone())));
    let state = state::AppState::new(users, sessions);

    // Reclaims expired session rows in the background.
    let _sweeper = spawn_expiry_sweep(state.sessions.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "serverkeeper listening");
    axum::serve(listener, app).await.expect("server failed");
}
