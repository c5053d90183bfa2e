//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the two service facades; both are cheap clones around `Arc`-wrapped
//! stores, constructed once in `main` and never reached through globals.

use crate::services::session::SessionManager;
use crate::services::user::UserDirectory;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-backed.
#[derive(Clone)]
pub struct AppState {
    pub users: UserDirectory,
    pub sessions: SessionManager,
}

impl AppState {
    #[must_use]
    pub fn new(users: UserDirectory, sessions: SessionManager) -> Self {
        Self { users, sessions }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
