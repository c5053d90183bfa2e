//! View routes — server-rendered shells that bootstrap the client app.

use axum::response::Html;

use crate::routes::guards::Anonymous;

const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.html");
const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");

#[must_use]
pub fn render_shell(template: &str, page_title: &str) -> String {
    template.replace("{{PAGE_TITLE}}", page_title)
}

/// `GET /` — the dashboard shell. Unguarded: the shell itself is inert and
/// every data call it makes goes through the guarded `/api` routes.
pub async fn dashboard() -> Html<String> {
    Html(render_shell(DASHBOARD_TEMPLATE, "Serverkeeper | Dashboard"))
}

/// `GET /login` — the login shell, for signed-out visitors only.
pub async fn login(_guard: Anonymous) -> Html<String> {
    Html(render_shell(LOGIN_TEMPLATE, "Serverkeeper | Sign in"))
}

#[cfg(test)]
#[path = "views_test.rs"]
mod tests;
