//! View selection: the tri-state page switch.

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};

use crate::provider::UserHandle;
use crate::services::session::{Role, SessionView};
use crate::state::AppState;

const LOADING_TEMPLATE: &str = include_str!("../../templates/loading.html");
const HOME_TEMPLATE: &str = include_str!("../../templates/home.html");

/// `GET /`: render the page selected by the current session view.
pub async fn index(State(state): State<AppState>) -> Response {
    match state.session_view() {
        SessionView::Loading => Html(LOADING_TEMPLATE.to_owned()).into_response(),
        SessionView::Anonymous => Html(super::auth::render_login(None, "")).into_response(),
        SessionView::Authenticated { user, role } => {
            Html(render_home(&user, role.as_ref())).into_response()
        }
    }
}

/// Render the authenticated role view.
#[must_use]
pub(crate) fn render_home(user: &UserHandle, role: Option<&Role>) -> String {
    let who = user.email.as_deref().unwrap_or(&user.uid);
    let role_label = role.map_or("none", Role::label);
    HOME_TEMPLATE
        .replace("{{EMAIL}}", &super::escape_html(who))
        .replace("{{ROLE}}", &super::escape_html(role_label))
}

#[cfg(test)]
#[path = "home_test.rs"]
mod tests;
