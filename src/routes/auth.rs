//! Auth routes: credential submission and sign-out.
//!
//! ERROR HANDLING
//! ==============
//! Every sign-in rejection, whatever the provider's reason, collapses to one
//! generic user-visible message; the specific reason only reaches the log.

use axum::Form;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use serde::Deserialize;
use tracing::{info, warn};

use crate::provider::UserHandle;
use crate::services::session::SessionView;
use crate::state::AppState;

const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");

/// The one user-visible sign-in failure message.
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// `GET /login`: the credential form, unless already signed in.
pub async fn login_page(State(state): State<AppState>) -> Response {
    if state.session_view().is_authenticated() {
        return Redirect::to("/").into_response();
    }
    Html(render_login(None, "")).into_response()
}

/// `POST /login`: forward credentials to the provider, verbatim and
/// unvalidated.
///
/// Success mutates nothing locally: the resolver observes the provider's
/// state change. Any rejection re-renders the form with the generic message.
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.provider.sign_in_with_password(&form.email, &form.password).await {
        Ok(user) => {
            info!(uid = %user.uid, "sign-in accepted");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            warn!(error = %e, "sign-in rejected");
            Html(render_login(Some(LOGIN_FAILED_MESSAGE), &form.email)).into_response()
        }
    }
}

/// `POST /logout`: clear the provider session. The resolver observes the
/// resulting state change and the next render shows the login form.
pub async fn logout(State(state): State<AppState>) -> Response {
    if let Err(e) = state.provider.sign_out().await {
        warn!(error = %e, "sign-out failed");
    }
    Redirect::to("/").into_response()
}

/// The resolved session, as tooling sees it.
#[derive(Debug, serde::Serialize)]
pub struct SessionResponse {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// `GET /api/session`: the current session view as JSON.
pub async fn session(State(state): State<AppState>) -> Json<SessionResponse> {
    let response = match state.session_view() {
        SessionView::Loading => SessionResponse { state: "loading", user: None, role: None },
        SessionView::Anonymous => SessionResponse { state: "anonymous", user: None, role: None },
        SessionView::Authenticated { user, role } => SessionResponse {
            state: "authenticated",
            user: Some(user),
            role: role.map(|r| r.label().to_owned()),
        },
    };
    Json(response)
}

/// Render the login page. The email survives a failed attempt; the password
/// is never echoed back into HTML.
#[must_use]
pub(crate) fn render_login(error: Option<&str>, email: &str) -> String {
    let error_html =
        error.map_or_else(String::new, |message| format!(r#"<p class="error">{message}</p>"#));
    LOGIN_TEMPLATE
        .replace("{{ERROR}}", &error_html)
        .replace("{{EMAIL}}", &super::escape_html(email))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
