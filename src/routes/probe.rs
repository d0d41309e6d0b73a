//! Connectivity probe page.

use axum::extract::State;
use axum::response::Html;

use crate::services::probe;
use crate::state::AppState;

const PROBE_TEMPLATE: &str = include_str!("../../templates/probe.html");

const STORE_NOT_CONFIGURED: &str = "Error: document store not configured";

/// `GET /probe`: run one store read and show the outcome.
pub async fn probe_page(State(state): State<AppState>) -> Html<String> {
    let status = match &state.store {
        Some(store) => probe::run(store.as_ref(), &state.probe_collection).await,
        None => STORE_NOT_CONFIGURED.to_owned(),
    };
    Html(render_probe(&status))
}

fn render_probe(status: &str) -> String {
    PROBE_TEMPLATE.replace("{{STATUS}}", &super::escape_html(status))
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod tests;
