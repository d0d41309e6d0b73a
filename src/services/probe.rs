//! Connectivity probe: one read against a fixed collection.
//!
//! Disconnected from the session flow. This is the only place raw provider
//! error text reaches a page.

use tracing::{info, warn};

use crate::provider::DocumentStore;

/// Status line shown when the store answers the list call.
pub const PROBE_SUCCESS: &str = "Document store connected!";

/// Run the probe: list the collection once and map the outcome to the
/// displayed status line. An empty collection still counts as connected.
pub async fn run(store: &dyn DocumentStore, collection: &str) -> String {
    match store.list_documents(collection).await {
        Ok(documents) => {
            info!(collection, count = documents.len(), "document store probe succeeded");
            PROBE_SUCCESS.to_owned()
        }
        Err(e) => {
            warn!(error = %e, collection, "document store probe failed");
            format!("Error: {e}")
        }
    }
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod tests;
