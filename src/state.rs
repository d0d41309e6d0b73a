//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! carries the injected platform clients and a read handle on the session
//! value; the resolver task is the only writer. Clone is required by Axum,
//! so everything inside is an `Arc` or a channel handle.

use std::sync::Arc;

use tokio::sync::watch;

use crate::provider::{DocumentStore, IdentityProvider};
use crate::services::session::SessionView;

/// Shared application state, injected into Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The external identity platform.
    pub provider: Arc<dyn IdentityProvider>,
    /// The managed document store. `None` when unconfigured: the probe page
    /// degrades, the session flow is unaffected.
    pub store: Option<Arc<dyn DocumentStore>>,
    /// Read handle on the resolver-owned session value.
    pub session: watch::Receiver<SessionView>,
    /// Collection name the connectivity probe reads.
    pub probe_collection: String,
}

impl AppState {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Option<Arc<dyn DocumentStore>>,
        session: watch::Receiver<SessionView>,
        probe_collection: String,
    ) -> Self {
        Self { provider, store, session, probe_collection }
    }

    /// Snapshot of the current session view.
    #[must_use]
    pub fn session_view(&self) -> SessionView {
        self.session.borrow().clone()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
