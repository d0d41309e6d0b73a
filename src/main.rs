use std::sync::Arc;

use accelera_console::provider::firestore::{FirestoreClient, FirestoreConfig};
use accelera_console::provider::identity::{IdentityConfig, IdentityToolkitClient};
use accelera_console::provider::{DocumentStore, IdentityProvider};
use accelera_console::state::AppState;
use accelera_console::{routes, services};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let identity_config = IdentityConfig::from_env().expect("IDENTITY_API_KEY required");
    let provider: Arc<dyn IdentityProvider> =
        Arc::new(IdentityToolkitClient::new(identity_config).expect("identity client init failed"));

    // Document store is optional: the probe page degrades if unconfigured.
    let store: Option<Arc<dyn DocumentStore>> = match FirestoreConfig::from_env() {
        Some(config) => match FirestoreClient::new(config) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "document store client init failed; probe disabled");
                None
            }
        },
        None => {
            tracing::warn!("FIRESTORE_PROJECT_ID not set; probe disabled");
            None
        }
    };

    let probe_collection = std::env::var("PROBE_COLLECTION").unwrap_or_else(|_| "test".into());

    // The handle must outlive the server: dropping it would abort the
    // resolver and freeze the session view.
    let (session, _resolver) = services::resolver::spawn(provider.clone());

    let state = AppState::new(provider, store, session, probe_collection);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "accelera console listening");
    axum::serve(listener, app).await.expect("server failed");
}
