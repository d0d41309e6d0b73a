//! External platform clients and the traits the console consumes them through.
//!
//! DESIGN
//! ======
//! The identity provider and the document store are injected as trait objects
//! so the session flow can run against scripted fakes in tests. The concrete
//! clients speak the platform's REST surface and hold no state beyond the
//! currently signed-in token.

pub mod firestore;
pub mod identity;

use tokio::sync::broadcast;

// =============================================================================
// AUTH STATE
// =============================================================================

/// A change in the provider-held authentication state.
#[derive(Debug, Clone)]
pub enum AuthChange {
    /// A user is signed in.
    SignedIn(UserHandle),
    /// No user is signed in.
    SignedOut,
}

/// Opaque provider identity for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UserHandle {
    /// Provider-assigned account id.
    pub uid: String,
    /// Account email, when the provider reports one.
    pub email: Option<String>,
}

/// Claims carried by the provider-issued token.
///
/// The token signature is the provider's concern; claims are trusted as
/// delivered and never verified locally.
#[derive(Debug, Clone, Default)]
pub struct TokenClaims {
    /// The application `role` claim, when present and a string.
    pub role: Option<String>,
    /// Every other custom claim, passed through untouched.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Minimal description of a stored document.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DocumentSummary {
    /// Fully qualified resource name.
    pub name: String,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors produced by identity provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the credential sign-in, whatever the reason code.
    #[error("sign-in rejected: {reason}")]
    SignInRejected { reason: String },

    /// The HTTP request to the provider failed outright.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The provider response body could not be interpreted.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A claims fetch was attempted with no matching signed-in user.
    #[error("no active session")]
    NoSession,
}

/// Errors produced by document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request to the store failed outright.
    #[error("store request failed: {0}")]
    ApiRequest(String),

    /// The store returned a non-success HTTP status.
    #[error("store response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The store response body could not be interpreted.
    #[error("store response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// TRAITS
// =============================================================================

/// The identity platform, as consumed by the console.
///
/// Exactly the four operations the session flow needs: observe state changes,
/// sign in, sign out, read token claims.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to auth-state change notifications.
    ///
    /// Every state change after the call is delivered in order. The HTTP
    /// implementation additionally announces the current state to the new
    /// subscriber; fakes may stay silent. Dropping the receiver ends the
    /// subscription.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;

    /// Verify credentials with the provider. Emits `SignedIn` on success.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserHandle, ProviderError>;

    /// Clear the provider-held session. Emits `SignedOut`.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Fetch the current token claims for a signed-in user.
    async fn token_claims(&self, user: &UserHandle) -> Result<TokenClaims, ProviderError>;
}

/// Read access to the managed document store. Only the connectivity probe
/// uses this.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// List the documents of one collection.
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSummary>, StoreError>;
}
