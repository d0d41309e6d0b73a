//! Identity Toolkit REST client.
//!
//! Thin HTTP wrapper over the platform's `accounts:*` endpoints. Pure parsing
//! in the `parse_*` functions for testability. Sign-in and sign-out feed the
//! auth-state broadcast that the session resolver subscribes to.
//!
//! Custom claims come back from `accounts:lookup` as the `customAttributes`
//! field: a JSON object serialized into a string.

use std::sync::RwLock;
use std::time::Duration;

use tokio::sync::broadcast;

use super::{AuthChange, IdentityProvider, ProviderError, TokenClaims, UserHandle};

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const EVENT_CAPACITY: usize = 16;

// =============================================================================
// CONFIG
// =============================================================================

/// Identity platform configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub api_key: String,
    pub base_url: String,
}

impl IdentityConfig {
    /// Load from `IDENTITY_API_KEY` and optional `IDENTITY_BASE_URL`.
    /// Returns `None` if the key is missing (sign-in cannot work without it).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("IDENTITY_API_KEY").ok()?;
        let base_url =
            std::env::var("IDENTITY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        Some(Self { api_key, base_url })
    }
}

// =============================================================================
// CLIENT
// =============================================================================

struct CurrentUser {
    handle: UserHandle,
    id_token: String,
}

/// REST client for the identity platform.
///
/// Holds the one signed-in token the console cares about; the resolver task
/// observes changes through [`IdentityProvider::subscribe`].
pub struct IdentityToolkitClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    events: broadcast::Sender<AuthChange>,
    current: RwLock<Option<CurrentUser>>,
}

impl IdentityToolkitClient {
    /// Build a client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: IdentityConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::HttpClientBuild(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http,
            api_key: config.api_key,
            base_url: config.base_url,
            events,
            current: RwLock::new(None),
        })
    }

    fn endpoint(&self, op: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, op, self.api_key)
    }

    fn snapshot(&self) -> AuthChange {
        let current = self.current.read().expect("auth state lock poisoned");
        match current.as_ref() {
            Some(user) => AuthChange::SignedIn(user.handle.clone()),
            None => AuthChange::SignedOut,
        }
    }

    // =========================================================================
    // ADMIN
    // =========================================================================

    /// Assign the `role` custom claim to the account registered under `email`.
    ///
    /// Admin surface used by the `set_roles` tool, not by the console itself.
    /// Requires an OAuth bearer token with provider admin scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or the update is refused or unreadable.
    pub async fn set_role_for_email(
        &self,
        admin_token: &str,
        email: &str,
        role: &str,
    ) -> Result<(), ProviderError> {
        let uid = self.admin_lookup_uid(admin_token, email).await?;
        let attributes = serde_json::json!({ "role": role }).to_string();
        let body = serde_json::json!({ "localId": uid, "customAttributes": attributes });

        let response = self
            .http
            .post(self.endpoint("update"))
            .bearer_auth(admin_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiResponse { status, body });
        }
        Ok(())
    }

    async fn admin_lookup_uid(
        &self,
        admin_token: &str,
        email: &str,
    ) -> Result<String, ProviderError> {
        let body = serde_json::json!({ "email": [email] });
        let response = self
            .http
            .post(self.endpoint("lookup"))
            .bearer_auth(admin_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(ProviderError::ApiResponse { status, body: text });
        }
        parse_admin_lookup_uid(&text)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for IdentityToolkitClient {
    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        let receiver = self.events.subscribe();
        // Announce the current state so a new observer leaves its loading
        // view without waiting for the next sign-in or sign-out.
        let _ = self.events.send(self.snapshot());
        receiver
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserHandle, ProviderError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response = self
            .http
            .post(self.endpoint("signInWithPassword"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        // Credential refusals come back as 400 with a reason code in the
        // error envelope (EMAIL_NOT_FOUND, INVALID_PASSWORD, ...).
        if status == 400 {
            return Err(ProviderError::SignInRejected { reason: parse_error_reason(&text) });
        }
        if status != 200 {
            return Err(ProviderError::ApiResponse { status, body: text });
        }

        let (handle, id_token) = parse_sign_in_response(&text)?;
        {
            let mut current = self.current.write().expect("auth state lock poisoned");
            *current = Some(CurrentUser { handle: handle.clone(), id_token });
        }
        let _ = self.events.send(AuthChange::SignedIn(handle.clone()));
        Ok(handle)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        // The REST surface has no sign-out endpoint; clearing the held token
        // is what ends the session.
        {
            let mut current = self.current.write().expect("auth state lock poisoned");
            *current = None;
        }
        let _ = self.events.send(AuthChange::SignedOut);
        Ok(())
    }

    async fn token_claims(&self, user: &UserHandle) -> Result<TokenClaims, ProviderError> {
        let id_token = {
            let current = self.current.read().expect("auth state lock poisoned");
            match current.as_ref() {
                Some(c) if c.handle.uid == user.uid => c.id_token.clone(),
                _ => return Err(ProviderError::NoSession),
            }
        };

        let body = serde_json::json!({ "idToken": id_token });
        let response = self
            .http
            .post(self.endpoint("lookup"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(ProviderError::ApiResponse { status, body: text });
        }

        parse_lookup_claims(&text)
    }
}

// =============================================================================
// WIRE TYPES + PARSING
// =============================================================================

#[derive(serde::Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(serde::Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    local_id: Option<String>,
    #[serde(default)]
    custom_attributes: Option<String>,
}

/// Extract the provider's reason code from an error envelope, falling back to
/// the raw body when it is not the expected shape.
fn parse_error_reason(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_owned())
}

fn parse_sign_in_response(body: &str) -> Result<(UserHandle, String), ProviderError> {
    let response: SignInResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::ApiParse(e.to_string()))?;
    let handle = UserHandle { uid: response.local_id, email: response.email };
    Ok((handle, response.id_token))
}

/// Pull the claims out of a lookup response. A missing `customAttributes`
/// field means the account simply has no custom claims.
fn parse_lookup_claims(body: &str) -> Result<TokenClaims, ProviderError> {
    let response: LookupResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::ApiParse(e.to_string()))?;
    let Some(user) = response.users.into_iter().next() else {
        return Err(ProviderError::ApiParse("lookup returned no users".to_owned()));
    };
    let Some(raw) = user.custom_attributes else {
        return Ok(TokenClaims::default());
    };

    let mut claims: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
        .map_err(|e| ProviderError::ApiParse(format!("customAttributes: {e}")))?;

    // Only a string counts as a role; anything else stays in the pass-through
    // bag untouched.
    let role = match claims.remove("role") {
        Some(serde_json::Value::String(value)) => Some(value),
        Some(other) => {
            claims.insert("role".to_owned(), other);
            None
        }
        None => None,
    };

    Ok(TokenClaims { role, extra: claims })
}

fn parse_admin_lookup_uid(body: &str) -> Result<String, ProviderError> {
    let response: LookupResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::ApiParse(e.to_string()))?;
    response
        .users
        .into_iter()
        .next()
        .and_then(|user| user.local_id)
        .ok_or_else(|| ProviderError::ApiParse("lookup returned no matching account".to_owned()))
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
