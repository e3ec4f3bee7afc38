use crate::codec::{from_json, JsonDecode};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::RwLock;

/// AccessToken represents an OAuth2 bearer token issued by the Ghost
/// authentication endpoint, with the refresh token used to renew it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Token type (usually "Bearer")
    pub token_type: String,

    /// Access token for API requests
    pub token: String,

    /// Refresh token for renewing expired access tokens
    pub refresh: String,

    /// Expiration instant
    pub expires: DateTime<Utc>,
}

/// Token response as sent by the authentication endpoint
#[derive(Deserialize)]
struct TokenWire {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl AccessToken {
    /// Create a new AccessToken
    pub fn new(
        token_type: String,
        token: String,
        refresh: String,
        expires: DateTime<Utc>,
    ) -> Self {
        AccessToken {
            token_type,
            token,
            refresh,
            expires,
        }
    }

    /// Check if the token is past its expiration instant
    pub fn is_expired(&self) -> bool {
        self.expires <= Utc::now()
    }

    /// Check if we have a refresh token available
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh.is_empty()
    }

    /// Value of the Authorization header for signed requests
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

impl JsonDecode for AccessToken {
    const ENTITY: &'static str = "access token";

    fn decode(json: &Value) -> Option<Self> {
        let wire: TokenWire = from_json(json)?;
        let expires = Utc::now().checked_add_signed(Duration::try_seconds(wire.expires_in)?)?;
        Some(AccessToken {
            token_type: wire.token_type,
            token: wire.access_token,
            refresh: wire.refresh_token.unwrap_or_default(),
            expires,
        })
    }
}

/// Storage for the current access token.
///
/// Implementations only persist the value; they must not trigger requests.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<AccessToken>;
    fn set(&self, token: AccessToken);
}

/// Credential store keeping the token in memory for the lifetime of the client
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<AccessToken>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AccessToken) -> Self {
        InMemoryCredentialStore {
            token: RwLock::new(Some(token)),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<AccessToken> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, token: AccessToken) {
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
    }
}
