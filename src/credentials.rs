use crate::codec::JsonEncode;
use crate::error::{ApiError, CredentialField, Result};
use crate::request::{EncodedBody, RequestBody};
use serde_json::{json, Value};
use url::form_urlencoded;

/// OAuth client registered by every Ghost installation for the admin app
pub const CLIENT_ID: &str = "ghost-admin";

/// Email and password for the password grant
#[derive(Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    pub username: String,
    pub password: String,
}

impl EmailCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        EmailCredentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Form-encoded login body
    pub fn encode_form(&self) -> Result<String> {
        if self.username.is_empty() {
            return Err(ApiError::InvalidCredentials(CredentialField::Username));
        }
        if self.password.is_empty() {
            return Err(ApiError::InvalidCredentials(CredentialField::Password));
        }

        Ok(form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &self.username)
            .append_pair("password", &self.password)
            .append_pair("grant_type", "password")
            .append_pair("client_id", CLIENT_ID)
            .finish())
    }
}

// Keep the password out of logs
impl std::fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RequestBody for EmailCredentials {
    fn encode_body(&self) -> Result<EncodedBody> {
        Ok(EncodedBody::form(self.encode_form()?))
    }
}

/// Refresh token for the refresh_token grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenCredentials {
    pub refresh_token: String,
}

impl RefreshTokenCredentials {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        RefreshTokenCredentials {
            refresh_token: refresh_token.into(),
        }
    }
}

impl JsonEncode for RefreshTokenCredentials {
    fn encode(&self) -> Value {
        json!({
            "refresh_token": self.refresh_token,
            "grant_type": "refresh_token",
            "client_id": CLIENT_ID,
        })
    }
}

impl RequestBody for RefreshTokenCredentials {
    fn encode_body(&self) -> Result<EncodedBody> {
        EncodedBody::json(self)
    }
}
