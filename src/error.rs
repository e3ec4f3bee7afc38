use thiserror::Error;

/// Which credential field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialField {
    #[error("username is empty")]
    Username,
    #[error("password is empty")]
    Password,
}

/// Main error type for Ghost API operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login credentials rejected before any request was sent
    #[error("invalid credentials")]
    InvalidCredentials(#[source] CredentialField),

    /// Request body could not be encoded
    #[error("failed to encode request: {reason}")]
    Encode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Response payload did not contain the expected entity
    #[error("could not decode {entity} from response (HTTP {status})")]
    Decode {
        entity: &'static str,
        status: u16,
        /// Message from the server's error envelope, if any
        message: Option<String>,
    },

    /// Access token missing, or refreshing it failed
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// HTTP transport error
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Create an encode error without an underlying cause
    pub fn encode(reason: impl Into<String>) -> Self {
        ApiError::Encode {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a transport error without an underlying cause
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Check if the server answered 404 for this request
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Decode { status: 404, .. })
    }

    /// Check if this error came from the authentication layer
    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
    }

    /// Get the HTTP status code if the error carries one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type for Ghost API operations
pub type Result<T> = std::result::Result<T, ApiError>;
