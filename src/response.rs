use crate::codec::{value_at, JsonDecode};
use crate::error::{ApiError, Result};
use serde::Deserialize;
use serde_json::Value;

/// Raw HTTP response handed back by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

/// Entry of Ghost's `{"errors": [...]}` envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEntry {
    message: Option<String>,
    error_type: Option<String>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Response {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Response carrying a JSON body
    pub fn json(status: u16, body: &Value) -> Self {
        Response {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The server rejected the access token
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parse the body as JSON, `None` if it is empty or not JSON
    pub fn value(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Get a value from the JSON body by a dot-separated path
    pub fn get(&self, path: &str) -> Option<Value> {
        let value = self.value()?;
        value_at(&value, path).cloned()
    }

    /// First message of Ghost's error envelope, prefixed by its error type
    pub fn error_message(&self) -> Option<String> {
        let value = self.value()?;
        let errors: Vec<ErrorEntry> = Vec::deserialize(value.get("errors")?).ok()?;
        let first = errors.into_iter().next()?;

        match (first.error_type, first.message) {
            (Some(kind), Some(message)) => Some(format!("{}: {}", kind, message)),
            (None, Some(message)) => Some(message),
            (Some(kind), None) => Some(kind),
            (None, None) => None,
        }
    }

    /// Decode the body into `T`.
    ///
    /// A non-2xx status, or a body that does not describe `T`, becomes
    /// [`ApiError::Decode`] carrying the status and the server's message.
    pub fn decode<T: JsonDecode>(&self) -> Result<T> {
        let decoded = if self.is_success() {
            self.value().as_ref().and_then(T::decode)
        } else {
            None
        };
        match decoded {
            Some(decoded) => Ok(decoded),
            None => Err(ApiError::Decode {
                entity: T::ENTITY,
                status: self.status,
                message: self.error_message(),
            }),
        }
    }
}
