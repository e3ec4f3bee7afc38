//! JSON encode/decode contract for Ghost entities.
//!
//! Decoding works on an already parsed [`serde_json::Value`] and yields `None`
//! when required fields are missing or have the wrong type. Parsing bytes is
//! left to the transport boundary (see [`crate::response::Response`]).

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Entity that can be read from a JSON value
pub trait JsonDecode: Sized {
    /// Name used in decode errors
    const ENTITY: &'static str;

    /// Decode from a JSON value, `None` if the value does not describe `Self`
    fn decode(json: &Value) -> Option<Self>;
}

/// Entity that can be written as a JSON value
pub trait JsonEncode {
    fn encode(&self) -> Value;
}

/// Look up a value by a dot-separated path.
/// For example, "meta.pagination" reads the "pagination" field inside "meta".
/// Numeric segments index into arrays.
pub fn value_at<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = json;

    for part in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => {
                let index: usize = part.parse().ok()?;
                arr.get(index)?
            }
            _ => return None,
        };
    }

    Some(current)
}

/// Deserialize a wire struct from a borrowed value, discarding the error
pub(crate) fn from_json<T: DeserializeOwned>(json: &Value) -> Option<T> {
    T::deserialize(json).ok()
}

/// Decode every element of an array under `key`, skipping the ones that fail.
/// A missing key or a non-array value yields an empty vector.
pub(crate) fn decode_items<T: JsonDecode>(json: &Value, key: &str) -> Vec<T> {
    let Some(items) = json.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let decoded = T::decode(item);
            if decoded.is_none() {
                tracing::debug!(entity = T::ENTITY, key, "skipping malformed entry");
            }
            decoded
        })
        .collect()
}

/// The uploaded image location returned by the uploads endpoint
impl JsonDecode for String {
    const ENTITY: &'static str = "upload location";

    fn decode(json: &Value) -> Option<Self> {
        json.as_str().map(str::to_string)
    }
}
