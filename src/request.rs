//! Transport-agnostic request values.
//!
//! [`RequestBuilder`] turns an [`Endpoint`] plus base URL, body, query and
//! headers into a [`Request`] without touching the network. Encoding failures
//! surface here, before any I/O happens.

use crate::codec::JsonEncode;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::post::{PersistedPost, Post};
use reqwest::Method;
use std::collections::BTreeMap;
use url::Url;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Query parameters, serialized in key order
pub type Query = BTreeMap<String, String>;

/// Encoded request body with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedBody {
    pub fn form(encoded: String) -> Self {
        EncodedBody {
            content_type: CONTENT_TYPE_FORM.to_string(),
            bytes: encoded.into_bytes(),
        }
    }

    pub fn json<T: JsonEncode + ?Sized>(entity: &T) -> Result<Self> {
        Ok(EncodedBody {
            content_type: CONTENT_TYPE_JSON.to_string(),
            bytes: serde_json::to_vec(&entity.encode())?,
        })
    }
}

/// Input that can be sent as a request body
pub trait RequestBody {
    fn encode_body(&self) -> Result<EncodedBody>;
}

impl RequestBody for Post {
    fn encode_body(&self) -> Result<EncodedBody> {
        EncodedBody::json(self)
    }
}

impl RequestBody for PersistedPost {
    fn encode_body(&self) -> Result<EncodedBody> {
        EncodedBody::json(self)
    }
}

/// A fully built request, ready for a transport
#[derive(Debug, Clone)]
pub struct Request {
    pub endpoint: Endpoint,
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Whether the access token must be attached
    pub fn signed(&self) -> bool {
        self.endpoint.signed()
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_str(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|body| std::str::from_utf8(body).ok())
    }
}

/// Builder for [`Request`] values
pub struct RequestBuilder<'a> {
    endpoint: Endpoint,
    base_url: &'a Url,
    body: Option<EncodedBody>,
    query: Query,
    headers: Vec<(String, String)>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(endpoint: Endpoint, base_url: &'a Url) -> Self {
        RequestBuilder {
            endpoint,
            base_url,
            body: None,
            query: Query::new(),
            headers: Vec::new(),
        }
    }

    /// Encode `input` as the request body
    pub fn input<B: RequestBody + ?Sized>(mut self, input: &B) -> Result<Self> {
        self.body = Some(input.encode_body()?);
        Ok(self)
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Extra headers; they replace default headers of the same name
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(self) -> Result<Request> {
        let mut url = self.base_url.join(&self.endpoint.path())?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        let mut headers = vec![("Accept".to_string(), CONTENT_TYPE_JSON.to_string())];
        let body = self.body.map(|encoded| {
            headers.push(("Content-Type".to_string(), encoded.content_type));
            encoded.bytes
        });

        for (name, value) in self.headers {
            headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        Ok(Request {
            endpoint: self.endpoint,
            method: self.endpoint.method(),
            url,
            headers,
            body,
        })
    }
}

/// Parse an API base URL, making sure it ends with a slash so endpoint paths
/// are resolved below it
pub fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
