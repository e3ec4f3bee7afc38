use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use crate::token::AccessToken;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;

/// Executes requests over the network.
///
/// When `token` is given the transport attaches it as the `Authorization`
/// header. Rejected tokens are reported through a 401 status, not an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request, token: Option<&AccessToken>) -> Result<Response>;
}

/// Transport backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        ReqwestTransport { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request, token: Option<&AccessToken>) -> Result<Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            builder = builder.header("Authorization", token.authorization());
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let start = Instant::now();
        let http_response = builder.send().await?;
        let status = http_response.status().as_u16();
        let headers = http_response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = http_response.bytes().await?.to_vec();

        tracing::debug!(
            method = %request.method,
            path = request.url.path(),
            status,
            elapsed = ?start.elapsed(),
            "request completed"
        );

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
