//! Access token lifecycle for signed requests.
//!
//! [`Session`] attaches the stored token to signed requests. An expired token
//! is refreshed before sending; a 401 answer triggers one refresh and exactly
//! one retry. Refreshing is a two-state machine guarded by a mutex:
//!
//! - `Valid`: no refresh in flight.
//! - `Refreshing`: a shared refresh future is in flight. Every caller that
//!   needs a new token awaits that same future, so concurrent requests cause
//!   a single call to the token endpoint.
//!
//! The refresh future stores the new token and moves the state back to
//! `Valid` itself, so the store is updated before any waiter is released.
//! It keeps running as long as one waiter polls it; dropping a single waiter
//! does not cancel it.

use crate::credentials::RefreshTokenCredentials;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::request::{Request, RequestBuilder};
use crate::response::Response;
use crate::token::{AccessToken, CredentialStore};
use crate::transport::Transport;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

type RefreshOutcome = std::result::Result<AccessToken, String>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

enum RefreshState {
    Valid,
    Refreshing(SharedRefresh),
}

struct Inner {
    base_url: Url,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    state: Mutex<RefreshState>,
}

/// Transport plus credential store, with token refresh on signed requests
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new(
        base_url: Url,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Session {
            inner: Arc::new(Inner {
                base_url,
                transport,
                store,
                state: Mutex::new(RefreshState::Valid),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Whether a token refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        matches!(*lock(&self.inner.state), RefreshState::Refreshing(_))
    }

    /// Send a request, attaching and refreshing the access token when the
    /// endpoint is signed
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        if !request.signed() {
            return self.inner.transport.send(request, None).await;
        }

        let mut token = self
            .inner
            .store
            .get()
            .ok_or_else(|| ApiError::Authentication("no access token stored".to_string()))?;

        let refreshed = token.is_expired();
        if refreshed {
            tracing::debug!(path = request.url.path(), "stored access token expired");
            token = self.refreshed_token(&token).await?;
        }

        let response = self.inner.transport.send(request, Some(&token)).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }
        if refreshed {
            return Err(ApiError::Authentication(
                "access token rejected after refresh".to_string(),
            ));
        }

        tracing::warn!(path = request.url.path(), "access token rejected, refreshing");
        let token = self.refreshed_token(&token).await?;
        let retry = self.inner.transport.send(request, Some(&token)).await?;
        if retry.is_unauthorized() {
            return Err(ApiError::Authentication(
                "access token rejected after refresh".to_string(),
            ));
        }

        Ok(retry)
    }

    /// Obtain a token newer than `stale`, joining the refresh in flight or
    /// starting one
    async fn refreshed_token(&self, stale: &AccessToken) -> Result<AccessToken> {
        let refresh = {
            let mut state = lock(&self.inner.state);
            match &*state {
                RefreshState::Refreshing(refresh) => refresh.clone(),
                RefreshState::Valid => {
                    // Another request may have finished a refresh since `stale` was read
                    if let Some(current) = self.inner.store.get() {
                        if current.token != stale.token && !current.is_expired() {
                            return Ok(current);
                        }
                    }

                    let refresh = Inner::refresh(self.inner.clone(), stale.clone())
                        .boxed()
                        .shared();
                    *state = RefreshState::Refreshing(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await.map_err(ApiError::Authentication)
    }
}

impl Inner {
    async fn refresh(inner: Arc<Inner>, stale: AccessToken) -> RefreshOutcome {
        let outcome = inner.request_token(&stale).await;

        match &outcome {
            Ok(token) => {
                inner.store.set(token.clone());
                tracing::info!(expires = %token.expires, "access token refreshed");
            }
            Err(e) => tracing::warn!(error = %e, "access token refresh failed"),
        }

        *lock(&inner.state) = RefreshState::Valid;
        outcome.map_err(|e| e.to_string())
    }

    async fn request_token(&self, stale: &AccessToken) -> Result<AccessToken> {
        if !stale.has_refresh_token() {
            return Err(ApiError::Authentication(
                "no refresh token available".to_string(),
            ));
        }

        let credentials = RefreshTokenCredentials::new(stale.refresh.clone());
        let request = RequestBuilder::new(Endpoint::Token, &self.base_url)
            .input(&credentials)?
            .build()?;

        let response = self.transport.send(&request, None).await?;
        if !response.is_success() {
            let detail = response
                .error_message()
                .map(|m| format!(": {}", m))
                .unwrap_or_default();
            return Err(ApiError::Authentication(format!(
                "refresh rejected with HTTP {}{}",
                response.status, detail
            )));
        }

        let mut token: AccessToken = response.decode()?;
        if !token.has_refresh_token() {
            token.refresh = stale.refresh.clone();
        }
        if token.is_expired() {
            return Err(ApiError::Authentication(
                "refreshed access token is already expired".to_string(),
            ));
        }

        Ok(token)
    }
}
