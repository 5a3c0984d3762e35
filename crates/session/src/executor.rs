// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated requests with at most one transparent refresh-and-retry.
//!
//! One logical call:
//! 1. reads the stored access token (`NoCredential` if there is none),
//! 2. refreshes first if the token is about to expire,
//! 3. sends with `Authorization: Bearer <token>`,
//! 4. on a 401 from the first send, refreshes once and sends again,
//!    unless step 2 already refreshed.
//!
//! So a call performs at most one refresh and at most two sends.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::api::{error_body, AuthApi};
use crate::error::{HttpFailure, RequestError};
use crate::refresh::SessionRefresher;
use crate::store::{CredentialKey, CredentialStore};
use crate::token;

/// Description of a business call, rebuilt for each send so it can be retried.
#[derive(Debug, Clone)]
pub struct ProtectedRequest {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl ProtectedRequest {
    /// `target` is either a path under the configured API URL or an absolute URL.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self { method, target: target.into(), headers: HeaderMap::new(), body: None }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Add a header. `Authorization` is always set by the executor and is ignored here.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Runs [`ProtectedRequest`]s on behalf of callers.
pub struct RequestExecutor<S> {
    api: AuthApi,
    store: Arc<S>,
    refresher: Arc<SessionRefresher<S>>,
}

impl<S: CredentialStore> RequestExecutor<S> {
    pub fn new(api: AuthApi, store: Arc<S>, refresher: Arc<SessionRefresher<S>>) -> Self {
        Self { api, store, refresher }
    }

    /// Perform `request`, returning the 2xx response.
    ///
    /// Non-2xx responses other than 401 come back as [`RequestError::Http`]
    /// with status and body intact. Nothing here clears stored credentials.
    pub async fn execute(&self, request: &ProtectedRequest) -> Result<Response, RequestError> {
        let url = self.api.config().resolve(&request.target);
        let span = tracing::debug_span!("protected_request", method = %request.method, %url);
        self.run(request, &url).instrument(span).await
    }

    /// [`execute`](Self::execute) and decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: &ProtectedRequest,
    ) -> Result<T, RequestError> {
        let response = self.execute(request).await?;
        response.json().await.map_err(RequestError::Decode)
    }

    async fn run(&self, request: &ProtectedRequest, url: &str) -> Result<Response, RequestError> {
        let mut access =
            self.store.get(CredentialKey::AccessToken).await.ok_or(RequestError::NoCredential)?;

        let mut refreshed = false;
        if token::is_about_to_expire(&access, self.api.config().expiry_buffer_secs) {
            tracing::debug!("access token about to expire, refreshing before send");
            access = self.refresh(&access).await?;
            refreshed = true;
        }

        let response = self.send(request, url, &access, 1).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return finish(response).await;
        }
        if refreshed {
            tracing::warn!("freshly refreshed token rejected");
            return Err(RequestError::SessionExpired);
        }

        tracing::debug!("401 on first attempt, refreshing");
        access = self.refresh(&access).await?;
        let response = self.send(request, url, &access, 2).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("token rejected after refresh");
            return Err(RequestError::SessionExpired);
        }
        finish(response).await
    }

    async fn refresh(&self, seen: &str) -> Result<String, RequestError> {
        self.refresher.refresh_stale(Some(seen)).await.map_err(|e| {
            if e.is_terminal() {
                RequestError::SessionExpired
            } else {
                RequestError::RefreshUnavailable(e)
            }
        })
    }

    async fn send(
        &self,
        request: &ProtectedRequest,
        url: &str,
        access: &str,
        attempt: u8,
    ) -> Result<Response, RequestError> {
        let mut headers = request.headers.clone();
        headers.remove(AUTHORIZATION);

        let mut builder = self
            .api
            .client()
            .request(request.method.clone(), url)
            .headers(headers)
            .bearer_auth(access);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(RequestError::Network)?;
        tracing::debug!(attempt, status = %response.status(), "response received");
        Ok(response)
    }
}

async fn finish(response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = error_body(response).await;
    Err(RequestError::Http(HttpFailure { status, body }))
}
