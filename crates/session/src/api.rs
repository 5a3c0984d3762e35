// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the backend's `/auth/*` endpoints.

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::{LoginError, RefreshFailure};
use crate::store::{Credential, TokenPair};

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh-token";
const VALIDATE_PATH: &str = "/auth/validate-token";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    valid: bool,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Client for login, refresh, and validation calls. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuthApi {
    config: SessionConfig,
    http: reqwest::Client,
}

impl AuthApi {
    /// Build the client. Every request it issues is bounded by `config.timeout()`.
    pub fn new(config: SessionConfig) -> anyhow::Result<Self> {
        crate::ensure_crypto();
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The shared HTTP client, reused for business calls.
    pub fn client(&self) -> &reqwest::Client {
        &self.http
    }

    /// `POST /auth/login` with `{email, password}`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, LoginError> {
        let url = SessionConfig::join(&self.config.api_url, LOGIN_PATH);
        let resp = self
            .http
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(LoginError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            let text = error_body(resp).await;
            let message = serde_json::from_str::<MessageBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| "login failed".to_owned());
            return Err(LoginError::Rejected { status, message });
        }

        let cred: Credential =
            resp.json().await.map_err(|e| LoginError::Malformed(e.to_string()))?;
        if cred.access_token.is_empty() || cred.refresh_token.is_empty() || cred.user_id.is_empty()
        {
            return Err(LoginError::Malformed("empty credential field".to_owned()));
        }
        Ok(cred)
    }

    /// `POST /auth/refresh-token` with `{token}`. Exactly one exchange, no retries.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, RefreshFailure> {
        if refresh_token.is_empty() {
            return Err(RefreshFailure::MissingToken);
        }
        let url = SessionConfig::join(&self.config.api_url, REFRESH_PATH);
        let resp = self
            .http
            .post(url)
            .json(&TokenRequest { token: refresh_token })
            .send()
            .await
            .map_err(|e| RefreshFailure::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = error_body(resp).await;
            return Err(RefreshFailure::Rejected { status, body });
        }

        let pair: TokenPair =
            resp.json().await.map_err(|e| RefreshFailure::Malformed(e.to_string()))?;
        if pair.access_token.is_empty() || pair.refresh_token.is_empty() {
            return Err(RefreshFailure::Malformed("empty token in response".to_owned()));
        }
        Ok(pair)
    }

    /// Ask the validation service whether `token` is still accepted.
    ///
    /// `Ok(false)` only when the service answered 2xx with `{valid: false}`.
    /// Transport failures and non-2xx statuses are errors, not a verdict on the token.
    pub async fn validate_token(&self, token: &str) -> Result<bool, reqwest::Error> {
        let url = SessionConfig::join(self.config.validate_base(), VALIDATE_PATH);
        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&TokenRequest { token })
            .send()
            .await?
            .error_for_status()?;
        let body: ValidateResponse = resp.json().await?;
        Ok(body.valid)
    }
}

/// Body of a rejected response, empty if it cannot be read.
pub(crate) async fn error_body(resp: reqwest::Response) -> String {
    match resp.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(err = %e, "failed to read error response body");
            String::new()
        }
    }
}
