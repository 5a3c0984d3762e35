// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use reqwest::StatusCode;

/// Coarse classification of a failed authenticated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoCredential,
    Network,
    Http,
    SessionExpired,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCredential => "NO_CREDENTIAL",
            Self::Network => "NETWORK_ERROR",
            Self::Http => "HTTP_ERROR",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Internal => "INTERNAL",
        }
    }

    /// The user can usefully try the same action again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Http)
    }

    /// The host must drop back to the login state.
    pub fn forces_logout(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NoCredential)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a refresh exchange did not produce new tokens.
///
/// `Clone` because every waiter on one in-flight exchange receives the same value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshFailure {
    #[error("no refresh token available")]
    MissingToken,
    #[error("refresh rejected ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("refresh request failed: {0}")]
    Network(String),
    #[error("malformed refresh response: {0}")]
    Malformed(String),
    #[error("refresh task interrupted: {0}")]
    Interrupted(String),
}

impl RefreshFailure {
    /// The backend (or the local state) proved the session is gone.
    ///
    /// Transport failures and interrupted tasks say nothing about the
    /// refresh token itself.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MissingToken | Self::Rejected { .. } | Self::Malformed(_))
    }
}

/// A non-2xx response the backend returned for a business call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: StatusCode,
    pub body: String,
}

impl HttpFailure {
    /// Backend-supplied `message` field, if the body is a JSON object carrying one.
    pub fn message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value.get("message")?.as_str().map(str::to_owned)
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {message}", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}

/// Terminal failure of an authenticated request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("no access token stored")]
    NoCredential,
    #[error("session expired")]
    SessionExpired,
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// The refresh exchange could not reach the backend; the session may still be fine.
    #[error("could not refresh session: {0}")]
    RefreshUnavailable(#[source] RefreshFailure),
    #[error("request rejected: {0}")]
    Http(HttpFailure),
    #[error("failed to decode response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoCredential => ErrorKind::NoCredential,
            Self::SessionExpired => ErrorKind::SessionExpired,
            Self::Network(_) | Self::RefreshUnavailable(_) => ErrorKind::Network,
            Self::Http(_) => ErrorKind::Http,
            Self::Decode(_) => ErrorKind::Internal,
        }
    }

    /// Status of the rejected response, for `Http` failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(failure) => Some(failure.status),
            _ => None,
        }
    }
}

/// Failure of `POST /auth/login`.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("login rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("login request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("malformed login response: {0}")]
    Malformed(String),
    #[error("failed to persist credentials: {0}")]
    Store(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
