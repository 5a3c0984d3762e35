// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token inspection: read the `exp` claim of a bearer token without I/O.
//!
//! Signatures are not checked here; that is the backend's job. Any token that
//! cannot be decoded is reported as expired so callers never act on it.
//! No compensation for device clock skew is attempted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// Default preflight buffer, in seconds.
pub const DEFAULT_EXPIRY_BUFFER_SECS: u64 = 60;

/// Claims the session core reads from an access token.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub(crate) struct Claims {
    exp: f64,
}

impl Claims {
    /// Expiry as whole epoch seconds (fractional claims are truncated).
    fn exp_secs(&self) -> i64 {
        self.exp as i64
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DecodeError {
    Empty,
    Shape,
    Base64,
    Json,
}

/// Decode the payload segment of a `header.payload.signature` token.
pub(crate) fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(DecodeError::Shape),
    };
    let bytes =
        URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).map_err(|_| DecodeError::Base64)?;
    let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| DecodeError::Json)?;
    if !claims.exp.is_finite() {
        return Err(DecodeError::Json);
    }
    Ok(claims)
}

fn now() -> i64 {
    crate::epoch_secs() as i64
}

/// True when the token is expired or cannot be decoded.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, now())
}

/// [`is_expired`] against a fixed clock. A token is invalid from its `exp` second on.
pub fn is_expired_at(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.exp_secs() <= now,
        Err(e) => {
            tracing::debug!(err = ?e, "undecodable token treated as expired");
            true
        }
    }
}

/// True when fewer than `buffer_secs` remain before expiry, or the token cannot be decoded.
pub fn is_about_to_expire(token: &str, buffer_secs: u64) -> bool {
    is_about_to_expire_at(token, buffer_secs, now())
}

pub fn is_about_to_expire_at(token: &str, buffer_secs: u64, now: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => {
            let buffer = i64::try_from(buffer_secs).unwrap_or(i64::MAX);
            claims.exp_secs().saturating_sub(now) < buffer
        }
        Err(_) => true,
    }
}

/// The `exp` claim, if the token decodes.
pub fn expires_at(token: &str) -> Option<i64> {
    decode_claims(token).ok().map(|c| c.exp_secs())
}

/// Seconds left before expiry (negative once expired), if the token decodes.
pub fn seconds_remaining(token: &str) -> Option<i64> {
    expires_at(token).map(|exp| exp - now())
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
