// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated session core for the inspectr field client.
//!
//! Decides whether a cached credential is usable, refreshes it transparently
//! (single-flight per process), retries a rejected call at most once, and
//! falls back to a forced logout when the session cannot be recovered.

pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod refresh;
pub mod store;
pub mod token;

use std::sync::Once;

pub use api::AuthApi;
pub use config::SessionConfig;
pub use error::{ErrorKind, HttpFailure, LoginError, RefreshFailure, RequestError};
pub use executor::{ProtectedRequest, RequestExecutor};
pub use lifecycle::{SessionController, SessionState};
pub use refresh::SessionRefresher;
pub use store::{
    Credential, CredentialKey, CredentialStore, FileStore, MemoryStore, StoredCredentials,
    TokenPair,
};

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Return current epoch seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
