// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential store: durable key-value persistence for the session triple.
//!
//! The store is deliberately dumb. It performs no validation; deciding whether
//! a stored token is usable belongs to [`crate::token`].

pub mod file;
pub mod memory;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use file::FileStore;
pub use memory::MemoryStore;

/// File name of the persisted credential document inside the state directory.
pub const CREDENTIAL_FILE: &str = "credentials.json";

/// Persisted entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    UserId,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] = [Self::AccessToken, Self::RefreshToken, Self::UserId];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::RefreshToken => "refreshToken",
            Self::UserId => "userId",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full credential triple issued by a successful login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// New access/refresh pair minted by a refresh exchange. `userId` is untouched by refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// Snapshot of whatever the store currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
}

impl StoredCredentials {
    /// The complete triple, if all three entries are present.
    pub fn into_credential(self) -> Option<Credential> {
        Some(Credential {
            access_token: self.access_token?,
            refresh_token: self.refresh_token?,
            user_id: self.user_id?,
        })
    }
}

/// Process-wide credential persistence.
///
/// Empty values read back as absent. Reads never fail; a backend that cannot
/// read its medium reports absence.
pub trait CredentialStore: Send + Sync + 'static {
    fn get(&self, key: CredentialKey) -> impl Future<Output = Option<String>> + Send;

    fn set(&self, key: CredentialKey, value: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn remove(&self, key: CredentialKey) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Remove all three credential entries together.
    fn clear(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Write several entries. Backends that can should apply them in one write.
    fn set_many(
        &self,
        entries: &[(CredentialKey, &str)],
    ) -> impl Future<Output = anyhow::Result<()>> + Send {
        async move {
            for (key, value) in entries {
                self.set(*key, value).await?;
            }
            Ok(())
        }
    }

    fn load(&self) -> impl Future<Output = StoredCredentials> + Send {
        async move {
            StoredCredentials {
                access_token: self.get(CredentialKey::AccessToken).await,
                refresh_token: self.get(CredentialKey::RefreshToken).await,
                user_id: self.get(CredentialKey::UserId).await,
            }
        }
    }
}

/// Resolve the state directory for inspectr data.
///
/// Checks `INSPECTR_STATE_DIR`, then `$XDG_STATE_HOME/inspectr`,
/// then `$HOME/.local/state/inspectr`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("INSPECTR_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("inspectr");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/inspectr");
    }
    PathBuf::from(".inspectr")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
