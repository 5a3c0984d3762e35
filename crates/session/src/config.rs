// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use crate::store::CREDENTIAL_FILE;

/// Configuration for the session core.
#[derive(Debug, Clone, clap::Args)]
pub struct SessionConfig {
    /// Base URL of the backend (auth endpoints and business calls).
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "INSPECTR_API_URL")]
    pub api_url: String,

    /// Base URL of the secondary token validation service. Defaults to `--api-url`.
    #[arg(long, env = "INSPECTR_VALIDATE_URL")]
    pub validate_url: Option<String>,

    /// Timeout applied to every network call, in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "INSPECTR_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Refresh proactively when the access token expires within this many seconds.
    #[arg(long, default_value_t = 60, env = "INSPECTR_EXPIRY_BUFFER_SECS")]
    pub expiry_buffer_secs: u64,

    /// Ask the validation service to confirm a locally valid token at startup.
    #[arg(long, env = "INSPECTR_VALIDATE_ON_STARTUP")]
    pub validate_on_startup: bool,

    /// Directory for the durable credential file.
    #[arg(long, env = "INSPECTR_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".to_owned(),
            validate_url: None,
            timeout_ms: 10_000,
            expiry_buffer_secs: 60,
            validate_on_startup: false,
            state_dir: None,
        }
    }
}

impl SessionConfig {
    /// Config pointing at `api_url` with every other field defaulted.
    pub fn for_api(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into(), ..Self::default() }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL for `/auth/validate-token`.
    pub fn validate_base(&self) -> &str {
        self.validate_url.as_deref().unwrap_or(&self.api_url)
    }

    /// Resolve the state directory, falling back to the XDG default.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(crate::store::state_dir)
    }

    /// Path of the JSON document backing [`FileStore`](crate::store::FileStore).
    pub fn credential_path(&self) -> PathBuf {
        self.state_dir().join(CREDENTIAL_FILE)
    }

    /// Join `path` onto `base`, tolerating a missing or doubled slash.
    pub(crate) fn join(base: &str, path: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Resolve a request target: absolute URLs pass through, paths join `api_url`.
    pub fn resolve(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_owned()
        } else {
            Self::join(&self.api_url, target)
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
