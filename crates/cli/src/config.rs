// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};

use inspectr_session::SessionConfig;

/// Session client for the inspectr questionnaire backend.
#[derive(Debug, Parser)]
#[command(name = "inspectr", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionConfig,

    /// Log format (json or text).
    #[arg(long, env = "INSPECTR_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, env = "INSPECTR_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Log in and store the returned credentials.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INSPECTR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Restore the stored session and report whether it is usable.
    Status,
    /// Forget the stored credentials.
    Logout,
    /// Authenticated GET; prints the response body.
    Get { path: String },
    /// Authenticated POST with a JSON body; prints the response body.
    Post {
        path: String,
        #[arg(long)]
        body: String,
    },
    /// Ask the validation service about the stored access token.
    Validate,
}

impl Cli {
    /// Reject option combinations clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        if self.session.timeout_ms == 0 {
            anyhow::bail!("--timeout-ms must be greater than zero");
        }
        if !self.session.api_url.starts_with("http://") && !self.session.api_url.starts_with("https://")
        {
            anyhow::bail!("--api-url must be an http(s) URL: {}", self.session.api_url);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
