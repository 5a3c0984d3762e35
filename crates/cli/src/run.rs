// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand dispatch. Results go to `out`, user-facing failures to stderr.

use std::io::Write;

use anyhow::Context;

use inspectr_session::{
    token, CredentialKey, CredentialStore, FileStore, ProtectedRequest, SessionController,
    SessionState,
};

use crate::config::{Cli, Command};
use crate::error::{describe, describe_login, exit_code, EXIT_FAILURE, EXIT_OK, EXIT_SESSION};

/// Run the parsed command against the on-disk credential store.
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    let path = cli.session.credential_path();
    tracing::debug!(path = %path.display(), "opening credential store");
    let controller = SessionController::new(cli.session, FileStore::open(path))?;
    dispatch(&controller, cli.command, &mut std::io::stdout()).await
}

/// Execute one command and return the process exit code.
pub async fn dispatch<S: CredentialStore>(
    controller: &SessionController<S>,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    match command {
        Command::Login { email, password } => match controller.login(&email, &password).await {
            Ok(state) => {
                writeln!(out, "logged in as {}", state.user_id().unwrap_or_default())?;
                Ok(EXIT_OK)
            }
            Err(e) => {
                eprintln!("{}", describe_login(&e));
                Ok(EXIT_FAILURE)
            }
        },
        Command::Status => status(controller, out).await,
        Command::Logout => {
            controller.on_logout().await;
            writeln!(out, "logged out")?;
            Ok(EXIT_OK)
        }
        Command::Get { path } => call(controller, ProtectedRequest::get(path), out).await,
        Command::Post { path, body } => {
            let body: serde_json::Value =
                serde_json::from_str(&body).context("--body is not valid JSON")?;
            call(controller, ProtectedRequest::post(path).json(body), out).await
        }
        Command::Validate => {
            let Some(access) = controller.store().get(CredentialKey::AccessToken).await else {
                eprintln!("not logged in");
                return Ok(EXIT_SESSION);
            };
            match controller.api().validate_token(&access).await {
                Ok(true) => {
                    writeln!(out, "token is valid")?;
                    Ok(EXIT_OK)
                }
                Ok(false) => {
                    eprintln!("token is not valid");
                    Ok(EXIT_SESSION)
                }
                Err(e) => {
                    eprintln!("validation service unavailable: {e}; try again");
                    Ok(EXIT_FAILURE)
                }
            }
        }
    }
}

async fn status<S: CredentialStore>(
    controller: &SessionController<S>,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    match controller.on_startup().await {
        SessionState::Authenticated { user_id } => {
            writeln!(out, "authenticated as {user_id}")?;
            let access = controller.store().get(CredentialKey::AccessToken).await;
            if let Some(remaining) = access.as_deref().and_then(token::seconds_remaining) {
                writeln!(out, "access token expires in {remaining}s")?;
            }
            Ok(EXIT_OK)
        }
        SessionState::Unauthenticated => {
            eprintln!("not logged in");
            Ok(EXIT_SESSION)
        }
    }
}

async fn call<S: CredentialStore>(
    controller: &SessionController<S>,
    request: ProtectedRequest,
    out: &mut impl Write,
) -> anyhow::Result<i32> {
    match controller.execute(&request).await {
        Ok(response) => {
            let body = response.text().await.context("failed to read response body")?;
            writeln!(out, "{body}")?;
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("{}", describe(&e));
            Ok(exit_code(e.kind()))
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
