// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use inspectr_session::{ErrorKind, LoginError, RequestError};

/// Process exit codes.
pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_SESSION: i32 = 3;

pub const SESSION_EXPIRED_MESSAGE: &str = "session expired, please log in";

/// Exit code for a failed authenticated call.
pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NoCredential | ErrorKind::SessionExpired => EXIT_SESSION,
        ErrorKind::Network | ErrorKind::Http | ErrorKind::Internal => EXIT_FAILURE,
    }
}

/// One-line message shown to the user for a failed authenticated call.
pub fn describe(err: &RequestError) -> String {
    match err.kind() {
        ErrorKind::NoCredential | ErrorKind::SessionExpired => SESSION_EXPIRED_MESSAGE.to_owned(),
        ErrorKind::Network => format!("{err}; check your connection and try again"),
        ErrorKind::Http => format!("{err}; try again"),
        ErrorKind::Internal => err.to_string(),
    }
}

/// One-line message shown to the user for a failed login.
pub fn describe_login(err: &LoginError) -> String {
    match err {
        LoginError::Rejected { message, .. } => format!("login failed: {message}"),
        LoginError::Network(_) => format!("{err}; check your connection and try again"),
        LoginError::Malformed(_) | LoginError::Store(_) => err.to_string(),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
