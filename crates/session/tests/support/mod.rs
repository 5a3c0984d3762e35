// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fake of the auth backend for integration tests.
//!
//! Served with `axum::serve` on an ephemeral port so the real reqwest client
//! is exercised end to end. Counters record every call so tests can assert on
//! exchange and send counts.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

use inspectr_session::{MemoryStore, SessionConfig, SessionController};

pub const USER_ID: &str = "u-1";
pub const PASSWORD: &str = "secret";

/// Build an unsigned token whose `exp` is `offset` seconds from now.
pub fn token_expiring_in(offset: i64, jti: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let exp = inspectr_session::epoch_secs() as i64 + offset;
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{USER_ID}","exp":{exp},"jti":{jti}}}"#));
    format!("{header}.{payload}.c2ln")
}

/// Mutable behavior and call counters of the fake backend.
#[derive(Default)]
pub struct Backend {
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub business_calls: AtomicUsize,
    /// Respond to refresh with this status instead of exchanging (0 = normal).
    pub refresh_status: AtomicU16,
    /// Delay before answering a refresh, in milliseconds.
    pub refresh_delay_ms: AtomicU64,
    /// Answer this many business calls with 401 regardless of the token.
    pub reject_next: AtomicUsize,
    seq: AtomicU64,
    access_tokens: Mutex<HashSet<String>>,
    refresh_tokens: Mutex<HashSet<String>>,
}

fn lock(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Backend {
    fn next_id(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Mint an access token the business endpoints accept.
    pub fn issue_access(&self, offset: i64) -> String {
        let token = token_expiring_in(offset, self.next_id());
        lock(&self.access_tokens).insert(token.clone());
        token
    }

    /// Mint a single-use refresh token.
    pub fn issue_refresh(&self) -> String {
        let token = format!("r-{}", self.next_id());
        lock(&self.refresh_tokens).insert(token.clone());
        token
    }

    pub fn revoke_access(&self, token: &str) {
        lock(&self.access_tokens).remove(token);
    }

    pub fn accepts(&self, token: &str) -> bool {
        lock(&self.access_tokens).contains(token)
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.business_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
            + self.refreshes()
            + self.validate_calls.load(Ordering::SeqCst)
            + self.sends()
    }
}

pub struct FakeBackend {
    pub url: String,
    pub state: Arc<Backend>,
}

impl FakeBackend {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(Backend::default());
        let router = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh-token", post(refresh))
            .route("/auth/validate-token", post(validate))
            .route("/users/{id}", get(user))
            .route("/answers", post(create_answer))
            .route("/missing", get(missing))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(Self { url, state })
    }

    pub fn config(&self) -> SessionConfig {
        SessionConfig { timeout_ms: 2_000, ..SessionConfig::for_api(&self.url) }
    }

    pub fn controller(&self) -> anyhow::Result<SessionController<MemoryStore>> {
        SessionController::new(self.config(), MemoryStore::new())
    }
}

/// A base URL nothing listens on.
pub async fn dead_url() -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}", listener.local_addr()?);
    drop(listener);
    Ok(url)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_owned)
}

async fn login(State(s): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    s.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid credentials" })))
            .into_response();
    }
    Json(json!({
        "accessToken": s.issue_access(3600),
        "refreshToken": s.issue_refresh(),
        "userId": USER_ID,
    }))
    .into_response()
}

async fn refresh(State(s): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    s.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = s.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let forced = s.refresh_status.load(Ordering::SeqCst);
    if forced != 0 {
        let status = StatusCode::from_u16(forced).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({ "message": "forced" }))).into_response();
    }

    let token = body["token"].as_str().unwrap_or_default().to_owned();
    // Refresh tokens rotate: each one is good for exactly one exchange.
    if !lock(&s.refresh_tokens).remove(&token) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid refresh token" })))
            .into_response();
    }
    Json(json!({
        "accessToken": s.issue_access(3600),
        "refreshToken": s.issue_refresh(),
    }))
    .into_response()
}

async fn validate(State(s): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    s.validate_calls.fetch_add(1, Ordering::SeqCst);
    let token = body["token"].as_str().unwrap_or_default();
    Json(json!({ "valid": s.accepts(token) })).into_response()
}

fn authorize(s: &Backend, headers: &HeaderMap) -> Result<String, Response> {
    s.business_calls.fetch_add(1, Ordering::SeqCst);
    let unauthorized =
        || (StatusCode::UNAUTHORIZED, Json(json!({ "message": "unauthorized" }))).into_response();
    let rejected = s
        .reject_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if rejected {
        return Err(unauthorized());
    }
    match bearer(headers) {
        Some(token) if s.accepts(&token) => Ok(token),
        _ => Err(unauthorized()),
    }
}

async fn user(
    State(s): State<Arc<Backend>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match authorize(&s, &headers) {
        Ok(token) => {
            let auth_headers = headers.get_all("authorization").iter().count();
            Json(json!({ "id": id, "tokenSeen": token, "authHeaders": auth_headers }))
                .into_response()
        }
        Err(resp) => resp,
    }
}

async fn create_answer(
    State(s): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    match authorize(&s, &headers) {
        Ok(_) => (StatusCode::CREATED, Json(json!({ "saved": body }))).into_response(),
        Err(resp) => resp,
    }
}

async fn missing(State(s): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    match authorize(&s, &headers) {
        Ok(_) => {
            (StatusCode::NOT_FOUND, Json(json!({ "message": "questionnaire not found" })))
                .into_response()
        }
        Err(resp) => resp,
    }
}
