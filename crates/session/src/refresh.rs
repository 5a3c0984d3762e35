// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token refresh with single-flight deduplication.
//!
//! Refresh tokens rotate on every exchange, so two concurrent exchanges with
//! the same refresh token would invalidate each other. At most one exchange
//! is in flight per refresher; every caller that asks for a refresh while it
//! runs awaits that same exchange.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::api::AuthApi;
use crate::error::RefreshFailure;
use crate::store::{CredentialKey, CredentialStore, TokenPair};
use crate::token;

type RefreshFlight = Shared<BoxFuture<'static, Result<TokenPair, RefreshFailure>>>;

/// Exchanges refresh tokens for new credential pairs, one exchange at a time.
pub struct SessionRefresher<S> {
    api: AuthApi,
    store: Arc<S>,
    buffer_secs: u64,
    inflight: Arc<Mutex<Option<RefreshFlight>>>,
    exchanges: Arc<AtomicU64>,
}

impl<S: CredentialStore> SessionRefresher<S> {
    pub fn new(api: AuthApi, store: Arc<S>) -> Self {
        let buffer_secs = api.config().expiry_buffer_secs;
        Self {
            api,
            store,
            buffer_secs,
            inflight: Arc::new(Mutex::new(None)),
            exchanges: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Exchange `refresh_token` for a new pair and persist it.
    ///
    /// Joins the in-flight exchange if there is one. Failures are returned
    /// as-is and never retried here.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RefreshFailure> {
        if refresh_token.is_empty() {
            return Err(RefreshFailure::MissingToken);
        }
        let flight = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(flight) => {
                    tracing::debug!("joining in-flight refresh");
                    flight.clone()
                }
                None => {
                    let flight = self.launch(refresh_token.to_owned());
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await
    }

    /// Obtain a usable access token to replace `seen`, the one the caller last used.
    ///
    /// If no exchange is running and the store already holds a different,
    /// non-expiring access token (a refresh finished since the caller read
    /// it), that token is returned without a new exchange. Otherwise the
    /// stored refresh token is exchanged, or the running exchange joined.
    pub async fn refresh_stale(&self, seen: Option<&str>) -> Result<String, RefreshFailure> {
        let flight = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(flight) => {
                    tracing::debug!("joining in-flight refresh");
                    flight.clone()
                }
                None => {
                    let stored = self.store.load().await;
                    if let Some(current) = stored.access_token.as_deref() {
                        if Some(current) != seen
                            && !token::is_about_to_expire(current, self.buffer_secs)
                        {
                            tracing::debug!("access token already replaced, skipping exchange");
                            return Ok(current.to_owned());
                        }
                    }
                    let Some(refresh_token) = stored.refresh_token else {
                        return Err(RefreshFailure::MissingToken);
                    };
                    let flight = self.launch(refresh_token);
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await.map(|pair| pair.access_token)
    }

    /// Number of backend exchanges this refresher has issued.
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    /// Whether an exchange is currently running.
    pub async fn in_flight(&self) -> bool {
        self.inflight.lock().await.is_some()
    }

    /// Start an exchange on its own task so it completes even if every caller goes away.
    ///
    /// Must be called with the in-flight slot locked.
    fn launch(&self, refresh_token: String) -> RefreshFlight {
        self.exchanges.fetch_add(1, Ordering::Relaxed);
        let api = self.api.clone();
        let store = Arc::clone(&self.store);
        let slot = Arc::clone(&self.inflight);

        let task = tokio::spawn(async move {
            let result = exchange(&api, store.as_ref(), &refresh_token).await;
            // Store writes above are visible before the slot opens up again.
            *slot.lock().await = None;
            result
        });

        let slot = Arc::clone(&self.inflight);
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(err = %e, "refresh task died");
                    *slot.lock().await = None;
                    Err(RefreshFailure::Interrupted(e.to_string()))
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn exchange<S: CredentialStore>(
    api: &AuthApi,
    store: &S,
    refresh_token: &str,
) -> Result<TokenPair, RefreshFailure> {
    let pair = match api.refresh_token(refresh_token).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(err = %e, "token refresh failed");
            return Err(e);
        }
    };

    let written = store
        .set_many(&[
            (CredentialKey::AccessToken, pair.access_token.as_str()),
            (CredentialKey::RefreshToken, pair.refresh_token.as_str()),
        ])
        .await;
    if let Err(e) = written {
        // The caller still gets working tokens for this run.
        tracing::error!(err = %e, "failed to persist refreshed credentials");
    }

    tracing::info!(expires_at = ?token::expires_at(&pair.access_token), "access token refreshed");
    Ok(pair)
}
