// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle: startup check, login, logout, and forced logout.
//!
//! The controller is the only component that clears stored credentials in
//! response to an expired session. Hosts watch [`SessionState`] to decide
//! between the login screen and the authenticated screens.

use std::sync::Arc;

use reqwest::Response;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::api::AuthApi;
use crate::config::SessionConfig;
use crate::error::{LoginError, RequestError};
use crate::executor::{ProtectedRequest, RequestExecutor};
use crate::refresh::SessionRefresher;
use crate::store::{Credential, CredentialKey, CredentialStore};
use crate::token;

/// Which side of the login wall the app is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated { user_id: String },
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { user_id } => Some(user_id),
            Self::Unauthenticated => None,
        }
    }
}

/// Owns the session components and publishes the current [`SessionState`].
pub struct SessionController<S> {
    api: AuthApi,
    store: Arc<S>,
    refresher: Arc<SessionRefresher<S>>,
    executor: RequestExecutor<S>,
    state: watch::Sender<SessionState>,
}

impl<S: CredentialStore> SessionController<S> {
    /// Build the controller and its HTTP client from `config`.
    pub fn new(config: SessionConfig, store: S) -> anyhow::Result<Self> {
        Ok(Self::with_api(AuthApi::new(config)?, Arc::new(store)))
    }

    pub fn with_api(api: AuthApi, store: Arc<S>) -> Self {
        let refresher = Arc::new(SessionRefresher::new(api.clone(), Arc::clone(&store)));
        let executor =
            RequestExecutor::new(api.clone(), Arc::clone(&store), Arc::clone(&refresher));
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self { api, store, refresher, executor, state }
    }

    pub fn api(&self) -> &AuthApi {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn refresher(&self) -> &SessionRefresher<S> {
        &self.refresher
    }

    pub fn executor(&self) -> &RequestExecutor<S> {
        &self.executor
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Decide the initial state from whatever the store holds.
    ///
    /// An expired access token is refreshed once. If the refresh proves the
    /// session is gone the store is cleared; if it merely could not reach the
    /// backend the credentials are kept for the next attempt.
    pub async fn on_startup(&self) -> SessionState {
        let stored = self.store.load().await;
        let (Some(user_id), Some(access)) = (stored.user_id, stored.access_token) else {
            tracing::debug!("no stored session");
            return self.publish(SessionState::Unauthenticated);
        };

        if !token::is_expired(&access) {
            if self.api.config().validate_on_startup {
                match self.api.validate_token(&access).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::info!(%user_id, "stored token rejected by validation service");
                        return self.clear_session().await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            %user_id,
                            err = %e,
                            "validation service unavailable, trusting local expiry"
                        );
                    }
                }
            }
            tracing::info!(%user_id, "resuming stored session");
            return self.publish(SessionState::Authenticated { user_id });
        }

        let Some(refresh_token) = stored.refresh_token else {
            tracing::info!(%user_id, "access token expired and no refresh token");
            return self.clear_session().await;
        };

        match self.refresher.refresh(&refresh_token).await {
            Ok(_) => {
                tracing::info!(%user_id, "session restored by refresh");
                self.publish(SessionState::Authenticated { user_id })
            }
            Err(e) if e.is_terminal() => {
                tracing::info!(%user_id, err = %e, "session could not be restored");
                self.clear_session().await
            }
            Err(e) => {
                tracing::warn!(%user_id, err = %e, "refresh unavailable at startup, keeping credentials");
                self.publish(SessionState::Unauthenticated)
            }
        }
    }

    /// `POST /auth/login`, then persist the returned credential.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionState, LoginError> {
        let cred = self.api.login(email, password).await?;
        self.on_login_success(&cred).await.map_err(|e| LoginError::Store(format!("{e:#}")))?;
        Ok(self.state())
    }

    /// Persist all three credential fields and become authenticated.
    pub async fn on_login_success(&self, cred: &Credential) -> anyhow::Result<()> {
        self.store
            .set_many(&[
                (CredentialKey::AccessToken, cred.access_token.as_str()),
                (CredentialKey::RefreshToken, cred.refresh_token.as_str()),
                (CredentialKey::UserId, cred.user_id.as_str()),
            ])
            .await?;
        tracing::info!(user_id = %cred.user_id, "logged in");
        self.publish(SessionState::Authenticated { user_id: cred.user_id.clone() });
        Ok(())
    }

    /// Clear the store and become unauthenticated. Safe to call repeatedly.
    pub async fn on_logout(&self) {
        self.clear_session().await;
        tracing::info!("logged out");
    }

    /// Run `request` through the executor, forcing a logout when the session is gone.
    pub async fn execute(&self, request: &ProtectedRequest) -> Result<Response, RequestError> {
        let result = self.executor.execute(request).await;
        if let Err(ref e) = result {
            self.on_request_error(e).await;
        }
        result
    }

    /// [`execute`](Self::execute) and decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: &ProtectedRequest,
    ) -> Result<T, RequestError> {
        let response = self.execute(request).await?;
        response.json().await.map_err(RequestError::Decode)
    }

    /// Apply the logout policy for a failure observed outside [`execute`](Self::execute).
    pub async fn on_request_error(&self, error: &RequestError) {
        if error.kind().forces_logout() {
            tracing::info!(kind = %error.kind(), "forcing logout");
            self.on_logout().await;
        }
    }

    async fn clear_session(&self) -> SessionState {
        if let Err(e) = self.store.clear().await {
            tracing::error!(err = %e, "failed to clear stored credentials");
        }
        self.publish(SessionState::Unauthenticated)
    }

    fn publish(&self, state: SessionState) -> SessionState {
        self.state.send_replace(state.clone());
        state
    }
}
