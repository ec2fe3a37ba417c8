//! Client-side session state: holds the current token and derived user,
//! mirrors them into a small key-value persistence layer, and resolves a
//! persisted token into a user on startup.

pub mod client;

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::TokenPair;
use crate::db::models::PublicUser;

pub use client::HttpAuthClient;

// Storage key for the persisted token, shared with the web frontend.
pub const TOKEN_KEY: &str = "stockcast_token";

/// Credential-service error message, passed through for the UI to render.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct SessionError(pub String);

/// Wire contract to the credential service.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<TokenPair, SessionError>;
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, SessionError>;
    async fn current_user(&self, token: &str) -> Result<PublicUser, SessionError>;
}

/// Single-slot persistence for the opaque token string. Absence means
/// unauthenticated.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

impl<T: TokenStorage + ?Sized> TokenStorage for std::sync::Arc<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, token: &str) {
        (**self).save(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

#[derive(Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn save(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock().unwrap() = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unauthenticated,
    Loading,
    Authenticated,
}

pub struct SessionMirror<C, S> {
    client: C,
    storage: S,
    phase: Phase,
    token: Option<String>,
    user: Option<PublicUser>,
}

impl<C: AuthClient, S: TokenStorage> SessionMirror<C, S> {
    /// No network call happens here; a persisted token only puts the
    /// mirror into `Loading` until `resolve_startup` runs.
    pub fn new(client: C, storage: S) -> Self {
        let token = storage.load();
        let phase = if token.is_some() {
            Phase::Loading
        } else {
            Phase::Unauthenticated
        };

        Self {
            client,
            storage,
            phase,
            token,
            user: None,
        }
    }

    /// Resolves the persisted token into a user. A failed resolution
    /// degrades silently to unauthenticated and wipes persistence.
    pub async fn resolve_startup(&mut self) {
        let token = match (&self.phase, self.token.clone()) {
            (Phase::Loading, Some(token)) => token,
            _ => return,
        };

        match self.client.current_user(&token).await {
            Ok(user) => {
                info!("Startup token resolved for {}", user.email);
                self.user = Some(user);
                self.phase = Phase::Authenticated;
            }
            Err(e) => {
                warn!("Persisted token rejected, clearing session: {}", e);
                self.reset();
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), SessionError> {
        self.phase = Phase::Loading;
        let result = self.client.login(email, password).await;
        self.finish_sign_in(result).await
    }

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<(), SessionError> {
        self.phase = Phase::Loading;
        let result = self.client.register(email, password, name).await;
        self.finish_sign_in(result).await
    }

    /// Purely local: clears token, user, and persistence. The token itself
    /// stays valid server-side until it expires.
    pub fn logout(&mut self) {
        self.reset();
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    async fn finish_sign_in(
        &mut self,
        result: Result<TokenPair, SessionError>,
    ) -> Result<(), SessionError> {
        let pair = match result {
            Ok(pair) => pair,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };

        // Last write wins if two sign-ins raced; acceptable.
        self.storage.save(&pair.access_token);
        self.token = Some(pair.access_token.clone());

        match self.client.current_user(&pair.access_token).await {
            Ok(user) => {
                self.user = Some(user);
                self.phase = Phase::Authenticated;
                Ok(())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        self.token = None;
        self.user = None;
        self.phase = Phase::Unauthenticated;
        self.storage.clear();
    }
}
