use async_trait::async_trait;
use reqwest::Response;

use crate::auth::TokenPair;
use crate::db::models::PublicUser;
use crate::session::{AuthClient, SessionError};

/// HTTP implementation of the credential-service contract.
pub struct HttpAuthClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpAuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn token_response(&self, res: Response) -> Result<TokenPair, SessionError> {
        if !res.status().is_success() {
            return Err(error_message(res).await);
        }
        res.json::<TokenPair>()
            .await
            .map_err(|e| SessionError(e.to_string()))
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<TokenPair, SessionError> {
        let res = self
            .http
            .post(format!("{}/auth/register", self.base_url))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "name": name,
            }))
            .send()
            .await
            .map_err(|e| SessionError(e.to_string()))?;

        self.token_response(res).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, SessionError> {
        let res = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| SessionError(e.to_string()))?;

        self.token_response(res).await
    }

    async fn current_user(&self, token: &str) -> Result<PublicUser, SessionError> {
        let res = self
            .http
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SessionError(e.to_string()))?;

        if !res.status().is_success() {
            return Err(error_message(res).await);
        }
        res.json::<PublicUser>()
            .await
            .map_err(|e| SessionError(e.to_string()))
    }
}

// Pulls `error.message` out of the server's JSON error body, falling back
// to the status line.
async fn error_message(res: Response) -> SessionError {
    let status = res.status();
    let message = res
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| status.to_string());
    SessionError(message)
}
