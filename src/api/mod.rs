pub mod analytics;
pub mod auth;
pub mod chat;
pub mod documents;

use crate::config::{ClientConfig, UploadStyle};
use crate::models::AuthToken;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Not authenticated, please log in again")]
    Unauthorized,
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Somewhere to keep the bearer token between calls.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn store(&self, token: &AuthToken) -> Result<(), ApiError>;
    fn replace_token(&self, access_token: &str) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

/// Process-local credentials, gone when the client is dropped.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: Mutex<Option<String>>,
}

impl MemoryCredentials {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentials {
    fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn store(&self, token: &AuthToken) -> Result<(), ApiError> {
        *self.token.lock().unwrap() = Some(token.access_token.clone());
        Ok(())
    }

    fn replace_token(&self, access_token: &str) -> Result<(), ApiError> {
        *self.token.lock().unwrap() = Some(access_token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    upload_style: UploadStyle,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upload_style: config.upload_style,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn upload_style(&self) -> UploadStyle {
        self.upload_style
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.token().is_some()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        if let Some(token) = self.credentials.token() {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Send and decode the JSON body.
    pub(crate) async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.dispatch(req, true).await?;
        decode(resp).await
    }

    /// Like `send`, for login and registration. A 401 there means wrong
    /// credentials, so the stored token stays and the server's detail is kept.
    pub(crate) async fn send_credentials<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = self.dispatch(req, false).await?;
        decode(resp).await
    }

    /// Send and discard whatever body comes back.
    pub(crate) async fn send_empty(&self, req: RequestBuilder) -> Result<(), ApiError> {
        self.dispatch(req, true).await?;
        Ok(())
    }

    async fn dispatch(&self, req: RequestBuilder, expire_on_401: bool) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!("{} {}", status.as_u16(), resp.url().path());

        if status == StatusCode::UNAUTHORIZED && expire_on_401 {
            warn!("Server rejected credentials, clearing stored token");
            if let Err(e) = self.credentials.clear() {
                warn!("Failed to clear credentials: {}", e);
            }
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(resp)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Pull the human-readable part out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    body.to_string()
}

/// Plain `{"message": ...}` acknowledgements.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub message: String,
}
