use super::{Ack, ApiClient, ApiError};
use crate::models::{AuthToken, Profile, User};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

pub const MAX_AVATAR_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Serialize, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.phone.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AvatarUpload {
    #[serde(default)]
    pub message: String,
    pub avatar_url: String,
    pub user: User,
}

/// The backend stores JPEG, PNG and WebP avatars. Returns the file name and
/// the MIME type to send it as.
pub fn avatar_content_type(path: &Path) -> Result<(String, &'static str), ApiError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ApiError::InvalidInput(format!("Not a file: {}", path.display())))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let mime = match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => {
            return Err(ApiError::InvalidInput(format!(
                "Only image files (JPEG, PNG, WebP) are allowed: {}",
                filename
            )))
        }
    };
    Ok((filename.to_string(), mime))
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ProfileUpdated {
    user: User,
}

#[derive(Deserialize)]
struct PasswordChanged {
    #[serde(default)]
    token: Option<String>,
}

impl ApiClient {
    pub async fn register(&self, registration: &Registration) -> Result<AuthToken, ApiError> {
        let token: AuthToken = self
            .send_credentials(self.post("/auth/register").json(registration))
            .await?;
        self.credentials.store(&token)?;
        info!("Registered as {}", token.user.username);
        Ok(token)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let req = self
            .post("/auth/login")
            .json(&Credentials { username, password });
        let token: AuthToken = self.send_credentials(req).await?;
        self.credentials.store(&token)?;
        info!("Logged in as {}", token.user.username);
        Ok(token)
    }

    /// The server keeps no session state, so the local token goes regardless.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if !self.is_authenticated() {
            return Ok(());
        }
        match self.send_empty(self.post("/auth/logout")).await {
            Ok(()) | Err(ApiError::Unauthorized) => {}
            Err(e) => warn!("Logout request failed: {}", e),
        }
        self.credentials.clear()
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.send(self.get("/auth/profile")).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        if update.is_empty() {
            return Err(ApiError::InvalidInput("Nothing to update".into()));
        }
        let resp: ProfileUpdated = self.send(self.put("/auth/profile").json(update)).await?;
        Ok(resp.user)
    }

    pub async fn upload_avatar(&self, path: &Path) -> Result<AvatarUpload, ApiError> {
        let (filename, mime) = avatar_content_type(path)?;
        let size = tokio::fs::metadata(path).await?.len();
        if size > MAX_AVATAR_BYTES {
            return Err(ApiError::InvalidInput(format!(
                "File size must be less than 5MB: {} is {} bytes",
                filename, size
            )));
        }
        let bytes = tokio::fs::read(path).await?;
        let part = Part::bytes(bytes).file_name(filename.clone()).mime_str(mime)?;
        let form = Form::new().part("file", part);

        info!("Uploading avatar {} ({} bytes)", filename, size);
        self.send(self.post("/auth/upload-avatar").multipart(form)).await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<(), ApiError> {
        let req = self.post("/auth/change-password").json(&serde_json::json!({
            "old_password": old_password,
            "new_password": new_password,
        }));
        let resp: PasswordChanged = self.send(req).await?;
        if let Some(token) = resp.token {
            self.credentials.replace_token(&token)?;
        }
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<String, ApiError> {
        let req = self
            .post("/auth/password-reset/request")
            .json(&serde_json::json!({ "email": email }));
        let ack: Ack = self.send(req).await?;
        Ok(ack.message)
    }

    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<String, ApiError> {
        let req = self
            .post("/auth/password-reset/verify")
            .json(&serde_json::json!({ "email": email, "code": code }));
        let ack: Ack = self.send(req).await?;
        Ok(ack.message)
    }

    pub async fn complete_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<String, ApiError> {
        let req = self.post("/auth/password-reset/complete").json(&serde_json::json!({
            "email": email,
            "code": code,
            "new_password": new_password,
        }));
        let ack: Ack = self.send(req).await?;
        Ok(ack.message)
    }
}
