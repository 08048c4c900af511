use crate::db::Database;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// How the upload endpoint expects the document title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStyle {
    /// `POST /reader/documents/upload?title=...` with a lone `file` part.
    #[default]
    QueryTitle,
    /// `POST /reader/upload/` with `file` and `title` form parts.
    FormTitle,
}

impl FromStr for UploadStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "query" | "query-title" => Ok(UploadStyle::QueryTitle),
            "form" | "form-title" => Ok(UploadStyle::FormTitle),
            other => Err(format!("Unknown upload style: {}", other)),
        }
    }
}

impl fmt::Display for UploadStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStyle::QueryTitle => f.write_str("query-title"),
            UploadStyle::FormTitle => f.write_str("form-title"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub upload_style: UploadStyle,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            upload_style: UploadStyle::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with whatever the settings table holds.
    pub fn from_settings(db: &Database) -> Self {
        let mut config = Self::default();

        if let Some(url) = db.get_setting("api_base_url").ok().flatten() {
            config.base_url = url;
        }
        if let Some(raw) = db.get_setting("upload_style").ok().flatten() {
            match raw.parse() {
                Ok(style) => config.upload_style = style,
                Err(e) => warn!("Ignoring stored upload_style: {}", e),
            }
        }
        if let Some(raw) = db.get_setting("request_timeout_secs").ok().flatten() {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring stored request_timeout_secs: {}", raw),
            }
        }

        config
    }

    /// A flag or env value wins over stored settings.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }
}
