pub mod api;
pub mod chat;
pub mod commands;
pub mod config;
pub mod db;
pub mod models;

pub use api::{ApiClient, ApiError, CredentialStore, MemoryCredentials};
pub use chat::{SendOutcome, SessionStore};
pub use config::{ClientConfig, UploadStyle};
pub use db::Database;
