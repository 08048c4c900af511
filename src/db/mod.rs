pub mod models;

use crate::api::{ApiError, CredentialStore};
use crate::models::{AuthToken, User};
use models::StoredCredentials;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::sync::Mutex;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(app_dir: &std::path::Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir).ok();
        let db_path = app_dir.join("mentora.db");
        let conn = Connection::open(db_path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS credentials (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                access_token TEXT NOT NULL,
                user_json TEXT,
                saved_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    // ── Settings ──

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Credentials ──

    pub fn save_credentials(&self, access_token: &str, user: Option<&User>) -> Result<()> {
        let user_json = user.and_then(|u| serde_json::to_string(u).ok());
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO credentials (id, access_token, user_json, saved_at)
             VALUES (1, ?1, ?2, datetime('now'))",
            params![access_token, user_json],
        )?;
        Ok(())
    }

    /// Swap the token but keep the stored user.
    pub fn update_token(&self, access_token: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE credentials SET access_token = ?1, saved_at = datetime('now') WHERE id = 1",
            params![access_token],
        )?;
        if updated == 0 {
            conn.execute(
                "INSERT INTO credentials (id, access_token) VALUES (1, ?1)",
                params![access_token],
            )?;
        }
        Ok(())
    }

    pub fn load_credentials(&self) -> Result<Option<StoredCredentials>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT access_token, user_json, saved_at FROM credentials WHERE id = 1",
            [],
            |row| {
                let user_json: Option<String> = row.get(1)?;
                Ok(StoredCredentials {
                    access_token: row.get(0)?,
                    user: user_json.and_then(|j| serde_json::from_str(&j).ok()),
                    saved_at: row.get(2)?,
                })
            },
        )
        .optional()
    }

    pub fn clear_credentials(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM credentials", [])?;
        Ok(())
    }
}

impl CredentialStore for Database {
    fn token(&self) -> Option<String> {
        self.load_credentials()
            .ok()
            .flatten()
            .map(|c| c.access_token)
    }

    fn store(&self, token: &AuthToken) -> std::result::Result<(), ApiError> {
        self.save_credentials(&token.access_token, Some(&token.user))?;
        Ok(())
    }

    fn replace_token(&self, access_token: &str) -> std::result::Result<(), ApiError> {
        self.update_token(access_token)?;
        Ok(())
    }

    fn clear(&self) -> std::result::Result<(), ApiError> {
        self.clear_credentials()?;
        Ok(())
    }
}
