use crate::models::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoredCredentials {
    pub access_token: String,
    pub user: Option<User>,
    pub saved_at: String,
}
