use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The API mixes integer primary keys (sessions, messages, users) with UUID
/// strings (documents). Everything is a `String` on this side.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

/// Parse an RFC 3339 timestamp, or a naive ISO timestamp taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        None => Ok(None),
    }
}

// ── Chat ──

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatSession {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub document_title: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    #[serde(alias = "assistant")]
    Ai,
    System,
}

/// Where an answer came from, when the backend reports it.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MessageSource {
    #[serde(deserialize_with = "opt_string_or_number")]
    pub document_id: Option<String>,
    pub document_title: Option<String>,
    pub page_number: Option<u32>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_reference: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<MessageSource>,
}

impl ChatMessage {
    /// A message created on this side, before or instead of a server copy.
    pub fn local(kind: MessageType, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            page_reference: None,
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn as the RAG and explain endpoints expect it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

impl HistoryTurn {
    /// System messages are local notices and never become history.
    pub fn from_message(message: &ChatMessage) -> Option<Self> {
        let role = match message.kind {
            MessageType::User => Role::User,
            MessageType::Ai => Role::Assistant,
            MessageType::System => return None,
        };
        Some(Self {
            role,
            content: message.content.clone(),
        })
    }
}

// ── Documents ──

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Document {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(deserialize_with = "timestamp")]
    pub upload_date: DateTime<Utc>,
    #[serde(default)]
    pub is_processed: bool,
    #[serde(default)]
    pub is_embedded: Option<bool>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PagePreview {
    pub page_number: u32,
    #[serde(default)]
    pub content_preview: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentSummary {
    #[serde(flatten)]
    pub document: Document,
    #[serde(default)]
    pub sample_pages: Vec<PagePreview>,
}

// ── Accounts ──

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UserStatistics {
    pub total_documents: u64,
    pub total_chat_sessions: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub user: User,
    #[serde(default)]
    pub statistics: UserStatistics,
}

// ── Analytics ──

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StudyInsights {
    pub total_study_time: u64,
    pub total_documents: u64,
    pub total_chats: u64,
    pub current_streak: u32,
    pub last_study_date: Option<String>,
    pub week_study_time: u64,
    pub recent_sessions_count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProgressPoint {
    pub date: String,
    #[serde(default)]
    pub duration_minutes: u64,
    #[serde(default)]
    pub documents_count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StudySessionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub duration_minutes: u64,
    #[serde(default)]
    pub pages_viewed: u64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentAnalytics {
    #[serde(deserialize_with = "string_or_number")]
    pub document_id: String,
    #[serde(default)]
    pub document_title: Option<String>,
    #[serde(default)]
    pub total_study_time: u64,
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub total_pages_viewed: u64,
    #[serde(default)]
    pub average_session_time: u64,
}
