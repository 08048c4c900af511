use super::{ApiClient, ApiError};
use crate::models::{ChatMessage, ChatSession, HistoryTurn, MessageSource};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone)]
pub struct SendMessageBody<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<&'a str>,
    pub search_documents: bool,
}

/// What the session endpoint hands back after a send. Older servers only
/// return the AI side under `message` or `ai_message`.
#[derive(Debug, Deserialize, Clone)]
pub struct SentMessages {
    #[serde(default)]
    pub user_message: Option<ChatMessage>,
    #[serde(alias = "ai_message", alias = "message")]
    pub ai_response: ChatMessage,
}

#[derive(Debug, Serialize, Clone)]
pub struct RagChatRequest {
    pub query: String,
    pub document_ids: Vec<String>,
    pub chat_history: Vec<HistoryTurn>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RagAnswer {
    #[serde(alias = "answer", alias = "explanation", alias = "message")]
    pub response: String,
    #[serde(default)]
    pub sources: Vec<MessageSource>,
}

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    title: &'a str,
    document_id: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CreatedSession {
    Wrapped { session: ChatSession },
    Full(ChatSession),
    Minimal {
        session_id: serde_json::Value,
        title: String,
        #[serde(default)]
        document_id: Option<String>,
    },
}

impl From<CreatedSession> for ChatSession {
    fn from(created: CreatedSession) -> Self {
        match created {
            CreatedSession::Wrapped { session } | CreatedSession::Full(session) => session,
            CreatedSession::Minimal {
                session_id,
                title,
                document_id,
            } => ChatSession {
                id: match session_id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
                title,
                document_id,
                document_title: None,
                created_at: Utc::now(),
                updated_at: None,
                last_message: None,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SessionList {
    Wrapped { sessions: Vec<ChatSession> },
    Bare(Vec<ChatSession>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageList {
    Wrapped { messages: Vec<ChatMessage> },
    Bare(Vec<ChatMessage>),
}

#[derive(Serialize)]
struct ExplainBody<'a> {
    concept: &'a str,
    document_id: Option<&'a str>,
    chat_history: Option<&'a [HistoryTurn]>,
}

#[derive(Deserialize)]
struct ExplainResponse {
    #[serde(alias = "response")]
    explanation: String,
}

impl ApiClient {
    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>, ApiError> {
        let body: SessionList = self.send(self.get("/chat/sessions/")).await?;
        Ok(match body {
            SessionList::Wrapped { sessions } | SessionList::Bare(sessions) => sessions,
        })
    }

    pub async fn create_session(
        &self,
        title: &str,
        document_id: Option<&str>,
    ) -> Result<ChatSession, ApiError> {
        let req = self
            .post("/chat/sessions/")
            .json(&CreateSessionBody { title, document_id });
        let created: CreatedSession = self.send(req).await?;
        Ok(created.into())
    }

    pub async fn delete_session(&self, id: &str) -> Result<(), ApiError> {
        self.send_empty(self.delete(&format!("/chat/sessions/{}/", id)))
            .await
    }

    pub async fn session_messages(&self, id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let body: MessageList = self
            .send(self.get(&format!("/chat/sessions/{}/messages/", id)))
            .await?;
        Ok(match body {
            MessageList::Wrapped { messages } | MessageList::Bare(messages) => messages,
        })
    }

    pub async fn post_message(
        &self,
        session_id: &str,
        body: &SendMessageBody<'_>,
    ) -> Result<SentMessages, ApiError> {
        let req = self
            .post(&format!("/chat/sessions/{}/messages/", session_id))
            .json(body);
        self.send(req).await
    }

    pub async fn rag_chat(&self, request: &RagChatRequest) -> Result<RagAnswer, ApiError> {
        self.send(self.post("/reader/chat/").json(request)).await
    }

    pub async fn explain_concept(
        &self,
        concept: &str,
        document_id: Option<&str>,
        chat_history: Option<&[HistoryTurn]>,
    ) -> Result<String, ApiError> {
        if concept.trim().is_empty() {
            return Err(ApiError::InvalidInput("Concept must not be empty".into()));
        }
        let req = self.post("/chat/explain/").json(&ExplainBody {
            concept,
            document_id,
            chat_history,
        });
        let resp: ExplainResponse = self.send(req).await?;
        Ok(resp.explanation)
    }
}
