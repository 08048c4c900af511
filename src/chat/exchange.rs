use crate::api::chat::{RagChatRequest, SendMessageBody};
use crate::api::{ApiClient, ApiError};
use crate::models::{ChatMessage, HistoryTurn, MessageType};
use tracing::{info, warn};

/// How many prior messages ride along with a fallback query.
pub const HISTORY_WINDOW: usize = 6;

pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone)]
pub struct SendRequest {
    pub session_id: String,
    pub message: String,
    pub document_id: Option<String>,
    pub search_documents: bool,
}

impl SendRequest {
    /// Blank messages never leave the client.
    pub fn new(session_id: impl Into<String>, message: &str) -> Result<Self, ApiError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::InvalidInput("Message must not be empty".into()));
        }
        Ok(Self {
            session_id: session_id.into(),
            message: message.to_string(),
            document_id: None,
            search_documents: false,
        })
    }

    pub fn with_document(mut self, document_id: Option<String>) -> Self {
        self.document_id = document_id;
        self
    }

    pub fn search_documents(mut self, search: bool) -> Self {
        self.search_documents = search;
        self
    }
}

#[derive(Debug)]
pub enum SendOutcome {
    /// The session endpoint answered.
    Success(ChatMessage),
    /// The session endpoint failed and the RAG endpoint answered instead.
    FallbackSuccess(ChatMessage),
    /// Both paths failed; the transcript ends with [`ERROR_REPLY`].
    Failure { primary: ApiError, fallback: ApiError },
}

impl SendOutcome {
    pub fn reply(&self) -> Option<&ChatMessage> {
        match self {
            SendOutcome::Success(m) | SendOutcome::FallbackSuccess(m) => Some(m),
            SendOutcome::Failure { .. } => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            SendOutcome::Failure {
                primary: ApiError::Unauthorized,
                ..
            } | SendOutcome::Failure {
                fallback: ApiError::Unauthorized,
                ..
            }
        )
    }
}

/// The last `limit` messages as wire history, oldest first.
pub fn recent_history(messages: &[ChatMessage], limit: usize) -> Vec<HistoryTurn> {
    let start = messages.len().saturating_sub(limit);
    messages[start..]
        .iter()
        .filter_map(HistoryTurn::from_message)
        .collect()
}

/// Run one exchange against `transcript`: the user message goes in first,
/// then exactly one reply (server, fallback, or the canned error).
pub async fn exchange(
    client: &ApiClient,
    transcript: &mut Vec<ChatMessage>,
    request: &SendRequest,
) -> SendOutcome {
    let history = recent_history(transcript, HISTORY_WINDOW);
    transcript.push(ChatMessage::local(MessageType::User, request.message.clone()));

    let body = SendMessageBody {
        content: &request.message,
        document_id: request.document_id.as_deref(),
        search_documents: request.search_documents,
    };

    let primary = match client.post_message(&request.session_id, &body).await {
        Ok(sent) => {
            transcript.push(sent.ai_response.clone());
            return SendOutcome::Success(sent.ai_response);
        }
        Err(e) => e,
    };

    warn!(
        "Session {} rejected message ({}), falling back to document chat",
        request.session_id, primary
    );

    match fallback(client, &request.message, history).await {
        Ok(reply) => {
            transcript.push(reply.clone());
            SendOutcome::FallbackSuccess(reply)
        }
        Err(fallback) => {
            warn!("Fallback chat failed: {}", fallback);
            transcript.push(ChatMessage::local(MessageType::Ai, ERROR_REPLY));
            SendOutcome::Failure { primary, fallback }
        }
    }
}

async fn fallback(
    client: &ApiClient,
    query: &str,
    chat_history: Vec<HistoryTurn>,
) -> Result<ChatMessage, ApiError> {
    let document_ids: Vec<String> = client
        .all_documents()
        .await?
        .into_iter()
        .map(|d| d.id)
        .collect();
    info!(
        "Fallback query over {} documents with {} history turns",
        document_ids.len(),
        chat_history.len()
    );

    let answer = client
        .rag_chat(&RagChatRequest {
            query: query.to_string(),
            document_ids,
            chat_history,
        })
        .await?;

    let mut reply = ChatMessage::local(MessageType::Ai, answer.response);
    reply.sources = answer.sources;
    Ok(reply)
}
