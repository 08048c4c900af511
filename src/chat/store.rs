use super::exchange::{self, SendOutcome, SendRequest};
use crate::api::{ApiClient, ApiError};
use crate::models::{ChatMessage, ChatSession};
use tracing::{debug, info, warn};

pub const DEFAULT_SESSION_TITLE: &str = "New Chat Session";

/// Local view of the user's chat sessions: the list, which one is open, and
/// the open session's transcript.
pub struct SessionStore {
    client: ApiClient,
    sessions: Vec<ChatSession>,
    current: Option<String>,
    transcript: Vec<ChatMessage>,
}

impl SessionStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            sessions: Vec::new(),
            current: None,
            transcript: Vec::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&ChatSession> {
        let id = self.current.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Replace the list from the server. A failed fetch leaves it as it was.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let sessions = self.client.list_sessions().await?;
        debug!("Loaded {} sessions", sessions.len());
        self.sessions = sessions;
        Ok(())
    }

    pub async fn create(
        &mut self,
        title: Option<&str>,
        document_id: Option<&str>,
    ) -> Result<&ChatSession, ApiError> {
        let session = self
            .client
            .create_session(title.unwrap_or(DEFAULT_SESSION_TITLE), document_id)
            .await?;
        info!("Created session {} ({})", session.id, session.title);

        self.current = Some(session.id.clone());
        self.transcript.clear();
        self.sessions.insert(0, session);
        Ok(&self.sessions[0])
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ApiError> {
        self.client.delete_session(id).await?;
        self.sessions.retain(|s| s.id != id);
        if self.current.as_deref() == Some(id) {
            self.current = None;
            self.transcript.clear();
        }
        info!("Deleted session {}", id);
        Ok(())
    }

    /// Open a session and load its messages. A failed load leaves an empty
    /// transcript rather than an error.
    pub async fn select(&mut self, id: &str) {
        self.current = Some(id.to_string());
        self.transcript = match self.client.session_messages(id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to load messages for session {}: {}", id, e);
                Vec::new()
            }
        };
    }

    /// Send to the open session, falling back to document chat if the
    /// session endpoint fails.
    pub async fn send(
        &mut self,
        message: &str,
        document_id: Option<String>,
        search_documents: bool,
    ) -> Result<SendOutcome, ApiError> {
        let session_id = self
            .current
            .clone()
            .ok_or_else(|| ApiError::InvalidInput("No chat session selected".into()))?;
        let request = SendRequest::new(session_id, message)?
            .with_document(document_id)
            .search_documents(search_documents);

        let outcome = exchange::exchange(&self.client, &mut self.transcript, &request).await;

        if matches!(outcome, SendOutcome::Success(_)) {
            if let Err(e) = self.refresh().await {
                warn!("Failed to refresh sessions after send: {}", e);
            }
        }
        Ok(outcome)
    }
}
