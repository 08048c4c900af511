use super::Context;
use crate::api::ApiError;
use crate::chat::{recent_history, SendOutcome, SessionStore, HISTORY_WINDOW};
use crate::models::{ChatMessage, ChatSession, MessageType};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use tracing::warn;

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    /// List chat sessions, newest first
    List,
    /// Start a new session
    New {
        #[arg(long)]
        title: Option<String>,
        /// Tie the session to a document
        #[arg(long)]
        document: Option<String>,
    },
    /// Delete a session and its messages
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ChatCommand {
    /// Print a session's transcript
    History { session: String },
    /// Send a message to a session
    Send {
        session: String,
        message: String,
        #[arg(long)]
        document: Option<String>,
        /// Let the server search all documents for context
        #[arg(long)]
        search: bool,
    },
}

#[derive(Args, Debug)]
pub struct ExplainArgs {
    pub concept: String,
    #[arg(long)]
    pub document: Option<String>,
    /// Use this session's recent messages as context
    #[arg(long)]
    pub session: Option<String>,
}

fn print_session(s: &ChatSession) {
    let doc = s
        .document_title
        .as_deref()
        .or(s.document_id.as_deref())
        .map(|d| format!(" [{}]", d))
        .unwrap_or_default();
    println!("{:>6}  {}{}  ({})", s.id, s.title, doc, s.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(last) = &s.last_message {
        println!("        └ {}", last);
    }
}

fn print_message(m: &ChatMessage) {
    let who = match m.kind {
        MessageType::User => "you",
        MessageType::Ai => "ai",
        MessageType::System => "system",
    };
    println!("[{}] {}: {}", m.timestamp.format("%H:%M"), who, m.content);
    for source in &m.sources {
        if let (Some(title), Some(page)) = (&source.document_title, source.page_number) {
            println!("        ↳ {} p.{}", title, page);
        }
    }
}

pub async fn sessions(ctx: &Context, cmd: SessionsCommand) -> Result<()> {
    let mut store = SessionStore::new(ctx.client.clone());
    match cmd {
        SessionsCommand::List => {
            store.refresh().await?;
            ctx.emit(&store.sessions(), |sessions| {
                if sessions.is_empty() {
                    println!("No chat sessions yet.");
                }
                sessions.iter().for_each(print_session);
            })
        }
        SessionsCommand::New { title, document } => {
            let session = store.create(title.as_deref(), document.as_deref()).await?;
            ctx.emit(session, print_session)
        }
        SessionsCommand::Delete { id } => {
            store.delete(&id).await?;
            println!("Deleted session {}", id);
            Ok(())
        }
    }
}

pub async fn chat(ctx: &Context, cmd: ChatCommand) -> Result<()> {
    let mut store = SessionStore::new(ctx.client.clone());
    match cmd {
        ChatCommand::History { session } => {
            store.select(&session).await;
            ctx.emit(&store.transcript(), |messages| {
                messages.iter().for_each(print_message);
            })
        }
        ChatCommand::Send {
            session,
            message,
            document,
            search,
        } => {
            // Only needed to pick up the session's document.
            if let Err(e) = store.refresh().await {
                warn!("Failed to load sessions, sending without the session's document: {}", e);
            }
            store.select(&session).await;
            let document = document.or_else(|| store.current().and_then(|s| s.document_id.clone()));

            match store.send(&message, document, search).await? {
                SendOutcome::Success(reply) => ctx.emit(&reply, print_message),
                SendOutcome::FallbackSuccess(reply) => {
                    eprintln!("(answered from your documents; the session endpoint was unavailable)");
                    ctx.emit(&reply, print_message)
                }
                SendOutcome::Failure { primary, fallback } => {
                    // The transcript ends with the local error reply.
                    if let Some(reply) = store.transcript().last() {
                        ctx.emit(reply, print_message)?;
                    }
                    if matches!(primary, ApiError::Unauthorized) || matches!(fallback, ApiError::Unauthorized) {
                        return Err(ApiError::Unauthorized.into());
                    }
                    Err(anyhow!(
                        "message not answered: session endpoint: {}; fallback: {}",
                        primary,
                        fallback
                    ))
                }
            }
        }
    }
}

pub async fn explain(ctx: &Context, args: ExplainArgs) -> Result<()> {
    let history = match &args.session {
        Some(id) => {
            let mut store = SessionStore::new(ctx.client.clone());
            store.select(id).await;
            Some(recent_history(store.transcript(), HISTORY_WINDOW))
        }
        None => None,
    };
    let explanation = ctx
        .client
        .explain_concept(&args.concept, args.document.as_deref(), history.as_deref())
        .await?;
    ctx.emit(&explanation, |text| println!("{}", text))
}
