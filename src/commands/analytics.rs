use super::Context;
use crate::models::{ProgressPoint, StudyInsights, StudySessionRecord};
use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum StatsCommand {
    /// Totals, streak and recent progress
    Overview {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Study time spent on one document
    Document { id: String },
    /// Log a finished study session
    Record {
        /// Minutes studied
        duration: u32,
        #[arg(long, default_value_t = 0)]
        pages: u32,
        #[arg(long)]
        document: Option<String>,
    },
}

#[derive(Serialize)]
struct Overview {
    insights: StudyInsights,
    progress: Vec<ProgressPoint>,
    sessions: Vec<StudySessionRecord>,
}

fn print_overview(o: &Overview) {
    let i = &o.insights;
    println!(
        "{} min studied ({} this week), {} documents, {} chat messages",
        i.total_study_time, i.week_study_time, i.total_documents, i.total_chats
    );
    println!("Current streak: {} day(s)", i.current_streak);
    for p in &o.progress {
        println!("  {}  {:>4} min  {} doc(s)", p.date, p.duration_minutes, p.documents_count);
    }
    println!("{} recorded session(s)", o.sessions.len());
}

pub async fn run(ctx: &Context, cmd: StatsCommand) -> Result<()> {
    match cmd {
        StatsCommand::Overview { days } => {
            let client = &ctx.client;
            let (insights, progress, sessions) = futures::try_join!(
                client.insights(),
                client.progress(Some(days)),
                client.study_sessions()
            )?;
            ctx.emit(
                &Overview {
                    insights,
                    progress,
                    sessions,
                },
                print_overview,
            )
        }
        StatsCommand::Document { id } => {
            let stats = ctx.client.document_analytics(&id).await?;
            ctx.emit(&stats, |s| {
                println!(
                    "{}: {} min over {} session(s), avg {} min, {} pages viewed",
                    s.document_title.as_deref().unwrap_or(&s.document_id),
                    s.total_study_time,
                    s.total_sessions,
                    s.average_session_time,
                    s.total_pages_viewed
                );
            })
        }
        StatsCommand::Record {
            duration,
            pages,
            document,
        } => {
            let id = ctx
                .client
                .record_study_session(duration, pages, document.as_deref())
                .await?;
            println!("Recorded study session {}", id);
            Ok(())
        }
    }
}
