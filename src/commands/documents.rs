use super::Context;
use crate::api::documents::PageRequest;
use crate::models::Document;
use anyhow::{Context as _, Result};
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum DocsCommand {
    /// List uploaded documents
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },
    /// Show a document's details
    Get { id: String },
    /// Show a document with sample pages
    Show {
        id: String,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Upload a PDF
    Upload {
        path: PathBuf,
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete a document
    Delete { id: String },
    /// Print an authenticated download link
    Url { id: String },
}

fn print_document(d: &Document) {
    let state = if d.is_processed { "ready" } else { "processing" };
    println!(
        "{}  {}  ({} pages, {}, uploaded {})",
        d.id,
        d.title,
        d.total_pages,
        state,
        d.upload_date.format("%Y-%m-%d")
    );
    if !d.topics.is_empty() {
        println!("    topics: {}", d.topics.join(", "));
    }
}

pub async fn run(ctx: &Context, cmd: DocsCommand) -> Result<()> {
    match cmd {
        DocsCommand::List { page, page_size } => {
            let page = page.map(|page| PageRequest { page, page_size });
            let listing = ctx.client.list_documents(page).await?;
            ctx.emit(&listing.documents, |docs| {
                if docs.is_empty() {
                    println!("No documents uploaded yet.");
                }
                docs.iter().for_each(print_document);
            })?;
            if !ctx.json {
                if let Some(count) = listing.count {
                    println!("{} document(s) total", count);
                }
                if listing.next.is_some() {
                    println!("More available, use --page to continue.");
                }
            }
            Ok(())
        }
        DocsCommand::Get { id } => {
            let doc = ctx.client.get_document(&id).await?;
            ctx.emit(&doc, print_document)
        }
        DocsCommand::Show { id, page } => {
            let summary = ctx.client.document_summary(&id, page).await?;
            ctx.emit(&summary, |s| {
                print_document(&s.document);
                for p in &s.sample_pages {
                    println!("  p.{}: {}", p.page_number, p.content_preview.as_deref().unwrap_or(""));
                }
            })
        }
        DocsCommand::Upload { path, title } => {
            let doc = ctx
                .client
                .upload_document(&path, title.as_deref())
                .await
                .with_context(|| format!("Failed to upload {}", path.display()))?;
            ctx.emit(&doc, print_document)
        }
        DocsCommand::Delete { id } => {
            ctx.client.delete_document(&id).await?;
            println!("Deleted document {}", id);
            Ok(())
        }
        DocsCommand::Url { id } => {
            let url = ctx
                .client
                .document_file_url(&id)
                .context("Not logged in")?;
            println!("{}", url);
            Ok(())
        }
    }
}
