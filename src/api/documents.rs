use super::{ApiClient, ApiError};
use crate::config::UploadStyle;
use crate::models::{Document, DocumentSummary};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

/// One page of the document directory. Unpaginated backends fill in
/// `documents` and leave the cursors empty.
#[derive(Debug, Clone, Default)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub count: Option<usize>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentListBody {
    Bare(Vec<Document>),
    Envelope {
        #[serde(alias = "results")]
        documents: Vec<Document>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
    },
}

impl From<DocumentListBody> for DocumentPage {
    fn from(body: DocumentListBody) -> Self {
        match body {
            DocumentListBody::Bare(documents) => DocumentPage {
                count: Some(documents.len()),
                documents,
                ..Default::default()
            },
            DocumentListBody::Envelope {
                documents,
                count,
                next,
                previous,
            } => DocumentPage {
                documents,
                count,
                next,
                previous,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UploadBody {
    Wrapped { document: Document },
    Bare(Document),
}

/// Only PDFs are accepted by the backend, so reject anything else up front.
pub fn validate_upload_path(path: &Path) -> Result<String, ApiError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ApiError::InvalidInput(format!("Not a file: {}", path.display())))?;
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(ApiError::InvalidInput(format!(
            "Only PDF files are allowed: {}",
            filename
        )));
    }
    Ok(filename.to_string())
}

impl ApiClient {
    pub async fn list_documents(&self, page: Option<PageRequest>) -> Result<DocumentPage, ApiError> {
        let mut req = self.get("/reader/documents/");
        if let Some(p) = page {
            req = req.query(&[("page", p.page), ("page_size", p.page_size)]);
        }
        let body: DocumentListBody = self.send(req).await?;
        Ok(body.into())
    }

    /// Every document the user owns, unpaginated.
    pub async fn all_documents(&self) -> Result<Vec<Document>, ApiError> {
        Ok(self.list_documents(None).await?.documents)
    }

    pub async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        self.send(self.get(&format!("/reader/documents/{}", id))).await
    }

    pub async fn upload_document(&self, path: &Path, title: Option<&str>) -> Result<Document, ApiError> {
        let filename = validate_upload_path(path)?;
        let bytes = tokio::fs::read(path).await?;
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(filename.clone())
            .mime_str("application/pdf")?;
        let mut form = Form::new().part("file", part);

        let req = match self.upload_style {
            UploadStyle::QueryTitle => {
                let req = self.post("/reader/documents/upload");
                match title {
                    Some(t) => req.query(&[("title", t)]),
                    None => req,
                }
            }
            UploadStyle::FormTitle => {
                form = form.text("title", title.unwrap_or(&filename).to_string());
                self.post("/reader/upload/")
            }
        };

        info!("Uploading {} ({} bytes, {})", filename, size, self.upload_style);
        let body: UploadBody = self.send(req.multipart(form)).await?;
        Ok(match body {
            UploadBody::Wrapped { document } | UploadBody::Bare(document) => document,
        })
    }

    pub async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        self.send_empty(self.delete(&format!("/reader/documents/{}", id))).await
    }

    pub async fn document_summary(&self, id: &str, page: Option<u32>) -> Result<DocumentSummary, ApiError> {
        let mut req = self.get(&format!("/reader/documents/{}/summary/", id));
        if let Some(p) = page {
            req = req.query(&[("page", p)]);
        }
        self.send(req).await
    }

    /// Direct download link; the backend takes the token as a query parameter here.
    pub fn document_file_url(&self, id: &str) -> Option<String> {
        let token = self.credentials.token()?;
        let mut url = reqwest::Url::parse(&self.url(&format!("/reader/documents/{}/file", id))).ok()?;
        url.query_pairs_mut().append_pair("token", &token);
        Some(url.to_string())
    }
}
