use super::{ApiClient, ApiError};
use crate::models::{DocumentAnalytics, ProgressPoint, StudyInsights, StudySessionRecord};
use serde::Deserialize;

#[derive(Deserialize)]
struct ProgressBody {
    progress: Vec<ProgressPoint>,
}

#[derive(Deserialize)]
struct SessionsBody {
    sessions: Vec<StudySessionRecord>,
}

#[derive(Deserialize)]
struct Recorded {
    session_id: serde_json::Value,
}

impl ApiClient {
    pub async fn insights(&self) -> Result<StudyInsights, ApiError> {
        self.send(self.get("/analytics/insights/")).await
    }

    pub async fn progress(&self, days: Option<u32>) -> Result<Vec<ProgressPoint>, ApiError> {
        let mut req = self.get("/analytics/progress/");
        if let Some(d) = days {
            req = req.query(&[("days", d)]);
        }
        let body: ProgressBody = self.send(req).await?;
        Ok(body.progress)
    }

    pub async fn study_sessions(&self) -> Result<Vec<StudySessionRecord>, ApiError> {
        let body: SessionsBody = self.send(self.get("/analytics/sessions/")).await?;
        Ok(body.sessions)
    }

    /// Parameters travel in the query string, not the body.
    pub async fn record_study_session(
        &self,
        duration_minutes: u32,
        pages_viewed: u32,
        document_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let mut params = vec![
            ("duration", duration_minutes.to_string()),
            ("pages_viewed", pages_viewed.to_string()),
        ];
        if let Some(id) = document_id {
            params.push(("document_id", id.to_string()));
        }
        let resp: Recorded = self
            .send(self.post("/analytics/sessions/").query(&params))
            .await?;
        Ok(match resp.session_id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    }

    pub async fn document_analytics(&self, document_id: &str) -> Result<DocumentAnalytics, ApiError> {
        self.send(self.get(&format!("/analytics/documents/{}/", document_id)))
            .await
    }
}
