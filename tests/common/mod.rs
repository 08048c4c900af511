#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use mentora_client::{ApiClient, ClientConfig, CredentialStore, MemoryCredentials};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const GOOD_TOKEN: &str = "good-token";
const STAMP: &str = "2024-05-01T10:00:00";

/// In-memory stand-in for the study assistant backend.
#[derive(Default)]
pub struct Backend {
    pub sessions: Vec<Value>,
    pub messages: HashMap<String, Vec<Value>>,
    pub documents: Vec<Value>,
    pub fail_session_send: bool,
    pub fail_rag: bool,
    pub fail_session_list: bool,
    pub send_calls: usize,
    pub rag_calls: Vec<Value>,
    pub upload_calls: Vec<(String, String)>,
    /// Path and JSON body of each account request that carries one.
    pub account_calls: Vec<(String, Value)>,
    pub avatar_uploads: Vec<(String, String)>,
    next_id: u64,
}

pub type Shared = Arc<Mutex<Backend>>;

impl Backend {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_session(&mut self, title: &str) -> String {
        let id = self.next_id();
        self.sessions.insert(
            0,
            json!({
                "id": id,
                "title": title,
                "document_id": null,
                "created_at": STAMP,
                "updated_at": STAMP,
                "last_message": null
            }),
        );
        self.messages.insert(id.to_string(), Vec::new());
        id.to_string()
    }

    pub fn add_message(&mut self, session_id: &str, kind: &str, content: &str) -> Value {
        let id = self.next_id();
        let msg = json!({"id": id, "type": kind, "content": content, "timestamp": STAMP});
        self.messages
            .entry(session_id.to_string())
            .or_default()
            .push(msg.clone());
        msg
    }

    pub fn add_document(&mut self, id: &str, title: &str) -> Value {
        let doc = json!({
            "id": id,
            "title": title,
            "total_pages": 3,
            "topics": ["physics"],
            "upload_date": STAMP,
            "is_processed": true
        });
        self.documents.push(doc.clone());
        doc
    }
}

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {}", GOOD_TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(h) if h == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

type Reply = Result<(StatusCode, Json<Value>), StatusCode>;

fn ok(body: Value) -> Reply {
    Ok((StatusCode::OK, Json(body)))
}

async fn list_sessions(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let b = s.lock().unwrap();
    if b.fail_session_list {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    ok(json!({ "sessions": b.sessions }))
}

async fn create_session(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    authorize(&headers)?;
    let mut b = s.lock().unwrap();
    let title = body["title"].as_str().unwrap_or("New Chat").to_string();
    let id = b.add_session(&title);
    b.sessions[0]["document_id"] = body["document_id"].clone();
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "session_id": id.parse::<u64>().unwrap(),
            "title": title,
            "document_id": body["document_id"]
        })),
    ))
}

async fn delete_session(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    authorize(&headers)?;
    let mut b = s.lock().unwrap();
    let before = b.sessions.len();
    b.sessions.retain(|v| v["id"].to_string() != id);
    if b.sessions.len() == before {
        return Ok((StatusCode::NOT_FOUND, Json(json!({"detail": "Session not found"}))));
    }
    b.messages.remove(&id);
    ok(json!({"message": "Session deleted successfully"}))
}

async fn list_messages(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    authorize(&headers)?;
    let b = s.lock().unwrap();
    match b.messages.get(&id) {
        Some(messages) => ok(json!({ "messages": messages })),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({"detail": "Session not found"})))),
    }
}

async fn send_message(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&headers)?;
    let mut b = s.lock().unwrap();
    b.send_calls += 1;
    if b.fail_session_send {
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "AI service error: quota exceeded"})),
        ));
    }
    let content = body["content"].as_str().unwrap_or_default().to_string();
    let user = b.add_message(&id, "user", &content);
    let ai = b.add_message(&id, "ai", &format!("Answer to: {}", content));
    for session in b.sessions.iter_mut() {
        if session["id"].to_string() == id {
            session["last_message"] = json!(content);
        }
    }
    ok(json!({ "user_message": user, "ai_response": ai }))
}

async fn rag_chat(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    authorize(&headers)?;
    let mut b = s.lock().unwrap();
    b.rag_calls.push(body.clone());
    if b.fail_rag {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    ok(json!({
        "response": format!("From your notes: {}", body["query"].as_str().unwrap_or_default()),
        "sources": [{"document_id": "d1", "document_title": "Thermodynamics", "page_number": 2}]
    }))
}

async fn list_documents(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Reply {
    authorize(&headers)?;
    let b = s.lock().unwrap();
    match (q.get("page"), q.get("page_size")) {
        (Some(page), Some(size)) => {
            let page: usize = page.parse().unwrap_or(1);
            let size: usize = size.parse().unwrap_or(10);
            let start = (page - 1) * size;
            let slice: Vec<Value> = b.documents.iter().skip(start).take(size).cloned().collect();
            let next = (start + size < b.documents.len())
                .then(|| format!("/api/reader/documents/?page={}&page_size={}", page + 1, size));
            ok(json!({
                "results": slice,
                "count": b.documents.len(),
                "next": next,
                "previous": null
            }))
        }
        _ => ok(json!({ "documents": b.documents, "count": b.documents.len() })),
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<(Option<String>, Option<String>, usize), StatusCode> {
    let mut file_name = None;
    let mut title = None;
    let mut size = 0;
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            file_name = field.file_name().map(str::to_string);
            size = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?.len();
        } else if name == "title" {
            title = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
        }
    }
    Ok((file_name, title, size))
}

fn store_upload(s: &Shared, route: &str, title: String, size: usize) -> Reply {
    let mut b = s.lock().unwrap();
    let id = format!("doc-{}", b.next_id());
    let doc = b.add_document(&id, &title);
    b.documents.last_mut().unwrap()["file_size"] = json!(size);
    b.upload_calls.push((route.to_string(), title));
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Document uploaded successfully", "document": doc})),
    ))
}

async fn upload_with_query(
    State(s): State<Shared>,
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    authorize(&headers)?;
    let (file_name, _, size) = read_upload(multipart).await?;
    let title = q.get("title").cloned().or(file_name).unwrap_or_default();
    store_upload(&s, "query", title, size)
}

async fn upload_with_form(State(s): State<Shared>, headers: HeaderMap, multipart: Multipart) -> Reply {
    authorize(&headers)?;
    let (file_name, title, size) = read_upload(multipart).await?;
    let title = title.or(file_name).unwrap_or_default();
    store_upload(&s, "form", title, size)
}

async fn delete_document(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    authorize(&headers)?;
    let mut b = s.lock().unwrap();
    b.documents.retain(|d| d["id"] != id.as_str());
    ok(json!({"message": "Document deleted successfully"}))
}

fn find_document(b: &Backend, id: &str) -> Option<Value> {
    b.documents.iter().find(|d| d["id"] == id).cloned()
}

fn not_found(what: &str) -> Reply {
    Ok((StatusCode::NOT_FOUND, Json(json!({ "detail": format!("{} not found", what) }))))
}

async fn get_document(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    authorize(&headers)?;
    let b = s.lock().unwrap();
    match find_document(&b, &id) {
        Some(doc) => ok(doc),
        None => not_found("Document"),
    }
}

async fn document_summary(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    authorize(&headers)?;
    let b = s.lock().unwrap();
    let Some(mut doc) = find_document(&b, &id) else {
        return not_found("Document");
    };
    doc["sample_pages"] = json!([
        {"page_number": 1, "content_preview": "Heat flows from hot to cold..."},
        {"page_number": 2, "content_preview": "Entropy never decreases..."}
    ]);
    ok(doc)
}

async fn document_analytics(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    authorize(&headers)?;
    let b = s.lock().unwrap();
    let Some(doc) = find_document(&b, &id) else {
        return not_found("Document");
    };
    ok(json!({
        "document_id": id,
        "document_title": doc["title"],
        "total_study_time": 90,
        "total_sessions": 4,
        "total_pages_viewed": 31,
        "average_session_time": 22
    }))
}

async fn explain(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    authorize(&headers)?;
    let turns = body["chat_history"].as_array().map(|h| h.len()).unwrap_or(0);
    ok(json!({
        "explanation": format!("{} explained with {} turns", body["concept"].as_str().unwrap_or_default(), turns)
    }))
}

async fn insights(headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    ok(json!({
        "total_study_time": 240,
        "total_documents": 2,
        "total_chats": 14,
        "current_streak": 3,
        "last_study_date": "2024-05-01",
        "week_study_time": 90,
        "recent_sessions_count": 4
    }))
}

async fn progress(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Reply {
    authorize(&headers)?;
    let days: usize = q.get("days").and_then(|d| d.parse().ok()).unwrap_or(30);
    let points: Vec<Value> = (1..=days.min(3))
        .map(|d| json!({"date": format!("2024-05-0{}", d), "duration_minutes": 30, "documents_count": 1}))
        .collect();
    ok(json!({ "progress": points }))
}

async fn record_session(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Reply {
    authorize(&headers)?;
    if q.get("duration").is_none() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Session recorded successfully", "session_id": 77})),
    ))
}

async fn study_sessions(headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    ok(json!({
        "sessions": [{
            "id": 77,
            "document_id": null,
            "duration_minutes": 45,
            "pages_viewed": 12,
            "date": "2024-05-01",
            "start_time": "2024-05-01T09:00:00"
        }]
    }))
}

fn user_json() -> Value {
    json!({"id": 1, "username": "ada", "email": "ada@example.com", "created_at": STAMP})
}

async fn register(State(s): State<Shared>, Json(body): Json<Value>) -> Reply {
    s.lock().unwrap().account_calls.push(("register".into(), body.clone()));
    if body["username"] == "ada" {
        return Ok((StatusCode::BAD_REQUEST, Json(json!({"detail": "Username already exists"}))));
    }
    let user = json!({
        "id": 2,
        "username": body["username"],
        "email": body["email"],
        "first_name": body["first_name"],
        "last_name": body["last_name"],
        "created_at": STAMP
    });
    Ok((
        StatusCode::CREATED,
        Json(json!({"access_token": GOOD_TOKEN, "token_type": "bearer", "user": user})),
    ))
}

async fn update_profile(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    authorize(&headers)?;
    s.lock().unwrap().account_calls.push(("profile".into(), body.clone()));
    let mut user = user_json();
    for key in ["email", "first_name", "last_name", "bio", "phone"] {
        if let Some(v) = body.get(key) {
            user[key] = v.clone();
        }
    }
    ok(json!({"message": "Profile updated successfully", "user": user}))
}

async fn upload_avatar(State(s): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Reply {
    authorize(&headers)?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let mime = field.content_type().unwrap_or_default().to_string();
            field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            upload = Some((name, mime));
        }
    }
    let Some((name, mime)) = upload else {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    };
    if !["image/jpeg", "image/png", "image/webp"].contains(&mime.as_str()) {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Only image files (JPEG, PNG, WebP) are allowed"})),
        ));
    }
    let ext = name.rsplit('.').next().unwrap_or_default().to_string();
    s.lock().unwrap().avatar_uploads.push((name, mime));
    let mut user = user_json();
    user["avatar"] = json!(format!("avatars/user_1.{}", ext));
    ok(json!({
        "message": "Avatar uploaded successfully",
        "avatar_url": format!("/media/avatars/user_1.{}", ext),
        "user": user
    }))
}

pub const RESET_CODE: &str = "482913";

async fn reset_request(State(s): State<Shared>, Json(body): Json<Value>) -> Reply {
    s.lock().unwrap().account_calls.push(("reset/request".into(), body.clone()));
    ok(json!({
        "message": "If the email exists, a reset code has been sent",
        "email": body["email"],
        "dev_code": RESET_CODE
    }))
}

fn check_code(body: &Value) -> Result<(), Reply> {
    if body["code"] == RESET_CODE {
        Ok(())
    } else {
        Err(Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Invalid or expired reset code"})),
        )))
    }
}

async fn reset_verify(State(s): State<Shared>, Json(body): Json<Value>) -> Reply {
    s.lock().unwrap().account_calls.push(("reset/verify".into(), body.clone()));
    if let Err(reply) = check_code(&body) {
        return reply;
    }
    ok(json!({"message": "Code verified successfully", "email": body["email"]}))
}

async fn reset_complete(State(s): State<Shared>, Json(body): Json<Value>) -> Reply {
    s.lock().unwrap().account_calls.push(("reset/complete".into(), body.clone()));
    if let Err(reply) = check_code(&body) {
        return reply;
    }
    ok(json!({"message": "Password reset successfully"}))
}

async fn login(Json(body): Json<Value>) -> Reply {
    if body["password"] == "secret" {
        ok(json!({"access_token": GOOD_TOKEN, "token_type": "bearer", "user": user_json()}))
    } else {
        Ok((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid credentials"}))))
    }
}

async fn logout(headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    ok(json!({"message": "Successfully logged out"}))
}

async fn profile(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let b = s.lock().unwrap();
    ok(json!({
        "user": user_json(),
        "statistics": {
            "total_documents": b.documents.len(),
            "total_chat_sessions": b.sessions.len(),
            "total_pages": b.documents.len() * 3
        }
    }))
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    authorize(&headers)?;
    if body["old_password"] != "secret" {
        return Ok((StatusCode::BAD_REQUEST, Json(json!({"detail": "Incorrect password"}))));
    }
    ok(json!({"message": "Password changed successfully", "token": GOOD_TOKEN}))
}

pub fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/chat/sessions/", get(list_sessions).post(create_session))
        .route("/chat/sessions/:id/", delete(delete_session))
        .route("/chat/sessions/:id/messages/", get(list_messages).post(send_message))
        .route("/reader/chat/", post(rag_chat))
        .route("/reader/documents/", get(list_documents))
        .route("/reader/documents/upload", post(upload_with_query))
        .route("/reader/upload/", post(upload_with_form))
        .route("/reader/documents/:id", get(get_document).delete(delete_document))
        .route("/reader/documents/:id/summary/", get(document_summary))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/profile", get(profile).put(update_profile))
        .route("/auth/upload-avatar", post(upload_avatar))
        .route("/auth/password-reset/request", post(reset_request))
        .route("/auth/password-reset/verify", post(reset_verify))
        .route("/auth/password-reset/complete", post(reset_complete))
        .route("/analytics/documents/:id/", get(document_analytics))
        .route("/auth/change-password", post(change_password))
        .route("/chat/explain/", post(explain))
        .route("/analytics/insights/", get(insights))
        .route("/analytics/progress/", get(progress))
        .route("/analytics/sessions/", get(study_sessions).post(record_session));
    Router::new().nest("/api", api).with_state(state)
}

/// Serve the fake backend on an ephemeral port and return its API base URL.
pub async fn spawn(state: Shared) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = router(state);
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    format!("http://{}/api", addr)
}

pub fn client(base_url: &str, credentials: Arc<dyn CredentialStore>) -> ApiClient {
    ApiClient::new(&ClientConfig::new(base_url), credentials).expect("build client")
}

pub async fn start() -> (Shared, ApiClient) {
    let state: Shared = Arc::new(Mutex::new(Backend::default()));
    let base = spawn(state.clone()).await;
    let client = client(&base, Arc::new(MemoryCredentials::with_token(GOOD_TOKEN)));
    (state, client)
}
