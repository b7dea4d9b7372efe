//! Contract tests for `HttpChatClient` against an in-process fake backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use mindful_engine::{
    ChatBackend, ChatError, ClientConfig, ConversationController, ConversationId, FeedbackModal,
    FeedbackRecord, HttpChatClient, LocalStore, NotificationKind, Sender, TurnOutcome,
};

#[derive(Default)]
struct FakeState {
    chat_status: Option<(StatusCode, String)>,
    history_status: Option<StatusCode>,
    feedback_status: Option<StatusCode>,
    reply_id: Option<Value>,
    chat_bodies: Vec<Value>,
    feedback_bodies: Vec<Value>,
    history_queries: Vec<HashMap<String, String>>,
    history_cookies: Vec<Option<String>>,
}

#[derive(Clone, Default)]
struct Fake(Arc<Mutex<FakeState>>);

impl Fake {
    fn with(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.0.lock().unwrap());
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.0.lock().unwrap()
    }
}

async fn chat(State(fake): State<Fake>, Json(body): Json<Value>) -> Response {
    let mut state = fake.state();
    state.chat_bodies.push(body.clone());

    if let Some((status, raw)) = state.chat_status.clone() {
        return (status, raw).into_response();
    }

    let id = state.reply_id.clone().unwrap_or(json!(1));
    let reply = json!({
        "success": true,
        "data": {
            "response": format!("echo: {}", body["message"].as_str().unwrap_or_default()),
            "conversation_id": id,
            "intent": "general",
            "is_crisis": false
        }
    });
    (
        [(header::SET_COOKIE, "session=s3cr3t; Path=/; HttpOnly")],
        Json(reply),
    )
        .into_response()
}

async fn history(
    State(fake): State<Fake>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = fake.state();
    state.history_queries.push(query);
    state.history_cookies.push(
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    if let Some(status) = state.history_status {
        return (status, Json(json!({"error": "Failed to fetch history"}))).into_response();
    }

    Json(json!({
        "success": true,
        "data": [
            {"id": 2, "message": "second", "response": "reply 2", "intent": "sleep", "is_crisis": false, "created_at": "2024-05-01T08:31:00"},
            {"id": 1, "message": "first", "response": "reply 1", "intent": "stress", "is_crisis": false, "created_at": "2024-05-01T08:30:00"}
        ]
    }))
    .into_response()
}

async fn feedback(State(fake): State<Fake>, Json(body): Json<Value>) -> Response {
    let mut state = fake.state();
    state.feedback_bodies.push(body);

    if let Some(status) = state.feedback_status {
        return (status, Json(json!({"error": "Conversation not found"}))).into_response();
    }
    Json(json!({"success": true, "message": "Thank you for your feedback!"})).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "Mindful Chatbox API"}))
}

async fn spawn_backend(fake: Fake) -> String {
    let app = Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/history", get(history))
        .route("/api/feedback", post(feedback))
        .route("/api/health", get(health))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn client_for(url: &str) -> HttpChatClient {
    let config = ClientConfig {
        api_base_url: url.to_string(),
        request_timeout_secs: 5,
        ..ClientConfig::default()
    };
    HttpChatClient::new(&config).unwrap()
}

async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

#[tokio::test]
async fn send_message_returns_reply_and_keeps_session_cookie() {
    let fake = Fake::default();
    let url = spawn_backend(fake.clone()).await;
    let client = client_for(&url);

    let reply = client.send_message("Xin chào").await.unwrap();
    assert_eq!(reply.response, "echo: Xin chào");
    assert_eq!(reply.conversation_id, ConversationId::Numeric(1));
    assert_eq!(reply.intent.as_deref(), Some("general"));
    assert_eq!(fake.state().chat_bodies, vec![json!({"message": "Xin chào"})]);

    assert_eq!(client.session_cookie().as_deref(), Some("session=s3cr3t"));

    client.get_history(5).await;
    assert_eq!(
        fake.state().history_cookies,
        vec![Some("session=s3cr3t".to_string())]
    );
}

#[tokio::test]
async fn send_message_surfaces_backend_error_field() {
    let fake = Fake::default().with(|s| {
        s.chat_status = Some((
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": "Rate limit exceeded. Please try again later."}).to_string(),
        ));
    });
    let client = client_for(&spawn_backend(fake).await);

    let err = client.send_message("hi").await.unwrap_err();
    assert_eq!(
        err,
        ChatError::RequestFailed("Rate limit exceeded. Please try again later.".into())
    );
}

#[tokio::test]
async fn send_message_falls_back_to_generic_reason() {
    let fake = Fake::default().with(|s| {
        s.chat_status = Some((StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>".into()));
    });
    let client = client_for(&spawn_backend(fake).await);

    let err = client.send_message("hi").await.unwrap_err();
    assert_eq!(err, ChatError::RequestFailed("Failed to send message".into()));
}

#[tokio::test]
async fn send_message_transport_failure_is_request_failed() {
    let client = client_for(&unreachable_url().await);
    let err = client.send_message("hi").await.unwrap_err();
    assert!(matches!(err, ChatError::RequestFailed(_)));
}

#[tokio::test]
async fn history_is_passed_through_newest_first() {
    let fake = Fake::default();
    let client = client_for(&spawn_backend(fake.clone()).await);

    let entries = client.get_history(20).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, ConversationId::Numeric(2));
    assert_eq!(entries[1].message, "first");
    assert_eq!(
        fake.state().history_queries[0].get("limit").map(String::as_str),
        Some("20")
    );
}

#[tokio::test]
async fn history_failures_degrade_to_empty() {
    let fake = Fake::default().with(|s| s.history_status = Some(StatusCode::INTERNAL_SERVER_ERROR));
    let client = client_for(&spawn_backend(fake).await);
    assert!(client.get_history(20).await.is_empty());

    let offline = client_for(&unreachable_url().await);
    assert!(offline.get_history(20).await.is_empty());
}

#[tokio::test]
async fn feedback_posts_record_and_reports_rejection() {
    let fake = Fake::default();
    let client = client_for(&spawn_backend(fake.clone()).await);

    let record = FeedbackRecord {
        conversation_id: ConversationId::Numeric(4),
        helpful: false,
        comment: "chưa rõ".into(),
    };
    let ack = client.send_feedback(&record).await.unwrap();
    assert!(ack.success);
    assert_eq!(
        fake.state().feedback_bodies,
        vec![json!({"conversation_id": 4, "helpful": false, "comment": "chưa rõ"})]
    );

    let rejecting = Fake::default().with(|s| s.feedback_status = Some(StatusCode::NOT_FOUND));
    let client = client_for(&spawn_backend(rejecting).await);
    let err = client.send_feedback(&record).await.unwrap_err();
    assert_eq!(err, ChatError::RequestFailed("Conversation not found".into()));
}

#[tokio::test]
async fn health_reports_service() {
    let client = client_for(&spawn_backend(Fake::default()).await);
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service.as_deref(), Some("Mindful Chatbox API"));
}

#[tokio::test]
async fn session_cookie_persists_through_local_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let url = spawn_backend(Fake::default()).await;

    {
        let client = client_for(&url);
        client.send_message("hello").await.unwrap();
        let mut store = LocalStore::open(dir.path()).unwrap();
        client.save_session(&mut store, "mindful-session").unwrap();
    }

    let store = LocalStore::open(dir.path()).unwrap();
    let client = client_for(&url);
    assert!(client.session_cookie().is_none());
    client.load_session(&store, "mindful-session");
    assert_eq!(client.session_cookie().as_deref(), Some("session=s3cr3t"));
}

#[tokio::test]
async fn hello_then_feedback_scenario() {
    let fake = Fake::default().with(|s| s.reply_id = Some(json!("c1")));
    let url = spawn_backend(fake.clone()).await;
    let client = Arc::new(client_for(&url));
    let config = ClientConfig {
        api_base_url: url,
        ..ClientConfig::default()
    };
    let mut controller = ConversationController::new(Arc::clone(&client), &config);

    let outcome = controller.send("Hello").await;
    assert!(matches!(outcome, TurnOutcome::Replied(_)));

    let transcript = controller.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].sender, Sender::User);
    assert_eq!(transcript[0].text, "Hello");
    assert_eq!(transcript[1].sender, Sender::Bot);
    assert_eq!(transcript[1].conversation_id, Some(ConversationId::from("c1")));

    let active = controller.session().conversation_id().cloned().unwrap();
    let mut modal = FeedbackModal::new();
    modal.open_for(active);
    let notification = modal.submit(&*client, true).await.unwrap();
    assert_eq!(notification.kind, NotificationKind::Success);

    assert_eq!(
        fake.state().feedback_bodies,
        vec![json!({"conversation_id": "c1", "helpful": true, "comment": ""})]
    );
}
