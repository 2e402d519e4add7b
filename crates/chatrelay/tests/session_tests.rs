//! End-to-end conversation continuity
//!
//! A real relay on a loopback port, the real upstream client pointed at
//! wiremock, and a `ChatSession` talking to the relay over HTTP.

use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use chatrelay::client::{
    Bubble, ChatSession, ClientError, FAILURE_MESSAGE, FileTokenStore, MemoryTokenStore,
    RelayClient, RelayTransport, SendOutcome, Transcript,
};
use chatrelay::config::Config;
use chatrelay::relay::{AppState, ChatTurn, create_router};
use chatrelay::upstream::ResponsesClient;

// =============================================================================
// Test Fixtures
// =============================================================================

fn reply_body(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "output": [{"type": "message", "content": [{"type": "output_text", "text": text}]}]
    })
}

/// Start a relay in the background and return its base URL
async fn spawn_relay(mock_server: &MockServer, api_key: Option<&str>) -> String {
    let mut config = Config::default();
    config.upstream.api_url = format!("{}/v1/responses", mock_server.uri());

    let client = ResponsesClient::new(&config.upstream).unwrap();
    let state = AppState::new(config, api_key.map(str::to_string), Arc::new(client));
    let app = create_router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn upstream_bodies(mock_server: &MockServer) -> Vec<Value> {
    mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

// =============================================================================
// Continuity Tests
// =============================================================================

#[tokio::test]
async fn test_second_turn_carries_first_response_id() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::body_partial_json(json!({"input": "first"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("resp_one", "Hi!")))
        .mount(&mock_server)
        .await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_partial_json(json!({"input": "second"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("resp_two", "Sure.")))
        .mount(&mock_server)
        .await;

    let base = spawn_relay(&mock_server, Some("sk-test")).await;
    let transport = RelayClient::new(&base).unwrap();
    let mut session = ChatSession::open(MemoryTokenStore::new(), transport);
    let mut view = Transcript::new();

    assert_eq!(session.send(&mut view, "first").await, SendOutcome::Replied);
    assert_eq!(session.token(), Some("resp_one"));
    assert_eq!(session.send(&mut view, "second").await, SendOutcome::Replied);
    assert_eq!(session.token(), Some("resp_two"));

    let bodies = upstream_bodies(&mock_server).await;
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].get("previous_response_id").is_none());
    assert_eq!(bodies[1]["previous_response_id"], "resp_one");

    assert_eq!(
        view.bubbles(),
        &[
            Bubble::user("first"),
            Bubble::assistant("Hi!"),
            Bubble::user("second"),
            Bubble::assistant("Sure."),
        ]
    );
}

#[tokio::test]
async fn test_token_survives_session_restart() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("resp_saved", "ok")))
        .mount(&mock_server)
        .await;

    let base = spawn_relay(&mock_server, Some("sk-test")).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session");

    {
        let mut session =
            ChatSession::open(FileTokenStore::new(&path), RelayClient::new(&base).unwrap());
        session.send(&mut Transcript::new(), "hello").await;
    }

    let mut session =
        ChatSession::open(FileTokenStore::new(&path), RelayClient::new(&base).unwrap());
    assert_eq!(session.token(), Some("resp_saved"));

    session.send(&mut Transcript::new(), "again").await;
    let bodies = upstream_bodies(&mock_server).await;
    assert_eq!(bodies[1]["previous_response_id"], "resp_saved");
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_relay_error_shows_failure_bubble() {
    let mock_server = MockServer::start().await;

    let base = spawn_relay(&mock_server, None).await;
    let mut session = ChatSession::open(
        MemoryTokenStore::with_token("resp_keep"),
        RelayClient::new(&base).unwrap(),
    );
    let mut view = Transcript::new();

    assert_eq!(session.send(&mut view, "hello").await, SendOutcome::Failed);

    assert_eq!(view.bubbles()[1], Bubble::assistant(FAILURE_MESSAGE));
    assert!(view.reports()[0].contains("500"));
    assert!(!view.is_typing());
    assert_eq!(session.token(), Some("resp_keep"));
    assert!(upstream_bodies(&mock_server).await.is_empty());
}

#[tokio::test]
async fn test_unreachable_relay_is_network_failure() {
    let store = MemoryTokenStore::new();
    let mut session = ChatSession::open(store, RelayClient::new("http://127.0.0.1:1").unwrap());
    let mut view = Transcript::new();

    assert_eq!(session.send(&mut view, "hello").await, SendOutcome::Failed);
    assert_eq!(view.bubbles()[1].text, FAILURE_MESSAGE);
    assert!(view.reports()[0].starts_with("Network error"));
}

#[tokio::test]
async fn test_rejected_reply_reports_status() {
    let mock_server = MockServer::start().await;
    let base = spawn_relay(&mock_server, Some("sk-test")).await;

    let client = RelayClient::new(&base).unwrap();
    let turn = ChatTurn {
        message: String::new(),
        previous_response_id: None,
    };
    let result = client.send_turn(&turn).await;

    match result {
        Err(ClientError::Rejected { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body, json!({"error": "Empty or too long message"}));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}
