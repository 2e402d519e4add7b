//! Integration tests for the Responses API client
//!
//! Runs the real `ResponsesClient` against a wiremock server, both directly
//! and behind the relay router.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use chatrelay::config::{Config, UpstreamConfig};
use chatrelay::relay::{AppState, create_router};
use chatrelay::upstream::{CompletionApi, ResponsesClient, UpstreamError, UpstreamPayload};

// =============================================================================
// Test Fixtures
// =============================================================================

fn upstream_config(mock_server: &MockServer) -> UpstreamConfig {
    UpstreamConfig {
        api_url: format!("{}/v1/responses", mock_server.uri()),
        ..UpstreamConfig::default()
    }
}

fn payload(previous_response_id: Option<&str>) -> UpstreamPayload {
    UpstreamPayload {
        model: "gpt-4o-mini".to_string(),
        instructions: "Be brief.".to_string(),
        input: "hello".to_string(),
        temperature: 0.7,
        previous_response_id: previous_response_id.map(str::to_string),
    }
}

/// Router wired to the mock server through the real client
fn relay_router(mock_server: &MockServer) -> Router {
    let mut config = Config::default();
    config.upstream = upstream_config(mock_server);

    let client = ResponsesClient::new(&config.upstream).unwrap();
    let state = AppState::new(config, Some("sk-test".to_string()), Arc::new(client));
    create_router(Arc::new(state))
}

async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Client Tests
// =============================================================================

mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_bearer_auth_and_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/responses"))
            .and(matchers::header("Authorization", "Bearer sk-live"))
            .and(matchers::header("Content-Type", "application/json"))
            .and(matchers::body_json(json!({
                "model": "gpt-4o-mini",
                "instructions": "Be brief.",
                "input": "hello",
                "temperature": 0.7,
                "previous_response_id": "resp_prev"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "resp_next"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ResponsesClient::new(&upstream_config(&mock_server)).unwrap();
        let reply = client
            .complete(&payload(Some("resp_prev")), "sk-live")
            .await
            .unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["id"], "resp_next");
    }

    #[tokio::test]
    async fn test_token_omitted_when_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "resp_1"})))
            .mount(&mock_server)
            .await;

        let client = ResponsesClient::new(&upstream_config(&mock_server)).unwrap();
        client.complete(&payload(None), "sk-test").await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(sent.get("previous_response_id").is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_a_reply() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"message": "Incorrect API key"}})),
            )
            .mount(&mock_server)
            .await;

        let client = ResponsesClient::new(&upstream_config(&mock_server)).unwrap();
        let reply = client.complete(&payload(None), "sk-bad").await.unwrap();

        assert_eq!(reply.status, 401);
        assert!(!reply.is_success());
        assert_eq!(reply.body["error"]["message"], "Incorrect API key");
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        let client = ResponsesClient::new(&upstream_config(&mock_server)).unwrap();
        let result = client.complete(&payload(None), "sk-test").await;

        assert!(matches!(result, Err(UpstreamError::InvalidBody(_))));
    }

    #[tokio::test]
    async fn test_configured_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "resp_slow"}))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let config = UpstreamConfig {
            timeout_secs: Some(1),
            ..upstream_config(&mock_server)
        };
        let client = ResponsesClient::new(&config).unwrap();
        let result = client.complete(&payload(None), "sk-test").await;

        assert!(matches!(result, Err(UpstreamError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let config = UpstreamConfig {
            api_url: "http://127.0.0.1:1/v1/responses".to_string(),
            ..UpstreamConfig::default()
        };
        let client = ResponsesClient::new(&config).unwrap();
        let result = client.complete(&payload(None), "sk-test").await;

        assert!(matches!(result, Err(UpstreamError::Network(_))));
    }
}

// =============================================================================
// Relay Through Real Client Tests
// =============================================================================

mod relay_tests {
    use super::*;

    #[tokio::test]
    async fn test_relay_extracts_and_sanitizes() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/responses"))
            .and(matchers::body_partial_json(json!({"input": "hours?", "model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_42",
                "output": [
                    {"type": "reasoning", "summary": []},
                    {"type": "message", "content": [
                        {"type": "output_text", "text": "We are open **9 to 5**."}
                    ]}
                ]
            })))
            .mount(&mock_server)
            .await;

        let (status, body) = post_chat(relay_router(&mock_server), json!({"message": "hours?"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"ok": true, "response_id": "resp_42", "assistant_message": "We are open 9 to 5."})
        );
    }

    #[tokio::test]
    async fn test_relay_passes_upstream_error_through() {
        let mock_server = MockServer::start().await;
        let upstream_body = json!({
            "error": {"message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded"}
        });

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(upstream_body.clone()))
            .mount(&mock_server)
            .await;

        let (status, body) = post_chat(relay_router(&mock_server), json!({"message": "hi"})).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, upstream_body);
    }

    #[tokio::test]
    async fn test_relay_non_json_upstream_is_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&mock_server)
            .await;

        let (status, body) = post_chat(relay_router(&mock_server), json!({"message": "hi"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Server error"}));
    }

    #[tokio::test]
    async fn test_relay_rejects_before_calling_upstream() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "resp_1"})))
            .expect(0)
            .mount(&mock_server)
            .await;

        let (status, _) = post_chat(relay_router(&mock_server), json!({"message": ""})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
