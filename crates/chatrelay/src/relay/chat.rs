//! The `/chat` turn: validate, forward, extract, sanitize

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use super::error::ChatError;
use super::server::AppState;
use crate::config::Config;
use crate::sanitize::sanitize;
use crate::upstream::{ResponsesBody, UpstreamPayload};

/// Longest accepted message, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Reply text when the upstream produced no text at all
pub const NO_TEXT_PLACEHOLDER: &str = "[No text]";

/// Inbound `/chat` body as sent by the browser, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub previous_response_id: Option<String>,
}

impl ChatRequest {
    /// Parse a request body
    ///
    /// Anything that is not a JSON object reads as an empty request, which
    /// then fails validation as a client error. Non-string fields read as
    /// absent.
    pub fn parse(body: &[u8]) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };

        let string_field = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            message: string_field("message"),
            previous_response_id: string_field("previous_response_id"),
        }
    }

    /// Validate into a turn
    pub fn into_turn(self) -> Result<ChatTurn, ChatError> {
        let message = self.message.unwrap_or_default();
        if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ChatError::InvalidMessage);
        }

        Ok(ChatTurn {
            message,
            previous_response_id: self.previous_response_id.filter(|id| !id.is_empty()),
        })
    }
}

/// A validated user turn; also the wire body the widget client sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub message: String,
    /// Continuation token from the previous reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

/// Success envelope returned to the widget
///
/// Every field defaults so clients can read it out of any JSON object,
/// error envelopes included (those come back with `ok == false`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    #[serde(default)]
    pub ok: bool,
    /// Continuation token for the next turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default)]
    pub assistant_message: String,
}

impl RelayResponse {
    /// Build a success envelope, substituting the placeholder for empty text
    pub fn success(response_id: Option<String>, text: String) -> Self {
        let assistant_message = if text.is_empty() {
            NO_TEXT_PLACEHOLDER.to_string()
        } else {
            text
        };

        Self {
            ok: true,
            response_id,
            assistant_message,
        }
    }
}

/// Build the upstream payload for a validated turn
pub fn build_payload(config: &Config, instructions: &str, turn: ChatTurn) -> UpstreamPayload {
    UpstreamPayload {
        model: config.upstream.model.clone(),
        instructions: instructions.to_string(),
        input: turn.message,
        temperature: config.upstream.temperature,
        previous_response_id: turn.previous_response_id,
    }
}

/// Run one chat turn against the upstream
pub async fn relay_turn(state: &AppState, body: &[u8]) -> Result<RelayResponse, ChatError> {
    let api_key = state
        .api_key
        .as_deref()
        .ok_or_else(|| ChatError::MissingCredential {
            env_var: state.config.upstream.api_key_env.clone(),
        })?;

    let turn = ChatRequest::parse(body).into_turn()?;
    debug!(
        chars = turn.message.chars().count(),
        continued = turn.previous_response_id.is_some(),
        "Accepted chat turn"
    );

    let payload = build_payload(&state.config, &state.instructions, turn);
    let reply = state.upstream.complete(&payload, api_key).await?;

    if !reply.is_success() {
        let status = StatusCode::from_u16(reply.status).map_err(|e| {
            ChatError::Internal(format!("Upstream returned invalid status {}: {e}", reply.status))
        })?;
        return Err(ChatError::Upstream {
            status,
            body: reply.body,
        });
    }

    let parsed = ResponsesBody::from_value(&reply.body)?;
    let text = sanitize(&parsed.output_text());
    Ok(RelayResponse::success(parsed.id, text))
}

/// `POST /chat`
pub(super) async fn chat_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let span = info_span!("chat", request_id = %Uuid::new_v4());

    async move {
        match relay_turn(&state, &body).await {
            Ok(response) => {
                info!(
                    continued = response.response_id.is_some(),
                    chars = response.assistant_message.chars().count(),
                    "Chat turn completed"
                );
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => {
                e.log();
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_request() {
        let request =
            ChatRequest::parse(br#"{"message": "hello", "previous_response_id": "resp_1"}"#);
        let turn = request.into_turn().unwrap();

        assert_eq!(turn.message, "hello");
        assert_eq!(turn.previous_response_id.as_deref(), Some("resp_1"));
    }

    #[test]
    fn test_missing_or_empty_message_rejected() {
        for body in [
            &br#"{}"#[..],
            br#"{"message": ""}"#,
            br#"{"message": null}"#,
            br#"{"message": 42}"#,
            b"not json",
            b"",
            br#"["hi"]"#,
        ] {
            assert_eq!(
                ChatRequest::parse(body).into_turn(),
                Err(ChatError::InvalidMessage),
                "body: {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let at_limit = ChatRequest {
            message: Some("a".repeat(MAX_MESSAGE_CHARS)),
            previous_response_id: None,
        };
        assert!(at_limit.into_turn().is_ok());

        let over_limit = ChatRequest {
            message: Some("a".repeat(MAX_MESSAGE_CHARS + 1)),
            previous_response_id: None,
        };
        assert_eq!(over_limit.into_turn(), Err(ChatError::InvalidMessage));

        // Multi-byte characters count once each
        let kannada = ChatRequest {
            message: Some("ಕ".repeat(MAX_MESSAGE_CHARS)),
            previous_response_id: None,
        };
        assert!(kannada.into_turn().is_ok());
    }

    #[test]
    fn test_non_string_token_is_absent() {
        let turn = ChatRequest::parse(br#"{"message": "hi", "previous_response_id": 5}"#)
            .into_turn()
            .unwrap();
        assert!(turn.previous_response_id.is_none());
    }

    #[test]
    fn test_empty_continuation_token_is_absent() {
        let turn = ChatRequest::parse(br#"{"message": "hi", "previous_response_id": ""}"#)
            .into_turn()
            .unwrap();
        assert!(turn.previous_response_id.is_none());
    }

    #[test]
    fn test_build_payload_forwards_token_unchanged() {
        let config = Config::default();
        let turn = ChatTurn {
            message: "next".to_string(),
            previous_response_id: Some("resp_ 0dd/chars==".to_string()),
        };

        let payload = build_payload(&config, "Be brief.", turn);

        assert_eq!(payload.model, "gpt-4o-mini");
        assert_eq!(payload.instructions, "Be brief.");
        assert_eq!(payload.input, "next");
        assert!((payload.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(
            payload.previous_response_id.as_deref(),
            Some("resp_ 0dd/chars==")
        );
    }

    #[test]
    fn test_success_envelope_placeholder() {
        let response = RelayResponse::success(Some("resp_9".to_string()), String::new());
        assert!(response.ok);
        assert_eq!(response.assistant_message, NO_TEXT_PLACEHOLDER);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["response_id"], "resp_9");
        assert_eq!(json["assistant_message"], "[No text]");
    }

    #[test]
    fn test_success_envelope_omits_missing_id() {
        let response = RelayResponse::success(None, "hi".to_string());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("response_id").is_none());
    }

    #[test]
    fn test_error_body_reads_as_not_ok() {
        let response: RelayResponse =
            serde_json::from_str(r#"{"error": "Empty or too long message"}"#).unwrap();
        assert!(!response.ok);
        assert!(response.assistant_message.is_empty());
    }
}
