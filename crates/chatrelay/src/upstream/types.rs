use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::UpstreamError;

/// Request body for the Responses API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamPayload {
    pub model: String,
    pub instructions: String,
    pub input: String,
    pub temperature: f32,
    /// Continuation token from the previous turn, forwarded untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

/// Raw status and JSON body returned by the completion API
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Successful Responses API body, reduced to what the relay reads
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponsesBody {
    /// Response id, reused as the continuation token
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "seq_or_empty")]
    pub output: Vec<OutputItem>,
}

/// One entry of the `output` sequence (message, reasoning, tool call...)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OutputItem {
    #[serde(default, deserialize_with = "parts_or_empty")]
    pub content: Vec<ContentPart>,
}

/// A content part, tagged by its `type` field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "output_text")]
    OutputText {
        #[serde(default)]
        text: String,
    },
    /// Refusals, annotations-only parts, kinds added later, and parts
    /// that do not decode (no `type`, non-string `text`)
    #[serde(other)]
    Other,
}

impl ResponsesBody {
    /// Parse a success body
    pub fn from_value(body: &Value) -> Result<Self, UpstreamError> {
        Self::deserialize(body).map_err(|e| UpstreamError::InvalidBody(e.to_string()))
    }

    /// Concatenate every `output_text` part, in order
    ///
    /// Returns an empty string when the body carries no text parts.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .fold(String::new(), |mut text, part| {
                if let ContentPart::OutputText { text: fragment } = part {
                    text.push_str(fragment);
                }
                text
            })
    }
}

/// Deserialize a JSON array into `Vec<T>`; any non-array value (including
/// `null`) yields an empty vector.
fn seq_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Like [`seq_or_empty`], but a part that does not decode reads as
/// [`ContentPart::Other`] instead of failing the whole body.
fn parts_or_empty<'de, D>(deserializer: D) -> Result<Vec<ContentPart>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .iter()
            .map(|item| ContentPart::deserialize(item).unwrap_or(ContentPart::Other))
            .collect()),
        _ => Ok(Vec::new()),
    }
}
