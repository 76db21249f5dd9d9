//! Backend HTTP contract
//!
//! Request/response shapes for the chat service and the `ChatBackend` seam the
//! coordinators call through. The browser implementation is
//! `platform::http::FetchBackend`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TransportError;
use crate::persistence::PersistedRecord;

pub const CHAT_PATH: &str = "/api/chat";
pub const LOAD_CONTEXT_PATH: &str = "/api/load_context";
pub const SAVE_PATH: &str = "/api/save";
pub const RESET_PATH: &str = "/api/reset";

/// `extraction_status` value meaning the snapshot is usable
pub const EXTRACTION_COMPLETE: &str = "complete";

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadContextRequest<'a> {
    pub saved_data: &'a PersistedRecord,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LoadContextResponse {
    #[serde(default)]
    pub success: bool,
    /// Personalized greeting for the restored conversation
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LoadContextResponse {
    /// The greeting to show, if the handshake succeeded with one
    pub fn greeting(&self) -> Option<&str> {
        if self.success {
            self.response.as_deref().filter(|s| !s.trim().is_empty())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub extraction_status: String,
    #[serde(default)]
    pub extracted_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub summary: Option<Value>,
}

impl SaveResponse {
    pub fn is_complete(&self) -> bool {
        self.extraction_status == EXTRACTION_COMPLETE
    }

    /// Backend's error text, or a generic one
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Failed to extract data".to_string())
    }
}

/// The chat service as seen from the client.
///
/// Single-threaded; implementations need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait ChatBackend {
    async fn chat(&self, message: &str) -> Result<ChatResponse, TransportError>;

    async fn load_context(
        &self,
        record: &PersistedRecord,
    ) -> Result<LoadContextResponse, TransportError>;

    /// Ask the backend to extract and return the current session snapshot
    async fn request_save(&self) -> Result<SaveResponse, TransportError>;

    async fn reset(&self) -> Result<(), TransportError>;
}

/// Decode a response body against the contract
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_save_response() {
        let body = r#"{
            "extraction_status": "complete",
            "extracted_data": {"members": 3},
            "phase": "discovery",
            "summary": "Three family members"
        }"#;
        let resp: SaveResponse = decode(body).unwrap();
        assert!(resp.is_complete());
        assert_eq!(resp.extracted_data.unwrap()["members"], 3);
        assert_eq!(resp.phase.as_deref(), Some("discovery"));
    }

    #[test]
    fn test_incomplete_save_keeps_error_text() {
        let resp: SaveResponse =
            decode(r#"{"extraction_status": "pending", "error": "not enough data"}"#).unwrap();
        assert!(!resp.is_complete());
        assert_eq!(resp.error_message(), "not enough data");

        let bare: SaveResponse = decode(r#"{"extraction_status": "failed"}"#).unwrap();
        assert_eq!(bare.error_message(), "Failed to extract data");
    }

    #[test]
    fn test_load_context_greeting() {
        let ok: LoadContextResponse =
            decode(r#"{"success": true, "response": "Welcome back", "phase": "deep_dive"}"#)
                .unwrap();
        assert_eq!(ok.greeting(), Some("Welcome back"));

        let failed: LoadContextResponse =
            decode(r#"{"success": false, "error": "No saved data provided"}"#).unwrap();
        assert_eq!(failed.greeting(), None);

        let empty: LoadContextResponse = decode(r#"{"success": true}"#).unwrap();
        assert_eq!(empty.greeting(), None);
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode::<ChatResponse>(r#"{"reply": "hi"}"#).unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[test]
    fn test_chat_request_body() {
        let body = serde_json::to_string(&ChatRequest { message: "hi" }).unwrap();
        assert_eq!(body, r#"{"message":"hi"}"#);
    }
}
