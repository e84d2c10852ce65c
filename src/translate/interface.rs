use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::TranslationError;
use super::gemini::GenerateContentRequest;

/// Body of `POST /api/translate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub source_text: String,
    #[serde(default)]
    pub target_language: Option<String>,
    #[serde(default)]
    pub custom_instruction: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub success: bool,
    pub translated_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// Raw answer from the generation endpoint, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

/// One round trip to the generation API.
///
/// Implementations send exactly one request per call and report transport
/// failures as [`TranslationError::Network`]. Status codes are passed
/// through untouched; interpreting them is the client's job.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn send(
        &self,
        request: &GenerateContentRequest,
        api_key: &str,
    ) -> Result<UpstreamReply, TranslationError>;
}
