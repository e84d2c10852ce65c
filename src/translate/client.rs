use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::utils::excerpt;
use super::error::TranslationError;
use super::gemini::{GenerateContentRequest, GenerateContentResponse};
use super::interface::{UpstreamReply, UpstreamTransport};
use super::retry::{RetryAction, RetryPolicy, Sleeper};

const LOG_EXCERPT_CHARS: usize = 500;
const MESSAGE_EXCERPT_CHARS: usize = 200;

/// Sends one prompt upstream, retrying while the API answers 503.
pub struct TranslationClient {
    transport: Arc<dyn UpstreamTransport>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryPolicy,
}

impl TranslationClient {
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        sleeper: Arc<dyn Sleeper>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            retry,
        }
    }

    /// Translate a fully built prompt.
    ///
    /// Returns the text of the first candidate. When every attempt fails
    /// the last error is returned.
    pub async fn translate_one(&self, prompt: &str, api_key: &str) -> Result<String, TranslationError> {
        let request = GenerateContentRequest::from_prompt(prompt);
        let mut attempt = 1;

        loop {
            info!("Translation attempt {}/{}", attempt, self.retry.max_attempts);

            match self.attempt(&request, api_key).await {
                Ok(text) => {
                    info!("Translation succeeded on attempt {}", attempt);
                    return Ok(text);
                }
                Err(err) => {
                    error!("Translation request failed on attempt {}: {}", attempt, err);
                    match self.retry.next_action(attempt, &err) {
                        RetryAction::RetryAfter(delay) => {
                            warn!(
                                "Retrying after {:?} (upstream status {:?})",
                                delay,
                                err.upstream_status()
                            );
                            self.sleeper.sleep(delay).await;
                            attempt += 1;
                        }
                        RetryAction::GiveUp => return Err(err),
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &GenerateContentRequest,
        api_key: &str,
    ) -> Result<String, TranslationError> {
        let reply = self.transport.send(request, api_key).await?;
        debug!(
            "Upstream responded with HTTP {}: {}",
            reply.status,
            excerpt(&reply.body, LOG_EXCERPT_CHARS)
        );
        parse_reply(&reply)
    }
}

/// Interpret one upstream reply.
///
/// Non-2xx statuses are classified straight away. A 2xx body must be JSON,
/// must not carry an `error` object, and must hold non-empty text. Only the
/// non-2xx branch records an HTTP status, so only it can lead to a retry.
pub fn parse_reply(reply: &UpstreamReply) -> Result<String, TranslationError> {
    if !(200..300).contains(&reply.status) {
        let message = serde_json::from_str::<GenerateContentResponse>(&reply.body)
            .ok()
            .and_then(|response| response.error)
            .and_then(|error| error.message)
            .unwrap_or_else(|| {
                format!(
                    "HTTP {}: {}",
                    reply.status,
                    excerpt(&reply.body, MESSAGE_EXCERPT_CHARS)
                )
            });
        return Err(TranslationError::from_upstream(Some(reply.status), message));
    }

    let value: serde_json::Value =
        serde_json::from_str(&reply.body).map_err(|e| TranslationError::Parse {
            message: e.to_string(),
            excerpt: excerpt(&reply.body, MESSAGE_EXCERPT_CHARS),
        })?;
    // Valid JSON of an unexpected shape carries no text
    let response: GenerateContentResponse = serde_json::from_value(value).unwrap_or_default();

    if let Some(api_error) = response.error {
        let message = api_error
            .message
            .unwrap_or_else(|| "Unknown API error".to_string());
        return Err(TranslationError::from_error_object(api_error.code, message));
    }

    match response.first_text() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(TranslationError::EmptyResult),
    }
}
