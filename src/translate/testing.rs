//! Scripted upstream and recording clock shared by the translate tests.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::error::TranslationError;
use super::gemini::GenerateContentRequest;
use super::interface::{UpstreamReply, UpstreamTransport};
use super::retry::Sleeper;

pub fn reply(status: u16, body: impl Into<String>) -> Result<UpstreamReply, TranslationError> {
    Ok(UpstreamReply {
        status,
        body: body.into(),
    })
}

pub fn success(text: &str) -> Result<UpstreamReply, TranslationError> {
    reply(
        200,
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string(),
    )
}

pub fn overloaded() -> Result<UpstreamReply, TranslationError> {
    reply(
        503,
        json!({"error": {"code": 503, "message": "The model is overloaded. Please try again later."}})
            .to_string(),
    )
}

/// Plays back canned replies in order; the last one repeats forever.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<UpstreamReply, TranslationError>>>,
    requests: Mutex<Vec<(GenerateContentRequest, String)>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<UpstreamReply, TranslationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Echoes each prompt's source text back, wrapped as `[text]`.
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(request, _)| request.prompt().map(str::to_string))
            .collect()
    }

    pub fn api_keys(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, key)| key.clone())
            .collect()
    }
}

#[async_trait]
impl UpstreamTransport for ScriptedTransport {
    async fn send(
        &self,
        request: &GenerateContentRequest,
        api_key: &str,
    ) -> Result<UpstreamReply, TranslationError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), api_key.to_string()));

        let mut replies = self.replies.lock().unwrap();
        match replies.len() {
            0 => success(&format!("[{}]", source_of(request.prompt().unwrap_or_default()))),
            1 => replies[0].clone(),
            _ => replies.pop_front().unwrap(),
        }
    }
}

/// The text between the `---` markers of a prompt.
pub fn source_of(prompt: &str) -> String {
    prompt
        .split_once("---\n")
        .and_then(|(_, rest)| rest.rsplit_once("\n---"))
        .map(|(text, _)| text.to_string())
        .unwrap_or_default()
}

/// Records requested waits instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
