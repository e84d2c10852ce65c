use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::TranslatorConfig;
use crate::utils::char_count;
use super::chunker::{split_into_chunks, PARAGRAPH_SEPARATOR};
use super::client::TranslationClient;
use super::error::TranslationError;
use super::prompt::build_prompt;
use super::retry::Sleeper;

/// Size thresholds and pacing for long-text translation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    /// Texts up to this many characters go upstream in one call.
    pub direct_translate_limit: usize,
    pub chunk_budget: usize,
    pub chunk_pause: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            direct_translate_limit: 3000,
            chunk_budget: 2500,
            chunk_pause: Duration::from_secs(1),
        }
    }
}

impl From<&TranslatorConfig> for OrchestratorSettings {
    fn from(config: &TranslatorConfig) -> Self {
        Self {
            direct_translate_limit: config.direct_translate_limit,
            chunk_budget: config.chunk_budget,
            chunk_pause: Duration::from_millis(config.chunk_pause_ms),
        }
    }
}

/// A validated translate job.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationJob {
    pub source_text: String,
    pub target_language: String,
    pub custom_instruction: Option<String>,
}

/// Decides between a single call and chunked translation, and puts the
/// chunk translations back together in order.
pub struct TranslationOrchestrator {
    client: TranslationClient,
    sleeper: Arc<dyn Sleeper>,
    settings: OrchestratorSettings,
}

impl TranslationOrchestrator {
    pub fn new(
        client: TranslationClient,
        sleeper: Arc<dyn Sleeper>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            client,
            sleeper,
            settings,
        }
    }

    pub async fn translate(&self, job: &TranslationJob, api_key: &str) -> Result<String, TranslationError> {
        let length = char_count(&job.source_text);
        if length <= self.settings.direct_translate_limit {
            return self.translate_text(&job.source_text, job, api_key).await;
        }

        self.translate_long_text(job, api_key, length).await
    }

    /// Chunks are translated one at a time, in order, with a pause between
    /// calls. The first failing chunk fails the whole job.
    async fn translate_long_text(
        &self,
        job: &TranslationJob,
        api_key: &str,
        length: usize,
    ) -> Result<String, TranslationError> {
        let chunks = split_into_chunks(&job.source_text, self.settings.chunk_budget);
        info!(
            "Splitting {} characters into {} chunks (budget {})",
            length,
            chunks.len(),
            self.settings.chunk_budget
        );

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            if chunk.index > 0 {
                self.sleeper.sleep(self.settings.chunk_pause).await;
            }
            info!("Translating chunk {}/{}", chunk.index + 1, chunks.len());
            translated.push(self.translate_text(&chunk.text, job, api_key).await?);
        }

        Ok(translated.join(PARAGRAPH_SEPARATOR))
    }

    async fn translate_text(
        &self,
        text: &str,
        job: &TranslationJob,
        api_key: &str,
    ) -> Result<String, TranslationError> {
        let prompt = build_prompt(text, &job.target_language, job.custom_instruction.as_deref());
        self.client.translate_one(&prompt, api_key).await
    }
}
