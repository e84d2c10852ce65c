pub mod chunker;
pub mod client;
pub mod error;
pub mod gemini;
pub mod interface;
pub mod orchestrator;
pub mod prompt;
pub mod retry;

#[cfg(test)]
pub mod testing;

pub use client::TranslationClient;
pub use error::{ErrorKind, TranslationError};
pub use gemini::GeminiHttpTransport;
pub use interface::*;
pub use orchestrator::{OrchestratorSettings, TranslationJob, TranslationOrchestrator};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
