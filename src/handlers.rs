use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::TranslatorConfig;
use crate::state::AppState;
use crate::translate::{
    ErrorKind, ErrorResponse, TranslateRequest, TranslateResponse, TranslationError,
    TranslationJob,
};
use crate::utils::{char_count, contains_kana, excerpt, is_japanese_target};

const RATE_LIMIT_MESSAGE: &str = "The Gemini API usage limit has been reached.\n\n\
What you can do:\n\
1. Wait a few minutes and try again\n\
2. Use a different API key\n\
3. Check your plan and billing in Google AI Studio\n\n\
https://aistudio.google.com/";

const OVERLOAD_MESSAGE: &str = "The Gemini API servers are busy right now.\n\n\
What you can do:\n\
1. Wait a few minutes and try again\n\
2. Try again at a different time of day";

const USER_EXCERPT_CHARS: usize = 200;

/// `POST /api/translate`
pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = Uuid::new_v4();
    let span = info_span!("translate", %request_id);

    async move {
        let result = match payload {
            Ok(Json(request)) => handle_translate(&state, request).await,
            Err(rejection) => Err(TranslationError::InvalidRequest {
                message: rejection.body_text(),
            }),
        };
        match result {
            Ok(translated_text) => Ok(Json(TranslateResponse {
                success: true,
                translated_text,
            })),
            Err(err) => {
                match err.kind() {
                    ErrorKind::Validation | ErrorKind::Config => {
                        warn!("Rejected translate request: {}", err)
                    }
                    kind => error!("Translation error ({:?}): {}", kind, err),
                }
                Err(error_response(&err))
            }
        }
    }
    .instrument(span)
    .await
}

/// Validate, look up the key, translate. Never touches HTTP types.
pub async fn handle_translate(
    state: &AppState,
    request: TranslateRequest,
) -> Result<String, TranslationError> {
    let translator = &state.config.translator_config;
    let (job, api_key) = validate_request(translator, request, state.api_key())?;
    info!(
        "Translating {} characters into {}",
        char_count(&job.source_text),
        job.target_language
    );

    let translation = state.orchestrator.translate(&job, &api_key);
    match translator.request_deadline_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), translation)
            .await
            .unwrap_or_else(|_| {
                Err(TranslationError::Network {
                    message: format!("request deadline of {}s exceeded", secs),
                })
            }),
        None => translation.await,
    }
}

/// Checks run in a fixed order: empty, too long, missing key, same language.
pub fn validate_request(
    config: &TranslatorConfig,
    request: TranslateRequest,
    api_key: Option<String>,
) -> Result<(TranslationJob, String), TranslationError> {
    if request.source_text.trim().is_empty() {
        return Err(TranslationError::EmptyInput);
    }

    let count = char_count(&request.source_text);
    if count > config.max_input_chars {
        return Err(TranslationError::TooLong {
            count,
            limit: config.max_input_chars,
        });
    }

    let api_key = api_key.ok_or(TranslationError::MissingApiKey)?;

    let target_language = request
        .target_language
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| config.default_target_language.clone());

    if config.reject_same_language
        && is_japanese_target(&target_language)
        && contains_kana(&request.source_text)
    {
        return Err(TranslationError::SameLanguage {
            target: target_language,
        });
    }

    let custom_instruction = request
        .custom_instruction
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    Ok((
        TranslationJob {
            source_text: request.source_text,
            target_language,
            custom_instruction,
        },
        api_key,
    ))
}

pub fn status_code(err: &TranslationError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::Config => StatusCode::BAD_REQUEST,
        ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Overload => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::UpstreamApi => err
            .upstream_status()
            .filter(|status| (400..600).contains(status))
            .and_then(|status| StatusCode::from_u16(status).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        ErrorKind::Parse | ErrorKind::EmptyResult | ErrorKind::Network => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn error_type(err: &TranslationError) -> Option<&'static str> {
    match err.kind() {
        ErrorKind::RateLimit => Some("rate_limit"),
        ErrorKind::Overload => Some("server_overload"),
        _ => None,
    }
}

pub fn user_message(err: &TranslationError) -> String {
    match err {
        TranslationError::EmptyInput => "Please enter the text to translate.".to_string(),
        TranslationError::TooLong { count, limit } => format!(
            "The text is too long ({} characters).\nPlease keep it within {} characters.",
            count, limit
        ),
        TranslationError::SameLanguage { target } => format!(
            "The text already looks Japanese and the target language is {}.\nPlease choose a different target language.",
            target
        ),
        TranslationError::InvalidRequest { message } => format!(
            "The request could not be read: {}",
            excerpt(message, USER_EXCERPT_CHARS)
        ),
        TranslationError::MissingApiKey => {
            "The Gemini API key is not configured. Please set it in the plugin settings."
                .to_string()
        }
        TranslationError::Parse { message, excerpt } => format!(
            "Translation failed:\nCould not read the Gemini API response: {} (response: {})",
            message, excerpt
        ),
        TranslationError::UpstreamApi { message, .. } => format!(
            "Translation failed:\nGemini API error: {}",
            excerpt(message, USER_EXCERPT_CHARS)
        ),
        TranslationError::EmptyResult => "Translation failed:\nThe translation came back empty. \
            The text may have been blocked by content filtering or could not be translated."
            .to_string(),
        TranslationError::RateLimit { .. } => RATE_LIMIT_MESSAGE.to_string(),
        TranslationError::Overload { .. } => OVERLOAD_MESSAGE.to_string(),
        TranslationError::Network { message } => format!(
            "Translation failed:\nCould not reach the Gemini API: {}",
            excerpt(message, USER_EXCERPT_CHARS)
        ),
    }
}

pub fn error_response(err: &TranslationError) -> (StatusCode, Json<ErrorResponse>) {
    (
        status_code(err),
        Json(ErrorResponse {
            error: user_message(err),
            error_type: error_type(err).map(str::to_string),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::routes::build_app;
    use crate::settings::{MemorySettingsStore, SettingsStore};
    use crate::translate::interface::{UpstreamReply, UpstreamTransport};
    use crate::translate::gemini::GenerateContentRequest;
    use crate::translate::testing::{overloaded, reply, success, RecordingSleeper, ScriptedTransport};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        state: AppState,
        transport: Arc<ScriptedTransport>,
        sleeper: Arc<RecordingSleeper>,
    }

    fn harness_with(config: Config, transport: ScriptedTransport, api_key: Option<&str>) -> Harness {
        let settings = Arc::new(MemorySettingsStore::new());
        if let Some(key) = api_key {
            settings.set(&config.plugin_config.plugin_id, &config.plugin_config.api_key_setting, key.to_string());
        }
        let transport = Arc::new(transport);
        let sleeper = Arc::new(RecordingSleeper::default());
        let state = AppState::with_parts(config, settings, transport.clone(), sleeper.clone());
        Harness {
            state,
            transport,
            sleeper,
        }
    }

    fn harness(transport: ScriptedTransport) -> Harness {
        harness_with(Config::default(), transport, Some("test-key"))
    }

    async fn post_translate(state: &AppState, body: Value) -> (StatusCode, Value) {
        post_raw(state, body.to_string()).await
    }

    async fn post_raw(state: &AppState, body: String) -> (StatusCode, Value) {
        let response = build_app(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/translate")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unreadable_bodies_get_a_json_400() {
        let h = harness(ScriptedTransport::echo());

        for body in [r#"{"source_text": 123}"#, "not json"] {
            let (status, response) = post_raw(&h.state, body.to_string()).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert!(
                response["error"].as_str().unwrap().starts_with("The request could not be read"),
                "body: {}",
                body
            );
            assert!(response.get("error_type").is_none());
        }
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn error_object_in_success_body_maps_to_500_without_retry() {
        let h = harness(ScriptedTransport::new(vec![reply(
            200,
            r#"{"error":{"code":403,"message":"Permission denied"}}"#,
        )]));

        let (status, body) = post_translate(&h.state, json!({"source_text": "Hello"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Permission denied"));
        assert_eq!(h.transport.calls(), 1);
        assert!(h.sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn short_text_round_trip() {
        let h = harness(ScriptedTransport::new(vec![success("こんにちは世界。\n\nこれはテストです。")]));

        let (status, body) = post_translate(
            &h.state,
            json!({"source_text": "Hello world.\n\nThis is a test.", "target_language": "日本語"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "translated_text": "こんにちは世界。\n\nこれはテストです。"})
        );
        assert_eq!(h.transport.calls(), 1);
        assert_eq!(h.transport.api_keys(), vec!["test-key"]);
        let prompt = &h.transport.prompts()[0];
        assert!(prompt.contains("Hello world."));
        assert!(prompt.contains("This is a test."));
        assert!(prompt.contains("into 日本語."));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_upstream() {
        let h = harness(ScriptedTransport::echo());

        let (status, body) = post_translate(&h.state, json!({"source_text": ""})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("enter the text"));
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn missing_source_text_counts_as_empty() {
        let h = harness(ScriptedTransport::echo());

        let (status, _) = post_translate(&h.state, json!({"target_language": "English"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn too_long_input_reports_count_and_limit() {
        let h = harness(ScriptedTransport::echo());

        let (status, body) = post_translate(&h.state, json!({"source_text": "a".repeat(10_001)})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("10001"));
        assert!(message.contains("10000"));
        assert!(body.get("error_type").is_none());
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn limit_is_counted_in_characters() {
        // 10,000 kana are 30,000 bytes but within the limit.
        let h = harness(ScriptedTransport::echo());

        let (status, _) = post_translate(
            &h.state,
            json!({"source_text": "あ".repeat(10_000), "target_language": "English"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_api_key_is_a_config_error() {
        let h = harness_with(Config::default(), ScriptedTransport::echo(), None);

        let (status, body) = post_translate(&h.state, json!({"source_text": "Hello"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("API key"));
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn kana_text_into_japanese_is_rejected() {
        let h = harness(ScriptedTransport::echo());

        let (status, _) = post_translate(
            &h.state,
            json!({"source_text": "これはテストです。", "target_language": "日本語"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(h.transport.calls(), 0);
    }

    #[tokio::test]
    async fn same_language_guard_can_be_disabled() {
        let mut config = Config::default();
        config.translator_config.reject_same_language = false;
        let h = harness_with(config, ScriptedTransport::echo(), Some("k"));

        let (status, _) = post_translate(
            &h.state,
            json!({"source_text": "これはテストです。", "target_language": "日本語"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn absent_target_language_uses_default() {
        let h = harness(ScriptedTransport::echo());

        let (status, _) = post_translate(&h.state, json!({"source_text": "Good morning"})).await;

        assert_eq!(status, StatusCode::OK);
        assert!(h.transport.prompts()[0].contains("into 日本語."));
    }

    #[tokio::test]
    async fn quota_429_maps_to_rate_limit() {
        let h = harness(ScriptedTransport::new(vec![reply(
            429,
            r#"{"error":{"message":"quota exceeded"}}"#,
        )]));

        let (status, body) = post_translate(&h.state, json!({"source_text": "Hello"})).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error_type"], "rate_limit");
        assert!(body["error"].as_str().unwrap().contains("1. Wait a few minutes"));
        assert_eq!(h.transport.calls(), 1);
    }

    #[tokio::test]
    async fn persistent_503_maps_to_server_overload() {
        let h = harness(ScriptedTransport::new(vec![overloaded()]));

        let (status, body) = post_translate(&h.state, json!({"source_text": "Hello"})).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error_type"], "server_overload");
        assert_eq!(h.transport.calls(), 3);
        assert_eq!(
            h.sleeper.delays(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn upstream_status_is_passed_through_for_api_errors() {
        let h = harness(ScriptedTransport::new(vec![reply(
            403,
            r#"{"error":{"code":403,"message":"API key not valid. Please pass a valid API key."}}"#,
        )]));

        let (status, body) = post_translate(&h.state, json!({"source_text": "Hello"})).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("API key not valid"));
        assert!(body.get("error_type").is_none());
    }

    #[tokio::test]
    async fn empty_translation_is_a_server_error() {
        let h = harness(ScriptedTransport::new(vec![reply(200, r#"{"candidates":[]}"#)]));

        let (status, body) = post_translate(&h.state, json!({"source_text": "Hello"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("content filtering"));
    }

    #[tokio::test]
    async fn long_text_is_chunked_end_to_end() {
        let paragraphs: Vec<String> = (0..6).map(|i| format!("{} {}", i, "w".repeat(900))).collect();
        let h = harness(ScriptedTransport::echo());

        let (status, body) = post_translate(
            &h.state,
            json!({"source_text": paragraphs.join("\n\n"), "target_language": "English"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        // 902 + 2 + 902 fits in 2500, a third paragraph does not.
        assert_eq!(h.transport.calls(), 3);
        assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(1); 2]);
        let translated = body["translated_text"].as_str().unwrap();
        assert_eq!(translated.matches('[').count(), 3);
        assert!(translated.starts_with("[0 "));
    }

    struct HangingTransport;

    #[async_trait]
    impl UpstreamTransport for HangingTransport {
        async fn send(
            &self,
            _request: &GenerateContentRequest,
            _api_key: &str,
        ) -> Result<UpstreamReply, TranslationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(UpstreamReply {
                status: 200,
                body: String::new(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_into_network_error() {
        let mut config = Config::default();
        config.translator_config.request_deadline_secs = Some(5);
        let settings = Arc::new(MemorySettingsStore::new());
        settings.set("ai-translator", "gemini_api_key", "k".to_string());
        let state = AppState::with_parts(
            config,
            settings,
            Arc::new(HangingTransport),
            Arc::new(RecordingSleeper::default()),
        );

        let err = handle_translate(
            &state,
            TranslateRequest {
                source_text: "Hello".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(status_code(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(user_message(&err).contains("deadline of 5s exceeded"));
    }
}
