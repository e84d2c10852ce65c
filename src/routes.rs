use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router<AppState> {
    let system_config = &state.config.system_config;

    Router::new()
        // Health check
        .route("/api/health", get(health_check))

        // Translation API
        .route("/api/status", get(status))
        .route("/api/translate", post(handlers::translate))

        // Front end
        .fallback_service(ServeDir::new(&system_config.static_dir))
}

/// Full application with middleware, ready to serve.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// What a front end needs to render its form and warnings.
async fn status(State(state): State<AppState>) -> Json<Value> {
    let translator = &state.config.translator_config;
    Json(json!({
        "has_api_key": state.api_key().is_some(),
        "default_target_language": translator.default_target_language,
        "max_input_chars": translator.max_input_chars,
        "chunk_threshold": translator.direct_translate_limit
    }))
}
