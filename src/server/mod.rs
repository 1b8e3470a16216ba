//! HTTP service.
//!
//! Serves the single-page form and exposes the two actions as JSON
//! endpoints. Action errors travel in the response body, so both action
//! routes answer `200 OK` even for unparseable bodies.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::actions::{CodeActions, INVALID_INPUT};
use crate::config::AppConfig;
use crate::language::Language;
use crate::metrics::metrics_handler;
use crate::types::{ActionResponse, GenerationRequest, LanguageInfo, RegenerationRequest};

const INDEX_HTML: &str = include_str!("assets/index.html");

/// Room for text fields on top of the base64-encoded image.
const TEXT_BODY_ALLOWANCE: usize = 1024 * 1024;

/// Shared, read-only handler state.
#[derive(Debug)]
pub struct AppState {
    pub actions: CodeActions,
    index_html: String,
}

impl AppState {
    pub fn new(actions: CodeActions) -> Self {
        let index_html = render_index(actions.max_image_bytes());
        Self {
            actions,
            index_html,
        }
    }
}

/// Largest request body accepted, derived from the image limit.
///
/// Base64 inflates the payload by 4/3. Saturates instead of overflowing.
pub fn body_limit(max_image_bytes: usize) -> usize {
    max_image_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(TEXT_BODY_ALLOWANCE)
}

/// Fills the page's image limit so the browser rejects what the server would.
fn render_index(max_image_bytes: usize) -> String {
    INDEX_HTML
        .replace("__MAX_IMAGE_BYTES__", &max_image_bytes.to_string())
        .replace("__MAX_IMAGE_LABEL__", &size_label(max_image_bytes))
}

fn size_label(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = body_limit(state.actions.max_image_bytes());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/generate", post(generate))
        .route("/api/regenerate", post(regenerate))
        .route("/api/languages", get(languages))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds to the configured address and serves until Ctrl-C.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let actions = CodeActions::from_config(config).context("Failed to create LLM client")?;
    if config.llm.api_key.is_none() {
        warn!("No API key configured; requests to the model provider may be rejected");
    }

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        address = %addr,
        model = %config.llm.model,
        api_base = %config.llm.api_base,
        "HTTP server listening"
    );

    serve_on(listener, Arc::new(AppState::new(actions))).await
}

/// Serves on an already bound listener.
pub async fn serve_on(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.index_html.clone())
}

async fn health() -> &'static str {
    "OK"
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    Json(
        Language::all()
            .iter()
            .map(|lang| LanguageInfo {
                id: lang.id().to_string(),
                label: lang.display_name().to_string(),
            })
            .collect(),
    )
}

/// POST /api/generate
async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let request_id = Uuid::new_v4();
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(%request_id, error = %rejection, "Unreadable generate request");
            return Json(ActionResponse::err(INVALID_INPUT));
        }
    };

    let response = state.actions.generate(&request).await;
    info!(%request_id, ok = response.is_ok(), "Generate finished");
    Json(response)
}

/// POST /api/regenerate
async fn regenerate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegenerationRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let request_id = Uuid::new_v4();
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(%request_id, error = %rejection, "Unreadable regenerate request");
            return Json(ActionResponse::err(INVALID_INPUT));
        }
    };

    let response = state.actions.regenerate(&request).await;
    info!(%request_id, ok = response.is_ok(), "Regenerate finished");
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_covers_encoded_image() {
        let max_image: usize = 4 * 1024 * 1024;
        let encoded = max_image.div_ceil(3) * 4;
        assert!(body_limit(max_image) > encoded);
        assert_eq!(body_limit(0), TEXT_BODY_ALLOWANCE);
    }

    #[test]
    fn test_body_limit_saturates_for_huge_limits() {
        assert_eq!(body_limit(usize::MAX), usize::MAX);
        assert_eq!(body_limit(usize::MAX - 1), usize::MAX);
    }

    #[test]
    fn test_index_carries_configured_image_limit() {
        let page = render_index(2 * 1024 * 1024);
        assert!(page.contains("const MAX_IMAGE_BYTES = 2097152;"));
        assert!(page.contains("up to 2 MB"));
        assert!(!page.contains("__MAX_IMAGE_"));
    }

    #[test]
    fn test_size_label() {
        assert_eq!(size_label(4 * 1024 * 1024), "4 MB");
        assert_eq!(size_label(1536 * 1024), "1536 KB");
        assert_eq!(size_label(500), "500 bytes");
    }

    #[test]
    fn test_index_page_is_embedded() {
        assert!(INDEX_HTML.contains("/api/generate"));
        assert!(INDEX_HTML.contains("/api/regenerate"));
    }
}
