use axum::{
    routing::{delete, get, post},
    Router,
    extract::{Json, Path, State},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{Result, AppError};
use crate::api::models::{ConnectionCheck, ParseRequest, ParseResponse, ScrapeRequest, SessionClosed};
use crate::api::response::{self, ApiReply};
use crate::normalizer::ScrapedRecord;
use crate::prompt::{ExtractionRequest, OutputFormat};
use crate::session::{ExportDocument, Session, SessionStore};
use crate::workflow::ScrapeSummary;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape_handler))
        .route("/api/parse", post(parse_handler))
        .route("/api/sessions/:id", delete(close_session_handler))
        .route("/api/sessions/:id/export", get(export_handler))
        .route("/api/sessions/:id/raw", get(raw_handler))
        .route("/api/health/llm", get(llm_health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn scrape_handler(
    State(state): State<AppState>,
    Json(req): Json<ScrapeRequest>,
) -> Result<ApiReply<ScrapeSummary>> {
    info!(session = %req.session_id, url = %req.url, "Processing scrape request");
    let start_time = std::time::Instant::now();

    let handle = state.sessions.get_or_create(&req.session_id);
    let mut session = handle.lock().await;
    let result = state.workflow.scrape(&mut session, &req.url, req.format).await;

    match &result {
        Ok(_) => info!(url = %req.url, elapsed = ?start_time.elapsed(), "Scrape completed"),
        Err(err) => warn!(url = %req.url, error = %err, "Scrape failed"),
    }

    result.map(response::success)
}

async fn parse_handler(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<ApiReply<ParseResponse>> {
    let output_format = OutputFormat::from_tag(&req.output_format);
    info!(session = %req.session_id, format = %output_format, "Processing parse request");

    // Only a scrape opens a session; parsing an unknown one cannot succeed.
    let handle = existing_session(&state.sessions, &req.session_id)?;
    let mut session = handle.lock().await;
    let request = ExtractionRequest::new(req.description, output_format).with_examples(req.examples);
    let extraction = state.workflow.parse(&mut session, request, req.source).await?;

    Ok(response::success(ParseResponse::from(extraction)))
}

fn existing_session(sessions: &SessionStore, id: &str) -> Result<Arc<Mutex<Session>>> {
    sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown session: {}", id)))
}

async fn close_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiReply<SessionClosed>> {
    if !state.sessions.remove(&id) {
        return Err(AppError::NotFound(format!("Unknown session: {}", id)));
    }
    info!(session = %id, "Session closed");

    Ok(response::success(SessionClosed { session_id: id }))
}

async fn export_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiReply<ExportDocument>> {
    let handle = existing_session(&state.sessions, &id)?;
    let session = handle.lock().await;

    session
        .export()
        .map(response::success)
        .ok_or_else(|| AppError::SessionError("Nothing has been parsed in this session yet".to_string()))
}

async fn raw_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiReply<ScrapedRecord>> {
    let handle = existing_session(&state.sessions, &id)?;
    let session = handle.lock().await;

    session
        .record()
        .cloned()
        .map(response::success)
        .ok_or_else(|| AppError::SessionError("No structured data in this session".to_string()))
}

async fn llm_health_handler(State(state): State<AppState>) -> Result<ApiReply<ConnectionCheck>> {
    let llm = state.workflow.llm();
    let reply = llm.test_connection().await.map_err(AppError::LlmError)?;

    Ok(response::success(ConnectionCheck {
        model: llm.model().to_string(),
        reply,
    }))
}
