//! HTTP routes: liveness, question answering, and audio retrieval.

use std::path::{Component, Path};

use axum::{
    Json, Router,
    extract::{Path as UrlPath, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use gita_rag::{GitaError, OutputLanguage, SourceDocument};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// A question for Lord Krishna, scoped to one commentator.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub author: String,
    #[serde(default)]
    pub output_language: OutputLanguage,
    #[serde(default)]
    pub generate_audio: bool,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ask", post(ask))
        .route("/audio/{filename}", get(audio))
        .with_state(state)
}

fn error_response(err: GitaError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        GitaError::Input(_) => StatusCode::BAD_REQUEST,
        GitaError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        GitaError::Dependency { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (status, Json(serde_json::json!({ "detail": err.to_string() })))
}

/// GET / (liveness check)
async fn root() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok", message: "Gita GPT API is running" })
}

/// POST /ask
async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, Json<serde_json::Value>)> {
    info!(author = %req.author, language = ?req.output_language, "ask request");

    let answer = state
        .engine
        .ask(&req.query, &req.author, req.output_language)
        .await
        .map_err(error_response)?;

    let audio_url = if req.generate_audio {
        synthesize_audio(&state, &answer.answer).await
    } else {
        None
    };

    Ok(Json(AskResponse { answer: answer.answer, sources: answer.sources, audio_url }))
}

/// Render the answer to an MP3 file and return its public URL.
///
/// Failures are logged and swallowed so the caller still gets the text
/// answer.
async fn synthesize_audio(state: &AppState, text: &str) -> Option<String> {
    let tts = match &state.tts {
        Some(tts) => tts,
        None => {
            warn!("audio requested but no text-to-speech client is configured");
            return None;
        }
    };

    let bytes = match tts.synthesize(text).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "speech synthesis failed; returning text only");
            return None;
        }
    };

    let filename = format!("{}.mp3", Uuid::new_v4());
    let path = state.audio_dir.join(&filename);
    if let Err(err) = tokio::fs::write(&path, &bytes).await {
        warn!(error = %err, path = %path.display(), "failed to write audio file");
        return None;
    }

    Some(format!("{}/audio/{}", state.public_base_url, filename))
}

/// GET /audio/{filename}
async fn audio(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if !is_plain_filename(&filename) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "detail": "invalid audio filename" })),
        ));
    }

    let path = state.audio_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes)),
        Err(_) => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "detail": "audio file not found" })),
        )),
    }
}

/// A single `.mp3` path component, with no traversal or separators.
fn is_plain_filename(name: &str) -> bool {
    if !name.ends_with(".mp3") {
        return false;
    }
    let path = Path::new(name);
    let mut components = path.components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}
