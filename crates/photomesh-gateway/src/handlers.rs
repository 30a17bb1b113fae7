use crate::error::ApiError;
use crate::server::AppState;
use crate::storage::content_type_for;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use photomesh_core::{PhotomeshError, PhotomeshResult, SessionId, Step};
use photomesh_workflow::WorkflowState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Longest accepted edit prompt, in bytes.
pub const MAX_PROMPT_LEN: usize = 4_000;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub image_url: String,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EditForm {
    pub session_id: String,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: SessionId,
    pub state: WorkflowState,
    pub images: Vec<String>,
    pub history: Vec<Step>,
}

/// `POST /upload`: multipart with a `session_id` field and a `file` part.
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut session_id = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        match field.name() {
            Some("session_id") => {
                session_id = Some(field.text().await.map_err(bad_multipart)?);
            }
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                file = Some((name, bytes));
            }
            _ => {}
        }
    }

    let session_id = session_id.ok_or_else(|| missing("session_id"))?;
    let session_id = SessionId::parse(session_id.trim())?;
    let (file_name, bytes) = file.ok_or_else(|| missing("file"))?;

    let image_url = state
        .storage
        .save_image(&session_id, &file_name, &bytes)
        .await?;
    let count = state.controller.upload_image(&session_id, image_url.clone()).await;

    Ok(Json(UploadResponse {
        status: "success",
        image_url,
        count,
    }))
}

/// `POST /generate_initial`: form with `session_id`.
pub async fn generate_initial_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<GenerateForm>,
) -> Result<Json<Step>, ApiError> {
    let session_id = SessionId::parse(form.session_id.trim())?;
    let controller = Arc::clone(&state.controller);
    let task = tokio::spawn(async move { controller.generate_initial(&session_id).await });
    Ok(Json(join_detached(task).await?))
}

/// `POST /edit_model`: form with `session_id` and `prompt`.
pub async fn edit_model_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<EditForm>,
) -> Result<Json<Step>, ApiError> {
    let session_id = SessionId::parse(form.session_id.trim())?;
    check_prompt(&form.prompt)?;
    let controller = Arc::clone(&state.controller);
    let prompt = form.prompt;
    let task = tokio::spawn(async move { controller.edit_model(&session_id, &prompt).await });
    Ok(Json(join_detached(task).await?))
}

/// `GET /history/{session_id}`: never fails for a well-formed id.
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session_id = SessionId::parse(session_id)?;
    let view = state.controller.get_history(&session_id).await;
    Ok(Json(HistoryResponse {
        state: WorkflowState::of(&view),
        session_id: view.session_id,
        images: view.images,
        history: view.history,
    }))
}

/// `GET /static/{*path}`: stored images and models.
pub async fn static_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    match state.storage.read(&path).await? {
        Some(bytes) => {
            Ok(([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response())
        }
        None => {
            info!(path = %path, "Static artifact not found");
            Ok((
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "not found" })),
            )
                .into_response())
        }
    }
}

/// `GET /health`
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions = state.controller.store().session_count().await;
    Json(serde_json::json!({
        "status": "ok",
        "service": "photomesh",
        "sessions": sessions,
    }))
}

/// Generation runs on its own task so a client hanging up mid-call neither
/// cancels the generator nor loses the step it produces.
async fn join_detached(task: JoinHandle<PhotomeshResult<Step>>) -> Result<Step, ApiError> {
    match task.await {
        Ok(result) => Ok(result?),
        Err(e) => {
            warn!(error = %e, "Generation task did not complete");
            let err = std::io::Error::other(format!("generation task failed: {e}"));
            Err(PhotomeshError::Io(err).into())
        }
    }
}

/// Prompts are recorded verbatim; only the length is bounded.
fn check_prompt(prompt: &str) -> Result<(), PhotomeshError> {
    if prompt.len() > MAX_PROMPT_LEN {
        return Err(PhotomeshError::InvalidRequest(format!(
            "prompt exceeds {MAX_PROMPT_LEN} bytes"
        )));
    }
    Ok(())
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> PhotomeshError {
    warn!(error = %err, "Malformed multipart upload");
    PhotomeshError::InvalidRequest(format!("malformed multipart body: {err}"))
}

fn missing(field: &str) -> PhotomeshError {
    PhotomeshError::InvalidRequest(format!("missing '{field}' in upload"))
}
