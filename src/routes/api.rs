// Handlers for the filter session API

use axum::{
    extract::{Json as JsonExtract, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    engine::{FilterCommand, RenderInstruction},
    error::AppError,
    session::{SessionHandle, SessionId},
    AppState,
};

// --- Request Structs ---

#[derive(Deserialize, Debug)]
pub struct OpenSessionRequest {
    // Location of the page view, e.g. /catalog/used/bmw?salon_id=4
    url: String,
    // Server-rendered catalog page the filter lives in
    html: String,
}

// --- Response Wrappers ---

#[derive(Serialize)]
struct OpenSessionResponse {
    id: SessionId,
    location: String,
    instructions: Vec<RenderInstruction>,
}

async fn session(app_state: &AppState, id: SessionId) -> Result<SessionHandle, AppError> {
    app_state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Filter session {} not found", id)))
}

// --- API Handlers ---

pub async fn open_session(
    State(app_state): State<AppState>,
    JsonExtract(request): JsonExtract<OpenSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("[HANDLER] POST /api/sessions - Opening session for {}", request.url);
    let (id, update) = app_state.sessions.open(&request.url, &request.html).await?;
    Ok((
        StatusCode::CREATED,
        Json(OpenSessionResponse { id, location: update.location, instructions: update.instructions }),
    ))
}

pub async fn send_command(
    State(app_state): State<AppState>,
    Path(id): Path<SessionId>,
    JsonExtract(command): JsonExtract<FilterCommand>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!("[HANDLER] POST /api/sessions/{}/commands - {:?}", id, command);
    let ack = session(&app_state, id).await?.send(command).await?;
    Ok(Json(ack))
}

pub async fn get_updates(
    State(app_state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let update = session(&app_state, id).await?.drain().await?;
    tracing::debug!(
        "[HANDLER] GET /api/sessions/{}/updates - {} instructions",
        id,
        update.instructions.len()
    );
    Ok(Json(update))
}

pub async fn close_session(
    State(app_state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.sessions.close(id).await {
        return Err(AppError::NotFound(format!("Filter session {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
