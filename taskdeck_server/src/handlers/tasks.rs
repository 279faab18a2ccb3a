use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use taskdeck::{Task, TaskPayload};

use crate::{error::ApiError, extract::AuthUser, state::AppState};

/// GET /api/tasks
pub async fn list(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list(&identity).await?))
}

/// POST /api/tasks
pub async fn create(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(payload) = payload?;
    let task = state.tasks.create(&identity, payload.into_draft()?).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/{id}
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.tasks.get(&identity, &id).await?))
}

/// PUT /api/tasks/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(payload) = payload?;
    let task = state
        .tasks
        .update(&identity, &id, payload.into_patch()?)
        .await?;
    Ok(Json(task))
}

/// DELETE /api/tasks/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.tasks.delete(&identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
