use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use taskdeck::{
    LoginRequest, LoginResponse, PasswordChange, ProfileUpdate, RegisterRequest, UserSummary,
};

use crate::{error::ApiError, extract::AuthUser, state::AppState};

/// POST /api/user/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let Json(request) = payload?;
    let user = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/user/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.auth.login(request).await?))
}

/// GET /api/user/me
pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserSummary>, ApiError> {
    Ok(Json(state.auth.current_user(&identity).await?))
}

/// PUT /api/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserSummary>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(state.auth.update_profile(&identity, update).await?))
}

/// PUT /api/user/password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(change) = payload?;
    state.auth.change_password(&identity, change).await?;
    Ok(StatusCode::NO_CONTENT)
}
