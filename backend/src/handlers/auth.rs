//! HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{
    AuthService, AuthTokens, RegisterInput, RegisterResponse, UpdateProfileInput, UserProfile,
};
use crate::AppState;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Refresh request body
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.register(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(&input.email, &input.password).await?;
    Ok(Json(tokens))
}

/// Rotate a refresh token into a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh_token(&input.refresh_token).await?;
    Ok(Json(tokens))
}

/// Get the caller's profile
pub async fn get_me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserProfile>> {
    let service = AuthService::new(state.db, &state.config);
    let profile = service.me(current_user.0.user_id).await?;
    Ok(Json(profile))
}

/// Patch the caller's profile
pub async fn update_me(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<Json<UserProfile>> {
    let service = AuthService::new(state.db, &state.config);
    let profile = service.update_me(current_user.0.user_id, input).await?;
    Ok(Json(profile))
}
