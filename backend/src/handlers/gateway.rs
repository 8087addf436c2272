//! HTTP handlers for the async compute gateway
//!
//! These endpoints are called by the external compute worker, not by
//! browsers, and are authenticated with a shared-secret token header.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::error::{AppError, AppResult};
use crate::services::gateway::GatewayService;
use crate::AppState;
use shared::{ComputePayload, ComputeResultDelivery};

/// Header carrying the shared compute token
pub const COMPUTE_TOKEN_HEADER: &str = "x-compute-token";

fn verify_compute_token(headers: &HeaderMap, expected: &str) -> AppResult<()> {
    let provided = headers
        .get(COMPUTE_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(token) if token == expected => Ok(()),
        _ => Err(AppError::Unauthorized(
            "Missing or invalid compute token".to_string(),
        )),
    }
}

/// Payload pull: indicators joined with catalog reference conditions
pub async fn pull_order_payload(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    headers: HeaderMap,
) -> AppResult<Json<ComputePayload>> {
    verify_compute_token(&headers, &state.config.compute.shared_token)?;

    let service = GatewayService::new(state.db);
    let payload = service.payload(order_id).await?;
    Ok(Json(payload))
}

/// Result push: finishes the order exactly once
pub async fn push_order_result(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    headers: HeaderMap,
    Json(body): Json<ComputeResultDelivery>,
) -> AppResult<StatusCode> {
    verify_compute_token(&headers, &state.config.compute.shared_token)?;

    let service = GatewayService::new(state.db);
    service.deliver_result(order_id, &body.result_value).await?;
    Ok(StatusCode::NO_CONTENT)
}
