//! HTTP handlers for catalog month endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::external::MediaStorage;
use crate::middleware::{require_capability, CurrentUser};
use crate::services::catalog::{CatalogService, CreateMonthInput, UpdateMonthInput};
use crate::AppState;
use shared::{Capability, Month};

/// Query parameters for the catalog listing
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
}

/// Month as served over HTTP, with a resolved image URL
#[derive(Debug, Serialize)]
pub struct MonthResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub main_value: String,
    pub base_yield: Decimal,
    pub ideal_temp: Decimal,
    pub ideal_precip: i32,
    pub temperature: Option<Decimal>,
    pub precipitation: Option<i32>,
    pub is_active: bool,
    pub image_url: String,
}

/// Response after an image upload
#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub image_key: String,
}

fn month_response(month: Month, storage: &MediaStorage) -> MonthResponse {
    let key = month.image_key.as_deref().unwrap_or("placeholder.png");
    let image_url = storage.public_url(key);
    MonthResponse {
        id: month.id,
        name: month.name,
        description: month.description,
        main_value: month.main_value,
        base_yield: month.base_yield,
        ideal_temp: month.ideal_temp,
        ideal_precip: month.ideal_precip,
        temperature: month.temperature,
        precipitation: month.precipitation,
        is_active: month.is_active,
        image_url,
    }
}

/// List active months, optionally filtered by name prefix
pub async fn list_months(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<Vec<MonthResponse>>> {
    let service = CatalogService::new(state.db);
    let storage = MediaStorage::from_config(&state.config.storage);
    let months = service.list_active(query.q.as_deref()).await?;
    Ok(Json(
        months
            .into_iter()
            .map(|m| month_response(m, &storage))
            .collect(),
    ))
}

/// Get a month by ID
pub async fn get_month(
    State(state): State<AppState>,
    Path(month_id): Path<i32>,
) -> AppResult<Json<MonthResponse>> {
    let service = CatalogService::new(state.db);
    let storage = MediaStorage::from_config(&state.config.storage);
    let month = service.get(month_id).await?;
    Ok(Json(month_response(month, &storage)))
}

/// Create a catalog month (privileged)
pub async fn create_month(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMonthInput>,
) -> AppResult<Json<MonthResponse>> {
    require_capability(&current_user.0, Capability::ManageCatalog)?;
    let service = CatalogService::new(state.db);
    let storage = MediaStorage::from_config(&state.config.storage);
    let month = service.create(input).await?;
    Ok(Json(month_response(month, &storage)))
}

/// Update a catalog month (privileged)
pub async fn update_month(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(month_id): Path<i32>,
    Json(input): Json<UpdateMonthInput>,
) -> AppResult<Json<MonthResponse>> {
    require_capability(&current_user.0, Capability::ManageCatalog)?;
    let service = CatalogService::new(state.db);
    let storage = MediaStorage::from_config(&state.config.storage);
    let month = service.update(month_id, input).await?;
    Ok(Json(month_response(month, &storage)))
}

/// Deactivate a catalog month (privileged); the row is kept for history
pub async fn deactivate_month(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(month_id): Path<i32>,
) -> AppResult<StatusCode> {
    require_capability(&current_user.0, Capability::ManageCatalog)?;
    let service = CatalogService::new(state.db);
    let storage = MediaStorage::from_config(&state.config.storage);
    service.deactivate(month_id, &storage).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a month image (privileged)
pub async fn upload_month_image(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(month_id): Path<i32>,
    mut multipart: Multipart,
) -> AppResult<Json<ImageUploadResponse>> {
    require_capability(&current_user.0, Capability::ManageCatalog)?;

    let mut upload: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation {
            field: "file".to_string(),
            message: format!("Invalid multipart body: {}", e),
        }
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("image.jpg").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation {
                    field: "file".to_string(),
                    message: format!("Failed to read upload: {}", e),
                })?
                .to_vec();
            upload = Some((filename, content_type, bytes));
        }
    }

    let (filename, content_type, bytes) = upload.ok_or_else(|| AppError::Validation {
        field: "file".to_string(),
        message: "file is required".to_string(),
    })?;

    let service = CatalogService::new(state.db);
    let storage = MediaStorage::from_config(&state.config.storage);
    let image_key = service
        .attach_image(month_id, &storage, &filename, &content_type, bytes)
        .await?;

    Ok(Json(ImageUploadResponse { image_key }))
}
