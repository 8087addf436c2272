//! Catalog service for managing growing months
//!
//! Months are read-mostly reference data. They are never hard-deleted:
//! indicator rows on historical orders keep referencing them, so removal
//! only flips the active flag and drops the attached image.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::external::storage::{generate_image_key, MediaStorage};
use shared::{validate_month_fields, Month};

/// Catalog service for month reference data
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Database row for a month
#[derive(Debug, sqlx::FromRow)]
struct MonthRow {
    id: i32,
    name: String,
    description: String,
    main_value: String,
    image_key: Option<String>,
    base_yield: Decimal,
    ideal_temp: Decimal,
    ideal_precip: i32,
    temperature: Option<Decimal>,
    precipitation: Option<i32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MonthRow> for Month {
    fn from(row: MonthRow) -> Self {
        Month {
            id: row.id,
            name: row.name,
            description: row.description,
            main_value: row.main_value,
            image_key: row.image_key,
            base_yield: row.base_yield,
            ideal_temp: row.ideal_temp,
            ideal_precip: row.ideal_precip,
            temperature: row.temperature,
            precipitation: row.precipitation,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a month
#[derive(Debug, Deserialize)]
pub struct CreateMonthInput {
    pub name: String,
    pub description: String,
    pub main_value: String,
    pub base_yield: Decimal,
    pub ideal_temp: Decimal,
    pub ideal_precip: i32,
    pub temperature: Option<Decimal>,
    pub precipitation: Option<i32>,
}

/// Input for updating a month; only provided fields change
#[derive(Debug, Deserialize)]
pub struct UpdateMonthInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub main_value: Option<String>,
    pub base_yield: Option<Decimal>,
    pub ideal_temp: Option<Decimal>,
    pub ideal_precip: Option<i32>,
    pub temperature: Option<Decimal>,
    pub precipitation: Option<i32>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List active months, optionally filtered by case-insensitive name prefix
    pub async fn list_active(&self, prefix: Option<&str>) -> AppResult<Vec<Month>> {
        let prefix = prefix.map(str::trim).filter(|p| !p.is_empty());

        let rows = sqlx::query_as::<_, MonthRow>(
            r#"
            SELECT id, name, description, main_value, image_key, base_yield,
                   ideal_temp, ideal_precip, temperature, precipitation,
                   is_active, created_at, updated_at
            FROM months
            WHERE is_active = TRUE
              AND ($1::TEXT IS NULL OR name ILIKE $1 || '%')
            ORDER BY id
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a month by ID
    pub async fn get(&self, month_id: i32) -> AppResult<Month> {
        let row = sqlx::query_as::<_, MonthRow>(
            r#"
            SELECT id, name, description, main_value, image_key, base_yield,
                   ideal_temp, ideal_precip, temperature, precipitation,
                   is_active, created_at, updated_at
            FROM months
            WHERE id = $1
            "#,
        )
        .bind(month_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Month".to_string()))?;

        Ok(row.into())
    }

    /// Create a new catalog month
    pub async fn create(&self, input: CreateMonthInput) -> AppResult<Month> {
        validate_month_fields(&input.name, input.base_yield, input.ideal_precip).map_err(
            |message| AppError::Validation {
                field: "month".to_string(),
                message: message.to_string(),
            },
        )?;

        let row = sqlx::query_as::<_, MonthRow>(
            r#"
            INSERT INTO months (name, description, main_value, base_yield,
                                ideal_temp, ideal_precip, temperature, precipitation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, description, main_value, image_key, base_yield,
                      ideal_temp, ideal_precip, temperature, precipitation,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.main_value)
        .bind(input.base_yield)
        .bind(input.ideal_temp)
        .bind(input.ideal_precip)
        .bind(input.temperature)
        .bind(input.precipitation)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update to a month
    pub async fn update(&self, month_id: i32, input: UpdateMonthInput) -> AppResult<Month> {
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Month name is required".to_string(),
                });
            }
        }
        if matches!(input.base_yield, Some(v) if v < Decimal::ZERO) {
            return Err(AppError::Validation {
                field: "base_yield".to_string(),
                message: "Base yield cannot be negative".to_string(),
            });
        }
        if matches!(input.ideal_precip, Some(v) if v < 0) {
            return Err(AppError::Validation {
                field: "ideal_precip".to_string(),
                message: "Ideal precipitation cannot be negative".to_string(),
            });
        }

        let row = sqlx::query_as::<_, MonthRow>(
            r#"
            UPDATE months
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                main_value = COALESCE($4, main_value),
                base_yield = COALESCE($5, base_yield),
                ideal_temp = COALESCE($6, ideal_temp),
                ideal_precip = COALESCE($7, ideal_precip),
                temperature = COALESCE($8, temperature),
                precipitation = COALESCE($9, precipitation),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, main_value, image_key, base_yield,
                      ideal_temp, ideal_precip, temperature, precipitation,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(month_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.main_value)
        .bind(input.base_yield)
        .bind(input.ideal_temp)
        .bind(input.ideal_precip)
        .bind(input.temperature)
        .bind(input.precipitation)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Month".to_string()))?;

        Ok(row.into())
    }

    /// Soft-delete: clear the image reference and flip the active flag.
    /// The row stays because historical orders reference it.
    pub async fn deactivate(&self, month_id: i32, storage: &MediaStorage) -> AppResult<()> {
        let image_key = sqlx::query_scalar::<_, Option<String>>(
            "SELECT image_key FROM months WHERE id = $1",
        )
        .bind(month_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Month".to_string()))?;

        sqlx::query(
            "UPDATE months SET is_active = FALSE, image_key = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(month_id)
        .execute(&self.db)
        .await?;

        if let Some(key) = image_key {
            storage.delete_if_exists(&key).await;
        }

        Ok(())
    }

    /// Attach an image, replacing (and best-effort deleting) any previous one
    pub async fn attach_image(
        &self,
        month_id: i32,
        storage: &MediaStorage,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        let month = self.get(month_id).await?;

        let new_key = generate_image_key(&month.name, filename);
        if let Some(old_key) = &month.image_key {
            storage.delete_if_exists(old_key).await;
        }

        let saved_key = storage.save(&new_key, bytes, content_type).await?;

        sqlx::query("UPDATE months SET image_key = $2, updated_at = NOW() WHERE id = $1")
            .bind(month_id)
            .bind(&saved_key)
            .execute(&self.db)
            .await?;

        Ok(saved_key)
    }
}
