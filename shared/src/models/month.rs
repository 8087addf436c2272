//! Catalog month models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog month describing ideal growing conditions for apple orchards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Month {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// Free-form display text (days in month, solar radiation, etc.)
    pub main_value: String,
    /// Object-storage key of the month's image, if one is attached
    pub image_key: Option<String>,
    /// Maximum attainable yield contribution for this month
    pub base_yield: Decimal,
    /// Reference average temperature used by the estimator
    pub ideal_temp: Decimal,
    /// Reference total precipitation used by the estimator
    pub ideal_precip: i32,
    /// Informational climate stat, not used in estimation
    pub temperature: Option<Decimal>,
    /// Informational climate stat, not used in estimation
    pub precipitation: Option<i32>,
    /// Soft-delete flag; deactivated months stay referenced by old orders
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact month representation for catalog listings and order line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthSummary {
    pub id: i32,
    pub name: String,
    pub main_value: String,
    pub image_key: Option<String>,
}

impl From<&Month> for MonthSummary {
    fn from(m: &Month) -> Self {
        MonthSummary {
            id: m.id,
            name: m.name.clone(),
            main_value: m.main_value.clone(),
            image_key: m.image_key.clone(),
        }
    }
}
