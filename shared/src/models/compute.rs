//! Wire types exchanged with the external compute service
//!
//! Numeric fields travel as exact decimal strings; a binary-float round
//! trip would change persisted results. Nullable fields serialize as
//! explicit nulls so the worker sees the full row shape.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payload the compute worker pulls before estimating an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputePayload {
    pub order_id: i32,
    pub items: Vec<ComputePayloadItem>,
}

/// One indicator row joined with its month's reference conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputePayloadItem {
    pub month_id: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_yield: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ideal_temp: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ideal_precip: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_temp: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub sum_precipitation: Decimal,
    pub comment: Option<String>,
}

/// Callback body the compute worker posts once the estimate is ready.
/// The value is kept as a string until the gateway parses it, so a
/// malformed number surfaces as a validation error rather than a 422.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeResultDelivery {
    pub result_value: String,
}
