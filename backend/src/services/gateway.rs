//! Async result gateway
//!
//! Counterpart of the external compute service: it pulls the order payload
//! from here and posts the estimate back. Both operations are guarded on
//! the order still being submitted, which makes result delivery idempotent:
//! a second delivery observes the finished status and gets a Conflict.

use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use shared::{ComputePayload, ComputePayloadItem, OrderStatus};

/// Gateway service for the external compute round trip
#[derive(Clone)]
pub struct GatewayService {
    db: PgPool,
}

impl GatewayService {
    /// Create a new GatewayService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Build the estimation payload for a submitted order: each indicator
    /// joined with its month's reference conditions. Numbers travel as
    /// exact decimal strings (see [`ComputePayloadItem`]).
    pub async fn payload(&self, order_id: i32) -> AppResult<ComputePayload> {
        let status = self.order_status(order_id).await?;
        if status != OrderStatus::Submitted {
            return Err(AppError::wrong_state(
                "order",
                status.as_str(),
                "submitted",
            ));
        }

        let rows = sqlx::query_as::<_, (i32, Decimal, Decimal, i32, Decimal, Decimal, Option<String>)>(
            r#"
            SELECT i.month_id, m.base_yield, m.ideal_temp, m.ideal_precip,
                   i.avg_temp, i.sum_precipitation, i.comment
            FROM order_indicators i
            JOIN months m ON m.id = i.month_id
            WHERE i.order_id = $1
            ORDER BY i.month_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ComputePayload {
            order_id,
            items: rows
                .into_iter()
                .map(
                    |(month_id, base_yield, ideal_temp, ideal_precip, avg_temp, sum_precipitation, comment)| {
                        ComputePayloadItem {
                            month_id,
                            base_yield,
                            ideal_temp,
                            ideal_precip: Decimal::from(ideal_precip),
                            avg_temp,
                            sum_precipitation,
                            comment,
                        }
                    },
                )
                .collect(),
        })
    }

    /// Accept the computed estimate and finish the order atomically.
    ///
    /// The row lock serializes this against concurrent moderation and
    /// duplicate callbacks; whoever arrives second sees a status other than
    /// submitted and is rejected without touching the stored result.
    pub async fn deliver_result(&self, order_id: i32, raw_value: &str) -> AppResult<()> {
        let value: Decimal = raw_value.trim().parse().map_err(|_| AppError::Validation {
            field: "result_value".to_string(),
            message: "Result value must be a decimal number".to_string(),
        })?;
        let mut value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(2);

        let mut tx = self.db.begin().await?;

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let status = OrderStatus::from_str(&status)
            .ok_or_else(|| AppError::Internal(format!("Unknown order status in database: {}", status)))?;
        if status != OrderStatus::Submitted {
            return Err(AppError::Conflict {
                resource: "order".to_string(),
                message: format!(
                    "result already delivered or order no longer awaiting one (status {})",
                    status
                ),
            });
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET status = 'finished', result_value = $2, finished_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(value)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn order_status(&self, order_id: i32) -> AppResult<OrderStatus> {
        let raw = sqlx::query_scalar::<_, String>("SELECT status FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        OrderStatus::from_str(&raw)
            .ok_or_else(|| AppError::Internal(format!("Unknown order status in database: {}", raw)))
    }
}
