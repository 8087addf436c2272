//! Order service: cart assembly, lifecycle transitions and moderation
//!
//! Every mutating transition runs read-guard-write inside one transaction
//! holding a row lock on the order, so concurrent requests for the same
//! order serialize and the loser sees the already-changed status. Persisted
//! state is the source of truth; nothing is cached between requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::compute::ComputeClient;
use crate::middleware::CartPrincipal;
use shared::{
    authorize, validate_indicator_values, validate_submission, Actor, Capability, Indicator,
    Location, MonthSummary, Order, OrderStatus, Person, TransitionError,
};

/// Order service for carts and moderated lifecycle transitions
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Database row for an order
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    status: String,
    created_by: Uuid,
    moderator: Option<Uuid>,
    location: Option<String>,
    person: Option<String>,
    result_value: Option<Decimal>,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            status: parse_status(&row.status)?,
            created_by: row.created_by,
            moderator: row.moderator,
            location: parse_location(row.location.as_deref())?,
            person: parse_person(row.person.as_deref())?,
            result_value: row.result_value,
            created_at: row.created_at,
            submitted_at: row.submitted_at,
            finished_at: row.finished_at,
        })
    }
}

/// Database row for an order listing entry
#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i32,
    status: String,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    created_by_email: Option<String>,
    moderator_email: Option<String>,
    location: Option<String>,
    person: Option<String>,
    result_value: Option<Decimal>,
}

/// Order as it appears in moderation listings
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_by_email: Option<String>,
    pub moderator_email: Option<String>,
    pub location: Option<Location>,
    pub person: Option<Person>,
    pub result_value: Option<Decimal>,
}

/// Full order view with line items
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub person: Option<Person>,
    pub result_value: Option<Decimal>,
    pub items: Vec<OrderItem>,
}

/// One line item with its month summary
#[derive(Debug, Serialize)]
pub struct OrderItem {
    pub month: MonthSummary,
    pub avg_temp: Decimal,
    pub sum_precipitation: Decimal,
    pub comment: Option<String>,
}

/// Current cart state
#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub order_id: Option<i32>,
    pub items_count: i64,
}

/// Listing filters for moderation views
#[derive(Debug, Default, Deserialize)]
pub struct OrderListFilter {
    pub status: Option<String>,
    pub submitted_from: Option<DateTime<Utc>>,
    pub submitted_to: Option<DateTime<Utc>>,
}

/// Partial update of an order's categorical fields
#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    pub location: Option<Location>,
    pub person: Option<Person>,
}

/// Partial update of an indicator row
#[derive(Debug, Deserialize)]
pub struct UpdateIndicatorInput {
    pub avg_temp: Option<Decimal>,
    pub sum_precipitation: Option<Decimal>,
    pub comment: Option<String>,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve the acting identity for cart and order operations.
    ///
    /// Logged-in users act as themselves. Anonymous callers are materialized
    /// as one user row per session id, so concurrent sessions never share a
    /// cart.
    pub async fn resolve_actor(&self, principal: &CartPrincipal) -> AppResult<Actor> {
        match principal {
            CartPrincipal::User(actor) => Ok(*actor),
            CartPrincipal::Session(session_id) => {
                let user_id = self.resolve_session_user(*session_id).await?;
                Ok(Actor {
                    user_id,
                    is_manager: false,
                    is_admin: false,
                })
            }
        }
    }

    async fn resolve_session_user(&self, session_id: Uuid) -> AppResult<Uuid> {
        let existing =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE session_key = $1")
                .bind(session_id)
                .fetch_optional(&self.db)
                .await?;
        if let Some(id) = existing {
            return Ok(id);
        }

        // Concurrent first requests for the same session race on the unique
        // session_key; the loser falls through to the re-select.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (is_anonymous, session_key)
            VALUES (TRUE, $1)
            ON CONFLICT (session_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;

        match inserted {
            Some(id) => Ok(id),
            None => Ok(
                sqlx::query_scalar("SELECT id FROM users WHERE session_key = $1")
                    .bind(session_id)
                    .fetch_one(&self.db)
                    .await?,
            ),
        }
    }

    /// Add a month to the caller's draft order, creating the draft if needed.
    /// Adding the same month twice leaves the existing row untouched.
    pub async fn add_month(
        &self,
        principal: &CartPrincipal,
        month_id: i32,
    ) -> AppResult<CartSummary> {
        let is_active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM months WHERE id = $1")
            .bind(month_id)
            .fetch_optional(&self.db)
            .await?;
        if !matches!(is_active, Some(true)) {
            return Err(AppError::NotFound("Month".to_string()));
        }

        let owner = self.resolve_actor(principal).await?.user_id;

        let mut tx = self.db.begin().await?;
        let order_id = Self::find_or_create_draft(&mut tx, owner).await?;

        sqlx::query(
            r#"
            INSERT INTO order_indicators (order_id, month_id)
            VALUES ($1, $2)
            ON CONFLICT (order_id, month_id) DO NOTHING
            "#,
        )
        .bind(order_id)
        .bind(month_id)
        .execute(&mut *tx)
        .await?;

        let items_count = Self::count_items(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(CartSummary {
            order_id: Some(order_id),
            items_count,
        })
    }

    /// Current draft order id and item count for the caller
    pub async fn current_cart(&self, principal: &CartPrincipal) -> AppResult<CartSummary> {
        let owner = self.resolve_actor(principal).await?.user_id;

        let order_id = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM orders WHERE created_by = $1 AND status = 'draft'",
        )
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;

        let items_count = match order_id {
            Some(id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM order_indicators WHERE order_id = $1",
                )
                .bind(id)
                .fetch_one(&self.db)
                .await?
            }
            None => 0,
        };

        Ok(CartSummary {
            order_id,
            items_count,
        })
    }

    /// List non-draft, non-deleted orders. Plain users see their own;
    /// moderators see everything.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &OrderListFilter,
    ) -> AppResult<Vec<OrderSummary>> {
        let status = filter
            .status
            .as_deref()
            .map(|raw| {
                OrderStatus::from_str(raw).ok_or_else(|| AppError::Validation {
                    field: "status".to_string(),
                    message: format!("Unknown status: {}", raw),
                })
            })
            .transpose()?;

        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r#"
            SELECT o.id, o.status, o.created_at, o.submitted_at, o.finished_at,
                   cu.email AS created_by_email, mu.email AS moderator_email,
                   o.location, o.person, o.result_value
            FROM orders o
            JOIN users cu ON cu.id = o.created_by
            LEFT JOIN users mu ON mu.id = o.moderator
            WHERE o.status NOT IN ('draft', 'deleted')
              AND ($1::TEXT IS NULL OR o.status = $1)
              AND ($2::TIMESTAMPTZ IS NULL OR o.submitted_at >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR o.submitted_at <= $3)
              AND ($4::BOOLEAN OR o.created_by = $5)
            ORDER BY o.submitted_at DESC NULLS LAST, o.id DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(filter.submitted_from)
        .bind(filter.submitted_to)
        .bind(actor.is_privileged())
        .bind(actor.user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderSummary {
                    id: row.id,
                    status: parse_status(&row.status)?,
                    created_at: row.created_at,
                    submitted_at: row.submitted_at,
                    finished_at: row.finished_at,
                    created_by_email: row.created_by_email,
                    moderator_email: row.moderator_email,
                    location: parse_location(row.location.as_deref())?,
                    person: parse_person(row.person.as_deref())?,
                    result_value: row.result_value,
                })
            })
            .collect()
    }

    /// Get an order with its items; deleted orders are hidden
    pub async fn get(&self, actor: &Actor, order_id: i32) -> AppResult<OrderDetail> {
        let order = self.fetch_order(order_id).await?;
        Self::check_access(actor, &order)?;
        self.detail(order).await
    }

    /// Patch location/person; only in draft or submitted
    pub async fn update(
        &self,
        actor: &Actor,
        order_id: i32,
        input: UpdateOrderInput,
    ) -> AppResult<OrderDetail> {
        let mut tx = self.db.begin().await?;
        let order = Self::lock_order(&mut tx, order_id).await?;
        Self::check_access(actor, &order)?;

        if !order.status.allows_item_edits() {
            return Err(AppError::wrong_state(
                "order",
                order.status.as_str(),
                "draft or submitted",
            ));
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET location = COALESCE($2, location),
                person = COALESCE($3, person)
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(input.location.map(|l| l.as_str()))
        .bind(input.person.map(|p| p.as_str()))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get(actor, order_id).await
    }

    /// Submit a draft for moderation
    pub async fn submit(&self, actor: &Actor, order_id: i32) -> AppResult<OrderDetail> {
        let mut tx = self.db.begin().await?;
        let order = Self::lock_order(&mut tx, order_id).await?;
        Self::check_access(actor, &order)?;

        order
            .status
            .transition_to(OrderStatus::Submitted)
            .map_err(conflict)?;

        let items_count = Self::count_items(&mut tx, order_id).await?;
        validate_submission(items_count, order.location, order.person).map_err(|message| {
            AppError::Validation {
                field: "order".to_string(),
                message: message.to_string(),
            }
        })?;

        sqlx::query("UPDATE orders SET status = 'submitted', submitted_at = NOW() WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.get(actor, order_id).await
    }

    /// Moderate a submitted order: record the moderator and hand the
    /// estimation off to the external compute service.
    ///
    /// The dispatch happens before the transaction commits, so an
    /// unreachable compute service rolls the moderator assignment back and
    /// the order stays submitted for a retry. The status flips to finished
    /// only when the worker delivers the result through the gateway.
    pub async fn finish(
        &self,
        actor: &Actor,
        order_id: i32,
        compute: &ComputeClient,
        callback_base_url: &str,
    ) -> AppResult<OrderDetail> {
        if !authorize(actor, Capability::ModerateOrders) {
            return Err(AppError::Forbidden(
                "Moderator privileges required".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;
        let order = Self::lock_order(&mut tx, order_id).await?;

        if order.status != OrderStatus::Submitted {
            return Err(AppError::wrong_state(
                "order",
                order.status.as_str(),
                "submitted",
            ));
        }
        if order.moderator.is_some() {
            return Err(AppError::Conflict {
                resource: "order".to_string(),
                message: "Estimation is already dispatched for this order".to_string(),
            });
        }

        sqlx::query("UPDATE orders SET moderator = $2 WHERE id = $1")
            .bind(order_id)
            .bind(actor.user_id)
            .execute(&mut *tx)
            .await?;

        let callback_url = format!(
            "{}/api/v1/compute/orders/{}/result",
            callback_base_url.trim_end_matches('/'),
            order_id
        );

        if let Err(err) = compute.dispatch(order_id, &callback_url).await {
            tx.rollback().await?;
            return Err(err);
        }

        tx.commit().await?;
        self.get(actor, order_id).await
    }

    /// Reject a submitted order
    pub async fn reject(&self, actor: &Actor, order_id: i32) -> AppResult<OrderDetail> {
        if !authorize(actor, Capability::ModerateOrders) {
            return Err(AppError::Forbidden(
                "Moderator privileges required".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;
        let order = Self::lock_order(&mut tx, order_id).await?;

        order
            .status
            .transition_to(OrderStatus::Rejected)
            .map_err(conflict)?;

        sqlx::query(
            r#"
            UPDATE orders
            SET status = 'rejected', moderator = $2, finished_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(actor.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get(actor, order_id).await
    }

    /// Soft-delete a draft or submitted order; rows persist, the status
    /// flip alone gates further access.
    pub async fn delete(&self, actor: &Actor, order_id: i32) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let order = Self::lock_order(&mut tx, order_id).await?;
        Self::check_access(actor, &order)?;

        order
            .status
            .transition_to(OrderStatus::Deleted)
            .map_err(conflict)?;

        sqlx::query("UPDATE orders SET status = 'deleted' WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Patch one indicator row's observations
    pub async fn update_indicator(
        &self,
        actor: &Actor,
        order_id: i32,
        month_id: i32,
        input: UpdateIndicatorInput,
    ) -> AppResult<Indicator> {
        if let Some(precipitation) = input.sum_precipitation {
            validate_indicator_values(precipitation).map_err(|message| AppError::Validation {
                field: "sum_precipitation".to_string(),
                message: message.to_string(),
            })?;
        }

        let mut tx = self.db.begin().await?;
        let order = Self::lock_order(&mut tx, order_id).await?;
        Self::check_access(actor, &order)?;

        if !order.status.allows_item_edits() {
            return Err(AppError::wrong_state(
                "order",
                order.status.as_str(),
                "draft or submitted",
            ));
        }

        let row = sqlx::query_as::<_, (Decimal, Decimal, Option<String>)>(
            r#"
            UPDATE order_indicators
            SET avg_temp = COALESCE($3, avg_temp),
                sum_precipitation = COALESCE($4, sum_precipitation),
                comment = COALESCE($5, comment),
                updated_at = NOW()
            WHERE order_id = $1 AND month_id = $2
            RETURNING avg_temp, sum_precipitation, comment
            "#,
        )
        .bind(order_id)
        .bind(month_id)
        .bind(input.avg_temp)
        .bind(input.sum_precipitation)
        .bind(&input.comment)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Indicator".to_string()))?;

        tx.commit().await?;

        Ok(Indicator {
            order_id,
            month_id,
            avg_temp: row.0,
            sum_precipitation: row.1,
            comment: row.2,
        })
    }

    /// Remove one indicator row
    pub async fn remove_indicator(
        &self,
        actor: &Actor,
        order_id: i32,
        month_id: i32,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let order = Self::lock_order(&mut tx, order_id).await?;
        Self::check_access(actor, &order)?;

        if !order.status.allows_item_edits() {
            return Err(AppError::wrong_state(
                "order",
                order.status.as_str(),
                "draft or submitted",
            ));
        }

        let result =
            sqlx::query("DELETE FROM order_indicators WHERE order_id = $1 AND month_id = $2")
                .bind(order_id)
                .bind(month_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Indicator".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Find the caller's draft order or create one, race-free: the partial
    /// unique index on (created_by) WHERE status = 'draft' backstops the
    /// re-check inside the transaction.
    async fn find_or_create_draft(
        tx: &mut Transaction<'_, Postgres>,
        owner: Uuid,
    ) -> AppResult<i32> {
        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM orders WHERE created_by = $1 AND status = 'draft' FOR UPDATE",
        )
        .bind(owner)
        .fetch_optional(&mut **tx)
        .await?;
        if let Some(id) = existing {
            return Ok(id);
        }

        let inserted = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO orders (created_by, status)
            VALUES ($1, 'draft')
            ON CONFLICT (created_by) WHERE status = 'draft' DO NOTHING
            RETURNING id
            "#,
        )
        .bind(owner)
        .fetch_optional(&mut **tx)
        .await?;

        match inserted {
            Some(id) => Ok(id),
            None => Ok(sqlx::query_scalar(
                "SELECT id FROM orders WHERE created_by = $1 AND status = 'draft'",
            )
            .bind(owner)
            .fetch_one(&mut **tx)
            .await?),
        }
    }

    /// Lock the order row for the rest of the transaction
    async fn lock_order(tx: &mut Transaction<'_, Postgres>, order_id: i32) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, status, created_by, moderator, location, person,
                   result_value, created_at, submitted_at, finished_at
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let order: Order = row.try_into()?;
        if order.status == OrderStatus::Deleted {
            return Err(AppError::NotFound("Order".to_string()));
        }
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i32) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, status, created_by, moderator, location, person,
                   result_value, created_at, submitted_at, finished_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let order: Order = row.try_into()?;
        if order.status == OrderStatus::Deleted {
            return Err(AppError::NotFound("Order".to_string()));
        }
        Ok(order)
    }

    async fn count_items(tx: &mut Transaction<'_, Postgres>, order_id: i32) -> AppResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM order_indicators WHERE order_id = $1",
            )
            .bind(order_id)
            .fetch_one(&mut **tx)
            .await?,
        )
    }

    fn check_access(actor: &Actor, order: &Order) -> AppResult<()> {
        if actor.can_access_order(order.created_by) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have access to this order".to_string(),
            ))
        }
    }

    async fn detail(&self, order: Order) -> AppResult<OrderDetail> {
        let items = sqlx::query_as::<_, (i32, String, String, Option<String>, Decimal, Decimal, Option<String>)>(
            r#"
            SELECT i.month_id, m.name, m.main_value, m.image_key,
                   i.avg_temp, i.sum_precipitation, i.comment
            FROM order_indicators i
            JOIN months m ON m.id = i.month_id
            WHERE i.order_id = $1
            ORDER BY i.month_id
            "#,
        )
        .bind(order.id)
        .fetch_all(&self.db)
        .await?;

        Ok(OrderDetail {
            id: order.id,
            status: order.status,
            created_at: order.created_at,
            submitted_at: order.submitted_at,
            finished_at: order.finished_at,
            location: order.location,
            person: order.person,
            result_value: order.result_value,
            items: items
                .into_iter()
                .map(|(month_id, name, main_value, image_key, avg_temp, sum_precipitation, comment)| {
                    OrderItem {
                        month: MonthSummary {
                            id: month_id,
                            name,
                            main_value,
                            image_key,
                        },
                        avg_temp,
                        sum_precipitation,
                        comment,
                    }
                })
                .collect(),
        })
    }
}

fn conflict(err: TransitionError) -> AppError {
    AppError::Conflict {
        resource: "order".to_string(),
        message: err.to_string(),
    }
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    OrderStatus::from_str(raw)
        .ok_or_else(|| AppError::Internal(format!("Unknown order status in database: {}", raw)))
}

fn parse_location(raw: Option<&str>) -> AppResult<Option<Location>> {
    raw.map(|s| {
        Location::from_str(s)
            .ok_or_else(|| AppError::Internal(format!("Unknown location in database: {}", s)))
    })
    .transpose()
}

fn parse_person(raw: Option<&str>) -> AppResult<Option<Person>> {
    raw.map(|s| {
        Person::from_str(s)
            .ok_or_else(|| AppError::Internal(format!("Unknown person in database: {}", s)))
    })
    .transpose()
}
