//! HTTP handlers for cart and order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::external::ComputeClient;
use crate::middleware::CartPrincipal;
use crate::services::order::{
    CartSummary, OrderDetail, OrderListFilter, OrderService, OrderSummary, UpdateIndicatorInput,
    UpdateOrderInput,
};
use crate::AppState;
use shared::Indicator;

/// Add a month to the caller's cart (idempotent per month)
pub async fn add_month_to_cart(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path(month_id): Path<i32>,
) -> AppResult<Json<CartSummary>> {
    let service = OrderService::new(state.db);
    let cart = service.add_month(&principal, month_id).await?;
    Ok(Json(cart))
}

/// View the caller's current cart
pub async fn view_cart(
    State(state): State<AppState>,
    principal: CartPrincipal,
) -> AppResult<Json<CartSummary>> {
    let service = OrderService::new(state.db);
    let cart = service.current_cart(&principal).await?;
    Ok(Json(cart))
}

/// List orders (own orders for plain users, all for moderators)
pub async fn list_orders(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Query(filter): Query<OrderListFilter>,
) -> AppResult<Json<Vec<OrderSummary>>> {
    let service = OrderService::new(state.db);
    let actor = service.resolve_actor(&principal).await?;
    let orders = service.list(&actor, &filter).await?;
    Ok(Json(orders))
}

/// Get an order with its line items
pub async fn get_order(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path(order_id): Path<i32>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db);
    let actor = service.resolve_actor(&principal).await?;
    let order = service.get(&actor, order_id).await?;
    Ok(Json(order))
}

/// Patch an order's location/person
pub async fn update_order(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path(order_id): Path<i32>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db);
    let actor = service.resolve_actor(&principal).await?;
    let order = service.update(&actor, order_id, input).await?;
    Ok(Json(order))
}

/// Soft-delete an order
pub async fn delete_order(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path(order_id): Path<i32>,
) -> AppResult<StatusCode> {
    let service = OrderService::new(state.db);
    let actor = service.resolve_actor(&principal).await?;
    service.delete(&actor, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a draft order for moderation
pub async fn submit_order(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path(order_id): Path<i32>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db);
    let actor = service.resolve_actor(&principal).await?;
    let order = service.submit(&actor, order_id).await?;
    Ok(Json(order))
}

/// Dispatch a submitted order for estimation (moderator)
pub async fn finish_order(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path(order_id): Path<i32>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    let actor = service.resolve_actor(&principal).await?;
    let compute = ComputeClient::from_config(&state.config.compute);
    let order = service
        .finish(
            &actor,
            order_id,
            &compute,
            &state.config.compute.callback_base_url,
        )
        .await?;
    Ok(Json(order))
}

/// Reject a submitted order (moderator)
pub async fn reject_order(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path(order_id): Path<i32>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db);
    let actor = service.resolve_actor(&principal).await?;
    let order = service.reject(&actor, order_id).await?;
    Ok(Json(order))
}

/// Patch one indicator row of an order
pub async fn update_indicator(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path((order_id, month_id)): Path<(i32, i32)>,
    Json(input): Json<UpdateIndicatorInput>,
) -> AppResult<Json<Indicator>> {
    let service = OrderService::new(state.db);
    let actor = service.resolve_actor(&principal).await?;
    let indicator = service
        .update_indicator(&actor, order_id, month_id, input)
        .await?;
    Ok(Json(indicator))
}

/// Remove one indicator row from an order
pub async fn remove_indicator(
    State(state): State<AppState>,
    principal: CartPrincipal,
    Path((order_id, month_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    let service = OrderService::new(state.db);
    let actor = service.resolve_actor(&principal).await?;
    service.remove_indicator(&actor, order_id, month_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
