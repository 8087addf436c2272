//! Route definitions for the Apple Yield Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes())
        // Catalog months (public reads, capability-guarded writes)
        .nest("/months", month_routes())
        // Current cart (user or anonymous session)
        .route("/cart", get(handlers::view_cart))
        // Orders and their indicator line items
        .nest("/orders", order_routes())
        // Async compute gateway (shared-token guarded)
        .nest("/compute", compute_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(profile_routes())
}

/// Profile routes (protected)
fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Catalog month routes. Reads are public; writes check the catalog
/// capability inside the handlers.
fn month_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_months).post(handlers::create_month))
        .route(
            "/:month_id",
            get(handlers::get_month)
                .put(handlers::update_month)
                .delete(handlers::deactivate_month),
        )
        .route("/:month_id/image", post(handlers::upload_month_image))
        .route("/:month_id/add", post(handlers::add_month_to_cart))
}

/// Order routes. Callers are identified per request (JWT or anonymous
/// session), ownership and moderation rules live in the service.
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders))
        .route(
            "/:order_id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/:order_id/submit", put(handlers::submit_order))
        .route("/:order_id/finish", put(handlers::finish_order))
        .route("/:order_id/reject", put(handlers::reject_order))
        .route(
            "/:order_id/indicators/:month_id",
            put(handlers::update_indicator).delete(handlers::remove_indicator),
        )
}

/// Async gateway routes for the external compute worker
fn compute_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/:order_id/payload", get(handlers::pull_order_payload))
        .route("/orders/:order_id/result", post(handlers::push_order_result))
}
