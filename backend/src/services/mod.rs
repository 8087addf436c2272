//! Business logic services for the Apple Yield Platform

pub mod auth;
pub mod catalog;
pub mod gateway;
pub mod order;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use gateway::GatewayService;
pub use order::OrderService;
