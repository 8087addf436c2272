//! HTTP handlers for the Apple Yield Platform

pub mod auth;
pub mod catalog;
pub mod gateway;
pub mod health;
pub mod order;

pub use auth::*;
pub use catalog::*;
pub use gateway::*;
pub use health::*;
pub use order::*;
