//! Request middleware for the Apple Yield Platform

pub mod auth;

pub use auth::{auth_middleware, require_capability, CartPrincipal, CurrentUser};
