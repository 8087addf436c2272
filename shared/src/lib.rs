//! Shared types and domain logic for the Apple Yield Platform
//!
//! This crate contains the catalog and order models, the order lifecycle
//! rules, and the yield estimator shared between the backend, the external
//! compute worker, and the browser (via WASM).

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::*;
