//! Database models for the Apple Yield Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
