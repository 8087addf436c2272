//! Domain models for the Apple Yield Platform

mod compute;
mod estimate;
mod month;
mod order;
mod user;

pub use compute::*;
pub use estimate::*;
pub use month::*;
pub use order::*;
pub use user::*;
