//! Clients for external collaborators

pub mod compute;
pub mod storage;

pub use compute::ComputeClient;
pub use storage::MediaStorage;
