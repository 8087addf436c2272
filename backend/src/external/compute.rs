//! Client for the external yield compute service
//!
//! The service receives an order id plus a callback address, later pulls the
//! order payload and posts the estimate back through the async gateway.

use reqwest::Client;
use serde::Serialize;

use crate::config::ComputeConfig;
use crate::error::{AppError, AppResult};

/// Client for the compute dispatch endpoint
#[derive(Clone)]
pub struct ComputeClient {
    endpoint: String,
    http_client: Client,
}

/// Dispatch request body
#[derive(Debug, Serialize)]
pub struct DispatchRequest {
    pub order_id: i32,
    pub callback_url: String,
}

impl ComputeClient {
    /// Create a new compute client with a bounded request timeout
    pub fn new(endpoint: String, timeout_seconds: u64) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            http_client,
        }
    }

    pub fn from_config(config: &ComputeConfig) -> Self {
        Self::new(config.endpoint.clone(), config.timeout_seconds)
    }

    /// Hand an order off for asynchronous estimation.
    ///
    /// Fails fast on timeout or a non-2xx status; the caller rolls back and
    /// the moderator retries. No retry loop lives in the request path.
    pub async fn dispatch(&self, order_id: i32, callback_url: &str) -> AppResult<()> {
        let request = DispatchRequest {
            order_id,
            callback_url: callback_url.to_string(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ComputeUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ComputeUnavailable(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
