//! Object storage client for month images
//!
//! Talks to an S3-compatible store (MinIO in development) over plain HTTP.
//! Deletions are best-effort: a missing or unreachable object must never
//! fail the catalog operation that triggered the cleanup.

use reqwest::Client;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};

/// Media storage client
#[derive(Clone)]
pub struct MediaStorage {
    endpoint: String,
    public_base_url: String,
    bucket: String,
    http_client: Client,
}

impl MediaStorage {
    pub fn new(endpoint: String, public_base_url: String, bucket: String) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            public_base_url,
            bucket,
            http_client,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.public_base_url.clone(),
            config.bucket.clone(),
        )
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.bucket,
            key
        )
    }

    /// URL browsers use to fetch the object
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }

    /// Upload an object; returns the stored key
    pub async fn save(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let response = self
            .http_client
            .put(self.object_url(key))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::StorageError(format!(
                "Upload returned {}",
                response.status()
            )));
        }

        Ok(key.to_string())
    }

    /// Check whether an object exists
    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        let response = self
            .http_client
            .head(self.object_url(key))
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Head failed: {}", e)))?;

        Ok(response.status().is_success())
    }

    /// Best-effort delete: failures are logged and swallowed so cleanup
    /// never blocks the primary operation.
    pub async fn delete_if_exists(&self, key: &str) {
        if key.is_empty() {
            return;
        }

        let result = self.http_client.delete(self.object_url(key)).send().await;

        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(key, status = %response.status(), "Image delete failed");
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Image delete failed");
            }
            _ => {}
        }
    }
}

/// Build a unique object key for a month image: slugified name + uuid + ext
pub fn generate_image_key(name: &str, filename: &str) -> String {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg");
    format!("{}-{}.{}", slugify(name), Uuid::new_v4().simple(), ext)
}

fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_dash = true;
    for c in value.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "file".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("June"), "june");
        assert_eq!(slugify("Late  Autumn!"), "late-autumn");
        assert_eq!(slugify("***"), "file");
    }

    #[test]
    fn test_image_key_keeps_extension() {
        let key = generate_image_key("June", "photo.PNG");
        assert!(key.starts_with("june-"));
        assert!(key.ends_with(".PNG"));
    }
}
