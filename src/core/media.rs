//! External image host integration
//!
//! Banner images are uploaded by the client straight to Cloudinary; the
//! backend only stores the resulting URL and public id, and destroys the
//! hosted asset when the banner goes away.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Cloudinary REST API root
pub const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Image host errors
#[derive(Debug, thiserror::Error)]
pub enum ImageHostError {
    #[error("Image host request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Image host rejected destroy of {public_id}: {result}")]
    Rejected { public_id: String, result: String },
}

/// Image host abstraction
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Remove a hosted asset by its public id
    async fn destroy(&self, public_id: &str) -> Result<(), ImageHostError>;
}

/// No-op host used when Cloudinary is not configured
#[derive(Debug, Clone, Default)]
pub struct LogImageHost;

#[async_trait]
impl ImageHost for LogImageHost {
    async fn destroy(&self, public_id: &str) -> Result<(), ImageHostError> {
        tracing::info!(public_id, "image destroy stub");
        Ok(())
    }
}

/// Cloudinary credentials
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Cloudinary upload API client
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            base_url: CLOUDINARY_API_BASE.to_string(),
        }
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn destroy_url(&self) -> String {
        format!(
            "{}/{}/image/destroy",
            self.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

/// Sign request parameters: sorted `key=value` pairs joined by `&`, then the
/// API secret appended, SHA-256 hex digest.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn destroy(&self, public_id: &str) -> Result<(), ImageHostError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let form = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response: DestroyResponse = self
            .http
            .post(self.destroy_url())
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.result != "ok" {
            return Err(ImageHostError::Rejected {
                public_id: public_id.to_string(),
                result: response.result,
            });
        }

        tracing::info!(public_id, "Hosted image destroyed");
        Ok(())
    }
}

/// Destroy a hosted image if there is one.
///
/// Failures are logged and reported as `false`; they never abort the caller.
pub async fn delete_image(host: &dyn ImageHost, public_id: Option<&str>) -> bool {
    let Some(public_id) = public_id.filter(|id| !id.is_empty()) else {
        return false;
    };

    match host.destroy(public_id).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(public_id, "Failed to destroy hosted image: {}", e);
            false
        }
    }
}
