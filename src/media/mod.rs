//! Third-party media host used by the upload proxy.
//!
//! Files are staged on local disk by the handler and forwarded from there;
//! the host returns the public URL the front-end stores on the row.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tokio_util::io::ReaderStream;

use crate::config::MediaConfig;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media host is not configured")]
    NotConfigured,

    #[error("Failed to read staged file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media host rejected the upload: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Upload the file at `path` and return its public URL.
    async fn upload(&self, path: &Path, filename: &str) -> Result<String, MediaError>;
}

/// Signed uploads against the Cloudinary upload API.
pub struct CloudinaryClient {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct UploadErrorResponse {
    error: UploadErrorBody,
}

#[derive(Deserialize)]
struct UploadErrorBody {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: &MediaConfig) -> Self {
        let cloud_name = config.cloud_name.clone().unwrap_or_default();
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("https://api.cloudinary.com/v1_1/{}/auto/upload", cloud_name),
            cloud_name,
            api_key: config.api_key.clone().unwrap_or_default(),
            api_secret: config.api_secret.clone().unwrap_or_default(),
            folder: config.folder.clone(),
        }
    }

    /// Signature over the alphabetically sorted signed params followed by
    /// the API secret. `file`, `api_key` and `signature_algorithm` are not
    /// part of the signed set.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    async fn upload(&self, path: &Path, filename: &str) -> Result<String, MediaError> {
        if !self.is_configured() {
            return Err(MediaError::NotConfigured);
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [("folder", self.folder.clone()), ("timestamp", timestamp)];
        let signature = self.sign(&signed);

        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = reqwest::multipart::Part::stream_with_length(body, length)
            .file_name(filename.to_string());

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in signed {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<UploadErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, text));
            return Err(MediaError::Rejected(message));
        }

        let uploaded: UploadResponse = serde_json::from_str(&text)
            .map_err(|e| MediaError::Rejected(format!("unreadable response: {}", e)))?;

        uploaded
            .secure_url
            .or(uploaded.url)
            .ok_or_else(|| MediaError::Rejected("response carried no URL".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> CloudinaryClient {
        CloudinaryClient::new(&MediaConfig {
            cloud_name: Some("demo".to_string()),
            api_key: Some("1234".to_string()),
            api_secret: Some("abcd".to_string()),
            folder: "influencer-uploads".to_string(),
            ..MediaConfig::default()
        })
    }

    #[test]
    fn test_endpoint_uses_cloud_name() {
        let client = configured();
        assert!(client.is_configured());
        assert_eq!(
            client.endpoint,
            "https://api.cloudinary.com/v1_1/demo/auto/upload"
        );
    }

    #[test]
    fn test_signature_is_order_independent() {
        let client = configured();
        let a = client.sign(&[
            ("timestamp", "1700000000".to_string()),
            ("folder", "influencer-uploads".to_string()),
        ]);
        let b = client.sign(&[
            ("folder", "influencer-uploads".to_string()),
            ("timestamp", "1700000000".to_string()),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut hasher = Sha256::new();
        hasher.update(b"folder=influencer-uploads&timestamp=1700000000abcd");
        assert_eq!(a, hex::encode(hasher.finalize()));
    }

    #[tokio::test]
    async fn test_upload_requires_credentials() {
        let client = CloudinaryClient::new(&MediaConfig::default());
        assert!(!client.is_configured());

        let err = client
            .upload(Path::new("/nonexistent"), "clip.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NotConfigured));
    }
}
