//! Image hosting: validated blobs are pushed to Cloudinary and come back as URLs

use std::path::Path;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::admin::validate_image;
use crate::error::UploadError;

const PLACEHOLDER_CLOUD_NAME: &str = "demo";
const PLACEHOLDER_UPLOAD_PRESET: &str = "unsigned_upload";

fn default_cloud_name() -> String {
    PLACEHOLDER_CLOUD_NAME.to_string()
}

fn default_upload_preset() -> String {
    PLACEHOLDER_UPLOAD_PRESET.to_string()
}

/// Upload destination: account plus unsigned preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    #[serde(default = "default_cloud_name")]
    pub cloud_name: String,
    #[serde(default = "default_upload_preset")]
    pub upload_preset: String,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: default_cloud_name(),
            upload_preset: default_upload_preset(),
        }
    }
}

impl CloudinaryConfig {
    /// The placeholder values shipped as defaults do not count as configured.
    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty()
            && !self.upload_preset.is_empty()
            && self.cloud_name != PLACEHOLDER_CLOUD_NAME
            && self.upload_preset != PLACEHOLDER_UPLOAD_PRESET
    }
}

/// Raw image bytes with their declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageBlob {
    /// Reads a local file, guessing its type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        validate_image(&self.content_type, self.bytes.len())?;
        Ok(())
    }
}

/// Turns an image into a durable URL.
#[allow(async_fn_in_trait)]
pub trait ImageUploader {
    async fn upload(&self, blob: ImageBlob) -> Result<String, UploadError>;
}

pub struct CloudinaryUploader {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }
}

impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, blob: ImageBlob) -> Result<String, UploadError> {
        if !self.config.is_configured() {
            return Err(UploadError::NotConfigured);
        }
        blob.validate()?;
        info!(
            "[upload] Uploading {} ({} bytes, {})",
            blob.file_name,
            blob.bytes.len(),
            blob.content_type
        );

        let part = reqwest::multipart::Part::bytes(blob.bytes)
            .file_name(blob.file_name)
            .mime_str(&blob.content_type)
            .map_err(|e| UploadError::Transport(format!("Failed to create multipart: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone());

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(format!("Failed to read response: {}", e)))?;

        parse_upload_response(status.as_u16(), &body)
    }
}

fn parse_upload_response(status: u16, body: &str) -> Result<String, UploadError> {
    let json: Value = serde_json::from_str(body).map_err(|e| {
        UploadError::Rejected(format!("HTTP {}: unreadable response ({})", status, e))
    })?;

    if let Some(message) = json["error"]["message"].as_str() {
        return Err(UploadError::Rejected(message.to_string()));
    }
    if !(200..300).contains(&status) {
        return Err(UploadError::Rejected(format!("HTTP {}", status)));
    }
    json["secure_url"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| UploadError::Rejected("response has no secure_url".to_string()))
}

/// Uploads `blob` and stores the resulting URL in `image_url`. On failure the field is
/// left as it was and a user-readable notice is returned instead.
pub async fn acquire_image<U: ImageUploader>(
    uploader: &U,
    image_url: &mut String,
    blob: ImageBlob,
) -> Result<(), String> {
    match uploader.upload(blob).await {
        Ok(url) => {
            info!("[upload] Image stored at {}", url);
            *image_url = url;
            Ok(())
        }
        Err(UploadError::Validation(e)) => {
            warn!("[upload] Rejected image: {}", e);
            Err(format!("Image not accepted: {}", e))
        }
        Err(e) => {
            error!("[upload] Upload failed: {}", e);
            Err(format!("Image upload failed: {}. The previous image was kept.", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::MAX_IMAGE_BYTES;

    struct FixedUploader(Result<&'static str, &'static str>);

    impl ImageUploader for FixedUploader {
        async fn upload(&self, blob: ImageBlob) -> Result<String, UploadError> {
            blob.validate()?;
            match self.0 {
                Ok(url) => Ok(url.to_string()),
                Err(msg) => Err(UploadError::Transport(msg.to_string())),
            }
        }
    }

    fn png(size: usize) -> ImageBlob {
        ImageBlob {
            file_name: "unit.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn placeholder_config_is_not_configured() {
        assert!(!CloudinaryConfig::default().is_configured());
        let config = CloudinaryConfig {
            cloud_name: "nexlyn".into(),
            upload_preset: "catalog".into(),
        };
        assert!(config.is_configured());
    }

    #[test]
    fn upload_response_parsing() {
        assert_eq!(
            parse_upload_response(200, r#"{"secure_url":"https://res.cloudinary.com/x.png"}"#).unwrap(),
            "https://res.cloudinary.com/x.png"
        );
        let err = parse_upload_response(400, r#"{"error":{"message":"Invalid preset"}}"#).unwrap_err();
        assert!(matches!(err, UploadError::Rejected(m) if m == "Invalid preset"));
        assert!(parse_upload_response(502, "<html>").is_err());
    }

    #[tokio::test]
    async fn successful_upload_replaces_url() {
        let mut url = "https://old".to_string();
        let uploader = FixedUploader(Ok("https://new"));
        assert!(acquire_image(&uploader, &mut url, png(10)).await.is_ok());
        assert_eq!(url, "https://new");
    }

    #[tokio::test]
    async fn failed_upload_keeps_previous_url() {
        let mut url = "https://old".to_string();
        let uploader = FixedUploader(Err("connection reset"));
        let notice = acquire_image(&uploader, &mut url, png(10)).await.unwrap_err();
        assert!(notice.contains("connection reset"));
        assert_eq!(url, "https://old");

        let uploader = FixedUploader(Ok("https://new"));
        let notice = acquire_image(&uploader, &mut url, png(MAX_IMAGE_BYTES + 1))
            .await
            .unwrap_err();
        assert!(notice.starts_with("Image not accepted"));
        assert_eq!(url, "https://old");
    }

    #[tokio::test]
    async fn unconfigured_uploader_refuses() {
        let uploader = CloudinaryUploader::new(CloudinaryConfig::default());
        let err = uploader.upload(png(1)).await.unwrap_err();
        assert!(matches!(err, UploadError::NotConfigured));
    }

    #[tokio::test]
    async fn blob_from_path_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.jpg");
        std::fs::write(&path, [0xff, 0xd8, 0xff]).unwrap();
        let blob = ImageBlob::from_path(&path).await.unwrap();
        assert_eq!(blob.content_type, "image/jpeg");
        assert_eq!(blob.file_name, "router.jpg");
        assert!(blob.validate().is_ok());
    }
}
