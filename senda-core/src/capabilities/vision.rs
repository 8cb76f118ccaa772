// File: senda-core/src/capabilities/vision.rs

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use senda_common::Error;

/// OCR output for one image: the recognized text plus whatever safe-search
/// category flags the provider raised.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisionExtraction {
    #[serde(rename = "extractedText")]
    pub extracted_text: String,
    #[serde(rename = "safeSearchFlags", default)]
    pub safe_search_flags: Vec<String>,
}

/// Optional OCR/vision capability. When it is not configured the strategy
/// selector routes PDFs to non-vision strategies instead.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisionService: Send + Sync {
    async fn extract(&self, image_path: &Path) -> Result<VisionExtraction, Error>;
}

pub struct HttpVisionService {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpVisionService {
    pub fn new(url: String, timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl VisionService for HttpVisionService {
    async fn extract(&self, image_path: &Path) -> Result<VisionExtraction, Error> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&json!({ "imagePath": image_path.to_string_lossy() }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::CapabilityTimeout {
                        capability: "vision".to_string(),
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    Error::CapabilityError {
                        capability: "vision".to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CapabilityError {
                capability: "vision".to_string(),
                message: format!("vision service returned HTTP {}", status),
            });
        }

        let extraction = response.json::<VisionExtraction>().await.map_err(|e| {
            Error::CapabilityError {
                capability: "vision".to_string(),
                message: format!("unparsable vision response: {}", e),
            }
        })?;
        Ok(extraction)
    }
}
