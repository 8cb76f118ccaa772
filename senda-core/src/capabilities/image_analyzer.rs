// File: senda-core/src/capabilities/image_analyzer.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use senda_common::Error;

/// Wire contract shared by every analyzer backend:
/// `{apt, violence{detected, probability}, weapons{detected, confidence}, riskScore}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerVerdict {
    pub apt: bool,
    pub violence: ViolenceVerdict,
    pub weapons: WeaponsVerdict,
    #[serde(rename = "riskScore")]
    pub risk_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViolenceVerdict {
    pub detected: bool,
    pub probability: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeaponsVerdict {
    pub detected: bool,
    pub confidence: f64,
}

/// External classifier for violence/weapon content. Spawn/parse/timeout
/// failures are returned as errors; the ImageModerationService turns them
/// into the fail-closed verdict.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExternalImageAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, image_path: &Path) -> Result<AnalyzerVerdict, Error>;
}

/// HTTP analyzer service. POSTs `{imagePath}` to the configured endpoint.
pub struct HttpImageAnalyzer {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpImageAnalyzer {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Polls the analyzer's health endpoint until it answers, with bounded
    /// attempts and a short backoff. Used once at startup.
    pub async fn wait_ready(&self, max_attempts: u32) -> bool {
        let health_url = format!("{}/health", self.base_url);
        for attempt in 1..=max_attempts {
            match self
                .client
                .get(&health_url)
                .timeout(Duration::from_secs(2))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    info!("Image analyzer ready after {} attempt(s).", attempt);
                    return true;
                }
                Ok(response) => {
                    debug!("Image analyzer health returned {}", response.status());
                }
                Err(e) => {
                    debug!("Image analyzer health attempt {} failed: {}", attempt, e);
                }
            }
            sleep(Duration::from_millis(500)).await;
        }
        warn!(
            "Image analyzer did not become ready after {} attempts.",
            max_attempts
        );
        false
    }
}

#[async_trait]
impl ExternalImageAnalyzer for HttpImageAnalyzer {
    fn name(&self) -> &str {
        "http-image-analyzer"
    }

    async fn analyze(&self, image_path: &Path) -> Result<AnalyzerVerdict, Error> {
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .timeout(self.timeout)
            .json(&json!({ "imagePath": image_path.to_string_lossy() }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::CapabilityTimeout {
                        capability: "image-analyzer".to_string(),
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    Error::CapabilityError {
                        capability: "image-analyzer".to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CapabilityError {
                capability: "image-analyzer".to_string(),
                message: format!("analyzer returned HTTP {}", status),
            });
        }

        let verdict = response.json::<AnalyzerVerdict>().await.map_err(|e| {
            Error::CapabilityError {
                capability: "image-analyzer".to_string(),
                message: format!("unparsable analyzer response: {}", e),
            }
        })?;
        Ok(verdict)
    }
}

/// Subprocess analyzer bridge: spawns the configured program with the image
/// path appended as the final argument and parses its stdout as JSON.
pub struct SubprocessImageAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessImageAnalyzer {
    /// `command` is the program plus its leading arguments, e.g.
    /// `["python3", "scripts/analyze_image.py"]`.
    pub fn new(command: Vec<String>, timeout_secs: u64) -> Result<Self, Error> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| Error::CapabilityUnavailable("image-analyzer subprocess".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[async_trait]
impl ExternalImageAnalyzer for SubprocessImageAnalyzer {
    fn name(&self) -> &str {
        "subprocess-image-analyzer"
    }

    async fn analyze(&self, image_path: &Path) -> Result<AnalyzerVerdict, Error> {
        let absolute: PathBuf = if image_path.is_absolute() {
            image_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(image_path)
        };

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&absolute)
            .kill_on_drop(true)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        debug!(
            "Spawning image analyzer: {} {:?} {}",
            self.program,
            self.args,
            absolute.display()
        );

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| Error::CapabilityTimeout {
                capability: "image-analyzer".to_string(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| Error::CapabilityError {
                capability: "image-analyzer".to_string(),
                message: format!("spawn failed: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::CapabilityError {
                capability: "image-analyzer".to_string(),
                message: format!(
                    "analyzer exited with {:?}: {}",
                    output.status.code(),
                    stderr.trim()
                ),
            });
        }

        let verdict: AnalyzerVerdict =
            serde_json::from_slice(&output.stdout).map_err(|e| Error::CapabilityError {
                capability: "image-analyzer".to_string(),
                message: format!("unparsable analyzer stdout: {}", e),
            })?;
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parses_wire_json() {
        let raw = r#"{
            "apt": false,
            "violence": { "detected": true, "probability": 0.87 },
            "weapons": { "detected": false, "confidence": 0.05 },
            "riskScore": 0.87
        }"#;
        let verdict: AnalyzerVerdict = serde_json::from_str(raw).unwrap();
        assert!(!verdict.apt);
        assert!(verdict.violence.detected);
        assert_eq!(verdict.risk_score, 0.87);
    }

    #[test]
    fn subprocess_command_requires_a_program() {
        assert!(SubprocessImageAnalyzer::new(Vec::new(), 15).is_err());
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_capability_error() {
        let analyzer =
            SubprocessImageAnalyzer::new(vec!["false".to_string()], 5).unwrap();
        let err = analyzer.analyze(Path::new("/tmp/missing.png")).await.unwrap_err();
        assert!(matches!(err, Error::CapabilityError { .. }));
    }
}
