// File: senda-core/src/config.rs

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::Error;

/// Score thresholds used by the decision engine.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    pub approval: f64,
    pub rejection: f64,
    /// Narrow band above which a submission is approved when every
    /// sub-result individually passed.
    pub flexible_band: f64,
    /// Per-signal floor for the high-confidence fast path.
    pub fast_path: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            approval: 0.70,
            rejection: 0.40,
            flexible_band: 0.65,
            fast_path: 0.80,
        }
    }
}

/// Blend weights for the overall score. When no visual signal is present the
/// text weight absorbs the image share.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DecisionWeights {
    pub text: f64,
    pub image: f64,
    pub trust: f64,
}

impl Default for DecisionWeights {
    fn default() -> Self {
        Self {
            text: 0.45,
            image: 0.45,
            trust: 0.10,
        }
    }
}

/// Looser cutoffs for the scanned/academic reconsideration rule. These are
/// tuned policy values, not contracts; deployments may tighten them.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PermissivePolicy {
    pub max_image_risk: f64,
    pub max_text_toxicity: f64,
}

impl Default for PermissivePolicy {
    fn default() -> Self {
        Self {
            max_image_risk: 0.7,
            max_text_toxicity: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TextPolicy {
    /// Toxicity at or above this value rejects the text.
    pub toxicity_rejection: f64,
    /// Cap on PDF-extracted text; longer extractions are truncated
    /// head+tail before analysis.
    pub max_chars: usize,
}

impl Default for TextPolicy {
    fn default() -> Self {
        Self {
            toxicity_rejection: 0.5,
            max_chars: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ImagePolicy {
    pub violence_threshold: f64,
    pub weapon_threshold: f64,
    pub max_bytes: u64,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            violence_threshold: 0.7,
            weapon_threshold: 0.7,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PdfPolicy {
    pub max_bytes: u64,
    /// Minimum extractable characters for a text-only verdict.
    pub min_text_chars: usize,
    pub max_pages_rasterized: usize,
    pub raster_dpi: u32,
    pub raster_timeout_secs: u64,
    /// Display cap on per-page warnings.
    pub issue_display_cap: usize,
}

impl Default for PdfPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
            min_text_chars: 10,
            max_pages_rasterized: 10,
            raster_dpi: 150,
            raster_timeout_secs: 30,
            issue_display_cap: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ReconcilerSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub initial_delay_secs: u64,
    /// Pending submissions younger than this are left alone.
    pub grace_period_secs: u64,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 120,
            initial_delay_secs: 30,
            grace_period_secs: 300,
        }
    }
}

/// Endpoints and commands for the external capabilities. Every field is
/// optional; an absent capability routes through the documented fallback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CapabilitySettings {
    pub toxicity_url: Option<String>,
    pub toxicity_api_key: Option<String>,
    pub toxicity_timeout_secs: Option<u64>,
    pub image_analyzer_url: Option<String>,
    /// Program plus leading arguments for the subprocess analyzer; the image
    /// path is appended as the final argument.
    pub image_analyzer_command: Vec<String>,
    pub image_analyzer_timeout_secs: Option<u64>,
    pub vision_url: Option<String>,
    pub vision_timeout_secs: Option<u64>,
}

impl CapabilitySettings {
    pub fn toxicity_timeout_secs(&self) -> u64 {
        self.toxicity_timeout_secs.unwrap_or(10)
    }

    pub fn image_analyzer_timeout_secs(&self) -> u64 {
        self.image_analyzer_timeout_secs.unwrap_or(15)
    }

    pub fn vision_timeout_secs(&self) -> u64 {
        self.vision_timeout_secs.unwrap_or(10)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    pub thresholds: DecisionThresholds,
    pub weights: DecisionWeights,
    pub permissive: PermissivePolicy,
    pub text: TextPolicy,
    pub image: ImagePolicy,
    pub pdf: PdfPolicy,
    pub cache: CacheSettings,
    pub reconciler: ReconcilerSettings,
    pub capabilities: CapabilitySettings,
}

impl ModerationConfig {
    /// Loads the JSON config at `path`. A missing file yields the defaults;
    /// a present but malformed file is an error.
    pub fn load_or_default(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            warn!(
                "Config file '{}' not found; using built-in defaults.",
                path.display()
            );
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: ModerationConfig = serde_json::from_str(&raw)?;
        info!("Loaded moderation config from '{}'.", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = ModerationConfig::default();
        assert_eq!(config.thresholds.approval, 0.70);
        assert_eq!(config.thresholds.rejection, 0.40);
        assert_eq!(config.thresholds.flexible_band, 0.65);
        assert_eq!(config.weights.text, 0.45);
        assert_eq!(config.weights.image, 0.45);
        assert_eq!(config.weights.trust, 0.10);
        assert_eq!(config.permissive.max_image_risk, 0.7);
        assert_eq!(config.permissive.max_text_toxicity, 0.3);
        assert_eq!(config.reconciler.interval_secs, 120);
        assert_eq!(config.reconciler.grace_period_secs, 300);
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_sections() {
        let raw = r#"{ "thresholds": { "approval": 0.9 } }"#;
        let config: ModerationConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.thresholds.approval, 0.9);
        // untouched sibling field within the same section
        assert_eq!(config.thresholds.rejection, 0.40);
        // untouched section
        assert_eq!(config.weights.image, 0.45);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            ModerationConfig::load_or_default(Path::new("/nonexistent/senda.json")).unwrap();
        assert_eq!(config.cache.max_entries, 512);
        assert!(config.capabilities.toxicity_url.is_none());
    }
}
