// File: senda-common/src/models/image.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolenceSignal {
    pub detected: bool,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSignal {
    pub detected: bool,
    pub confidence: f64,
}

/// Verdict for a single image. `risk_score` is risk-oriented: higher is worse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysisResult {
    pub approved: bool,
    pub risk_score: f64,
    pub violence: ViolenceSignal,
    pub weapons: WeaponSignal,
    /// Set whenever the external analyzer could not produce a verdict.
    /// Invariant: when present, `approved == false` and `risk_score == 1.0`.
    pub analyzer_error: Option<String>,
    pub reason: Option<String>,
}

impl ImageAnalysisResult {
    /// Fail-closed verdict used whenever the analyzer fails (spawn error,
    /// non-zero exit, unparsable output, timeout).
    pub fn analyzer_failure(error: impl Into<String>) -> Self {
        Self {
            approved: false,
            risk_score: 1.0,
            violence: ViolenceSignal {
                detected: false,
                probability: 0.0,
            },
            weapons: WeaponSignal {
                detected: false,
                confidence: 0.0,
            },
            analyzer_error: Some(error.into()),
            reason: Some("Error al analizar la imagen".to_string()),
        }
    }
}
