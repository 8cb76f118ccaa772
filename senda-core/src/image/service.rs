// File: senda-core/src/image/service.rs

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use senda_common::models::{ImageAnalysisResult, ViolenceSignal, WeaponSignal};

use crate::capabilities::image_analyzer::{AnalyzerVerdict, ExternalImageAnalyzer};
use crate::config::ImagePolicy;

/// Runs an ordered chain of external analyzers; the first parseable verdict
/// wins. Only when every analyzer fails does the fail-closed result apply:
/// `approved = false`, `risk_score = 1.0`, error recorded.
pub struct ImageModerationService {
    analyzers: Vec<Arc<dyn ExternalImageAnalyzer>>,
    policy: ImagePolicy,
}

impl ImageModerationService {
    pub fn new(analyzers: Vec<Arc<dyn ExternalImageAnalyzer>>, policy: ImagePolicy) -> Self {
        Self { analyzers, policy }
    }

    pub fn has_analyzers(&self) -> bool {
        !self.analyzers.is_empty()
    }

    /// Never returns an error: analyzer failures become the fail-closed
    /// verdict instead.
    pub async fn evaluate(&self, image_path: &Path) -> ImageAnalysisResult {
        if self.analyzers.is_empty() {
            return ImageAnalysisResult::analyzer_failure(
                "No hay analizador de imágenes configurado",
            );
        }

        let mut last_error = String::new();
        for analyzer in &self.analyzers {
            match analyzer.analyze(image_path).await {
                Ok(verdict) => {
                    debug!(
                        analyzer = analyzer.name(),
                        path = %image_path.display(),
                        "image analyzer verdict received"
                    );
                    return self.from_verdict(verdict);
                }
                Err(e) => {
                    warn!(
                        analyzer = analyzer.name(),
                        path = %image_path.display(),
                        "image analyzer failed: {}", e
                    );
                    last_error = e.to_string();
                }
            }
        }
        ImageAnalysisResult::analyzer_failure(last_error)
    }

    fn from_verdict(&self, verdict: AnalyzerVerdict) -> ImageAnalysisResult {
        let violence_detected =
            verdict.violence.detected || verdict.violence.probability >= self.policy.violence_threshold;
        let weapons_detected =
            verdict.weapons.detected || verdict.weapons.confidence >= self.policy.weapon_threshold;
        let approved = verdict.apt && !violence_detected && !weapons_detected;

        let reason = if approved {
            None
        } else if violence_detected {
            Some(format!(
                "Contenido violento detectado ({:.0}% confianza)",
                verdict.violence.probability * 100.0
            ))
        } else if weapons_detected {
            Some(format!(
                "Armas detectadas ({:.0}% confianza)",
                verdict.weapons.confidence * 100.0
            ))
        } else {
            Some("Contenido inapropiado".to_string())
        };

        ImageAnalysisResult {
            approved,
            risk_score: verdict.risk_score.clamp(0.0, 1.0),
            violence: ViolenceSignal {
                detected: violence_detected,
                probability: verdict.violence.probability,
            },
            weapons: WeaponSignal {
                detected: weapons_detected,
                confidence: verdict.weapons.confidence,
            },
            analyzer_error: None,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::capabilities::image_analyzer::{
        MockExternalImageAnalyzer, ViolenceVerdict, WeaponsVerdict,
    };
    use senda_common::Error;

    fn verdict(apt: bool, violence: f64, weapons: f64, risk: f64) -> AnalyzerVerdict {
        AnalyzerVerdict {
            apt,
            violence: ViolenceVerdict {
                detected: violence >= 0.7,
                probability: violence,
            },
            weapons: WeaponsVerdict {
                detected: weapons >= 0.7,
                confidence: weapons,
            },
            risk_score: risk,
        }
    }

    fn failing_analyzer() -> Arc<dyn ExternalImageAnalyzer> {
        let mut mock = MockExternalImageAnalyzer::new();
        mock.expect_name().return_const("mock-failing".to_string());
        mock.expect_analyze().returning(|_| {
            Err(Error::CapabilityError {
                capability: "image-analyzer".to_string(),
                message: "analyzer exited with Some(1)".to_string(),
            })
        });
        Arc::new(mock)
    }

    #[tokio::test]
    async fn safe_image_is_approved() {
        let mut mock = MockExternalImageAnalyzer::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_analyze()
            .returning(|_| Ok(verdict(true, 0.1, 0.05, 0.1)));

        let service =
            ImageModerationService::new(vec![Arc::new(mock)], ImagePolicy::default());
        let result = service.evaluate(Path::new("/tmp/foto.jpg")).await;
        assert!(result.approved);
        assert!(result.analyzer_error.is_none());
    }

    #[tokio::test]
    async fn violent_image_reason_carries_the_percentage() {
        let mut mock = MockExternalImageAnalyzer::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_analyze()
            .returning(|_| Ok(verdict(false, 0.87, 0.0, 0.87)));

        let service =
            ImageModerationService::new(vec![Arc::new(mock)], ImagePolicy::default());
        let result = service.evaluate(Path::new("/tmp/foto.jpg")).await;
        assert!(!result.approved);
        assert!(result.violence.detected);
        assert_eq!(
            result.reason.as_deref(),
            Some("Contenido violento detectado (87% confianza)")
        );
    }

    #[tokio::test]
    async fn analyzer_failure_is_fail_closed() {
        let service =
            ImageModerationService::new(vec![failing_analyzer()], ImagePolicy::default());
        let result = service.evaluate(Path::new("/tmp/foto.jpg")).await;
        assert!(!result.approved);
        assert_eq!(result.risk_score, 1.0);
        assert!(result.analyzer_error.is_some());
    }

    #[tokio::test]
    async fn chain_falls_through_to_the_next_analyzer() {
        let mut second = MockExternalImageAnalyzer::new();
        second.expect_name().return_const("mock-second".to_string());
        second
            .expect_analyze()
            .returning(|_| Ok(verdict(true, 0.0, 0.0, 0.05)));

        let service = ImageModerationService::new(
            vec![failing_analyzer(), Arc::new(second)],
            ImagePolicy::default(),
        );
        let result = service.evaluate(Path::new("/tmp/foto.jpg")).await;
        assert!(result.approved);
        assert!(result.analyzer_error.is_none());
    }
}
