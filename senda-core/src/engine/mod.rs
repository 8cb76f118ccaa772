// File: senda-core/src/engine/mod.rs

use tracing::debug;
use uuid::Uuid;

use senda_common::models::{
    AnalysisResult, DecisionStatus, ImageAnalysisResult, ModerationDecision, PdfAnalysisResult,
    ScoreContributions, TrustScore,
};

use crate::config::{DecisionThresholds, DecisionWeights};

/// Blends the text, visual and trust signals into one decision. Weights and
/// thresholds come from configuration; missing config means the documented
/// defaults.
pub struct ModerationDecisionEngine {
    thresholds: DecisionThresholds,
    weights: DecisionWeights,
}

impl ModerationDecisionEngine {
    pub fn new(thresholds: DecisionThresholds, weights: DecisionWeights) -> Self {
        Self { thresholds, weights }
    }

    /// Decision rules, evaluated in order:
    ///  1. overall ≥ approval threshold and every sub-result approved → Approved
    ///  2. text and visual both ≥ fast-path floor → Approved (trust-independent)
    ///  3. overall ≤ rejection threshold, or any sub-result not approved → Rejected
    ///  4. overall ≥ flexible band and every sub-result approved → Approved
    ///  5. otherwise → Pending
    pub fn decide(
        &self,
        submission_id: Uuid,
        text: &AnalysisResult,
        image: Option<&ImageAnalysisResult>,
        pdf: Option<&PdfAnalysisResult>,
        trust: TrustScore,
    ) -> ModerationDecision {
        // The visual signal is the riskier of image and PDF when both exist.
        let image_safety = image.map(|i| 1.0 - i.risk_score);
        let pdf_safety = pdf.map(|p| p.score);
        let visual_score = match (image_safety, pdf_safety) {
            (Some(i), Some(p)) => Some(i.min(p)),
            (Some(i), None) => Some(i),
            (None, Some(p)) => Some(p),
            (None, None) => None,
        };
        let visual_approved =
            image.map(|i| i.approved).unwrap_or(true) && pdf.map(|p| p.approved).unwrap_or(true);

        // Text absorbs the image share when no visual signal is present.
        let overall = match visual_score {
            Some(visual) => {
                text.score * self.weights.text
                    + visual * self.weights.image
                    + trust.value * self.weights.trust
            }
            None => {
                text.score * (self.weights.text + self.weights.image)
                    + trust.value * self.weights.trust
            }
        };

        let all_approved = text.approved && visual_approved;
        let fast_path = text.score >= self.thresholds.fast_path
            && visual_score.map_or(true, |v| v >= self.thresholds.fast_path);

        let status = if overall >= self.thresholds.approval && all_approved {
            DecisionStatus::Approved
        } else if fast_path && all_approved {
            DecisionStatus::Approved
        } else if overall <= self.thresholds.rejection || !all_approved {
            DecisionStatus::Rejected
        } else if overall >= self.thresholds.flexible_band {
            DecisionStatus::Approved
        } else {
            DecisionStatus::Pending
        };

        let rejection_reason = if status == DecisionStatus::Rejected {
            Some(assemble_rejection_reason(text, image, pdf))
        } else {
            None
        };

        debug!(
            submission = %submission_id,
            status = status.as_str(),
            overall,
            "moderation decision computed"
        );

        ModerationDecision::new(
            submission_id,
            status,
            overall.clamp(0.0, 1.0),
            rejection_reason,
            ScoreContributions {
                text_score: text.score,
                image_score: visual_score,
                trust_score: trust.value,
            },
        )
    }
}

fn assemble_rejection_reason(
    text: &AnalysisResult,
    image: Option<&ImageAnalysisResult>,
    pdf: Option<&PdfAnalysisResult>,
) -> String {
    let mut reasons: Vec<String> = Vec::new();
    if !text.approved {
        let detail = text.reason.as_deref().unwrap_or("contenido inapropiado");
        reasons.push(format!("Texto: {}", detail));
    }
    if let Some(image) = image {
        if !image.approved {
            let detail = image.reason.as_deref().unwrap_or("contenido inapropiado");
            reasons.push(format!("Imagen: {}", detail));
        }
    }
    if let Some(pdf) = pdf {
        if !pdf.approved {
            let detail = pdf.reason.as_deref().unwrap_or("contenido inapropiado");
            reasons.push(format!("PDF: {}", detail));
        }
    }
    if reasons.is_empty() {
        "Contenido no aprobado por los filtros automáticos".to_string()
    } else {
        reasons.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use senda_common::models::{
        AnalysisMethod, PdfStrategy, QualityMetrics, ReasonCode, ViolenceSignal, WeaponSignal,
    };

    fn engine() -> ModerationDecisionEngine {
        ModerationDecisionEngine::new(DecisionThresholds::default(), DecisionWeights::default())
    }

    fn text_result(approved: bool, score: f64) -> AnalysisResult {
        AnalysisResult {
            approved,
            score,
            flagged_terms: Vec::new(),
            reason_code: if approved {
                ReasonCode::None
            } else {
                ReasonCode::Offensive
            },
            method: AnalysisMethod::External,
            quality_metrics: QualityMetrics::empty(),
            reason: if approved {
                None
            } else {
                Some("Lenguaje ofensivo detectado".to_string())
            },
        }
    }

    fn image_result(approved: bool, risk: f64) -> ImageAnalysisResult {
        ImageAnalysisResult {
            approved,
            risk_score: risk,
            violence: ViolenceSignal {
                detected: false,
                probability: 0.0,
            },
            weapons: WeaponSignal {
                detected: false,
                confidence: 0.0,
            },
            analyzer_error: None,
            reason: None,
        }
    }

    fn pdf_result(approved: bool, score: f64) -> PdfAnalysisResult {
        PdfAnalysisResult {
            approved,
            score,
            strategy_used: PdfStrategy::TextOnly,
            extracted_ocr_text: None,
            per_page_issues: Vec::new(),
            reason: None,
        }
    }

    #[test]
    fn clean_submission_is_approved() {
        let decision = engine().decide(
            Uuid::new_v4(),
            &text_result(true, 0.9),
            Some(&image_result(true, 0.1)),
            None,
            TrustScore { value: 1.0 },
        );
        assert_eq!(decision.status, DecisionStatus::Approved);
        assert!(decision.rejection_reason.is_none());
    }

    #[test]
    fn fast_path_approves_independent_of_trust_and_overall() {
        // raise the approval threshold so rule 1 cannot fire
        let strict = ModerationDecisionEngine::new(
            DecisionThresholds {
                approval: 0.95,
                ..DecisionThresholds::default()
            },
            DecisionWeights::default(),
        );
        let decision = strict.decide(
            Uuid::new_v4(),
            &text_result(true, 0.85),
            Some(&image_result(true, 0.15)),
            None,
            TrustScore { value: 0.5 },
        );
        // overall = 0.85*0.45 + 0.85*0.45 + 0.05 = 0.815 < 0.95, but both
        // signals clear the 0.8 fast-path floor
        assert!(decision.overall_score < 0.95);
        assert_eq!(decision.status, DecisionStatus::Approved);
    }

    #[test]
    fn failed_image_analyzer_rejects_regardless_of_text() {
        let failure = ImageAnalysisResult::analyzer_failure("analyzer exited with Some(1)");
        let decision = engine().decide(
            Uuid::new_v4(),
            &text_result(true, 0.95),
            Some(&failure),
            None,
            TrustScore { value: 1.0 },
        );
        assert_eq!(decision.status, DecisionStatus::Rejected);
        let reason = decision.rejection_reason.unwrap();
        assert!(reason.starts_with("Imagen:"));
    }

    #[test]
    fn offensive_text_rejects_and_reason_names_the_text() {
        let decision = engine().decide(
            Uuid::new_v4(),
            &text_result(false, 0.2),
            None,
            None,
            TrustScore { value: 1.0 },
        );
        assert_eq!(decision.status, DecisionStatus::Rejected);
        assert_eq!(
            decision.rejection_reason.as_deref(),
            Some("Texto: Lenguaje ofensivo detectado")
        );
    }

    #[test]
    fn flexible_band_approves_at_0_68() {
        // text 0.72, pdf 0.62, trust 0.75 → 0.324 + 0.279 + 0.075 = 0.678
        let decision = engine().decide(
            Uuid::new_v4(),
            &text_result(true, 0.72),
            None,
            Some(&pdf_result(true, 0.62)),
            TrustScore { value: 0.75 },
        );
        assert!(decision.overall_score > 0.65 && decision.overall_score < 0.70);
        assert_eq!(decision.status, DecisionStatus::Approved);
    }

    #[test]
    fn ambiguous_zone_is_pending() {
        // text 0.6, image risk 0.45 → visual 0.55, trust 0.6
        // overall = 0.27 + 0.2475 + 0.06 = 0.5775 → between thresholds
        let decision = engine().decide(
            Uuid::new_v4(),
            &text_result(true, 0.6),
            Some(&image_result(true, 0.45)),
            None,
            TrustScore { value: 0.6 },
        );
        assert_eq!(decision.status, DecisionStatus::Pending);
    }

    #[test]
    fn missing_visual_signal_lets_text_absorb_the_weight() {
        let decision = engine().decide(
            Uuid::new_v4(),
            &text_result(true, 0.9),
            None,
            None,
            TrustScore { value: 1.0 },
        );
        // 0.9*0.9 + 1.0*0.1 = 0.91
        assert!((decision.overall_score - 0.91).abs() < 1e-9);
        assert_eq!(decision.status, DecisionStatus::Approved);
    }

    #[test]
    fn identical_inputs_yield_identical_status() {
        let text = text_result(true, 0.9);
        let image = image_result(true, 0.1);
        let first = engine().decide(
            Uuid::new_v4(),
            &text,
            Some(&image),
            None,
            TrustScore { value: 0.9 },
        );
        let second = engine().decide(
            Uuid::new_v4(),
            &text,
            Some(&image),
            None,
            TrustScore { value: 0.9 },
        );
        assert_eq!(first.status, second.status);
        assert_eq!(first.overall_score, second.overall_score);
    }
}
