// File: senda-core/src/services/moderation_service.rs

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use senda_common::models::{
    AnalysisResult, DecisionStatus, ImageAnalysisResult, ModerationDecision, ModerationLogEntry,
    ModerationOutcome, PdfAnalysisResult, ReasonCode, Submission, TextContext, TrustScore,
};
use senda_common::traits::repository_traits::{
    DecisionRepository, ModerationLogRepository, SubmissionRepository,
};
use senda_common::Error;

use crate::config::ModerationConfig;
use crate::engine::ModerationDecisionEngine;
use crate::image::ImageModerationService;
use crate::pdf::PdfAnalysisOrchestrator;
use crate::text::TextModerationService;
use crate::trust::UserTrustEstimator;

const EXCERPT_CAP: usize = 500;
const SUGGESTION_CAP: usize = 3;

/// Everything one evaluation produced, before persistence.
pub struct EvaluationParts {
    pub text: AnalysisResult,
    pub image: Option<ImageAnalysisResult>,
    pub pdf: Option<PdfAnalysisResult>,
    pub trust: TrustScore,
    pub decision: ModerationDecision,
}

/// The facade the platform calls. Validates input, runs the fail-fast text
/// gate, fans out to the image/PDF pipelines and the trust estimate, invokes
/// the decision engine, persists the decision and the rejection audit trail.
/// A system failure is a `Result::Err`, distinct from a rejection outcome.
pub struct ModerationService {
    text_service: Arc<TextModerationService>,
    image_service: Arc<ImageModerationService>,
    pdf_orchestrator: Arc<PdfAnalysisOrchestrator>,
    trust_estimator: Arc<UserTrustEstimator>,
    engine: ModerationDecisionEngine,
    submissions: Arc<dyn SubmissionRepository>,
    decisions: Arc<dyn DecisionRepository>,
    moderation_log: Arc<dyn ModerationLogRepository>,
    config: ModerationConfig,
}

impl ModerationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text_service: Arc<TextModerationService>,
        image_service: Arc<ImageModerationService>,
        pdf_orchestrator: Arc<PdfAnalysisOrchestrator>,
        trust_estimator: Arc<UserTrustEstimator>,
        submissions: Arc<dyn SubmissionRepository>,
        decisions: Arc<dyn DecisionRepository>,
        moderation_log: Arc<dyn ModerationLogRepository>,
        config: ModerationConfig,
    ) -> Self {
        let engine = ModerationDecisionEngine::new(config.thresholds, config.weights);
        Self {
            text_service,
            image_service,
            pdf_orchestrator,
            trust_estimator,
            engine,
            submissions,
            decisions,
            moderation_log,
            config,
        }
    }

    /// Moderates one submission end to end:
    ///  1. Validates attachments (existence, size caps, PDF magic bytes).
    ///  2. Text gate: a rejected text stops processing before any external
    ///     image/PDF call is made.
    ///  3. Fans out image/PDF analysis and the trust estimate concurrently.
    ///  4. Decides, persists, audits rejections, attaches suggestions.
    pub async fn moderate(&self, submission: &Submission) -> Result<ModerationOutcome, Error> {
        self.validate_attachments(submission)?;
        self.submissions.upsert_submission(submission).await?;

        let parts = self.evaluate(submission).await?;
        self.persist(submission, &parts).await?;

        info!(
            submission = %submission.submission_id,
            status = parts.decision.status.as_str(),
            score = parts.decision.overall_score,
            "moderation finished"
        );

        Ok(self.outcome_from(parts))
    }

    /// Re-evaluation entry used by the pending reconciler: same pipeline,
    /// no attachment re-validation. Produces and persists a new decision.
    pub async fn reevaluate(&self, submission: &Submission) -> Result<ModerationDecision, Error> {
        let parts = self.evaluate(submission).await?;
        self.persist(submission, &parts).await?;
        Ok(parts.decision)
    }

    async fn evaluate(&self, submission: &Submission) -> Result<EvaluationParts, Error> {
        // 1) Fail-fast text gate.
        let text = self
            .text_service
            .evaluate(
                &submission.text,
                TextContext::GeneralContent,
                &submission.submitter_key,
            )
            .await;

        if !text.approved {
            debug!(
                submission = %submission.submission_id,
                "text gate rejected; skipping image/PDF analysis"
            );
            let trust = self
                .trust_estimator
                .estimate(&submission.submitter_key)
                .await?;
            let decision =
                self.engine
                    .decide(submission.submission_id, &text, None, None, trust);
            return Ok(EvaluationParts {
                text,
                image: None,
                pdf: None,
                trust,
                decision,
            });
        }

        // 2) Fan out the visual pipelines and the trust estimate.
        let image_future = async {
            match &submission.image_path {
                Some(path) => Some(self.image_service.evaluate(path).await),
                None => None,
            }
        };
        let pdf_future = async {
            match &submission.pdf_path {
                Some(path) => Some(
                    self.pdf_orchestrator
                        .analyze(path, &submission.submitter_key)
                        .await,
                ),
                None => None,
            }
        };
        let trust_future = self.trust_estimator.estimate(&submission.submitter_key);

        let (image, pdf, trust) = tokio::join!(image_future, pdf_future, trust_future);
        let trust = trust?;

        // 3) Blend into the final decision.
        let decision = self.engine.decide(
            submission.submission_id,
            &text,
            image.as_ref(),
            pdf.as_ref(),
            trust,
        );

        Ok(EvaluationParts {
            text,
            image,
            pdf,
            trust,
            decision,
        })
    }

    async fn persist(&self, submission: &Submission, parts: &EvaluationParts) -> Result<(), Error> {
        let decision = rounded(&parts.decision);
        self.decisions.save_decision(&decision).await?;
        self.submissions
            .set_status(submission.submission_id, decision.status)
            .await?;

        if decision.status == DecisionStatus::Rejected {
            let excerpt: String = submission.text.chars().take(EXCERPT_CAP).collect();
            let reason = decision
                .rejection_reason
                .as_deref()
                .unwrap_or("Contenido no aprobado por los filtros automáticos");
            let entry = ModerationLogEntry::new(
                submission.submission_id,
                &submission.submitter_key,
                &excerpt,
                reason,
                decision.overall_score,
            );
            if let Err(e) = self.moderation_log.record_rejection(&entry).await {
                // the audit trail must not break the decision path
                error!("failed to record rejection audit entry: {}", e);
            }
        }
        Ok(())
    }

    fn outcome_from(&self, parts: EvaluationParts) -> ModerationOutcome {
        let suggestions = if parts.decision.status == DecisionStatus::Rejected {
            self.suggestions_for(&parts)
        } else {
            Vec::new()
        };
        ModerationOutcome {
            decision: rounded(&parts.decision),
            suggestions,
        }
    }

    /// Bounded remediation list assembled from the failing contributions.
    fn suggestions_for(&self, parts: &EvaluationParts) -> Vec<String> {
        let mut suggestions: Vec<String> = Vec::new();

        if !parts.text.approved {
            let suggestion = match parts.text.reason_code {
                ReasonCode::Incoherent => {
                    "Revisa la redacción: el texto parece incompleto o sin sentido."
                }
                ReasonCode::Spam => {
                    "Evita el contenido promocional o comercial en la descripción."
                }
                ReasonCode::LinksOrContact => {
                    "Quita los enlaces y datos de contacto del texto."
                }
                _ => "Elimina el lenguaje ofensivo o agresivo del texto.",
            };
            suggestions.push(suggestion.to_string());
        }
        if parts.image.as_ref().is_some_and(|i| !i.approved) {
            suggestions.push("Usa una imagen sin contenido violento ni armas.".to_string());
        }
        if parts.pdf.as_ref().is_some_and(|p| !p.approved) {
            suggestions.push(
                "Verifica que el documento no contenga texto o imágenes inapropiadas.".to_string(),
            );
        }
        if suggestions.is_empty() {
            suggestions.push("Revisa el contenido e inténtalo nuevamente.".to_string());
        }
        suggestions.truncate(SUGGESTION_CAP);
        suggestions
    }

    fn validate_attachments(&self, submission: &Submission) -> Result<(), Error> {
        if let Some(path) = &submission.image_path {
            let metadata = file_metadata(path, "imagen")?;
            if metadata.len() > self.config.image.max_bytes {
                return Err(Error::InputInvalid(format!(
                    "Imagen demasiado grande (máximo {} MB)",
                    self.config.image.max_bytes / (1024 * 1024)
                )));
            }
        }
        if let Some(path) = &submission.pdf_path {
            let metadata = file_metadata(path, "PDF")?;
            if metadata.len() > self.config.pdf.max_bytes {
                return Err(Error::InputInvalid(format!(
                    "PDF demasiado grande (máximo {} MB)",
                    self.config.pdf.max_bytes / (1024 * 1024)
                )));
            }
            check_pdf_magic(path)?;
        }
        Ok(())
    }
}

fn file_metadata(path: &Path, kind: &str) -> Result<std::fs::Metadata, Error> {
    std::fs::metadata(path)
        .map_err(|_| Error::InputInvalid(format!("No se pudo leer el archivo de {}", kind)))
}

/// The magic check runs before any parsing; a wrong header never reaches lopdf.
fn check_pdf_magic(path: &Path) -> Result<(), Error> {
    use std::io::Read;
    let mut header = [0u8; 5];
    let mut file = std::fs::File::open(path)
        .map_err(|_| Error::InputInvalid("No se pudo leer el archivo PDF".to_string()))?;
    let read = file.read(&mut header)?;
    if read < 5 || &header != b"%PDF-" {
        return Err(Error::InputInvalid(
            "El archivo no es un PDF válido".to_string(),
        ));
    }
    Ok(())
}

/// User-facing scores carry two decimals; internal blending keeps full
/// precision up to this point.
fn rounded(decision: &ModerationDecision) -> ModerationDecision {
    let mut decision = decision.clone();
    decision.overall_score = round2(decision.overall_score);
    decision.contributions.text_score = round2(decision.contributions.text_score);
    decision.contributions.image_score = decision.contributions.image_score.map(round2);
    decision.contributions.trust_score = round2(decision.contributions.trust_score);
    decision
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round2(0.678), 0.68);
        assert_eq!(round2(0.9149), 0.91);
    }

    #[test]
    fn pdf_magic_check_rejects_non_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"GIF89a").unwrap();
        assert!(matches!(
            check_pdf_magic(&path),
            Err(Error::InputInvalid(_))
        ));

        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert!(check_pdf_magic(&path).is_ok());
    }
}
