// File: senda-core/src/pdf/orchestrator.rs

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use senda_common::models::{
    AnalysisResult, ImageAnalysisResult, PdfAnalysisResult, PdfStrategy, PdfStructure, TextContext,
};
use senda_common::Error;

use crate::capabilities::vision::VisionService;
use crate::config::{PdfPolicy, PermissivePolicy};
use crate::image::ImageModerationService;
use crate::pdf::rasterize::PdfPageRasterizer;
use crate::pdf::strategy::select_strategy;
use crate::pdf::structure::PdfStructureAnalyzer;
use crate::text::TextModerationService;

const TRUNCATION_MARKER: &str = "\n\n...[texto recortado]...\n\n";

/// Executes the strategy selected for a PDF, invoking the text and image
/// services and OCR as the strategy requires, and merges their results.
/// Infrastructure failures degrade to permissive defaults; the user is never
/// rejected for a capability outage.
pub struct PdfAnalysisOrchestrator {
    structure_analyzer: PdfStructureAnalyzer,
    text_service: Arc<TextModerationService>,
    image_service: Arc<ImageModerationService>,
    rasterizer: PdfPageRasterizer,
    vision: Option<Arc<dyn VisionService>>,
    policy: PdfPolicy,
    permissive: PermissivePolicy,
    max_text_chars: usize,
}

impl PdfAnalysisOrchestrator {
    pub fn new(
        text_service: Arc<TextModerationService>,
        image_service: Arc<ImageModerationService>,
        rasterizer: PdfPageRasterizer,
        vision: Option<Arc<dyn VisionService>>,
        policy: PdfPolicy,
        permissive: PermissivePolicy,
        max_text_chars: usize,
    ) -> Self {
        Self {
            structure_analyzer: PdfStructureAnalyzer::new(),
            text_service,
            image_service,
            rasterizer,
            vision,
            policy,
            permissive,
            max_text_chars,
        }
    }

    pub async fn analyze(&self, pdf_path: &Path, submitter_key: &str) -> PdfAnalysisResult {
        let structure = match self.structure_analyzer.analyze(pdf_path) {
            Ok(structure) => structure,
            Err(e) => {
                // Protected or corrupt document: no usable signal, approve
                // with reduced confidence instead of rejecting.
                warn!("PDF structure analysis failed: {}", e);
                return inconclusive_result(
                    PdfStrategy::BasicFallback,
                    vec!["PDF posiblemente escaneado o protegido".to_string()],
                );
            }
        };
        self.analyze_with_structure(pdf_path, structure, submitter_key)
            .await
    }

    /// Strategy dispatch on a pre-computed structure. Split out so the
    /// pipeline can be exercised without crafting real PDF files.
    pub async fn analyze_with_structure(
        &self,
        pdf_path: &Path,
        structure: PdfStructure,
        submitter_key: &str,
    ) -> PdfAnalysisResult {
        let strategy = select_strategy(&structure, self.vision.is_some());
        info!(
            strategy = strategy.as_str(),
            pages = structure.page_count,
            "executing PDF analysis strategy"
        );

        let mut result = match strategy {
            PdfStrategy::TextOnly => self.run_text_only(&structure, submitter_key).await,
            PdfStrategy::TextPlusApprovedImages
            | PdfStrategy::ImagesWithVisionText
            | PdfStrategy::ImageModerationOnly
            | PdfStrategy::PermissiveScannedOrAcademic => {
                self.run_image_pipeline(pdf_path, &structure, strategy, submitter_key)
                    .await
            }
            PdfStrategy::BasicFallback => {
                self.basic_fallback_or_inconclusive(&structure, submitter_key)
                    .await
            }
        };

        result.per_page_issues.truncate(self.policy.issue_display_cap);
        result
    }

    async fn run_text_only(&self, structure: &PdfStructure, submitter_key: &str) -> PdfAnalysisResult {
        let text = truncate_head_tail(&structure.extracted_text, self.max_text_chars);
        let verdict = self
            .text_service
            .evaluate(&text, TextContext::PdfContent, submitter_key)
            .await;

        let score = blend_score(Some(verdict.score), 0, 0, structure.is_scanned);
        PdfAnalysisResult {
            approved: verdict.approved,
            score,
            strategy_used: PdfStrategy::TextOnly,
            extracted_ocr_text: None,
            per_page_issues: Vec::new(),
            reason: if verdict.approved { None } else { verdict.reason },
        }
    }

    async fn run_image_pipeline(
        &self,
        pdf_path: &Path,
        structure: &PdfStructure,
        strategy: PdfStrategy,
        submitter_key: &str,
    ) -> PdfAnalysisResult {
        let permissive = strategy == PdfStrategy::PermissiveScannedOrAcademic;
        let wants_ocr = matches!(
            strategy,
            PdfStrategy::TextPlusApprovedImages
                | PdfStrategy::ImagesWithVisionText
                | PdfStrategy::PermissiveScannedOrAcademic
        );

        let rasterized = match self.rasterizer.rasterize(pdf_path).await {
            Ok(rasterized) => rasterized,
            Err(e) => {
                warn!("PDF rasterization failed entirely: {}", e);
                let mut fallback = self
                    .basic_fallback_or_inconclusive(structure, submitter_key)
                    .await;
                fallback.strategy_used = strategy;
                fallback
                    .per_page_issues
                    .push("No se pudieron convertir las páginas del PDF".to_string());
                return fallback;
            }
        };

        let mut issues: Vec<String> = Vec::new();
        let mut ocr_pool = String::new();
        let mut analyzed_pages = 0usize;
        let mut failed_pages = 0usize;
        let mut dangerous_pages = 0usize;

        for (index, page) in rasterized.pages.iter().enumerate() {
            let page_number = index + 1;
            let verdict = self.image_service.evaluate(page).await;
            analyzed_pages += 1;

            if verdict.analyzer_error.is_some() {
                // recorded as a warning, not a hard failure
                failed_pages += 1;
                issues.push(format!("Página {}: análisis de imagen no disponible", page_number));
            } else if !verdict.approved {
                if permissive && self.reconsider_image(&verdict) {
                    issues.push(format!(
                        "Página {}: señal de riesgo leve aceptada por documento escaneado/académico",
                        page_number
                    ));
                } else {
                    dangerous_pages += 1;
                    issues.push(format!(
                        "Página {}: {}",
                        page_number,
                        verdict.reason.as_deref().unwrap_or("contenido inapropiado")
                    ));
                }
            }

            if wants_ocr {
                if let Some(vision) = &self.vision {
                    match vision.extract(page).await {
                        Ok(extraction) => {
                            if !extraction.extracted_text.trim().is_empty() {
                                ocr_pool.push_str(extraction.extracted_text.trim());
                                ocr_pool.push('\n');
                            }
                        }
                        Err(e) => {
                            warn!("OCR failed on page {}: {}", page_number, e);
                            issues.push(format!("Página {}: OCR no disponible", page_number));
                        }
                    }
                }
            }
        }

        if analyzed_pages > 0 && failed_pages == analyzed_pages {
            let mut fallback = self
                .basic_fallback_or_inconclusive(structure, submitter_key)
                .await;
            fallback.strategy_used = strategy;
            fallback.per_page_issues.extend(issues);
            return fallback;
        }

        // One text verdict over the concatenation of extractable and OCR text.
        let mut text_pool = structure.extracted_text.clone();
        if !ocr_pool.is_empty() {
            if !text_pool.is_empty() {
                text_pool.push('\n');
            }
            text_pool.push_str(&ocr_pool);
        }

        let text_verdict = if text_pool.trim().len() >= self.policy.min_text_chars {
            let text = truncate_head_tail(&text_pool, self.max_text_chars);
            Some(
                self.text_service
                    .evaluate(&text, TextContext::PdfContent, submitter_key)
                    .await,
            )
        } else {
            None
        };

        let mut text_ok = true;
        let mut reason = None;
        if let Some(verdict) = &text_verdict {
            if !verdict.approved {
                if permissive && self.reconsider_text(verdict) {
                    issues.push(
                        "Texto dudoso aceptado por documento escaneado/académico".to_string(),
                    );
                } else {
                    text_ok = false;
                    reason = verdict.reason.clone();
                }
            }
        }

        let images_ok = dangerous_pages == 0;
        let approved = text_ok && images_ok;
        if reason.is_none() && !images_ok {
            reason = Some("El documento contiene imágenes inapropiadas".to_string());
        }

        let score = blend_score(
            text_verdict.as_ref().map(|v| v.score),
            analyzed_pages - failed_pages,
            dangerous_pages,
            structure.is_scanned,
        );

        PdfAnalysisResult {
            approved,
            score,
            strategy_used: strategy,
            extracted_ocr_text: if ocr_pool.is_empty() { None } else { Some(ocr_pool) },
            per_page_issues: issues,
            reason: if approved { None } else { reason },
        }
    }

    async fn basic_fallback_or_inconclusive(
        &self,
        structure: &PdfStructure,
        submitter_key: &str,
    ) -> PdfAnalysisResult {
        match self.run_basic_fallback(structure, submitter_key).await {
            Ok(result) => result,
            Err(e) => {
                warn!("PDF has no usable signal: {}", e);
                inconclusive_result(
                    PdfStrategy::BasicFallback,
                    vec!["PDF posiblemente escaneado o protegido".to_string()],
                )
            }
        }
    }

    /// Text-only verdict over whatever extractable text is left. Too little
    /// text to judge at all is an `AnalysisInconclusive`.
    async fn run_basic_fallback(
        &self,
        structure: &PdfStructure,
        submitter_key: &str,
    ) -> Result<PdfAnalysisResult, Error> {
        if structure.extracted_text.trim().len() < self.policy.min_text_chars {
            return Err(Error::AnalysisInconclusive(
                "texto extraíble insuficiente para un veredicto".to_string(),
            ));
        }
        let text = truncate_head_tail(&structure.extracted_text, self.max_text_chars);
        let verdict = self
            .text_service
            .evaluate(&text, TextContext::PdfContent, submitter_key)
            .await;
        let score = blend_score(Some(verdict.score), 0, 0, structure.is_scanned);
        Ok(PdfAnalysisResult {
            approved: verdict.approved,
            score,
            strategy_used: PdfStrategy::BasicFallback,
            extracted_ocr_text: None,
            per_page_issues: Vec::new(),
            reason: if verdict.approved { None } else { verdict.reason },
        })
    }

    /// Looser permissive cutoff: a rejected page whose risk stayed below the
    /// configured ceiling is accepted with a caveat.
    fn reconsider_image(&self, verdict: &ImageAnalysisResult) -> bool {
        verdict.risk_score < self.permissive.max_image_risk
    }

    /// A text rejection is reconsidered when it was quality-driven, or when
    /// the implied toxicity stayed below the looser permissive cutoff.
    fn reconsider_text(&self, verdict: &AnalysisResult) -> bool {
        use senda_common::models::ReasonCode;
        verdict.reason_code == ReasonCode::Incoherent
            || (1.0 - verdict.score) <= self.permissive.max_text_toxicity
    }
}

/// No usable signal: approve with reduced confidence rather than reject.
fn inconclusive_result(strategy: PdfStrategy, issues: Vec<String>) -> PdfAnalysisResult {
    PdfAnalysisResult {
        approved: true,
        score: 0.3,
        strategy_used: strategy,
        extracted_ocr_text: None,
        per_page_issues: issues,
        reason: None,
    }
}

/// Text score blended with the visual danger signal: the flagged-page ratio
/// deducts up to half, a scanned document deducts a fifth, clamped to
/// [0.1, 1.0]. More risk dominates.
fn blend_score(
    text_score: Option<f64>,
    analyzed_pages: usize,
    dangerous_pages: usize,
    is_scanned: bool,
) -> f64 {
    let mut score = text_score.unwrap_or(0.3);
    if analyzed_pages > 0 {
        let danger_ratio = dangerous_pages as f64 / analyzed_pages as f64;
        score -= danger_ratio * 0.5;
    }
    if is_scanned {
        score -= 0.2;
    }
    score.clamp(0.1, 1.0)
}

/// Keeps the head and tail of an oversized text, never the middle; the
/// title and conclusion carry the most signal.
pub(crate) fn truncate_head_tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let half = max_chars / 2;
    let head: String = text.chars().take(half).collect();
    let tail: String = text
        .chars()
        .skip(count - half)
        .collect();
    format!("{}{}{}", head, TRUNCATION_MARKER, tail)
}
