// File: senda-common/src/models/pdf.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfContentType {
    Text,
    Images,
    Mixed,
    Unknown,
}

/// What could be learned about a PDF before choosing an analysis strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfStructure {
    pub page_count: usize,
    pub extracted_text: String,
    pub content_type: PdfContentType,
    pub text_confidence: f64,
    pub has_images: bool,
    pub is_scanned: bool,
    /// ≥2 hits from the academic/administrative vocabulary.
    pub academic_signal: bool,
    pub ocr_quality_estimate: f64,
}

/// Named analysis pipelines. Selection is a pure function of `PdfStructure`
/// plus vision availability; never random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfStrategy {
    TextOnly,
    TextPlusApprovedImages,
    ImagesWithVisionText,
    ImageModerationOnly,
    PermissiveScannedOrAcademic,
    BasicFallback,
}

impl PdfStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfStrategy::TextOnly => "text_only",
            PdfStrategy::TextPlusApprovedImages => "text_plus_approved_images",
            PdfStrategy::ImagesWithVisionText => "images_with_vision_text",
            PdfStrategy::ImageModerationOnly => "image_moderation_only",
            PdfStrategy::PermissiveScannedOrAcademic => "permissive_scanned_or_academic",
            PdfStrategy::BasicFallback => "basic_fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfAnalysisResult {
    pub approved: bool,
    pub score: f64,
    pub strategy_used: PdfStrategy,
    pub extracted_ocr_text: Option<String>,
    /// Per-page warnings, capped for user display.
    pub per_page_issues: Vec<String>,
    pub reason: Option<String>,
}
