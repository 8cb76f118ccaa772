// File: senda-common/src/models/analysis.rs

use serde::{Deserialize, Serialize};

/// Where a text is being evaluated. PDF-extracted text is judged more leniently
/// on coherence because OCR output and academic prose legitimately score lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextContext {
    GeneralContent,
    PdfContent,
}

impl TextContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextContext::GeneralContent => "general_content",
            TextContext::PdfContent => "pdf_content",
        }
    }
}

/// Primary reason a text verdict was negative. `None` when the text passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    None,
    Offensive,
    Spam,
    Incoherent,
    LinksOrContact,
}

/// How the toxicity signal was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    External,
    LocalFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub valid_word_ratio: f64,
    pub has_grammar_signal: bool,
    pub lexical_diversity: f64,
}

impl QualityMetrics {
    pub fn empty() -> Self {
        Self {
            valid_word_ratio: 0.0,
            has_grammar_signal: false,
            lexical_diversity: 0.0,
        }
    }
}

/// Verdict for a single text evaluation. `score` is safety-oriented: higher is safer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub approved: bool,
    pub score: f64,
    pub flagged_terms: Vec<String>,
    pub reason_code: ReasonCode,
    pub method: AnalysisMethod,
    pub quality_metrics: QualityMetrics,
    /// Human-readable justification, present when the text was not approved.
    pub reason: Option<String>,
}

impl AnalysisResult {
    /// Immediate rejection for empty/whitespace input. No external calls are made.
    pub fn empty_input() -> Self {
        Self {
            approved: false,
            score: 0.1,
            flagged_terms: Vec::new(),
            reason_code: ReasonCode::Incoherent,
            method: AnalysisMethod::LocalFallback,
            quality_metrics: QualityMetrics::empty(),
            reason: Some("El texto está vacío".to_string()),
        }
    }

    /// Approval used by the trivial-greeting shortcut.
    pub fn trivial_approval(metrics: QualityMetrics) -> Self {
        Self {
            approved: true,
            score: 0.95,
            flagged_terms: Vec::new(),
            reason_code: ReasonCode::None,
            method: AnalysisMethod::LocalFallback,
            quality_metrics: metrics,
            reason: None,
        }
    }
}
