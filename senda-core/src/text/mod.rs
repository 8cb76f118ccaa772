// File: senda-core/src/text/mod.rs

pub mod lexicon;
pub mod quality;
pub mod service;

pub use quality::{QualityAssessment, TextQualityAnalyzer};
pub use service::TextModerationService;
