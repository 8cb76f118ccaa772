// File: senda-core/src/capabilities/mod.rs
//
// External capabilities the engine orchestrates. Every capability is an async
// trait with a mandatory per-call timeout; failures are values routed through
// the documented fallback paths, never unhandled errors.

pub mod image_analyzer;
pub mod toxicity;
pub mod vision;

pub use image_analyzer::{
    AnalyzerVerdict, ExternalImageAnalyzer, HttpImageAnalyzer, SubprocessImageAnalyzer,
};
pub use toxicity::{HttpToxicityClassifier, LocalToxicityFallback, ToxicityClassifier};
pub use vision::{HttpVisionService, VisionExtraction, VisionService};
