// File: senda-common/src/models/mod.rs
pub mod analysis;
pub mod decision;
pub mod image;
pub mod pdf;
pub mod submission;

pub use analysis::{AnalysisMethod, AnalysisResult, QualityMetrics, ReasonCode, TextContext};
pub use decision::{DecisionStatus, ModerationDecision, ModerationOutcome, ScoreContributions, TrustScore};
pub use image::{ImageAnalysisResult, ViolenceSignal, WeaponSignal};
pub use pdf::{PdfAnalysisResult, PdfContentType, PdfStrategy, PdfStructure};
pub use submission::{ModerationLogEntry, Submission, SubmitterHistory};
