// File: senda-core/src/pdf/mod.rs

pub mod orchestrator;
pub mod rasterize;
pub mod strategy;
pub mod structure;

pub use orchestrator::PdfAnalysisOrchestrator;
pub use rasterize::{PdfPageRasterizer, RasterBackend};
pub use strategy::select_strategy;
pub use structure::PdfStructureAnalyzer;
