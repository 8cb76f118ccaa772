// File: senda-core/src/image/mod.rs

pub mod service;

pub use service::ImageModerationService;
