// File: senda-core/src/services/mod.rs

pub mod moderation_service;

pub use moderation_service::ModerationService;
