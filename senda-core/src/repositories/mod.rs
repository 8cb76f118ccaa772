// File: senda-core/src/repositories/mod.rs

pub mod postgres;

pub use postgres::decision::PostgresDecisionRepository;
pub use postgres::moderation_log::PostgresModerationLogRepository;
pub use postgres::submission::PostgresSubmissionRepository;
