// File: senda-core/src/repositories/postgres/mod.rs

pub mod decision;
pub mod moderation_log;
pub mod submission;
