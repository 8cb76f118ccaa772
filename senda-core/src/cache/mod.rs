// File: senda-core/src/cache/mod.rs

pub mod result_cache;

pub use result_cache::ModerationResultCache;
