// File: senda-core/src/tasks/mod.rs

pub mod pending_reconciler;

pub use pending_reconciler::spawn_pending_reconciler_task;
