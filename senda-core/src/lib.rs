// File: senda-core/src/lib.rs

pub mod db;
pub mod config;
pub mod repositories;
pub mod text;
pub mod capabilities;
pub mod cache;
pub mod image;
pub mod pdf;
pub mod trust;
pub mod engine;
pub mod services;
pub mod tasks;

pub use db::Database;
pub use senda_common::error::Error;
