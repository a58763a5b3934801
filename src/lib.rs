// src/lib.rs

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod quiz;
pub mod render;
pub mod utils;

// Re-export specific items for convenience if needed
pub use api::{ApiClient, AttemptStore};
pub use quiz::synchronizer::AttemptSynchronizer;
