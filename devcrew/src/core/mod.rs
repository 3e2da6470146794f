//! Pure, deterministic logic shared by the pipeline stages.

pub mod confirm;
pub mod types;
