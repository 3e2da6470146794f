//! I/O helpers for devcrew commands.

pub mod anthropic;
pub mod artifact;
pub mod config;
pub mod console;
pub mod process;
pub mod prompt;
pub mod provider;
pub mod sandbox;
pub mod transcript;
