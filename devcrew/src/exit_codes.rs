//! Stable exit codes for devcrew CLI commands.

/// Command finished. A pipeline run whose errors were caught and reported
/// still exits with this code.
pub const OK: i32 = 0;
/// Startup failed: invalid config, missing credential, or unwritable log sink.
pub const INVALID: i32 = 1;
