//! Persistence of the generated code to its well-known file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Overwrite `path` with `code`, creating parent directories as needed.
pub fn write_artifact(path: &Path, code: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create artifact dir {}", parent.display()))?;
    }
    fs::write(path, code).with_context(|| format!("write artifact {}", path.display()))
}
