//! Append-only prompt/result transcript (`promptsanderrors.txt`).
//!
//! The transcript is a product artifact, separate from the diagnostic log in
//! [`crate::logging`]: it is always written and unaffected by `RUST_LOG`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Labels used for transcript entries.
pub mod labels {
    pub const PROMPT: &str = "CTO Prompt";
    pub const GENERATED_CODE: &str = "Generated Code";
    pub const CREW_RESULTS: &str = "Crew Task Results";
    pub const EXECUTION_RESULT: &str = "Code Execution Result";
    pub const NEW_PROMPT: &str = "New Prompt";
}

/// Handle to the transcript file. Entries are only ever appended.
#[derive(Debug, Clone)]
pub struct Transcript {
    path: PathBuf,
}

impl Transcript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `label: body` on one line.
    pub fn append(&self, label: &str, body: &str) -> Result<()> {
        self.append_raw(&format!("{label}: {body}"))
    }

    /// Append `label:` followed by `body` starting on the next line.
    pub fn append_block(&self, label: &str, body: &str) -> Result<()> {
        self.append_raw(&format!("{label}:\n{body}"))
    }

    /// Append a free-text line as-is.
    pub fn append_raw(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create transcript dir {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open transcript {}", self.path.display()))?;
        writeln!(file, "{content}")
            .with_context(|| format!("append transcript {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_without_truncating() {
        let temp = tempfile::tempdir().expect("tempdir");
        let transcript = Transcript::new(temp.path().join("logs/transcript.txt"));

        transcript.append(labels::PROMPT, "add numbers").expect("first");
        transcript
            .append_block(labels::GENERATED_CODE, "a = 1\nprint(a)")
            .expect("second");
        transcript.append_raw("An error occurred: x").expect("third");

        let contents = fs::read_to_string(transcript.path()).expect("read");
        assert_eq!(
            contents,
            "CTO Prompt: add numbers\nGenerated Code:\na = 1\nprint(a)\nAn error occurred: x\n"
        );
    }
}
