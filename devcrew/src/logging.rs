//! Diagnostic tracing for devcrew runs.
//!
//! # Separation of Concerns
//!
//! - **Diagnostic log (this module)**: timestamped, severity-tagged `tracing`
//!   events appended to `main.log` (configurable). Level from `RUST_LOG`,
//!   `info` if unset.
//!
//! - **Transcript (`io/transcript`)**: prompts, code and results in
//!   `promptsanderrors.txt`. Always written, unaffected by `RUST_LOG`.
//!
//! Warnings and errors are also mirrored to stderr in compact format,
//! whatever `RUST_LOG` says.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Open (or create) the diagnostic log for appending.
pub fn open_diagnostic_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open diagnostic log {}", path.display()))
}

/// File layer: full timestamp, level, no ANSI escapes.
pub fn diagnostic_layer<S>(file: File, filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter)
}

/// Console layer: compact lines, warnings and errors only.
pub fn console_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .compact()
        .with_filter(LevelFilter::WARN)
}

/// Install the global subscriber writing to `diagnostic_log`.
///
/// # Example
/// ```bash
/// RUST_LOG=devcrew=debug devcrew run
/// ```
pub fn init(diagnostic_log: &Path) -> Result<()> {
    let file = open_diagnostic_log(diagnostic_log)?;

    tracing_subscriber::registry()
        .with(diagnostic_layer(file, default_filter()))
        .with(console_layer(std::io::stderr))
        .try_init()
        .context("install tracing subscriber")
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_layer_appends_severity_tagged_lines() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("logs/main.log");

        for message in ["first run", "second run"] {
            let file = open_diagnostic_log(&path).expect("open");
            let subscriber =
                tracing_subscriber::registry().with(diagnostic_layer(file, EnvFilter::new("info")));
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!("{message}");
                tracing::debug!("hidden at info");
                tracing::error!("boom in {message}");
            });
        }

        let contents = fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4, "{contents}");
        assert!(lines[0].contains("INFO") && lines[0].ends_with("first run"));
        assert!(lines[1].contains("ERROR"));
        assert!(lines[3].ends_with("boom in second run"));
        assert!(!contents.contains("hidden at info"));
        assert!(!contents.contains('\u{1b}'), "no ansi escapes");
    }

    #[test]
    fn console_layer_keeps_only_warnings_and_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stderr.log");
        let file = File::create(&path).expect("create");

        let subscriber = tracing_subscriber::registry().with(console_layer(Mutex::new(file)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("routine progress");
            tracing::warn!("script removal failed");
            tracing::error!("session failed");
        });

        let contents = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2, "{contents}");
        assert!(lines[0].contains("WARN") && lines[0].contains("script removal failed"));
        assert!(lines[1].contains("ERROR") && lines[1].contains("session failed"));
        assert!(!contents.contains("routine progress"));
    }
}
