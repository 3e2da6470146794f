//! devcrew configuration stored in `devcrew.toml`, plus the API credential.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "devcrew.toml";

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// devcrew configuration (TOML).
///
/// Missing fields default to the values the reference pipeline used.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub sandbox: SandboxConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Upper bound on generated tokens per request.
    pub max_tokens: u32,
    /// API root, without the trailing `/messages`.
    pub base_url: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            base_url: "https://api.anthropic.com/v1".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter used to run the generated script.
    pub interpreter: String,
    /// Extra arguments placed before the script path.
    pub args: Vec<String>,
    /// Suffix of the temporary script file.
    pub file_suffix: String,
    /// Wall-clock bound for one execution, in seconds.
    pub timeout_secs: u64,
    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            args: Vec::new(),
            file_suffix: ".py".to_string(),
            timeout_secs: 10,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl SandboxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// File the generated code is saved to (overwritten every run).
    pub artifact: PathBuf,
    /// Append-only prompt/result transcript.
    pub transcript: PathBuf,
    /// Append-only diagnostic log.
    pub diagnostic_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            artifact: PathBuf::from("main.py"),
            transcript: PathBuf::from("promptsanderrors.txt"),
            diagnostic_log: PathBuf::from("main.log"),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.provider.model.trim().is_empty() {
            return Err(anyhow!("provider.model must be non-empty"));
        }
        if self.provider.max_tokens == 0 {
            return Err(anyhow!("provider.max_tokens must be > 0"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("provider.timeout_secs must be > 0"));
        }
        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(anyhow!("provider.base_url must be an http(s) url"));
        }
        if self.sandbox.interpreter.trim().is_empty() {
            return Err(anyhow!("sandbox.interpreter must be non-empty"));
        }
        if self.sandbox.timeout_secs == 0 {
            return Err(anyhow!("sandbox.timeout_secs must be > 0"));
        }
        if self.sandbox.output_limit_bytes == 0 {
            return Err(anyhow!("sandbox.output_limit_bytes must be > 0"));
        }
        for (name, path) in [
            ("paths.artifact", &self.paths.artifact),
            ("paths.transcript", &self.paths.transcript),
            ("paths.diagnostic_log", &self.paths.diagnostic_log),
        ] {
            if path.as_os_str().is_empty() {
                return Err(anyhow!("{name} must be non-empty"));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AppConfig::default()`.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let cfg = AppConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AppConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

/// Provider credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key, rejecting blank values.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("{API_KEY_ENV} is empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Read the key from the process environment, loading `.env` first.
    ///
    /// Variables already set in the environment win over `.env` entries.
    pub fn from_env() -> Result<Self> {
        report_dotenv(dotenvy::dotenv());
        let raw = env::var(API_KEY_ENV).with_context(|| format!("{API_KEY_ENV} is not set"))?;
        Self::new(raw)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// Warn about a `.env` file that exists but could not be loaded.
///
/// Returns the error that was reported; a missing file is not one.
fn report_dotenv<T>(loaded: Result<T, dotenvy::Error>) -> Option<dotenvy::Error> {
    match loaded {
        Ok(_) => None,
        Err(err) if err.not_found() => None,
        Err(err) => {
            warn!(err = %err, "ignoring unreadable .env file");
            Some(err)
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
