//! Junior-developer / CTO code generation pipeline.
//!
//! Reads a requirement, generates Python code with an LLM, saves it to
//! `main.py`, has the CTO agent review it, and, after an explicit `yes`,
//! runs it once in a time-bounded sandbox.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use devcrew::agents::roster::default_crew;
use devcrew::exit_codes;
use devcrew::io::anthropic::AnthropicProvider;
use devcrew::io::config::{AppConfig, ApiKey, DEFAULT_CONFIG_FILE, load_config, write_config};
use devcrew::io::console::ConsoleOperator;
use devcrew::io::prompt::PromptEngine;
use devcrew::io::sandbox::Sandbox;
use devcrew::io::transcript::Transcript;
use devcrew::logging;
use devcrew::pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "devcrew",
    version,
    about = "Generate, review and run code with a two-agent LLM crew"
)]
struct Cli {
    /// Config file (missing file means defaults).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one generate -> review -> execute session.
    Run {
        /// Requirement text; asked interactively when omitted.
        #[arg(short, long)]
        prompt: Option<String>,
        /// Execute the generated code without asking.
        #[arg(short, long)]
        yes: bool,
    },
    /// Write a config file with default values.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run { prompt, yes } => cmd_run(&cli.config, prompt, yes),
        Command::Init { force } => cmd_init(&cli.config, force),
    }
}

fn cmd_run(config_path: &Path, prompt: Option<String>, yes: bool) -> Result<()> {
    let cfg = load_config(config_path)?;
    logging::init(&cfg.paths.diagnostic_log)?;

    let api_key = ApiKey::from_env().inspect_err(|err| {
        error!("Failed to initialize Anthropic client: {err:#}");
    })?;
    let provider = AnthropicProvider::new(cfg.provider.clone(), api_key)?;

    let pipeline = Pipeline {
        provider,
        prompts: PromptEngine::new()?,
        crew: default_crew()?,
        sandbox: Sandbox::new(cfg.sandbox.clone()),
        transcript: Transcript::new(cfg.paths.transcript.clone()),
        artifact_path: cfg.paths.artifact.clone(),
    };
    let mut operator = ConsoleOperator::new(prompt, yes);
    let outcome = pipeline.run_session(&mut operator);
    debug!(?outcome, "session finished");
    Ok(())
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if !force && config_path.exists() {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &AppConfig::default())?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
