//! Relay client for the scoring service.
//!
//! Thin CLI over the non-interception call sites: run a prompt through the
//! sanitize endpoint (with the local rule table as offline fallback) or
//! probe the service's liveness. The interception engine itself is a
//! library; see the crate docs.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use promptgate::config::GuardConfig;
use promptgate::gate::merge_detection;
use promptgate::rules::RuleSet;
use promptgate::scanner::{HttpScanner, RemoteScanner};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "promptgate", version, about = "Prompt screening relay client")]
struct Cli {
    /// Explicit config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a prompt: local rules plus the remote scorer when reachable.
    Scan {
        /// The prompt text to screen.
        text: String,
        /// Skip the remote call and report local detection only.
        #[arg(long)]
        local_only: bool,
    },
    /// Probe the scoring service's health endpoint.
    Probe,
    /// List the builtin rule table.
    Rules,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GuardConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GuardConfig::load().context("loading config")?,
    };

    match cli.command {
        Command::Scan { text, local_only } => scan(&config, &text, local_only).await,
        Command::Probe => probe(&config).await,
        Command::Rules => {
            let rules = RuleSet::builtin().context("compiling builtin rules")?;
            for (name, tier) in rules.entries() {
                println!("{tier:<26} {name}");
            }
            Ok(())
        }
    }
}

async fn scan(config: &GuardConfig, text: &str, local_only: bool) -> anyhow::Result<()> {
    let rules = RuleSet::builtin().context("compiling builtin rules")?;
    let local = rules.detect(text);

    let outcome = if local_only {
        promptgate::scanner::ScanOutcome::Unavailable
    } else {
        let scanner = HttpScanner::new(config).context("building scanner")?;
        let outcome = scanner.scan(text).await;
        if outcome.is_unavailable() {
            eprintln!("remote scorer unavailable, local checks only");
        }
        outcome
    };

    let result = merge_detection(text, local, &outcome);
    if result.is_safe() {
        println!("safe");
        return Ok(());
    }

    println!("risk: {}", result.risk_level);
    for threat in &result.threats {
        match threat.severity {
            Some(severity) => println!("threat: {} [{}] severity {severity}/10", threat.name, threat.tier),
            None => println!("threat: {} [{}]", threat.name, threat.tier),
        }
    }
    for label in &result.pii_labels {
        println!("pii: {label}");
    }
    if result.sanitized_text != text {
        println!("sanitized: {}", result.sanitized_text);
    }
    Ok(())
}

async fn probe(config: &GuardConfig) -> anyhow::Result<()> {
    let scanner = HttpScanner::new(config).context("building scanner")?;
    if scanner.probe().await {
        println!("ok: {}", config.health_url());
        Ok(())
    } else {
        anyhow::bail!("scoring service unreachable at {}", config.health_url());
    }
}
