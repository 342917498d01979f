//! CommentGuard CLI
//!
//! Trains the hybrid toxicity model from labelled JSON Lines data and checks
//! comments against a saved model.
//!
//! ```text
//! commentguard train --data comments.jsonl --output models/toxic_model.json
//! commentguard check "đm shop lừa đảo" "giày đẹp, giao nhanh"
//! commentguard inspect "mn oi sp ni dc ko"
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use commentguard_classifiers::{ModelArtifact, ToxicityModel};
use commentguard_policy::HybridDecisionEngine;

mod config;
mod data;
mod response;

use config::AppConfig;
use data::TrainingData;
use response::ModerationResponse;

#[derive(Parser, Debug)]
#[command(name = "commentguard")]
#[command(about = "Hybrid toxicity moderation for Vietnamese shop comments", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        env = "COMMENTGUARD_CONFIG",
        default_value = "commentguard.yaml"
    )]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model and write its artifact
    Train {
        /// JSON Lines file of {"text", "label"} records
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact output path (defaults to the configured model path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify comments with a trained model
    Check {
        /// Model artifact path
        #[arg(short, long, env = "COMMENTGUARD_MODEL")]
        model: Option<PathBuf>,

        /// Override policy file
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Pretty-print each response
        #[arg(long)]
        pretty: bool,

        /// Comments to check; read one per line from stdin when omitted
        texts: Vec<String>,
    },

    /// Show normalization and lexicon evidence without a model
    Inspect {
        /// Comments to inspect
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    commentguard_policy::describe_metrics();

    match cli.command {
        Command::Train { data, output } => {
            let config = AppConfig::load(&cli.config, output.as_deref(), None)?;
            train(&config, &data)
        }
        Command::Check {
            model,
            policy,
            pretty,
            texts,
        } => {
            let config = AppConfig::load(&cli.config, model.as_deref(), policy.as_deref())?;
            let texts = if texts.is_empty() { read_stdin()? } else { texts };
            check(&config, &texts, pretty)
        }
        Command::Inspect { texts } => {
            let config = AppConfig::load(&cli.config, None, None)?;
            inspect(&config, &texts)
        }
    }
}

fn train(config: &AppConfig, data_path: &Path) -> Result<()> {
    let data = TrainingData::load(data_path)?;
    if data.is_empty() {
        bail!("No training records in {}", data_path.display());
    }
    info!(records = data.len(), path = %data_path.display(), "Loaded training data");

    let classifiers = &config.classifiers;
    let normalizer = classifiers.build_normalizer()?;
    let scorer = Arc::new(classifiers.build_scorer()?);

    let (model, report) = ToxicityModel::train(
        &normalizer,
        scorer,
        classifiers.vocabulary.clone(),
        classifiers.ensemble.clone(),
        &data.texts,
        &data.labels,
    )
    .context("Training failed")?;

    let output = &config.model_path;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    model.to_artifact()?.save(output)?;
    info!(path = %output.display(), "Saved model artifact");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build_engine(config: &AppConfig) -> Result<HybridDecisionEngine> {
    let normalizer = Arc::new(config.classifiers.build_normalizer()?);
    let scorer = Arc::new(config.classifiers.build_scorer()?);
    let policy = config.policy()?;

    if !config.model_path.exists() {
        warn!(
            path = %config.model_path.display(),
            "Model artifact not found; run `commentguard train` first"
        );
        return Ok(HybridDecisionEngine::new(normalizer, scorer, policy));
    }

    let artifact = ModelArtifact::load(&config.model_path)
        .with_context(|| format!("Failed to load model {}", config.model_path.display()))?;
    let model = ToxicityModel::from_artifact(artifact, &normalizer, scorer)?;
    Ok(HybridDecisionEngine::from_model(normalizer, model, policy)?)
}

fn check(config: &AppConfig, texts: &[String], pretty: bool) -> Result<()> {
    let engine = build_engine(config)?;

    for text in texts {
        let response = match engine.decide(text) {
            Ok(decision) => ModerationResponse::from_decision(text, &decision),
            Err(e) if e.is_model_not_loaded() => ModerationResponse::degraded(text),
            Err(e) => {
                error!(error = %e, "Failed to classify comment");
                ModerationResponse::failed(text, &e)
            }
        };
        let line = if pretty {
            serde_json::to_string_pretty(&response)?
        } else {
            serde_json::to_string(&response)?
        };
        println!("{line}");
    }

    Ok(())
}

fn inspect(config: &AppConfig, texts: &[String]) -> Result<()> {
    let engine = HybridDecisionEngine::new(
        Arc::new(config.classifiers.build_normalizer()?),
        Arc::new(config.classifiers.build_scorer()?),
        config.policy()?,
    );

    for text in texts {
        println!("{}", serde_json::to_string(&engine.inspect(text))?);
    }

    Ok(())
}

fn read_stdin() -> Result<Vec<String>> {
    let stdin = std::io::stdin();
    let mut texts = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if !line.trim().is_empty() {
            texts.push(line);
        }
    }
    Ok(texts)
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("commentguard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commentguard=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
