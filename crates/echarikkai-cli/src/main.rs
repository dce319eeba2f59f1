//! `echarikkai` command-line interface.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use echarikkai_core::{
    adjust_score, analyze, categorize_risks, explain_risks, extract_entities, normalize_input,
    parse_reply, score_adjustments, Coordinates, DecisionContext, InputType, MarketKnowledgeBase,
    RiskScore, ScoreAdjustment, WeatherSummary,
};
use echarikkai_runtime::{AssessmentOrchestrator, ProviderRegistry, RuntimeConfig};

mod output;

#[derive(Parser)]
#[command(name = "echarikkai")]
#[command(about = "Early-warning risk assessment for farm plans")]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Full assessment: extraction, weather, market, reasoning and score
    Assess {
        /// Farm plan in the farmer's own words
        text: String,

        /// Farm latitude; defaults to the plan's location
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Farm longitude
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Skip weather and reasoning; report the offline analysis only
        #[arg(long)]
        offline: bool,

        /// Runtime config YAML
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Assess every non-blank line of a file
    AssessFile {
        file: PathBuf,

        /// Plans assessed at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Runtime config YAML
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Extract the decision context
    Extract { text: String },

    /// List triggered risk categories
    Categorize {
        text: String,

        /// Show which sub-rules fired
        #[arg(long)]
        explain: bool,
    },

    /// Parse a reasoning reply (stdin when FILE is omitted or "-")
    ParseReply { file: Option<PathBuf> },

    /// Apply the deterministic score adjustments
    Score {
        /// Base score proposed by the reasoning reply
        #[arg(long, allow_hyphen_values = true)]
        base: i64,

        /// Decision context as JSON
        #[arg(long)]
        context_json: Option<String>,

        /// Current rainfall in mm
        #[arg(long)]
        rainfall: Option<f64>,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let format = cli.format;

    match cli.command {
        Commands::Assess {
            text,
            lat,
            lon,
            offline,
            config,
        } => {
            let coordinates = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
                _ => None,
            };
            if offline {
                cmd_assess_offline(&text, config.as_deref(), format)
            } else {
                cmd_assess(&text, coordinates, config.as_deref(), format)
            }
        }
        Commands::AssessFile {
            file,
            concurrency,
            config,
        } => cmd_assess_file(&file, concurrency, config.as_deref(), format),
        Commands::Extract { text } => {
            let normalized = normalize_input(InputType::Text, &text)?;
            let context = extract_entities(&normalized)?;
            emit(format, &context, || output::context(&context))
        }
        Commands::Categorize { text, explain } => {
            let normalized = normalize_input(InputType::Text, &text)?;
            let context = extract_entities(&normalized)?;
            if explain {
                let findings = explain_risks(&context);
                emit(format, &findings, || output::findings(&findings))
            } else {
                let categories = categorize_risks(&context);
                emit(format, &categories, || output::categories(&categories))
            }
        }
        Commands::ParseReply { file } => {
            let text = read_input(file.as_deref())?;
            let reply = parse_reply(&text);
            emit(format, &reply, || output::reply(&reply))
        }
        Commands::Score {
            base,
            context_json,
            rainfall,
        } => {
            let context = match context_json {
                Some(json) => DecisionContext::from_json(&json).context("Invalid --context-json")?,
                None => DecisionContext::empty(),
            };
            let weather = WeatherSummary {
                rainfall,
                ..WeatherSummary::unavailable()
            };
            let report = ScoreReport {
                base,
                adjustments: score_adjustments(&context, &weather),
                score: adjust_score(base, &context, &weather),
            };
            emit(format, &report, || output::score(report.base, &report.adjustments, report.score))
        }
    }
}

#[derive(Serialize)]
struct ScoreReport {
    base: i64,
    adjustments: Vec<ScoreAdjustment>,
    score: RiskScore,
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    let config = match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn build_orchestrator(config_path: Option<&Path>) -> Result<AssessmentOrchestrator> {
    let config = load_config(config_path)?;
    let provider = ProviderRegistry::with_defaults()
        .create("ollama", &config.ollama.provider_config())
        .context("Failed to create reasoning provider")?;

    tracing::info!(
        model = %config.ollama.model,
        base_url = %config.ollama.base_url,
        "Using Ollama reasoning backend"
    );

    Ok(AssessmentOrchestrator::builder()
        .provider(provider)
        .config(config)
        .build()?)
}

#[tokio::main]
async fn cmd_assess(
    text: &str,
    coordinates: Option<Coordinates>,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let orchestrator = build_orchestrator(config_path)?;
    let assessment = orchestrator.assess_at(text, coordinates).await?;
    emit(format, &assessment, || output::assessment(&assessment))
}

#[tokio::main]
async fn cmd_assess_file(
    file: &Path,
    concurrency: usize,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let plans: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

    let orchestrator = build_orchestrator(config_path)?;
    let results = orchestrator
        .assess_batch(plans.iter().copied(), concurrency)
        .await;

    let mut assessments = Vec::with_capacity(results.len());
    for (plan, result) in plans.iter().zip(results) {
        match result {
            Ok(assessment) => assessments.push(assessment),
            Err(e) => tracing::warn!(plan = %plan, error = %e, "Skipping plan"),
        }
    }

    emit(format, &assessments, || {
        assessments
            .iter()
            .map(output::assessment)
            .collect::<Vec<_>>()
            .join("\n\n")
    })
}

fn cmd_assess_offline(text: &str, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let analysis = analyze(text)?;

    let market = match analysis.context.crop {
        Some(crop) => {
            let knowledge = match &config.market_data {
                Some(path) => MarketKnowledgeBase::from_file(path)
                    .with_context(|| format!("Failed to load market data {}", path.display()))?,
                None => MarketKnowledgeBase::builtin()?,
            };
            Some(knowledge.context_for(crop))
        }
        None => None,
    };

    #[derive(Serialize)]
    struct Offline<'a> {
        #[serde(flatten)]
        analysis: &'a echarikkai_core::Analysis,
        market: Option<echarikkai_core::MarketContext>,
    }

    let report = Offline {
        analysis: &analysis,
        market,
    };
    emit(format, &report, || output::analysis(&analysis, market.as_ref()))
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn emit<T, F>(format: OutputFormat, value: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_score_args() {
        let cli = Cli::try_parse_from([
            "echarikkai",
            "--format",
            "json",
            "score",
            "--base",
            "-3",
            "--rainfall",
            "0",
        ])
        .unwrap();

        assert!(cli.format == OutputFormat::Json);
        match cli.command {
            Commands::Score { base, rainfall, .. } => {
                assert_eq!(base, -3);
                assert_eq!(rainfall, Some(0.0));
            }
            _ => panic!("expected score"),
        }
    }

    #[test]
    fn test_lat_requires_lon() {
        assert!(Cli::try_parse_from(["echarikkai", "assess", "rice", "--lat", "13.0"]).is_err());
        assert!(Cli::try_parse_from([
            "echarikkai", "assess", "rice", "--lat", "13.0", "--lon", "80.2"
        ])
        .is_ok());
    }
}
