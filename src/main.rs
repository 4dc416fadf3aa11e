//! Claim Fraud Detector - Command Line Entry Point
//!
//! Scores a single claim entered through flags, prints completed feature
//! records, or scores a JSON-lines file of override sets.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use claim_fraud_detector::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    metrics::ScoringMetrics,
    models::loader::{ClassifierSpec, ModelLoader},
    types::{
        validate_overrides, ClaimInput, FeatureOverrides, FeatureValue, IncidentSeverity,
        PoliceReport,
    },
    ClaimScorer, SchemaCompleter,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "claim-fraud")]
#[command(about = "Insurance claim fraud scoring")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one claim
    Predict {
        #[command(flatten)]
        claim: ClaimArgs,

        /// Print the scored claim as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the completed feature record for a claim
    Complete {
        #[command(flatten)]
        claim: ClaimArgs,
    },

    /// Score a JSON-lines file, one override object per line
    Batch {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Describe the configured model artifact
    Model,
}

/// Claim details as entered by a user
#[derive(Args)]
struct ClaimArgs {
    /// Customer age (18-100)
    #[arg(long, default_value_t = 35)]
    age: i64,

    /// Annual policy premium (5,000-300,000)
    #[arg(long, default_value_t = 45_000)]
    premium: i64,

    /// Total claim amount (1,000-2,000,000)
    #[arg(long, default_value_t = 120_000)]
    total_claim: i64,

    /// Incident severity
    #[arg(long, value_enum, default_value_t = IncidentSeverity::TrivialDamage)]
    severity: IncidentSeverity,

    /// Police report available
    #[arg(long, value_enum, default_value_t = PoliceReport::Yes)]
    police_report: PoliceReport,

    /// Number of witnesses (0-5)
    #[arg(long, default_value_t = 0)]
    witnesses: i64,

    /// Additional feature override (repeatable), e.g. --set insured_hobbies=chess
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    extra: Vec<(String, FeatureValue)>,
}

impl ClaimArgs {
    fn claim(&self) -> ClaimInput {
        ClaimInput {
            age: self.age,
            policy_annual_premium: self.premium,
            total_claim_amount: self.total_claim,
            incident_severity: self.severity,
            police_report_available: self.police_report,
            witnesses: self.witnesses,
        }
    }

    fn overrides(&self) -> FeatureOverrides {
        let mut overrides = self.claim().to_overrides();
        for (name, value) in &self.extra {
            overrides.insert(name.clone(), value.clone());
        }
        overrides
    }
}

fn parse_override(raw: &str) -> Result<(String, FeatureValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty feature name in '{}'", raw));
    }
    Ok((key.to_string(), FeatureValue::parse_loose(value.trim())))
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "claim_fraud_detector={0},claim_fraud={0}",
            logging.level
        ))
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    init_logging(&config.logging)?;

    info!(
        config = %cli.config.display(),
        threshold = config.detection.threshold,
        unknown_keys = ?config.schema.unknown_keys,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Predict { claim, json } => predict(&config, &claim, json),
        Commands::Complete { claim } => complete(&config, &claim),
        Commands::Batch { input, output } => batch(&config, &input, output.as_ref()),
        Commands::Model => describe_model(&config),
    }
}

fn predict(config: &AppConfig, args: &ClaimArgs, json: bool) -> Result<()> {
    let scorer = ClaimScorer::from_config(config)?;

    let scored = scorer.score(&args.overrides())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&scored)?);
    } else {
        let prediction = scored.prediction();
        let marker = if prediction.is_fraud() { "⚠️ " } else { "✅" };
        println!("{} {}", marker, prediction.headline());
        println!("Fraud Probability: {:.2}%", prediction.probability * 100.0);
    }
    Ok(())
}

fn complete(config: &AppConfig, args: &ClaimArgs) -> Result<()> {
    let overrides = args.overrides();
    if config.schema.validate_input {
        validate_overrides(&overrides)?;
    }

    let completer = SchemaCompleter::new(config.schema.unknown_keys);
    let record = completer.complete(&overrides)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn batch(config: &AppConfig, input: &PathBuf, output: Option<&PathBuf>) -> Result<()> {
    let scorer = ClaimScorer::from_config(config)?;
    let metrics = ScoringMetrics::new();

    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?,
    );
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    info!(
        input = %input.display(),
        model = %scorer.engine().model_name(),
        threshold = scorer.engine().threshold(),
        "Scoring claims"
    );

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }

        let start = Instant::now();
        let result = serde_json::from_str::<FeatureOverrides>(&line)
            .map_err(|e| format!("invalid claim: {}", e))
            .and_then(|overrides| scorer.score(&overrides).map_err(|e| e.to_string()));

        match result {
            Ok(scored) => {
                metrics.record_prediction(start.elapsed(), scored.probability, scored.label == 1);
                writeln!(writer, "{}", serde_json::to_string(&scored)?)?;
            }
            Err(error) => {
                metrics.record_failure();
                warn!(line = line_no, error = %error, "Claim could not be scored");
                let failure = serde_json::json!({ "line": line_no, "error": error });
                writeln!(writer, "{}", failure)?;
            }
        }
    }

    writer.flush()?;
    metrics.print_summary();
    Ok(())
}

fn describe_model(config: &AppConfig) -> Result<()> {
    let path = &config.model.artifact_path;
    let artifact = ModelLoader::with_threads(config.model.onnx_threads)
        .read_artifact(path)
        .with_context(|| format!("Failed to read model artifact {}", path.display()))?;

    let classifier = match &artifact.classifier {
        ClassifierSpec::LogisticRegression { coefficients, .. } => {
            format!("logistic regression ({} coefficients)", coefficients.len())
        }
        ClassifierSpec::Onnx { path } => format!("onnx ({})", path.display()),
    };

    println!("Model:               {}", artifact.model_name);
    println!("Artifact:            {}", path.display());
    println!("Numeric columns:     {}", artifact.numeric.len());
    println!("Categorical columns: {}", artifact.categorical.len());
    println!("Classifier:          {}", classifier);
    println!("Decision threshold:  {}", config.detection.threshold);
    Ok(())
}
