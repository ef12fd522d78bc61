//! The `jobcity` command line.

use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::{
    data_loader, AdaBoostStumps, ClassificationPipeline, Classifier, CrossValidationReport,
    DocFrequency, FeatureReport, MultinomialNb, PipelineError, PreprocessorConfig, Record,
    StemLem, Weighting,
};

#[derive(Parser)]
#[command(name = "jobcity", version)]
#[command(about = "Classify labelled free-text records and report cross-validated scores", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Quiet mode (warnings and results only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// K-fold cross-validate a classifier on a labelled data file
    CrossValidate(CrossValidateArgs),
    /// Train on a labelled data file, then classify new text
    Predict(PredictArgs),
}

#[derive(Args)]
struct CrossValidateArgs {
    /// Labelled records (.csv or .json)
    #[arg(long, value_name = "PATH")]
    data: PathBuf,

    /// Number of folds
    #[arg(long, default_value_t = 5)]
    folds: usize,

    /// Seed for the fold shuffle
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value = "nb")]
    classifier: ClassifierKind,

    /// Also print the N least and N most important features, fitted on all
    /// records
    #[arg(long, value_name = "N")]
    features: Option<usize>,

    #[command(flatten)]
    preprocessing: PreprocessingArgs,
}

#[derive(Args)]
struct PredictArgs {
    /// Labelled training records (.csv or .json)
    #[arg(long, value_name = "PATH")]
    data: PathBuf,

    /// Text to classify (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Read text from file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Batch process texts (one per line)
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["text", "file"])]
    batch: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "nb")]
    classifier: ClassifierKind,

    #[command(flatten)]
    preprocessing: PreprocessingArgs,
}

/// Flags shared by every subcommand; each overrides `--config`.
#[derive(Args)]
struct PreprocessingArgs {
    /// JSON pre-processor configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Stemming/lemmatization, e.g. "porter", "snowball", "wordnet+porter"
    #[arg(long, value_name = "MODES", value_parser = parse_stem_lem)]
    stem_lem: Option<StemLem>,

    /// Minimum document frequency (integer = count, decimal = proportion)
    #[arg(long, value_parser = parse_doc_frequency)]
    min_df: Option<DocFrequency>,

    /// Maximum document frequency (integer = count, decimal = proportion)
    #[arg(long, value_parser = parse_doc_frequency)]
    max_df: Option<DocFrequency>,

    /// N-gram width
    #[arg(long)]
    ngram: Option<usize>,

    /// Keep stop words
    #[arg(long)]
    no_stop_words: bool,

    /// Number of most frequent labels to keep
    #[arg(long)]
    classes: Option<usize>,

    #[arg(long, value_parser = parse_weighting)]
    weighting: Option<Weighting>,

    /// Use 1 + ln(tf) instead of raw term frequency
    #[arg(long)]
    sublinear_tf: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    /// Human-readable tables
    Human,
    /// JSON
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClassifierKind {
    /// Multinomial naive Bayes
    Nb,
    /// AdaBoost over decision stumps
    Adaboost,
}

#[derive(Clone, Copy)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

fn parse_stem_lem(s: &str) -> Result<StemLem, String> {
    s.parse().map_err(|e: jobcity_preprocessing::Error| e.to_string())
}

fn parse_doc_frequency(s: &str) -> Result<DocFrequency, String> {
    s.parse().map_err(|e: jobcity_preprocessing::Error| e.to_string())
}

fn parse_weighting(s: &str) -> Result<Weighting, String> {
    s.parse().map_err(|e: jobcity_preprocessing::Error| e.to_string())
}

impl PreprocessingArgs {
    fn to_config(&self) -> Result<PreprocessorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => PreprocessorConfig::default(),
        };

        if let Some(stem_lem) = self.stem_lem {
            config.stem_lem = stem_lem;
        }
        if let Some(min_df) = self.min_df {
            config.min_df = min_df;
        }
        if let Some(max_df) = self.max_df {
            config.max_df = max_df;
        }
        if let Some(ngram) = self.ngram {
            config.ngram = ngram;
        }
        if self.no_stop_words {
            config.use_stop_words = false;
        }
        if let Some(classes) = self.classes {
            config.num_classes = classes;
        }
        if let Some(weighting) = self.weighting {
            config.weighting = weighting;
        }
        if self.sublinear_tf {
            config.sublinear_tf = true;
        }
        Ok(config)
    }
}

fn init_tracing(verbosity: Verbosity) {
    let default_level = match verbosity {
        Verbosity::Quiet => "warn",
        Verbosity::Normal => "info",
        Verbosity::Verbose => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<Vec<Record>> {
    data_loader::load_records(path)
        .with_context(|| format!("Failed to load records from {}", path.display()))
}

pub fn run(cli: &Cli) -> Result<()> {
    let verbosity = match (cli.quiet, cli.verbose) {
        (true, _) => Verbosity::Quiet,
        (_, true) => Verbosity::Verbose,
        _ => Verbosity::Normal,
    };
    init_tracing(verbosity);
    let show_progress = !matches!(verbosity, Verbosity::Quiet);

    match &cli.command {
        Command::CrossValidate(args) => {
            let config = args.preprocessing.to_config()?;
            match args.classifier {
                ClassifierKind::Nb => cross_validate(
                    ClassificationPipeline::new(MultinomialNb::new(), config)?,
                    args,
                    cli.format,
                    show_progress,
                ),
                ClassifierKind::Adaboost => cross_validate(
                    ClassificationPipeline::new(AdaBoostStumps::new(), config)?,
                    args,
                    cli.format,
                    show_progress,
                ),
            }
        }
        Command::Predict(args) => {
            let config = args.preprocessing.to_config()?;
            match args.classifier {
                ClassifierKind::Nb => predict(
                    ClassificationPipeline::new(MultinomialNb::new(), config)?,
                    args,
                    cli.format,
                ),
                ClassifierKind::Adaboost => predict(
                    ClassificationPipeline::new(AdaBoostStumps::new(), config)?,
                    args,
                    cli.format,
                ),
            }
        }
    }
}

fn cross_validate<C: Classifier>(
    pipeline: ClassificationPipeline<C>,
    args: &CrossValidateArgs,
    format: OutputFormat,
    show_progress: bool,
) -> Result<()> {
    let records = load(&args.data)?;
    let mut pipeline = pipeline.with_progress(show_progress);
    if let Some(seed) = args.seed {
        pipeline = pipeline.with_random_state(seed);
    }

    let report = pipeline
        .cross_validate(&records, args.folds)
        .context("Cross-validation failed")?;

    let features = match args.features {
        Some(n) => {
            pipeline.fit(&records).context("Failed to fit on all records")?;
            match pipeline.feature_report(n) {
                Ok(features) => Some(features),
                Err(PipelineError::UnsupportedModel) => {
                    warn!(classifier = ?args.classifier, "Classifier has no feature importances");
                    None
                }
                Err(err) => return Err(err).context("Failed to build feature report"),
            }
        }
        None => None,
    };

    output_report(&report, features.as_ref(), format)
}

fn output_report(
    report: &CrossValidationReport,
    features: Option<&FeatureReport>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Human => {
            print!("{report}");
            if let Some(features) = features {
                println!("\nFeature importances:");
                print!("{features}");
            }
        }
        OutputFormat::Json => {
            let confusion = report
                .confusion
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect::<Vec<_>>();
            let json_output = serde_json::json!({
                "fold_scores": report.fold_scores,
                "mean_accuracy": report.mean_accuracy(),
                "classes": report.classes,
                "confusion": confusion,
                "class_scores": report.class_scores(),
                "features": features,
            });
            println!("{}", serde_json::to_string(&json_output)?);
        }
    }
    Ok(())
}

/// Texts to classify, from the first source given: argument, file, batch
/// file, stdin.
fn read_inputs(args: &PredictArgs) -> Result<Vec<String>> {
    if let Some(text) = &args.text {
        return Ok(vec![text.clone()]);
    }

    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return Ok(vec![text]);
    }

    if let Some(path) = &args.batch {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        return Ok(contents.lines().map(String::from).collect());
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(vec![buffer])
}

fn predict<C: Classifier>(
    mut pipeline: ClassificationPipeline<C>,
    args: &PredictArgs,
    format: OutputFormat,
) -> Result<()> {
    let records = load(&args.data)?;
    pipeline.fit(&records).context("Failed to fit on training records")?;

    let texts = read_inputs(args)?;
    let labels = pipeline.predict_labels(&texts)?;

    match format {
        OutputFormat::Human => {
            for label in &labels {
                println!("{label}");
            }
        }
        OutputFormat::Json => {
            let classes = pipeline.classes().unwrap_or_default();
            let json_array = labels
                .iter()
                .map(|label| {
                    serde_json::json!({
                        "class": classes.iter().position(|c| c == label),
                        "label": label,
                    })
                })
                .collect::<Vec<_>>();
            println!("{}", serde_json::to_string(&json_array)?);
        }
    }
    Ok(())
}
