//! CLI entry point for the transit punctuality pipeline.
//!
//! Provides subcommands for cleaning raw stop-count exports, joining them
//! with daily weather, summarizing punctuality by route, and training
//! models on the punctuality targets.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_punctuality::{
    config::{CleanConfig, FeatureConfig, SplitConfig},
    loader::{load_merged, load_raw_transit, load_transit, load_weather},
    model::{ModelKind, train_classifier, train_regressor},
    output::{print_json, print_pretty, write_records},
    prepare::{
        clean::clean,
        encode::{EncodingStrategy, preprocess},
        features::{FeatureRecord, derive_from_merged, derive_from_transit},
        merge::merge_weather,
        split::train_test_split,
    },
    summary::aggregate::summarize,
};

#[derive(Parser)]
#[command(name = "transit_punctuality")]
#[command(about = "A tool to prepare transit punctuality data and train models on it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw stop-count export
    Clean {
        /// Path to the raw stop-count CSV
        #[arg(value_name = "FILE")]
        input: String,

        /// CSV file to write cleaned rows to
        #[arg(short, long, default_value = "cleaned.csv")]
        output: String,

        /// First service date kept (inclusive)
        #[arg(long, default_value = "2024-10-01")]
        from: NaiveDate,

        /// Last service date kept (inclusive)
        #[arg(long, default_value = "2025-03-31")]
        to: NaiveDate,
    },
    /// Join cleaned transit rows with daily weather observations
    Merge {
        /// Path to the cleaned transit CSV
        #[arg(value_name = "TRANSIT")]
        transit: String,

        /// Path to the daily weather CSV
        #[arg(value_name = "WEATHER")]
        weather: String,

        /// CSV file to write merged rows to
        #[arg(short, long, default_value = "merged.csv")]
        output: String,
    },
    /// Summarize punctuality by route, day type, month, and weather
    Summary {
        /// Path to a merged CSV (or a cleaned CSV with --transit-only)
        #[arg(value_name = "FILE")]
        input: String,

        /// Read a cleaned table without weather columns
        #[arg(long, default_value_t = false)]
        transit_only: bool,

        /// Minimum rows a route needs to be ranked
        #[arg(short, long, default_value_t = 10)]
        min_records: usize,

        /// How many routes to keep in each ranking
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
    /// Train models on the punctuality targets and report test-set metrics
    Train {
        /// Path to a merged CSV (or a cleaned CSV with --transit-only)
        #[arg(value_name = "FILE")]
        input: String,

        /// Model family to train
        #[arg(short, long, value_enum, default_value = "forest")]
        model: ModelArg,

        /// How text columns become numbers
        #[arg(short, long, value_enum, default_value = "label")]
        encoding: EncodingArg,

        /// Read a cleaned table without weather columns
        #[arg(long, default_value_t = false)]
        transit_only: bool,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        holdout: f64,

        /// Seed for the shuffle and the tree models
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Forest,
    Linear,
    Boosted,
}

impl From<ModelArg> for ModelKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Forest => ModelKind::Forest,
            ModelArg::Linear => ModelKind::Linear,
            ModelArg::Boosted => ModelKind::Boosted,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    Label,
    OneHot,
}

impl From<EncodingArg> for EncodingStrategy {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Label => EncodingStrategy::Label,
            EncodingArg::OneHot => EncodingStrategy::OneHot,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/transit_punctuality.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_punctuality.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean {
            input,
            output,
            from,
            to,
        } => {
            let raw = load_raw_transit(&input)?;
            let (rows, report) = clean(raw, &CleanConfig { start: from, end: to });
            write_records(&output, &rows)?;
            print_json(&report)?;
        }
        Commands::Merge {
            transit,
            weather,
            output,
        } => {
            let (merged, report) = merge_weather(load_transit(&transit)?, load_weather(&weather)?);
            write_records(&output, &merged)?;
            print_json(&report)?;
        }
        Commands::Summary {
            input,
            transit_only,
            min_records,
            top,
        } => {
            let cfg = FeatureConfig::default();
            let rows = derive_rows(&input, transit_only, &cfg)?;
            let summary = summarize(&rows, &cfg.wind_labels, &cfg.snow_labels, min_records, top)?;
            print_json(&summary)?;
        }
        Commands::Train {
            input,
            model,
            encoding,
            transit_only,
            holdout,
            seed,
        } => {
            let rows = derive_rows(&input, transit_only, &FeatureConfig::default())?;
            train_models(
                &rows,
                encoding.into(),
                model.into(),
                &SplitConfig { holdout, seed },
            )?;
        }
    }

    Ok(())
}

/// Loads a table from disk and derives model-ready punctuality rows from it.
#[tracing::instrument(skip(cfg))]
fn derive_rows(input: &str, transit_only: bool, cfg: &FeatureConfig) -> Result<Vec<FeatureRecord>> {
    let (rows, report) = if transit_only {
        derive_from_transit(load_transit(input)?, cfg)
    } else {
        derive_from_merged(load_merged(input)?, cfg)
    };
    print_pretty(&report);
    Ok(rows)
}

/// Splits, fits, and scores one model family on both punctuality targets.
#[tracing::instrument(skip(rows), fields(rows = rows.len()))]
fn train_models(
    rows: &[FeatureRecord],
    strategy: EncodingStrategy,
    kind: ModelKind,
    split_cfg: &SplitConfig,
) -> Result<()> {
    let table = preprocess(rows, strategy)?;

    if kind.supports_classification() {
        let split = train_test_split(&table.frame, "on_time_status", split_cfg)?;
        let metrics = train_classifier(kind, &split, split_cfg.seed)?;
        info!(column = "on_time_status", "Classification results");
        print_json(&metrics)?;
    } else {
        info!("Linear models skip the punctuality classifier");
    }

    let split = train_test_split(&table.frame, "late_stops", split_cfg)?;
    let metrics = train_regressor(kind, &split, split_cfg.seed)?;
    info!(column = "late_stops", "Regression results");
    print_json(&metrics)?;

    Ok(())
}
