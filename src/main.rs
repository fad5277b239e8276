//! # Classify a price history
//! market-regime classify --prices data/spy.csv --output results/regimes.csv
//!
//! # Check the price history before classifying
//! market-regime validate --prices data/spy.csv
//!
//! # See how labels react to smoothing / confirmation settings
//! market-regime sweep --prices data/spy.csv --windows 1,3,5 --min-days 1,3,5
//!
//! # Write the default configuration
//! market-regime init-config config/default.toml

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use market_regime::data::write_table;
use market_regime::regime::Categorical;
use market_regime::{
    FeatureBuilder, FeatureRecord, PriceLoader, PriceSeriesValidator, Regime, RegimeClassifier,
    RegimeConfig, SensitivitySweep, SweepGrid,
};

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "market-regime")]
#[command(about = "Trend x volatility market regime classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every date of a price history
    Classify {
        /// Price file (csv or parquet)
        #[arg(short, long)]
        prices: PathBuf,

        /// Configuration file (TOML); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the full table (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rows to print from the end of the table
        #[arg(long, default_value_t = 5)]
        tail: usize,

        /// Minimum number of observations
        #[arg(long, default_value_t = 2000)]
        min_length: usize,

        /// Date column name
        #[arg(long, default_value = "date")]
        date_column: String,

        /// Price column name
        #[arg(long, default_value = "close")]
        price_column: String,
    },

    /// Validate a price history
    Validate {
        /// Price file (csv or parquet)
        #[arg(short, long)]
        prices: PathBuf,

        /// Minimum number of observations
        #[arg(long, default_value_t = 2000)]
        min_length: usize,

        /// Largest tolerated calendar gap in days
        #[arg(long, default_value_t = 10)]
        max_gap_days: i64,

        #[arg(long, default_value = "date")]
        date_column: String,

        #[arg(long, default_value = "close")]
        price_column: String,
    },

    /// Sweep smoothing window and min days
    Sweep {
        /// Price file (csv or parquet)
        #[arg(short, long)]
        prices: PathBuf,

        /// Configuration file (TOML); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Comma-separated smoothing windows
        #[arg(long, value_delimiter = ',', default_value = "1,3,5,10")]
        windows: Vec<usize>,

        /// Comma-separated confirmation lengths
        #[arg(long, value_delimiter = ',', default_value = "1,3,5")]
        min_days: Vec<usize>,

        /// Minimum number of observations
        #[arg(long, default_value_t = 2000)]
        min_length: usize,

        #[arg(long, default_value = "date")]
        date_column: String,

        #[arg(long, default_value = "close")]
        price_column: String,
    },

    /// Write the default configuration as TOML
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("market_regime=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            prices,
            config,
            output,
            tail,
            min_length,
            date_column,
            price_column,
        } => {
            let loader = PriceLoader::with_columns(&date_column, &price_column);
            let validator = PriceSeriesValidator::new(min_length, 10);
            cmd_classify(
                &loader,
                &validator,
                &prices,
                config.as_deref(),
                output.as_deref(),
                tail,
            )?;
        }
        Commands::Validate {
            prices,
            min_length,
            max_gap_days,
            date_column,
            price_column,
        } => {
            let loader = PriceLoader::with_columns(&date_column, &price_column);
            let validator = PriceSeriesValidator::new(min_length, max_gap_days);
            if !cmd_validate(&loader, &validator, &prices)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Sweep {
            prices,
            config,
            windows,
            min_days,
            min_length,
            date_column,
            price_column,
        } => {
            let loader = PriceLoader::with_columns(&date_column, &price_column);
            let validator = PriceSeriesValidator::new(min_length, 10);
            let grid = SweepGrid {
                smoothing_windows: windows,
                min_days,
            };
            cmd_sweep(&loader, &validator, &prices, config.as_deref(), grid)?;
        }
        Commands::InitConfig { path } => {
            RegimeConfig::default()
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&Path>) -> Result<RegimeConfig> {
    match path {
        Some(p) => RegimeConfig::load(p).with_context(|| format!("Invalid config {}", p.display())),
        None => Ok(RegimeConfig::default()),
    }
}

fn load_features(
    loader: &PriceLoader,
    validator: &PriceSeriesValidator,
    prices: &Path,
) -> Result<Vec<FeatureRecord>> {
    let points = loader
        .load(prices)
        .with_context(|| format!("Failed to load prices from {}", prices.display()))?;

    // Blocking checks abort; date gaps are only reported
    let report = validator.validate(&points);
    if let Err(e) = report.ensure_usable() {
        bail!("{} [{}]", e, report.summary());
    }
    if !report.all_passed() {
        println!("Warning: {}", report.summary());
    }

    FeatureBuilder::default()
        .build(&points)
        .context("Failed to compute features")
}

fn cmd_classify(
    loader: &PriceLoader,
    validator: &PriceSeriesValidator,
    prices: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    tail: usize,
) -> Result<()> {
    let config = load_config(config)?;
    let features = load_features(loader, validator, prices)?;

    let classifier = RegimeClassifier::new(config)?;
    let table = classifier
        .classify(&features)
        .context("Regime classification failed")?;

    let t = table.thresholds();
    println!("{}", SEPARATOR);
    println!(
        "Volatility thresholds: low={:.4} high={:.4} mid={:.4}",
        t.low, t.high, t.mid
    );
    println!("{}", SEPARATOR);
    println!(
        "{:<12} {:<20} {:<8} {:<8} {:>10}",
        "date", "regime", "trend", "vol", "confidence"
    );
    for r in table.tail(tail) {
        println!(
            "{:<12} {:<20} {:<8} {:<8} {:>10.3}",
            r.date.to_string(),
            r.regime.as_str(),
            r.trend_state.as_str(),
            r.vol_state.as_str(),
            r.confidence
        );
    }

    let stats = table.stats();
    println!("\n{}", SEPARATOR);
    println!(
        "{:<20} {:>7} {:>7} {:>9} {:>9} {:>9}",
        "regime", "days", "pct", "episodes", "avg vol", "avg conf"
    );
    for regime in Regime::ALL {
        if let Some(s) = stats.get(regime) {
            println!(
                "{:<20} {:>7} {:>6.1}% {:>9} {:>9.3} {:>9.3}",
                regime.as_str(),
                s.days,
                s.pct_of_total,
                s.episodes,
                s.avg_volatility,
                s.avg_confidence
            );
        }
    }
    println!("Confirmed regime changes: {}", table.regime_changes());
    if let Some(latest) = table.latest() {
        println!(
            "Latest ({}): {} - {}, confidence {:.3}",
            latest.date,
            latest.regime,
            latest.regime.description(),
            latest.confidence
        );
    }

    if let Some(path) = output {
        write_table(&table, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {} rows to {}", table.len(), path.display());
    }

    Ok(())
}

fn cmd_validate(loader: &PriceLoader, validator: &PriceSeriesValidator, prices: &Path) -> Result<bool> {
    let points = loader
        .load(prices)
        .with_context(|| format!("Failed to load prices from {}", prices.display()))?;
    let report = validator.validate(&points);

    println!("{}", report.summary());
    for check in &report.checks {
        let status = if check.passed { "PASS" } else { "FAIL" };
        println!("  [{}] {}: {}", status, check.name, check.message);
        if let Some(details) = &check.details {
            println!("         {}", details);
        }
    }

    Ok(report.all_passed())
}

fn cmd_sweep(
    loader: &PriceLoader,
    validator: &PriceSeriesValidator,
    prices: &Path,
    config: Option<&Path>,
    grid: SweepGrid,
) -> Result<()> {
    let config = load_config(config)?;
    let features = load_features(loader, validator, prices)?;

    let sweep = SensitivitySweep::new(config).with_grid(grid);
    let pb = ProgressBar::new(sweep.grid().total_combinations() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let points = sweep
        .run_with_progress(&features, || pb.inc(1))
        .context("Sweep failed")?;
    pb.finish_and_clear();

    println!("{}", SEPARATOR);
    println!(
        "{:<10} {:>8} {:>10} {:>12}",
        "params", "changes", "avg conf", "avg episode"
    );
    for p in &points {
        println!(
            "{:<10} {:>8} {:>10.3} {:>12.1}",
            p.params.key(),
            p.regime_changes,
            p.avg_confidence,
            p.avg_episode_days
        );
    }

    Ok(())
}
