//! Demand CLI binary.
//!
//! Provides command-line interface for training and querying demand models.
//! Logs go to stderr; stdout carries only command output.

mod integration;

use chrono::Local;
use clap::{Parser, Subcommand};
use demand::Config;
use demand_data::{HistorySeeder, SeedConfig};
use demand_model::split::DEFAULT_SPLIT_SEED;
use demand_model::{
    ModelArtifact, ModelKey, ModelRegistry, Partitioning, RestockAdvice, SplitStrategy, Trainer,
    TrainerConfig, predictor, request,
};
use indicatif::{ProgressBar, ProgressStyle};
use integration::output::{OutputFormat, write_forecast, write_outlook_text};
use integration::store_manager::open_store;
use integration::training::run_training;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "demand")]
#[command(about = "Demand forecasting with per-product linear regression", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train models from the sales history
    Train {
        /// Train one model across all products
        #[arg(long)]
        global: bool,

        /// Hold out a random sample instead of the most recent days
        #[arg(long)]
        shuffle: bool,

        /// Seed for the shuffled split
        #[arg(long, default_value_t = DEFAULT_SPLIT_SEED)]
        seed: u64,

        /// Fraction of observations held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,

        /// Minimum daily observations per model
        #[arg(long, default_value_t = 5)]
        min_observations: usize,
    },

    /// Forecast daily demand from a saved model
    Forecast {
        /// Model artifact path
        model_path: Option<PathBuf>,

        /// Days to forecast (defaults to FORECAST_DAYS)
        days: Option<usize>,

        /// Product to forecast (required for a global model)
        #[arg(long)]
        product: Option<i64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Answer one JSON request read from stdin
    ///
    /// Requests carry a product id, so the default model is the global one
    /// written by `demand train --global`. Pass --model to use a
    /// per-product artifact instead.
    Predict {
        /// Model artifact path (defaults to MODEL_DIR/model_global.json)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Demand outlook and restock advice for a product
    Outlook {
        /// Product identifier
        product_id: i64,

        /// Horizon in days (defaults to FORECAST_DAYS)
        days: Option<usize>,

        /// Current stock (defaults to the stock recorded in the database)
        #[arg(long)]
        stock: Option<i64>,

        /// Model artifact path (defaults to the product's model in MODEL_DIR)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Replace the database contents with a synthetic history
    Seed {
        /// Months of history
        #[arg(long, default_value_t = 6)]
        months: u32,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            global,
            shuffle,
            seed,
            test_fraction,
            min_observations,
        } => {
            let trainer_config = TrainerConfig {
                partitioning: if global {
                    Partitioning::Global
                } else {
                    Partitioning::PerProduct
                },
                split: if shuffle {
                    SplitStrategy::Shuffled { seed }
                } else {
                    SplitStrategy::Chronological
                },
                test_fraction,
                min_observations,
            };
            train(&Config::from_env()?, trainer_config)?;
        }
        Commands::Forecast {
            model_path,
            days,
            product,
            format,
        } => {
            let Some(model_path) = model_path else {
                eprintln!("Usage: demand forecast <model_path> [days]");
                process::exit(1);
            };
            let days = match days {
                Some(days) => days,
                None => Config::forecast_days_from_env()?,
            };
            forecast(&model_path, days, product, format)?;
        }
        Commands::Predict { model } => {
            // Only MODEL_DIR is read here: every failure past argument
            // parsing has to reach stdout as a JSON error.
            let model_path = model.unwrap_or_else(|| {
                ModelRegistry::new(Config::model_dir_from_env()).path_for(ModelKey::Global)
            });
            let code = predict(&model_path)?;
            if code != 0 {
                process::exit(code);
            }
        }
        Commands::Outlook {
            product_id,
            days,
            stock,
            model,
            json,
        } => {
            let config = Config::from_env()?;
            outlook(
                &config,
                product_id,
                days.unwrap_or(config.forecast_days),
                stock,
                model,
                json,
            )?;
        }
        Commands::Seed { months, seed } => {
            seed_history(&Config::from_env()?, months, seed)?;
        }
    }

    Ok(())
}

fn train(config: &Config, trainer_config: TrainerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let trainer = Trainer::with_config(trainer_config)?;
    let registry = ModelRegistry::new(&config.model_dir);
    let store = open_store(&config.database)?;

    info!(
        partitioning = ?trainer.config().partitioning,
        split = %trainer.config().split,
        model_dir = %registry.root().display(),
        "Starting training"
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let report = match run_training(&store, &trainer, &registry, Some(&pb)) {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };
    pb.finish_and_clear();

    store.close()?;

    if report.is_empty_history() {
        println!("No sales history found; nothing to train.");
        return Ok(());
    }

    println!(
        "Trained {} model(s) into {}",
        report.saved.len(),
        registry.root().display()
    );
    for (key, path) in &report.saved {
        println!("  {:<12} {}", key.to_string(), path.display());
    }
    if !report.skipped.is_empty() {
        println!("Skipped {} partition(s) with insufficient data:", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {:<12} {} observation(s)", skipped.key.to_string(), skipped.observations);
        }
    }

    if !report.failed.is_empty() {
        for failed in &report.failed {
            warn!(partition = %failed.key, reason = %failed.reason, "Partition failed");
        }
        return Err(format!("{} partition(s) failed to train", report.failed.len()).into());
    }

    Ok(())
}

fn forecast(
    model_path: &Path,
    days: usize,
    product: Option<i64>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let artifact = ModelArtifact::load(model_path)?;
    info!(model = %model_path.display(), key = %artifact.key, "Model loaded");

    let today = Local::now().date_naive();
    let points = predictor::forecast(&artifact, today, days, product)?;
    write_forecast(std::io::stdout().lock(), &points, format)?;
    Ok(())
}

/// Single-request mode: every outcome is one JSON object on stdout.
///
/// Returns the process exit status.
fn predict(model_path: &Path) -> Result<i32, serde_json::Error> {
    let today = Local::now().date_naive();

    let mut input = String::new();
    let result = match std::io::stdin().read_to_string(&mut input) {
        Ok(_) => request::respond(&input, model_path, today),
        Err(e) => Err(request::PredictionError::InvalidRequest(format!(
            "Could not read stdin: {}",
            e
        ))),
    };

    match result {
        Ok(response) => {
            println!("{}", serde_json::to_string(&response)?);
            Ok(0)
        }
        Err(e) => {
            warn!(error = %e, "Prediction failed");
            println!("{}", serde_json::to_string(&e.payload())?);
            Ok(e.exit_code())
        }
    }
}

fn outlook(
    config: &Config,
    product_id: i64,
    days: usize,
    stock: Option<i64>,
    model: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ModelRegistry::new(&config.model_dir);
    let artifact = match model {
        Some(path) => ModelArtifact::load(path)?,
        None => registry.load(ModelKey::Product(product_id))?,
    };

    let today = Local::now().date_naive();
    let outlook = predictor::outlook(&artifact, product_id, today, days)?;

    let store = open_store(&config.database)?;
    let name = store.product_name(product_id)?;
    let current_stock = match stock {
        Some(stock) => stock,
        None => store.product_stock(product_id)?,
    };
    store.close()?;

    let advice = RestockAdvice::assess(&outlook, current_stock);

    if json {
        let body = serde_json::json!({
            "outlook": outlook,
            "restock": advice,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        write_outlook_text(std::io::stdout().lock(), &outlook, name.as_deref(), Some(&advice))?;
    }

    Ok(())
}

fn seed_history(config: &Config, months: u32, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config.database)?;
    let seeder = HistorySeeder::new(SeedConfig {
        months,
        seed,
        ..Default::default()
    });

    let summary = seeder.seed(&store, Local::now().date_naive())?;
    store.close()?;

    println!(
        "Seeded {} products with {} records ({} to {})",
        summary.products, summary.records, summary.start, summary.end
    );
    Ok(())
}
