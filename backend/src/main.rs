//! Disaster Response CLI - clean, train, serve
//!
//! # Main Commands
//!
//! ```bash
//! disaster-response etl messages.csv categories.csv DisasterResponse.db
//! disaster-response train DisasterResponse.db models/classifier.json
//! disaster-response serve                      # HTTP server (port 5000)
//! ```
//!
//! # Extra Commands
//!
//! ```bash
//! disaster-response predict models/classifier.json "We need water"
//! disaster-response corpus DisasterResponse.db corpus/
//! ```

use clap::{Parser, Subcommand};
use disaster_response::{
    classifier::{ModelArtifact, ParamGrid},
    run_corpus, run_etl, run_training, start_server, CorpusOptions, EtlOptions, ServeConfig,
    TextColumn, TrainOptions,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "disaster-response")]
#[command(about = "Disaster response message ETL, classifier training and API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge and clean the raw CSVs into a SQLite table
    Etl {
        /// Messages CSV (id, message, original, genre)
        messages: PathBuf,

        /// Categories CSV (id, categories)
        categories: PathBuf,

        /// SQLite database to write
        database: PathBuf,

        /// Destination table
        #[arg(long, default_value = "dataset")]
        table: String,
    },

    /// Grid-search, evaluate and save the classifier
    Train {
        /// SQLite database written by `etl`
        database: PathBuf,

        /// Model file to write
        model: PathBuf,

        #[arg(long, default_value = "dataset")]
        table: String,

        /// Seed for shuffling, splitting and the forest
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Held-out fraction
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Cross-validation folds
        #[arg(long, default_value = "3")]
        folds: usize,

        /// Text column used as input
        #[arg(long, value_enum, default_value = "message")]
        text_column: TextColumn,

        /// Single small configuration instead of the full grid
        #[arg(long)]
        quick: bool,
    },

    /// Start HTTP server
    Serve {
        /// Bind address (env DR_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (env DR_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database (env DR_DATABASE)
        #[arg(long)]
        database: Option<PathBuf>,

        /// Table name (env DR_TABLE)
        #[arg(long)]
        table: Option<String>,

        /// Model file (env DR_MODEL_PATH)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Archive to download when the model is missing (env DR_MODEL_URL)
        #[arg(long)]
        model_url: Option<String>,

        /// Directory served for unknown paths (env DR_STATIC_DIR)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Rank labels for one message
    Predict {
        /// Model file
        model: PathBuf,

        /// Message text
        text: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Export train/dev/test JSONL files
    Corpus {
        /// SQLite database written by `etl`
        database: PathBuf,

        /// Output directory
        out_dir: PathBuf,

        #[arg(long, default_value = "dataset")]
        table: String,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Train fraction; the rest is halved into dev and test
        #[arg(long, default_value = "0.75")]
        split: f64,

        #[arg(long, value_enum, default_value = "message")]
        text_column: TextColumn,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Etl {
            messages,
            categories,
            database,
            table,
        } => cmd_etl(&messages, &categories, &database, table).await,

        Commands::Train {
            database,
            model,
            table,
            seed,
            test_size,
            folds,
            text_column,
            quick,
        } => {
            let options = TrainOptions {
                table,
                seed,
                test_size,
                folds,
                grid: if quick { ParamGrid::quick() } else { ParamGrid::default() },
                text_column,
            };
            cmd_train(&database, &model, options).await
        }

        Commands::Serve {
            host,
            port,
            database,
            table,
            model,
            model_url,
            static_dir,
        } => {
            let mut config = ServeConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(database) = database {
                config.database = database;
            }
            if let Some(table) = table {
                config.table = table;
            }
            if let Some(model) = model {
                config.model_path = model;
            }
            if model_url.is_some() {
                config.model_url = model_url;
            }
            if static_dir.is_some() {
                config.static_dir = static_dir;
            }
            cmd_serve(config).await
        }

        Commands::Predict { model, text, json } => cmd_predict(&model, &text, json),

        Commands::Corpus {
            database,
            out_dir,
            table,
            seed,
            split,
            text_column,
        } => {
            let options = CorpusOptions {
                table,
                seed,
                split,
                text_column,
            };
            cmd_corpus(&database, &out_dir, options).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_etl(
    messages: &Path,
    categories: &Path,
    database: &Path,
    table: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = run_etl(messages, categories, database, EtlOptions { table }).await?;

    eprintln!("\n📊 Summary");
    eprintln!("   Messages read:      {}", summary.messages_read);
    eprintln!("   Category rows read: {}", summary.categories_read);
    eprintln!("   Merged rows:        {}", summary.merged_rows);
    eprintln!("   Duplicates removed: {}", summary.duplicates_removed);
    eprintln!("   Values 2 -> 0:      {}", summary.normalized_values);
    eprintln!("   Rows written:       {}", summary.rows_written);
    eprintln!("   Labels:             {}", summary.labels.len());
    Ok(())
}

async fn cmd_train(
    database: &Path,
    model: &Path,
    options: TrainOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = run_training(database, model, &options).await?;

    eprintln!("\n📊 Summary");
    eprintln!("   Train rows:  {}", summary.train_rows);
    eprintln!("   Test rows:   {}", summary.test_rows);
    eprintln!("   Best params: {}", summary.search.best);
    eprintln!("   CV micro-F1: {:.4}", summary.search.best_score);
    eprintln!("   Test micro-F1: {:.4}", summary.report.micro.f1);
    Ok(())
}

async fn cmd_serve(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    start_server(config).await?;
    Ok(())
}

fn cmd_predict(model: &Path, text: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let artifact = ModelArtifact::load(model)?;
    let ranked = artifact.rank(text);

    if json {
        let pairs: Vec<(&str, f64)> = ranked.iter().map(|s| (s.label.as_str(), s.score)).collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "results": pairs }))?);
        return Ok(());
    }

    let width = ranked.iter().map(|s| s.label.len()).max().unwrap_or(0);
    for score in &ranked {
        let mark = if score.score >= disaster_response::classifier::DECISION_THRESHOLD {
            "✓"
        } else {
            " "
        };
        println!("{} {:<width$} {:.3}", mark, score.label, score.score);
    }
    Ok(())
}

async fn cmd_corpus(
    database: &Path,
    out_dir: &Path,
    options: CorpusOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = run_corpus(database, out_dir, &options).await?;
    for file in &summary.files {
        eprintln!("   💾 {}", file.display());
    }
    Ok(())
}
