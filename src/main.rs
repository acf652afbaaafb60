use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crm_import::app::{ImportUseCase, ResolveUseCase};
use crm_import::config::Config;
use crm_import::domain::{ColumnMapping, Customer, FieldMap, RawFieldMap};
use crm_import::logging;
use crm_import::pipeline::similarity::similarity;
use crm_import::storage::{InMemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "crm_import")]
#[command(about = "Customer record import and duplicate reconciliation")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one import against an in-memory registry and print the report
    Run {
        /// JSON array of row objects (source column -> value)
        #[arg(long)]
        rows: PathBuf,
        /// JSON object mapping internal field names to source column names
        #[arg(long)]
        mapping: PathBuf,
        /// JSON array of customer objects to seed the registry with
        #[arg(long)]
        customers: Option<PathBuf>,
        /// Filename recorded on the job
        #[arg(long, default_value = "import.csv")]
        filename: String,
        /// Optional TOML config with matcher policy overrides
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the similarity score for two strings
    Score { a: String, b: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            rows,
            mapping,
            customers,
            filename,
            config,
        } => run_import(rows, mapping, customers, filename, config).await?,
        Commands::Score { a, b } => {
            println!("similarity({a:?}, {b:?}) = {:.4}", similarity(&a, &b));
        }
    }

    Ok(())
}

async fn run_import(
    rows_path: PathBuf,
    mapping_path: PathBuf,
    customers_path: Option<PathBuf>,
    filename: String,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let rows: Vec<RawFieldMap> = serde_json::from_str(&std::fs::read_to_string(&rows_path)?)?;
    let mapping: ColumnMapping = serde_json::from_str(&std::fs::read_to_string(&mapping_path)?)?;
    let config = match config_path {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let storage = Arc::new(InMemoryStorage::new());
    if let Some(path) = customers_path {
        let seeds: Vec<FieldMap> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        for seed in &seeds {
            let mut customer = Customer::from_normalized(seed);
            storage.create_customer(&mut customer).await?;
        }
        info!("Seeded registry with {} customers", seeds.len());
    }

    let use_case = ImportUseCase::with_config(storage.clone(), config.matcher);
    let import_id = use_case
        .run_inline(&filename, None, None, &mapping, &rows)
        .await?;
    let status = use_case.status(import_id).await?;

    println!("\n📊 Import results for {}:", status.filename);
    println!("   Status: {:?}", status.status);
    println!("   Total rows: {}", status.total_rows);
    println!("   Inserted: {}", status.inserted_count);
    println!("   Errors: {}", status.error_count);
    println!("   Candidates: {}", status.candidate_count);
    if let Some(message) = &status.error_message {
        println!("   Error: {}", message);
    }

    let candidates = ResolveUseCase::new(storage)
        .list_candidates(import_id)
        .await?;
    if !candidates.is_empty() {
        println!("\n⚠️  Duplicate candidates awaiting resolution:");
        for view in &candidates {
            println!(
                "   - row {} vs customer {}: {} (score {:.2})",
                view.import_row_id, view.existing_customer_id, view.match_reason,
                view.similarity_score
            );
        }
    }

    Ok(())
}
