//! RuralAid — conversational lookup of rural development assistance programs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ruralaid_core::RuralAidConfig;
use ruralaid_match::{Pipeline, Vocabulary};
use ruralaid_server::{build_router, AppState};
use ruralaid_store::SqliteCatalog;

fn resolve_data_dir() -> PathBuf {
    std::env::var("RURALAID_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn open_catalog(config: &RuralAidConfig) -> anyhow::Result<SqliteCatalog> {
    SqliteCatalog::open(&config.data_paths.catalog)
        .map_err(|e| anyhow::anyhow!("Failed to open catalog: {}", e))
}

/// Load the bundled seed file into an empty catalog.
fn seed_if_empty(catalog: &SqliteCatalog, seed_file: &Path) -> anyhow::Result<()> {
    if catalog.count_programs()? > 0 || !seed_file.exists() {
        return Ok(());
    }
    match catalog.load_seed_file(seed_file) {
        Ok(n) => info!("Seeded empty catalog with {} programs", n),
        Err(e) => warn!("Could not seed catalog from {}: {}", seed_file.display(), e),
    }
    Ok(())
}

fn print_help() {
    println!("RuralAid — rural development program assistant");
    println!();
    println!("Usage: ruralaid [command]");
    println!();
    println!("Commands:");
    println!("  (none)                   Start the server");
    println!("  seed <file> [data-dir]   Load programs from a JSON file into the catalog");
    println!("  ask <question>           Answer one question and exit");
    println!("  help                     Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "seed" | "--seed" => {
                if args.len() < 3 {
                    eprintln!("Usage: ruralaid seed <file.json> [data-dir]");
                    std::process::exit(1);
                }
                let data_dir = if args.len() > 3 {
                    PathBuf::from(&args[3])
                } else {
                    resolve_data_dir()
                };
                let config = RuralAidConfig::from_env(&data_dir)?;
                let catalog = open_catalog(&config)?;
                let added = catalog.load_seed_file(&args[2])?;
                println!(
                    "Added {} programs ({} total)",
                    added,
                    catalog.count_programs()?
                );
                return Ok(());
            }
            "ask" | "--ask" => {
                if args.len() < 3 {
                    eprintln!("Usage: ruralaid ask <question>");
                    std::process::exit(1);
                }
                let question = args[2..].join(" ");
                let config = RuralAidConfig::from_env(resolve_data_dir())?;
                let catalog = open_catalog(&config)?;
                seed_if_empty(&catalog, &config.data_paths.seed_file)?;
                let vocabulary = Vocabulary::load_or_default(&config.data_paths.vocabulary_file);
                let pipeline = Pipeline::new(vocabulary, Arc::new(catalog))
                    .with_limit(config.result_limit);
                println!("{}", pipeline.answer(&question).await);
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'ruralaid help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = RuralAidConfig::from_env(&data_dir)?;
    let port = config.port;

    let catalog = open_catalog(&config)?;
    seed_if_empty(&catalog, &config.data_paths.seed_file)?;

    let vocabulary = Vocabulary::load_or_default(&config.data_paths.vocabulary_file);
    info!("Vocabulary: {} terms", vocabulary.len());

    let state = Arc::new(AppState::new(config, Arc::new(catalog), vocabulary));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("RuralAid server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
