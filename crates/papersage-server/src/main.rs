//! PaperSage — semantic search over arXiv papers.

use std::path::PathBuf;
use std::sync::Arc;

use papersage_core::{ComputeResources, PaperSageConfig};
use papersage_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("PAPERSAGE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
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
    let mut seed_demo = false;
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--demo" | "demo" => seed_demo = true,
            "--help" | "-h" | "help" => {
                println!("PaperSage — semantic search over arXiv papers");
                println!();
                println!("Usage: papersage [--demo]");
                println!();
                println!("Options:");
                println!("  --demo       Seed the three demo papers at startup");
                println!("  help         Show this help message");
                println!();
                println!("Environment: PAPERSAGE_CONFIG, PAPERSAGE_PORT, PAPERSAGE_DATA_DIR,");
                println!("  PAPERSAGE_INDEX (memory|sqlite), PAPERSAGE_PRIMARY_MODEL,");
                println!("  PAPERSAGE_FALLBACK_MODEL, PAPERSAGE_MODEL_DIR, PAPERSAGE_ARXIV_URL,");
                println!("  PAPERSAGE_SMART_MODE, PAPERSAGE_DEMO_DATA, RUST_LOG");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}. Use 'papersage help' for usage.", other);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let mut config = PaperSageConfig::from_env(&data_dir)?;
    config.model.compute = ComputeResources::discover();
    config.seed_demo_data |= seed_demo;
    let port = config.port;
    info!(
        "Compute: {} cores, {} accelerators; index backend {:?}",
        config.model.compute.cpu_cores, config.model.compute.accelerators, config.index
    );

    // Model loading and the blocking HTTP client stay off the async workers.
    let state = tokio::task::spawn_blocking(move || AppState::from_config(config))
        .await?
        .map_err(|e| anyhow::anyhow!("Failed to initialize search engine: {}", e))?;
    let state = Arc::new(state);

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("PaperSage server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
