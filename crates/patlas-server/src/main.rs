//! Patlas — patent search and collaboration-graph server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod import;
mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("PATLAS_DATA_DIR")
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--import" | "import" => {
                if args.len() < 3 {
                    eprintln!("Usage: patlas import <csv-path> [data-dir]");
                    std::process::exit(1);
                }
                let csv_path = PathBuf::from(&args[2]);
                let data_dir = if args.len() > 3 {
                    PathBuf::from(&args[3])
                } else {
                    resolve_data_dir()
                };
                let config = patlas_core::PatlasConfig::from_env(&data_dir)?;
                let store = patlas_store::PatentStore::open(&config.data_paths.db)
                    .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
                let report = import::run_import(&csv_path, &store)
                    .map_err(|e| anyhow::anyhow!("Import failed: {}", e))?;
                import::print_report(&report);
                std::process::exit(if report.errors.is_empty() { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("Patlas — patent search and collaboration-graph server");
                println!();
                println!("Usage: patlas [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  import <csv> [data-dir]  Import patent records from a CSV file");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'patlas help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = patlas_core::PatlasConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = patlas_store::PatentStore::open(&config.data_paths.db)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let state = Arc::new(AppState::new(config, store));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Patlas server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
