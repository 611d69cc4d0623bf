use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use folio::library::BlobStore;
use folio::{Config, Database, LocalBlobStore, WebServer};

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = folio::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        folio::logging::init_console_only(&config.logging.level);
    }

    info!("Folio - project document library");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let db = match Database::open(&config.database.path, config.database.max_connections).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let blobs: Option<Arc<dyn BlobStore>> = if config.blob.enabled {
        match LocalBlobStore::new(&config.blob) {
            Ok(store) => {
                info!("Blob storage at {}", store.root().display());
                Some(Arc::new(store))
            }
            Err(e) => {
                error!("Failed to initialize blob storage: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let server = match WebServer::new(&config, db, blobs) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to configure web server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server configured on {}", server.addr());

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
