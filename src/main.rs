use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use tourism_marketplace::adapters::memory::store::MemoryStore;
use tourism_marketplace::adapters::postgrest::client::PostgrestStore;
use tourism_marketplace::config::load_config;
use tourism_marketplace::config::types::StorageBackend;
use tourism_marketplace::http::{self, AppState};
use tourism_marketplace::ports::store::TableStore;

fn find_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("MARKET_CONFIG") {
        return PathBuf::from(path);
    }

    let candidates = [
        PathBuf::from("config.yaml"),
        binary_dir().join("config.yaml"),
    ];

    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn binary_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting tourism-marketplace");

    let config_path = find_config_path();
    let config = load_config(&config_path)?;

    let store: Arc<dyn TableStore> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Postgrest => {
            tracing::info!("Using PostgREST storage");
            Arc::new(PostgrestStore::from_config(&config.storage)?)
        }
    };

    let state = AppState::new(store, &config.server.environment);
    http::serve(&config.server, state).await?;

    Ok(())
}
