//! lesson-progress: progress tracking HTTP service
//!
//! ## Architecture
//! ```text
//! [video player] --(POST /lessons/{id}/progress)--> [lesson-progress]
//!                                                          |
//!                                                          v
//!                                                   [sqlite | postgres]
//! ```
//!
//! ## Configuration
//! - First argument: path to a YAML config file (optional)
//! - LESSON_PROGRESS_CONFIG: path to a YAML config file (optional)
//! - LESSON_PROGRESS__SERVER__PORT etc.: per-key overrides
//! - LESSON_PROGRESS_LOG: tracing filter (default: info)

use tracing::info;

use lesson_progress::config::Config;
use lesson_progress::handlers::rest;
use lesson_progress::services::ProgressService;
use lesson_progress::storage::init_storage;
use lesson_progress::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;

    let storage = init_storage(&config.storage).await?;
    let service = ProgressService::new(storage).with_retry(config.retry.clone());

    let addr = config.server.bind_address();
    info!(%addr, storage = ?config.storage.storage_type, "lesson-progress starting");

    rest::serve(service, &addr)
        .await
        .map_err(|e| e as Box<dyn std::error::Error>)
}
