use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use simplelog::{ConfigBuilder, WriteLogger};

use telepanel::api::BackendClient;
use telepanel::core::config::{self, CliOverrides};
use telepanel::core::store::LocalStore;
use telepanel::tui;

#[derive(Parser)]
#[command(name = "telepanel", about = "Terminal client for a Telegram account backend")]
struct Args {
    /// Backend base URL (overrides config and TELEPANEL_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Directory for the local store and log file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("telepanel: {e}, using defaults");
        Default::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url,
            data_dir: args.data_dir,
            log_level: args.log_level,
        },
    );

    // File logger: stdout belongs to the TUI
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Err(e) = fs::create_dir_all(&resolved.data_dir) {
        eprintln!("telepanel: cannot create {}: {e}", resolved.data_dir.display());
    }
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    info!("telepanel starting up against {}", resolved.base_url);

    let store = match LocalStore::open(&resolved.data_dir) {
        Ok(store) => store,
        Err(e) => {
            warn!("Local store unavailable ({}), nothing will persist", e);
            LocalStore::in_memory()
        }
    }
    .into_shared();

    let backend = Arc::new(BackendClient::new(resolved.base_url.clone(), store.clone()));
    tui::run(resolved, store, backend)
}
