//! Runs one Firestore export and exits, for use from cron or a shell.

use cloudbuild_notifier::config::{DEFAULT_CONFIG_PATH, Settings, firestore_config, load_settings};
use cloudbuild_notifier::error::Result;
use cloudbuild_notifier::export::{FirestoreExporter, backup_firestore};
use cloudbuild_notifier::logging::setup_logging;
use tracing::error;

async fn run(settings: &Settings) -> Result<()> {
    let config = firestore_config().await?;

    let exporter = FirestoreExporter::from_settings(reqwest::Client::new(), settings);
    backup_firestore(config, &exporter).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config_path =
        std::env::var("NOTIFIER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let settings = match load_settings(&config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let log_guard = match setup_logging(settings.log_directory.clone()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&settings).await {
        error!("Backup failed: {}", e);
        eprintln!("Error: {}", e);
        // exit skips destructors; flush file logs first
        drop(log_guard);
        std::process::exit(1);
    }
}
