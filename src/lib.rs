pub mod api;
pub mod branch;
pub mod build;
pub mod config;
pub mod deploy;
pub mod error;
pub mod export;
pub mod gate;
pub mod logging;
pub mod notification;
pub mod notify;
pub mod slack;
pub mod status;
pub mod utils;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

use config::Settings;
use export::FirestoreExporter;
use slack::SlackClient;

pub struct AppState {
    pub settings: Settings,
    pub slack: SlackClient,
    pub exporter: FirestoreExporter,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let http = reqwest::Client::new();
        Self {
            slack: SlackClient::new(http.clone()),
            exporter: FirestoreExporter::from_settings(http, &settings),
            settings,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;
