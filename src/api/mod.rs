//! API module for all HTTP handlers

pub mod pubsub;
pub mod stats;

use axum::{Router, routing};

use crate::SharedState;

// Re-export handlers
pub use pubsub::{handle_backup, handle_cloud_build};
pub use stats::{root, status};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route("/status", routing::get(status))
        .route("/pubsub/cloud-builds", routing::post(handle_cloud_build))
        .route("/pubsub/backup-firestore", routing::post(handle_backup))
        .with_state(state)
}
