//! Runtime configuration
//!
//! `ProjectConfig` and `FirestoreConfig` come from the process environment
//! and are loaded once per process. `Settings` come from an optional TOML
//! file and are passed around explicitly.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::{NotifyError, Result};

pub const DEFAULT_SLACK_WEBHOOK_BASE: &str = "https://hooks.slack.com/services";

pub const DEFAULT_CONFIG_PATH: &str = "notifier.toml";

static PROJECT_CONFIG: OnceCell<ProjectConfig> = OnceCell::const_new();
static FIRESTORE_CONFIG: OnceCell<FirestoreConfig> = OnceCell::const_new();

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub project_id: String,
    pub slack_webhook: String,
}

impl ProjectConfig {
    pub fn new(project_id: impl Into<String>, slack_webhook: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            slack_webhook: slack_webhook.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            project_id: required_env("GCP_PROJECT")?,
            slack_webhook: required_env("SLACK_WEBHOOK")?,
        })
    }

    pub fn default_domain(&self) -> String {
        format!("{}.appspot.com", self.project_id)
    }

    pub fn career_domain(&self) -> String {
        format!("smsc-dot-{}", self.default_domain())
    }

    pub fn admin_domain(&self) -> String {
        format!("admin-dot-{}", self.default_domain())
    }

    /// Full incoming-webhook URL under `base`, normally
    /// [`DEFAULT_SLACK_WEBHOOK_BASE`].
    pub fn slack_webhook_url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.slack_webhook)
    }

    /// Pub/Sub topic Cloud Build publishes to; events from any other
    /// resource are ignored.
    pub fn watching_resource(&self) -> String {
        format!("projects/{}/topics/cloud-builds", self.project_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreConfig {
    pub project_id: String,
}

impl FirestoreConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            project_id: required_env("GCP_PROJECT")?,
        })
    }

    pub fn storage_uri_prefix(&self) -> String {
        format!("gs://{}-backup-firestore", self.project_id)
    }

    pub fn database_name(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }
}

/// Process-wide project config. Concurrent callers wait for the same load;
/// a failed load is not cached, so the next call tries again.
pub async fn project_config() -> Result<&'static ProjectConfig> {
    PROJECT_CONFIG
        .get_or_try_init(|| async { ProjectConfig::from_env() })
        .await
}

pub async fn firestore_config() -> Result<&'static FirestoreConfig> {
    FIRESTORE_CONFIG
        .get_or_try_init(|| async { FirestoreConfig::from_env() })
        .await
}

fn required_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(NotifyError::Config(format!("{} is empty", key))),
        Err(e) => Err(NotifyError::Config(format!("{}: {}", key, e))),
    }
}

/// Service settings read from the TOML config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_address: String,
    pub service_name: String,
    pub repository_url: String,
    pub username: String,
    pub icon_emoji: String,
    pub slack_webhook_base: String,
    pub log_directory: Option<PathBuf>,
    pub push_secret: Option<String>,
    pub firestore_api_base: String,
    pub metadata_token_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            service_name: "Nomos".to_string(),
            repository_url: "https://github.com/bm-sms/nomos".to_string(),
            username: "Cloud Build".to_string(),
            icon_emoji: ":cloudbuild:".to_string(),
            slack_webhook_base: DEFAULT_SLACK_WEBHOOK_BASE.to_string(),
            log_directory: None,
            push_secret: None,
            firestore_api_base: "https://firestore.googleapis.com".to_string(),
            metadata_token_url: "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token".to_string(),
        }
    }
}

impl Settings {
    /// Returns true if push requests must carry a valid signature.
    pub fn needs_push_signature(&self) -> bool {
        self.push_secret
            .as_ref()
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }
}

/// Load and parse the settings file. A missing file means defaults.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No settings file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        NotifyError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
    })?;
    let settings: Settings = toml::from_str(&content)?;

    Ok(settings)
}
