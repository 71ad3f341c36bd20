//! Cloud Build event structures and Pub/Sub payload decoding

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{NotifyError, Result};

/// Substitution key the Cloud Build GitHub App uses for the branch.
pub const BRANCH_NAME_KEY: &str = "BRANCH_NAME";

/// Snapshot of one Cloud Build run as published on the `cloud-builds` topic.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub status: String,
    pub source: Option<BuildSource>,
    pub create_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub timeout: Option<String>,
    pub logs_bucket: Option<String>,
    pub build_trigger_id: Option<String>,
    #[serde(default)]
    pub log_url: String,
    pub tags: Option<BuildTags>,
    pub substitutions: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSource {
    pub repo_source: Option<BuildRepoSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRepoSource {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub repo_name: String,
    #[serde(default)]
    pub branch_name: String,
}

/// Labels attached to a build. Membership is unordered, but the first tag
/// is what gets shown in the notification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct BuildTags(pub Vec<String>);

impl BuildTags {
    pub fn includes(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for BuildTags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl BuildEvent {
    /// Decode the `data` field of a Pub/Sub message into a build event.
    /// Accepts base64 as published by Cloud Build, or a JSON object that
    /// was already decoded upstream.
    pub fn from_pubsub_data(data: &str) -> Result<Self> {
        let decoded = match STANDARD.decode(data.trim()) {
            Ok(bytes) => bytes,
            Err(e) if data.trim_start().starts_with('{') => {
                debug!("Payload is not base64 ({}), parsing as JSON", e);
                data.as_bytes().to_vec()
            }
            Err(e) => {
                return Err(NotifyError::MalformedPayload(format!(
                    "Failed to decode base64 data: {}",
                    e
                )));
            }
        };
        debug!("Build data: {}", String::from_utf8_lossy(&decoded));

        serde_json::from_slice(&decoded).map_err(|e| {
            NotifyError::MalformedPayload(format!("Failed to decode to JSON: {}", e))
        })
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Branch override supplied through substitutions, if any and non-empty.
    pub fn substitution_branch(&self) -> Option<&str> {
        self.substitutions
            .as_ref()
            .and_then(|subs| subs.get(BRANCH_NAME_KEY))
            .map(String::as_str)
            .filter(|b| !b.is_empty())
    }
}
