//! Firestore export (backup) through the Firestore admin REST API

use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use tracing::info;

use crate::config::{FirestoreConfig, Settings};
use crate::error::{NotifyError, Result};

/// Long-running operation returned by `exportDocuments`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

pub trait DocumentExporter {
    fn export_documents(
        &self,
        output_uri_prefix: &str,
        database_name: &str,
    ) -> impl Future<Output = Result<ExportOperation>> + Send;
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

/// Exporter authenticated with the runtime service account, whose token
/// comes from the metadata server.
#[derive(Debug, Clone)]
pub struct FirestoreExporter {
    http: reqwest::Client,
    api_base: String,
    token_url: String,
}

impl FirestoreExporter {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            token_url: token_url.into(),
        }
    }

    pub fn from_settings(http: reqwest::Client, settings: &Settings) -> Self {
        Self::new(
            http,
            settings.firestore_api_base.clone(),
            settings.metadata_token_url.clone(),
        )
    }

    async fn access_token(&self) -> Result<String> {
        let response = self
            .http
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Export(format!(
                "Failed to get an access token: {}",
                response.status()
            )));
        }
        let token: AccessToken = response.json().await?;
        Ok(token.access_token)
    }
}

impl DocumentExporter for FirestoreExporter {
    async fn export_documents(
        &self,
        output_uri_prefix: &str,
        database_name: &str,
    ) -> Result<ExportOperation> {
        let token = self.access_token().await?;
        let url = format!("{}/v1/{}:exportDocuments", self.api_base, database_name);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "outputUriPrefix": output_uri_prefix }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Export(format!("{}: {}", status, body)));
        }

        Ok(response.json().await?)
    }
}

/// Starts one export of the default database into the backup bucket.
pub async fn backup_firestore<E: DocumentExporter>(
    config: &FirestoreConfig,
    exporter: &E,
) -> Result<ExportOperation> {
    let operation = exporter
        .export_documents(&config.storage_uri_prefix(), &config.database_name())
        .await?;
    info!(operation = %operation.name, "Backup started successfully");
    Ok(operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_token(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/token"))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(server)
            .await;
    }

    fn exporter(server: &MockServer) -> FirestoreExporter {
        FirestoreExporter::new(
            reqwest::Client::new(),
            server.uri(),
            format!("{}/token", server.uri()),
        )
    }

    fn config() -> FirestoreConfig {
        FirestoreConfig {
            project_id: "test-project".to_string(),
        }
    }

    #[tokio::test]
    async fn test_backup_exports_default_database() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/test-project/databases/(default):exportDocuments",
            ))
            .and(header("Authorization", "Bearer ya29.token"))
            .and(body_json(json!({
                "outputUriPrefix": "gs://test-project-backup-firestore"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/test-project/databases/(default)/operations/op-1",
                "metadata": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let operation = backup_firestore(&config(), &exporter(&server)).await.unwrap();

        assert_eq!(
            operation.name,
            "projects/test-project/databases/(default)/operations/op-1"
        );
        assert!(!operation.done);
    }

    #[tokio::test]
    async fn test_backup_reports_api_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = backup_firestore(&config(), &exporter(&server))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Export(ref m) if m.contains("permission denied")));
    }

    #[tokio::test]
    async fn test_backup_reports_token_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = backup_firestore(&config(), &exporter(&server))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Export(_)));
    }
}
