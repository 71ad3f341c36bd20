//! Pub/Sub push handlers
//!
//! Pub/Sub treats any non-2xx response as a nack and redelivers, so skips
//! and unrecoverable events are acknowledged while transient failures are
//! not.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State as AxumState},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::SharedState;
use crate::config::{Settings, firestore_config, project_config};
use crate::error::NotifyError;
use crate::export::backup_firestore;
use crate::notify::{NotifyOutcome, notify_slack};
use crate::utils::{SIGNATURE_HEADER, resource_from_ce_source, verify_signature};

/// Body Pub/Sub posts to a push subscription.
#[derive(Debug, Deserialize)]
pub struct PushEnvelope {
    pub message: PubSubMessage,
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubMessage {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub message_id: Option<String>,
}

/// POST /pubsub/cloud-builds - Notify Slack about a finished build
pub async fn handle_cloud_build(
    AxumState(state): AxumState<SharedState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let invocation_id = Uuid::now_v7();
    let span = info_span!("notify_slack", %invocation_id);

    async move {
        if let Err(status) = check_signature(&state.settings, &headers, &body) {
            return status;
        }

        let envelope: PushEnvelope = match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                info!("Could not parse push envelope: {:?}", e);
                return StatusCode::BAD_REQUEST;
            }
        };
        debug!(
            message_id = ?envelope.message.message_id,
            subscription = ?envelope.subscription,
            "Received build message"
        );

        let resource = headers
            .get("ce-source")
            .and_then(|v| v.to_str().ok())
            .map(resource_from_ce_source)
            .or_else(|| params.get("resource").map(String::as_str))
            .unwrap_or_default();

        let config = match project_config().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get config about Slack: {}", e);
                return error_status(&e);
            }
        };

        match notify_slack(
            resource,
            &envelope.message.data,
            config,
            &state.settings,
            &state.slack,
        )
        .await
        {
            Ok(NotifyOutcome::Sent) => StatusCode::OK,
            Ok(NotifyOutcome::Skipped(_)) => StatusCode::NO_CONTENT,
            Err(e) => error_status(&e),
        }
    }
    .instrument(span)
    .await
}

/// POST /pubsub/backup-firestore - Export Firestore to the backup bucket
pub async fn handle_backup(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let invocation_id = Uuid::now_v7();
    let span = info_span!("backup_firestore", %invocation_id);

    async move {
        if let Err(status) = check_signature(&state.settings, &headers, &body) {
            return status.into_response();
        }

        let config = match firestore_config().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get config about Firestore: {}", e);
                return error_status(&e).into_response();
            }
        };

        match backup_firestore(config, &state.exporter).await {
            Ok(operation) => Json(json!({
                "operation": operation.name,
                "done": operation.done,
            }))
            .into_response(),
            Err(e) => error_status(&e).into_response(),
        }
    }
    .instrument(span)
    .await
}

fn check_signature(settings: &Settings, headers: &HeaderMap, body: &[u8]) -> Result<(), StatusCode> {
    if !settings.needs_push_signature() {
        return Ok(());
    }
    let secret = settings.push_secret.as_deref().unwrap_or_default();

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        error!("Push secret is configured, but no signature header supplied.");
        return Err(StatusCode::UNAUTHORIZED);
    };

    if !verify_signature(secret, body, signature) {
        error!("Signature verification failed for push request!");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

fn error_status(e: &NotifyError) -> StatusCode {
    if e.is_recoverable() {
        warn!("Acknowledging event that cannot be notified: {}", e);
        return StatusCode::ACCEPTED;
    }

    error!("{}", e);
    match e {
        NotifyError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        NotifyError::Delivery(_) | NotifyError::Export(_) | NotifyError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
