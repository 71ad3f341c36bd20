//! Build event to Slack notification pipeline

use tracing::info;

use crate::build::BuildEvent;
use crate::config::{ProjectConfig, Settings};
use crate::error::{NotifyError, Result};
use crate::gate::{Admission, SkipReason, admit_build, admit_resource};
use crate::notification::assemble;
use crate::slack::ChatDelivery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Skipped(SkipReason),
    Sent,
}

/// Handles one message from the `cloud-builds` topic.
///
/// Skips are not errors. Decoding, assembly and delivery failures are.
pub async fn notify_slack<D: ChatDelivery>(
    resource: &str,
    data: &str,
    config: &ProjectConfig,
    settings: &Settings,
    delivery: &D,
) -> Result<NotifyOutcome> {
    if let Admission::Skip(reason) = admit_resource(resource, config) {
        info!("{}", reason);
        return Ok(NotifyOutcome::Skipped(reason));
    }

    let build = BuildEvent::from_pubsub_data(data)?;

    if let Admission::Skip(reason) = admit_build(&build) {
        info!(build_id = %build.id, "{}", reason);
        return Ok(NotifyOutcome::Skipped(reason));
    }

    let payload = assemble(&build, config, settings)?;
    let webhook_url = config.slack_webhook_url(&settings.slack_webhook_base);
    let failures = delivery.deliver(&webhook_url, &payload).await;
    if !failures.is_empty() {
        return Err(NotifyError::Delivery(failures));
    }

    info!(build_id = %build.id, status = %build.status, "Sent a message to Slack");
    Ok(NotifyOutcome::Sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationPayload;
    use crate::slack::DeliveryFailure;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use std::sync::Mutex;

    const RESOURCE: &str = "projects/nomos-sms/topics/cloud-builds";

    /// Records what would have been posted instead of calling Slack.
    #[derive(Default)]
    struct RecordingDelivery {
        sent: Mutex<Vec<(String, NotificationPayload)>>,
        reject: bool,
    }

    impl ChatDelivery for RecordingDelivery {
        async fn deliver(
            &self,
            webhook_url: &str,
            payload: &NotificationPayload,
        ) -> Vec<DeliveryFailure> {
            self.sent
                .lock()
                .unwrap()
                .push((webhook_url.to_string(), payload.clone()));
            if self.reject {
                vec![
                    DeliveryFailure::Rejected {
                        status: 500,
                        body: "boom".to_string(),
                    },
                    DeliveryFailure::Rejected {
                        status: 503,
                        body: "later".to_string(),
                    },
                ]
            } else {
                Vec::new()
            }
        }
    }

    fn data(json: serde_json::Value) -> String {
        STANDARD.encode(json.to_string())
    }

    fn success_build() -> String {
        data(serde_json::json!({
            "id": "b-9",
            "status": "SUCCESS",
            "source": {"repoSource": {"branchName": "dev"}},
            "logUrl": "https://logs/b-9",
            "tags": ["deploy-admin-service"]
        }))
    }

    fn config() -> ProjectConfig {
        ProjectConfig::new("nomos-sms", "T000/B000/XXX")
    }

    #[tokio::test]
    async fn test_sends_admitted_build() {
        let delivery = RecordingDelivery::default();

        let outcome = notify_slack(RESOURCE, &success_build(), &config(), &Settings::default(), &delivery)
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::Sent);
        let sent = delivery.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://hooks.slack.com/services/T000/B000/XXX");
        let fields = &sent[0].1.attachments[0].fields;
        assert_eq!(fields[2].title, "Admin URL");
        assert_eq!(fields[2].value, "https://dev-dot-admin-dot-nomos-sms.appspot.com");
    }

    #[tokio::test]
    async fn test_wrong_resource_skips_before_decoding() {
        let delivery = RecordingDelivery::default();

        let outcome = notify_slack(
            "projects/other/topics/x",
            "%%% not even base64 %%%",
            &config(),
            &Settings::default(),
            &delivery,
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome,
            NotifyOutcome::Skipped(SkipReason::WrongResource(_))
        ));
        assert!(delivery.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skips_untracked_and_sourceless_builds() {
        let delivery = RecordingDelivery::default();
        let queued = data(serde_json::json!({
            "id": "b-1",
            "status": "QUEUED",
            "source": {"repoSource": {"branchName": "dev"}}
        }));
        let sourceless = data(serde_json::json!({"id": "b-2", "status": "SUCCESS"}));

        let outcome = notify_slack(RESOURCE, &queued, &config(), &Settings::default(), &delivery)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            NotifyOutcome::Skipped(SkipReason::StatusNotTracked("QUEUED".to_string()))
        );

        let outcome = notify_slack(RESOURCE, &sourceless, &config(), &Settings::default(), &delivery)
            .await
            .unwrap();
        assert_eq!(outcome, NotifyOutcome::Skipped(SkipReason::NotSourceBuild));

        assert!(delivery.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error() {
        let delivery = RecordingDelivery::default();

        let err = notify_slack(RESOURCE, "%%%", &config(), &Settings::default(), &delivery)
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_delivery_failures_are_aggregated() {
        let delivery = RecordingDelivery {
            reject: true,
            ..Default::default()
        };

        let err = notify_slack(RESOURCE, &success_build(), &config(), &Settings::default(), &delivery)
            .await
            .unwrap_err();

        match &err {
            NotifyError::Delivery(failures) => assert_eq!(failures.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("500: boom"));
        assert!(message.contains("503: later"));
    }
}
