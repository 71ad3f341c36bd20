//! Slack message assembly for a build event

use serde::Serialize;

use crate::build::BuildEvent;
use crate::config::{ProjectConfig, Settings};
use crate::deploy::resolve_app_urls;
use crate::error::{NotifyError, Result};

/// Incoming-webhook payload as Slack expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub username: String,
    pub icon_emoji: String,
    pub text: String,
    pub mrkdwn: bool,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub title: String,
    pub title_link: String,
    pub color: String,
    pub mrkdwn_in: Vec<String>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl Field {
    fn new(title: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short,
        }
    }
}

/// Builds the Slack message for a build that already passed the gate.
///
/// Fails with `MissingBranch` when no branch can be resolved, and with
/// `MissingDeployTag` when the build has no tag to show.
pub fn assemble(
    build: &BuildEvent,
    config: &ProjectConfig,
    settings: &Settings,
) -> Result<NotificationPayload> {
    let branch = build.branch().ok_or_else(|| NotifyError::MissingBranch {
        build_id: build.id.clone(),
    })?;
    let tag = build
        .tags
        .as_ref()
        .and_then(|t| t.first())
        .ok_or_else(|| NotifyError::MissingDeployTag {
            build_id: build.id.clone(),
        })?;
    let (color, icon) = build
        .slack_status()
        .map(|s| (s.color, s.icon))
        .unwrap_or_default();

    let mut fields = vec![
        Field::new("status", format!("{} {}", icon, build.status), true),
        Field::new(
            "Branch",
            format!("<{}|{}>", branch.url(&settings.repository_url), branch),
            true,
        ),
    ];

    if build.is_success() && build.is_deploy() {
        if let Some(tags) = &build.tags {
            fields.extend(
                resolve_app_urls(tags, &branch, config)
                    .into_iter()
                    .map(|u| Field::new(u.title, u.url, false)),
            );
        }
    }

    fields.push(Field::new("Tag", tag, false));

    Ok(NotificationPayload {
        username: settings.username.clone(),
        icon_emoji: settings.icon_emoji.clone(),
        text: format!("{} was built as {}", settings.service_name, build.id),
        mrkdwn: true,
        attachments: vec![Attachment {
            title: "Build Logs".to_string(),
            title_link: build.log_url.clone(),
            color: color.to_string(),
            mrkdwn_in: vec!["fields".to_string()],
            fields,
        }],
    })
}
