//! Build status classification for Slack

use crate::build::BuildEvent;

pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Attachment color and emoji for a build status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlackStatus {
    pub color: &'static str,
    pub icon: &'static str,
}

/// Looks up the Slack styling for a status. Only statuses that are worth
/// a notification have an entry; QUEUED, WORKING, CANCELLED and anything
/// unknown return `None`.
pub fn slack_status(status: &str) -> Option<SlackStatus> {
    let (color, icon) = match status {
        STATUS_SUCCESS => ("#2aa24b", ":white_check_mark:"),
        "FAILURE" => ("#d50200", ":x:"),
        "INTERNAL_ERROR" => ("#d50200", ":sos:"),
        "TIMEOUT" => ("#de9d2e", ":sos:"),
        _ => return None,
    };
    Some(SlackStatus { color, icon })
}

pub fn is_tracked(status: &str) -> bool {
    slack_status(status).is_some()
}

pub fn is_success(status: &str) -> bool {
    status == STATUS_SUCCESS
}

impl BuildEvent {
    pub fn slack_status(&self) -> Option<SlackStatus> {
        slack_status(&self.status)
    }

    pub fn is_success(&self) -> bool {
        is_success(&self.status)
    }
}
