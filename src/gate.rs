//! Decides whether an incoming event is worth a notification

use std::fmt;

use crate::build::BuildEvent;
use crate::config::ProjectConfig;
use crate::status::is_tracked;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    WrongResource(String),
    NotSourceBuild,
    StatusNotTracked(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::WrongResource(r) => write!(f, "{} is not the watching resource", r),
            SkipReason::NotSourceBuild => f.write_str("event is not a source code build"),
            SkipReason::StatusNotTracked(s) => write!(f, "{} status is not tracked", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Proceed,
    Skip(SkipReason),
}

impl Admission {
    fn and_then(self, next: impl FnOnce() -> Admission) -> Admission {
        match self {
            Admission::Proceed => next(),
            skip => skip,
        }
    }
}

pub fn admit_resource(resource: &str, config: &ProjectConfig) -> Admission {
    if resource != config.watching_resource() {
        return Admission::Skip(SkipReason::WrongResource(resource.to_string()));
    }
    Admission::Proceed
}

pub fn admit_build(build: &BuildEvent) -> Admission {
    if !build.has_source() {
        return Admission::Skip(SkipReason::NotSourceBuild);
    }
    if !is_tracked(&build.status) {
        return Admission::Skip(SkipReason::StatusNotTracked(build.status.clone()));
    }
    Admission::Proceed
}

/// Resource first, then source, then status; the first failing check wins.
pub fn admit(resource: &str, build: &BuildEvent, config: &ProjectConfig) -> Admission {
    admit_resource(resource, config).and_then(|| admit_build(build))
}
