//! Branch resolution and App Engine version naming

use md5::{Digest, Md5};
use std::fmt;

use crate::build::BuildEvent;

/// Slugs at or over this length are replaced by their MD5 digest so the
/// generated `<version>-dot-<domain>` host stays within App Engine limits.
pub const MAX_VERSION_LENGTH: usize = 40;

const MASTER_BRANCH: &str = "master";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryBranch(String);

impl RepositoryBranch {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Browsable URL of the branch. The name is appended as-is, without
    /// percent-encoding, so links for names with reserved characters break.
    pub fn url(&self, repository_url: &str) -> String {
        format!("{}/tree/{}", repository_url, self.0)
    }

    /// App Engine version name derived from the branch.
    pub fn to_version(&self) -> String {
        let version: String = self
            .0
            .to_lowercase()
            .chars()
            .map(|c| match c {
                '/' | '.' | '@' | '_' => '-',
                other => other,
            })
            .collect();

        if version.len() < MAX_VERSION_LENGTH {
            return version;
        }
        hex::encode(Md5::digest(version.as_bytes()))
    }

    pub fn is_master(&self) -> bool {
        self.0 == MASTER_BRANCH
    }
}

impl fmt::Display for RepositoryBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl BuildEvent {
    /// Returns the branch this build ran for.
    ///
    /// Builds started by the Cloud Build GitHub App carry the branch in
    /// `substitutions.BRANCH_NAME`, which wins over `source.repoSource`.
    /// Returns `None` when neither is available.
    pub fn branch(&self) -> Option<RepositoryBranch> {
        if let Some(branch) = self.substitution_branch() {
            return Some(RepositoryBranch::new(branch));
        }
        self.source
            .as_ref()
            .and_then(|s| s.repo_source.as_ref())
            .map(|r| RepositoryBranch::new(r.branch_name.clone()))
    }
}
