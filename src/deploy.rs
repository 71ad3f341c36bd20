//! App Engine URLs affected by a deploy build

use crate::branch::RepositoryBranch;
use crate::build::{BuildEvent, BuildTags};
use crate::config::ProjectConfig;

pub const TAG_DEPLOY_DEFAULT: &str = "deploy-default-service";
pub const TAG_DEPLOY_ADMIN: &str = "deploy-admin-service";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUrl {
    pub title: String,
    pub url: String,
}

impl AppUrl {
    fn new(title: &str, url: String) -> Self {
        Self {
            title: title.to_string(),
            url,
        }
    }
}

pub fn is_deploy(tags: Option<&BuildTags>) -> bool {
    tags.is_some_and(|t| t.includes(TAG_DEPLOY_DEFAULT) || t.includes(TAG_DEPLOY_ADMIN))
}

/// URLs of the services the build deployed, in display order.
///
/// Only meaningful when [`is_deploy`] holds: anything without the default
/// service tag is treated as an admin deploy.
pub fn resolve_app_urls(
    tags: &BuildTags,
    branch: &RepositoryBranch,
    config: &ProjectConfig,
) -> Vec<AppUrl> {
    if tags.includes(TAG_DEPLOY_DEFAULT) {
        return vec![
            AppUrl::new("SMS URL", domain_to_url(&config.default_domain(), branch)),
            AppUrl::new("SMS Career URL", domain_to_url(&config.career_domain(), branch)),
        ];
    }

    vec![AppUrl::new(
        "Admin URL",
        domain_to_url(&config.admin_domain(), branch),
    )]
}

/// master serves the bare domain; other branches are deployed as a
/// version and served from `<version>-dot-<domain>`.
pub fn domain_to_url(domain: &str, branch: &RepositoryBranch) -> String {
    if branch.is_master() {
        return format!("https://{}", domain);
    }
    format!("https://{}-dot-{}", branch.to_version(), domain)
}

impl BuildEvent {
    pub fn is_deploy(&self) -> bool {
        is_deploy(self.tags.as_ref())
    }
}
