//! Repository and branch models exchanged with GitHub.
//!
//! Types prefixed with `Api` are deserialisation targets for GitHub
//! responses and convert into the public summaries relayed to callers.

use serde::{Deserialize, Serialize};

/// The repository fields relayed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// Repository name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Whether the repository is private.
    pub private: bool,
    /// Name of the default branch.
    pub default_branch: String,
}

/// One branch of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSummary {
    /// Branch name.
    pub name: String,
    /// Commit SHA the branch points at.
    pub sha: String,
    /// Whether branch protection is enabled.
    pub protected: bool,
}

/// Editable repository fields; only supplied fields are sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryChanges {
    /// New repository name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New homepage URL; empty clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    /// Issues toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    /// Projects toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,
    /// Wiki toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
    /// Archive flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    /// New default branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

impl RepositoryChanges {
    /// Whether no field would be changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.homepage.is_none()
            && self.private.is_none()
            && self.has_issues.is_none()
            && self.has_projects.is_none()
            && self.has_wiki.is_none()
            && self.archived.is_none()
            && self.default_branch.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRepository {
    pub(super) name: String,
    pub(super) full_name: String,
    #[serde(default)]
    pub(super) private: bool,
    pub(super) default_branch: String,
}

impl From<ApiRepository> for RepositorySummary {
    fn from(api: ApiRepository) -> Self {
        Self {
            name: api.name,
            full_name: api.full_name,
            private: api.private,
            default_branch: api.default_branch,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiBranch {
    pub(super) name: String,
    pub(super) commit: ApiCommitPointer,
    #[serde(default)]
    pub(super) protected: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitPointer {
    pub(super) sha: String,
}

impl From<ApiBranch> for BranchSummary {
    fn from(api: ApiBranch) -> Self {
        Self {
            name: api.name,
            sha: api.commit.sha,
            protected: api.protected,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiGitRef {
    pub(super) object: ApiCommitPointer,
}
