//! `get-repo-branches`: branch listing with the default branch flagged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::github::GitHubGateway;
use crate::github::locator::RepositoryRef;
use crate::proxy::ProxyOperation;
use crate::proxy::validation::{FieldRule, ValidatedBody};

use super::{OWNER, REPO};

/// List the repository's branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRepoBranches {
    repository: RepositoryRef,
}

/// One listed branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchEntry {
    /// Branch name.
    pub name: String,
    /// Head commit SHA.
    pub sha: String,
    /// Whether branch protection is enabled.
    pub protected: bool,
    /// Whether this is the repository's default branch.
    pub is_default: bool,
}

/// Successful `get-repo-branches` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchesResponse {
    /// Branches in upstream order.
    pub branches: Vec<BranchEntry>,
    /// The repository's default branch.
    pub default_branch: String,
}

#[async_trait]
impl ProxyOperation for GetRepoBranches {
    const NAME: &'static str = "get-repo-branches";
    const SCHEMA: &'static [FieldRule] = &[OWNER, REPO];
    const NO_STORE: bool = true;

    type Output = BranchesResponse;

    fn from_body(body: &ValidatedBody) -> Result<Self, ProxyError> {
        Ok(Self {
            repository: body.repository()?,
        })
    }

    fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    async fn forward(&self, gateway: &dyn GitHubGateway) -> Result<BranchesResponse, ProxyError> {
        let summary = gateway.repository(&self.repository).await?;
        let branches = gateway
            .list_branches(&self.repository)
            .await?
            .into_iter()
            .map(|branch| BranchEntry {
                is_default: branch.name == summary.default_branch,
                name: branch.name,
                sha: branch.sha,
                protected: branch.protected,
            })
            .collect();

        Ok(BranchesResponse {
            branches,
            default_branch: summary.default_branch,
        })
    }
}
