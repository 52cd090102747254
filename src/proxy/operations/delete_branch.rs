//! `delete-branch`: remove one branch ref.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::github::GitHubGateway;
use crate::github::locator::{RefName, RepositoryRef};
use crate::proxy::ProxyOperation;
use crate::proxy::validation::{FieldKind, FieldRule, ValidatedBody};

use super::{OWNER, REPO};

/// Delete `branch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBranch {
    repository: RepositoryRef,
    branch: RefName,
}

/// Successful `delete-branch` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBranchResponse {
    /// Always `true`.
    pub success: bool,
    /// The deleted branch.
    pub branch: String,
}

#[async_trait]
impl ProxyOperation for DeleteBranch {
    const NAME: &'static str = "delete-branch";
    const SCHEMA: &'static [FieldRule] = &[
        OWNER,
        REPO,
        FieldRule::required("branch", FieldKind::Branch),
    ];

    type Output = DeleteBranchResponse;

    fn from_body(body: &ValidatedBody) -> Result<Self, ProxyError> {
        Ok(Self {
            repository: body.repository()?,
            branch: body.ref_name("branch")?,
        })
    }

    fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    async fn forward(
        &self,
        gateway: &dyn GitHubGateway,
    ) -> Result<DeleteBranchResponse, ProxyError> {
        gateway.delete_branch(&self.repository, &self.branch).await?;
        Ok(DeleteBranchResponse {
            success: true,
            branch: self.branch.to_string(),
        })
    }
}
