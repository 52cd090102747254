//! `delete-repo`: permanently delete a repository.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::github::GitHubGateway;
use crate::github::locator::RepositoryRef;
use crate::proxy::ProxyOperation;
use crate::proxy::validation::{FieldRule, ValidatedBody};

use super::{OWNER, REPO};

/// Delete the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRepo {
    repository: RepositoryRef,
}

/// Successful `delete-repo` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRepoResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

#[async_trait]
impl ProxyOperation for DeleteRepo {
    const NAME: &'static str = "delete-repo";
    const SCHEMA: &'static [FieldRule] = &[OWNER, REPO];

    type Output = DeleteRepoResponse;

    fn from_body(body: &ValidatedBody) -> Result<Self, ProxyError> {
        Ok(Self {
            repository: body.repository()?,
        })
    }

    fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    async fn forward(&self, gateway: &dyn GitHubGateway) -> Result<DeleteRepoResponse, ProxyError> {
        gateway.delete_repository(&self.repository).await?;
        tracing::info!(repository = %self.repository, "repository deleted");
        Ok(DeleteRepoResponse {
            success: true,
            message: format!("Repository {} deleted successfully", self.repository),
        })
    }
}
