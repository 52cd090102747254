//! `get-repo-contents`: a file or directory listing plus repository summary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProxyError;
use crate::github::GitHubGateway;
use crate::github::locator::{ContentPath, RefName, RepositoryRef};
use crate::github::models::RepositorySummary;
use crate::proxy::ProxyOperation;
use crate::proxy::validation::{FieldKind, FieldRule, ValidatedBody};

use super::{OWNER, REPO};

/// Read contents at `path`, on `ref` or the default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRepoContents {
    repository: RepositoryRef,
    path: ContentPath,
    reference: Option<RefName>,
}

/// Successful `get-repo-contents` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentsResponse {
    /// GitHub's contents payload, unchanged.
    pub contents: Value,
    /// The repository's default branch.
    pub default_branch: String,
    /// Repository summary.
    pub repository: RepositorySummary,
}

#[async_trait]
impl ProxyOperation for GetRepoContents {
    const NAME: &'static str = "get-repo-contents";
    const SCHEMA: &'static [FieldRule] = &[
        OWNER,
        REPO,
        FieldRule::optional("path", FieldKind::ContentPath),
        FieldRule::optional("ref", FieldKind::Ref),
    ];
    const NO_STORE: bool = true;

    type Output = ContentsResponse;

    fn from_body(body: &ValidatedBody) -> Result<Self, ProxyError> {
        Ok(Self {
            repository: body.repository()?,
            path: body.content_path("path"),
            reference: body.optional_ref("ref"),
        })
    }

    fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    async fn forward(&self, gateway: &dyn GitHubGateway) -> Result<ContentsResponse, ProxyError> {
        let summary = gateway.repository(&self.repository).await?;
        let reference = match &self.reference {
            Some(reference) => reference.clone(),
            None => RefName::new(&summary.default_branch).map_err(|error| {
                ProxyError::unexpected(format!("upstream default branch: {error}"))
            })?,
        };
        let contents = gateway
            .contents(&self.repository, &self.path, &reference)
            .await?;

        Ok(ContentsResponse {
            contents,
            default_branch: summary.default_branch.clone(),
            repository: summary,
        })
    }
}
