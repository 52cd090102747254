//! Gateways forwarding validated requests to the GitHub REST API.
//!
//! The traits are the seam between the proxy pipeline and GitHub: the
//! pipeline only ever talks to a [`GitHubGateway`] obtained from a
//! [`GatewayConnector`], which lets tests substitute mocks while the Octocrab
//! implementations issue real HTTP requests.

mod client;
mod error_mapping;
mod octocrab_gateway;

pub use octocrab_gateway::{OctocrabConnector, OctocrabGateway};

use async_trait::async_trait;

use crate::error::ProxyError;
use crate::github::locator::{ContentPath, ProviderToken, RefName, RepositoryRef};
use crate::github::models::{BranchSummary, RepositoryChanges, RepositorySummary};

/// Upstream operations the proxy endpoints are built from.
///
/// Every method issues exactly one HTTP call and never retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitHubGateway: Send + Sync {
    /// Fetch repository metadata, including the default branch.
    async fn repository(&self, repository: &RepositoryRef)
    -> Result<RepositorySummary, ProxyError>;

    /// Fetch a file or directory listing at the given reference.
    ///
    /// The payload is relayed as GitHub returned it: an array for
    /// directories, an object for files.
    async fn contents(
        &self,
        repository: &RepositoryRef,
        path: &ContentPath,
        reference: &RefName,
    ) -> Result<serde_json::Value, ProxyError>;

    /// Apply metadata changes and return the updated repository.
    async fn update_repository(
        &self,
        repository: &RepositoryRef,
        changes: &RepositoryChanges,
    ) -> Result<RepositorySummary, ProxyError>;

    /// Delete the repository.
    async fn delete_repository(&self, repository: &RepositoryRef) -> Result<(), ProxyError>;

    /// List the repository's branches (first page of 100).
    async fn list_branches(
        &self,
        repository: &RepositoryRef,
    ) -> Result<Vec<BranchSummary>, ProxyError>;

    /// Resolve the commit SHA a branch points at.
    async fn branch_head(
        &self,
        repository: &RepositoryRef,
        branch: &RefName,
    ) -> Result<String, ProxyError>;

    /// Create `refs/heads/<branch>` at the given commit.
    async fn create_branch(
        &self,
        repository: &RepositoryRef,
        branch: &RefName,
        sha: &str,
    ) -> Result<(), ProxyError>;

    /// Delete `refs/heads/<branch>`.
    async fn delete_branch(
        &self,
        repository: &RepositoryRef,
        branch: &RefName,
    ) -> Result<(), ProxyError>;
}

/// Builds a gateway authenticated with one caller's provider token.
#[cfg_attr(test, mockall::automock)]
pub trait GatewayConnector: Send + Sync {
    /// Create a gateway for this request.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Unexpected`] when the client cannot be built.
    fn connect(&self, token: &ProviderToken) -> Result<Box<dyn GitHubGateway>, ProxyError>;
}
