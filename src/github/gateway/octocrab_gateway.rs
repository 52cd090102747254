//! Octocrab-backed implementation of [`GitHubGateway`].

use async_trait::async_trait;
use http::Uri;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::ProxyError;
use crate::github::UpstreamSettings;
use crate::github::locator::{ContentPath, ProviderToken, RefName, RepositoryRef};
use crate::github::models::{
    ApiBranch, ApiGitRef, ApiRepository, BranchSummary, RepositoryChanges, RepositorySummary,
};
use crate::github::paths;

use super::client::build_octocrab_client;
use super::error_mapping::{map_decode_error, map_http_error, map_octocrab_error};
use super::{GatewayConnector, GitHubGateway};

/// One outbound call.
enum UpstreamCall<'body> {
    Get,
    Post(&'body Value),
    Patch(&'body Value),
    Delete,
}

/// Octocrab-backed gateway bound to a single provider token.
pub struct OctocrabGateway {
    client: Octocrab,
}

impl OctocrabGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds a gateway authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::Unexpected` when the base URI is invalid or the
    /// Octocrab client cannot be constructed.
    pub fn for_token(
        token: &ProviderToken,
        settings: &UpstreamSettings,
    ) -> Result<Self, ProxyError> {
        Ok(Self::new(build_octocrab_client(token, settings)?))
    }

    /// Issues one request and returns the body of a successful response.
    async fn send(
        &self,
        operation: &str,
        path: &str,
        call: UpstreamCall<'_>,
    ) -> Result<String, ProxyError> {
        let uri: Uri = path
            .parse::<Uri>()
            .map_err(|error| ProxyError::unexpected(format!("{operation}: bad path: {error}")))?;

        tracing::debug!(operation, path, "calling GitHub");
        let result = match call {
            UpstreamCall::Get => self.client._get(uri).await,
            UpstreamCall::Post(body) => self.client._post(uri, Some(body)).await,
            UpstreamCall::Patch(body) => self.client._patch(uri, Some(body)).await,
            UpstreamCall::Delete => self.client._delete(uri, None::<&()>).await,
        };
        let response = result.map_err(|error| map_octocrab_error(operation, &error))?;

        let status = response.status();
        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(map_http_error(operation, status, &body))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        call: UpstreamCall<'_>,
    ) -> Result<T, ProxyError> {
        let body = self.send(operation, path, call).await?;
        serde_json::from_str(&body).map_err(|error| map_decode_error(operation, &error))
    }
}

#[async_trait]
impl GitHubGateway for OctocrabGateway {
    async fn repository(
        &self,
        repository: &RepositoryRef,
    ) -> Result<RepositorySummary, ProxyError> {
        self.send_json::<ApiRepository>(
            "repository",
            &paths::repository_path(repository),
            UpstreamCall::Get,
        )
        .await
        .map(RepositorySummary::from)
    }

    async fn contents(
        &self,
        repository: &RepositoryRef,
        path: &ContentPath,
        reference: &RefName,
    ) -> Result<Value, ProxyError> {
        self.send_json(
            "contents",
            &paths::contents_path(repository, path, reference),
            UpstreamCall::Get,
        )
        .await
    }

    async fn update_repository(
        &self,
        repository: &RepositoryRef,
        changes: &RepositoryChanges,
    ) -> Result<RepositorySummary, ProxyError> {
        let body = serde_json::to_value(changes)
            .map_err(|error| ProxyError::unexpected(format!("encode changes: {error}")))?;
        self.send_json::<ApiRepository>(
            "update repository",
            &paths::repository_path(repository),
            UpstreamCall::Patch(&body),
        )
        .await
        .map(RepositorySummary::from)
    }

    async fn delete_repository(&self, repository: &RepositoryRef) -> Result<(), ProxyError> {
        self.send(
            "delete repository",
            &paths::repository_path(repository),
            UpstreamCall::Delete,
        )
        .await
        .map(drop)
    }

    async fn list_branches(
        &self,
        repository: &RepositoryRef,
    ) -> Result<Vec<BranchSummary>, ProxyError> {
        let branches: Vec<ApiBranch> = self
            .send_json(
                "list branches",
                &paths::branches_path(repository),
                UpstreamCall::Get,
            )
            .await?;
        Ok(branches.into_iter().map(BranchSummary::from).collect())
    }

    async fn branch_head(
        &self,
        repository: &RepositoryRef,
        branch: &RefName,
    ) -> Result<String, ProxyError> {
        self.send_json::<ApiGitRef>(
            "branch head",
            &paths::branch_ref_path(repository, branch),
            UpstreamCall::Get,
        )
        .await
        .map(|git_ref| git_ref.object.sha)
    }

    async fn create_branch(
        &self,
        repository: &RepositoryRef,
        branch: &RefName,
        sha: &str,
    ) -> Result<(), ProxyError> {
        let body = json!({
            "ref": format!("refs/heads/{}", branch.as_str()),
            "sha": sha,
        });
        self.send(
            "create branch",
            &paths::refs_path(repository),
            UpstreamCall::Post(&body),
        )
        .await
        .map(drop)
    }

    async fn delete_branch(
        &self,
        repository: &RepositoryRef,
        branch: &RefName,
    ) -> Result<(), ProxyError> {
        self.send(
            "delete branch",
            &paths::branch_refs_path(repository, branch),
            UpstreamCall::Delete,
        )
        .await
        .map(drop)
    }
}

/// Connector producing an [`OctocrabGateway`] per provider token.
#[derive(Debug, Clone)]
pub struct OctocrabConnector {
    settings: UpstreamSettings,
}

impl OctocrabConnector {
    /// Creates a connector for the configured GitHub API.
    #[must_use]
    pub const fn new(settings: UpstreamSettings) -> Self {
        Self { settings }
    }
}

impl GatewayConnector for OctocrabConnector {
    fn connect(&self, token: &ProviderToken) -> Result<Box<dyn GitHubGateway>, ProxyError> {
        Ok(Box::new(OctocrabGateway::for_token(token, &self.settings)?))
    }
}
