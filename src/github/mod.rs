//! Upstream forwarding to the GitHub REST API.
//!
//! This module wraps Octocrab behind the [`GitHubGateway`] trait, defines
//! validated identity wrappers for the values a request targets, and maps
//! every upstream failure through the sanitiser so callers never see raw
//! GitHub bodies.

pub mod gateway;
pub mod locator;
pub mod models;
mod paths;
pub mod sanitize;

use url::Url;

pub use gateway::{GatewayConnector, GitHubGateway, OctocrabConnector, OctocrabGateway};
pub use locator::{
    ContentPath, ProviderToken, RefName, RepositoryName, RepositoryOwner, RepositoryRef,
    ValueError,
};
pub use models::{BranchSummary, RepositoryChanges, RepositorySummary};
pub use sanitize::{SanitizedError, sanitize};

#[cfg(test)]
pub use gateway::{MockGatewayConnector, MockGitHubGateway};

/// Where and how outbound GitHub calls are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    /// REST API base, e.g. `https://api.github.com`.
    pub api_base: Url,
    /// Fixed `User-Agent` sent with every call.
    pub user_agent: String,
}
