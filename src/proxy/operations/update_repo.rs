//! `update-repo`: edit repository metadata.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::github::GitHubGateway;
use crate::github::locator::{RefName, RepositoryRef};
use crate::github::models::{RepositoryChanges, RepositorySummary};
use crate::proxy::ProxyOperation;
use crate::proxy::validation::{FieldKind, FieldRule, FieldViolation, ValidatedBody};

use super::{OWNER, REPO};

const MAX_DESCRIPTION_CHARS: usize = 350;

const FLAGS: [&str; 5] = ["private", "has_issues", "has_projects", "has_wiki", "archived"];

/// Apply the supplied metadata changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRepo {
    repository: RepositoryRef,
    changes: RepositoryChanges,
}

/// Successful `update-repo` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRepoResponse {
    /// The repository as GitHub reports it after the update.
    pub repository: RepositorySummary,
}

#[async_trait]
impl ProxyOperation for UpdateRepo {
    const NAME: &'static str = "update-repo";
    const SCHEMA: &'static [FieldRule] = &[
        OWNER,
        REPO,
        FieldRule::optional("name", FieldKind::Repository),
        FieldRule::optional(
            "description",
            FieldKind::Text {
                max_chars: MAX_DESCRIPTION_CHARS,
            },
        ),
        FieldRule::optional("homepage", FieldKind::Homepage),
        FieldRule::optional("private", FieldKind::Flag),
        FieldRule::optional("has_issues", FieldKind::Flag),
        FieldRule::optional("has_projects", FieldKind::Flag),
        FieldRule::optional("has_wiki", FieldKind::Flag),
        FieldRule::optional("archived", FieldKind::Flag),
        FieldRule::optional("default_branch", FieldKind::Branch),
    ];

    type Output = UpdateRepoResponse;

    fn from_body(body: &ValidatedBody) -> Result<Self, ProxyError> {
        let [private, has_issues, has_projects, has_wiki, archived] =
            FLAGS.map(|flag| body.flag(flag));
        let changes = RepositoryChanges {
            name: body
                .repository_name("name")
                .map(|name| name.as_str().to_owned()),
            description: body.text("description"),
            homepage: body.text("homepage"),
            private,
            has_issues,
            has_projects,
            has_wiki,
            archived,
            default_branch: body
                .optional_ref("default_branch")
                .as_ref()
                .map(RefName::to_string),
        };
        if changes.is_empty() {
            return Err(ProxyError::Validation(vec![FieldViolation::new(
                "body",
                "at least one repository field must be supplied",
            )]));
        }

        Ok(Self {
            repository: body.repository()?,
            changes,
        })
    }

    fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    async fn forward(&self, gateway: &dyn GitHubGateway) -> Result<UpdateRepoResponse, ProxyError> {
        let repository = gateway
            .update_repository(&self.repository, &self.changes)
            .await?;
        if let Some(name) = &self.changes.name {
            tracing::info!(from = %self.repository, to = %name, "repository renamed");
        }
        Ok(UpdateRepoResponse { repository })
    }
}
