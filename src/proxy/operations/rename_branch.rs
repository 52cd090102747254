//! `rename-branch`: move a branch to a new name.
//!
//! The rename runs as a short saga of single upstream calls:
//!
//! 1. resolve the repository's default branch and the old branch head,
//! 2. create the new branch at that head,
//! 3. point the default branch at the new branch, when the old one was the
//!    default,
//! 4. delete the old branch.
//!
//! There is no compensation. When a step fails, the steps already applied
//! stay applied upstream and the error names both the failing step and the
//! applied ones, so the caller can finish or undo the rename by hand.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;
use crate::github::GitHubGateway;
use crate::github::locator::{RefName, RepositoryRef};
use crate::github::models::RepositoryChanges;
use crate::proxy::ProxyOperation;
use crate::proxy::validation::{FieldKind, FieldRule, FieldViolation, ValidatedBody};

use super::{OWNER, REPO, RenameStep};

/// Rename `old_name` to `new_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameBranch {
    repository: RepositoryRef,
    old_name: RefName,
    new_name: RefName,
}

/// Successful `rename-branch` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameBranchResponse {
    /// Always `true`.
    pub success: bool,
    /// Previous branch name.
    pub old_name: String,
    /// New branch name.
    pub new_name: String,
    /// Whether the repository default branch was moved.
    pub default_branch_updated: bool,
}

fn step_failed(
    step: RenameStep,
    completed: &[RenameStep],
) -> impl FnOnce(ProxyError) -> ProxyError + '_ {
    move |cause| {
        tracing::warn!(
            %step,
            ?completed,
            %cause,
            detail = cause.internal_detail(),
            "branch rename stopped part way"
        );
        ProxyError::RenameIncomplete {
            step,
            completed: completed.to_vec(),
            cause: Box::new(cause),
        }
    }
}

#[async_trait]
impl ProxyOperation for RenameBranch {
    const NAME: &'static str = "rename-branch";
    const SCHEMA: &'static [FieldRule] = &[
        OWNER,
        REPO,
        FieldRule::required("old_name", FieldKind::Branch),
        FieldRule::required("new_name", FieldKind::Branch),
    ];

    type Output = RenameBranchResponse;

    fn from_body(body: &ValidatedBody) -> Result<Self, ProxyError> {
        let old_name = body.ref_name("old_name")?;
        let new_name = body.ref_name("new_name")?;
        if old_name == new_name {
            return Err(ProxyError::Validation(vec![FieldViolation::new(
                "new_name",
                "must differ from old_name",
            )]));
        }
        Ok(Self {
            repository: body.repository()?,
            old_name,
            new_name,
        })
    }

    fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    async fn forward(
        &self,
        gateway: &dyn GitHubGateway,
    ) -> Result<RenameBranchResponse, ProxyError> {
        let mut completed = Vec::new();

        let summary = gateway
            .repository(&self.repository)
            .await
            .map_err(step_failed(RenameStep::ResolveSource, &completed))?;
        let sha = gateway
            .branch_head(&self.repository, &self.old_name)
            .await
            .map_err(step_failed(RenameStep::ResolveSource, &completed))?;

        gateway
            .create_branch(&self.repository, &self.new_name, &sha)
            .await
            .map_err(step_failed(RenameStep::CreateBranch, &completed))?;
        completed.push(RenameStep::CreateBranch);

        let default_branch_updated = summary.default_branch == self.old_name.as_str();
        if default_branch_updated {
            let changes = RepositoryChanges {
                default_branch: Some(self.new_name.to_string()),
                ..RepositoryChanges::default()
            };
            gateway
                .update_repository(&self.repository, &changes)
                .await
                .map_err(step_failed(RenameStep::UpdateDefaultBranch, &completed))?;
            completed.push(RenameStep::UpdateDefaultBranch);
        }

        gateway
            .delete_branch(&self.repository, &self.old_name)
            .await
            .map_err(step_failed(RenameStep::DeleteOldBranch, &completed))?;

        tracing::info!(
            repository = %self.repository,
            old_name = %self.old_name,
            new_name = %self.new_name,
            default_branch_updated,
            "branch renamed"
        );
        Ok(RenameBranchResponse {
            success: true,
            old_name: self.old_name.to_string(),
            new_name: self.new_name.to_string(),
            default_branch_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use mockall::Sequence;
    use rstest::rstest;
    use serde_json::json;

    use super::RenameBranch;
    use crate::error::ProxyError;
    use crate::github::locator::{RefName, RepositoryRef};
    use crate::github::models::RepositorySummary;
    use crate::github::{MockGitHubGateway, SanitizedError};
    use crate::proxy::ProxyOperation;
    use crate::proxy::operations::RenameStep;
    use crate::proxy::validation::{FieldViolation, validate};

    fn request(old_name: &str, new_name: &str) -> RenameBranch {
        RenameBranch {
            repository: RepositoryRef::parse("alice", "demo").expect("repository should be valid"),
            old_name: RefName::new(old_name).expect("old name should be valid"),
            new_name: RefName::new(new_name).expect("new name should be valid"),
        }
    }

    fn summary(default_branch: &str) -> RepositorySummary {
        RepositorySummary {
            name: "demo".to_owned(),
            full_name: "alice/demo".to_owned(),
            private: false,
            default_branch: default_branch.to_owned(),
        }
    }

    fn not_found() -> ProxyError {
        ProxyError::Upstream(SanitizedError::new(
            StatusCode::NOT_FOUND,
            "Repository or branch not found",
        ))
    }

    #[rstest]
    fn identical_names_are_rejected() {
        let bytes = serde_json::to_vec(&json!({
            "owner": "alice",
            "repo": "demo",
            "old_name": "main",
            "new_name": "main",
            "provider_token": "t"
        }))
        .expect("body should serialise");
        let validated = validate(&bytes, RenameBranch::SCHEMA).expect("body should validate");

        let error = RenameBranch::from_body(&validated).expect_err("rename should be rejected");

        assert_eq!(
            error,
            ProxyError::Validation(vec![FieldViolation::new(
                "new_name",
                "must differ from old_name"
            )])
        );
    }

    #[rstest]
    #[tokio::test]
    async fn renaming_the_default_branch_moves_it_before_deleting() {
        let mut sequence = Sequence::new();
        let mut gateway = MockGitHubGateway::new();
        gateway
            .expect_repository()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(summary("master")));
        gateway
            .expect_branch_head()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|_, branch| branch.as_str() == "master")
            .returning(|_, _| Ok("abc123".to_owned()));
        gateway
            .expect_create_branch()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|_, branch, sha| branch.as_str() == "main" && sha == "abc123")
            .returning(|_, _, _| Ok(()));
        gateway
            .expect_update_repository()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|_, changes| changes.default_branch.as_deref() == Some("main"))
            .returning(|_, _| Ok(summary("main")));
        gateway
            .expect_delete_branch()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|_, branch| branch.as_str() == "master")
            .returning(|_, _| Ok(()));

        let response = request("master", "main")
            .forward(&gateway)
            .await
            .expect("rename should succeed");

        assert!(response.success);
        assert!(response.default_branch_updated);
        assert_eq!(response.old_name, "master");
        assert_eq!(response.new_name, "main");
    }

    #[rstest]
    #[tokio::test]
    async fn non_default_branch_leaves_the_default_untouched() {
        let mut gateway = MockGitHubGateway::new();
        gateway
            .expect_repository()
            .returning(|_| Ok(summary("main")));
        gateway
            .expect_branch_head()
            .returning(|_, _| Ok("abc123".to_owned()));
        gateway.expect_create_branch().returning(|_, _, _| Ok(()));
        gateway.expect_update_repository().times(0);
        gateway.expect_delete_branch().times(1).returning(|_, _| Ok(()));

        let response = request("feature/a", "feature/b")
            .forward(&gateway)
            .await
            .expect("rename should succeed");

        assert!(!response.default_branch_updated);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_delete_keeps_the_created_branch() {
        let mut gateway = MockGitHubGateway::new();
        gateway
            .expect_repository()
            .returning(|_| Ok(summary("main")));
        gateway
            .expect_branch_head()
            .returning(|_, _| Ok("abc123".to_owned()));
        gateway
            .expect_create_branch()
            .times(1)
            .withf(|_, branch, _| branch.as_str() == "feature/b")
            .returning(|_, _, _| Ok(()));
        // Only the old branch may be deleted; touching the new one would be a
        // rollback.
        gateway
            .expect_delete_branch()
            .times(1)
            .withf(|_, branch| branch.as_str() == "feature/a")
            .returning(|_, _| Err(not_found()));

        let error = request("feature/a", "feature/b")
            .forward(&gateway)
            .await
            .expect_err("rename should fail");

        assert_eq!(
            error,
            ProxyError::RenameIncomplete {
                step: RenameStep::DeleteOldBranch,
                completed: vec![RenameStep::CreateBranch],
                cause: Box::new(not_found()),
            }
        );
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_source_branch_fails_before_any_write() {
        let mut gateway = MockGitHubGateway::new();
        gateway
            .expect_repository()
            .returning(|_| Ok(summary("main")));
        gateway
            .expect_branch_head()
            .returning(|_, _| Err(not_found()));
        gateway.expect_create_branch().times(0);
        gateway.expect_delete_branch().times(0);

        let error = request("feature/a", "feature/b")
            .forward(&gateway)
            .await
            .expect_err("rename should fail");

        assert!(
            matches!(
                &error,
                ProxyError::RenameIncomplete { step: RenameStep::ResolveSource, completed, .. }
                    if completed.is_empty()
            ),
            "unexpected error: {error:?}"
        );
        assert_eq!(
            error.to_string(),
            "Branch rename failed while resolving the source branch: Repository or branch not found"
        );
    }
}
