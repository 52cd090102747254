//! The six proxy endpoints.
//!
//! Each endpoint is a [`ProxyOperation`](super::ProxyOperation): a schema,
//! a typed request narrowed from the validated body, and the upstream calls
//! that serve it.

mod branches;
mod contents;
mod delete_branch;
mod delete_repo;
mod rename_branch;
mod update_repo;

use std::fmt;

pub use branches::{BranchEntry, BranchesResponse, GetRepoBranches};
pub use contents::{ContentsResponse, GetRepoContents};
pub use delete_branch::{DeleteBranch, DeleteBranchResponse};
pub use delete_repo::{DeleteRepo, DeleteRepoResponse};
pub use rename_branch::{RenameBranch, RenameBranchResponse};
pub use update_repo::{UpdateRepo, UpdateRepoResponse};

use super::validation::{FieldKind, FieldRule};

const OWNER: FieldRule = FieldRule::required("owner", FieldKind::Owner);
const REPO: FieldRule = FieldRule::required("repo", FieldKind::Repository);

/// One step of the branch rename saga, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameStep {
    /// Read repository metadata and the old branch head.
    ResolveSource,
    /// Create the new branch at the old head.
    CreateBranch,
    /// Point the default branch at the new branch.
    UpdateDefaultBranch,
    /// Delete the old branch.
    DeleteOldBranch,
}

impl fmt::Display for RenameStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::ResolveSource => "resolving the source branch",
            Self::CreateBranch => "creating the new branch",
            Self::UpdateDefaultBranch => "updating the default branch",
            Self::DeleteOldBranch => "deleting the old branch",
        })
    }
}
