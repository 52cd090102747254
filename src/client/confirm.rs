//! Re-type-the-name confirmation for destructive calls.
//!
//! This is a UX safeguard against slips, not a security boundary: the
//! server accepts destructive requests without it, and anyone holding a
//! session and provider token can call the endpoints directly.

use std::fmt;

use thiserror::Error;

/// A call that cannot be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestructiveAction {
    /// Delete a whole repository.
    DeleteRepository {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
    },
    /// Delete one branch.
    DeleteBranch {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
        /// Branch to delete.
        branch: String,
    },
}

impl DestructiveAction {
    /// Text the user must type to confirm: `owner/repo` for repositories,
    /// the branch name for branches.
    #[must_use]
    pub fn expected_input(&self) -> String {
        match self {
            Self::DeleteRepository { owner, repo } => format!("{owner}/{repo}"),
            Self::DeleteBranch { branch, .. } => branch.clone(),
        }
    }
}

impl fmt::Display for DestructiveAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteRepository { owner, repo } => {
                write!(formatter, "delete repository {owner}/{repo}")
            }
            Self::DeleteBranch {
                owner,
                repo,
                branch,
            } => write!(formatter, "delete branch {branch} of {owner}/{repo}"),
        }
    }
}

/// The typed text did not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("confirmation does not match: type {expected:?} to {action}")]
pub struct ConfirmationError {
    /// The action that stayed unconfirmed.
    pub action: DestructiveAction,
    /// What should have been typed.
    pub expected: String,
}

/// Confirmation prompt state owned by the presentation layer.
///
/// The gate starts empty, accumulates the user's input, and yields a
/// [`ConfirmedAction`] only when the input matches exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationGate {
    action: DestructiveAction,
    input: String,
}

impl ConfirmationGate {
    /// Opens a prompt for `action`.
    #[must_use]
    pub const fn new(action: DestructiveAction) -> Self {
        Self {
            action,
            input: String::new(),
        }
    }

    /// The pending action.
    #[must_use]
    pub const fn action(&self) -> &DestructiveAction {
        &self.action
    }

    /// Replaces the typed input.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Whether the current input confirms the action.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.input == self.action.expected_input()
    }

    /// Consumes the gate, yielding the confirmed action.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmationError`] when the input does not match
    /// exactly; case and surrounding whitespace count.
    pub fn confirm(self) -> Result<ConfirmedAction, ConfirmationError> {
        if self.is_satisfied() {
            Ok(ConfirmedAction(self.action))
        } else {
            Err(ConfirmationError {
                expected: self.action.expected_input(),
                action: self.action,
            })
        }
    }
}

/// Proof that the user re-typed the resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedAction(DestructiveAction);

impl ConfirmedAction {
    /// The confirmed action.
    #[must_use]
    pub const fn action(&self) -> &DestructiveAction {
        &self.0
    }
}
