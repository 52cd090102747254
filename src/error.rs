//! Error type shared by every stage of the proxy pipeline.
//!
//! Each variant maps to exactly one HTTP status and one caller-facing message
//! in [`ProxyError::into_response`]. Messages are fixed strings or sanitised
//! upstream summaries, so nothing here ever echoes a raw GitHub body or a
//! credential.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::github::SanitizedError;
use crate::proxy::operations::RenameStep;
use crate::proxy::validation::FieldViolation;

/// Message returned for every ownership violation.
pub const FORBIDDEN_MESSAGE: &str = "Unauthorized: can only access your own repositories";

/// Failures surfaced by the proxy pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// The request body failed schema validation.
    #[error("Invalid request")]
    Validation(Vec<FieldViolation>),

    /// No valid session accompanied the request.
    #[error("Unauthorized: a valid session is required")]
    Unauthorized,

    /// The session is valid but no GitHub account is linked to the profile.
    #[error("GitHub username not found in profile, link your GitHub account first")]
    ProfileIncomplete,

    /// The target repository does not belong to the caller.
    #[error("Unauthorized: can only access your own repositories")]
    Forbidden,

    /// GitHub answered with a non-success status.
    #[error("{0}")]
    Upstream(SanitizedError),

    /// A branch rename stopped part way; completed steps were not undone.
    #[error(
        "Branch rename failed while {step}: {cause}{}",
        describe_completed(.completed)
    )]
    RenameIncomplete {
        /// Step that failed.
        step: RenameStep,
        /// Steps that had already been applied upstream.
        completed: Vec<RenameStep>,
        /// Failure reported by the failing step.
        cause: Box<ProxyError>,
    },

    /// Anything else: transport failures, undecodable responses, bad wiring.
    #[error("An unexpected error occurred")]
    Unexpected {
        /// Internal detail, logged but never returned to the caller.
        detail: String,
    },
}

impl ProxyError {
    /// Builds an [`ProxyError::Unexpected`] from any displayable detail.
    #[must_use]
    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::Unexpected {
            detail: detail.into(),
        }
    }

    /// HTTP status reported to the caller for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::ProfileIncomplete => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Upstream(sanitized) => sanitized.status,
            Self::RenameIncomplete { cause, .. } => cause.status(),
            Self::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal detail withheld from the caller, looking through a failed
    /// rename step to its cause.
    #[must_use]
    pub fn internal_detail(&self) -> Option<&str> {
        match self {
            Self::Unexpected { detail } => Some(detail.as_str()),
            Self::RenameIncomplete { cause, .. } => cause.internal_detail(),
            _ => None,
        }
    }

    /// JSON body reported to the caller for this failure.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let details = match self {
            Self::Validation(violations) => Some(violations.clone()),
            _ => None,
        };
        ErrorBody {
            error: self.to_string(),
            details,
        }
    }
}

fn describe_completed(completed: &[RenameStep]) -> String {
    if completed.is_empty() {
        return String::new();
    }
    let steps: Vec<String> = completed.iter().map(ToString::to_string).collect();
    format!(
        " (already applied and not rolled back: {})",
        steps.join(", ")
    )
}

/// Wire shape of every failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Single descriptive message.
    pub error: String,
    /// Field-level violations, present only for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        if let Some(detail) = self.internal_detail() {
            tracing::error!(%detail, "unexpected proxy failure");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
