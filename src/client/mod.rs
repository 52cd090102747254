//! Typed client for the proxy functions.
//!
//! Each call posts a JSON body to `/functions/v1/<name>` with the caller's
//! session as a bearer credential and decodes either the endpoint payload
//! or the `{error, details}` failure body. Destructive calls require a
//! [`ConfirmedAction`] obtained from a [`ConfirmationGate`].

mod confirm;

use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;
use url::Url;

use crate::error::ErrorBody;
use crate::github::models::RepositoryChanges;
use crate::identity::SessionCredential;
use crate::proxy::ProxyOperation;
use crate::proxy::operations::{
    BranchesResponse, ContentsResponse, DeleteBranch, DeleteBranchResponse, DeleteRepo,
    DeleteRepoResponse, GetRepoBranches, GetRepoContents, RenameBranch, RenameBranchResponse,
    UpdateRepo, UpdateRepoResponse,
};
use crate::proxy::validation::{FieldViolation, PROVIDER_TOKEN_FIELD};
use crate::server::FUNCTIONS_PREFIX;

pub use confirm::{ConfirmationError, ConfirmationGate, ConfirmedAction, DestructiveAction};

/// Failures calling a proxy function.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The function answered with a failure body.
    #[error("{message} (status {status})")]
    Api {
        /// HTTP status.
        status: StatusCode,
        /// The `error` message.
        message: String,
        /// Field violations, for validation failures.
        details: Vec<FieldViolation>,
    },

    /// The request could not be sent or the response not decoded.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request body could not be encoded as a JSON object.
    #[error("request body encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The function URL could not be built.
    #[error("invalid function URL: {0}")]
    Url(#[from] url::ParseError),

    /// The confirmation does not cover this call.
    #[error("confirmation is for {confirmed}, not {requested}")]
    ConfirmationMismatch {
        /// What was confirmed.
        confirmed: Box<DestructiveAction>,
        /// What was requested.
        requested: Box<DestructiveAction>,
    },
}

/// The repository a call targets plus the caller's GitHub credential.
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// GitHub token forwarded upstream.
    pub provider_token: String,
}

impl std::fmt::Debug for RepositoryTarget {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RepositoryTarget")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl RepositoryTarget {
    fn body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("owner".to_owned(), json!(self.owner));
        body.insert("repo".to_owned(), json!(self.repo));
        body.insert(PROVIDER_TOKEN_FIELD.to_owned(), json!(self.provider_token));
        body
    }
}

/// Client for the proxy functions of one deployment.
#[derive(Debug, Clone)]
pub struct FunctionsClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionCredential,
}

impl FunctionsClient {
    /// Creates a client calling `base_url` as the holder of `session`.
    #[must_use]
    pub fn new(base_url: Url, session: SessionCredential) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    /// Invokes a function by name with an arbitrary JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] for failure responses and
    /// [`ClientError::Transport`] when the call cannot complete.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        function: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let url = self
            .base_url
            .join(&format!("{}/{function}", FUNCTIONS_PREFIX.trim_start_matches('/')))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(self.session.expose())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let failure = response.json::<ErrorBody>().await.unwrap_or_else(|_| ErrorBody {
            error: status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned(),
            details: None,
        });
        tracing::debug!(function, %status, error = %failure.error, "function call failed");
        Err(ClientError::Api {
            status,
            message: failure.error,
            details: failure.details.unwrap_or_default(),
        })
    }

    async fn call<Op: ProxyOperation>(
        &self,
        body: Map<String, Value>,
    ) -> Result<Op::Output, ClientError>
    where
        Op::Output: DeserializeOwned,
    {
        self.invoke(Op::NAME, &Value::Object(body)).await
    }

    /// Reads contents at `path` (root when `None`) on `reference` (default
    /// branch when `None`).
    ///
    /// # Errors
    ///
    /// See [`FunctionsClient::invoke`].
    pub async fn get_repo_contents(
        &self,
        target: &RepositoryTarget,
        path: Option<&str>,
        reference: Option<&str>,
    ) -> Result<ContentsResponse, ClientError> {
        let mut body = target.body();
        if let Some(content_path) = path {
            body.insert("path".to_owned(), json!(content_path));
        }
        if let Some(git_ref) = reference {
            body.insert("ref".to_owned(), json!(git_ref));
        }
        self.call::<GetRepoContents>(body).await
    }

    /// Lists branches.
    ///
    /// # Errors
    ///
    /// See [`FunctionsClient::invoke`].
    pub async fn get_repo_branches(
        &self,
        target: &RepositoryTarget,
    ) -> Result<BranchesResponse, ClientError> {
        self.call::<GetRepoBranches>(target.body()).await
    }

    /// Applies metadata changes.
    ///
    /// # Errors
    ///
    /// See [`FunctionsClient::invoke`].
    pub async fn update_repo(
        &self,
        target: &RepositoryTarget,
        changes: &RepositoryChanges,
    ) -> Result<UpdateRepoResponse, ClientError> {
        let mut body = target.body();
        merge_fields(&mut body, changes)?;
        self.call::<UpdateRepo>(body).await
    }

    /// Renames a branch.
    ///
    /// # Errors
    ///
    /// See [`FunctionsClient::invoke`].
    pub async fn rename_branch(
        &self,
        target: &RepositoryTarget,
        old_name: &str,
        new_name: &str,
    ) -> Result<RenameBranchResponse, ClientError> {
        let mut body = target.body();
        body.insert("old_name".to_owned(), json!(old_name));
        body.insert("new_name".to_owned(), json!(new_name));
        self.call::<RenameBranch>(body).await
    }

    /// Deletes the repository named by a confirmed action.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConfirmationMismatch`] without calling the
    /// function when the confirmation names another repository.
    pub async fn delete_repo(
        &self,
        confirmed: &ConfirmedAction,
        target: &RepositoryTarget,
    ) -> Result<DeleteRepoResponse, ClientError> {
        ensure_confirmed(
            confirmed,
            DestructiveAction::DeleteRepository {
                owner: target.owner.clone(),
                repo: target.repo.clone(),
            },
        )?;
        self.call::<DeleteRepo>(target.body()).await
    }

    /// Deletes the branch named by a confirmed action.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConfirmationMismatch`] without calling the
    /// function when the confirmation names another branch.
    pub async fn delete_branch(
        &self,
        confirmed: &ConfirmedAction,
        target: &RepositoryTarget,
        branch: &str,
    ) -> Result<DeleteBranchResponse, ClientError> {
        ensure_confirmed(
            confirmed,
            DestructiveAction::DeleteBranch {
                owner: target.owner.clone(),
                repo: target.repo.clone(),
                branch: branch.to_owned(),
            },
        )?;
        let mut body = target.body();
        body.insert("branch".to_owned(), json!(branch));
        self.call::<DeleteBranch>(body).await
    }
}

fn ensure_confirmed(
    confirmed: &ConfirmedAction,
    requested: DestructiveAction,
) -> Result<(), ClientError> {
    if confirmed.action() == &requested {
        Ok(())
    } else {
        Err(ClientError::ConfirmationMismatch {
            confirmed: Box::new(confirmed.action().clone()),
            requested: Box::new(requested),
        })
    }
}

/// Adds the fields `value` serialises to into `body`.
fn merge_fields(
    body: &mut Map<String, Value>,
    value: &impl Serialize,
) -> Result<(), ClientError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => {
            body.extend(fields);
            Ok(())
        }
        other => Err(ClientError::Encode(serde::ser::Error::custom(format!(
            "expected an object of fields, got {other}"
        )))),
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use std::collections::BTreeMap;

    use super::{
        ClientError, ConfirmationGate, DestructiveAction, FunctionsClient, RepositoryTarget,
        merge_fields,
    };
    use crate::identity::SessionCredential;

    #[fixture]
    fn target() -> RepositoryTarget {
        RepositoryTarget {
            owner: "alice".to_owned(),
            repo: "demo".to_owned(),
            provider_token: "tok".to_owned(),
        }
    }

    fn client_for(server: &MockServer) -> FunctionsClient {
        FunctionsClient::new(
            Url::parse(&server.uri()).expect("mock server URI should parse"),
            SessionCredential::new("session-jwt").expect("credential should be valid"),
        )
    }

    fn confirm(action: DestructiveAction, input: &str) -> super::ConfirmedAction {
        let mut gate = ConfirmationGate::new(action);
        gate.set_input(input);
        gate.confirm().expect("input should confirm")
    }

    #[rstest]
    fn merge_fields_adds_object_fields(target: RepositoryTarget) {
        let mut body = target.body();

        merge_fields(&mut body, &json!({"private": true})).expect("fields should merge");

        assert_eq!(body.get("private"), Some(&json!(true)));
        assert_eq!(body.get("owner"), Some(&json!("alice")));
    }

    #[rstest]
    #[case::not_an_object(json!("private"))]
    #[case::null(json!(null))]
    fn merge_fields_rejects_values_without_fields(
        target: RepositoryTarget,
        #[case] value: serde_json::Value,
    ) {
        let mut body = target.body();
        let before = body.clone();

        let error = merge_fields(&mut body, &value).expect_err("merge should fail");

        assert!(matches!(error, ClientError::Encode(_)), "got {error:?}");
        assert_eq!(body, before);
    }

    #[rstest]
    fn merge_fields_propagates_serialisation_errors(target: RepositoryTarget) {
        let mut body = target.body();
        let mut unencodable = BTreeMap::new();
        unencodable.insert(vec![1_u8], true);

        let error = merge_fields(&mut body, &unencodable).expect_err("merge should fail");

        assert!(matches!(error, ClientError::Encode(_)), "got {error:?}");
    }

    #[rstest]
    #[tokio::test]
    async fn posts_the_body_with_the_session(target: RepositoryTarget) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/get-repo-branches"))
            .and(header("authorization", "Bearer session-jwt"))
            .and(body_partial_json(
                json!({"owner": "alice", "repo": "demo", "provider_token": "tok"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "branches": [{"name": "main", "sha": "abc", "protected": false, "is_default": true}],
                "default_branch": "main"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .get_repo_branches(&target)
            .await
            .expect("call should succeed");

        assert_eq!(response.default_branch, "main");
        assert_eq!(response.branches.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn failure_bodies_become_api_errors(target: RepositoryTarget) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/rename-branch"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Invalid request",
                "details": [{"field": "new_name", "message": "must differ from old_name"}]
            })))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .rename_branch(&target, "main", "main")
            .await
            .expect_err("call should fail");

        let ClientError::Api {
            status,
            message,
            details,
        } = error
        else {
            panic!("expected an API error, got {error:?}");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Invalid request");
        assert_eq!(details.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn confirmed_branch_delete_is_sent(target: RepositoryTarget) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/delete-branch"))
            .and(body_partial_json(json!({"branch": "feature/x"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "branch": "feature/x"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let confirmed = confirm(
            DestructiveAction::DeleteBranch {
                owner: "alice".to_owned(),
                repo: "demo".to_owned(),
                branch: "feature/x".to_owned(),
            },
            "feature/x",
        );

        let response = client_for(&server)
            .delete_branch(&confirmed, &target, "feature/x")
            .await
            .expect("call should succeed");

        assert!(response.success);
        assert_eq!(response.branch, "feature/x");
    }

    #[rstest]
    #[tokio::test]
    async fn confirmation_for_another_repository_is_not_sent(target: RepositoryTarget) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let confirmed = confirm(
            DestructiveAction::DeleteRepository {
                owner: "alice".to_owned(),
                repo: "other".to_owned(),
            },
            "alice/other",
        );

        let error = client_for(&server)
            .delete_repo(&confirmed, &target)
            .await
            .expect_err("call should be refused");

        assert!(matches!(error, ClientError::ConfirmationMismatch { .. }));
    }
}
