//! The authenticated proxy pipeline.
//!
//! Every endpoint runs the same stages in the same order: validate the body,
//! resolve the caller, check ownership, then forward upstream. Each stage
//! returns early on failure, so nothing reaches GitHub unless every check
//! before it has passed.

pub mod operations;
pub mod ownership;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ProxyError;
use crate::github::GatewayConnector;
use crate::github::GitHubGateway;
use crate::github::locator::RepositoryRef;
use crate::identity::{IdentityProvider, SessionCredential};
use crate::telemetry::TelemetrySink;

use self::validation::{FieldRule, ValidatedBody, validate};

/// One proxy endpoint.
#[async_trait]
pub trait ProxyOperation: Sized + Send + Sync {
    /// Function name the endpoint is invoked by.
    const NAME: &'static str;
    /// Field rules for the request body, excluding the provider token.
    const SCHEMA: &'static [FieldRule];
    /// Whether the success response must carry no-cache headers.
    const NO_STORE: bool = false;

    /// Success payload.
    type Output: Serialize + Send;

    /// Narrows a validated body into the typed request.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Validation`] for cross-field rules the schema
    /// cannot express.
    fn from_body(body: &ValidatedBody) -> Result<Self, ProxyError>;

    /// Repository the request targets.
    fn repository(&self) -> &RepositoryRef;

    /// Issues the upstream calls.
    ///
    /// # Errors
    ///
    /// Returns the sanitised upstream failure.
    async fn forward(&self, gateway: &dyn GitHubGateway) -> Result<Self::Output, ProxyError>;
}

/// Shared collaborators of every request.
#[derive(Clone)]
pub struct Pipeline {
    identity: Arc<dyn IdentityProvider>,
    connector: Arc<dyn GatewayConnector>,
    audit: Arc<dyn TelemetrySink>,
}

impl Pipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        connector: Arc<dyn GatewayConnector>,
        audit: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            identity,
            connector,
            audit,
        }
    }

    /// Runs one request through every stage.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error. Validation, authentication
    /// and ownership failures are returned before any upstream call.
    pub async fn run<Op: ProxyOperation>(
        &self,
        session: Option<SessionCredential>,
        body: &[u8],
    ) -> Result<Op::Output, ProxyError> {
        let validated = validate(body, Op::SCHEMA)?;
        let token = validated.provider_token()?;
        let operation = Op::from_body(&validated)?;

        let credential = session.ok_or(ProxyError::Unauthorized)?;
        let identity = self.identity.resolve(&credential).await?;
        ownership::authorize(
            &identity,
            operation.repository(),
            Op::NAME,
            self.audit.as_ref(),
        )?;

        let gateway = self.connector.connect(&token)?;
        let output = operation.forward(gateway.as_ref()).await?;
        tracing::info!(
            endpoint = Op::NAME,
            repository = %operation.repository(),
            user_id = %identity.user_id,
            "proxied request completed"
        );
        Ok(output)
    }
}
