//! Shared test utilities: a router wired to mock GitHub and identity
//! servers.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use repogate::test_support::{auth_user_json, profile_rows_json};
use repogate::{
    IdentitySettings, OctocrabConnector, Pipeline, SupabaseIdentityProvider,
    TracingTelemetrySink, UpstreamSettings, router,
};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Session credential the identity mock accepts.
pub const SESSION: &str = "session-jwt";

/// Mock upstreams plus the router under test.
pub struct Harness {
    /// Stand-in for the GitHub REST API.
    pub github: MockServer,
    /// Stand-in for the Supabase project.
    pub identity: MockServer,
    router: Router,
}

/// A response with its body decoded as JSON.
pub struct Reply {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body; `Value::Null` when empty.
    pub body: Value,
}

impl Harness {
    /// Starts both mock servers with `SESSION` resolving to `username`.
    ///
    /// # Panics
    ///
    /// Panics if a mock server URI cannot be parsed.
    pub async fn start(username: &str) -> Self {
        let github = MockServer::start().await;
        let identity = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", format!("Bearer {SESSION}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_user_json("user-1")))
            .mount(&identity)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&identity)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(profile_rows_json("github_username", Some(username))),
            )
            .mount(&identity)
            .await;

        let identity_settings = IdentitySettings {
            base_url: Url::parse(&identity.uri())
                .unwrap_or_else(|error| panic!("identity URI should parse: {error}")),
            api_key: "anon-key".to_owned(),
            profile_table: "profiles".to_owned(),
            username_column: "github_username".to_owned(),
        };
        let upstream = UpstreamSettings {
            api_base: Url::parse(&github.uri())
                .unwrap_or_else(|error| panic!("GitHub URI should parse: {error}")),
            user_agent: "repogate-test".to_owned(),
        };
        let pipeline = Pipeline::new(
            Arc::new(SupabaseIdentityProvider::new(identity_settings)),
            Arc::new(OctocrabConnector::new(upstream)),
            Arc::new(TracingTelemetrySink),
        );

        Self {
            github,
            identity,
            router: router(pipeline),
        }
    }

    /// Posts `body` to a function with the accepted session.
    pub async fn invoke(&self, function: &str, body: &Value) -> Reply {
        self.invoke_as(function, body, Some(SESSION)).await
    }

    /// Posts `body` to a function with an optional session credential.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn invoke_as(&self, function: &str, body: &Value, session: Option<&str>) -> Reply {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("/functions/v1/{function}"))
            .header("content-type", "application/json")
            .header("origin", "https://app.example.com");
        if let Some(credential) = session {
            builder = builder.header("authorization", format!("Bearer {credential}"));
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|error| panic!("request should build: {error}"));
        self.send(request).await
    }

    /// Sends an arbitrary request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|error| panic!("router should respond: {error}"));
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|error| panic!("body should be readable: {error}"));
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|error| panic!("body should be JSON: {error}"))
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    /// Number of requests the GitHub mock has received.
    pub async fn github_calls(&self) -> usize {
        self.github
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Number of requests the identity mock has received.
    pub async fn identity_calls(&self) -> usize {
        self.identity
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}
