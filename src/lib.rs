//! Repogate library crate: an authenticated proxy gateway for managing your
//! own GitHub repositories.
//!
//! Each endpoint validates its JSON body, resolves the caller against a
//! Supabase-style identity store, checks that the target repository belongs
//! to the caller's linked GitHub account, and forwards the request to the
//! GitHub REST API with the caller's own token. Upstream failures are
//! sanitised before they reach the caller.

pub mod client;
pub mod config;
pub mod error;
pub mod github;
pub mod identity;
pub mod proxy;
pub mod server;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{ClientError, FunctionsClient, RepositoryTarget};
pub use config::{ConfigError, RepogateConfig};
pub use error::{ErrorBody, ProxyError};
pub use github::{OctocrabConnector, UpstreamSettings};
pub use identity::{IdentitySettings, SupabaseIdentityProvider};
pub use proxy::Pipeline;
pub use server::{ServerError, router, serve};
pub use telemetry::TracingTelemetrySink;
