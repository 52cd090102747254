//! Repogate server entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use repogate::{
    OctocrabConnector, Pipeline, RepogateConfig, SupabaseIdentityProvider, TracingTelemetrySink,
    serve,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Config(#[from] repogate::ConfigError),
    #[error(transparent)]
    Server(#[from] repogate::ServerError),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = load_config()?;
    init_tracing(&config.log_filter);

    let address = config.resolve_bind_address()?;
    let identity = SupabaseIdentityProvider::new(config.resolve_identity()?);
    let connector = OctocrabConnector::new(config.resolve_upstream()?);
    let pipeline = Pipeline::new(
        Arc::new(identity),
        Arc::new(connector),
        Arc::new(TracingTelemetrySink),
    );

    serve(address, pipeline).await?;
    Ok(())
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`StartupError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<RepogateConfig, StartupError> {
    RepogateConfig::load().map_err(|error| StartupError::Configuration(error.to_string()))
}

/// Installs the global subscriber; `RUST_LOG` wins over the configured
/// filter.
fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
