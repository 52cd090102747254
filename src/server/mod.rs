//! HTTP surface: one `POST /functions/v1/<name>` route per endpoint.
//!
//! Every response, including failures and CORS preflights, carries
//! permissive CORS headers so browser clients on any origin can call the
//! functions directly.

use std::io;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ErrorBody;
use crate::identity::SessionCredential;
use crate::proxy::operations::{
    DeleteBranch, DeleteRepo, GetRepoBranches, GetRepoContents, RenameBranch, UpdateRepo,
};
use crate::proxy::{Pipeline, ProxyOperation};

/// Path prefix every function is mounted under.
pub const FUNCTIONS_PREFIX: &str = "/functions/v1";

/// Failures starting or running the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind HTTP listener on {address}: {source}")]
    Bind {
        /// Requested address.
        address: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("HTTP server error: {0}")]
    Serve(#[source] io::Error),
}

/// Builds the router for all six functions plus `/health`.
#[must_use]
pub fn router(pipeline: Pipeline) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(&function_path::<GetRepoContents>(), post(invoke::<GetRepoContents>))
        .route(&function_path::<GetRepoBranches>(), post(invoke::<GetRepoBranches>))
        .route(&function_path::<UpdateRepo>(), post(invoke::<UpdateRepo>))
        .route(&function_path::<DeleteRepo>(), post(invoke::<DeleteRepo>))
        .route(&function_path::<RenameBranch>(), post(invoke::<RenameBranch>))
        .route(&function_path::<DeleteBranch>(), post(invoke::<DeleteBranch>))
        .fallback(unknown_function)
        .with_state(pipeline)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn function_path<Op: ProxyOperation>() -> String {
    format!("{FUNCTIONS_PREFIX}/{}", Op::NAME)
}

async fn invoke<Op: ProxyOperation + 'static>(
    State(pipeline): State<Pipeline>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let session = SessionCredential::from_headers(&headers);
    match pipeline.run::<Op>(session, &body).await {
        Ok(output) => {
            let mut response = Json(output).into_response();
            if Op::NO_STORE {
                let response_headers = response.headers_mut();
                response_headers.insert(
                    CACHE_CONTROL,
                    HeaderValue::from_static("no-store, no-cache, must-revalidate"),
                );
                response_headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
                response_headers.insert(EXPIRES, HeaderValue::from_static("0"));
            }
            response
        }
        Err(error) => {
            tracing::debug!(endpoint = Op::NAME, status = %error.status(), "request failed");
            error.into_response()
        }
    }
}

#[expect(clippy::unused_async, reason = "axum handlers are async functions")]
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[expect(clippy::unused_async, reason = "axum handlers are async functions")]
async fn unknown_function() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Unknown function".to_owned(),
            details: None,
        }),
    )
}

/// Binds `address` and serves until Ctrl-C or `SIGTERM`.
///
/// # Errors
///
/// Returns [`ServerError`] when binding fails or the server stops with an
/// I/O error.
pub async fn serve(address: SocketAddr, pipeline: Pipeline) -> Result<(), ServerError> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind { address, source })?;
    tracing::info!(%address, "HTTP server listening");

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
