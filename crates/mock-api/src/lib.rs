//! In-memory reference API for crudcheck.
//!
//! Serves the HTTP surface a conforming system is expected to expose:
//!
//! - POST   /token                 - password-grant form, returns `{access_token}`
//! - GET    /{endpoint}            - JSON array of `{Id, Name}` in insertion order
//! - POST   /{endpoint}            - `{Name}`; 400 on duplicate or missing Name
//! - GET    /{endpoint}/id/{id}    - `{Id, Name}` or 404
//! - DELETE /{endpoint}/id/{id}    - 200 or 404
//!
//! Every route except /token requires `Authorization: Bearer <issued token>`.
//! [`Fault`] flags turn individual rules off so a suite's oracles can be
//! checked against a non-conforming server.

mod handlers;
mod middleware;
mod state;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Router};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

pub use state::{CreateError, Fault, MockConfig, MockState, StoredObject};

use self::handlers::{
    handle_create, handle_delete, handle_get, handle_list, handle_not_found, handle_token,
};
use self::middleware::auth_middleware;

pub const DUPLICATE_MESSAGE: &str = "Duplicate results found for identifier.";
pub const INVALID_MESSAGE: &str = "Invalid request.";
pub const UNAUTHORIZED_MESSAGE: &str = "Authorization has been denied for this request.";

/// Default token lifetime in seconds; see [`MockConfig::with_token_lifetime`].
pub const TOKEN_LIFETIME_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the router around shared state.
pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/token", post(handle_token))
        .route("/{endpoint}", get(handle_list).post(handle_create))
        .route("/{endpoint}/id/{id}", get(handle_get).delete(handle_delete))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on `addr` until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, config: MockConfig, shutdown: F) -> Result<(), MockError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| MockError::Bind { addr, source })?;
    let local = listener.local_addr()?;
    tracing::info!(%local, endpoints = ?config.endpoints, "mock API listening");

    let app = router(Arc::new(MockState::new(config)));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// A mock API running in the background on an ephemeral local port.
///
/// The server task is aborted when the handle is dropped.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn spawn(config: MockConfig) -> Result<MockServer, MockError> {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| MockError::Bind { addr, source })?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockState::new(config));
        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "mock API stopped");
            }
        });

        Ok(MockServer {
            addr,
            state,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://127.0.0.1:{port}`; collections live directly under it.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_url(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    /// Direct access to the stored collections, bypassing HTTP.
    pub fn state(&self) -> &Arc<MockState> {
        &self.state
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
