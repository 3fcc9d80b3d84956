//! `crudcheck serve-mock` -- run the in-memory reference API in the foreground.

use std::net::SocketAddr;

use crudcheck_mock_api::{MockConfig, MockError};

pub async fn start_mock(
    port: u16,
    endpoints: Vec<String>,
    username: String,
    password: String,
) -> Result<(), MockError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let config = MockConfig::new(endpoints).with_user(username, password);

    eprintln!("crudcheck mock API listening on http://{}", addr);
    eprintln!("token endpoint: http://{}/token", addr);
    crudcheck_mock_api::serve(addr, config, shutdown_signal()).await?;

    eprintln!("\nMock API shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    eprintln!("\nReceived shutdown signal...");
}
