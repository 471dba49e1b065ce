//! Serve command implementation.

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use voyager_ops::{Config, OpsContext};

use super::SourceArgs;

/// Bootstrap a session and serve the API until Ctrl+C.
pub async fn execute(config: &Config, source: &SourceArgs, port: Option<u16>) -> Result<()> {
    let config = source.apply(config);
    let port = port.unwrap_or(config.port);

    let ctx = OpsContext::start(config)?;
    let session = ctx.session().clone();

    if let Some(file) = &source.file {
        let text = std::fs::read_to_string(file)?;
        session.stage_text(&text).await?;
        session.commit().await?;
    } else {
        session.bootstrap(&ctx.config.bootstrap_params()).await?;
    }

    let app = Router::new().nest("/api", voyager_api::create_api_router(session));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    // Print server info
    println!();
    println!("🚀 Voyager Server");
    println!("   API:     http://localhost:{}/api/health", port);
    println!("   State:   http://localhost:{}/api/state", port);
    println!("   Updates: ws://localhost:{}/api/ws", port);
    println!();
    println!("   Press Ctrl+C to stop");
    println!();

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let store = ctx.shutdown().await?;
    info!(events = store.applied(), "Server stopped");
    Ok(())
}
