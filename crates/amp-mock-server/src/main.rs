//! Standalone mock Agent Memory Platform: serves /v1/agents/... in memory.

use amp_mock_server::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_key = std::env::var("AMP_API_KEY").unwrap_or_else(|_| "dev-token".to_string());
    let state = Arc::new(AppState::new(api_key));

    let app = router(state);
    let addr: SocketAddr = std::env::var("AMP_MOCK_LISTEN")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    tracing::info!("mock Agent Memory Platform listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
