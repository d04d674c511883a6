use std::sync::Arc;

use zkpass_verifier::routes::{build_router, AppState};
use zkpass_verifier::ServiceConfig;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zkpass_verifier=info".into()),
        )
        .init();

    // Trusted signer addresses are fixed for the process lifetime
    let config = ServiceConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("Invalid configuration: {}", e);
        panic!("Invalid configuration: {}", e);
    });

    tracing::info!(
        "Trusted allocator={} validator={}",
        config.trust.allocator.to_checksum(None),
        config.trust.validator.to_checksum(None)
    );
    if let Some(schema_id) = &config.schema_id {
        tracing::info!("Default schema: {}", schema_id);
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    tracing::info!("Verifier service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            panic!("Failed to bind to {}: {}", addr, e);
        });

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            panic!("Server error: {}", e);
        });
}
