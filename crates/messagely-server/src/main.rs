mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use messagely_api::password::PasswordHasher;
use messagely_api::token::TokenIssuer;
use messagely_api::{AppStateInner, router};
use messagely_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "messagely=debug,messagely_api=debug,messagely_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Process-wide state: built once here, read-only from now on.
    let db = Database::open(&config.db_path)?;
    let hasher = PasswordHasher::with_memory(config.hash_cost, config.hash_memory_kib)?;
    let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl);

    match tokens.ttl() {
        Some(ttl) => info!("Session tokens expire after {} hours", ttl.num_hours()),
        None => info!("Session tokens do not expire"),
    }

    let state = AppStateInner::new(db, hasher, tokens);

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.listen_addr()?;
    info!("messagely listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
