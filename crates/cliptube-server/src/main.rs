use std::net::SocketAddr;

use tracing::info;

use cliptube_server::{Config, build_router, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cliptube=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    let db = cliptube_db::Database::open(&config.db_path)?;
    let state = build_state(&config, db);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("ClipTube server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
