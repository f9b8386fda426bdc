use anonymous_news::{config::Config, server};
use anyhow::{Context, Result};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the variables come from the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("anonymous_news=info".parse()?),
        )
        .init();

    info!("Starting anonymous news server");

    let config = Config::from_env()?;
    let state = server::AppState::from_config(&config)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    server::serve(listener, state)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
