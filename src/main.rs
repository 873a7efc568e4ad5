use anyhow::{Context, Result};
use repochat::api::{create_app, AuthAppState};
use repochat::config::{load_config, AppConfig};
use repochat::oauth::run_state_cleanup;
use repochat::session::run_session_cleanup;
use std::path::Path;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "repochat.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before anything reads the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {}", e);
        }
    }

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repochat=info,tower_http=info".into()),
        )
        .init();

    info!("Repochat starting...");

    let config = load_app_config()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        oauth_configured = config.oauth.is_configured(),
        fallback_token = config.github.fallback_token.is_some(),
        scopes = ?config.oauth.scopes,
        "Configuration loaded"
    );
    if config.oauth.is_configured() && config.oauth.redirect_uri.is_empty() {
        warn!("GITHUB_REDIRECT_URI not set; GitHub will use the OAuth app's registered callback");
    }

    let state = AuthAppState::from_config(&config)
        .context("Failed to initialize authentication state")?;

    // Sweep expired login attempts in the background
    let cleanup_handle = tokio::spawn(run_state_cleanup(
        state.flow.states().clone(),
        config.oauth.state_cleanup_interval_seconds,
    ));
    let session_cleanup_handle = tokio::spawn(run_session_cleanup(
        state.sessions.clone(),
        config.session.cleanup_interval_seconds,
    ));

    let router = create_app(state, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    cleanup_handle.abort();
    session_cleanup_handle.abort();
    info!("Repochat stopped");

    Ok(())
}

/// File config (REPOCHAT_CONFIG or ./repochat.toml when present), then env overrides
fn load_app_config() -> Result<AppConfig> {
    let mut config = match std::env::var("REPOCHAT_CONFIG") {
        Ok(path) => load_config(&path).with_context(|| format!("Failed to load config {}", path))?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH)?,
        Err(_) => AppConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl_c signal");
        // Without a signal handler, keep serving until the process is killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
