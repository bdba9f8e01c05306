//! Sobasa bot binary.
//!
//! Connects to Discord and a Lavalink node, runs the ambient scheduler, and
//! serves `/health` until SIGTERM/SIGINT.

use sobasa_bot::backend::LavalinkBackend;
use sobasa_bot::config;
use sobasa_bot::events::{pump_discord, pump_node};
use sobasa_bot::{app, AppState};
use sobasa_discord::{run_gateway, GatewayHandle, GuildCache, RestClient};
use sobasa_lavalink::LavalinkClient;
use sobasa_playback::Orchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("SOBASA_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the bot cannot start without a token");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let lavalink = Arc::new(
        LavalinkClient::new(config.lavalink.clone()).expect("failed to build lavalink client"),
    );
    let rest = RestClient::new(&config.discord).expect("failed to build discord client");
    let cache = Arc::new(GuildCache::new());
    let (gateway, gateway_commands) = GatewayHandle::channel();

    let backend = Arc::new(LavalinkBackend::new(Arc::clone(&lavalink), gateway));
    let orchestrator = Arc::new(Orchestrator::new(
        config.orchestrator(),
        backend.clone(),
        Arc::new(rest),
        cache.clone(),
    ));

    let (node_tx, node_rx) = mpsc::unbounded_channel();
    tokio::spawn(pump_node(
        config.lavalink.node_id.clone(),
        Arc::clone(&orchestrator),
        node_rx,
    ));

    let (discord_tx, discord_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_gateway(
        config.discord.clone(),
        Arc::clone(&cache),
        gateway_commands,
        discord_tx,
    ));
    tokio::spawn(pump_discord(
        Arc::clone(&orchestrator),
        backend,
        lavalink,
        node_tx,
        discord_rx,
    ));

    let app = app(AppState { orchestrator });
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting sobasa health endpoint");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("sobasa shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
        () = terminate => { tracing::info!("received SIGTERM, shutting down"); }
    }
}
