mod core;
mod http;
mod snapshots;
mod socket;
mod store;

use dock_proto::config::Config;
use tokio::sync::broadcast;
use tracing::info;

/// Fan-out notifications from FeedCore to per-client socket tasks.  The
/// payload is intentionally empty: receivers re-read the store so every
/// client always gets the freshest full list.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    CommentsChanged,
    RepliesChanged,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = dock_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("dockd.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,dock_daemon=debug")),
        )
        .with_ansi(false)
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    // Stores
    let feed_store = store::FeedStore::new(config.daemon.state_file.clone());
    let station_store = store::StationStore::new();

    // Broadcast channel (FeedCore → socket clients)
    let (broadcast_tx, _) = broadcast::channel::<BroadcastMessage>(100);

    // Event channel — all feed commands funnel into FeedCore
    let (event_tx, event_rx) = tokio::sync::mpsc::channel::<core::DaemonEvent>(256);

    // Client list for the feed socket server
    let clients = std::sync::Arc::new(tokio::sync::RwLock::new(
        Vec::<socket::ClientHandle>::new(),
    ));

    // Feed socket server
    let _socket_handle = socket::start_server(
        config.feed.bind_address.clone(),
        config.feed.port,
        feed_store.clone(),
        clients.clone(),
        event_tx.clone(),
        broadcast_tx.clone(),
    );

    // REST API
    if config.http.enabled {
        let _http_handle = http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            station_store.clone(),
            feed_store.clone(),
        );
    }

    // Snapshot collector (or demo seeding when polling is off)
    let _collector_handle = snapshots::start_collector(config.clone(), station_store.clone());

    info!("Daemon initialised, running feed event loop");
    let feed_core = core::FeedCore::new(feed_store, broadcast_tx);
    feed_core.run(event_rx).await?;

    Ok(())
}
