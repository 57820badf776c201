mod action;
mod app;
mod app_state;
mod component;
mod components;
mod connection;
mod feed;
mod http;
mod theme;
mod widgets;

use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = dock_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("velodock.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress
    // noisy connection-level DEBUG from HTTP client internals.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("velodock log: {}", log_path.display());

    tracing::info!("velodock starting…");

    let config = dock_proto::config::Config::load().unwrap_or_default();

    let api = http::ApiClient::new(&config.http.bind_address, config.http.port);
    let feed_endpoint = format!("{}:{}", config.feed.bind_address, config.feed.port);

    let (feed_tx, feed_rx) = mpsc::channel::<connection::FeedEvent>(256);
    let app = app::App::new(
        config.user.username.clone(),
        feed_endpoint,
        api,
        feed_tx,
    );
    app.run(feed_rx).await?;

    Ok(())
}
