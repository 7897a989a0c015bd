use std::collections::BTreeMap;
use std::error::Error;
use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_router::builder::{BuildConfig, InputErrorPolicy, NetworkBuilder};
use transit_router::domain::FeedId;
use transit_router::feed::{self, Feed};
use transit_router::network::Network;
use transit_router::network::store::NetworkStore;
use transit_router::web::{AppState, create_router};

/// Address served when `BIND_ADDR` is not set.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Build configuration from `STREET_FILE`, `CONNECT_SAME_NODE_STOPS` and
/// `SKIP_INVALID_FEEDS`.
fn build_config() -> BuildConfig {
    let mut config =
        BuildConfig::default().connect_same_node_stops(env_flag("CONNECT_SAME_NODE_STOPS"));
    if let Ok(path) = std::env::var("STREET_FILE") {
        config = config.with_street_file(path);
    }
    if env_flag("SKIP_INVALID_FEEDS") {
        config = config.with_input_errors(InputErrorPolicy::SkipFeed);
    }
    config
}

/// Read the comma-separated GTFS archives of `GTFS_FILES` as feeds
/// `gtfs_0`, `gtfs_1`, ...
fn read_feeds(policy: InputErrorPolicy) -> Result<BTreeMap<FeedId, Feed>, Box<dyn Error>> {
    let paths = std::env::var("GTFS_FILES").unwrap_or_default();
    let mut feeds = BTreeMap::new();
    let paths = paths.split(',').map(str::trim).filter(|p| !p.is_empty());
    for (i, path) in paths.enumerate() {
        let id = FeedId::numbered(i);
        info!(feed = %id, path, "Reading GTFS feed");
        match feed::gtfs::read(path) {
            Ok(feed) => {
                feeds.insert(id, feed);
            }
            Err(e) if policy == InputErrorPolicy::SkipFeed => {
                warn!(feed = %id, path, error = %e, "Skipping unreadable feed");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(feeds)
}

/// Load the stored network, or build one and store it.
async fn load_or_build(config: &BuildConfig) -> Result<Network, Box<dyn Error>> {
    let store = std::env::var("NETWORK_FILE").ok().map(NetworkStore::new);

    if let Some(store) = &store {
        if let Some(network) = store.load_existing()? {
            info!(path = %store.path().display(), "Loaded stored network");
            return Ok(network);
        }
    }

    let feeds = read_feeds(config.input_errors)?;
    let network = NetworkBuilder::new(config.clone()).build(feeds).await?;
    if let Some(store) = &store {
        store.save(&network)?;
    }
    Ok(network)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = build_config();
    let network = load_or_build(&config).await?;

    let state = AppState::new(network, config.router.clone());
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()?;
    info!(%addr, "Transit router listening");
    info!("  GET /health   - Health check");
    info!("  GET /network  - Network summary");
    info!("  GET /route    - Plan a journey");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
