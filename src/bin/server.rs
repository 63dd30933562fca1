//! flatkv Server Binary
//!
//! Starts the HTTP server for flatkv.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use flatkv::network::Server;
use flatkv::{Config, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// flatkv Server
#[derive(Parser, Debug)]
#[command(name = "flatkv-server")]
#[command(about = "HTTP key-value store backed by a single JSON file")]
#[command(version)]
struct Args {
    /// Storage root; data is kept in <data-dir>/data.json
    #[arg(short, long, env = "STORAGE_PATH", default_value = "/tmp")]
    data_dir: String,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Largest accepted value in bytes
    #[arg(short = 'm', long, default_value = "10485760")]
    max_value_size: usize,

    /// Do not serialize store operations (concurrent writers may lose updates)
    #[arg(long)]
    unserialized: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flatkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("flatkv Server v{}", flatkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(SocketAddr::new(args.host, args.port).to_string())
        .max_value_size(args.max_value_size)
        .serialize_access(!args.unserialized)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let store = Arc::new(Store::open(&config));

    let server = Server::new(config, store);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
