//! XHTTP node.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  XHTTP NODE                  │
//!                         │                                              │
//!     Client Request      │  ┌─────────┐    ┌──────────┐   ┌──────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ dispatch │──▶│ registry │  │
//!                         │  │ server  │    │ X-* hdrs │   │ (ArcSwap)│  │
//!                         │  └─────────┘    └────┬─────┘   └────▲─────┘  │
//!                         │                      │              │        │
//!                         │                      ▼              │        │
//!     Client Response     │  ┌─────────┐    ┌──────────┐   ┌────┴─────┐  │
//!     ◀───────────────────┼──│protocol │◀───│controller│   │  schema  │◀─┼── service_dir/*.xml
//!                         │  │response │    │(perform) │   │  parser  │  │
//!                         │  └─────────┘    └──────────┘   └──────────┘  │
//!                         │                                              │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::net::TcpListener;

use xhttp_node::config::load_or_default;
use xhttp_node::lifecycle::signals;
use xhttp_node::observability::{logging, metrics};
use xhttp_node::{ControllerRegistry, HttpServer, RegistryWatcher, ServiceRegistry, SharedRegistry, Shutdown};

#[derive(Parser)]
#[command(name = "xhttp-node")]
#[command(about = "XHTTP header-driven RPC node", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding one `<service>.xml` schema per service
    service_dir: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parse the service directory, print the registry as JSON and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_or_default(cli.config.as_deref())?;

    if let Err(e) = logging::init(&config.observability.log_level, config.observability.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!("xhttp-node v{} starting", env!("CARGO_PKG_VERSION"));

    let registry = ServiceRegistry::load(&cli.service_dir, config.registry.parse_options())?;

    if cli.check {
        println!("{}", serde_json::to_string_pretty(registry.documents())?);
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        services = registry.len(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shared: SharedRegistry = Arc::new(ArcSwap::from_pointee(registry));

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    if let Err(e) = signals::spawn_reload_on_sighup(RegistryWatcher::new(shared.clone()), shutdown.subscribe()) {
        tracing::error!(error = %e, "Failed to install SIGHUP handler");
    }
    signals::spawn_shutdown_listener(shutdown);

    let server = HttpServer::new(config, shared, ControllerRegistry::new());
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
