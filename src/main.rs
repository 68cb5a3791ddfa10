//! Line lookup server (v1)
//!
//! Answers "does this exact line exist in the configured file?" over TCP.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │               LINE LOOKUP SERVER             │
//!                         │                                              │
//!   Client Request        │  ┌──────────┐   ┌────────────┐   ┌────────┐  │
//!   ──────────────────────┼─▶│   net    │──▶│ connection │──▶│ index  │  │
//!                         │  │ listener │   │  handler   │   │ lookup │  │
//!                         │  │  + tls   │   │            │   └───┬────┘  │
//!                         │  └──────────┘   └─────┬──────┘       │       │
//!   Status Line           │                       │              │       │
//!   ◀─────────────────────┼───────────────────────┘◀─────────────┘       │
//!                         │                                              │
//!                         │  ┌──────────────────────────────────────┐    │
//!                         │  │          Cross-Cutting Concerns      │    │
//!                         │  │  config · observability · lifecycle  │    │
//!                         │  └──────────────────────────────────────┘    │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use line_lookup::config::schema::DEFAULT_BIND_ADDRESS;
use line_lookup::config::{NullBytePolicy, ServerOptions};
use line_lookup::lifecycle::{self, signals, Shutdown, Started};
use line_lookup::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "line-lookup")]
#[command(about = "Serve exact-line lookups against a text file", long_about = None)]
struct Cli {
    /// Configuration file (KEY=value lines).
    #[arg(short, long, default_value = "server_config.cfg")]
    config: PathBuf,

    /// Address to listen on.
    #[arg(short, long, default_value = DEFAULT_BIND_ADDRESS)]
    bind: String,

    /// Refuse connections beyond this many concurrent clients.
    #[arg(long)]
    max_connections: Option<usize>,

    /// Close connections idle for this many seconds.
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// How NUL bytes in requests are handled.
    #[arg(long, value_enum, default_value_t = NullBytes::Strip)]
    null_bytes: NullBytes,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Seconds to wait for open connections at shutdown.
    #[arg(long, default_value_t = 5)]
    drain_timeout_secs: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum NullBytes {
    Strip,
    Space,
}

impl From<NullBytes> for NullBytePolicy {
    fn from(value: NullBytes) -> Self {
        match value {
            NullBytes::Strip => NullBytePolicy::Strip,
            NullBytes::Space => NullBytePolicy::Space,
        }
    }
}

impl Cli {
    fn options(&self) -> ServerOptions {
        ServerOptions {
            bind_address: self.bind.clone(),
            max_connections: self.max_connections,
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
            null_byte_policy: self.null_bytes.into(),
            metrics_address: self.metrics_address,
            drain_timeout: Duration::from_secs(self.drain_timeout_secs),
            ..ServerOptions::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();
    let options = cli.options();

    tracing::info!(
        config = %cli.config.display(),
        bind_address = %options.bind_address,
        max_connections = ?options.max_connections,
        idle_timeout = ?options.idle_timeout,
        "line-lookup v0.1.0 starting"
    );

    if let Some(addr) = options.metrics_address {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, metrics_address = %addr, "Failed to start metrics endpoint");
        }
    }

    let Started { server, listener } = match lifecycle::start(&cli.config, options).await {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "Startup aborted");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    tokio::spawn(signals::handle_signals(server.clone(), shutdown.clone()));
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
