//! Small server showing the access-log layer.
//!
//! ```text
//! cargo run -p reqlog --example serve -- --config crates/reqlog/demos/reqlog.toml --port 3000
//! curl localhost:3000/
//! curl localhost:3000/slow
//! curl localhost:3000/stream
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Router};
use clap::Parser;
use tracing::info;

use reqlog::{init_tracing, AccessLogConfig, AccessLogLayer, FinalizeHandle};

#[derive(Parser, Debug)]
#[command(name = "serve", about = "Demo server with access logging")]
struct Cli {
    /// Config file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Write daily log files to this folder (overrides the config file)
    #[arg(long)]
    folder: Option<PathBuf>,

    /// Diagnostic log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = match cli.config {
        Some(ref path) => AccessLogConfig::load(path)?,
        None => AccessLogConfig::new(),
    };
    if let Some(folder) = cli.folder {
        config = config.with_folder(folder);
    }

    let app = Router::new()
        .route("/", get(|| async { "hello\n" }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "not here\n") }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(650)).await;
                "slow\n"
            }),
        )
        .route("/stream", get(stream))
        .layer(AccessLogLayer::new(config));

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")
}

/// Long-lived response: log as soon as the stream is accepted.
async fn stream(Extension(log): Extension<FinalizeHandle>) -> &'static str {
    log.finalize();
    tokio::time::sleep(Duration::from_secs(2)).await;
    "stream closed\n"
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    eprintln!("\nShutting down...");
}
