//! grole
//!
//! Serves a directory over HTTP/1.1.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::listener ──▶ http::server ──▶ routing::router
//!                     (bounded accept)  (request loop)   (first match wins)
//!                                                               │
//!                                                               ▼
//!     Client Response                                    handlers::static_files
//!     ◀────────────── http::response ◀─────────────────── handlers::doc
//!                     (fixed or chunked body)
//!
//!     Cross-cutting: config, observability, security (limits), lifecycle
//! ```

use clap::Parser;

use grole::cli::Cli;
use grole::lifecycle::startup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    startup::run(cli).await?;
    Ok(())
}
