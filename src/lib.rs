//! grole: a small HTTP/1.1 server core.
//!
//! Requests are parsed off any async byte stream, matched against an ordered
//! table of regular-expression routes and answered by handlers that share one
//! [`Environment`]. Responses are framed with `Content-Length`, or streamed
//! from files with chunked transfer encoding.
//!
//! ```no_run
//! use grole::{HttpServer, Request, Router, Shutdown};
//! use grole::net::Listener;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router: Router<()> = Router::new();
//! router.route_sync("/", &["GET"], |_env, _req: &Request| {
//!     Ok::<_, std::convert::Infallible>("Hello, World!")
//! })?;
//!
//! let server = HttpServer::new(router, ());
//! let listener = Listener::from_tcp(tokio::net::TcpListener::bind("127.0.0.1:1234").await?, 1024);
//! let shutdown = Shutdown::new();
//! server.run(listener, shutdown.subscribe()).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::ServerConfig;
pub use environment::{Environment, RouteDoc};
pub use http::{Body, ChunkedFile, HttpServer, Reply, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::{async_fn, sync_fn, Router};
