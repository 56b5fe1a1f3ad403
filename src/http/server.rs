//! HTTP server and per-connection request loop.
//!
//! # Responsibilities
//! - Accept connections and spawn one task per connection
//! - Run the request loop: parse → dispatch → write, until the peer closes
//! - Contain handler failures to a single 500 response
//! - Stop accepting on shutdown and drain open connections
//!
//! # Connection States
//! ```text
//! AWAITING_REQUEST ──(request parsed)──▶ DISPATCHING ──▶ WRITING_RESPONSE
//!        ▲                                                      │
//!        └──────────────────(response written)──────────────────┘
//!
//! AWAITING_REQUEST ──(end of stream)──▶ CLOSED
//! AWAITING_REQUEST ──(malformed)──▶ error response ──▶ CLOSED
//! WRITING_RESPONSE ──(write fault)──▶ write side shut down ──▶ CLOSED
//! ```
//!
//! # Design Decisions
//! - Requests on one connection are strictly sequential; the next request is
//!   not read until the previous response is flushed
//! - No read or idle timeouts: a silent peer keeps its task alive
//! - The loop is generic over the transport, so an encrypted stream works
//!   the same as a plain TCP stream

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::environment::Environment;
use crate::http::error::ParseError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::Router;
use crate::security::RequestLimits;

/// Default time to wait for open connections after shutdown is triggered.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// An HTTP/1.1 server over a frozen route table and a shared environment.
///
/// Cloning is cheap; clones share routes, environment and connection count.
pub struct HttpServer<S> {
    router: Arc<Router<S>>,
    env: Arc<Environment<S>>,
    tracker: ConnectionTracker,
    limits: RequestLimits,
    shutdown_grace: Duration,
}

impl<S> Clone for HttpServer<S> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            env: Arc::clone(&self.env),
            tracker: self.tracker.clone(),
            limits: self.limits,
            shutdown_grace: self.shutdown_grace,
        }
    }
}

impl<S> fmt::Debug for HttpServer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServer")
            .field("routes", &self.router.len())
            .field("limits", &self.limits)
            .field("active_connections", &self.tracker.active_count())
            .finish_non_exhaustive()
    }
}

impl<S: Send + Sync + 'static> HttpServer<S> {
    /// Freeze `router` and build the shared environment around `state`.
    pub fn new(router: Router<S>, state: S) -> Self {
        let env = Environment::new(state, router.docs());
        Self {
            router: Arc::new(router),
            env: Arc::new(env),
            tracker: ConnectionTracker::new(),
            limits: RequestLimits::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_limits(mut self, limits: RequestLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn env(&self) -> &Arc<Environment<S>> {
        &self.env
    }

    pub fn router(&self) -> &Router<S> {
        &self.router
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until `shutdown` fires, then drain open ones.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, routes = self.router.len(), "HTTP server starting");
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
                        }
                        let server = self.clone();
                        tokio::spawn(async move {
                            server.serve_connection(stream, peer).await;
                            drop(permit);
                        });
                    }
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                    Err(e) => return Err(e),
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let open = self.tracker.active_count();
        if open > 0 {
            tracing::info!(open, grace = ?self.shutdown_grace, "Draining open connections");
            if !self.tracker.drain(self.shutdown_grace).await {
                tracing::warn!(
                    open = self.tracker.active_count(),
                    "Grace period elapsed with connections still open"
                );
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve every request arriving on `io` until the peer closes it.
    pub async fn serve_connection<IO>(&self, io: IO, peer: impl fmt::Display)
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        let guard = self.tracker.track();
        let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer);
        self.request_loop(io).instrument(span).await;
        drop(guard);
    }

    async fn request_loop<IO>(&self, io: IO)
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        let (read_half, mut writer) = tokio::io::split(io);
        let mut reader = BufReader::new(read_half);
        tracing::info!("New connection");

        loop {
            // AWAITING_REQUEST
            let request = match Request::read(&mut reader, &self.limits).await {
                Ok(request) => request,
                Err(ParseError::Eof) => {
                    tracing::info!("Connection closed");
                    return;
                }
                Err(e) => {
                    match e.status() {
                        Some(status) => {
                            tracing::warn!(error = %e, "Rejecting malformed request");
                            let response = Response::status(status).with_header("Connection", "close");
                            if let Err(e) = response.write_to(&mut writer).await {
                                tracing::debug!(error = %e, "Failed to send rejection");
                            }
                        }
                        None => tracing::error!(error = %e, "Connection error while reading"),
                    }
                    let _ = writer.shutdown().await;
                    return;
                }
            };

            // DISPATCHING
            let start = Instant::now();
            let method = request.method.clone();
            let location = request.location.clone();
            let response = self.handle(request).await;

            // WRITING_RESPONSE
            if let Err(e) = response.write_to(&mut writer).await {
                tracing::error!(error = %e, location = %location, "Connection error while writing");
                let _ = writer.shutdown().await;
                return;
            }
            metrics::record_request(&method, response.code(), start);
            tracing::info!(
                method = %method,
                code = response.code(),
                "{} -> {}",
                location,
                response.code()
            );
        }
    }

    /// Dispatch one request and produce its response.
    ///
    /// Never fails: no route yields 404, a handler error or panic yields 500.
    pub async fn handle(&self, mut request: Request) -> Response {
        let Some((route, captures)) = self.router.dispatch(&request.method, &request.path) else {
            tracing::debug!(method = %request.method, path = %request.path, "No route matched");
            return Response::not_found();
        };
        request.captures = captures;

        let env = Arc::clone(&self.env);
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| route.handler().call(env, request))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(payload) => Err(payload),
        };

        match outcome {
            Ok(Ok(reply)) => Response::from(reply),
            Ok(Err(error)) => {
                tracing::error!(
                    pattern = route.pattern(),
                    error = %error,
                    details = ?error,
                    "Handler failed"
                );
                Response::internal_error()
            }
            Err(payload) => {
                tracing::error!(
                    pattern = route.pattern(),
                    panic = panic_message(payload.as_ref()),
                    "Handler panicked"
                );
                Response::internal_error()
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
