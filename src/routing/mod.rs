//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before serving):
//!     pattern + methods + handler (+ description)
//!     → matcher.rs (compile anchored regex)
//!     → router.rs (append to per-method lists, record docs)
//!
//! Dispatch (per request):
//!     method, decoded path
//!     → router.rs (walk the method's list in order)
//!     → matcher.rs (full-string match, extract captures)
//!     → Return: (route, captures) or no-match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: first registered match wins
//! - Handlers are trait objects so async and sync functions share a route list

pub mod handler;
pub mod matcher;
pub mod router;

pub use handler::{async_fn, sync_fn, BoxError, Handler, HandlerFuture};
pub use matcher::{Captures, RoutePattern};
pub use router::{Route, RouteHandle, Router, RouterError};
