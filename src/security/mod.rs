//! Request hardening.
//!
//! # Data Flow
//! ```text
//! Connection loop
//!     → limits.rs (line, header count and body caps)
//!     → request parser enforces them while reading
//! ```
//!
//! Static file containment (canonical path must stay under the base
//! directory) lives with the static responder in `handlers::static_files`.

pub mod limits;

pub use limits::RequestLimits;
