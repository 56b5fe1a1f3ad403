//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP (or caller-wrapped encrypted) stream
//!     → server.rs (connection loop)
//!     → line.rs + request.rs (parse request line, headers, body)
//!     → [routing layer picks a handler]
//!     → reply.rs (coerce handler result)
//!     → response.rs + body.rs (serialize head, stream body)
//!     → Send to client
//! ```

pub mod body;
pub mod error;
pub mod headers;
pub mod line;
pub mod mime;
pub mod reply;
pub mod request;
pub mod response;
pub mod server;

pub use body::{Body, ChunkedFile};
pub use error::ParseError;
pub use headers::HeaderMap;
pub use reply::Reply;
pub use request::Request;
pub use response::Response;
pub use server::HttpServer;
