//! Pre-built handlers.
//!
//! - static_files.rs: files and directory indexes below a base directory
//! - doc.rs: plain-text listing of documented routes

pub mod doc;
pub mod static_files;

pub use doc::{mount_doc, render_doc, serve_doc};
pub use static_files::{escape_html, StaticFiles, StaticFilesError};
