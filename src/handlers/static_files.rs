//! Static file responder.
//!
//! # Responsibilities
//! - Map the captured sub-path onto a base directory
//! - Refuse anything that resolves outside the base (answered as 404)
//! - Stream regular files as chunked bodies
//! - Render an index page for directories when enabled
//!
//! # Design Decisions
//! - The base is canonicalized once, at registration
//! - Every request path is canonicalized too, so `..` segments and symlinks
//!   are resolved before the containment check
//! - A path outside the base is indistinguishable from a missing one

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::FutureExt;
use thiserror::Error;

use crate::environment::Environment;
use crate::http::body::DEFAULT_CHUNK_SIZE;
use crate::http::{Body, ChunkedFile, Reply, Request, Response};
use crate::routing::{BoxError, Handler, HandlerFuture, RouteHandle, Router, RouterError};

/// Error type for static responder setup.
#[derive(Debug, Error)]
pub enum StaticFilesError {
    #[error("static directory {path} is not accessible: {source}")]
    Base {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("static directory {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Route(#[from] RouterError),
}

/// Serves files below a base directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base: PathBuf,
    url_prefix: String,
    index: bool,
    chunk_size: usize,
}

impl StaticFiles {
    /// Responder for `base`, with directory indexes enabled.
    pub fn new(base: impl AsRef<Path>) -> Result<Self, StaticFilesError> {
        let path = base.as_ref();
        let base = std::fs::canonicalize(path).map_err(|source| StaticFilesError::Base {
            path: path.to_path_buf(),
            source,
        })?;
        if !base.is_dir() {
            return Err(StaticFilesError::NotADirectory(base));
        }
        Ok(Self {
            base,
            url_prefix: String::new(),
            index: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// URL prefix used for links in directory indexes. Set by [`mount`](Self::mount).
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Register this responder for `GET <prefix>/(.*)`.
    pub fn mount<S>(self, router: &mut Router<S>, prefix: &str) -> Result<RouteHandle, StaticFilesError>
    where
        S: Send + Sync + 'static,
    {
        let responder = self.with_url_prefix(prefix);
        let pattern = format!("{}/(.*)", regex::escape(&responder.url_prefix));
        Ok(router.register(&pattern, &["GET"], responder)?)
    }

    /// Canonical path for `sub_path`, or `None` when it does not exist or
    /// escapes the base.
    pub async fn resolve(&self, sub_path: &str) -> Option<PathBuf> {
        let candidate = self.base.join(sub_path.trim_start_matches('/'));
        let resolved = tokio::fs::canonicalize(&candidate).await.ok()?;
        resolved.starts_with(&self.base).then_some(resolved)
    }

    /// Answer a request for `sub_path`.
    pub async fn respond(&self, sub_path: &str) -> Response {
        let Some(path) = self.resolve(sub_path).await else {
            tracing::debug!(sub_path, "Static path not found or outside base");
            return Response::not_found();
        };
        self.respond_resolved(&path).await
    }

    /// Answer for an already resolved path. Anything that cannot be read is
    /// reported as missing.
    async fn respond_resolved(&self, path: &Path) -> Response {
        match self.serve(path).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Static path unreadable");
                Response::not_found()
            }
        }
    }

    async fn serve(&self, path: &Path) -> io::Result<Response> {
        let metadata = tokio::fs::metadata(path).await?;
        if metadata.is_file() {
            let file = ChunkedFile::new(path).with_chunk_size(self.chunk_size);
            return Ok(Response::from_body(file.into()));
        }
        if metadata.is_dir() && self.index {
            let html = self.render_index(path).await?;
            return Ok(Response::from_body(Body::text(html)));
        }
        Ok(Response::not_found())
    }

    /// HTML listing of `dir`, which must be the base or below it.
    pub async fn render_index(&self, dir: &Path) -> io::Result<String> {
        let relative = dir.strip_prefix(&self.base).unwrap_or(Path::new(""));
        let mut dir_url = format!("{}/", self.url_prefix);
        for segment in relative.iter() {
            dir_url.push_str(&urlencoding::encode(&segment.to_string_lossy()));
            dir_url.push('/');
        }

        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        entries.sort();

        let title = escape_html(&dir_url);
        let mut html = format!("<html><head><title>Index of {title}</title></head><body>\n");
        if dir != self.base.as_path() {
            html.push_str(&format!("<a href=\"{dir_url}../\">../</a><br/>\n"));
        }
        for (name, is_dir) in entries {
            let slash = if is_dir { "/" } else { "" };
            html.push_str(&format!(
                "<a href=\"{dir_url}{}{slash}\">{}{slash}</a><br/>\n",
                urlencoding::encode(&name),
                escape_html(&name),
            ));
        }
        html.push_str("</body></html>\n");
        Ok(html)
    }
}

impl<S: Send + Sync + 'static> Handler<S> for StaticFiles {
    fn call(&self, _env: Arc<Environment<S>>, request: Request) -> HandlerFuture {
        let responder = self.clone();
        async move {
            let sub_path = request.capture(1).unwrap_or("");
            Ok::<_, BoxError>(Reply::Response(responder.respond(sub_path).await))
        }
        .boxed()
    }
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
