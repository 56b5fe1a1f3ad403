//! Route documentation responder.
//!
//! Lists every route registered with a description, one line each:
//! `URL: <pattern>, supported methods: <methods>. <description>`.

use std::convert::Infallible;

use crate::environment::{Environment, RouteDoc};
use crate::http::body::TEXT_PLAIN;
use crate::http::{Body, Request};
use crate::routing::{RouteHandle, Router, RouterError};

/// Render the documentation page for `docs`.
pub fn render_doc(docs: &[RouteDoc]) -> String {
    docs.iter()
        .map(|doc| {
            format!(
                "URL: {}, supported methods: {}. {}\n",
                doc.pattern, doc.methods, doc.description
            )
        })
        .collect()
}

/// Handler body for the doc route.
pub fn serve_doc<S>(env: &Environment<S>, _request: &Request) -> Result<Body, Infallible> {
    Ok(Body::text(render_doc(env.doc())).with_content_type(TEXT_PLAIN))
}

/// Register the doc responder for `GET <path>`.
///
/// The page reflects every documented route of the finished router, not
/// only those registered before this call.
pub fn mount_doc<S>(router: &mut Router<S>, path: &str) -> Result<RouteHandle, RouterError>
where
    S: Send + Sync + 'static,
{
    router.route_sync(&regex::escape(path), &["GET"], serve_doc::<S>)
}
