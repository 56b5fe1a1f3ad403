//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes per method, in registration order
//! - Look up the first route whose pattern fully matches a path
//! - Collect documentation records for described routes
//!
//! # Design Decisions
//! - Built before serving starts; read-only while serving
//! - First match wins; no specificity ranking between overlapping patterns
//! - Explicit no-match (`None`) rather than a silent default route

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::environment::{Environment, RouteDoc};
use crate::http::{Reply, Request};
use crate::routing::handler::{async_fn, sync_fn, BoxError, Handler};
use crate::routing::matcher::{Captures, RoutePattern};

/// Error raised while registering a route.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid route pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("route {pattern:?} registered without any method")]
    NoMethods { pattern: String },
}

/// Identifies a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteHandle(usize);

impl RouteHandle {
    /// Registration index of the route.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A registered route. Immutable once created.
pub struct Route<S> {
    handle: RouteHandle,
    pattern: RoutePattern,
    methods: Vec<String>,
    handler: Arc<dyn Handler<S>>,
    doc: Option<RouteDoc>,
}

impl<S> Route<S> {
    pub fn handle(&self) -> RouteHandle {
        self.handle
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn handler(&self) -> &Arc<dyn Handler<S>> {
        &self.handler
    }

    pub fn doc(&self) -> Option<&RouteDoc> {
        self.doc.as_ref()
    }
}

impl<S> std::fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("handle", &self.handle)
            .field("pattern", &self.pattern.as_str())
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// Ordered route registry keyed by method.
pub struct Router<S> {
    routes: Vec<Arc<Route<S>>>,
    by_method: HashMap<String, Vec<Arc<Route<S>>>>,
}

impl<S: Send + Sync + 'static> Router<S> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            by_method: HashMap::new(),
        }
    }

    /// Register `handler` for `pattern` under each of `methods`.
    pub fn register<H>(
        &mut self,
        pattern: &str,
        methods: &[&str],
        handler: H,
    ) -> Result<RouteHandle, RouterError>
    where
        H: Handler<S>,
    {
        self.insert(pattern, methods, Arc::new(handler), None)
    }

    /// Register a route and record `description` in the documentation list.
    pub fn register_documented<H>(
        &mut self,
        pattern: &str,
        methods: &[&str],
        description: impl Into<String>,
        handler: H,
    ) -> Result<RouteHandle, RouterError>
    where
        H: Handler<S>,
    {
        let doc = RouteDoc {
            pattern: pattern.to_string(),
            methods: methods.join(","),
            description: description.into(),
        };
        self.insert(pattern, methods, Arc::new(handler), Some(doc))
    }

    /// Register an async function for `GET` requests.
    pub fn get<F, Fut, R, E>(&mut self, pattern: &str, f: F) -> Result<RouteHandle, RouterError>
    where
        F: Fn(Arc<Environment<S>>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Into<Reply>,
        E: Into<BoxError>,
    {
        self.register(pattern, &["GET"], async_fn(f))
    }

    /// Register a synchronous function for `methods`.
    pub fn route_sync<F, R, E>(
        &mut self,
        pattern: &str,
        methods: &[&str],
        f: F,
    ) -> Result<RouteHandle, RouterError>
    where
        F: Fn(&Environment<S>, &Request) -> Result<R, E> + Send + Sync + 'static,
        R: Into<Reply>,
        E: Into<BoxError>,
    {
        self.register(pattern, methods, sync_fn(f))
    }

    fn insert(
        &mut self,
        pattern: &str,
        methods: &[&str],
        handler: Arc<dyn Handler<S>>,
        doc: Option<RouteDoc>,
    ) -> Result<RouteHandle, RouterError> {
        if methods.is_empty() {
            return Err(RouterError::NoMethods {
                pattern: pattern.to_string(),
            });
        }
        let compiled = RoutePattern::new(pattern).map_err(|source| RouterError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let handle = RouteHandle(self.routes.len());
        let route = Arc::new(Route {
            handle,
            pattern: compiled,
            methods: methods.iter().map(|m| m.to_string()).collect(),
            handler,
            doc,
        });

        for method in &route.methods {
            let entries = self.by_method.entry(method.clone()).or_default();
            if !entries.iter().any(|r| r.handle == handle) {
                entries.push(Arc::clone(&route));
            }
        }
        self.routes.push(route);

        tracing::debug!(pattern = %pattern, methods = ?methods, "Route registered");
        Ok(handle)
    }
}

impl<S> Router<S> {
    /// Find the first route for `method` whose pattern matches all of `path`.
    pub fn dispatch(&self, method: &str, path: &str) -> Option<(&Arc<Route<S>>, Captures)> {
        self.by_method
            .get(method)?
            .iter()
            .find_map(|route| route.pattern.captures(path).map(|caps| (route, caps)))
    }

    /// Documentation records of described routes, in registration order.
    pub fn docs(&self) -> Vec<RouteDoc> {
        self.routes.iter().filter_map(|r| r.doc.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<S: Send + Sync + 'static> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for Router<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}
