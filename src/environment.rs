//! Shared handler environment.
//!
//! One [`Environment`] exists per server and every handler invocation receives
//! a handle to it. It carries the user state and the documentation records
//! of routes registered with a description.
//!
//! The runtime is multi-threaded, so user state sits behind a mutex. The guard
//! returned by [`Environment::lock`] is not `Send`, which means an async
//! handler cannot hold it across an `.await`: every mutation is atomic with
//! respect to other connections.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Documentation record for a registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDoc {
    /// The route's path pattern as registered.
    pub pattern: String,
    /// Methods joined with `,`.
    pub methods: String,
    pub description: String,
}

/// State shared by all handlers of a server.
#[derive(Debug)]
pub struct Environment<S> {
    state: Mutex<S>,
    doc: Vec<RouteDoc>,
}

impl<S> Environment<S> {
    pub fn new(state: S, doc: Vec<RouteDoc>) -> Self {
        Self {
            state: Mutex::new(state),
            doc,
        }
    }

    /// Lock the user state.
    ///
    /// A handler that panicked while holding the lock does not make the
    /// state unusable for later requests.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Documentation records, in registration order.
    pub fn doc(&self) -> &[RouteDoc] {
        &self.doc
    }
}

impl<S: Default> Default for Environment<S> {
    fn default() -> Self {
        Self::new(S::default(), Vec::new())
    }
}
