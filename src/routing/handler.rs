//! Route handlers.
//!
//! A handler receives the shared [`Environment`] and the matched [`Request`]
//! and returns a future resolving to a [`Reply`] or an error. Synchronous
//! functions are wrapped in a future that completes without suspending, so
//! the connection loop treats both kinds the same way.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::environment::Environment;
use crate::http::{Reply, Request};

/// Error type returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by [`Handler::call`].
pub type HandlerFuture = BoxFuture<'static, Result<Reply, BoxError>>;

/// Something that can answer a matched request.
pub trait Handler<S>: Send + Sync + 'static {
    fn call(&self, env: Arc<Environment<S>>, request: Request) -> HandlerFuture;
}

/// Adapter for `async` functions and closures. See [`async_fn`].
#[derive(Debug, Clone)]
pub struct AsyncFn<F>(F);

/// Adapter for plain functions and closures. See [`sync_fn`].
#[derive(Debug, Clone)]
pub struct SyncFn<F>(Arc<F>);

/// Wrap an async function `(env, request) -> Result<impl Into<Reply>, E>`.
pub fn async_fn<F>(f: F) -> AsyncFn<F> {
    AsyncFn(f)
}

/// Wrap a synchronous function `(env, request) -> Result<impl Into<Reply>, E>`.
pub fn sync_fn<F>(f: F) -> SyncFn<F> {
    SyncFn(Arc::new(f))
}

impl<S, F, Fut, R, E> Handler<S> for AsyncFn<F>
where
    S: Send + Sync + 'static,
    F: Fn(Arc<Environment<S>>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Into<Reply>,
    E: Into<BoxError>,
{
    fn call(&self, env: Arc<Environment<S>>, request: Request) -> HandlerFuture {
        (self.0)(env, request)
            .map(|result| result.map(Into::into).map_err(Into::into))
            .boxed()
    }
}

impl<S, F, R, E> Handler<S> for SyncFn<F>
where
    S: Send + Sync + 'static,
    F: Fn(&Environment<S>, &Request) -> Result<R, E> + Send + Sync + 'static,
    R: Into<Reply>,
    E: Into<BoxError>,
{
    fn call(&self, env: Arc<Environment<S>>, request: Request) -> HandlerFuture {
        let f = Arc::clone(&self.0);
        // Run inside the future so panics surface where the loop awaits it.
        async move { f(&env, &request).map(Into::into).map_err(Into::into) }.boxed()
    }
}

impl<S: 'static> Handler<S> for Arc<dyn Handler<S>> {
    fn call(&self, env: Arc<Environment<S>>, request: Request) -> HandlerFuture {
        (**self).call(env, request)
    }
}
