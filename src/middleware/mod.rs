//! Middleware layer.
//!
//! Middleware wraps every request a [`Router`](crate::Router) dispatches,
//! including the ones that end in 404 or 405. Each layer receives the request
//! and a [`Next`] continuation; it may answer on its own or call
//! [`Next::run`] and adjust the response on the way out.
//!
//! Layers run in registration order: the first `layer()` call is outermost.
//!
//! Built-in middleware:
//! - [`Trace`] — per-request span with method, path, status, latency
//! - [`Cors`] — origin allow-list and preflight answers

mod cors;
mod trace;

use std::sync::Arc;

pub use cors::Cors;
pub use trace::Trace;

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;

/// A request/response interceptor.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type Chain = Arc<Vec<Arc<dyn Middleware>>>;

/// The rest of the chain: the remaining layers, then the endpoint handler.
pub struct Next {
    chain: Chain,
    index: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(chain: Chain, endpoint: BoxedHandler) -> Self {
        Self { chain, index: 0, endpoint }
    }

    /// Passes the request to the next layer, or to the endpoint once the
    /// chain is exhausted.
    pub fn run(mut self, req: Request) -> BoxFuture {
        match self.chain.get(self.index).cloned() {
            Some(layer) => {
                self.index += 1;
                layer.handle(req, self)
            }
            None => self.endpoint.call(req),
        }
    }
}
