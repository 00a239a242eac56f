//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. A path
//! that no tree knows goes to the fallback handler (404 unless replaced); a
//! path known under other methods answers `405` with an `allow` header.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use http::{Method, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use matchit::Router as MatchitRouter;
use tracing::warn;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Chain, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::server::{Service, ServiceFuture};

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Every registration method returns `self`, so calls chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: BoxedHandler,
    middleware: Chain,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fallback: not_found.into_boxed_handler(),
            middleware: Arc::new(Vec::new()),
        }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax and catch-alls `{*name}`;
    /// `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are static, so this is a programming
    /// error caught at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    /// Handler for requests no route matches, regardless of method.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = handler.into_boxed_handler();
        self
    }

    /// Wraps every dispatched request, including 404 and 405 answers.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        Arc::make_mut(&mut self.middleware).push(Arc::new(middleware));
        self
    }

    /// Picks the endpoint for a request: matched route, 405, or fallback.
    fn resolve(&self, method: &Method, path: &str) -> (BoxedHandler, HashMap<String, String>) {
        // HEAD is answered by the GET route; hyper omits the body.
        let tree = self.routes.get(method).or_else(|| {
            (*method == Method::HEAD).then(|| self.routes.get(&Method::GET)).flatten()
        });
        if let Some(matched) = tree.and_then(|tree| tree.at(path).ok()) {
            let params = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return (Arc::clone(matched.value), params);
        }

        let allowed = self.allowed_methods(path);
        if allowed.is_empty() {
            (Arc::clone(&self.fallback), HashMap::new())
        } else {
            (method_not_allowed(allowed), HashMap::new())
        }
    }

    fn allowed_methods(&self, path: &str) -> Vec<&str> {
        let mut allowed: Vec<&str> = self
            .routes
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.as_str())
            .collect();
        allowed.sort_unstable();
        allowed
    }

    /// Routes one request and produces one response.
    pub(crate) async fn dispatch(&self, req: Request) -> Response {
        let (endpoint, params) = self.resolve(req.method(), req.path());
        let req = req.with_params(params);
        Next::new(Arc::clone(&self.middleware), endpoint).run(req).await
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl Service for Router {
    fn call(self: Arc<Self>, req: hyper::Request<Incoming>, peer: SocketAddr) -> ServiceFuture {
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    warn!(%peer, "failed to read request body: {e}");
                    return Response::status(StatusCode::BAD_REQUEST).into_inner();
                }
            };
            let req = Request::new(parts, body, HashMap::new(), peer);
            self.dispatch(req).await.into_inner()
        })
    }
}

async fn not_found(_req: Request) -> StatusCode {
    StatusCode::NOT_FOUND
}

fn method_not_allowed(allowed: Vec<&str>) -> BoxedHandler {
    let allow = allowed.join(", ");
    let handler = move |_req: Request| {
        let res = Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header("allow", &allow)
            .no_body();
        async move { res }
    };
    handler.into_boxed_handler()
}
