//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request with its body already collected.
pub struct Request {
    parts: Parts,
    body: Bytes,
    params: HashMap<String, String>,
    peer: SocketAddr,
}

impl Request {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        params: HashMap<String, String>,
        peer: SocketAddr,
    ) -> Self {
        Self { parts, body, params, peer }
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn query(&self) -> Option<&str> { self.parts.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Address of the connected client (the proxy, when behind one).
    pub fn peer(&self) -> SocketAddr { self.peer }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/files/{name}`, `req.param("name")` on `/files/app.js`
    /// returns `Some("app.js")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[cfg(test)]
impl Request {
    /// Builds a request without a connection, for handler unit tests.
    pub(crate) fn test(method: Method, uri: &str) -> Self {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .expect("valid test request")
            .into_parts();
        Self::new(parts, Bytes::new(), HashMap::new(), SocketAddr::from(([127, 0, 0, 1], 40000)))
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.parts.headers.insert(name, http::HeaderValue::from_static(value));
        self
    }
}
