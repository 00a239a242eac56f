//! The gateway: an in-process stand-in for the cluster's Ingress controller.
//!
//! Every request is routed through [`Ingress`], its URI rewritten onto the
//! chosen backend, and forwarded with hyper's pooled client. The `Host`
//! header is passed through unchanged, as ingress-nginx does, and the usual
//! `x-forwarded-*` / `x-real-ip` headers are added.
//!
//! An unreachable backend is a `502`; there is no retry and no timeout.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::uri::Authority;
use http::{Method, StatusCode, Version};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{Instrument, info, info_span, warn};

use crate::ingress::Ingress;
use crate::response::Response;
use crate::server::{Service, ServiceFuture};

/// Headers that describe one connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Reverse proxy driven by an [`Ingress`] rule set.
pub struct Gateway {
    ingress: Ingress,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl Gateway {
    pub fn new(ingress: Ingress) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { ingress, client }
    }

    async fn forward(&self, req: hyper::Request<Incoming>, peer: SocketAddr) -> Response {
        let Some(route) = self.ingress.route(req.uri().path()) else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        let Some(uri) = self.ingress.upstream_uri(&route, req.uri().query()) else {
            warn!(backend = route.backend, path = %route.path, "rewritten uri is invalid");
            return Response::status(StatusCode::BAD_REQUEST);
        };

        let (mut parts, body) = req.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(%peer, "failed to read request body: {e}");
                return Response::status(StatusCode::BAD_REQUEST);
            }
        };

        let head = parts.method == Method::HEAD;
        // HTTP/2 clients carry the host in the URI, not a Host header.
        let authority = parts.uri.authority().cloned();

        strip_hop_by_hop(&mut parts.headers);
        add_forwarded(&mut parts.headers, peer, authority.as_ref());
        parts.uri = uri;
        // Backends speak HTTP/1.1 whatever the client negotiated.
        parts.version = Version::HTTP_11;

        let upstream = hyper::Request::from_parts(parts, Full::new(body));
        let res = match self.client.request(upstream).await {
            Ok(res) => res,
            Err(e) => {
                warn!(backend = route.backend, "upstream request failed: {e}");
                return Response::status(StatusCode::BAD_GATEWAY);
            }
        };

        let (mut parts, body) = res.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(backend = route.backend, "failed to read upstream body: {e}");
                return Response::status(StatusCode::BAD_GATEWAY);
            }
        };
        strip_hop_by_hop(&mut parts.headers);
        // The body was collected; hyper recomputes the length. A HEAD answer
        // has no body, so its length describes the GET and stays.
        if !head {
            parts.headers.remove(header::CONTENT_LENGTH);
        }

        info!(backend = route.backend, upstream_path = %route.path, status = parts.status.as_u16(), "proxied");
        Response::from_parts(parts.status, parts.headers, body)
    }
}

impl Service for Gateway {
    fn call(self: Arc<Self>, req: hyper::Request<Incoming>, peer: SocketAddr) -> ServiceFuture {
        let span = info_span!("ingress", method = %req.method(), path = %req.uri().path(), %peer);
        Box::pin(async move { self.forward(req, peer).await.into_inner() }.instrument(span))
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

fn add_forwarded(headers: &mut HeaderMap, peer: SocketAddr, authority: Option<&Authority>) {
    let ip = peer.ip().to_string();

    let forwarded_for = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing}, {ip}"),
        None => ip.clone(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert(X_FORWARDED_FOR, value);
    }
    if let Ok(value) = HeaderValue::from_str(&ip) {
        headers.insert(X_REAL_IP, value);
    }
    let host = match headers.get(header::HOST) {
        Some(host) => Some(host.clone()),
        None => authority.and_then(|a| HeaderValue::from_str(a.as_str()).ok()),
    };
    if let Some(host) = host {
        headers.insert(X_FORWARDED_HOST, host);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}
