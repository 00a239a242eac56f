#![allow(dead_code)]

use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use hellopod::{Error, Server, Service};

/// A server running on an ephemeral localhost port.
pub struct Running {
    pub addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), Error>>,
}

impl Running {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Signals shutdown and waits for the drain to finish.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        self.handle.await.expect("server task panicked").expect("server error");
    }
}

pub async fn spawn<S: Service>(service: S) -> Running {
    let server = Server::bind("127.0.0.1:0").await.expect("bind");
    let addr = server.local_addr();
    let (stop, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_shutdown(service, async move {
        let _ = rx.await;
    }));
    Running { addr, stop, handle }
}

pub struct Reply {
    pub status: u16,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).expect("utf-8 body")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

pub type HttpClient = Client<HttpConnector, Full<Bytes>>;

/// A pooled client; connections stay open between requests while it lives.
pub fn client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build_http()
}

pub async fn send(client: &HttpClient, method: http::Method, url: &str) -> Reply {
    let req = http::Request::builder()
        .method(method)
        .uri(url)
        .body(Full::new(Bytes::new()))
        .expect("request");
    let res = client.request(req).await.expect("response");
    let (parts, body) = res.into_parts();
    let body = body.collect().await.expect("body").to_bytes();
    Reply { status: parts.status.as_u16(), headers: parts.headers, body }
}

pub async fn request(method: http::Method, url: &str) -> Reply {
    send(&client(), method, url).await
}

pub async fn get(url: &str) -> Reply {
    request(http::Method::GET, url).await
}
