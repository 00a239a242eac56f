mod common;

use std::net::Ipv4Addr;
use std::time::Duration;

use hellopod::{Api, Method, Message};
use hellopod::middleware::Cors;

fn api() -> Api {
    Api::new("Hello from Rust!", Ipv4Addr::new(10, 1, 0, 58))
}

/// The body's pod address, if it is a dotted quad between the quotes.
fn pod_address(body: &str) -> Option<Ipv4Addr> {
    let start = body.find("pod@'")? + "pod@'".len();
    let end = start + body[start..].find('\'')?;
    body[start..end].parse().ok()
}

#[tokio::test]
async fn message_returns_title_and_body() {
    let server = common::spawn(api().router(None)).await;

    let reply = common::get(&server.url("/message")).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.headers["content-type"], "application/json");

    let msg: Message = serde_json::from_slice(&reply.body).unwrap();
    assert!(!msg.title.is_empty());
    assert!(!msg.body.is_empty());
    assert_eq!(pod_address(&msg.body), Some(Ipv4Addr::new(10, 1, 0, 58)));
    assert_eq!(
        reply.text(),
        r#"{"title":"Hello from Rust!","body":"Welcome to Kubernetes pod@'10.1.0.58'."}"#
    );

    server.stop().await;
}

#[tokio::test]
async fn message_is_stable_across_requests() {
    let server = common::spawn(api().router(None)).await;

    let first = common::get(&server.url("/message")).await;
    let second = common::get(&server.url("/message")).await;
    assert_eq!(first.body, second.body);

    server.stop().await;
}

#[tokio::test]
async fn ping_pongs() {
    let server = common::spawn(api().router(None)).await;

    let reply = common::get(&server.url("/ping")).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json(), serde_json::json!({ "message": "pong" }));

    server.stop().await;
}

#[tokio::test]
async fn undefined_paths_are_404() {
    let server = common::spawn(api().router(None)).await;

    for path in ["/", "/api/message", "/messages", "/message/extra"] {
        assert_eq!(common::get(&server.url(path)).await.status, 404, "{path}");
    }

    server.stop().await;
}

#[tokio::test]
async fn wrong_method_is_405() {
    let server = common::spawn(api().router(None)).await;

    let reply = common::request(Method::POST, &server.url("/message")).await;
    assert_eq!(reply.status, 405);
    assert_eq!(reply.headers["allow"], "GET");

    server.stop().await;
}

#[tokio::test]
async fn probes() {
    let server = common::spawn(api().router(None)).await;

    assert_eq!(
        common::get(&server.url("/healthz")).await.json(),
        serde_json::json!({ "status": "ok", "message": "alive" })
    );
    assert_eq!(
        common::get(&server.url("/readyz")).await.json(),
        serde_json::json!({ "status": "ok", "message": "ready" })
    );

    server.stop().await;
}

#[tokio::test]
async fn wildcard_cors() {
    let server = common::spawn(api().router(Some(Cors::any()))).await;

    // Without an Origin header there is nothing to answer.
    let reply = common::get(&server.url("/message")).await;
    assert!(!reply.headers.contains_key("access-control-allow-origin"));

    server.stop().await;
}

#[tokio::test]
async fn discovered_address_is_dotted_quad() {
    // Hosts without a non-loopback IPv4 interface have nothing to discover.
    let Ok(addr) = hellopod::address::discover(None) else {
        return;
    };
    let msg = Api::new("t", addr).message();
    assert_eq!(pod_address(&msg.body), Some(addr));
    assert!(!addr.is_loopback());
}

#[tokio::test]
async fn stop_closes_idle_keep_alive_connections() {
    let server = common::spawn(api().router(None)).await;

    // The client outlives the request, so its pooled connection sits idle.
    let client = common::client();
    let reply = common::send(&client, Method::GET, &server.url("/message")).await;
    assert_eq!(reply.status, 200);

    let stopped = tokio::time::timeout(Duration::from_secs(5), server.stop()).await;
    assert!(stopped.is_ok(), "shutdown waited on an idle connection");
    drop(client);
}
