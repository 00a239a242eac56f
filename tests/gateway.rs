mod common;

use std::net::Ipv4Addr;
use std::path::PathBuf;

use hellopod::{Api, Backend, Gateway, Ingress, Method, Request, Router, StaticFiles};

/// Answers every request with the path and query it was given.
fn echo() -> Router {
    Router::new().fallback(|req: Request| async move {
        match req.query() {
            Some(q) => format!("{}?{q}", req.path()),
            None => req.path().to_owned(),
        }
    })
}

fn gateway(api: &common::Running, frontend: &common::Running) -> Gateway {
    let ingress = Ingress::standard(
        Backend::new("api", &format!("http://{}", api.addr)).unwrap(),
        Backend::new("frontend", &format!("http://{}", frontend.addr)).unwrap(),
    )
    .unwrap();
    Gateway::new(ingress)
}

fn web_root(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("hellopod-{name}-{}", std::process::id()));
    std::fs::create_dir_all(root.join("css")).unwrap();
    std::fs::write(root.join("index.html"), "<h1 id=\"title\"></h1>").unwrap();
    std::fs::write(root.join("css/style.css"), "body{}").unwrap();
    root
}

#[tokio::test]
async fn api_prefix_is_stripped() {
    let api = common::spawn(echo()).await;
    let frontend = common::spawn(echo()).await;
    let gw = common::spawn(gateway(&api, &frontend)).await;

    let reply = common::get(&gw.url("/api/message")).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.text(), "/message");

    let reply = common::get(&gw.url("/api/message?x=1")).await;
    assert_eq!(reply.text(), "/message?x=1");

    gw.stop().await;
    api.stop().await;
    frontend.stop().await;
}

#[tokio::test]
async fn other_paths_reach_frontend_unmodified() {
    let api = common::spawn(Router::new()).await;
    let frontend = common::spawn(echo()).await;
    let gw = common::spawn(gateway(&api, &frontend)).await;

    assert_eq!(common::get(&gw.url("/anything-else")).await.text(), "/anything-else");
    assert_eq!(common::get(&gw.url("/apix")).await.text(), "/apix");
    assert_eq!(common::get(&gw.url("/")).await.text(), "/");

    gw.stop().await;
    api.stop().await;
    frontend.stop().await;
}

#[tokio::test]
async fn end_to_end_message() {
    let api = common::spawn(Api::new("Hello from Rust!", Ipv4Addr::new(10, 1, 0, 58)).router(None)).await;
    let root = web_root("e2e");
    let frontend = common::spawn(StaticFiles::new(&root).router()).await;
    let gw = common::spawn(gateway(&api, &frontend)).await;

    let reply = common::get(&gw.url("/api/message")).await;
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.json(),
        serde_json::json!({
            "title": "Hello from Rust!",
            "body": "Welcome to Kubernetes pod@'10.1.0.58'.",
        })
    );

    let page = common::get(&gw.url("/")).await;
    assert_eq!(page.status, 200);
    assert_eq!(page.headers["content-type"], "text/html; charset=utf-8");
    assert!(page.text().contains("id=\"title\""));

    let css = common::get(&gw.url("/css/style.css")).await;
    assert_eq!(css.headers["content-type"], "text/css; charset=utf-8");

    assert_eq!(common::get(&gw.url("/missing.js")).await.status, 404);
    assert_eq!(common::get(&gw.url("/api/missing")).await.status, 404);

    gw.stop().await;
    api.stop().await;
    frontend.stop().await;
    let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn head_keeps_upstream_content_length() {
    let api = common::spawn(Api::new("Hello from Rust!", Ipv4Addr::new(10, 1, 0, 58)).router(None)).await;
    let frontend = common::spawn(Router::new()).await;
    let gw = common::spawn(gateway(&api, &frontend)).await;

    let full = common::get(&gw.url("/api/message")).await;
    let head = common::request(Method::HEAD, &gw.url("/api/message")).await;
    assert_eq!(head.status, 200);
    assert!(head.body.is_empty());
    assert_eq!(head.headers["content-length"], full.body.len().to_string().as_str());

    gw.stop().await;
    api.stop().await;
    frontend.stop().await;
}

#[tokio::test]
async fn forwarded_headers_reach_backend() {
    let api = common::spawn(Router::new().fallback(|req: Request| async move {
        req.header("x-forwarded-for").unwrap_or("none").to_owned()
    }))
    .await;
    let frontend = common::spawn(Router::new()).await;
    let gw = common::spawn(gateway(&api, &frontend)).await;

    assert_eq!(common::get(&gw.url("/api/who")).await.text(), "127.0.0.1");

    gw.stop().await;
    api.stop().await;
    frontend.stop().await;
}

#[tokio::test]
async fn unreachable_backend_is_502() {
    // Bind, note the port, then shut down so nothing listens there.
    let api = common::spawn(Router::new()).await;
    let frontend = common::spawn(Router::new()).await;
    let gateway = gateway(&api, &frontend);
    api.stop().await;

    let gw = common::spawn(gateway).await;
    assert_eq!(common::get(&gw.url("/api/message")).await.status, 502);

    gw.stop().await;
    frontend.stop().await;
}

#[tokio::test]
async fn unmatched_path_is_404() {
    let api = common::spawn(echo()).await;
    let ingress = Ingress::new()
        .rule("/api(/|$)(.*)", Some("/$2"), Backend::new("api", &format!("http://{}", api.addr)).unwrap())
        .unwrap();
    let gw = common::spawn(Gateway::new(ingress)).await;

    assert_eq!(common::get(&gw.url("/elsewhere")).await.status, 404);

    gw.stop().await;
    api.stop().await;
}
