//! # hellopod
//!
//! The three processes of a small Kubernetes demo, on one minimal HTTP
//! framework:
//!
//! - **api** ([`Api`]): `GET /message` answers
//!   `{"title": "...", "body": "Welcome to Kubernetes pod@'10.1.0.58'."}`,
//!   naming the pod that served the request.
//! - **frontend** ([`StaticFiles`]): serves the page whose script fetches
//!   `/api/message` and renders it.
//! - **gateway** ([`Gateway`]): evaluates the cluster's Ingress rules
//!   (`/api(/|$)(.*)` → api rewritten to `/$2`, everything else → frontend)
//!   and proxies, so the whole system runs without a cluster.
//!
//! TLS, rate limiting and body-size limits belong to the ingress controller
//! in front of these services; none of them is handled here.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::net::Ipv4Addr;
//! use hellopod::{Api, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hellopod::Error> {
//!     let app = Api::new("Hello from Rust!", Ipv4Addr::new(10, 1, 0, 58)).router(None);
//!     Server::bind("0.0.0.0:8081").await?.serve(app).await
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod address;
pub mod api;
pub mod config;
pub mod frontend;
pub mod gateway;
pub mod health;
pub mod ingress;
pub mod message;
pub mod middleware;

pub use api::Api;
pub use config::Config;
pub use error::Error;
pub use frontend::StaticFiles;
pub use gateway::Gateway;
pub use handler::{BoxFuture, Handler};
pub use http::{Method, StatusCode};
pub use ingress::{Backend, Ingress};
pub use message::{Message, Pong};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{Server, Service, ServiceFuture};
