//! The API service.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /message` | `{"title": …, "body": "Welcome to Kubernetes pod@'<ip>'."}` |
//! | `GET /ping` | `{"message": "pong"}` |
//! | `GET /healthz`, `GET /readyz` | probe bodies, see [`health`](crate::health) |
//!
//! The pod address is resolved before the router is built, so `/message`
//! has no failure path.

use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::health;
use crate::message::{Message, Pong};
use crate::middleware::{Cors, Trace};
use crate::{Json, Request, Router};

/// Title used when none is configured.
pub const DEFAULT_TITLE: &str = "Hello from Rust!";

/// State shared by the API handlers.
#[derive(Clone, Debug)]
pub struct Api {
    title: String,
    pod: Ipv4Addr,
}

impl Api {
    pub fn new(title: impl Into<String>, pod: Ipv4Addr) -> Self {
        Self { title: title.into(), pod }
    }

    pub fn pod(&self) -> Ipv4Addr {
        self.pod
    }

    pub fn message(&self) -> Message {
        Message::greeting(&self.title, self.pod)
    }

    /// Builds the API router, with CORS when an allow-list is given.
    pub fn router(self, cors: Option<Cors>) -> Router {
        let api = Arc::new(self);

        let mut router = Router::new()
            .get("/message", move |_req: Request| {
                let api = Arc::clone(&api);
                async move { Json(api.message()) }
            })
            .get("/ping", ping)
            .get("/healthz", health::liveness)
            .get("/readyz", health::readiness)
            .layer(Trace);

        if let Some(cors) = cors {
            router = router.layer(cors);
        }
        router
    }
}

async fn ping(_req: Request) -> Json<Pong> {
    Json(Pong::default())
}
