//! Kubernetes probe handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from the Service. |
//!
//! Both services resolve everything they need before binding, so once the
//! listener accepts connections the pod is ready.

use serde::{Deserialize, Serialize};

use crate::{Json, Request};

/// Body of both probe responses.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: String,
    pub message: String,
}

impl Health {
    fn ok(message: &str) -> Self {
        Self { status: "ok".to_owned(), message: message.to_owned() }
    }
}

/// `200 {"status":"ok","message":"alive"}`.
pub async fn liveness(_req: Request) -> Json<Health> {
    Json(Health::ok("alive"))
}

/// `200 {"status":"ok","message":"ready"}`.
pub async fn readiness(_req: Request) -> Json<Health> {
    Json(Health::ok("ready"))
}
