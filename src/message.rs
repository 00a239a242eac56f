//! Payloads served by the API.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// The `GET /message` payload.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Message {
    pub title: String,
    pub body: String,
}

impl Message {
    /// The greeting naming the pod that served it.
    pub fn greeting(title: &str, pod: Ipv4Addr) -> Self {
        Self {
            title: title.to_owned(),
            body: format!("Welcome to Kubernetes pod@'{pod}'."),
        }
    }
}

/// The `GET /ping` payload: always `{"message":"pong"}`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Pong {
    pub message: String,
}

impl Default for Pong {
    fn default() -> Self {
        Self { message: "pong".to_owned() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_shape() {
        let msg = Message::greeting("Hello from Rust!", Ipv4Addr::new(10, 1, 0, 58));
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"title":"Hello from Rust!","body":"Welcome to Kubernetes pod@'10.1.0.58'."}"#,
        );
    }

    #[test]
    fn pong_shape() {
        assert_eq!(serde_json::to_string(&Pong::default()).unwrap(), r#"{"message":"pong"}"#);
    }
}
