//! Process configuration from the environment.
//!
//! Variables are read from the process environment, after loading `app.env`
//! if it exists, else `.env`. Every field has a default, so an empty
//! environment is a valid configuration.

use std::net::Ipv4Addr;

use serde::Deserialize;
use tracing::{debug, info};

use crate::address;
use crate::api::DEFAULT_TITLE;
use crate::error::Error;
use crate::ingress::{Backend, Ingress};
use crate::middleware::Cors;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Comma-separated CORS allow-list; `*` allows any origin.
    pub cors_origins: Option<String>,

    #[serde(default = "default_message_title")]
    pub message_title: String,

    /// Address override, typically the Downward API's `status.podIP`.
    pub pod_ip: Option<String>,

    /// Interface to prefer during address discovery.
    pub pod_interface: Option<String>,

    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_api_upstream")]
    pub api_upstream: String,

    #[serde(default = "default_frontend_upstream")]
    pub frontend_upstream: String,
}

impl Config {
    /// Loads `app.env` / `.env`, then deserialises the environment.
    pub fn load() -> Result<Self, Error> {
        let loaded = if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok()
        } else {
            dotenvy::dotenv().ok()
        };
        if let Some(path) = loaded {
            debug!(path = %path.display(), "loaded env file");
        }
        Self::from_env()
    }

    /// Deserialises the current process environment only.
    pub fn from_env() -> Result<Self, Error> {
        Ok(envy::from_env::<Self>()?)
    }

    /// Deserialises from explicit `(KEY, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into()));
        Ok(envy::from_iter::<_, Self>(pairs)?)
    }

    /// `host:port` for [`Server::bind`](crate::Server::bind).
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cors(&self) -> Option<Cors> {
        self.cors_origins.as_deref().and_then(Cors::parse)
    }

    /// The address `/message` reports.
    pub fn pod_address(&self) -> Result<Ipv4Addr, Error> {
        let addr = address::resolve(self.pod_ip.as_deref(), self.pod_interface.as_deref())?;
        info!(%addr, "pod address resolved");
        Ok(addr)
    }

    /// The gateway's rule set over the configured upstreams.
    pub fn ingress(&self) -> Result<Ingress, Error> {
        Ingress::standard(
            Backend::new("api", &self.api_upstream)?,
            Backend::new("frontend", &self.frontend_upstream)?,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            cors_origins: None,
            message_title: default_message_title(),
            pod_ip: None,
            pod_interface: None,
            static_dir: default_static_dir(),
            api_upstream: default_api_upstream(),
            frontend_upstream: default_frontend_upstream(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    80
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_message_title() -> String {
    DEFAULT_TITLE.to_owned()
}

fn default_static_dir() -> String {
    "web".to_owned()
}

fn default_api_upstream() -> String {
    "http://127.0.0.1:8081".to_owned()
}

fn default_frontend_upstream() -> String {
    "http://127.0.0.1:8082".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_is_default() {
        let config = Config::from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server_address(), "0.0.0.0:80");
        assert!(config.cors().is_none());
    }

    #[test]
    fn overrides() {
        let config = Config::from_pairs([
            ("PORT", "8081"),
            ("MESSAGE_TITLE", "Hi"),
            ("POD_IP", "10.1.0.58"),
            ("CORS_ORIGINS", "http://127.0.0.1:8181"),
        ])
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.message_title, "Hi");
        assert_eq!(config.pod_address().unwrap(), Ipv4Addr::new(10, 1, 0, 58));
        assert!(config.cors().is_some());
    }

    #[test]
    fn bad_port_is_config_error() {
        let err = Config::from_pairs([("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn bad_upstream_rejected() {
        let config = Config { api_upstream: "api:80".to_owned(), ..Config::default() };
        assert!(matches!(config.ingress(), Err(Error::InvalidUpstream(_))));
    }
}
