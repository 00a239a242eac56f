//! Unified error type.

use std::fmt;
use std::net::SocketAddr;

/// The error type returned by hellopod's fallible operations.
///
/// Application-level failures (404, 405, 502, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup and infrastructure failures: configuration, binding a port,
/// resolving the pod address, compiling ingress rules.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Bind { addr: SocketAddr, source: std::io::Error },
    InvalidAddr(String),
    Config(envy::Error),
    /// No usable IPv4 address on any network interface.
    NoAddress,
    InvalidRule { pattern: String, source: regex::Error },
    InvalidUpstream(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            Self::InvalidAddr(addr) => write!(f, "invalid address `{addr}`"),
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::NoAddress => f.write_str("no non-loopback IPv4 address found on any interface"),
            Self::InvalidRule { pattern, source } => {
                write!(f, "invalid ingress rule `{pattern}`: {source}")
            }
            Self::InvalidUpstream(uri) => {
                write!(f, "invalid upstream `{uri}`: expected scheme and authority")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) | Self::Bind { source: e, .. } => Some(e),
            Self::Config(e) => Some(e),
            Self::InvalidRule { source, .. } => Some(source),
            Self::InvalidAddr(_) | Self::NoAddress | Self::InvalidUpstream(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<envy::Error> for Error {
    fn from(e: envy::Error) -> Self {
        Self::Config(e)
    }
}
