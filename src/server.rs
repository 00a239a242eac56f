//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()`, so no new connections are made.
//! 2. Telling every open connection to finish its current request and close.
//!    Idle keep-alive connections close at once.
//! 3. Waiting up to [`DRAIN_TIMEOUT`] for them, then aborting the rest.
//! 4. Returning from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;

/// How long open connections get to finish once shutdown starts. Below the
/// default `terminationGracePeriodSeconds` of 30 s.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(25);

/// Future returned by [`Service::call`]. Failures are already responses.
pub type ServiceFuture = Pin<Box<dyn Future<Output = http::Response<Full<Bytes>>> + Send + 'static>>;

/// Something that answers hyper requests: a [`Router`](crate::Router) or the
/// [`Gateway`](crate::Gateway).
pub trait Service: Send + Sync + 'static {
    fn call(self: Arc<Self>, req: hyper::Request<Incoming>, peer: SocketAddr) -> ServiceFuture;
}

/// The HTTP server: a bound listener waiting for a [`Service`].
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
}

impl Server {
    /// Binds to `addr` (a `host:port` string). Port `0` picks a free port;
    /// read it back with [`local_addr`](Server::local_addr).
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        let addr: SocketAddr = addr.parse().map_err(|_| Error::InvalidAddr(addr.to_owned()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves until SIGTERM or Ctrl-C, then drains in-flight connections.
    pub async fn serve<S: Service>(self, service: S) -> Result<(), Error> {
        self.serve_with_shutdown(service, shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains in-flight connections.
    pub async fn serve_with_shutdown<S, F>(self, service: S, signal: F) -> Result<(), Error>
    where
        S: Service,
        F: Future<Output = ()> + Send,
    {
        let Self { listener, addr } = self;
        let service = Arc::new(service);

        info!(%addr, "listening");

        // HTTP/1.1 or HTTP/2, whichever the client speaks.
        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting even while
                // more connections are queued.
                biased;

                () = &mut signal => {
                    info!(open = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    // Called once per request on the connection.
                    let service = Arc::clone(&service);
                    let svc = service_fn(move |req| {
                        let service = Arc::clone(&service);
                        async move { Ok::<_, Infallible>(service.call(req, peer).await) }
                    });

                    let conn = builder.serve_connection(TokioIo::new(stream), svc).into_owned();
                    let conn = graceful.watch(conn);
                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            warn!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the JoinSet does not grow without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        tokio::select! {
            () = graceful.shutdown() => {}
            () = tokio::time::sleep(DRAIN_TIMEOUT) => {
                warn!(open = tasks.len(), "drain timed out, aborting connections");
            }
        }
        tasks.shutdown().await;

        info!(%addr, "stopped");
        Ok(())
    }
}

/// Resolves on the first SIGTERM (Kubernetes) or SIGINT (Ctrl-C).
///
/// If a handler cannot be installed that signal is logged and ignored; the
/// other one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
