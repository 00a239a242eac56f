//! The frontend service: static files from one directory.
//!
//! `/` and any path ending in `/` serve that directory's `index.html`.
//! Path segments are percent-decoded before they touch the filesystem, and
//! the result is confined to the root; anything that would climb out of it,
//! or does not exist, is a 404.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use tracing::error;

use crate::health;
use crate::middleware::Trace;
use crate::{ContentType, Request, Response, Router};

const INDEX: &str = "index.html";

/// A directory of static assets.
#[derive(Clone, Debug)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds the frontend router: probes first, every other path a file.
    pub fn router(self) -> Router {
        let files = Arc::new(self);
        Router::new()
            .get("/healthz", health::liveness)
            .get("/readyz", health::readiness)
            .fallback(move |req: Request| {
                let files = Arc::clone(&files);
                async move { files.serve(&req).await }
            })
            .layer(Trace)
    }

    async fn serve(&self, req: &Request) -> Response {
        if !matches!(*req.method(), Method::GET | Method::HEAD) {
            return Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .header("allow", "GET, HEAD")
                .no_body();
        }

        let Some(mut path) = self.resolve(req.path()) else {
            return Response::status(StatusCode::NOT_FOUND);
        };

        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            path.push(INDEX);
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let content_type = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(ContentType::OctetStream, ContentType::from_extension);
                Response::builder().bytes(content_type, bytes)
            }
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                Response::status(StatusCode::NOT_FOUND)
            }
            Err(e) => {
                error!(path = %path.display(), "failed to read static file: {e}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Maps a URL path onto the root, or `None` if it would leave the root.
    fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in url_path.split('/').filter(|s| !s.is_empty()) {
            let segment = percent_decode_str(segment).decode_utf8().ok()?;
            // An encoded separator would smuggle extra components in.
            if segment.contains(['/', '\\', '\0']) {
                return None;
            }
            for component in Path::new(&*segment).components() {
                match component {
                    Component::Normal(part) => path.push(part),
                    Component::CurDir => {}
                    Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
                }
            }
        }
        if url_path.is_empty() || url_path.ends_with('/') {
            path.push(INDEX);
        }
        Some(path)
    }
}
