use http::{Method, StatusCode};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

const ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";

/// Cross-origin allow-list.
///
/// The frontend page and the API are separate origins whenever they are not
/// served through the same ingress host, so the API must answer the browser's
/// CORS checks.
#[derive(Clone, Debug)]
pub struct Cors {
    origins: Origins,
}

#[derive(Clone, Debug)]
enum Origins {
    Any,
    List(Vec<String>),
}

impl Cors {
    /// Allows every origin (`access-control-allow-origin: *`).
    pub fn any() -> Self {
        Self { origins: Origins::Any }
    }

    /// Allows exactly the given origins, compared case-insensitively.
    pub fn origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { origins: Origins::List(origins.into_iter().map(Into::into).collect()) }
    }

    /// Parses a comma-separated allow-list, as found in `CORS_ORIGINS`.
    /// `*` anywhere in the list allows every origin. Blank input yields `None`.
    pub fn parse(list: &str) -> Option<Self> {
        let entries: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if entries.is_empty() {
            None
        } else if entries.contains(&"*") {
            Some(Self::any())
        } else {
            Some(Self::origins(entries))
        }
    }

    /// The `access-control-allow-origin` value for `origin`, if it is allowed.
    fn allow_origin<'a>(&self, origin: &'a str) -> Option<&'a str> {
        match &self.origins {
            Origins::Any => Some("*"),
            Origins::List(list) => list
                .iter()
                .any(|o| o.eq_ignore_ascii_case(origin))
                .then_some(origin),
        }
    }
}

impl Middleware for Cors {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let allowed = req
            .header("origin")
            .and_then(|origin| self.allow_origin(origin))
            .map(str::to_owned);

        let Some(allowed) = allowed else {
            return next.run(req);
        };

        let preflight = *req.method() == Method::OPTIONS
            && req.header("access-control-request-method").is_some();

        if preflight {
            let request_headers = req
                .header("access-control-request-headers")
                .unwrap_or("content-type")
                .to_owned();
            let mut builder = Response::builder()
                .status(StatusCode::NO_CONTENT)
                .header("access-control-allow-origin", &allowed)
                .header("access-control-allow-methods", ALLOW_METHODS)
                .header("access-control-allow-headers", &request_headers)
                .header("access-control-max-age", "600");
            if allowed != "*" {
                builder = builder.header("vary", "origin");
            }
            let res = builder.no_body();
            return Box::pin(async move { res });
        }

        let fut = next.run(req);
        Box::pin(async move {
            let mut res = fut.await;
            if let Ok(value) = allowed.parse() {
                res.headers_mut().insert("access-control-allow-origin", value);
            }
            if allowed != "*" {
                res.headers_mut().append("vary", http::HeaderValue::from_static("origin"));
            }
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list() {
        let cors = Cors::parse(" http://a.test , http://b.test ").expect("non-empty");
        assert_eq!(cors.allow_origin("http://a.test"), Some("http://a.test"));
        assert_eq!(cors.allow_origin("HTTP://B.TEST"), Some("HTTP://B.TEST"));
        assert_eq!(cors.allow_origin("http://c.test"), None);
    }

    #[test]
    fn parse_wildcard_and_blank() {
        let cors = Cors::parse("http://a.test,*").expect("non-empty");
        assert_eq!(cors.allow_origin("http://anything"), Some("*"));
        assert!(Cors::parse(" , ").is_none());
    }
}
