//! Ingress routing rules.
//!
//! The cluster's Ingress declares two paths:
//!
//! ```yaml
//! annotations:
//!   nginx.ingress.kubernetes.io/use-regex: "true"
//!   nginx.ingress.kubernetes.io/rewrite-target: /$2
//! paths:
//!   - path: /api(/|$)(.*)    # → api service, port 80
//!   - path: /()(.*)          # → frontend service, port 80
//! ```
//!
//! The rewrite annotation applies to every path of the Ingress, hence the
//! empty first group on the frontend rule: `/$2` reproduces the path as-is.
//!
//! [`Ingress`] evaluates the same rules the way ingress-nginx does: patterns
//! are anchored at the start of the path and case-insensitive, the first
//! matching rule wins, and a rewrite target expands `$n` capture groups.
//! Rules without a rewrite forward the path unmodified.

use http::Uri;
use regex::Regex;

use crate::error::Error;

/// An upstream service.
#[derive(Clone, Debug)]
pub struct Backend {
    name: String,
    upstream: Uri,
}

impl Backend {
    /// `upstream` must carry a scheme and an authority, e.g.
    /// `http://api.default.svc.cluster.local:80`.
    pub fn new(name: impl Into<String>, upstream: &str) -> Result<Self, Error> {
        let uri: Uri = upstream
            .parse()
            .map_err(|_| Error::InvalidUpstream(upstream.to_owned()))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(Error::InvalidUpstream(upstream.to_owned()));
        }
        Ok(Self { name: name.into(), upstream: uri })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn upstream(&self) -> &Uri {
        &self.upstream
    }
}

#[derive(Debug)]
struct Rule {
    source: String,
    pattern: Regex,
    rewrite: Option<String>,
    backend: Backend,
}

/// Where a request goes: which backend, under which path.
#[derive(Debug, PartialEq, Eq)]
pub struct Route<'a> {
    pub backend: &'a str,
    pub path: String,
}

/// An ordered rule set.
#[derive(Debug, Default)]
pub struct Ingress {
    rules: Vec<Rule>,
}

impl Ingress {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two-rule layout of the demo cluster: `/api/…` to `api` with the
    /// prefix stripped, everything else to `frontend` untouched.
    pub fn standard(api: Backend, frontend: Backend) -> Result<Self, Error> {
        Self::new()
            .rule("/api(/|$)(.*)", Some("/$2"), api)?
            .rule("/()(.*)", Some("/$2"), frontend)
    }

    /// Appends a rule. `pattern` uses regex syntax; `rewrite` may reference
    /// capture groups as `$1`, `$2`, ….
    pub fn rule(mut self, pattern: &str, rewrite: Option<&str>, backend: Backend) -> Result<Self, Error> {
        let anchored = format!("(?i)^(?:{pattern})");
        let compiled = Regex::new(&anchored).map_err(|source| Error::InvalidRule {
            pattern: pattern.to_owned(),
            source,
        })?;
        self.rules.push(Rule {
            source: pattern.to_owned(),
            pattern: compiled,
            rewrite: rewrite.map(str::to_owned),
            backend,
        });
        Ok(self)
    }

    pub fn backend(&self, name: &str) -> Option<&Backend> {
        self.rules.iter().map(|r| &r.backend).find(|b| b.name == name)
    }

    /// Routes a request path. `None` when no rule matches.
    pub fn route(&self, path: &str) -> Option<Route<'_>> {
        self.rules.iter().find_map(|rule| {
            let caps = rule.pattern.captures(path)?;
            let path = match &rule.rewrite {
                Some(target) => {
                    let mut out = String::new();
                    caps.expand(target, &mut out);
                    if out.starts_with('/') { out } else { format!("/{out}") }
                }
                None => path.to_owned(),
            };
            tracing::trace!(rule = %rule.source, backend = %rule.backend.name, %path, "ingress match");
            Some(Route { backend: &rule.backend.name, path })
        })
    }

    /// Builds the upstream URI for a routed request, keeping the query.
    pub fn upstream_uri(&self, route: &Route<'_>, query: Option<&str>) -> Option<Uri> {
        let backend = self.backend(route.backend)?;
        let path_and_query = match query {
            Some(q) => format!("{}?{q}", route.path),
            None => route.path.clone(),
        };
        let mut parts = backend.upstream.clone().into_parts();
        parts.path_and_query = Some(path_and_query.parse().ok()?);
        Uri::from_parts(parts).ok()
    }
}
