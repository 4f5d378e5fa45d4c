//! Route registration that remembers what was registered.
//!
//! axum answers a wrong method with a bare 405; to fill in `Allow` the problem
//! layer probes a [`RouteRegistry`] built alongside the router.

use axum::{
    handler::Handler,
    http::Method,
    routing::{on, MethodFilter},
    Router,
};

/// Route table lookup used to compute `Allow`.
pub trait MethodProbe: Send + Sync {
    /// Whether a route for `method` matches the concrete `path`.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

const PROBE_ORDER: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Methods routable for `path`, in a fixed order.
pub fn allowed_methods(probe: &dyn MethodProbe, path: &str) -> Vec<Method> {
    let path = normalize_path(path);
    PROBE_ORDER
        .iter()
        .filter(|m| probe.matches(m, &path))
        .cloned()
        .collect()
}

/// Collapse repeated `/` and drop the trailing one (root stays `/`).
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    CatchAll,
}

#[derive(Clone, Debug)]
struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with("{*") && s.ends_with('}') {
                    Segment::CatchAll
                } else if s.starts_with('{') && s.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_owned())
                }
            })
            .collect();
        Self {
            raw: path.to_owned(),
            segments,
        }
    }

    fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        for seg in &self.segments {
            match seg {
                Segment::CatchAll => return parts.next().is_some(),
                Segment::Param => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if parts.next() != Some(lit.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }
}

/// Registered `(method, path template)` pairs.
#[derive(Clone, Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<(Method, PathTemplate)>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a route. Returns `false` if an equivalent template is already
    /// registered for `method` (parameter names do not matter).
    pub fn register(&mut self, method: Method, path: &str) -> bool {
        let template = PathTemplate::parse(path);
        let taken = self
            .routes
            .iter()
            .any(|(m, t)| *m == method && t.segments == template.segments);
        if taken {
            return false;
        }
        self.routes.push((method, template));
        true
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `(method, template)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &str)> + '_ {
        self.routes.iter().map(|(m, t)| (m, t.raw.as_str()))
    }
}

impl MethodProbe for RouteRegistry {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.routes
            .iter()
            .any(|(m, t)| m == method && t.matches(path))
    }
}

/// `Router` builder that records every route in a [`RouteRegistry`].
pub struct RestRouter<S = ()> {
    router: Router<S>,
    registry: RouteRegistry,
}

impl<S> Default for RestRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RestRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            registry: RouteRegistry::new(),
        }
    }

    /// Register `handler` for `method` on `path`. Duplicate registrations are
    /// logged and skipped rather than handed to axum.
    pub fn route<H, T>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let filter = match MethodFilter::try_from(method.clone()) {
            Ok(filter) => filter,
            Err(e) => {
                tracing::warn!(%method, path, error = %e, "unsupported method, route skipped");
                return self;
            }
        };
        if !self.registry.register(method.clone(), path) {
            tracing::warn!(%method, path, "duplicate route skipped");
            return self;
        }
        tracing::debug!(%method, path, "route registered");
        self.router = self.router.route(path, on(filter, handler));
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn into_parts(self) -> (Router<S>, RouteRegistry) {
        (self.router, self.registry)
    }
}
