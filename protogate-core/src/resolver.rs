//! # Dispatch Key Resolution
//!
//! The gateway does not impose any route syntax. A [`KeyResolver`] turns the inbound
//! request into the dispatch key that is looked up in the [`crate::Registry`]. Resolution
//! never fails: a key that does not match anything is reported by the registry lookup as
//! an unknown request.
use http::{HeaderMap, Method, Uri};

/// The routing-relevant parts of an inbound HTTP request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Path parameters captured by the router, in route order.
    pub path_params: Vec<(String, String)>,
}

impl RouteRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
            path_params: Vec::new(),
        }
    }

    pub fn with_path_params(mut self, path_params: Vec<(String, String)>) -> Self {
        self.path_params = path_params;
        self
    }

    /// Returns the value of the path parameter `name`, if the route captured it.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }
}

/// Derives the dispatch key of a request.
pub trait KeyResolver: Send + Sync + 'static {
    fn resolve(&self, request: &RouteRequest) -> String;
}

impl<F> KeyResolver for F
where
    F: Fn(&RouteRequest) -> String + Send + Sync + 'static,
{
    fn resolve(&self, request: &RouteRequest) -> String {
        self(request)
    }
}

/// Builds `/{package}.{service}/{method}` out of three path parameters.
///
/// With the default parameter names, mount the gateway on a route such as
/// `/api/{pkg}/{service}/{method}`. Missing parameters are rendered as empty segments.
#[derive(Debug, Clone)]
pub struct PathParams {
    package: String,
    service: String,
    method: String,
}

impl Default for PathParams {
    fn default() -> Self {
        Self::new("pkg", "service", "method")
    }
}

impl PathParams {
    pub fn new(
        package: impl Into<String>,
        service: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            service: service.into(),
            method: method.into(),
        }
    }
}

impl KeyResolver for PathParams {
    fn resolve(&self, request: &RouteRequest) -> String {
        let param = |name: &str| request.param(name).unwrap_or_default();

        format!(
            "/{}.{}/{}",
            param(&self.package),
            param(&self.service),
            param(&self.method)
        )
    }
}

/// Uses the request path itself as the key, after stripping an optional mount prefix.
///
/// Mounted on `/rpc/{*path}` with prefix `/rpc`, a request to
/// `/rpc/userservice.UserService/Login` resolves to `/userservice.UserService/Login`.
#[derive(Debug, Clone, Default)]
pub struct UriPath {
    prefix: Option<String>,
}

impl UriPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        Self {
            prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }
}

impl KeyResolver for UriPath {
    fn resolve(&self, request: &RouteRequest) -> String {
        let path = request.path();
        let path = self
            .prefix
            .as_deref()
            .and_then(|prefix| path.strip_prefix(prefix))
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(path);

        format!("/{}", path.trim_start_matches('/'))
    }
}
