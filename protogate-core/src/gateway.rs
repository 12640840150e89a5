//! # Gateway
//!
//! The [`Gateway`] is the request/response adapter. Each request goes through the same
//! pipeline:
//!
//! 1. **Resolve**: the [`KeyResolver`] derives the dispatch key from the request.
//! 2. **Read**: the whole body is buffered (bounded by [`GatewayConfig::body_limit`]).
//! 3. **Lookup**: the [`Registry`] provides the [`crate::Handler`] for the key.
//! 4. **Decode**: the body is decoded into a fresh request instance by the [`SchemaCodec`].
//! 5. **Invoke**: the [`CallContext`] is built (metadata, decorators) and the handler called.
//! 6. **Render**: the response message is encoded as a `200` JSON body, or the failure is
//!    rendered as an error envelope (see [`crate::status`]).
//!
//! | Failure                 | Code               | HTTP (default policy) | Message            |
//! |-------------------------|--------------------|-----------------------|--------------------|
//! | Body cannot be read     | `INTERNAL`         | 500                   | the I/O error      |
//! | No handler for the key  | `INVALID_ARGUMENT` | 400                   | `unknown request`  |
//! | Body does not decode    | `INVALID_ARGUMENT` | 400                   | `bad json`         |
//! | Handler error           | classified         | 500 if `INTERNAL`, else 400 | handler message |
use crate::{
    codec::{CodecError, JsonCodec, SchemaCodec},
    context::{CallContext, ContextDecorator, Propagator},
    registry::Registry,
    resolver::{KeyResolver, RouteRequest},
    status::{self, StatusPolicy},
};
use axum::{
    body::Body,
    extract::{RawPathParams, Request, rejection::RawPathParamsRejection},
    response::{IntoResponse, Response},
    routing::{MethodRouter, post},
};
use http::{HeaderValue, header::CONTENT_TYPE};
use serde::Deserialize;
use std::sync::Arc;
use tonic::{Code, Status};
use tracing::{Instrument, Span, debug, error, info_span, warn};

/// Default maximum body size, matching the default gRPC maximum message size.
pub const DEFAULT_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// Runtime options of a [`Gateway`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Copy every inbound HTTP header into the metadata of the [`CallContext`].
    pub propagate_headers: bool,
    /// Maximum accepted body size, in bytes.
    pub body_limit: usize,
    /// How RPC codes are translated into HTTP statuses.
    pub status_policy: StatusPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            propagate_headers: false,
            body_limit: DEFAULT_BODY_LIMIT,
            status_policy: StatusPolicy::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum GatewayError {
    #[error("Failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),
    #[error("No handler registered for the dispatch key")]
    UnknownRequest,
    #[error("Failed to decode request body: {0}")]
    BadJson(#[source] CodecError),
    #[error("Handler failed: {0}")]
    Handler(#[source] Status),
    #[error("Failed to encode response: {0}")]
    Encode(#[source] CodecError),
}

impl GatewayError {
    fn into_status(self) -> Status {
        match self {
            GatewayError::BodyRead(err) => Status::internal(err.to_string()),
            GatewayError::UnknownRequest => Status::invalid_argument("unknown request"),
            GatewayError::BadJson(_) => Status::invalid_argument("bad json"),
            GatewayError::Handler(status) => status,
            GatewayError::Encode(err) => Status::internal(err.to_string()),
        }
    }
}

/// Serves registered handlers as JSON over HTTP.
///
/// A gateway is immutable once built and can be shared by every request of a server.
pub struct Gateway {
    resolver: Box<dyn KeyResolver>,
    registry: Box<dyn Registry>,
    codec: Box<dyn SchemaCodec>,
    propagator: Propagator,
    config: GatewayConfig,
}

impl Gateway {
    /// Starts building a gateway from its two mandatory collaborators.
    pub fn builder(resolver: impl KeyResolver, registry: impl Registry) -> GatewayBuilder {
        GatewayBuilder {
            resolver: Box::new(resolver),
            registry: Box::new(registry),
            codec: Box::new(JsonCodec::new()),
            decorators: Vec::new(),
            config: GatewayConfig::default(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Turns the gateway into an `axum` route accepting `POST` requests.
    ///
    /// Path parameters captured by the route are made available to the [`KeyResolver`].
    pub fn into_route<S>(self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Arc::new(self).route()
    }

    /// Same as [`Gateway::into_route`], for a gateway that is already shared.
    pub fn route<S>(self: Arc<Self>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        post(
            move |params: Result<RawPathParams, RawPathParamsRejection>, request: Request| {
                let gateway = Arc::clone(&self);
                async move { gateway.serve(params, request).await }
            },
        )
    }

    async fn serve(
        &self,
        params: Result<RawPathParams, RawPathParamsRejection>,
        request: Request,
    ) -> Response {
        // Routes without captures have no path parameters at all.
        let path_params = params
            .map(|params| {
                params
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let (parts, body) = request.into_parts();
        let route = RouteRequest::new(parts.method, parts.uri, parts.headers)
            .with_path_params(path_params);

        self.handle(route, body).await
    }

    /// Handles one request, independently of the router it comes from.
    pub async fn handle(&self, request: RouteRequest, body: Body) -> Response {
        let key = self.resolver.resolve(&request);
        let span = info_span!("rpc", key = %key);

        async move {
            match self.dispatch(key, &request, body).await {
                Ok(body) => (
                    [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                    body,
                )
                    .into_response(),
                Err(err) => self.render_error(err),
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        key: String,
        request: &RouteRequest,
        body: Body,
    ) -> Result<Vec<u8>, GatewayError> {
        let bytes = axum::body::to_bytes(body, self.config.body_limit)
            .await
            .map_err(GatewayError::BodyRead)?;

        let handler = self
            .registry
            .lookup(&key)
            .ok_or(GatewayError::UnknownRequest)?;

        let mut prototype = handler.new_request();
        self.codec
            .decode(&bytes, &mut *prototype)
            .map_err(GatewayError::BadJson)?;

        // From here on the request goes back to the handler on every exit path.
        let lease = handler.lease(prototype);

        let ctx = CallContext::new(key).with_span(Span::current());
        let ctx = self.propagator.build(ctx, &request.headers);
        let span = ctx.span().clone();

        debug!(
            request = handler.request_descriptor().full_name(),
            "invoking handler"
        );
        let response = handler
            .call(ctx, lease.request())
            .instrument(span)
            .await
            .map_err(GatewayError::Handler)?;

        self.codec
            .encode(&*response)
            .map_err(GatewayError::Encode)
    }

    fn render_error(&self, err: GatewayError) -> Response {
        match &err {
            GatewayError::UnknownRequest => warn!("{err}"),
            GatewayError::BodyRead(_) | GatewayError::Encode(_) => error!("{err}"),
            GatewayError::Handler(status) if status.code() == Code::Internal => error!("{err}"),
            GatewayError::BadJson(_) | GatewayError::Handler(_) => debug!("{err}"),
        }

        let status = err.into_status();
        status::render(self.config.status_policy, &status)
    }
}

/// Builder for [`Gateway`], see [`Gateway::builder`].
pub struct GatewayBuilder {
    resolver: Box<dyn KeyResolver>,
    registry: Box<dyn Registry>,
    codec: Box<dyn SchemaCodec>,
    decorators: Vec<Box<dyn ContextDecorator>>,
    config: GatewayConfig,
}

impl GatewayBuilder {
    /// Replaces every runtime option at once.
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn propagate_headers(mut self, yes: bool) -> Self {
        self.config.propagate_headers = yes;
        self
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.config.body_limit = limit;
        self
    }

    pub fn status_policy(mut self, policy: StatusPolicy) -> Self {
        self.config.status_policy = policy;
        self
    }

    /// Replaces the default [`JsonCodec`].
    pub fn codec(mut self, codec: impl SchemaCodec) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Appends a context decorator. Decorators run in the order they are added.
    pub fn decorator(mut self, decorator: impl ContextDecorator) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    pub fn build(self) -> Gateway {
        Gateway {
            resolver: self.resolver,
            registry: self.registry,
            codec: self.codec,
            propagator: Propagator::new(self.config.propagate_headers, self.decorators),
            config: self.config,
        }
    }
}
