//! # Invocation Context
//!
//! [`CallContext`] is what a handler receives alongside its request. It substitutes for the
//! context a real gRPC transport would provide:
//!
//! * the dispatch key the request was routed with,
//! * the inbound metadata (HTTP headers), when header propagation is enabled,
//! * typed extensions attached by [`ContextDecorator`]s,
//! * the `tracing` span the invocation runs in.
//!
//! Cancellation is not represented explicitly: when the client goes away the server drops
//! the request future, and the handler future with it.
use http::{Extensions, HeaderMap};
use tonic::metadata::MetadataMap;
use tracing::Span;

/// Per-request context handed to a [`crate::Method`].
#[derive(Debug, Clone)]
pub struct CallContext {
    key: String,
    metadata: Option<MetadataMap>,
    extensions: Extensions,
    span: Span,
}

impl CallContext {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            metadata: None,
            extensions: Extensions::new(),
            span: Span::none(),
        }
    }

    /// Attaches every header (all names, all values, in order) as inbound metadata.
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        self.metadata = Some(MetadataMap::from_headers(headers.clone()));
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataMap) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attaches a typed value, replacing any previous value of the same type.
    pub fn with_extension<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value);
        self
    }

    /// Replaces the span the invocation will run in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The dispatch key this request was routed with.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Inbound metadata, present only when header propagation is enabled.
    pub fn metadata(&self) -> Option<&MetadataMap> {
        self.metadata.as_ref()
    }

    pub fn extension<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions.get::<T>()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Decorates the [`CallContext`] before the handler is invoked (e.g. to attach a logger
/// field or a tracing span).
///
/// Decorators run in registration order, each one receiving the context returned by the
/// previous one.
pub trait ContextDecorator: Send + Sync + 'static {
    fn apply(&self, ctx: CallContext) -> CallContext;
}

impl<F> ContextDecorator for F
where
    F: Fn(CallContext) -> CallContext + Send + Sync + 'static,
{
    fn apply(&self, ctx: CallContext) -> CallContext {
        self(ctx)
    }
}

/// Builds the context of every invocation: header propagation first, then decorators.
pub(crate) struct Propagator {
    propagate_headers: bool,
    decorators: Vec<Box<dyn ContextDecorator>>,
}

impl Propagator {
    pub(crate) fn new(propagate_headers: bool, decorators: Vec<Box<dyn ContextDecorator>>) -> Self {
        Self {
            propagate_headers,
            decorators,
        }
    }

    pub(crate) fn build(&self, ctx: CallContext, headers: &HeaderMap) -> CallContext {
        let ctx = if self.propagate_headers {
            ctx.with_headers(headers)
        } else {
            ctx
        };

        self.decorators
            .iter()
            .fold(ctx, |ctx, decorator| decorator.apply(ctx))
    }
}
