//! # Protogate Core
//!
//! `protogate-core` lets an `axum` server expose RPC-style methods whose payloads are
//! Protobuf messages while clients talk plain JSON over HTTP. No gRPC transport is
//! involved: the gateway decodes the JSON body into the handler's request message, calls
//! the handler and renders either the response message or an error envelope.
//!
//! ## Key Components
//!
//! * **[`Gateway`]:** The request/response adapter. It resolves a dispatch key, looks up the
//!   handler, decodes the body, builds the [`CallContext`], invokes the handler and renders
//!   the outcome.
//! * **[`Method`] & [`Handler`]:** A typed RPC endpoint and its type-erased form.
//! * **[`Registry`] & [`HandlerMap`]:** Dispatch key to handler lookup, populated at startup.
//! * **[`KeyResolver`]:** Derives the dispatch key from the inbound request
//!   (see [`PathParams`] and [`UriPath`]).
//! * **[`SchemaCodec`] & [`JsonCodec`]:** JSON <-> Protobuf conversion driven by `prost-reflect`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use protogate_core::{Gateway, HandlerMap, Handler, PathParams};
//!
//! let mut handlers = HandlerMap::new();
//! handlers.register("/user.userservice/login", Handler::new(Login))?;
//!
//! let gateway = Gateway::builder(PathParams::default(), handlers)
//!     .propagate_headers(true)
//!     .build();
//!
//! let app = axum::Router::new().route("/api/{pkg}/{service}/{method}", gateway.into_route());
//! ```
//!
//! ## Error envelope
//!
//! Every failure is rendered as `{"code": <int>, "error_desc": "<CodeName>", "message": "<text>"}`.
//! See [`status`] for how RPC codes map to HTTP statuses.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod codec;
pub mod context;
pub mod gateway;
pub mod handler;
pub mod message;
pub mod registry;
pub mod resolver;
pub mod status;

pub use codec::{CodecError, JsonCodec, SchemaCodec};
pub use context::{CallContext, ContextDecorator};
pub use gateway::{Gateway, GatewayBuilder, GatewayConfig};
pub use handler::{Handler, Method};
pub use message::RpcMessage;
pub use registry::{HandlerMap, RegisterError, Registry, method_key};
pub use resolver::{KeyResolver, PathParams, RouteRequest, UriPath};
pub use status::StatusPolicy;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;
pub use tonic::async_trait;

/// Type alias for the boxed error returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
