//! # Handlers
//!
//! A [`Method`] is one typed RPC endpoint: it declares its request and response message
//! types, how to obtain a fresh request instance, the business logic itself, and an
//! optional hook that gets the request instance back once the call is over (for pooling).
//!
//! The gateway does not know about concrete message types, so methods are registered as
//! [`Handler`]s, which erase the types behind [`RpcMessage`] trait objects.
//!
//! ## Example
//!
//! ```rust,ignore
//! use protogate_core::{BoxError, CallContext, Method, async_trait, tonic::Status};
//!
//! struct Login;
//!
//! #[async_trait]
//! impl Method for Login {
//!     type Request = LoginReq;
//!     type Response = LoginResp;
//!
//!     async fn call(&self, _ctx: CallContext, req: &LoginReq) -> Result<LoginResp, BoxError> {
//!         if req.password.is_empty() {
//!             return Err(Status::invalid_argument("missing password").into());
//!         }
//!         Ok(LoginResp::default())
//!     }
//! }
//! ```
use crate::{BoxError, context::CallContext, message::RpcMessage};
use prost_reflect::MessageDescriptor;
use std::{fmt, future::Future, mem::ManuallyDrop, pin::Pin, sync::Arc};
use tonic::Status;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A typed RPC endpoint.
///
/// Errors returned by [`Method::call`] are classified with [`Status::from_error`]: a
/// [`Status`] (anywhere in the error chain) is used as is, any other error becomes
/// `UNKNOWN` with the error's message.
#[tonic::async_trait]
pub trait Method: Send + Sync + 'static {
    type Request: RpcMessage + Default;
    type Response: RpcMessage;

    /// Produces the empty instance the request body is decoded into.
    fn new_request(&self) -> Self::Request {
        Self::Request::default()
    }

    async fn call(
        &self,
        ctx: CallContext,
        request: &Self::Request,
    ) -> Result<Self::Response, BoxError>;

    /// Receives the decoded request once the call is over, whatever its outcome.
    ///
    /// Only called for requests that were successfully decoded.
    fn release_request(&self, request: Self::Request) {
        drop(request);
    }
}

trait ErasedMethod: Send + Sync {
    fn new_request(&self) -> Box<dyn RpcMessage>;

    fn call<'a>(
        &'a self,
        ctx: CallContext,
        request: &'a dyn RpcMessage,
    ) -> BoxFuture<'a, Result<Box<dyn RpcMessage>, Status>>;

    fn release(&self, request: Box<dyn RpcMessage>);
}

struct Erased<M>(M);

impl<M: Method> ErasedMethod for Erased<M> {
    fn new_request(&self) -> Box<dyn RpcMessage> {
        Box::new(self.0.new_request())
    }

    fn call<'a>(
        &'a self,
        ctx: CallContext,
        request: &'a dyn RpcMessage,
    ) -> BoxFuture<'a, Result<Box<dyn RpcMessage>, Status>> {
        Box::pin(async move {
            let request = request
                .as_any()
                .downcast_ref::<M::Request>()
                .ok_or_else(|| Status::internal("bad proto"))?;

            let response = self
                .0
                .call(ctx, request)
                .await
                .map_err(Status::from_error)?;

            Ok(Box::new(response) as Box<dyn RpcMessage>)
        })
    }

    fn release(&self, request: Box<dyn RpcMessage>) {
        if let Ok(request) = request.into_any().downcast::<M::Request>() {
            self.0.release_request(*request);
        }
    }
}

/// A type-erased [`Method`], ready to be stored in a [`crate::Registry`].
///
/// Handlers are immutable and cheap to clone; the same handler serves every concurrent
/// request routed to it.
#[derive(Clone)]
pub struct Handler {
    method: Arc<dyn ErasedMethod>,
    request_descriptor: MessageDescriptor,
}

impl Handler {
    pub fn new<M: Method>(method: M) -> Self {
        let request_descriptor = M::Request::default().message_descriptor();

        Self {
            method: Arc::new(Erased(method)),
            request_descriptor,
        }
    }

    /// The schema of the request message this handler expects.
    pub fn request_descriptor(&self) -> &MessageDescriptor {
        &self.request_descriptor
    }

    pub(crate) fn new_request(&self) -> Box<dyn RpcMessage> {
        self.method.new_request()
    }

    pub(crate) fn call<'a>(
        &'a self,
        ctx: CallContext,
        request: &'a dyn RpcMessage,
    ) -> impl Future<Output = Result<Box<dyn RpcMessage>, Status>> + Send + 'a {
        self.method.call(ctx, request)
    }

    /// Hands `request` back to the method when the returned lease is dropped.
    pub(crate) fn lease(&self, request: Box<dyn RpcMessage>) -> Lease<'_> {
        Lease {
            handler: self,
            request: ManuallyDrop::new(request),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("request", &self.request_descriptor.full_name())
            .finish_non_exhaustive()
    }
}

/// A decoded request on loan from its handler.
///
/// Releasing on drop covers every exit path after decoding, including cancellation of the
/// request future.
pub(crate) struct Lease<'h> {
    handler: &'h Handler,
    request: ManuallyDrop<Box<dyn RpcMessage>>,
}

impl Lease<'_> {
    pub(crate) fn request(&self) -> &dyn RpcMessage {
        &**self.request
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        // SAFETY: `request` is never touched again after this point.
        let request = unsafe { ManuallyDrop::take(&mut self.request) };
        self.handler.method.release(request);
    }
}
