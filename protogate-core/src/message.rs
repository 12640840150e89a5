//! # Message capability
//!
//! The gateway never inspects request or response fields. All it needs from a message is
//! its schema, a way to turn it into a [`DynamicMessage`] for encoding, and a way to fill it
//! from a decoded [`DynamicMessage`]. [`RpcMessage`] captures exactly that, and is
//! implemented for every `prost` message that implements [`ReflectMessage`].
use prost::{DecodeError, Message};
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};
use std::any::Any;

/// A Protobuf message the gateway can decode into and encode from.
pub trait RpcMessage: Any + Send + Sync {
    /// The schema of this message.
    fn message_descriptor(&self) -> MessageDescriptor;

    /// Converts the message into its dynamic representation.
    fn to_dynamic(&self) -> DynamicMessage;

    /// Replaces the contents of this message with the contents of `message`.
    ///
    /// `message` must have the same descriptor as `self`.
    fn merge_dynamic(&mut self, message: &DynamicMessage) -> Result<(), DecodeError>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> RpcMessage for T
where
    T: ReflectMessage + Send + Sync + 'static,
{
    fn message_descriptor(&self) -> MessageDescriptor {
        self.descriptor()
    }

    fn to_dynamic(&self) -> DynamicMessage {
        self.transcode_to_dynamic()
    }

    fn merge_dynamic(&mut self, message: &DynamicMessage) -> Result<(), DecodeError> {
        // Going through the wire format keeps this working for both generated
        // messages and `DynamicMessage` itself.
        self.clear();
        self.merge(message.encode_to_vec().as_slice())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
