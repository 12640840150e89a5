//! # JSON <-> Protobuf Codec
//!
//! This module defines the [`SchemaCodec`] seam used by the gateway to turn request bodies
//! into messages and messages into response bodies, together with the default
//! implementation, [`JsonCodec`].
//!
//! ## How it works
//!
//! 1. **Decoding (JSON -> Proto)**:
//!    - Reads the raw body bytes with `serde_json`.
//!    - Uses `prost_reflect::DynamicMessage` to validate the JSON against the prototype's
//!      `MessageDescriptor`.
//!    - Merges the dynamic message into the prototype instance.
//!
//! 2. **Encoding (Proto -> JSON)**:
//!    - Transcodes the response into a `DynamicMessage`.
//!    - Serializes it following the Protobuf JSON mapping, skipping default values.
use crate::message::RpcMessage;
use prost_reflect::{DeserializeOptions, DynamicMessage, ReflectMessage, SerializeOptions};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON structure does not match message '{message}': {source}")]
    InvalidJson {
        message: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to merge decoded value into message '{message}': {source}")]
    Merge {
        message: String,
        #[source]
        source: prost::DecodeError,
    },
    #[error("Failed to map message '{message}' to JSON: {source}")]
    Serialize {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Converts between JSON byte buffers and message instances.
pub trait SchemaCodec: Send + Sync + 'static {
    /// Decodes `bytes` into the (freshly created) `prototype`.
    fn decode(&self, bytes: &[u8], prototype: &mut dyn RpcMessage) -> Result<(), CodecError>;

    /// Encodes `message` into a JSON byte buffer.
    fn encode(&self, message: &dyn RpcMessage) -> Result<Vec<u8>, CodecError>;
}

/// The default codec, following the Protobuf JSON mapping as implemented by `prost-reflect`.
///
/// Defaults:
/// * Output uses the proto field names (`user_info`, not `userInfo`).
/// * Fields holding their default value are omitted from the output.
/// * Unknown fields in the input are rejected.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    serialize: SerializeOptions,
    deserialize: DeserializeOptions,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonCodec {
    pub fn new() -> Self {
        Self {
            serialize: SerializeOptions::new()
                .use_proto_field_name(true)
                .skip_default_fields(true),
            deserialize: DeserializeOptions::new().deny_unknown_fields(true),
        }
    }

    /// Whether to emit proto field names (`true`) or lowerCamelCase JSON names (`false`).
    pub fn use_proto_field_names(mut self, yes: bool) -> Self {
        self.serialize = self.serialize.use_proto_field_name(yes);
        self
    }

    /// Whether fields holding their default value are emitted.
    pub fn emit_default_fields(mut self, yes: bool) -> Self {
        self.serialize = self.serialize.skip_default_fields(!yes);
        self
    }

    /// Whether enums are emitted as numbers instead of names.
    pub fn use_enum_numbers(mut self, yes: bool) -> Self {
        self.serialize = self.serialize.use_enum_numbers(yes);
        self
    }

    /// Whether 64-bit integers are emitted as JSON strings.
    pub fn stringify_64_bit_integers(mut self, yes: bool) -> Self {
        self.serialize = self.serialize.stringify_64_bit_integers(yes);
        self
    }

    /// Whether unknown fields in request bodies are rejected.
    pub fn deny_unknown_fields(mut self, yes: bool) -> Self {
        self.deserialize = self.deserialize.deny_unknown_fields(yes);
        self
    }
}

impl SchemaCodec for JsonCodec {
    fn decode(&self, bytes: &[u8], prototype: &mut dyn RpcMessage) -> Result<(), CodecError> {
        let descriptor = prototype.message_descriptor();
        let invalid_json = |source| CodecError::InvalidJson {
            message: descriptor.full_name().to_string(),
            source,
        };

        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        let message = DynamicMessage::deserialize_with_options(
            descriptor.clone(),
            &mut deserializer,
            &self.deserialize,
        )
        .map_err(invalid_json)?;
        // Reject trailing data after the JSON object.
        deserializer.end().map_err(invalid_json)?;

        prototype
            .merge_dynamic(&message)
            .map_err(|source| CodecError::Merge {
                message: descriptor.full_name().to_string(),
                source,
            })
    }

    fn encode(&self, message: &dyn RpcMessage) -> Result<Vec<u8>, CodecError> {
        let message = message.to_dynamic();
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::new(&mut buffer);

        message
            .serialize_with_options(&mut serializer, &self.serialize)
            .map_err(|source| CodecError::Serialize {
                message: message.descriptor().full_name().to_string(),
                source,
            })?;

        Ok(buffer)
    }
}
