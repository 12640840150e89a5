//! # Handler Registry
//!
//! This module maps dispatch keys to [`Handler`]s. The registry is populated once at startup
//! and only read afterwards, so lookups need no synchronization.
//!
//! Wiring mistakes are reported when handlers are registered (see [`RegisterError`]), never
//! while serving requests.
use crate::handler::Handler;
use prost_reflect::MethodDescriptor;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Dispatch keys cannot be empty")]
    EmptyKey,
    #[error("A handler is already registered for '{0}'")]
    DuplicateKey(String),
    #[error(
        "Handler for '{key}' expects request type '{handler}' but the method declares '{method}'"
    )]
    RequestTypeMismatch {
        key: String,
        handler: String,
        method: String,
    },
}

/// Dispatch key to [`Handler`] lookup.
pub trait Registry: Send + Sync + 'static {
    /// Returns the handler registered for `key`, if any.
    fn lookup(&self, key: &str) -> Option<&Handler>;

    /// Registers `handler` under `key`. Only meant to be used before serving.
    fn register(&mut self, key: String, handler: Handler) -> Result<(), RegisterError>;
}

/// The canonical dispatch key of a method: `/{package}.{Service}/{Method}`.
pub fn method_key(method: &MethodDescriptor) -> String {
    format!("/{}/{}", method.parent_service().full_name(), method.name())
}

/// A [`Registry`] backed by a hash map with exact key matching.
#[derive(Debug, Default, Clone)]
pub struct HandlerMap {
    handlers: HashMap<String, Handler>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under an explicit key.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        handler: Handler,
    ) -> Result<(), RegisterError> {
        Registry::register(self, key.into(), handler)
    }

    /// Registers `handler` for a method described by the schema, under [`method_key`].
    ///
    /// Fails if the handler's request type is not the method's input type.
    pub fn register_method(
        &mut self,
        method: &MethodDescriptor,
        handler: Handler,
    ) -> Result<(), RegisterError> {
        let key = method_key(method);
        let input = method.input();

        if handler.request_descriptor().full_name() != input.full_name() {
            return Err(RegisterError::RequestTypeMismatch {
                key,
                handler: handler.request_descriptor().full_name().to_string(),
                method: input.full_name().to_string(),
            });
        }

        Registry::register(self, key, handler)
    }

    /// Registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Registry for HandlerMap {
    fn lookup(&self, key: &str) -> Option<&Handler> {
        self.handlers.get(key)
    }

    fn register(&mut self, key: String, handler: Handler) -> Result<(), RegisterError> {
        if key.is_empty() {
            return Err(RegisterError::EmptyKey);
        }

        if self.handlers.contains_key(&key) {
            return Err(RegisterError::DuplicateKey(key));
        }

        debug!(
            key = %key,
            request = handler.request_descriptor().full_name(),
            "registered handler"
        );
        self.handlers.insert(key, handler);
        Ok(())
    }
}
