//! The handler registry.
//!
//! A read-only dispatch table from [`MiddlewareKind`] to its handler. It is
//! built once, holds no per-run state, and is cheap to clone and share
//! across simulations.

use crate::handler::MiddlewareHandler;
use crate::handlers::{
    AuthenticationHandler, AuthorizationHandler, CompressionHandler, CorsHandler, CustomHandler,
    EndpointHandler, ExceptionHandlingHandler, HttpsHandler, RateLimitingHandler, RoutingHandler,
    StaticFilesHandler,
};
use daedalus_core::{DaedalusError, DaedalusResult, MiddlewareKind, MiddlewareNode};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maps every middleware kind to its handler.
///
/// # Example
///
/// ```
/// use daedalus_core::MiddlewareKind;
/// use daedalus_middleware::HandlerRegistry;
///
/// let registry = HandlerRegistry::new();
/// let node = registry.create_node(MiddlewareKind::RateLimiting, "limiter", 0).unwrap();
/// assert_eq!(node.config.u64_or("permitLimit", 0), 100);
///
/// assert!(registry.get_by_name("Tracing").is_err());
/// ```
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<MiddlewareKind, Arc<dyn MiddlewareHandler>>,
}

impl HandlerRegistry {
    /// Creates a registry with a handler for every kind.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(AuthenticationHandler);
        registry.register(AuthorizationHandler);
        registry.register(RoutingHandler);
        registry.register(CorsHandler);
        registry.register(StaticFilesHandler);
        registry.register(ExceptionHandlingHandler);
        registry.register(CompressionHandler);
        registry.register(RateLimitingHandler);
        registry.register(HttpsHandler);
        registry.register(CustomHandler);
        registry.register(EndpointHandler);
        registry
    }

    /// Creates a registry without handlers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for its kind, replacing any previous one.
    pub fn register(&mut self, handler: impl MiddlewareHandler + 'static) {
        let kind = handler.kind();
        if self.handlers.insert(kind, Arc::new(handler)).is_some() {
            tracing::debug!(kind = %kind, "Replaced middleware handler");
        }
    }

    /// Returns the handler for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::UnknownMiddlewareKind`] if none is registered.
    pub fn get(&self, kind: MiddlewareKind) -> DaedalusResult<&dyn MiddlewareHandler> {
        self.handlers
            .get(&kind)
            .map(|handler| &**handler)
            .ok_or_else(|| DaedalusError::unknown_kind(kind.as_str()))
    }

    /// Returns the handler for a kind given by its document name.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::UnknownMiddlewareKind`] if the name is not a
    /// kind or no handler is registered for it.
    pub fn get_by_name(&self, name: &str) -> DaedalusResult<&dyn MiddlewareHandler> {
        self.get(name.parse()?)
    }

    /// Returns true if a handler is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: MiddlewareKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Registered kinds, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = MiddlewareKind> + '_ {
        MiddlewareKind::ALL
            .into_iter()
            .filter(|kind| self.handlers.contains_key(kind))
    }

    /// Creates a node of `kind` carrying the handler's default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::UnknownMiddlewareKind`] if no handler is
    /// registered for `kind`.
    pub fn create_node(
        &self,
        kind: MiddlewareKind,
        id: impl Into<String>,
        order: i64,
    ) -> DaedalusResult<MiddlewareNode> {
        let config = self.get(kind)?.default_config();
        Ok(MiddlewareNode::new(id, kind, order).with_config(config))
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_handler() {
        let registry = HandlerRegistry::new();
        for kind in MiddlewareKind::ALL {
            let handler = registry.get(kind).unwrap();
            assert_eq!(handler.kind(), kind);
        }
        assert_eq!(registry.kinds().count(), MiddlewareKind::ALL.len());
    }

    #[test]
    fn test_empty_registry_fails_fast() {
        let registry = HandlerRegistry::empty();
        let err = registry.get(MiddlewareKind::Routing).err().unwrap();
        assert!(matches!(err, DaedalusError::UnknownMiddlewareKind { .. }));
        assert!(registry.create_node(MiddlewareKind::Routing, "r", 0).is_err());
    }

    #[test]
    fn test_get_by_name_is_case_insensitive() {
        let registry = HandlerRegistry::new();
        let handler = registry.get_by_name("cors").unwrap();
        assert_eq!(handler.kind(), MiddlewareKind::Cors);
        assert!(registry.get_by_name("Tracing").is_err());
    }

    #[test]
    fn test_create_node_uses_defaults() {
        let registry = HandlerRegistry::new();
        let node = registry
            .create_node(MiddlewareKind::Authentication, "auth", 4)
            .unwrap();
        assert_eq!(node.order, 4);
        assert_eq!(node.config.str("authScheme"), Some("JwtBearer"));
    }

    #[test]
    fn test_debug_lists_kinds() {
        let mut registry = HandlerRegistry::empty();
        registry.register(RoutingHandler);
        assert_eq!(format!("{registry:?}"), "HandlerRegistry { kinds: [Routing] }");
    }
}
