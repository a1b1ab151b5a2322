//! Adapter factory
//!
//! Public entry points: compatibility check, get-or-create of adapter types
//! and adapter instantiation around a live object.

use crate::adapter::{Adapter, AdapterType};
use crate::config::DuckConfig;
use crate::error::DuckResult;
use crate::ext::ServiceProvider;
use crate::interface::Interface;
use crate::matcher;
use crate::object::{ObjectRef, TypeDef};
use crate::registry::{AdapterRegistry, CompositeKey};
use crate::synthesis::synthesize;
use std::sync::Arc;

/// Contract of an adapter factory. An alternate implementation can be
/// supplied through a `ServiceProvider`.
pub trait AdapterFactory: Send + Sync + std::fmt::Debug {
    /// Structural check only; never synthesises anything.
    fn is_compatible(
        &self,
        base: &TypeDef,
        capabilities: &[Arc<Interface>],
        context: Option<&Arc<dyn ServiceProvider>>,
    ) -> bool;

    /// The adapter type for (base, capabilities), synthesised on first request.
    /// The context does not take part in type identity.
    fn get_or_create_adapter_type(
        &self,
        base: &Arc<TypeDef>,
        capabilities: &[Arc<Interface>],
        context: Option<&Arc<dyn ServiceProvider>>,
    ) -> DuckResult<Arc<AdapterType>>;

    /// Wraps `target`. An absent target yields `Ok(None)`.
    fn create_adapter(
        &self,
        target: Option<&ObjectRef>,
        capabilities: &[Arc<Interface>],
        context: Option<Arc<dyn ServiceProvider>>,
    ) -> DuckResult<Option<Adapter>>;
}

#[derive(Debug, Clone)]
pub struct DefaultAdapterFactory {
    registry: Arc<AdapterRegistry>,
    config: DuckConfig,
}

impl Default for DefaultAdapterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultAdapterFactory {
    /// Factory over the process-wide registry with default configuration.
    pub fn new() -> Self {
        Self {
            registry: AdapterRegistry::global(),
            config: DuckConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DuckConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a private registry instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<AdapterRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DuckConfig {
        &self.config
    }
}

impl AdapterFactory for DefaultAdapterFactory {
    fn is_compatible(
        &self,
        base: &TypeDef,
        capabilities: &[Arc<Interface>],
        _context: Option<&Arc<dyn ServiceProvider>>,
    ) -> bool {
        matcher::is_compatible(base, capabilities)
    }

    fn get_or_create_adapter_type(
        &self,
        base: &Arc<TypeDef>,
        capabilities: &[Arc<Interface>],
        _context: Option<&Arc<dyn ServiceProvider>>,
    ) -> DuckResult<Arc<AdapterType>> {
        let key = CompositeKey::of(base, capabilities);
        self.registry
            .get_or_create(key, || synthesize(base, capabilities, &self.config))
    }

    fn create_adapter(
        &self,
        target: Option<&ObjectRef>,
        capabilities: &[Arc<Interface>],
        context: Option<Arc<dyn ServiceProvider>>,
    ) -> DuckResult<Option<Adapter>> {
        let Some(target) = target else {
            return Ok(None);
        };
        let ty =
            self.get_or_create_adapter_type(target.type_def(), capabilities, context.as_ref())?;
        ty.instantiate(Arc::clone(target), context).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::InterfaceBuilder;
    use crate::object::TypeDefBuilder;
    use crate::types::TypeRef;
    use crate::values::Value;

    fn factory() -> DefaultAdapterFactory {
        DefaultAdapterFactory::new().with_registry(Arc::new(AdapterRegistry::new()))
    }

    #[test]
    fn test_absent_target_yields_none() {
        let iface = InterfaceBuilder::new("tests", "INamed").build();
        let adapter = factory().create_adapter(None, &[iface], None).unwrap();
        assert!(adapter.is_none());
    }

    #[test]
    fn test_empty_capability_list_builds_marker_only_adapter() {
        let ty = TypeDefBuilder::new("tests", "Plain").build();
        let obj = ty.instantiate().unwrap();

        let adapter = factory()
            .create_adapter(Some(&obj), &[], None)
            .unwrap()
            .unwrap();
        assert_eq!(adapter.adapter_type().slots().len(), 1);
        assert_eq!(
            adapter.get("DuckTypedObject").unwrap(),
            Value::Object(Arc::clone(&obj))
        );
    }

    #[test]
    fn test_compatibility_does_not_register_types() {
        let factory = factory();
        let ty = TypeDefBuilder::new("tests", "Plain")
            .property("Name", TypeRef::string())
            .build();
        let iface = InterfaceBuilder::new("tests", "INamed")
            .property("Name", TypeRef::string())
            .build();

        assert!(factory.is_compatible(&ty, &[iface], None));
        assert!(factory.registry().is_empty());
    }
}
