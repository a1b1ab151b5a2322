//! Convenience layer
//!
//! Extension traits over objects, values and base types that route through
//! the factory resolved from the process-wide services, falling back to the
//! default factory. These entry points require at least one capability.

use crate::adapter::{Adapter, AdapterType};
use crate::error::{DuckError, DuckResult};
use crate::factory::{AdapterFactory, DefaultAdapterFactory};
use crate::interface::Interface;
use crate::object::{ObjectRef, TypeDef};
use crate::values::Value;
use once_cell::sync::Lazy;
use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Service name under which an alternate `Arc<dyn AdapterFactory>` is resolved.
pub const FACTORY_SERVICE: &str = "ducktype.AdapterFactory";

/// Dependency-resolution handle. Also carried as the opaque adapter context.
pub trait ServiceProvider: Send + Sync {
    fn resolve(&self, service: &str) -> Option<Arc<dyn Any + Send + Sync>>;
}

static SERVICES: Lazy<RwLock<Option<Arc<dyn ServiceProvider>>>> = Lazy::new(|| RwLock::new(None));

static DEFAULT_FACTORY: Lazy<Arc<dyn AdapterFactory>> =
    Lazy::new(|| Arc::new(DefaultAdapterFactory::new()));

/// Installs the process-wide services used by the extension traits.
pub fn set_services(services: Arc<dyn ServiceProvider>) {
    *SERVICES.write().unwrap_or_else(PoisonError::into_inner) = Some(services);
}

pub fn clear_services() {
    *SERVICES.write().unwrap_or_else(PoisonError::into_inner) = None;
}

pub fn services() -> Option<Arc<dyn ServiceProvider>> {
    SERVICES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// The factory registered with `services`, or the default one.
pub fn resolve_factory(services: Option<&Arc<dyn ServiceProvider>>) -> Arc<dyn AdapterFactory> {
    services
        .and_then(|s| s.resolve(FACTORY_SERVICE))
        .and_then(|service| service.downcast::<Arc<dyn AdapterFactory>>().ok())
        .map(|factory| {
            debug!("using adapter factory from services");
            Arc::clone(&*factory)
        })
        .unwrap_or_else(|| Arc::clone(&DEFAULT_FACTORY))
}

fn require_capabilities(capabilities: &[Arc<Interface>]) -> DuckResult<()> {
    if capabilities.is_empty() {
        Err(DuckError::NoCapabilities)
    } else {
        Ok(())
    }
}

pub trait DuckExt {
    /// Whether the value can be adapted to every capability without stand-ins.
    fn is_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<bool>;

    /// Adapts the value. Absent values yield `Ok(None)`.
    fn create_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<Option<Adapter>>;

    /// Whether the value already is an adapter.
    fn is_duck_type(&self) -> bool;
}

impl DuckExt for ObjectRef {
    fn is_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<bool> {
        self.type_def().is_duck(capabilities)
    }

    fn create_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<Option<Adapter>> {
        require_capabilities(capabilities)?;
        let services = services();
        resolve_factory(services.as_ref()).create_adapter(Some(self), capabilities, services)
    }

    fn is_duck_type(&self) -> bool {
        false
    }
}

impl DuckExt for Value {
    fn is_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<bool> {
        match self {
            Value::Object(obj) => obj.is_duck(capabilities),
            Value::Adapter(adapter) => adapter.is_duck(capabilities),
            // Absent and plain values are never adapted
            _ => {
                require_capabilities(capabilities)?;
                Ok(false)
            }
        }
    }

    fn create_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<Option<Adapter>> {
        match self {
            Value::Object(obj) => obj.create_duck(capabilities),
            Value::Adapter(adapter) => adapter.create_duck(capabilities),
            _ => {
                require_capabilities(capabilities)?;
                Ok(None)
            }
        }
    }

    fn is_duck_type(&self) -> bool {
        matches!(self, Value::Adapter(_))
    }
}

impl DuckExt for Adapter {
    /// An adapter is checked against its own implemented interfaces.
    fn is_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<bool> {
        require_capabilities(capabilities)?;
        let ty = self.adapter_type();
        Ok(capabilities.iter().all(|c| ty.implements(c)))
    }

    /// Reuses the adapter when it already implements every capability,
    /// otherwise adapts the wrapped object.
    fn create_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<Option<Adapter>> {
        if self.is_duck(capabilities)? {
            return Ok(Some(self.clone()));
        }
        self.duck_typed_object().create_duck(capabilities)
    }

    fn is_duck_type(&self) -> bool {
        true
    }
}

pub trait DuckTypeExt {
    fn is_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<bool>;

    fn create_duck_type(&self, capabilities: &[Arc<Interface>]) -> DuckResult<Arc<AdapterType>>;
}

impl DuckTypeExt for Arc<TypeDef> {
    fn is_duck(&self, capabilities: &[Arc<Interface>]) -> DuckResult<bool> {
        require_capabilities(capabilities)?;
        let services = services();
        Ok(resolve_factory(services.as_ref()).is_compatible(self, capabilities, services.as_ref()))
    }

    fn create_duck_type(&self, capabilities: &[Arc<Interface>]) -> DuckResult<Arc<AdapterType>> {
        require_capabilities(capabilities)?;
        let services = services();
        resolve_factory(services.as_ref()).get_or_create_adapter_type(
            self,
            capabilities,
            services.as_ref(),
        )
    }
}
