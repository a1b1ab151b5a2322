// The process-wide services slot is shared by every test in this binary, so
// the tests that install services run inside one test function.
mod common;

use common::*;
use ducktype::{
    clear_services, resolve_factory, services, set_services, AdapterFactory, AdapterRegistry,
    AdapterType, DefaultAdapterFactory, DuckExt, DuckResult, DuckTypeExt, Interface, ObjectRef,
    ServiceProvider, TypeDef, Value, FACTORY_SERVICE,
};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Delegates to a private default factory and counts adapter creations.
#[derive(Debug)]
struct CountingFactory {
    inner: DefaultAdapterFactory,
    created: AtomicUsize,
}

impl AdapterFactory for CountingFactory {
    fn is_compatible(
        &self,
        base: &TypeDef,
        capabilities: &[Arc<Interface>],
        context: Option<&Arc<dyn ServiceProvider>>,
    ) -> bool {
        self.inner.is_compatible(base, capabilities, context)
    }

    fn get_or_create_adapter_type(
        &self,
        base: &Arc<TypeDef>,
        capabilities: &[Arc<Interface>],
        context: Option<&Arc<dyn ServiceProvider>>,
    ) -> DuckResult<Arc<AdapterType>> {
        self.inner
            .get_or_create_adapter_type(base, capabilities, context)
    }

    fn create_adapter(
        &self,
        target: Option<&ObjectRef>,
        capabilities: &[Arc<Interface>],
        context: Option<Arc<dyn ServiceProvider>>,
    ) -> DuckResult<Option<ducktype::Adapter>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create_adapter(target, capabilities, context)
    }
}

struct Services {
    factory: Arc<dyn AdapterFactory>,
}

impl ServiceProvider for Services {
    fn resolve(&self, service: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        if service == FACTORY_SERVICE {
            Some(Arc::new(Arc::clone(&self.factory)))
        } else {
            None
        }
    }
}

#[test]
fn test_extension_methods() {
    // Default factory
    let obj = simple("Duck");
    let duck = simple_duck();
    assert_eq!(obj.is_duck(&[duck.clone()]), Ok(true));
    assert!(!obj.is_duck_type());

    let adapter = obj.create_duck(&[duck.clone()]).unwrap().unwrap();
    assert_eq!(adapter.get("Name").unwrap(), Value::from("Duck"));

    let as_value = Value::from(adapter.clone());
    assert!(as_value.is_duck_type());
    assert_eq!(as_value.is_duck(&[duck.clone()]), Ok(true));
    let again = as_value.create_duck(&[duck.clone()]).unwrap().unwrap();
    assert!(ducktype::Adapter::ptr_eq(&again, &adapter));

    // An adapter asked for another capability adapts its wrapped object
    let other = multiple_duck_2();
    assert_eq!(adapter.is_duck(&[other.clone()]), Ok(false));
    let rewrapped = adapter.create_duck(&[other]).unwrap().unwrap();
    assert!(Arc::ptr_eq(rewrapped.duck_typed_object(), &obj));

    let ty = obj.type_def().create_duck_type(&[duck.clone()]).unwrap();
    assert!(Arc::ptr_eq(&ty, adapter.adapter_type()));

    // Factory resolved from installed services
    let counting = Arc::new(CountingFactory {
        inner: DefaultAdapterFactory::new().with_registry(Arc::new(AdapterRegistry::new())),
        created: AtomicUsize::new(0),
    });
    let factory: Arc<dyn AdapterFactory> = counting.clone();
    set_services(Arc::new(Services { factory }));
    assert!(services().is_some());

    let resolved = resolve_factory(services().as_ref());
    let adapter = obj.create_duck(&[duck.clone()]).unwrap().unwrap();
    assert_eq!(counting.created.load(Ordering::SeqCst), 1);
    assert!(!Arc::ptr_eq(&ty, adapter.adapter_type()));
    assert!(adapter.context().is_some());
    assert!(resolved.is_compatible(obj.type_def(), &[duck.clone()], None));

    clear_services();
    assert!(services().is_none());
    obj.create_duck(&[duck]).unwrap();
    assert_eq!(counting.created.load(Ordering::SeqCst), 1);
}
