// Ducktype
// Runtime adapters exposing arbitrary objects through capability interfaces
pub mod adapter;
pub mod config;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod ext;
pub mod factory;
pub mod interface;
pub mod matcher;
pub mod object;
pub mod registry;
pub mod synthesis;
pub mod types;
pub mod values;

// Re-export the pieces most callers need.
pub use adapter::{Adapter, AdapterManifest, AdapterType, CapabilityView, SlotState};
pub use config::DuckConfig;
pub use error::{DuckError, DuckResult};
pub use ext::{
    clear_services, resolve_factory, services, set_services, DuckExt, DuckTypeExt,
    ServiceProvider, FACTORY_SERVICE,
};
pub use factory::{AdapterFactory, DefaultAdapterFactory};
pub use interface::{
    duck_typed_object, Interface, InterfaceBuilder, InterfaceId, InterfaceMember,
};
pub use matcher::{is_compatible, missing_members};
pub use object::{BaseTypeId, Invocation, Object, ObjectRef, TypeDef, TypeDefBuilder};
pub use registry::{AdapterRegistry, CompositeKey, RegistryStats};
pub use types::{GenericParamDef, MemberSignature, TypeRef, Variance};
pub use values::Value;
