//! Adapter synthesis engine
//!
//! Builds an adapter type for a base type and an ordered capability list:
//! hidden fields, one slot per described member (forwarding on a structural
//! match, raising otherwise), property wiring, the marker interface and the
//! constructor. The result is not registered here.

use crate::adapter::AdapterType;
use crate::config::DuckConfig;
use crate::descriptor::describe_all;
use crate::emit::AdapterTypeBuilder;
use crate::error::{DuckError, DuckResult};
use crate::interface::{duck_typed_object, Interface};
use crate::matcher::find_method;
use crate::object::TypeDef;
use crate::registry::CompositeKey;
use crate::types::TypeRef;
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hidden field holding the wrapped instance.
pub const TARGET_FIELD: &str = "target";
/// Hidden field holding the optional context.
pub const CONTEXT_FIELD: &str = "serviceProvider";

/// `{namespace}.{Base}_{I1}_{I2}...`
///
/// Simple names collide across namespaces unless `qualified_names` is set;
/// the registry key never depends on this name.
pub fn type_name(base: &TypeDef, capabilities: &[Arc<Interface>], config: &DuckConfig) -> String {
    let (base_name, interface_names) = if config.qualified_names {
        (
            base.qualified_name(),
            capabilities.iter().map(|c| c.qualified_name()).collect_vec(),
        )
    } else {
        (
            base.name().to_string(),
            capabilities.iter().map(|c| c.name().to_string()).collect_vec(),
        )
    };

    let simple = std::iter::once(base_name).chain(interface_names).join("_");
    if config.namespace.is_empty() {
        simple
    } else {
        format!("{}.{}", config.namespace, simple)
    }
}

pub fn synthesize(
    base: &Arc<TypeDef>,
    capabilities: &[Arc<Interface>],
    config: &DuckConfig,
) -> DuckResult<AdapterType> {
    if !base.has_default_constructor() {
        return Err(DuckError::MissingDefaultConstructor {
            type_name: base.qualified_name(),
        });
    }

    let name = type_name(base, capabilities, config);
    let shape = describe_all(capabilities);

    let key = CompositeKey::of(base, capabilities);
    let mut builder = AdapterTypeBuilder::new(&name, key, Arc::clone(base))
        .field(TARGET_FIELD, TypeRef::Named(base.qualified_name()))
        .field(CONTEXT_FIELD, TypeRef::Any);

    for interface in &shape.interfaces {
        builder = builder.implements(interface);
    }

    // Marker members are always wired by `implement_marker`, even when requested
    let marker = duck_typed_object().id();

    let mut unsatisfied = Vec::new();
    for member in shape.members.iter().filter(|m| m.owner != marker) {
        builder = match find_method(base, &member.signature) {
            Some(method) => {
                debug!(
                    "{}: forwarding {} to {}",
                    name,
                    member.signature,
                    method.signature()
                );
                builder.forward(
                    member.owner,
                    member.signature.clone(),
                    method.signature().clone(),
                    Arc::clone(method.body()),
                )
            }
            None => {
                debug!("{}: no match for {}", name, member.signature);
                unsatisfied.push(member.signature.to_string());
                builder.not_implemented(member.owner, member.signature.clone())
            }
        };
    }

    for binding in shape.properties.iter().filter(|p| p.owner != marker) {
        builder = builder.property(binding.clone());
    }

    let ty = builder.implement_marker().constructor().finish()?;

    info!(
        "synthesised adapter type {} ({} members)",
        ty.name(),
        shape.members.len()
    );
    if !unsatisfied.is_empty() && config.warn_on_partial {
        warn!(
            "{} is partially compatible; unsatisfied: {}",
            ty.name(),
            unsatisfied.join(", ")
        );
    }

    Ok(ty)
}
