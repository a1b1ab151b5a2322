//! Adapter type builder
//!
//! Declares the shape of a new adapter type (name, hidden fields, implemented
//! interfaces, member slots, property wiring, marker and constructor) and
//! freezes it into an `AdapterType`.

use crate::adapter::{AdapterType, FieldDecl, PropertySlot, Slot, SlotBody};
use crate::descriptor::PropertyBinding;
use crate::error::{DuckError, DuckResult};
use crate::interface::{duck_typed_object, Interface, InterfaceId, MARKER_PROPERTY};
use crate::object::{MethodFn, TypeDef};
use crate::registry::CompositeKey;
use crate::types::{MemberSignature, TypeRef};
use indexmap::IndexMap;
use std::sync::Arc;

pub struct AdapterTypeBuilder {
    name: String,
    key: CompositeKey,
    base: Arc<TypeDef>,
    fields: Vec<FieldDecl>,
    interfaces: Vec<Arc<Interface>>,
    slots: Vec<Slot>,
    bindings: Vec<PropertyBinding>,
    constructor: bool,
}

impl AdapterTypeBuilder {
    pub fn new(name: &str, key: CompositeKey, base: Arc<TypeDef>) -> Self {
        Self {
            name: name.to_string(),
            key,
            base,
            fields: Vec::new(),
            interfaces: Vec::new(),
            slots: Vec::new(),
            bindings: Vec::new(),
            constructor: false,
        }
    }

    pub fn field(mut self, name: &str, ty: TypeRef) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn implements(mut self, interface: &Arc<Interface>) -> Self {
        if !self.interfaces.iter().any(|i| i.id() == interface.id()) {
            self.interfaces.push(Arc::clone(interface));
        }
        self
    }

    /// Member forwarding to a base method. `target` is the matched base signature.
    pub fn forward(
        mut self,
        owner: InterfaceId,
        signature: MemberSignature,
        target: MemberSignature,
        body: MethodFn,
    ) -> Self {
        self.slots.push(Slot {
            owner,
            signature,
            body: SlotBody::Forward { target, body },
        });
        self
    }

    /// Member whose body raises when called.
    pub fn not_implemented(mut self, owner: InterfaceId, signature: MemberSignature) -> Self {
        self.slots.push(Slot {
            owner,
            signature,
            body: SlotBody::NotImplemented,
        });
        self
    }

    /// Wires a property to accessor slots declared for the same interface.
    pub fn property(mut self, binding: PropertyBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Implements the marker interface with a slot returning the wrapped instance.
    pub fn implement_marker(self) -> Self {
        let marker = duck_typed_object();
        let getter = MemberSignature::getter(MARKER_PROPERTY, TypeRef::Any);
        let binding = PropertyBinding {
            owner: marker.id(),
            name: MARKER_PROPERTY.to_string(),
            ty: TypeRef::Any,
            getter: Some(getter.clone()),
            setter: None,
        };

        let mut builder = self.implements(marker);
        builder.slots.push(Slot {
            owner: marker.id(),
            signature: getter,
            body: SlotBody::Marker,
        });
        builder.property(binding)
    }

    /// Declares the (target, context) constructor.
    pub fn constructor(mut self) -> Self {
        self.constructor = true;
        self
    }

    fn slot_index(&self, owner: InterfaceId, signature: &MemberSignature) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.owner == owner && s.signature == *signature)
    }

    pub fn finish(self) -> DuckResult<AdapterType> {
        if !self.constructor {
            return Err(DuckError::Internal(format!(
                "adapter type '{}' declares no constructor",
                self.name
            )));
        }

        let mut properties = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            let wire = |accessor: &Option<MemberSignature>, kind: &'static str| {
                accessor
                    .as_ref()
                    .map(|sig| {
                        self.slot_index(binding.owner, sig)
                            .ok_or_else(|| DuckError::AccessorMissing {
                                property: binding.name.clone(),
                                accessor: kind,
                            })
                    })
                    .transpose()
            };
            let getter = wire(&binding.getter, "get")?;
            let setter = wire(&binding.setter, "set")?;
            properties.push(PropertySlot {
                owner: binding.owner,
                name: binding.name.clone(),
                ty: binding.ty.clone(),
                getter,
                setter,
            });
        }

        let mut by_name: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, slot) in self.slots.iter().enumerate() {
            by_name
                .entry(slot.signature.name.clone())
                .or_default()
                .push(index);
        }

        Ok(AdapterType {
            name: self.name,
            key: self.key,
            base: self.base,
            interfaces: self.interfaces,
            fields: self.fields,
            slots: self.slots,
            by_name,
            properties,
        })
    }
}
