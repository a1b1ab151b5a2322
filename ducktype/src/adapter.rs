//! Synthesised adapter types and their instances
//!
//! An `AdapterType` is a frozen slot table: one slot per capability member,
//! each either forwarding to a base method, raising on call, or returning the
//! wrapped instance (marker). An `Adapter` binds that table to one wrapped
//! object and an optional context.

use crate::descriptor::expand;
use crate::error::{DuckError, DuckResult};
use crate::ext::ServiceProvider;
use crate::interface::{Interface, InterfaceId};
use crate::matcher::{check_arguments, check_return, select_overload};
use crate::object::{Invocation, MethodFn, ObjectRef, TypeDef};
use crate::registry::CompositeKey;
use crate::types::{MemberSignature, TypeRef};
use crate::values::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Hidden field declared on every adapter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Clone)]
pub enum SlotBody {
    /// Forwards to the matched base method with arguments passed through.
    Forward {
        target: MemberSignature,
        body: MethodFn,
    },
    /// Stand-in for a member the base type cannot satisfy.
    NotImplemented,
    /// Returns the wrapped instance.
    Marker,
}

impl fmt::Debug for SlotBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotBody::Forward { target, .. } => write!(f, "Forward({})", target),
            SlotBody::NotImplemented => write!(f, "NotImplemented"),
            SlotBody::Marker => write!(f, "Marker"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub owner: InterfaceId,
    pub signature: MemberSignature,
    pub body: SlotBody,
}

impl Slot {
    pub fn is_satisfied(&self) -> bool {
        !matches!(self.body, SlotBody::NotImplemented)
    }
}

/// A property wired to its accessor slots.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySlot {
    pub owner: InterfaceId,
    pub name: String,
    pub ty: TypeRef,
    pub getter: Option<usize>,
    pub setter: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Forwarded,
    NotImplemented,
    Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotManifest {
    pub interface: String,
    pub signature: String,
    pub state: SlotState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyManifest {
    pub interface: String,
    pub name: String,
    pub ty: TypeRef,
    pub readable: bool,
    pub writable: bool,
}

/// Serializable description of a synthesised adapter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterManifest {
    pub name: String,
    pub base_type: String,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub slots: Vec<SlotManifest>,
    pub properties: Vec<PropertyManifest>,
}

impl AdapterManifest {
    pub fn to_json(&self) -> DuckResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DuckError::Internal(e.to_string()))
    }
}

/// A synthesised adapter type. Immutable once built.
pub struct AdapterType {
    pub(crate) name: String,
    pub(crate) key: CompositeKey,
    pub(crate) base: Arc<TypeDef>,
    pub(crate) interfaces: Vec<Arc<Interface>>,
    pub(crate) fields: Vec<FieldDecl>,
    pub(crate) slots: Vec<Slot>,
    pub(crate) by_name: IndexMap<String, Vec<usize>>,
    pub(crate) properties: Vec<PropertySlot>,
}

impl AdapterType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &CompositeKey {
        &self.key
    }

    pub fn base_type(&self) -> &Arc<TypeDef> {
        &self.base
    }

    /// Requested interfaces, the ones they extend, and the marker.
    pub fn interfaces(&self) -> &[Arc<Interface>] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn properties(&self) -> &[PropertySlot] {
        &self.properties
    }

    pub fn implements(&self, interface: &Interface) -> bool {
        self.interfaces.iter().any(|i| i.id() == interface.id())
    }

    pub fn implements_named(&self, qualified_name: &str) -> bool {
        self.interfaces
            .iter()
            .any(|i| i.qualified_name() == qualified_name)
    }

    /// Slots standing in for members the base type could not satisfy.
    pub fn unsatisfied(&self) -> Vec<&Slot> {
        self.slots.iter().filter(|s| !s.is_satisfied()).collect()
    }

    pub fn is_fully_satisfied(&self) -> bool {
        self.slots.iter().all(Slot::is_satisfied)
    }

    fn interface_name(&self, id: InterfaceId) -> String {
        self.interfaces
            .iter()
            .find(|i| i.id() == id)
            .map(|i| i.qualified_name())
            .unwrap_or_default()
    }

    pub fn manifest(&self) -> AdapterManifest {
        AdapterManifest {
            name: self.name.clone(),
            base_type: self.base.qualified_name(),
            interfaces: self.interfaces.iter().map(|i| i.qualified_name()).collect(),
            fields: self.fields.clone(),
            slots: self
                .slots
                .iter()
                .map(|slot| SlotManifest {
                    interface: self.interface_name(slot.owner),
                    signature: slot.signature.to_string(),
                    state: match slot.body {
                        SlotBody::Forward { .. } => SlotState::Forwarded,
                        SlotBody::NotImplemented => SlotState::NotImplemented,
                        SlotBody::Marker => SlotState::Marker,
                    },
                })
                .collect(),
            properties: self
                .properties
                .iter()
                .map(|p| PropertyManifest {
                    interface: self.interface_name(p.owner),
                    name: p.name.clone(),
                    ty: p.ty.clone(),
                    readable: p.getter.is_some(),
                    writable: p.setter.is_some(),
                })
                .collect(),
        }
    }

    /// Runs the synthesised constructor around `target`.
    pub fn instantiate(
        self: &Arc<Self>,
        target: ObjectRef,
        context: Option<Arc<dyn ServiceProvider>>,
    ) -> DuckResult<Adapter> {
        if target.type_def().id() != self.base.id() {
            return Err(DuckError::TargetTypeMismatch {
                expected: self.base.qualified_name(),
                actual: target.type_def().qualified_name(),
            });
        }
        Ok(Adapter {
            inner: Arc::new(AdapterInner {
                ty: Arc::clone(self),
                target,
                context,
            }),
        })
    }

    fn resolve(
        &self,
        owners: Option<&[InterfaceId]>,
        member: &str,
        type_args: &[TypeRef],
        args: &[Value],
    ) -> DuckResult<&Slot> {
        let candidates: Vec<&Slot> = self
            .by_name
            .get(member)
            .into_iter()
            .flatten()
            .map(|&i| &self.slots[i])
            .filter(|slot| owners.map_or(true, |o| o.contains(&slot.owner)))
            .collect();

        let not_found = || DuckError::MemberNotFound {
            type_name: self.name.clone(),
            member: member.to_string(),
        };

        let first = candidates.first().copied().ok_or_else(not_found)?;
        match select_overload(candidates.iter().map(|s| (&s.signature, *s)), type_args, args) {
            Some(slot) => Ok(slot),
            None => {
                // Surface why the only plausible overload rejected the call
                check_arguments(&first.signature, type_args, args)?;
                Err(not_found())
            }
        }
    }

    fn property(&self, owners: Option<&[InterfaceId]>, name: &str) -> DuckResult<&PropertySlot> {
        self.properties
            .iter()
            .find(|p| p.name == name && owners.map_or(true, |o| o.contains(&p.owner)))
            .ok_or_else(|| DuckError::MemberNotFound {
                type_name: self.name.clone(),
                member: name.to_string(),
            })
    }
}

impl fmt::Debug for AdapterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterType")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("slots", &self.slots)
            .finish()
    }
}

struct AdapterInner {
    ty: Arc<AdapterType>,
    target: ObjectRef,
    context: Option<Arc<dyn ServiceProvider>>,
}

/// One live adapter. Clones share the same instance.
#[derive(Clone)]
pub struct Adapter {
    inner: Arc<AdapterInner>,
}

impl Adapter {
    pub fn adapter_type(&self) -> &Arc<AdapterType> {
        &self.inner.ty
    }

    /// The wrapped instance, by identity.
    pub fn duck_typed_object(&self) -> &ObjectRef {
        &self.inner.target
    }

    pub fn context(&self) -> Option<&Arc<dyn ServiceProvider>> {
        self.inner.context.as_ref()
    }

    pub fn ptr_eq(a: &Adapter, b: &Adapter) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn invoke(&self, member: &str, args: &[Value]) -> DuckResult<Value> {
        self.invoke_generic(member, &[], args)
    }

    pub fn invoke_generic(
        &self,
        member: &str,
        type_args: &[TypeRef],
        args: &[Value],
    ) -> DuckResult<Value> {
        let slot = self.inner.ty.resolve(None, member, type_args, args)?;
        self.dispatch(slot, type_args, args)
    }

    pub fn get(&self, property: &str) -> DuckResult<Value> {
        self.get_in(None, property)
    }

    pub fn set(&self, property: &str, value: impl Into<Value>) -> DuckResult<()> {
        self.set_in(None, property, value.into())
    }

    /// Restricts member resolution to one implemented interface.
    pub fn view(&self, interface: &Arc<Interface>) -> DuckResult<CapabilityView> {
        if !self.inner.ty.implements(interface) {
            return Err(DuckError::InterfaceNotImplemented {
                adapter_type: self.inner.ty.name.clone(),
                interface: interface.qualified_name(),
            });
        }
        let owners = expand(std::slice::from_ref(interface))
            .iter()
            .map(|i| i.id())
            .collect();
        Ok(CapabilityView {
            adapter: self.clone(),
            interface: Arc::clone(interface),
            owners,
        })
    }

    fn get_in(&self, owners: Option<&[InterfaceId]>, property: &str) -> DuckResult<Value> {
        let ty = &self.inner.ty;
        let prop = ty.property(owners, property)?;
        let index = prop.getter.ok_or_else(|| DuckError::AccessorMissing {
            property: property.to_string(),
            accessor: "get",
        })?;
        self.dispatch(&ty.slots[index], &[], &[])
    }

    fn set_in(
        &self,
        owners: Option<&[InterfaceId]>,
        property: &str,
        value: Value,
    ) -> DuckResult<()> {
        let ty = &self.inner.ty;
        let prop = ty.property(owners, property)?;
        let index = prop.setter.ok_or_else(|| DuckError::AccessorMissing {
            property: property.to_string(),
            accessor: "set",
        })?;
        self.dispatch(&ty.slots[index], &[], &[value])?;
        Ok(())
    }

    fn dispatch(&self, slot: &Slot, type_args: &[TypeRef], args: &[Value]) -> DuckResult<Value> {
        match &slot.body {
            SlotBody::Marker => Ok(Value::Object(Arc::clone(&self.inner.target))),
            SlotBody::NotImplemented => Err(DuckError::UnsatisfiedMemberInvoked {
                adapter_type: self.inner.ty.name.clone(),
                member: slot.signature.to_string(),
            }),
            SlotBody::Forward { target, body } => {
                check_arguments(&slot.signature, type_args, args)?;
                debug!("forwarding {} to {}", slot.signature, target);
                let result = body(
                    self.inner.target.as_ref(),
                    Invocation::generic(type_args, args),
                )?;
                check_return(&slot.signature, type_args, &result)?;
                if slot.signature.return_type.is_unit() {
                    Ok(Value::Nil)
                } else {
                    Ok(result)
                }
            }
        }
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("type", &self.inner.ty.name)
            .field("target", &self.inner.target)
            .field("has_context", &self.inner.context.is_some())
            .finish()
    }
}

/// An adapter seen through one of its interfaces.
#[derive(Debug, Clone)]
pub struct CapabilityView {
    adapter: Adapter,
    interface: Arc<Interface>,
    owners: Vec<InterfaceId>,
}

impl CapabilityView {
    pub fn interface(&self) -> &Arc<Interface> {
        &self.interface
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn invoke(&self, member: &str, args: &[Value]) -> DuckResult<Value> {
        self.invoke_generic(member, &[], args)
    }

    pub fn invoke_generic(
        &self,
        member: &str,
        type_args: &[TypeRef],
        args: &[Value],
    ) -> DuckResult<Value> {
        let slot = self
            .adapter
            .inner
            .ty
            .resolve(Some(self.owners.as_slice()), member, type_args, args)?;
        self.adapter.dispatch(slot, type_args, args)
    }

    pub fn get(&self, property: &str) -> DuckResult<Value> {
        self.adapter.get_in(Some(self.owners.as_slice()), property)
    }

    pub fn set(&self, property: &str, value: impl Into<Value>) -> DuckResult<()> {
        self.adapter.set_in(Some(self.owners.as_slice()), property, value.into())
    }
}
