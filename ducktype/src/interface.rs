//! Capability interfaces
//!
//! A capability interface is a named contract: ordered method signatures,
//! properties, and the interfaces it extends. Extension links can be added
//! after construction, so cyclic declarations are representable; expansion
//! in `descriptor` guards against them.

use crate::types::{MemberSignature, TypeRef};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

static NEXT_INTERFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Namespace of interfaces built into this crate.
pub const BUILTIN_NAMESPACE: &str = "ducktype";
/// Name of the marker interface every adapter implements.
pub const MARKER_INTERFACE: &str = "IDuckTypedObject";
/// Property of the marker interface returning the wrapped instance.
pub const MARKER_PROPERTY: &str = "DuckTypedObject";

static DUCK_TYPED_OBJECT: Lazy<Arc<Interface>> = Lazy::new(|| {
    InterfaceBuilder::new(BUILTIN_NAMESPACE, MARKER_INTERFACE)
        .readonly_property(MARKER_PROPERTY, TypeRef::Any)
        .build()
});

/// The marker interface: a single read-only property exposing the wrapped instance.
pub fn duck_typed_object() -> &'static Arc<Interface> {
    &DUCK_TYPED_OBJECT
}

/// Process-unique identity of a capability interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterfaceId(u64);

impl InterfaceId {
    fn next() -> Self {
        InterfaceId(NEXT_INTERFACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeRef,
    pub readable: bool,
    pub writable: bool,
}

/// A directly declared member, borrowed from its interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterfaceMember<'a> {
    Method(&'a MemberSignature),
    Property(&'a PropertyDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    Method(usize),
    Property(usize),
}

pub struct Interface {
    id: InterfaceId,
    namespace: String,
    name: String,
    methods: Vec<MemberSignature>,
    properties: Vec<PropertyDecl>,
    order: Vec<Declared>,
    extends: RwLock<Vec<Arc<Interface>>>,
}

impl Interface {
    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Directly declared methods, properties excluded.
    pub fn methods(&self) -> &[MemberSignature] {
        &self.methods
    }

    pub fn properties(&self) -> &[PropertyDecl] {
        &self.properties
    }

    /// Methods and properties interleaved in declaration order.
    pub fn members(&self) -> impl Iterator<Item = InterfaceMember<'_>> + '_ {
        self.order.iter().filter_map(move |declared| match *declared {
            Declared::Method(i) => self.methods.get(i).map(InterfaceMember::Method),
            Declared::Property(i) => self.properties.get(i).map(InterfaceMember::Property),
        })
    }

    /// Snapshot of the directly extended interfaces.
    pub fn extends(&self) -> Vec<Arc<Interface>> {
        // A poisoned lock still guards a consistent list of links
        self.extends
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Adds an extension link after construction.
    pub fn extend(&self, parent: Arc<Interface>) {
        let mut extends = self
            .extends
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !extends.iter().any(|p| p.id == parent.id) {
            extends.push(parent);
        }
    }
}

impl PartialEq for Interface {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Interface {}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Extension links are left out: they may be cyclic.
        f.debug_struct("Interface")
            .field("id", &self.id)
            .field("name", &self.qualified_name())
            .field("methods", &self.methods)
            .field("properties", &self.properties)
            .finish()
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

/// Fluent builder for capability interfaces
#[derive(Debug, Clone)]
pub struct InterfaceBuilder {
    namespace: String,
    name: String,
    methods: Vec<MemberSignature>,
    properties: Vec<PropertyDecl>,
    order: Vec<Declared>,
    extends: Vec<Arc<Interface>>,
}

impl InterfaceBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            methods: Vec::new(),
            properties: Vec::new(),
            order: Vec::new(),
            extends: Vec::new(),
        }
    }

    pub fn method(mut self, signature: MemberSignature) -> Self {
        self.order.push(Declared::Method(self.methods.len()));
        self.methods.push(signature);
        self
    }

    pub fn property(self, name: &str, ty: TypeRef) -> Self {
        self.declare_property(name, ty, true, true)
    }

    pub fn readonly_property(self, name: &str, ty: TypeRef) -> Self {
        self.declare_property(name, ty, true, false)
    }

    pub fn writeonly_property(self, name: &str, ty: TypeRef) -> Self {
        self.declare_property(name, ty, false, true)
    }

    fn declare_property(
        mut self,
        name: &str,
        ty: TypeRef,
        readable: bool,
        writable: bool,
    ) -> Self {
        self.order.push(Declared::Property(self.properties.len()));
        self.properties.push(PropertyDecl {
            name: name.to_string(),
            ty,
            readable,
            writable,
        });
        self
    }

    pub fn extends(mut self, parent: &Arc<Interface>) -> Self {
        self.extends.push(Arc::clone(parent));
        self
    }

    pub fn build(self) -> Arc<Interface> {
        Arc::new(Interface {
            id: InterfaceId::next(),
            namespace: self.namespace,
            name: self.name,
            methods: self.methods,
            properties: self.properties,
            order: self.order,
            extends: RwLock::new(self.extends),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_interface_is_a_singleton() {
        let a = duck_typed_object();
        let b = duck_typed_object();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(a.qualified_name(), "ducktype.IDuckTypedObject");
        assert_eq!(a.properties()[0].name, MARKER_PROPERTY);
        assert!(!a.properties()[0].writable);
    }

    #[test]
    fn test_members_keep_declaration_order() {
        let iface = InterfaceBuilder::new("tests", "IMixed")
            .property("Name", TypeRef::string())
            .method(MemberSignature::new("Greet", vec![], TypeRef::string()))
            .readonly_property("Id", TypeRef::int())
            .build();
        let names: Vec<&str> = iface
            .members()
            .map(|m| match m {
                InterfaceMember::Method(sig) => sig.name.as_str(),
                InterfaceMember::Property(decl) => decl.name.as_str(),
            })
            .collect();
        assert_eq!(names, vec!["Name", "Greet", "Id"]);
        assert_eq!(iface.methods().len(), 1);
        assert_eq!(iface.properties().len(), 2);
    }

    #[test]
    fn test_extend_ignores_duplicates() {
        let base = InterfaceBuilder::new("tests", "IBase").build();
        let child = InterfaceBuilder::new("tests", "IChild").extends(&base).build();
        child.extend(Arc::clone(&base));
        assert_eq!(child.extends().len(), 1);
    }

    #[test]
    fn test_identity_equality() {
        let a = InterfaceBuilder::new("tests", "ISame").build();
        let b = InterfaceBuilder::new("tests", "ISame").build();
        assert_ne!(*a, *b);
        assert_eq!(a.qualified_name(), b.qualified_name());
    }
}
