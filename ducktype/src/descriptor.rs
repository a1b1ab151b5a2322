//! Capability descriptor
//!
//! Normalises requested interfaces into an ordered member list. Extended
//! interfaces are expanded depth-first before the interface's own members,
//! with a visited set keyed by interface identity so cyclic or diamond
//! extension graphs are walked once. Within an interface, methods and
//! properties keep their declaration order. Properties are split into their getter
//! and setter signatures; a side table keeps the property -> accessor link
//! for property wiring during synthesis.

use crate::interface::{Interface, InterfaceId, InterfaceMember};
use crate::types::{MemberSignature, TypeRef};
use std::collections::HashSet;
use std::sync::Arc;

/// One method-shaped member contributed by an interface.
#[derive(Debug, Clone, PartialEq)]
pub struct DescribedMember {
    pub owner: InterfaceId,
    pub signature: MemberSignature,
    /// Set when the member is a property accessor.
    pub property: Option<String>,
}

/// Property -> accessor association kept alongside the flattened members.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBinding {
    pub owner: InterfaceId,
    pub name: String,
    pub ty: TypeRef,
    pub getter: Option<MemberSignature>,
    pub setter: Option<MemberSignature>,
}

/// Flattened view of one or more capability interfaces.
#[derive(Debug, Clone, Default)]
pub struct CapabilityShape {
    /// Every interface reached, in expansion order.
    pub interfaces: Vec<Arc<Interface>>,
    pub members: Vec<DescribedMember>,
    pub properties: Vec<PropertyBinding>,
}

impl CapabilityShape {
    pub fn interface_ids(&self) -> Vec<InterfaceId> {
        self.interfaces.iter().map(|i| i.id()).collect()
    }

    pub fn members_of(&self, owner: InterfaceId) -> impl Iterator<Item = &DescribedMember> {
        self.members.iter().filter(move |m| m.owner == owner)
    }
}

/// Depth-first expansion of the requested interfaces, extended ones first.
///
/// The visited set is shared across the whole request: an interface reached
/// through two requested capabilities is listed once.
pub fn expand(capabilities: &[Arc<Interface>]) -> Vec<Arc<Interface>> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();

    fn visit(
        interface: &Arc<Interface>,
        visited: &mut HashSet<InterfaceId>,
        order: &mut Vec<Arc<Interface>>,
    ) {
        if !visited.insert(interface.id()) {
            return;
        }
        for parent in interface.extends() {
            visit(&parent, visited, order);
        }
        order.push(Arc::clone(interface));
    }

    for capability in capabilities {
        visit(capability, &mut visited, &mut order);
    }
    order
}

/// Describe a single capability interface.
pub fn describe(capability: &Arc<Interface>) -> CapabilityShape {
    describe_all(std::slice::from_ref(capability))
}

/// Describe a whole capability request.
pub fn describe_all(capabilities: &[Arc<Interface>]) -> CapabilityShape {
    let interfaces = expand(capabilities);
    let mut members = Vec::new();
    let mut properties = Vec::new();

    for interface in &interfaces {
        let owner = interface.id();

        for member in interface.members() {
            let property = match member {
                InterfaceMember::Method(signature) => {
                    members.push(DescribedMember {
                        owner,
                        signature: signature.clone(),
                        property: None,
                    });
                    continue;
                }
                InterfaceMember::Property(property) => property,
            };

            let getter = property
                .readable
                .then(|| MemberSignature::getter(&property.name, property.ty.clone()));
            let setter = property
                .writable
                .then(|| MemberSignature::setter(&property.name, property.ty.clone()));

            for accessor in getter.iter().chain(setter.iter()) {
                members.push(DescribedMember {
                    owner,
                    signature: accessor.clone(),
                    property: Some(property.name.clone()),
                });
            }

            properties.push(PropertyBinding {
                owner,
                name: property.name.clone(),
                ty: property.ty.clone(),
                getter,
                setter,
            });
        }
    }

    CapabilityShape {
        interfaces,
        members,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::InterfaceBuilder;
    use pretty_assertions::assert_eq;

    fn names(shape: &CapabilityShape) -> Vec<String> {
        shape
            .members
            .iter()
            .map(|m| m.signature.name.clone())
            .collect()
    }

    #[test]
    fn test_properties_split_into_accessors() {
        let iface = InterfaceBuilder::new("tests", "INamed")
            .property("Name", TypeRef::string())
            .readonly_property("Id", TypeRef::int())
            .build();

        let shape = describe(&iface);
        assert_eq!(names(&shape), vec!["get_Name", "set_Name", "get_Id"]);
        assert_eq!(shape.properties.len(), 2);
        assert!(shape.properties[1].setter.is_none());
        assert_eq!(shape.members[0].property.as_deref(), Some("Name"));
    }

    #[test]
    fn test_methods_and_properties_interleave_as_declared() {
        let iface = InterfaceBuilder::new("tests", "IGreeter")
            .property("Name", TypeRef::string())
            .method(MemberSignature::new("Greet", vec![], TypeRef::string()))
            .writeonly_property("Mood", TypeRef::string())
            .build();

        let shape = describe(&iface);
        assert_eq!(
            names(&shape),
            vec!["get_Name", "set_Name", "Greet", "set_Mood"]
        );
        assert_eq!(shape.members[2].property, None);
        let bound: Vec<&str> = shape.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(bound, vec!["Name", "Mood"]);
    }

    #[test]
    fn test_extended_members_come_first() {
        let base = InterfaceBuilder::new("tests", "IBase")
            .method(MemberSignature::new("Base", vec![], TypeRef::Unit))
            .build();
        let child = InterfaceBuilder::new("tests", "IChild")
            .extends(&base)
            .method(MemberSignature::new("Child", vec![], TypeRef::Unit))
            .build();

        let shape = describe(&child);
        assert_eq!(names(&shape), vec!["Base", "Child"]);
        assert_eq!(shape.interface_ids(), vec![base.id(), child.id()]);
    }

    #[test]
    fn test_cyclic_extension_terminates() {
        let a = InterfaceBuilder::new("tests", "IA")
            .method(MemberSignature::new("A", vec![], TypeRef::Unit))
            .build();
        let b = InterfaceBuilder::new("tests", "IB")
            .extends(&a)
            .method(MemberSignature::new("B", vec![], TypeRef::Unit))
            .build();
        a.extend(Arc::clone(&b));

        let shape = describe(&a);
        assert_eq!(names(&shape), vec!["B", "A"]);
    }

    #[test]
    fn test_diamond_is_expanded_once() {
        let root = InterfaceBuilder::new("tests", "IRoot")
            .method(MemberSignature::new("Root", vec![], TypeRef::Unit))
            .build();
        let left = InterfaceBuilder::new("tests", "ILeft").extends(&root).build();
        let right = InterfaceBuilder::new("tests", "IRight").extends(&root).build();

        let shape = describe_all(&[left.clone(), right.clone()]);
        assert_eq!(names(&shape), vec!["Root"]);
        assert_eq!(
            shape.interface_ids(),
            vec![root.id(), left.id(), right.id()]
        );
    }
}
