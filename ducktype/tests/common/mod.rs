// Shared fixtures for the integration tests
#![allow(dead_code)]

use ducktype::{
    AdapterRegistry, DefaultAdapterFactory, GenericParamDef, Interface, InterfaceBuilder,
    MemberSignature, ObjectRef, TypeDef, TypeDefBuilder, TypeRef, Value,
};
use std::sync::Arc;

pub const MODELS: &str = "Tests.Models";
pub const CONTRACTS: &str = "Tests.Contracts";

/// A factory over its own registry, so tests do not share cached types.
pub fn isolated_factory() -> DefaultAdapterFactory {
    DefaultAdapterFactory::new().with_registry(Arc::new(AdapterRegistry::new()))
}

pub fn simple_type() -> Arc<TypeDef> {
    TypeDefBuilder::new(MODELS, "Simple")
        .property("Name", TypeRef::string())
        .build()
}

pub fn simple(name: &str) -> ObjectRef {
    simple_type()
        .construct([("Name", Value::from(name))])
        .expect("Simple has a Name field")
}

pub fn simple_duck() -> Arc<Interface> {
    InterfaceBuilder::new(CONTRACTS, "ISimpleDuck")
        .property("Name", TypeRef::string())
        .build()
}

pub fn multiple_type() -> Arc<TypeDef> {
    TypeDefBuilder::new(MODELS, "Multiple")
        .property("Name", TypeRef::string())
        .property("Address", TypeRef::string())
        .property("Phone", TypeRef::string())
        .build()
}

pub fn multiple_duck_1() -> Arc<Interface> {
    InterfaceBuilder::new(CONTRACTS, "IMultipleDuck1")
        .property("Name", TypeRef::string())
        .property("Address", TypeRef::string())
        .build()
}

pub fn multiple_duck_2() -> Arc<Interface> {
    InterfaceBuilder::new(CONTRACTS, "IMultipleDuck2")
        .property("Phone", TypeRef::string())
        .build()
}

/// A calculator with an overloaded, a void and a generic method.
pub fn calculator_type() -> Arc<TypeDef> {
    TypeDefBuilder::new(MODELS, "Calculator")
        .field("Total", Value::Integer(0))
        .method(
            MemberSignature::new("Add", vec![TypeRef::int(), TypeRef::int()], TypeRef::int()),
            |_, inv| {
                let a = inv.arg(0).and_then(Value::as_integer).unwrap_or_default();
                let b = inv.arg(1).and_then(Value::as_integer).unwrap_or_default();
                Ok(Value::Integer(a + b))
            },
        )
        .method(
            MemberSignature::new("Accumulate", vec![TypeRef::int()], TypeRef::int()),
            |obj, inv| {
                let total = obj.get_field("Total")?.as_integer().unwrap_or_default();
                let next = total + inv.arg(0).and_then(Value::as_integer).unwrap_or_default();
                obj.set_field("Total", Value::Integer(next))?;
                Ok(Value::Integer(next))
            },
        )
        .method(
            MemberSignature::new(
                "Identity",
                vec![TypeRef::GenericParam(0)],
                TypeRef::GenericParam(0),
            )
            .with_generic(GenericParamDef::new("T")),
            |_, inv| Ok(inv.arg(0).cloned().unwrap_or(Value::Nil)),
        )
        .method(
            MemberSignature::new("Describe", vec![], TypeRef::string()),
            |_, _| Ok(Value::Integer(42)),
        )
        .build()
}

pub fn calculator_duck() -> Arc<Interface> {
    InterfaceBuilder::new(CONTRACTS, "ICalculator")
        .method(MemberSignature::new(
            "Add",
            vec![TypeRef::int(), TypeRef::int()],
            TypeRef::int(),
        ))
        .method(MemberSignature::new(
            "Accumulate",
            vec![TypeRef::int()],
            TypeRef::Unit,
        ))
        .method(
            MemberSignature::new(
                "Identity",
                vec![TypeRef::GenericParam(0)],
                TypeRef::GenericParam(0),
            )
            .with_generic(GenericParamDef::new("TValue")),
        )
        .method(MemberSignature::new("Describe", vec![], TypeRef::string()))
        .build()
}
