//! Type references and member signatures
//!
//! Signatures are the unit of structural matching. A member is identified by
//! its name, its ordered parameter types and its generic arity. Generic
//! parameters are referenced positionally (`GenericParam(i)`), which makes two
//! members with differently named type parameters compare equal as long as
//! they use them in the same positions.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the synthetic getter generated for a property.
pub const GETTER_PREFIX: &str = "get_";
/// Prefix of the synthetic setter generated for a property.
pub const SETTER_PREFIX: &str = "set_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Bool,
    Int,
    Float,
    String,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Bool => write!(f, "bool"),
            PrimitiveType::Int => write!(f, "int"),
            PrimitiveType::Float => write!(f, "float"),
            PrimitiveType::String => write!(f, "string"),
        }
    }
}

/// Reference to a type as it appears in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// "No value" return.
    Unit,
    Any,
    Primitive(PrimitiveType),
    /// A declared type or interface, by qualified name.
    Named(String),
    Vector(Box<TypeRef>),
    /// Positional reference to a generic parameter of the enclosing member.
    GenericParam(usize),
}

impl TypeRef {
    pub fn bool() -> Self {
        TypeRef::Primitive(PrimitiveType::Bool)
    }

    pub fn int() -> Self {
        TypeRef::Primitive(PrimitiveType::Int)
    }

    pub fn float() -> Self {
        TypeRef::Primitive(PrimitiveType::Float)
    }

    pub fn string() -> Self {
        TypeRef::Primitive(PrimitiveType::String)
    }

    pub fn named(qualified_name: &str) -> Self {
        TypeRef::Named(qualified_name.to_string())
    }

    pub fn vector(element: TypeRef) -> Self {
        TypeRef::Vector(Box::new(element))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeRef::Unit)
    }

    /// Whether this type mentions a generic parameter anywhere.
    pub fn is_open(&self) -> bool {
        match self {
            TypeRef::GenericParam(_) => true,
            TypeRef::Vector(inner) => inner.is_open(),
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Unit => write!(f, "unit"),
            TypeRef::Any => write!(f, "any"),
            TypeRef::Primitive(p) => write!(f, "{}", p),
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Vector(inner) => write!(f, "[{}]", inner),
            TypeRef::GenericParam(index) => write!(f, "'{}", index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

/// Declaration of a generic parameter. Only re-declared on adapters, never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenericParamDef {
    pub name: String,
    pub variance: Variance,
    pub constraints: Vec<TypeRef>,
}

impl GenericParamDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variance: Variance::Invariant,
            constraints: Vec::new(),
        }
    }

    pub fn with_variance(mut self, variance: Variance) -> Self {
        self.variance = variance;
        self
    }

    pub fn with_constraint(mut self, constraint: TypeRef) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Signature of a method-shaped member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberSignature {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub generics: Vec<GenericParamDef>,
}

impl MemberSignature {
    pub fn new(name: &str, params: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            params,
            return_type,
            generics: Vec::new(),
        }
    }

    pub fn with_generic(mut self, param: GenericParamDef) -> Self {
        self.generics.push(param);
        self
    }

    /// `get_<property>` taking nothing and returning the property type.
    pub fn getter(property: &str, ty: TypeRef) -> Self {
        Self::new(&getter_name(property), Vec::new(), ty)
    }

    /// `set_<property>` taking the property type and returning nothing.
    pub fn setter(property: &str, ty: TypeRef) -> Self {
        Self::new(&setter_name(property), vec![ty], TypeRef::Unit)
    }

    pub fn generic_arity(&self) -> usize {
        self.generics.len()
    }

    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }

    /// Structural identity: same name, same ordered parameter types, same generic arity.
    /// The return type is not part of it.
    pub fn matches_shape(&self, other: &MemberSignature) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.generic_arity() == other.generic_arity()
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.is_generic() {
            write!(f, "<{}>", self.generics.iter().map(|g| &g.name).join(", "))?;
        }
        write!(
            f,
            "({}) -> {}",
            self.params.iter().join(", "),
            self.return_type
        )
    }
}

pub fn getter_name(property: &str) -> String {
    format!("{}{}", GETTER_PREFIX, property)
}

pub fn setter_name(property: &str) -> String {
    format!("{}{}", SETTER_PREFIX, property)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_parameter_names_do_not_affect_shape() {
        let a = MemberSignature::new(
            "Echo",
            vec![TypeRef::GenericParam(0)],
            TypeRef::GenericParam(0),
        )
        .with_generic(GenericParamDef::new("T"));
        let b = MemberSignature::new(
            "Echo",
            vec![TypeRef::GenericParam(0)],
            TypeRef::GenericParam(0),
        )
        .with_generic(GenericParamDef::new("TItem").with_variance(Variance::Covariant));

        assert!(a.matches_shape(&b));
    }

    #[test]
    fn test_return_type_is_ignored_by_shape() {
        let a = MemberSignature::new("Count", vec![], TypeRef::int());
        let b = MemberSignature::new("Count", vec![], TypeRef::string());
        assert!(a.matches_shape(&b));

        let c = MemberSignature::new("Count", vec![TypeRef::int()], TypeRef::int());
        assert!(!a.matches_shape(&c));
    }

    #[test]
    fn test_accessor_signatures() {
        let get = MemberSignature::getter("Name", TypeRef::string());
        assert_eq!(get.name, "get_Name");
        assert!(get.params.is_empty());

        let set = MemberSignature::setter("Name", TypeRef::string());
        assert_eq!(set.name, "set_Name");
        assert_eq!(set.params, vec![TypeRef::string()]);
        assert!(set.return_type.is_unit());
    }

    #[test]
    fn test_display() {
        let sig = MemberSignature::new(
            "Map",
            vec![TypeRef::vector(TypeRef::GenericParam(0))],
            TypeRef::int(),
        )
        .with_generic(GenericParamDef::new("T"));
        assert_eq!(sig.to_string(), "Map<T>(['0]) -> int");
    }
}
