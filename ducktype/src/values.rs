// Runtime value system
// Values are what flows through forwarded calls: arguments, results and fields.

use crate::adapter::Adapter;
use crate::object::ObjectRef;
use crate::types::{PrimitiveType, TypeRef};
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Vector(Vec<Value>),
    Object(ObjectRef),
    Adapter(Adapter),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            // Reference types compare by identity
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Adapter(a), Value::Adapter(b)) => Adapter::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Vector(v) => write!(f, "[{}]", v.iter().join(" ")),
            Value::Object(o) => write!(f, "#<{}>", o.type_def().qualified_name()),
            Value::Adapter(a) => write!(f, "#<adapter {}>", a.adapter_type().name()),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Boolean(_) => "bool".to_string(),
            Value::Integer(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Vector(_) => "vector".to_string(),
            Value::Object(o) => o.type_def().qualified_name(),
            Value::Adapter(a) => a.adapter_type().name().to_string(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_adapter(&self) -> Option<&Adapter> {
        match self {
            Value::Adapter(a) => Some(a),
            _ => None,
        }
    }

    /// Zero value of a declared type; reference-like types start as nil.
    pub fn default_for(ty: &TypeRef) -> Value {
        match ty {
            TypeRef::Primitive(PrimitiveType::Bool) => Value::Boolean(false),
            TypeRef::Primitive(PrimitiveType::Int) => Value::Integer(0),
            TypeRef::Primitive(PrimitiveType::Float) => Value::Float(0.0),
            _ => Value::Nil,
        }
    }

    /// Call-time conformance of a value to a declared type.
    ///
    /// `type_args` binds `GenericParam` positions; an unbound position accepts anything.
    pub fn conforms_to(&self, ty: &TypeRef, type_args: &[TypeRef]) -> bool {
        match ty {
            TypeRef::Any => true,
            TypeRef::Unit => self.is_nil(),
            TypeRef::GenericParam(index) => match type_args.get(*index) {
                Some(bound) if !bound.is_open() => self.conforms_to(bound, &[]),
                _ => true,
            },
            TypeRef::Primitive(p) => match (p, self) {
                (PrimitiveType::Bool, Value::Boolean(_)) => true,
                (PrimitiveType::Int, Value::Integer(_)) => true,
                (PrimitiveType::Float, Value::Float(_)) => true,
                (PrimitiveType::String, Value::String(_) | Value::Nil) => true,
                _ => false,
            },
            TypeRef::Vector(element) => match self {
                Value::Nil => true,
                Value::Vector(items) => items.iter().all(|v| v.conforms_to(element, type_args)),
                _ => false,
            },
            TypeRef::Named(name) => match self {
                Value::Nil => true,
                Value::Object(o) => o.type_def().qualified_name() == *name,
                Value::Adapter(a) => a.adapter_type().implements_named(name),
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<Adapter> for Value {
    fn from(a: Adapter) -> Self {
        Value::Adapter(a)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Vector(items.into_iter().map(Into::into).collect())
    }
}
