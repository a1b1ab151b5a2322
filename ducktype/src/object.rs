//! Base types and their instances
//!
//! A `TypeDef` is the runtime description of a wrapped object's type: its
//! identity, fields, methods and properties. Properties are desugared when the
//! type is built into `get_<Name>` / `set_<Name>` methods backed by a field of
//! the same name, so everything the matcher sees is a method.

use crate::error::{DuckError, DuckResult};
use crate::matcher::select_overload;
use crate::types::{getter_name, setter_name, MemberSignature, TypeRef};
use crate::values::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

static NEXT_BASE_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseTypeId(u64);

impl BaseTypeId {
    fn next() -> Self {
        BaseTypeId(NEXT_BASE_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Arguments of one call: call-site type arguments and positional values.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub type_args: &'a [TypeRef],
    pub args: &'a [Value],
}

impl<'a> Invocation<'a> {
    pub fn new(args: &'a [Value]) -> Self {
        Self {
            type_args: &[],
            args,
        }
    }

    pub fn generic(type_args: &'a [TypeRef], args: &'a [Value]) -> Self {
        Self { type_args, args }
    }

    pub fn arg(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }
}

/// Executable body of a method.
pub type MethodFn = Arc<dyn Fn(&Object, Invocation<'_>) -> DuckResult<Value> + Send + Sync>;

#[derive(Clone)]
pub struct MethodDef {
    signature: MemberSignature,
    body: MethodFn,
}

impl MethodDef {
    pub fn new(signature: MemberSignature, body: MethodFn) -> Self {
        Self { signature, body }
    }

    pub fn signature(&self) -> &MemberSignature {
        &self.signature
    }

    pub fn body(&self) -> &MethodFn {
        &self.body
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodDef({})", self.signature)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeRef,
    pub readable: bool,
    pub writable: bool,
}

/// Runtime description of a concrete type whose instances can be wrapped.
pub struct TypeDef {
    id: BaseTypeId,
    namespace: String,
    name: String,
    fields: IndexMap<String, Value>,
    methods: Vec<MethodDef>,
    properties: Vec<PropertyDef>,
    default_constructor: bool,
}

impl TypeDef {
    pub fn id(&self) -> BaseTypeId {
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

    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor
    }

    /// Runs the parameterless constructor: every field takes its declared default.
    pub fn instantiate(self: &Arc<Self>) -> DuckResult<ObjectRef> {
        if !self.default_constructor {
            return Err(DuckError::MissingDefaultConstructor {
                type_name: self.qualified_name(),
            });
        }
        Ok(Arc::new(Object {
            ty: Arc::clone(self),
            fields: RwLock::new(self.fields.clone()),
        }))
    }

    /// Field-initialising constructor, available whether or not a default one exists.
    pub fn construct<'a>(
        self: &Arc<Self>,
        values: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> DuckResult<ObjectRef> {
        let mut fields = self.fields.clone();
        for (name, value) in values {
            match fields.get_mut(name) {
                Some(slot) => *slot = value,
                None => {
                    return Err(DuckError::UnknownField {
                        type_name: self.qualified_name(),
                        field: name.to_string(),
                    })
                }
            }
        }
        Ok(Arc::new(Object {
            ty: Arc::clone(self),
            fields: RwLock::new(fields),
        }))
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("id", &self.id)
            .field("name", &self.qualified_name())
            .field("methods", &self.methods)
            .field("default_constructor", &self.default_constructor)
            .finish()
    }
}

/// Fluent builder for base types.
pub struct TypeDefBuilder {
    namespace: String,
    name: String,
    fields: IndexMap<String, Value>,
    methods: Vec<MethodDef>,
    properties: Vec<PropertyDef>,
    default_constructor: bool,
}

impl TypeDefBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            fields: IndexMap::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            default_constructor: true,
        }
    }

    /// Declare a plain field with its default value.
    pub fn field(mut self, name: &str, default: Value) -> Self {
        self.fields.insert(name.to_string(), default);
        self
    }

    /// Field-backed property with both accessors.
    pub fn property(self, name: &str, ty: TypeRef) -> Self {
        self.accessors(name, ty, true)
    }

    /// Field-backed property with a getter only. The field is still settable
    /// through `TypeDef::construct`.
    pub fn readonly_property(self, name: &str, ty: TypeRef) -> Self {
        self.accessors(name, ty, false)
    }

    fn accessors(mut self, name: &str, ty: TypeRef, writable: bool) -> Self {
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| Value::default_for(&ty));

        let field = name.to_string();
        self.methods.push(MethodDef::new(
            MemberSignature::getter(name, ty.clone()),
            Arc::new(move |obj: &Object, _inv: Invocation<'_>| obj.get_field(&field)),
        ));

        if writable {
            let field = name.to_string();
            self.methods.push(MethodDef::new(
                MemberSignature::setter(name, ty.clone()),
                Arc::new(move |obj: &Object, inv: Invocation<'_>| {
                    let value = inv.arg(0).cloned().unwrap_or(Value::Nil);
                    obj.set_field(&field, value)?;
                    Ok(Value::Nil)
                }),
            ));
        }

        self.properties.push(PropertyDef {
            name: name.to_string(),
            ty,
            readable: true,
            writable,
        });
        self
    }

    pub fn method<F>(mut self, signature: MemberSignature, body: F) -> Self
    where
        F: Fn(&Object, Invocation<'_>) -> DuckResult<Value> + Send + Sync + 'static,
    {
        self.methods.push(MethodDef::new(signature, Arc::new(body)));
        self
    }

    pub fn without_default_constructor(mut self) -> Self {
        self.default_constructor = false;
        self
    }

    pub fn build(self) -> Arc<TypeDef> {
        Arc::new(TypeDef {
            id: BaseTypeId::next(),
            namespace: self.namespace,
            name: self.name,
            fields: self.fields,
            methods: self.methods,
            properties: self.properties,
            default_constructor: self.default_constructor,
        })
    }
}

/// Shared handle to a live instance.
pub type ObjectRef = Arc<Object>;

/// An instance of a `TypeDef`.
pub struct Object {
    ty: Arc<TypeDef>,
    fields: RwLock<IndexMap<String, Value>>,
}

impl Object {
    pub fn type_def(&self) -> &Arc<TypeDef> {
        &self.ty
    }

    pub fn get_field(&self, name: &str) -> DuckResult<Value> {
        let fields = self.fields.read().map_err(DuckError::poisoned)?;
        fields.get(name).cloned().ok_or_else(|| DuckError::UnknownField {
            type_name: self.ty.qualified_name(),
            field: name.to_string(),
        })
    }

    pub fn set_field(&self, name: &str, value: Value) -> DuckResult<()> {
        let mut fields = self.fields.write().map_err(DuckError::poisoned)?;
        match fields.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(DuckError::UnknownField {
                type_name: self.ty.qualified_name(),
                field: name.to_string(),
            }),
        }
    }

    /// Direct (non-adapted) call of one of this object's own methods.
    pub fn call(&self, member: &str, args: &[Value]) -> DuckResult<Value> {
        self.call_generic(member, &[], args)
    }

    pub fn call_generic(
        &self,
        member: &str,
        type_args: &[TypeRef],
        args: &[Value],
    ) -> DuckResult<Value> {
        let candidates = self
            .ty
            .methods
            .iter()
            .filter(|m| m.signature.name == member)
            .map(|m| (&m.signature, m));
        let method = select_overload(candidates, type_args, args).ok_or_else(|| {
            DuckError::MemberNotFound {
                type_name: self.ty.qualified_name(),
                member: member.to_string(),
            }
        })?;
        (method.body)(self, Invocation::generic(type_args, args))
    }

    /// Reads a property through its getter.
    pub fn get(&self, property: &str) -> DuckResult<Value> {
        self.call(&getter_name(property), &[])
    }

    /// Writes a property through its setter.
    pub fn set(&self, property: &str, value: impl Into<Value>) -> DuckResult<()> {
        self.call(&setter_name(property), &[value.into()])?;
        Ok(())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.ty.qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Arc<TypeDef> {
        TypeDefBuilder::new("tests", "Person")
            .property("Name", TypeRef::string())
            .readonly_property("Id", TypeRef::int())
            .method(
                MemberSignature::new("Greet", vec![TypeRef::string()], TypeRef::string()),
                |obj, inv| {
                    let name = obj.get_field("Name")?;
                    let greeting = inv.arg(0).and_then(Value::as_str).unwrap_or("Hello");
                    Ok(Value::String(format!(
                        "{} {}",
                        greeting,
                        name.as_str().unwrap_or_default()
                    )))
                },
            )
            .build()
    }

    #[test]
    fn test_properties_are_desugared_into_methods() {
        let ty = person();
        let names: Vec<&str> = ty.methods().iter().map(|m| m.signature().name.as_str()).collect();
        assert_eq!(names, vec!["get_Name", "set_Name", "get_Id", "Greet"]);
    }

    #[test]
    fn test_unset_properties_start_at_type_defaults() {
        let ty = TypeDefBuilder::new("tests", "Counter")
            .field("Step", Value::Integer(5))
            .property("Step", TypeRef::int())
            .property("Enabled", TypeRef::bool())
            .build();
        let obj = ty.instantiate().unwrap();
        assert_eq!(obj.get("Step").unwrap(), Value::Integer(5));
        assert_eq!(obj.get("Enabled").unwrap(), Value::Boolean(false));
        assert!(person().instantiate().unwrap().get("Name").unwrap().is_nil());
    }

    #[test]
    fn test_property_round_trip_through_accessors() {
        let obj = person().instantiate().unwrap();
        obj.set("Name", "Ada").unwrap();
        assert_eq!(obj.get("Name").unwrap(), Value::from("Ada"));
        assert_eq!(
            obj.call("Greet", &[Value::from("Hi")]).unwrap(),
            Value::from("Hi Ada")
        );
    }

    #[test]
    fn test_readonly_property_has_no_setter() {
        let obj = person()
            .construct([("Id", Value::Integer(7))])
            .unwrap();
        assert_eq!(obj.get("Id").unwrap(), Value::Integer(7));
        assert!(matches!(
            obj.set("Id", 8i64),
            Err(DuckError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn test_instantiate_requires_default_constructor() {
        let ty = TypeDefBuilder::new("tests", "Sealed")
            .without_default_constructor()
            .build();
        assert!(matches!(
            ty.instantiate(),
            Err(DuckError::MissingDefaultConstructor { .. })
        ));
        assert!(ty.construct(std::iter::empty()).is_ok());
    }

    #[test]
    fn test_construct_rejects_unknown_fields() {
        let err = person().construct([("Age", Value::Integer(1))]).unwrap_err();
        assert_eq!(
            err,
            DuckError::UnknownField {
                type_name: "tests.Person".to_string(),
                field: "Age".to_string()
            }
        );
    }

    #[test]
    fn test_type_ids_are_unique() {
        assert_ne!(person().id(), person().id());
    }
}
