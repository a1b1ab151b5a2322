//! Signature matcher
//!
//! Structural comparison of capability members against a base type. A member
//! is satisfied by a base method with the same name, the same ordered
//! parameter types and the same generic arity. Return types are not compared
//! here; a divergent return surfaces when the forwarded call returns.

use crate::descriptor::{describe_all, CapabilityShape, DescribedMember};
use crate::error::{DuckError, DuckResult};
use crate::interface::Interface;
use crate::object::{MethodDef, TypeDef};
use crate::types::{MemberSignature, TypeRef};
use crate::values::Value;
use std::sync::Arc;

/// First method of `base` structurally matching `signature`.
pub fn find_method<'a>(base: &'a TypeDef, signature: &MemberSignature) -> Option<&'a MethodDef> {
    base.methods()
        .iter()
        .find(|m| m.signature().matches_shape(signature))
}

/// Whether every member of every requested capability (extended ones
/// included) has a structural match on `base`. Stops at the first miss.
pub fn is_compatible(base: &TypeDef, capabilities: &[Arc<Interface>]) -> bool {
    shape_is_satisfied(base, &describe_all(capabilities))
}

pub fn shape_is_satisfied(base: &TypeDef, shape: &CapabilityShape) -> bool {
    shape
        .members
        .iter()
        .all(|member| find_method(base, &member.signature).is_some())
}

/// Members with no structural match on `base`, in expansion order.
pub fn missing_members(base: &TypeDef, capabilities: &[Arc<Interface>]) -> Vec<DescribedMember> {
    describe_all(capabilities)
        .members
        .into_iter()
        .filter(|member| find_method(base, &member.signature).is_none())
        .collect()
}

/// Call-time check of type arguments and argument values against a signature.
pub fn check_arguments(
    signature: &MemberSignature,
    type_args: &[TypeRef],
    args: &[Value],
) -> DuckResult<()> {
    if type_args.len() != signature.generic_arity() {
        return Err(DuckError::GenericArityMismatch {
            member: signature.name.clone(),
            expected: signature.generic_arity(),
            actual: type_args.len(),
        });
    }
    if args.len() != signature.params.len() {
        return Err(DuckError::ArityMismatch {
            member: signature.name.clone(),
            expected: signature.params.len(),
            actual: args.len(),
        });
    }
    for (index, (param, arg)) in signature.params.iter().zip(args).enumerate() {
        if !arg.conforms_to(param, type_args) {
            return Err(DuckError::ArgumentTypeMismatch {
                member: signature.name.clone(),
                index,
                expected: param.to_string(),
                actual: arg.type_name(),
            });
        }
    }
    Ok(())
}

/// Call-time check of a returned value against the declared return type.
pub fn check_return(
    signature: &MemberSignature,
    type_args: &[TypeRef],
    value: &Value,
) -> DuckResult<()> {
    // Unit returns discard the result, so anything goes
    if signature.return_type.is_unit() || value.conforms_to(&signature.return_type, type_args) {
        Ok(())
    } else {
        Err(DuckError::ReturnTypeMismatch {
            member: signature.name.clone(),
            expected: signature.return_type.to_string(),
            actual: value.type_name(),
        })
    }
}

/// Picks the first candidate whose signature accepts the call.
pub(crate) fn select_overload<'a, T>(
    candidates: impl Iterator<Item = (&'a MemberSignature, T)>,
    type_args: &[TypeRef],
    args: &[Value],
) -> Option<T> {
    candidates
        .filter(|(sig, _)| {
            sig.params.len() == args.len() && sig.generic_arity() == type_args.len()
        })
        .find(|(sig, _)| check_arguments(sig, type_args, args).is_ok())
        .map(|(_, item)| item)
}
