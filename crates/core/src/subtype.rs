//! Structural Subtype Checking
//!
//! `issubtype(left, right)` decides whether values of `left` are acceptable
//! wherever `right` is expected. Both sides are normalized first so builtin
//! spellings and their categories compare equal.
//!
//! # Rules
//!
//! - `right` is `Any`, or `left == right`: accepted
//! - `right` is the null type (and differs from `left`): rejected
//! - `right` expands into a constraint set (bound, constraints, union members,
//!   or itself); an empty set or one containing `Any` accepts everything
//! - `left` is `Any`: rejected
//! - `left` expands into a variant set the same way; an empty set is rejected
//! - otherwise every variant must match at least one constraint
//!
//! Parameterized generics match covariantly when origins agree and argument
//! lists have the same length. A constraint that is an open generic (`List`)
//! or has an empty argument list accepts any arguments.

use crate::TypeExpr;
use std::slice;

/// Check whether `left` is a structural subtype of `right`
pub fn issubtype(left: &TypeExpr, right: &TypeExpr) -> bool {
    let left = left.normalize();
    let right = right.normalize();
    let result = is_subtype_normalized(&left, &right);
    tracing::trace!(%left, %right, result, "subtype check");
    result
}

impl TypeExpr {
    /// Check whether this type is a structural subtype of `other`
    pub fn is_subtype_of(&self, other: &TypeExpr) -> bool {
        issubtype(self, other)
    }

    /// Mutual subtyping, i.e. equality up to normalization
    pub fn is_equivalent_to(&self, other: &TypeExpr) -> bool {
        issubtype(self, other) && issubtype(other, self)
    }
}

fn is_subtype_normalized(left: &TypeExpr, right: &TypeExpr) -> bool {
    if right.is_any() || left == right {
        return true;
    }
    if matches!(right, TypeExpr::NullType) {
        return false;
    }

    let constraints = expand(right);
    if constraints.is_empty() || constraints.iter().any(TypeExpr::is_any) {
        return true;
    }

    if left.is_any() {
        return false;
    }

    let variants = expand(left);
    if variants.is_empty() {
        return false;
    }

    variants.iter().all(|variant| matches_constraints(variant, constraints))
}

/// Top-level expansion: an unconstrained variable expands to the empty set
fn expand(t: &TypeExpr) -> &[TypeExpr] {
    match t.alternatives() {
        Some(alternatives) => alternatives,
        None if matches!(t, TypeExpr::Var(_)) => &[],
        None => slice::from_ref(t),
    }
}

/// Check whether `variant` is covered by any of `constraints`
///
/// Variables and unions survive on either side when they are nested inside
/// another variable or union. A nested variant must have all of its alternatives
/// covered, while a nested constraint is satisfied by any one of its alternatives.
fn matches_constraints(variant: &TypeExpr, constraints: &[TypeExpr]) -> bool {
    if constraints.contains(variant) {
        return true;
    }

    if let Some(inner) = variant.alternatives() {
        return inner.iter().all(|v| matches_constraints(v, constraints));
    }

    let (v_origin, v_args) = match variant {
        TypeExpr::Generic { origin, args } => (Some(origin), args.as_deref()),
        _ => (None, None),
    };

    for constraint in constraints {
        if let Some(inner) = constraint.alternatives() {
            if matches_constraints(variant, inner) {
                return true;
            }
            continue;
        }

        match constraint {
            TypeExpr::Generic { origin: c_origin, args: c_args } if v_origin == Some(c_origin) => {
                let c_args = match c_args.as_deref() {
                    None | Some([]) => return true,
                    Some(c_args) => c_args,
                };
                if let Some(v_args) = v_args
                    && v_args.len() == c_args.len()
                    && v_args.iter().zip(c_args).all(|(v, c)| is_subtype_normalized(v, c))
                {
                    return true;
                }
            }
            TypeExpr::Concrete(c_ctor) if v_origin == Some(c_ctor) => {
                return v_args.is_none_or(<[TypeExpr]>::is_empty);
            }
            _ => {}
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TypeCtor, TypeVarDef};

    fn int() -> TypeExpr {
        TypeExpr::int()
    }

    fn string() -> TypeExpr {
        TypeExpr::string()
    }

    #[test]
    fn test_reflexive_and_any() {
        for t in [int(), string(), TypeExpr::NullType, TypeExpr::list(int()), TypeExpr::open(TypeCtor::Dict)] {
            assert!(issubtype(&t, &t), "{t} should be a subtype of itself");
            assert!(issubtype(&t, &TypeExpr::Any));
            assert!(!issubtype(&TypeExpr::Any, &t));
        }
        assert!(issubtype(&TypeExpr::Any, &TypeExpr::Any));
    }

    #[test]
    fn test_builtin_and_category_spellings_match() {
        assert!(issubtype(&int(), &TypeExpr::Concrete(TypeCtor::Integer)));
        assert!(issubtype(&TypeExpr::Concrete(TypeCtor::Integer), &int()));
        assert!(issubtype(&TypeExpr::Concrete(TypeCtor::List), &TypeExpr::open(TypeCtor::List)));
        assert!(!issubtype(&TypeExpr::bool(), &int()));
    }

    #[test]
    fn test_null_type() {
        assert!(issubtype(&TypeExpr::NullType, &TypeExpr::NullType));
        assert!(!issubtype(&int(), &TypeExpr::NullType));
        assert!(!issubtype(&TypeExpr::NullType, &int()));
        assert!(issubtype(&TypeExpr::NullType, &TypeExpr::optional(int())));
    }

    #[test]
    fn test_union_on_both_sides() {
        let int_or_str = TypeExpr::union(vec![int(), string()]);
        assert!(issubtype(&int(), &int_or_str));
        assert!(!issubtype(&int_or_str, &int()));
        assert!(issubtype(&int_or_str, &TypeExpr::union(vec![int(), string(), TypeExpr::float()])));
        assert!(!issubtype(&TypeExpr::union(vec![int(), TypeExpr::float()]), &int_or_str));
    }

    #[test]
    fn test_bounded_and_constrained_variables() {
        let t = TypeExpr::var(TypeVarDef::bounded("T", int()));
        assert!(issubtype(&t, &int()));
        assert!(issubtype(&int(), &t));
        assert!(!issubtype(&string(), &t));

        let u = TypeExpr::var(TypeVarDef::constrained("U", vec![int(), string()]));
        assert!(issubtype(&string(), &u));
        assert!(!issubtype(&u, &int()));
        assert!(issubtype(&u, &TypeExpr::union(vec![string(), int()])));
    }

    #[test]
    fn test_unconstrained_variable() {
        let t = TypeExpr::var(TypeVarDef::new("T"));
        assert!(issubtype(&int(), &t));
        assert!(issubtype(&TypeExpr::list(int()), &t));
        assert!(!issubtype(&t, &int()));
        assert!(issubtype(&t, &t));
    }

    #[test]
    fn test_nested_variable_of_union() {
        let inner = TypeExpr::var(TypeVarDef::bounded("T", TypeExpr::union(vec![int(), string()])));
        let outer = TypeExpr::union(vec![inner.clone(), TypeExpr::float()]);

        assert!(issubtype(&string(), &outer));
        assert!(issubtype(&TypeExpr::float(), &outer));
        assert!(!issubtype(&TypeExpr::bytes(), &outer));

        let as_variant = TypeExpr::union(vec![inner, TypeExpr::NullType]);
        assert!(issubtype(&as_variant, &TypeExpr::union(vec![int(), string(), TypeExpr::NullType])));
        assert!(!issubtype(&as_variant, &TypeExpr::union(vec![int(), TypeExpr::NullType])));
    }

    #[test]
    fn test_variable_of_variable() {
        let t = TypeVarDef::bounded("T", int());
        let s = TypeExpr::var(TypeVarDef::bounded("S", TypeExpr::Var(t)));
        assert!(issubtype(&s, &int()));
        assert!(issubtype(&int(), &s));
        assert!(!issubtype(&string(), &s));
    }

    #[test]
    fn test_generic_covariance() {
        let list_int = TypeExpr::list(int());
        let list_any = TypeExpr::list(TypeExpr::Any);
        assert!(issubtype(&list_int, &list_any));
        assert!(!issubtype(&list_any, &list_int));
        assert!(!issubtype(&list_int, &TypeExpr::list(string())));
        assert!(!issubtype(&list_int, &TypeExpr::set(int())));

        let pair = TypeExpr::tuple(vec![int(), string()]);
        assert!(issubtype(&pair, &TypeExpr::tuple(vec![TypeExpr::Any, string()])));
        assert!(!issubtype(&pair, &TypeExpr::tuple(vec![int()])));
    }

    #[test]
    fn test_open_generic_is_supertype() {
        let open_list = TypeExpr::open(TypeCtor::List);
        assert!(issubtype(&TypeExpr::list(int()), &open_list));
        assert!(issubtype(&TypeExpr::list(TypeExpr::list(string())), &open_list));
        assert!(issubtype(&TypeExpr::tuple(vec![int()]), &TypeExpr::tuple(vec![])));
        assert!(!issubtype(&open_list, &TypeExpr::list(int())));
    }

    #[test]
    fn test_parameterized_class_against_bare_class() {
        let batch = TypeCtor::Class("Batch".to_string());
        assert!(issubtype(&TypeExpr::open(batch.clone()), &TypeExpr::class("Batch")));
        assert!(!issubtype(&TypeExpr::generic(batch, vec![int()]), &TypeExpr::class("Batch")));
    }

    #[test]
    fn test_method_forms() {
        assert!(int().is_subtype_of(&TypeExpr::Any));
        assert!(int().is_equivalent_to(&TypeExpr::Concrete(TypeCtor::Integer)));
        assert!(!int().is_equivalent_to(&TypeExpr::Any));
    }
}
