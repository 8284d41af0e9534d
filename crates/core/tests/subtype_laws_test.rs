//! Subtype Law Tests
//!
//! Checks the algebraic properties of `issubtype` over a sample of type
//! expressions covering every constructor of the model.

use pipetype_core::{TypeCtor, TypeExpr, TypeVarDef, issubtype};

fn samples() -> Vec<TypeExpr> {
    let t = TypeVarDef::bounded("T", TypeExpr::union(vec![TypeExpr::int(), TypeExpr::string()]));
    vec![
        TypeExpr::int(),
        TypeExpr::bool(),
        TypeExpr::float(),
        TypeExpr::complex(),
        TypeExpr::string(),
        TypeExpr::NullType,
        TypeExpr::class("Record"),
        TypeExpr::list(TypeExpr::int()),
        TypeExpr::list(TypeExpr::Any),
        TypeExpr::open(TypeCtor::List),
        TypeExpr::dict(TypeExpr::string(), TypeExpr::list(TypeExpr::float())),
        TypeExpr::tuple(vec![TypeExpr::int(), TypeExpr::string()]),
        TypeExpr::tuple(vec![]),
        TypeExpr::optional(TypeExpr::string()),
        TypeExpr::Var(t.clone()),
        TypeExpr::list(TypeExpr::Var(t)),
        TypeExpr::Var(TypeVarDef::constrained("U", vec![TypeExpr::bytes(), TypeExpr::float()])),
    ]
}

#[test]
fn test_reflexivity() {
    for x in samples().into_iter().chain([TypeExpr::Any, TypeExpr::var(TypeVarDef::new("T_co"))]) {
        assert!(issubtype(&x, &x), "{x} should be a subtype of itself");
    }
}

#[test]
fn test_any_absorption() {
    for x in samples() {
        assert!(issubtype(&x, &TypeExpr::Any), "{x} <: Any");
        assert!(!issubtype(&TypeExpr::Any, &x), "Any should not be a subtype of {x}");
    }
}

#[test]
fn test_union_on_the_left_is_conjunction() {
    let all = samples();
    for a in &all {
        for b in &all {
            for c in &all {
                let union = TypeExpr::union(vec![a.clone(), b.clone()]);
                assert_eq!(
                    issubtype(&union, c),
                    issubtype(a, c) && issubtype(b, c),
                    "Union[{a}, {b}] <: {c}"
                );
            }
        }
    }
}

#[test]
fn test_union_on_the_right_is_disjunction_for_leaves() {
    let leaves = [
        TypeExpr::int(),
        TypeExpr::string(),
        TypeExpr::NullType,
        TypeExpr::list(TypeExpr::int()),
        TypeExpr::tuple(vec![TypeExpr::float()]),
    ];
    let all = samples();
    for a in &leaves {
        for b in &all {
            for c in &all {
                let union = TypeExpr::union(vec![b.clone(), c.clone()]);
                assert_eq!(
                    issubtype(a, &union),
                    issubtype(a, b) || issubtype(a, c),
                    "{a} <: Union[{b}, {c}]"
                );
            }
        }
    }
}

#[test]
fn test_generic_covariance() {
    let all = samples();
    for origin in [TypeCtor::List, TypeCtor::Set, TypeCtor::Iterator, TypeCtor::Class("Batch".to_string())] {
        for a in &all {
            for b in &all {
                let ga = TypeExpr::generic(origin.clone(), vec![a.clone()]);
                let gb = TypeExpr::generic(origin.clone(), vec![b.clone()]);
                assert_eq!(issubtype(&ga, &gb), issubtype(a, b), "{ga} <: {gb}");
            }
        }
    }
}

#[test]
fn test_open_generic_is_supertype() {
    for a in samples() {
        for origin in [TypeCtor::List, TypeCtor::Dict, TypeCtor::Tuple] {
            let parameterized = TypeExpr::generic(origin.clone(), vec![a.clone()]);
            assert!(issubtype(&parameterized, &TypeExpr::open(origin.clone())));
            assert!(issubtype(&parameterized, &TypeExpr::Concrete(origin)));
        }
    }
}

#[test]
fn test_builtin_spelling_never_blocks_a_match() {
    let spelled = TypeExpr::dict(TypeExpr::string(), TypeExpr::list(TypeExpr::int()));
    let categories = TypeExpr::dict(
        TypeExpr::string(),
        TypeExpr::list(TypeExpr::Concrete(TypeCtor::Integer)),
    );
    assert!(issubtype(&spelled, &categories));
    assert!(issubtype(&categories, &spelled));
    assert!(issubtype(&TypeExpr::Concrete(TypeCtor::Tuple), &TypeExpr::open(TypeCtor::Tuple)));
    assert!(issubtype(&TypeExpr::float(), &TypeExpr::Concrete(TypeCtor::Real)));
}
