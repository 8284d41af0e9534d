use crate::{TypeExpr, issubtype};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The element type bound of a stage class
///
/// Wraps a normalized [`TypeExpr`] and records whether it is fixed, i.e. free of
/// variables, `Any` and argument-less generics at every depth. Equality and hashing
/// only look at the wrapped expression, so independently built params with equal
/// expressions are interchangeable as specialization keys.
#[derive(Debug, Clone)]
pub struct TypeParam {
    expr: TypeExpr,
    fixed: bool,
}

impl TypeParam {
    pub fn new(expr: TypeExpr) -> Self {
        let expr = expr.normalize();
        let fixed = is_fixed(&expr);
        Self { expr, fixed }
    }

    /// The unrestricted bound every root stage starts from
    pub fn any() -> Self {
        Self { expr: TypeExpr::Any, fixed: false }
    }

    pub fn expr(&self) -> &TypeExpr {
        &self.expr
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn is_any(&self) -> bool {
        self.expr.is_any()
    }

    pub fn issubtype(&self, other: &TypeParam) -> bool {
        issubtype(&self.expr, &other.expr)
    }

    pub fn issubtype_expr(&self, other: &TypeExpr) -> bool {
        issubtype(&self.expr, other)
    }
}

fn is_fixed(expr: &TypeExpr) -> bool {
    match expr {
        TypeExpr::Any | TypeExpr::Var(_) => false,
        TypeExpr::Union(members) => members.iter().all(is_fixed),
        TypeExpr::Generic { args, .. } => match args {
            Some(args) if !args.is_empty() => args.iter().all(is_fixed),
            _ => false,
        },
        TypeExpr::NullType | TypeExpr::Concrete(_) => true,
    }
}

impl PartialEq for TypeParam {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl Eq for TypeParam {}

impl Hash for TypeParam {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expr.hash(state);
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

impl From<TypeExpr> for TypeParam {
    fn from(expr: TypeExpr) -> Self {
        Self::new(expr)
    }
}
