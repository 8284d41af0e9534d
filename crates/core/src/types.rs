use std::{fmt, slice};

/// Nominal heads of type expressions
///
/// Builtin spellings (`Bool`, `Int`, `Float`, `Complex`) are what authors write;
/// the category variants (`Boolean`, `Integer`, `Real`, `ComplexNumber`) are what
/// normalization maps them to before any comparison. Container heads appear either
/// as a bare builtin (`Concrete(List)`, spelled `list`) or as the origin of a
/// [`TypeExpr::Generic`] (spelled `List[...]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeCtor {
    Bool,
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    Boolean,
    Integer,
    Real,
    ComplexNumber,
    Dict,
    List,
    Set,
    Tuple,
    Iterator,
    Class(String),
}

impl fmt::Display for TypeCtor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCtor::Bool => write!(f, "bool"),
            TypeCtor::Int => write!(f, "int"),
            TypeCtor::Float => write!(f, "float"),
            TypeCtor::Complex => write!(f, "complex"),
            TypeCtor::Str => write!(f, "str"),
            TypeCtor::Bytes => write!(f, "bytes"),
            TypeCtor::Boolean => write!(f, "Boolean"),
            TypeCtor::Integer => write!(f, "Integer"),
            TypeCtor::Real => write!(f, "Real"),
            TypeCtor::ComplexNumber => write!(f, "Complex"),
            TypeCtor::Dict => write!(f, "dict"),
            TypeCtor::List => write!(f, "list"),
            TypeCtor::Set => write!(f, "set"),
            TypeCtor::Tuple => write!(f, "tuple"),
            TypeCtor::Iterator => write!(f, "iterator"),
            TypeCtor::Class(name) => write!(f, "{name}"),
        }
    }
}

impl TypeCtor {
    /// Whether this head is a builtin container that normalizes into an open generic
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            TypeCtor::Dict | TypeCtor::List | TypeCtor::Set | TypeCtor::Tuple | TypeCtor::Iterator
        )
    }

    /// Whether this head denotes one of the integral categories
    pub fn is_integral(&self) -> bool {
        matches!(self, TypeCtor::Boolean | TypeCtor::Integer)
    }

    /// Category a builtin scalar spelling normalizes to, if any
    fn category(&self) -> Option<TypeCtor> {
        match self {
            TypeCtor::Bool => Some(TypeCtor::Boolean),
            TypeCtor::Int => Some(TypeCtor::Integer),
            TypeCtor::Float => Some(TypeCtor::Real),
            TypeCtor::Complex => Some(TypeCtor::ComplexNumber),
            _ => None,
        }
    }

    /// Spelling used when this head is the origin of a parameterized generic
    pub fn generic_name(&self) -> String {
        match self {
            TypeCtor::Dict => "Dict".to_string(),
            TypeCtor::List => "List".to_string(),
            TypeCtor::Set => "Set".to_string(),
            TypeCtor::Tuple => "Tuple".to_string(),
            TypeCtor::Iterator => "Iterator".to_string(),
            other => other.to_string(),
        }
    }
}

/// A type variable with an optional bound or a list of constraints
///
/// A bound takes precedence over constraints. A variable with neither is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarDef {
    pub name: String,
    pub bound: Option<Box<TypeExpr>>,
    pub constraints: Vec<TypeExpr>,
}

impl TypeVarDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), bound: None, constraints: Vec::new() }
    }

    pub fn bounded(name: impl Into<String>, bound: TypeExpr) -> Self {
        Self { name: name.into(), bound: Some(Box::new(bound)), constraints: Vec::new() }
    }

    pub fn constrained(name: impl Into<String>, constraints: Vec<TypeExpr>) -> Self {
        Self { name: name.into(), bound: None, constraints }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.bound.is_none() && self.constraints.is_empty()
    }
}

/// Type expressions describing the elements a pipeline stage produces
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeExpr {
    /// Universal supertype
    Any,
    /// The type of the null value; subtype only of itself and `Any`
    NullType,
    Concrete(TypeCtor),
    Var(TypeVarDef),
    Union(Vec<TypeExpr>),
    /// `args == None` is an open generic (`List`); `Some(vec![])` is an explicit empty list (`Tuple[()]`)
    Generic { origin: TypeCtor, args: Option<Vec<TypeExpr>> },
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Any => write!(f, "Any"),
            TypeExpr::NullType => write!(f, "None"),
            TypeExpr::Concrete(ctor) => write!(f, "{ctor}"),
            TypeExpr::Var(var) => write!(f, "~{}", var.name),
            TypeExpr::Union(members) => write!(f, "Union[{}]", join(members)),
            TypeExpr::Generic { origin, args } => match args {
                None => write!(f, "{}", origin.generic_name()),
                Some(args) if args.is_empty() => write!(f, "{}[()]", origin.generic_name()),
                Some(args) => write!(f, "{}[{}]", origin.generic_name(), join(args)),
            },
        }
    }
}

fn join(types: &[TypeExpr]) -> String {
    types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

impl TypeExpr {
    pub fn any() -> Self {
        TypeExpr::Any
    }

    pub fn none() -> Self {
        TypeExpr::NullType
    }

    pub fn int() -> Self {
        TypeExpr::Concrete(TypeCtor::Int)
    }

    pub fn bool() -> Self {
        TypeExpr::Concrete(TypeCtor::Bool)
    }

    pub fn float() -> Self {
        TypeExpr::Concrete(TypeCtor::Float)
    }

    pub fn complex() -> Self {
        TypeExpr::Concrete(TypeCtor::Complex)
    }

    pub fn string() -> Self {
        TypeExpr::Concrete(TypeCtor::Str)
    }

    pub fn bytes() -> Self {
        TypeExpr::Concrete(TypeCtor::Bytes)
    }

    /// A nominal user class
    pub fn class(name: impl Into<String>) -> Self {
        TypeExpr::Concrete(TypeCtor::Class(name.into()))
    }

    pub fn var(var: TypeVarDef) -> Self {
        TypeExpr::Var(var)
    }

    pub fn generic(origin: TypeCtor, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic { origin, args: Some(args) }
    }

    /// Unparameterized generic such as `List`
    pub fn open(origin: TypeCtor) -> Self {
        TypeExpr::Generic { origin, args: None }
    }

    pub fn list(element: TypeExpr) -> Self {
        Self::generic(TypeCtor::List, vec![element])
    }

    pub fn set(element: TypeExpr) -> Self {
        Self::generic(TypeCtor::Set, vec![element])
    }

    pub fn dict(key: TypeExpr, value: TypeExpr) -> Self {
        Self::generic(TypeCtor::Dict, vec![key, value])
    }

    pub fn tuple(elements: Vec<TypeExpr>) -> Self {
        Self::generic(TypeCtor::Tuple, elements)
    }

    pub fn iterator(element: TypeExpr) -> Self {
        Self::generic(TypeCtor::Iterator, vec![element])
    }

    /// Create a union, flattening nested unions, removing duplicates and sorting for canonical form
    ///
    /// An empty input gives the empty union, which is not a valid annotation: the
    /// parser and the registry both reject it as malformed.
    pub fn union(types: Vec<TypeExpr>) -> Self {
        let mut flattened = Vec::with_capacity(types.len());
        for t in types {
            match t {
                TypeExpr::Union(inner) => flattened.extend(inner),
                other => flattened.push(other),
            }
        }

        flattened.sort();
        flattened.dedup();

        match flattened.len() {
            1 => flattened.remove(0),
            _ => TypeExpr::Union(flattened),
        }
    }

    /// `Optional[T]` which is `Union[T, None]`
    pub fn optional(t: TypeExpr) -> Self {
        Self::union(vec![t, TypeExpr::NullType])
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeExpr::Any)
    }

    /// Map builtin spellings to their structural categories, at every depth
    pub fn normalize(&self) -> TypeExpr {
        match self {
            TypeExpr::Any | TypeExpr::NullType => self.clone(),
            TypeExpr::Concrete(ctor) => {
                if let Some(category) = ctor.category() {
                    TypeExpr::Concrete(category)
                } else if ctor.is_container() {
                    TypeExpr::open(ctor.clone())
                } else {
                    self.clone()
                }
            }
            TypeExpr::Var(var) => TypeExpr::Var(TypeVarDef {
                name: var.name.clone(),
                bound: var.bound.as_ref().map(|b| Box::new(b.normalize())),
                constraints: var.constraints.iter().map(TypeExpr::normalize).collect(),
            }),
            TypeExpr::Union(members) => TypeExpr::union(members.iter().map(TypeExpr::normalize).collect()),
            TypeExpr::Generic { origin, args } => TypeExpr::Generic {
                origin: origin.clone(),
                args: args.as_ref().map(|args| args.iter().map(TypeExpr::normalize).collect()),
            },
        }
    }

    /// The alternatives a variable or union stands for
    ///
    /// A bounded variable yields its bound, a constrained one its constraints and a
    /// union its members. Unconstrained variables and every other form yield `None`.
    pub fn alternatives(&self) -> Option<&[TypeExpr]> {
        match self {
            TypeExpr::Var(var) => match &var.bound {
                Some(bound) => Some(slice::from_ref(bound.as_ref())),
                None if !var.constraints.is_empty() => Some(&var.constraints),
                None => None,
            },
            TypeExpr::Union(members) => Some(members),
            _ => None,
        }
    }

    /// Element type of an `Iterator[E]` annotation
    pub fn iterator_element(&self) -> Option<&TypeExpr> {
        match self {
            TypeExpr::Generic { origin: TypeCtor::Iterator, args: Some(args) } if args.len() == 1 => args.first(),
            _ => None,
        }
    }

    /// Whether this is the bare `Iterator` (or builtin `iterator`) annotation
    pub fn is_open_iterator(&self) -> bool {
        matches!(
            self,
            TypeExpr::Generic { origin: TypeCtor::Iterator, args: None } | TypeExpr::Concrete(TypeCtor::Iterator)
        )
    }
}

impl From<TypeCtor> for TypeExpr {
    fn from(ctor: TypeCtor) -> Self {
        TypeExpr::Concrete(ctor)
    }
}

impl From<TypeVarDef> for TypeExpr {
    fn from(var: TypeVarDef) -> Self {
        TypeExpr::Var(var)
    }
}
