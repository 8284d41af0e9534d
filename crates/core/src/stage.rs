//! Stage classes, their construction strategies and instances
//!
//! A [`StageClass`] is one node of the specialization lattice: a declared stage
//! (its own template) or a specialization of one. Every class is finalized before
//! it is handed out: its production method annotation is validated against the
//! bound, and a [`ConstructorStrategy`] is chosen from the bound's fixedness.

use crate::{TypeExpr, TypeParam, TypingError, issubtype};
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub type StageId = u32;

/// User constructor run when a stage is instantiated
pub type UserInit = Arc<dyn Fn(&mut StageInstance) + Send + Sync>;

/// How instances of a class receive their element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructorStrategy {
    /// The bound is fully concrete; instances read the class bound and the
    /// constructor is the user's own, or a no-op.
    Fixed,
    /// The bound is still open; after any user constructor runs the instance
    /// receives its own copy of the class bound.
    NonFixed,
}

impl ConstructorStrategy {
    pub fn for_param(param: &TypeParam) -> Self {
        if param.is_fixed() { Self::Fixed } else { Self::NonFixed }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed)
    }
}

impl fmt::Display for ConstructorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::NonFixed => write!(f, "nonfixed"),
        }
    }
}

/// Declaration of a stage's production (iteration) method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionMethod {
    /// Declared return annotation, expected to be `Iterator[E]` or bare `Iterator`
    pub returns: Option<TypeExpr>,
}

impl ProductionMethod {
    pub fn unannotated() -> Self {
        Self { returns: None }
    }

    pub fn returning(returns: TypeExpr) -> Self {
        Self { returns: Some(returns) }
    }

    /// Shorthand for a method declared to return `Iterator[element]`
    pub fn yielding(element: TypeExpr) -> Self {
        Self::returning(TypeExpr::iterator(element))
    }
}

/// What a stage author supplies when declaring a stage class
#[derive(Clone)]
pub struct StageDef {
    pub(crate) name: String,
    pub(crate) parent: Option<Arc<StageClass>>,
    pub(crate) init: Option<UserInit>,
    pub(crate) production: Option<ProductionMethod>,
}

impl StageDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), parent: None, init: None, production: None }
    }

    /// Derive from an existing (possibly specialized) stage class, inheriting its bound
    pub fn derive_from(mut self, parent: &Arc<StageClass>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn with_init(mut self, init: impl Fn(&mut StageInstance) + Send + Sync + 'static) -> Self {
        self.init = Some(Arc::new(init));
        self
    }

    pub fn with_production(mut self, method: ProductionMethod) -> Self {
        self.production = Some(method);
        self
    }
}

impl fmt::Debug for StageDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDef")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("init", &self.init.is_some())
            .field("production", &self.production)
            .finish()
    }
}

/// A finalized stage class
pub struct StageClass {
    id: StageId,
    name: String,
    /// `None` when this class is its own template
    origin: Option<Arc<StageClass>>,
    /// Nearest first
    bases: Vec<Arc<StageClass>>,
    bound: TypeParam,
    strategy: ConstructorStrategy,
    user_init: Option<UserInit>,
    production: Option<ProductionMethod>,
}

impl StageClass {
    /// Build and finalize a declared class
    pub(crate) fn declare(id: StageId, def: StageDef, check_production: bool) -> Result<Self, TypingError> {
        let (bound, bases, inherited_init) = match &def.parent {
            Some(parent) => {
                let mut bases = Vec::with_capacity(parent.bases.len() + 1);
                bases.push(Arc::clone(parent));
                bases.extend(parent.bases.iter().cloned());
                (parent.bound.clone(), bases, parent.user_init.clone())
            }
            None => (TypeParam::any(), Vec::new(), None),
        };

        let class = Self {
            id,
            name: def.name,
            origin: None,
            bases,
            strategy: ConstructorStrategy::for_param(&bound),
            bound,
            user_init: def.init.or(inherited_init),
            production: def.production,
        };

        if check_production {
            class.validate_production()?;
        }
        Ok(class)
    }

    /// Build a specialization of `template` bound to `param`
    pub(crate) fn specialized(id: StageId, template: &Arc<StageClass>, param: TypeParam) -> Self {
        let origin = template.origin.clone().unwrap_or_else(|| Arc::clone(template));

        let mut bases = Vec::with_capacity(template.bases.len() + 1);
        bases.push(Arc::clone(template));
        bases.extend(template.bases.iter().cloned());

        Self {
            id,
            name: format!("{}[{}]", template.name, param),
            origin: Some(origin),
            bases,
            strategy: ConstructorStrategy::for_param(&param),
            bound: param,
            user_init: template.user_init.clone(),
            production: None,
        }
    }

    /// Check the production method's declared element type against the bound
    ///
    /// Only classes declaring their own production method are checked. A bound other
    /// than `Any` requires an annotation, and the annotated element type must be
    /// equal to the bound up to normalization.
    pub fn validate_production(&self) -> Result<(), TypingError> {
        let Some(method) = &self.production else {
            return Ok(());
        };

        let Some(returns) = &method.returns else {
            if self.bound.is_any() {
                return Ok(());
            }
            return Err(TypingError::MissingReturnAnnotation { class: self.name.clone() });
        };

        if returns.is_open_iterator() {
            return Ok(());
        }

        let element = returns.iterator_element().ok_or_else(|| TypingError::NonIteratorReturnAnnotation {
            class: self.name.clone(),
            found: returns.to_string(),
        })?;

        let bound = self.bound.expr();
        if issubtype(bound, element) && issubtype(element, bound) {
            Ok(())
        } else {
            Err(TypingError::MismatchedReturnAnnotation {
                class: self.name.clone(),
                bound: self.bound.to_string(),
                declared: element.to_string(),
            })
        }
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bound(&self) -> &TypeParam {
        &self.bound
    }

    pub fn strategy(&self) -> ConstructorStrategy {
        self.strategy
    }

    pub fn bases(&self) -> &[Arc<StageClass>] {
        &self.bases
    }

    pub fn production(&self) -> Option<&ProductionMethod> {
        self.production.as_ref()
    }

    pub fn has_user_init(&self) -> bool {
        self.user_init.is_some()
    }

    pub fn is_template(&self) -> bool {
        self.origin.is_none()
    }

    /// The template this class was specialized from, or itself
    pub fn origin(self: &Arc<Self>) -> Arc<StageClass> {
        self.origin.clone().unwrap_or_else(|| Arc::clone(self))
    }

    pub fn origin_id(&self) -> StageId {
        self.origin.as_ref().map_or(self.id, |origin| origin.id)
    }

    /// Whether `other` is this class or one of its bases
    pub fn is_subclass_of(&self, other: &StageClass) -> bool {
        self == other || self.bases.iter().any(|base| base.as_ref() == other)
    }

    /// Create an instance using the installed constructor strategy
    pub fn instantiate(self: &Arc<Self>) -> StageInstance {
        let mut instance = StageInstance { class: Arc::clone(self), bound: None, attributes: FxHashMap::default() };

        if let Some(init) = &self.user_init {
            init(&mut instance);
        }
        if self.strategy == ConstructorStrategy::NonFixed {
            instance.bound = Some(self.bound.clone());
        }
        instance
    }
}

impl PartialEq for StageClass {
    fn eq(&self, other: &Self) -> bool {
        self.origin_id() == other.origin_id() && self.bound == other.bound
    }
}

impl Eq for StageClass {}

impl Hash for StageClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin_id().hash(state);
        self.bound.hash(state);
    }
}

impl fmt::Debug for StageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageClass")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("origin", &self.origin_id())
            .field("bound", &self.bound)
            .field("strategy", &self.strategy)
            .field("bases", &self.bases.iter().map(|b| b.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for StageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A constructed stage
#[derive(Debug, Clone)]
pub struct StageInstance {
    class: Arc<StageClass>,
    /// Present only for classes with the nonfixed strategy
    bound: Option<TypeParam>,
    attributes: FxHashMap<String, String>,
}

impl StageInstance {
    pub fn class(&self) -> &Arc<StageClass> {
        &self.class
    }

    /// The instance's element type: its own copy when it has one, else the class bound
    pub fn bound(&self) -> &TypeParam {
        self.bound.as_ref().unwrap_or(&self.class.bound)
    }

    pub fn owns_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Mutable access to the instance's own bound copy (nonfixed classes only)
    pub fn bound_mut(&mut self) -> Option<&mut TypeParam> {
        self.bound.as_mut()
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
