//! Stage Registry and Specialization Engine
//!
//! The registry owns the canonical table mapping `(origin, bound)` to the one
//! [`StageClass`] with that identity. Every lookup-or-insert happens under a single
//! lock, so asking for the same specialization twice (from any thread) yields the
//! same `Arc`. Entries are never evicted.

use crate::{
    AnnotationParser, ConstructorStrategy, Result, StageClass, StageDef, StageId, TypeExpr, TypeParam, TypingConfig,
    TypingError,
};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static GLOBAL: Lazy<StageRegistry> = Lazy::new(StageRegistry::new);

/// Argument passed when specializing a stage class
#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Expr(TypeExpr),
    /// Normalized into `Tuple[...]`
    Sequence(Vec<TypeExpr>),
    /// Annotation text, parsed with a scope-free [`AnnotationParser`]
    ///
    /// No type variables are in scope, so a name like `T` parses as a nominal
    /// class and yields a fixed bound. Use [`TypeArg::Annotated`] for variables.
    Annotation(String),
    /// Annotation text parsed with the given parser and its type variables
    Annotated(String, AnnotationParser),
    /// The literal null argument, which is always rejected
    Null,
}

impl TypeArg {
    fn into_expr(self) -> std::result::Result<TypeExpr, TypingError> {
        let (text, expr) = match self {
            TypeArg::Null => return Err(TypingError::malformed("None", "t can not be None")),
            TypeArg::Expr(expr) => (None, expr),
            TypeArg::Sequence(elements) => (None, TypeExpr::tuple(elements)),
            TypeArg::Annotation(text) => {
                let expr = AnnotationParser::new().parse(&text)?;
                (Some(text), expr)
            }
            TypeArg::Annotated(text, parser) => {
                let expr = parser.parse(&text)?;
                (Some(text), expr)
            }
        };

        match expr {
            TypeExpr::NullType => {
                Err(TypingError::malformed(text.unwrap_or_else(|| "None".to_string()), "t can not be None"))
            }
            TypeExpr::Union(members) if members.is_empty() => Err(TypingError::malformed(
                text.unwrap_or_else(|| "Union[()]".to_string()),
                "Cannot take a Union of no types",
            )),
            expr => Ok(expr),
        }
    }
}

impl From<TypeExpr> for TypeArg {
    fn from(expr: TypeExpr) -> Self {
        TypeArg::Expr(expr)
    }
}

impl From<Vec<TypeExpr>> for TypeArg {
    fn from(elements: Vec<TypeExpr>) -> Self {
        TypeArg::Sequence(elements)
    }
}

impl From<&str> for TypeArg {
    fn from(text: &str) -> Self {
        TypeArg::Annotation(text.to_string())
    }
}

impl From<Option<TypeExpr>> for TypeArg {
    fn from(expr: Option<TypeExpr>) -> Self {
        expr.map_or(TypeArg::Null, TypeArg::Expr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    /// Canonical classes in the table, declared templates included
    pub classes: usize,
    /// Specialization requests answered from the table or by returning the template itself
    pub hits: u64,
    /// Specialization requests that created a new class
    pub misses: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SpecKey {
    origin: StageId,
    param: TypeParam,
}

/// Canonical table of stage classes
#[derive(Debug)]
pub struct StageRegistry {
    config: TypingConfig,
    next_id: AtomicU32,
    table: Mutex<FxHashMap<SpecKey, Arc<StageClass>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::with_config(TypingConfig::default())
    }

    pub fn with_config(config: TypingConfig) -> Self {
        if !config.check_production_types {
            tracing::warn!("production type checking is disabled; stage annotations will not be validated");
        }
        Self {
            config,
            next_id: AtomicU32::new(0),
            table: Mutex::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The process-wide registry, created on first use
    pub fn global() -> &'static StageRegistry {
        &GLOBAL
    }

    pub fn config(&self) -> &TypingConfig {
        &self.config
    }

    fn table(&self) -> MutexGuard<'_, FxHashMap<SpecKey, Arc<StageClass>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh_id(&self) -> StageId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Declare a stage class
    ///
    /// Without a parent the class is a root with bound `Any`; with one it inherits
    /// the parent's bound. Either way it becomes its own template and is finalized
    /// (production annotation validated) before it is returned.
    pub fn declare(&self, def: StageDef) -> Result<Arc<StageClass>> {
        let class = Arc::new(StageClass::declare(self.fresh_id(), def, self.config.check_production_types)?);
        tracing::debug!(
            class = class.name(),
            bound = %class.bound(),
            strategy = %class.strategy(),
            "declared stage class"
        );

        let key = SpecKey { origin: class.id(), param: class.bound().clone() };
        self.table().insert(key, Arc::clone(&class));
        Ok(class)
    }

    /// Specialize `template` with a narrower element type
    ///
    /// The argument must be a subtype of the template's bound. When it is equal to the
    /// bound up to normalization and the template's strategy already matches, the
    /// template itself is returned. Otherwise the canonical class for
    /// `(origin, argument)` is returned, created on first request.
    pub fn specialize(&self, template: &Arc<StageClass>, argument: impl Into<TypeArg>) -> Result<Arc<StageClass>> {
        let param = TypeParam::new(argument.into().into_expr()?);

        if !param.issubtype(template.bound()) {
            return Err(TypingError::IncompatibleSpecialization {
                template: template.origin().name().to_string(),
                argument: param.to_string(),
                bound: template.bound().to_string(),
            }
            .into());
        }

        if template.bound().issubtype(&param) && template.strategy() == ConstructorStrategy::for_param(&param) {
            tracing::trace!(class = template.name(), bound = %param, "specialization equals template");
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(template));
        }

        let key = SpecKey { origin: template.origin_id(), param };
        let mut table = self.table();
        if let Some(existing) = table.get(&key) {
            tracing::trace!(class = existing.name(), "specialization cache hit");
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(existing));
        }

        let class = Arc::new(StageClass::specialized(self.fresh_id(), template, key.param.clone()));
        tracing::debug!(
            class = class.name(),
            fixed = class.bound().is_fixed(),
            strategy = %class.strategy(),
            "created specialization"
        );
        self.misses.fetch_add(1, Ordering::Relaxed);
        table.insert(key, Arc::clone(&class));
        Ok(class)
    }

    /// Number of canonical classes, declared templates included
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            classes: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
