//! Pipetype Core - element typing for data-pipeline stages
//!
//! Pipeline stage classes declare the element type they produce. This crate
//! enforces structural subtype compatibility whenever a stage is specialized with
//! a concrete type argument or composed with another stage:
//! - Type expressions (`Any`, the null type, concrete types, bounded or constrained
//!   variables, unions and parameterized generics) with builtin normalization
//! - The structural subtype predicate [`issubtype`]
//! - [`TypeParam`], the hashable bound wrapper that also records fixedness
//! - [`StageRegistry`], which specializes stage classes into canonical
//!   [`StageClass`] values and finalizes them with a constructor strategy
//!
//! ```
//! use pipetype_core::{ProductionMethod, StageDef, StageRegistry, TypeExpr};
//!
//! let registry = StageRegistry::new();
//! let stage = registry.declare(StageDef::new("Stage")).unwrap();
//! let ints = registry.specialize(&stage, TypeExpr::int()).unwrap();
//! assert!(ints.bound().is_fixed());
//! assert!(registry.specialize(&ints, TypeExpr::string()).is_err());
//!
//! let source = StageDef::new("Counter")
//!     .derive_from(&ints)
//!     .with_production(ProductionMethod::yielding(TypeExpr::int()));
//! assert!(registry.declare(source).is_ok());
//! ```

pub mod annotation_parser;
pub mod config;
pub mod errors;
pub mod logging;
pub mod param;
pub mod registry;
pub mod stage;
pub mod subtype;
pub mod types;

pub use annotation_parser::AnnotationParser;
pub use config::{LogSettings, TypingConfig};
pub use errors::*;
pub use param::TypeParam;
pub use registry::{RegistryStats, StageRegistry, TypeArg};
pub use stage::{ConstructorStrategy, ProductionMethod, StageClass, StageDef, StageId, StageInstance, UserInit};
pub use subtype::issubtype;
pub use types::*;
