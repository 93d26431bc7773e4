//! Type inference module for Sprig.
//!
//! This module provides the core of the inference engine:
//! - `state`: fresh-variable source and scheme instantiation
//! - `env`: the external environment of primitives and imports
//! - `aliases`: type-alias table with cycle detection
//! - `annot`: lowering of user annotations to monotypes
//! - `constraint`: the constraint language and assumptions
//! - `infer`: the constraint generator
//! - `unify`: unification with row rewriting
//! - `solve`: the constraint scheduler and solver
//! - `typed`: the typed output tree
//! - `module`: the module driver

mod aliases;
mod annot;
mod constraint;
mod env;
mod infer;
mod module;
mod solve;
mod state;
mod typed;
mod unify;

#[cfg(test)]
mod proptests;

pub use aliases::AliasTable;
pub use annot::lower_annotation;
pub use constraint::{ActiveVars, Assumption, Constraint};
pub use env::ExternalEnv;
pub use infer::ConstraintGenerator;
pub use module::{infer_expression, infer_module};
pub use solve::solve;
pub use state::InferState;
pub use typed::{TypedExpr, TypedExprKind, TypedForm, TypedMatchCase, TypedModule, Unknown};
pub use unify::unify;
