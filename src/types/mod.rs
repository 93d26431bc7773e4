//! Type system module for Sprig inference.
//!
//! Provides the core type definitions, substitution implementation, and
//! pretty-printing used by the inference engine.

mod pretty;
mod subst;
mod ty;

pub use pretty::PrettyContext;
pub use subst::{Subst, Substitutable};
pub use ty::{con, Kind, Label, Scheme, TVar, TVarId, TVarName, Type, VALUES_LABEL};
