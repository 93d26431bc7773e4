//! Sprig type inference.
//!
//! This library implements the type inference core of Sprig, a small
//! Lisp-like language that compiles to a JavaScript runtime. It features:
//!
//! - **Hindley-Milner inference** with let-polymorphism
//! - **Row polymorphism** for extensible records and variants
//! - **Effect rows** tracking the effects every expression performs
//! - **Type aliases** with up-front cycle rejection
//! - **User annotations** with named variables and partial wildcards
//! - A **constraint solver** over equality, effect-equality, and
//!   implicit/explicit instance constraints
//!
//! The reader, desugarer, and code generator live outside this crate;
//! inference consumes a parsed module (`syntax::ast::Module`) plus an
//! external environment of primitives and imports, and produces a fully
//! typed module together with the unresolved names.

pub mod builtins;
pub mod diagnostics;
pub mod error;
pub mod infer;
pub mod syntax;
pub mod types;
