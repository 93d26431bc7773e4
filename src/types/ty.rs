//! Core type definitions for Sprig type inference.
//!
//! This module defines the monotype algebra used by the inference engine:
//! constants, saturated constructor applications, variables, and the row
//! forms that give records, variants, and effects their extensibility.
//! Types are immutable value objects; sharing happens through cloning and
//! variable names, never through pointer cycles.

use std::collections::HashSet;

/// Unique identifier for generated type variables.
pub type TVarId = u32;

/// Kind of a monotype: ordinary value types, or rows (the spines behind
/// records, variants, and effects). Row variables only ever unify with
/// rows; value variables only with non-rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Value,
    Row,
}

/// Type variable names differentiate between generated (inference) and
/// named (user-specified, written in an annotation) variables.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TVarName {
    /// Produced by the fresh-variable source.
    Generated(TVarId),
    /// Written by the programmer in a type annotation. Unifies only with
    /// itself (by name) or by being the target of a generated variable.
    Named(String),
}

impl TVarName {
    pub fn is_user_specified(&self) -> bool {
        matches!(self, TVarName::Named(_))
    }
}

/// A type variable: a name plus the kind it ranges over.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TVar {
    pub name: TVarName,
    pub kind: Kind,
}

impl TVar {
    pub fn generated(id: TVarId, kind: Kind) -> Self {
        TVar {
            name: TVarName::Generated(id),
            kind,
        }
    }

    pub fn named(name: impl Into<String>, kind: Kind) -> Self {
        TVar {
            name: TVarName::Named(name.into()),
            kind,
        }
    }

    pub fn is_user_specified(&self) -> bool {
        self.name.is_user_specified()
    }
}

/// A row label (record field, variant case, or effect name).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub String);

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label(s)
    }
}

/// Names of the built-in type constructors.
pub mod con {
    pub const NUMBER: &str = "number";
    pub const STRING: &str = "string";
    pub const BOOLEAN: &str = "boolean";
    pub const VOID: &str = "void";
    pub const FN: &str = "->";
    pub const VECTOR: &str = "vector";
    pub const RECORD: &str = "record";
    pub const VARIANT: &str = "variant";
    pub const EFFECT: &str = "effect";
}

/// The reserved effect label carrying a multiple-values tuple.
pub const VALUES_LABEL: &str = "values";

/// Core monotype representation.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// Nullary type constructor: `number`, `string`, or a user-defined
    /// opaque type.
    Const(String),

    /// Saturated application of a constructor to operand types. Function
    /// types are `(-> p₁ … pₙ effect result)` with the effect row in the
    /// second-to-last slot.
    App { op: Box<Type>, args: Vec<Type> },

    /// Type variable (generated or user-specified), of either kind.
    Var(TVar),

    /// The empty (closed) row.
    RowEmpty,

    /// Row extension: one label with its field type, then the rest of the
    /// row. The tail is `RowEmpty`, a row variable, or another extension.
    RowExt {
        label: Label,
        field: Box<Type>,
        tail: Box<Type>,
    },
}

impl Type {
    // === Constructors ===

    pub fn number() -> Self {
        Type::Const(con::NUMBER.to_string())
    }

    pub fn string() -> Self {
        Type::Const(con::STRING.to_string())
    }

    pub fn boolean() -> Self {
        Type::Const(con::BOOLEAN.to_string())
    }

    pub fn void() -> Self {
        Type::Const(con::VOID.to_string())
    }

    pub fn var(tv: TVar) -> Self {
        Type::Var(tv)
    }

    /// A function type. The effect row sits between the parameters and the
    /// result in the argument list.
    pub fn function(params: Vec<Type>, effect: Type, result: Type) -> Self {
        let mut args = params;
        args.push(effect);
        args.push(result);
        Type::App {
            op: Box::new(Type::Const(con::FN.to_string())),
            args,
        }
    }

    pub fn vector(element: Type) -> Self {
        Type::App {
            op: Box::new(Type::Const(con::VECTOR.to_string())),
            args: vec![element],
        }
    }

    pub fn record(row: Type) -> Self {
        Type::App {
            op: Box::new(Type::Const(con::RECORD.to_string())),
            args: vec![row],
        }
    }

    pub fn variant(row: Type) -> Self {
        Type::App {
            op: Box::new(Type::Const(con::VARIANT.to_string())),
            args: vec![row],
        }
    }

    pub fn effect(row: Type) -> Self {
        Type::App {
            op: Box::new(Type::Const(con::EFFECT.to_string())),
            args: vec![row],
        }
    }

    pub fn row_ext(label: impl Into<Label>, field: Type, tail: Type) -> Self {
        Type::RowExt {
            label: label.into(),
            field: Box::new(field),
            tail: Box::new(tail),
        }
    }

    /// Build a row from labeled fields ending in the given tail.
    pub fn row<L: Into<Label>>(fields: Vec<(L, Type)>, tail: Type) -> Self {
        fields
            .into_iter()
            .rev()
            .fold(tail, |acc, (label, field)| Type::row_ext(label, field, acc))
    }

    // === Predicates and accessors ===

    /// The kind of this type. Rows are the only row-kinded forms; a
    /// variable's kind is recorded on the variable itself.
    pub fn kind(&self) -> Kind {
        match self {
            Type::RowEmpty | Type::RowExt { .. } => Kind::Row,
            Type::Var(tv) => tv.kind,
            Type::Const(_) | Type::App { .. } => Kind::Value,
        }
    }

    pub fn is_row(&self) -> bool {
        self.kind() == Kind::Row
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Type::Var(_))
    }

    pub fn as_var(&self) -> Option<&TVar> {
        match self {
            Type::Var(tv) => Some(tv),
            _ => None,
        }
    }

    /// Follow a row's spine to its final tail; returns the tail variable
    /// if the row is open.
    pub fn row_tail_var(&self) -> Option<&TVar> {
        match self {
            Type::RowExt { tail, .. } => tail.row_tail_var(),
            Type::Var(tv) if tv.kind == Kind::Row => Some(tv),
            _ => None,
        }
    }

    /// Collect all free type variables in this type.
    pub fn free_vars(&self) -> HashSet<TVar> {
        let mut vars = HashSet::new();
        self.collect_free_vars(&mut vars);
        vars
    }

    fn collect_free_vars(&self, vars: &mut HashSet<TVar>) {
        match self {
            Type::Const(_) | Type::RowEmpty => {}
            Type::Var(tv) => {
                vars.insert(tv.clone());
            }
            Type::App { op, args } => {
                op.collect_free_vars(vars);
                for arg in args {
                    arg.collect_free_vars(vars);
                }
            }
            Type::RowExt { field, tail, .. } => {
                field.collect_free_vars(vars);
                tail.collect_free_vars(vars);
            }
        }
    }

    /// Collect the names of all free type variables.
    pub fn free_var_names(&self) -> HashSet<TVarName> {
        self.free_vars().into_iter().map(|tv| tv.name).collect()
    }
}

/// Type scheme: a universally quantified monotype, ∀α₁…αₙ. τ.
/// Quantified variables keep their kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct Scheme {
    pub vars: Vec<TVar>,
    pub body: Type,
}

impl Scheme {
    /// A monomorphic scheme (no quantification).
    pub fn mono(ty: Type) -> Self {
        Scheme {
            vars: vec![],
            body: ty,
        }
    }

    pub fn poly(vars: Vec<TVar>, body: Type) -> Self {
        Scheme { vars, body }
    }

    /// Generalize a monotype: quantify its free variables except those in
    /// the monomorphic set. The quantifier order is sorted so that
    /// instantiation is deterministic.
    pub fn quantify(ty: &Type, monovars: &HashSet<TVarName>) -> Self {
        let mut vars: Vec<TVar> = ty
            .free_vars()
            .into_iter()
            .filter(|tv| !monovars.contains(&tv.name))
            .collect();
        vars.sort();
        Scheme {
            vars,
            body: ty.clone(),
        }
    }

    pub fn is_mono(&self) -> bool {
        self.vars.is_empty()
    }

    /// Free variables of the scheme (not including quantified ones).
    pub fn free_vars(&self) -> HashSet<TVar> {
        let mut vars = self.body.free_vars();
        for v in &self.vars {
            vars.remove(v);
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Type::number().kind(), Kind::Value);
        assert_eq!(Type::RowEmpty.kind(), Kind::Row);
        assert_eq!(
            Type::row_ext("x", Type::number(), Type::RowEmpty).kind(),
            Kind::Row
        );
        assert_eq!(Type::Var(TVar::generated(0, Kind::Row)).kind(), Kind::Row);
    }

    #[test]
    fn test_function_shape() {
        let f = Type::function(
            vec![Type::number()],
            Type::Var(TVar::generated(0, Kind::Row)),
            Type::boolean(),
        );
        match f {
            Type::App { op, args } => {
                assert_eq!(*op, Type::Const(con::FN.to_string()));
                assert_eq!(args.len(), 3);
            }
            _ => panic!("expected an application"),
        }
    }

    #[test]
    fn test_free_vars() {
        let a = TVar::generated(0, Kind::Value);
        let e = TVar::generated(1, Kind::Row);
        let f = Type::function(
            vec![Type::Var(a.clone())],
            Type::Var(e.clone()),
            Type::Var(a.clone()),
        );
        let free = f.free_vars();
        assert!(free.contains(&a));
        assert!(free.contains(&e));
        assert_eq!(free.len(), 2);
    }

    #[test]
    fn test_row_tail_var() {
        let rho = TVar::generated(7, Kind::Row);
        let row = Type::row(
            vec![("x", Type::number()), ("y", Type::string())],
            Type::Var(rho.clone()),
        );
        assert_eq!(row.row_tail_var(), Some(&rho));

        let closed = Type::row(vec![("x", Type::number())], Type::RowEmpty);
        assert_eq!(closed.row_tail_var(), None);
    }

    #[test]
    fn test_quantify_respects_monovars() {
        let a = TVar::generated(0, Kind::Value);
        let b = TVar::generated(1, Kind::Value);
        let body = Type::function(
            vec![Type::Var(a.clone())],
            Type::RowEmpty,
            Type::Var(b.clone()),
        );

        let mut mono = HashSet::new();
        mono.insert(a.name.clone());

        let scheme = Scheme::quantify(&body, &mono);
        assert_eq!(scheme.vars, vec![b.clone()]);
        assert!(scheme.free_vars().contains(&a));
    }
}
