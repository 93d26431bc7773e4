//! Lowering of user type annotations to monotypes.
//!
//! Annotations arrive from the reader as a small tree (`TypeExpr`). This
//! module turns that tree into a monotype:
//!
//! - named identifiers become user-specified variables, shared by name
//!   within one annotation;
//! - `_` becomes a fresh generated variable per occurrence, `_name`
//!   wildcards share one fresh variable across the annotation;
//! - constants naming a declared alias are replaced by the alias's
//!   expanded body; other constants stay opaque;
//! - variables and wildcards take the kind of the position they appear
//!   in, so a wildcard in an effect slot is a row variable.
//!
//! Lowering is total. Ill-kinded annotations (say, `number` written in an
//! effect slot) lower to the type as written and fail later in the
//! solver, which owns all error reporting.

use std::collections::HashMap;

use crate::syntax::ast::{TypeExpr, TypeExprKind};
use crate::types::{con, Kind, TVar, Type};

use super::aliases::AliasTable;
use super::state::InferState;

/// Lower one annotation to a monotype. Wildcard and variable scopes last
/// for exactly this one annotation.
pub fn lower_annotation(state: &mut InferState, aliases: &AliasTable, te: &TypeExpr) -> Type {
    let mut lowerer = Lowerer {
        state,
        aliases,
        wildcards: HashMap::new(),
        user_vars: HashMap::new(),
    };
    lowerer.lower(te, Kind::Value)
}

struct Lowerer<'a> {
    state: &'a mut InferState,
    aliases: &'a AliasTable,
    /// Named wildcards (`_name`), shared across the annotation.
    wildcards: HashMap<String, TVar>,
    /// User-specified variables, shared by name across the annotation.
    user_vars: HashMap<String, TVar>,
}

impl<'a> Lowerer<'a> {
    fn lower(&mut self, te: &TypeExpr, kind: Kind) -> Type {
        match &te.kind {
            TypeExprKind::Name(name) => self.lower_name(name, kind),

            TypeExprKind::Var(name) => {
                let var = self
                    .user_vars
                    .entry(name.clone())
                    .or_insert_with(|| TVar::named(name.clone(), kind))
                    .clone();
                Type::Var(var)
            }

            TypeExprKind::Wildcard(None) => Type::Var(self.state.fresh(kind)),

            TypeExprKind::Wildcard(Some(name)) => {
                if let Some(var) = self.wildcards.get(name) {
                    return Type::Var(var.clone());
                }
                let var = self.state.fresh(kind);
                self.wildcards.insert(name.clone(), var.clone());
                Type::Var(var)
            }

            TypeExprKind::Fn {
                params,
                effect,
                result,
            } => {
                let params = params.iter().map(|p| self.lower(p, Kind::Value)).collect();
                let effect = match effect {
                    Some(e) => self.lower_row(e),
                    None => Type::Var(self.state.fresh(Kind::Row)),
                };
                let result = self.lower(result, Kind::Value);
                Type::function(params, effect, result)
            }

            TypeExprKind::Vector(element) => Type::vector(self.lower(element, Kind::Value)),

            TypeExprKind::Record { fields, tail } => {
                let row = self.lower_fields(fields, tail.as_deref());
                Type::record(row)
            }

            TypeExprKind::Variant { cases, tail } => {
                let row = self.lower_fields(cases, tail.as_deref());
                Type::variant(row)
            }

            TypeExprKind::Effect { .. } => Type::effect(self.lower_row(te)),

            TypeExprKind::App { name, args } => {
                let args = args.iter().map(|a| self.lower(a, Kind::Value)).collect();
                Type::App {
                    op: Box::new(Type::Const(name.clone())),
                    args,
                }
            }
        }
    }

    /// A constant: expand aliases, leave everything else opaque.
    fn lower_name(&mut self, name: &str, kind: Kind) -> Type {
        if let Some(body) = self.aliases.module_alias(name) {
            let body = body.clone();
            return self.lower(&body, kind);
        }
        if let Some(ty) = self.aliases.external_alias(name) {
            return ty.clone();
        }
        Type::Const(name.to_string())
    }

    fn lower_fields(&mut self, fields: &[(String, TypeExpr)], tail: Option<&TypeExpr>) -> Type {
        let lowered: Vec<(String, Type)> = fields
            .iter()
            .map(|(label, t)| (label.clone(), self.lower(t, Kind::Value)))
            .collect();
        let tail = match tail {
            Some(t) => {
                let row = self.lower(t, Kind::Row);
                unwrap_row(row)
            }
            None => Type::RowEmpty,
        };
        Type::row(lowered, tail)
    }

    /// A row position (function effect slot, row tails). Effect syntax
    /// lowers to a bare row; an alias expanding to a wrapped row is
    /// unwrapped so `{:x number | point}` splices the alias's fields.
    fn lower_row(&mut self, te: &TypeExpr) -> Type {
        match &te.kind {
            TypeExprKind::Effect { labels, tail } => {
                let fields: Vec<(String, Type)> = labels
                    .iter()
                    .map(|(label, payload)| {
                        let ty = match payload {
                            Some(p) => self.lower(p, Kind::Value),
                            None => Type::void(),
                        };
                        (label.clone(), ty)
                    })
                    .collect();
                let tail = match tail {
                    Some(t) => self.lower_row(t),
                    None => Type::RowEmpty,
                };
                Type::row(fields, tail)
            }
            TypeExprKind::Name(name) => {
                let lowered = self.lower_name(name, Kind::Row);
                unwrap_row(lowered)
            }
            _ => {
                let lowered = self.lower(te, Kind::Row);
                unwrap_row(lowered)
            }
        }
    }
}

/// Strip a `record`/`variant`/`effect` wrapper when a row was wanted.
fn unwrap_row(ty: Type) -> Type {
    match ty {
        Type::App { ref op, ref args }
            if args.len() == 1
                && matches!(
                    op.as_ref(),
                    Type::Const(name)
                        if name == con::RECORD || name == con::VARIANT || name == con::EFFECT
                ) =>
        {
            args[0].clone()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TVarName;
    use std::collections::HashMap as StdHashMap;

    fn lower(te: &TypeExpr) -> Type {
        let mut state = InferState::new();
        let aliases = AliasTable::new(StdHashMap::new());
        lower_annotation(&mut state, &aliases, te)
    }

    #[test]
    fn test_constants_stay_opaque() {
        assert_eq!(lower(&TypeExpr::name("number")), Type::number());
        assert_eq!(
            lower(&TypeExpr::name("widget")),
            Type::Const("widget".to_string())
        );
    }

    #[test]
    fn test_user_vars_share_by_name() {
        let te = TypeExpr::fn_(
            vec![TypeExpr::var("a")],
            None,
            TypeExpr::var("a"),
        );
        let ty = lower(&te);
        let named: Vec<TVar> = ty
            .free_vars()
            .into_iter()
            .filter(|tv| tv.is_user_specified())
            .collect();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].name, TVarName::Named("a".to_string()));
    }

    #[test]
    fn test_anonymous_wildcards_are_fresh_per_occurrence() {
        let te = TypeExpr::fn_(
            vec![TypeExpr::wildcard()],
            None,
            TypeExpr::wildcard(),
        );
        let ty = lower(&te);
        // Two wildcards plus the implicit effect slot: three distinct vars.
        assert_eq!(ty.free_vars().len(), 3);
    }

    #[test]
    fn test_named_wildcards_share() {
        let te = TypeExpr::fn_(
            vec![TypeExpr::named_wildcard("a")],
            Some(TypeExpr::wildcard()),
            TypeExpr::named_wildcard("a"),
        );
        let ty = lower(&te);
        // The `_a` occurrences collapse to one var; the effect is another.
        assert_eq!(ty.free_vars().len(), 2);
    }

    #[test]
    fn test_wildcard_kind_follows_position() {
        let te = TypeExpr::fn_(
            vec![TypeExpr::wildcard()],
            Some(TypeExpr::wildcard()),
            TypeExpr::wildcard(),
        );
        let ty = lower(&te);
        let kinds: Vec<Kind> = ty.free_vars().iter().map(|tv| tv.kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == Kind::Row).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == Kind::Value).count(), 2);
    }

    #[test]
    fn test_alias_expansion() {
        let mut state = InferState::new();
        let mut aliases = AliasTable::new(StdHashMap::new());
        aliases.insert(
            "point",
            TypeExpr::record(vec![("x", TypeExpr::name("number"))], None),
            crate::syntax::Span::default(),
        );

        let ty = lower_annotation(&mut state, &aliases, &TypeExpr::vector(TypeExpr::name("point")));
        assert_eq!(
            ty,
            Type::vector(Type::record(Type::row(
                vec![("x", Type::number())],
                Type::RowEmpty
            )))
        );
    }

    #[test]
    fn test_record_tail_alias_splices() {
        let mut state = InferState::new();
        let mut aliases = AliasTable::new(StdHashMap::new());
        aliases.insert(
            "point",
            TypeExpr::record(vec![("x", TypeExpr::name("number"))], None),
            crate::syntax::Span::default(),
        );

        let te = TypeExpr::record(
            vec![("y", TypeExpr::name("number"))],
            Some(TypeExpr::name("point")),
        );
        let ty = lower_annotation(&mut state, &aliases, &te);
        assert_eq!(
            ty,
            Type::record(Type::row(
                vec![("y", Type::number()), ("x", Type::number())],
                Type::RowEmpty
            ))
        );
    }
}
