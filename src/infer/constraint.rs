//! The constraint language of the solver.
//!
//! The generator walks the tree once and emits constraints; the solver
//! discharges them later. Four kinds exist:
//!
//! - `Equal` unifies two value types;
//! - `EffectEqual` unifies two effect rows (kept separate so error
//!   reporting can tell value mismatches from effect mismatches);
//! - `ImplicitInstance` says a use must be an instance of the scheme
//!   obtained by generalizing a template type against a monomorphic set —
//!   this is where let-polymorphism enters;
//! - `ExplicitInstance` says a use must be an instance of an already
//!   known scheme (a primitive or an import).
//!
//! An `Assumption` records a free-variable use whose binding is not yet
//! known; the enclosing binder or the module driver later converts it
//! into one of the constraints above or reports it as unknown.

use std::collections::HashSet;
use std::fmt;

use crate::syntax::Span;
use crate::types::{Scheme, Subst, TVarName, Type};

/// A constraint awaiting solution.
#[derive(Clone, Debug)]
pub enum Constraint {
    Equal {
        left: Type,
        right: Type,
        span: Span,
    },
    EffectEqual {
        left: Type,
        right: Type,
        span: Span,
    },
    ImplicitInstance {
        ty: Type,
        monovars: HashSet<TVarName>,
        template: Type,
        span: Span,
    },
    ExplicitInstance {
        ty: Type,
        scheme: Scheme,
        span: Span,
    },
}

impl Constraint {
    pub fn span(&self) -> Span {
        match self {
            Constraint::Equal { span, .. }
            | Constraint::EffectEqual { span, .. }
            | Constraint::ImplicitInstance { span, .. }
            | Constraint::ExplicitInstance { span, .. } => *span,
        }
    }

    /// Apply a substitution in place. The monomorphic set is mapped
    /// through the substitution: a monomorphic variable that has been
    /// refined to a type keeps that type's variables monomorphic.
    pub fn apply_mut(&mut self, subst: &Subst) {
        match self {
            Constraint::Equal { left, right, .. }
            | Constraint::EffectEqual { left, right, .. } => {
                *left = subst.apply(left);
                *right = subst.apply(right);
            }
            Constraint::ImplicitInstance {
                ty,
                monovars,
                template,
                ..
            } => {
                *ty = subst.apply(ty);
                *template = subst.apply(template);
                let mut mapped = HashSet::new();
                for name in monovars.iter() {
                    match subst.get(name) {
                        Some(image) => mapped.extend(subst.apply(image).free_var_names()),
                        None => {
                            mapped.insert(name.clone());
                        }
                    }
                }
                *monovars = mapped;
            }
            Constraint::ExplicitInstance { ty, scheme, .. } => {
                *ty = subst.apply(ty);
                *scheme = subst.apply(scheme);
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Equal { left, right, .. } => write!(f, "{} == {}", left, right),
            Constraint::EffectEqual { left, right, .. } => {
                write!(f, "{} ==eff {}", left, right)
            }
            Constraint::ImplicitInstance { ty, template, .. } => {
                write!(f, "{} <= {}", ty, template)
            }
            Constraint::ExplicitInstance { ty, scheme, .. } => {
                write!(f, "{} <=s {}", ty, scheme)
            }
        }
    }
}

/// The variables a constraint can still refine.
///
/// For an implicit-instance constraint the monomorphic part of the
/// template stays active; the rest is about to be generalized away and
/// no longer counts.
pub trait ActiveVars {
    fn active_vars(&self) -> HashSet<TVarName>;
}

impl ActiveVars for Constraint {
    fn active_vars(&self) -> HashSet<TVarName> {
        match self {
            Constraint::Equal { left, right, .. }
            | Constraint::EffectEqual { left, right, .. } => {
                let mut vars = left.free_var_names();
                vars.extend(right.free_var_names());
                vars
            }
            Constraint::ExplicitInstance { ty, scheme, .. } => {
                let mut vars = ty.free_var_names();
                vars.extend(scheme.free_vars().into_iter().map(|tv| tv.name));
                vars
            }
            Constraint::ImplicitInstance {
                ty,
                monovars,
                template,
                ..
            } => {
                let mut vars = ty.free_var_names();
                for name in template.free_var_names() {
                    if monovars.contains(&name) {
                        vars.insert(name);
                    }
                }
                vars
            }
        }
    }
}

impl ActiveVars for [Constraint] {
    fn active_vars(&self) -> HashSet<TVarName> {
        let mut vars = HashSet::new();
        for c in self {
            vars.extend(c.active_vars());
        }
        vars
    }
}

/// A free-variable use awaiting resolution.
#[derive(Clone, Debug)]
pub struct Assumption {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Kind, TVar};

    fn val(id: u32) -> Type {
        Type::Var(TVar::generated(id, Kind::Value))
    }

    #[test]
    fn test_equal_active_vars() {
        let c = Constraint::Equal {
            left: val(0),
            right: Type::function(vec![val(1)], Type::RowEmpty, val(2)),
            span: Span::default(),
        };
        let vars = c.active_vars();
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn test_implicit_active_vars_exclude_generalizable() {
        // use <= template where template's a1 is monomorphic, a2 is not.
        let mut monovars = HashSet::new();
        monovars.insert(TVarName::Generated(1));
        let c = Constraint::ImplicitInstance {
            ty: val(0),
            monovars,
            template: Type::function(vec![val(1)], Type::RowEmpty, val(2)),
            span: Span::default(),
        };
        let vars = c.active_vars();
        assert!(vars.contains(&TVarName::Generated(0)));
        assert!(vars.contains(&TVarName::Generated(1)));
        assert!(!vars.contains(&TVarName::Generated(2)));
    }

    #[test]
    fn test_apply_maps_monovars_through_subst() {
        let mut monovars = HashSet::new();
        monovars.insert(TVarName::Generated(1));
        let mut c = Constraint::ImplicitInstance {
            ty: val(0),
            monovars,
            template: val(1),
            span: Span::default(),
        };

        // a1 gets refined to a function over a5: a5 is now monomorphic.
        let sub = Subst::singleton(
            TVarName::Generated(1),
            Type::function(vec![val(5)], Type::RowEmpty, Type::number()),
        );
        c.apply_mut(&sub);

        match c {
            Constraint::ImplicitInstance { monovars, .. } => {
                assert!(monovars.contains(&TVarName::Generated(5)));
                assert!(!monovars.contains(&TVarName::Generated(1)));
            }
            _ => unreachable!(),
        }
    }
}
