//! Unification for Sprig type inference.
//!
//! Implements unification over constants, applications, variables, and
//! rows. Rows unify up to permutation of distinct labels sharing a tail:
//! the head label of one side is surfaced in the other by rewriting,
//! introducing one fresh row tail per rewrite and refusing to rewrite
//! past the empty row. That refusal is what makes closed records exact
//! and is where "cannot extend a closed record" errors come from.

use crate::error::{Result, TypeError};
use crate::syntax::Span;
use crate::types::{Kind, Label, Subst, TVar, TVarName, Type};

use super::state::InferState;

/// Unify two types, returning the substitution that makes them equal.
///
/// The caller is expected to have applied its own running substitution to
/// both sides already; the returned substitution is the delta produced by
/// this one unification.
pub fn unify(state: &mut InferState, span: Span, t1: &Type, t2: &Type) -> Result<Subst> {
    let mut unifier = Unifier {
        state,
        span,
        subst: Subst::empty(),
    };
    unifier.unify_types(t1, t2)?;
    Ok(unifier.subst)
}

struct Unifier<'a> {
    state: &'a mut InferState,
    span: Span,
    subst: Subst,
}

impl<'a> Unifier<'a> {
    fn unify_types(&mut self, t1: &Type, t2: &Type) -> Result<()> {
        let t1 = self.subst.apply(t1);
        let t2 = self.subst.apply(t2);

        match (&t1, &t2) {
            // Same variable on both sides.
            (Type::Var(a), Type::Var(b)) if a.name == b.name => Ok(()),

            (Type::Var(a), Type::Var(b)) => {
                if a.kind != b.kind {
                    return Err(TypeError::KindMismatch {
                        left: t1.to_string(),
                        right: t2.to_string(),
                        span: self.span,
                    });
                }
                // A generated variable binds to the other side; two
                // distinct user-specified variables never unify.
                if !a.is_user_specified() {
                    self.bind(a, &t2)
                } else if !b.is_user_specified() {
                    self.bind(b, &t1)
                } else {
                    Err(self.annotation_too_general(a, &t2))
                }
            }

            (Type::Var(a), t) | (t, Type::Var(a)) => {
                if a.is_user_specified() {
                    // The annotation claims more generality than the
                    // inferred type provides.
                    Err(self.annotation_too_general(a, t))
                } else {
                    self.bind(a, t)
                }
            }

            (Type::Const(n1), Type::Const(n2)) => {
                if n1 == n2 {
                    Ok(())
                } else {
                    Err(self.constant_mismatch(&t1, &t2))
                }
            }

            (
                Type::App {
                    op: op1,
                    args: args1,
                },
                Type::App {
                    op: op2,
                    args: args2,
                },
            ) => {
                self.unify_types(op1, op2)?;
                if args1.len() != args2.len() {
                    return Err(TypeError::ArityMismatch {
                        expected: args1.len(),
                        found: args2.len(),
                        span: self.span,
                    });
                }
                for (a1, a2) in args1.iter().zip(args2.iter()) {
                    self.unify_types(a1, a2)?;
                }
                Ok(())
            }

            (Type::RowEmpty, Type::RowEmpty) => Ok(()),

            (Type::RowExt { label, .. }, Type::RowEmpty)
            | (Type::RowEmpty, Type::RowExt { label, .. }) => Err(TypeError::RowLabelMissing {
                label: label.0.clone(),
                row: "{}".to_string(),
                span: self.span,
            }),

            (
                Type::RowExt {
                    label,
                    field,
                    tail,
                },
                Type::RowExt { .. },
            ) => self.unify_rows(label, field, tail, &t2),

            // A row meeting a non-row form.
            (Type::RowEmpty | Type::RowExt { .. }, other)
            | (other, Type::RowEmpty | Type::RowExt { .. }) => {
                Err(TypeError::RowKindMismatch {
                    found: other.to_string(),
                    span: self.span,
                })
            }

            _ => Err(self.constant_mismatch(&t1, &t2)),
        }
    }

    /// Bind a generated variable to a type, respecting kinds and the
    /// occurs check.
    fn bind(&mut self, var: &TVar, ty: &Type) -> Result<()> {
        if ty.kind() != var.kind {
            return Err(TypeError::KindMismatch {
                left: Type::Var(var.clone()).to_string(),
                right: ty.to_string(),
                span: self.span,
            });
        }
        if ty.free_var_names().contains(&var.name) {
            return Err(TypeError::OccursCheck {
                var: Type::Var(var.clone()).to_string(),
                ty: ty.to_string(),
                span: self.span,
            });
        }
        self.extend(var.name.clone(), ty.clone());
        Ok(())
    }

    fn extend(&mut self, name: TVarName, ty: Type) {
        self.subst = Subst::singleton(name, ty).compose(&self.subst);
    }

    /// Unify two row extensions. The left head label is surfaced in the
    /// right row by rewriting, then fields and remainders unify.
    fn unify_rows(&mut self, label: &Label, field: &Type, tail: &Type, rhs: &Type) -> Result<()> {
        let (rhs_field, rhs_rest, bound) = self.rewrite_row(rhs, label, rhs)?;

        // If the rewrite bound the very variable that is our own tail,
        // the two rows are mutually recursive and cannot be finite.
        if let Some(bound_name) = bound {
            if tail.row_tail_var().map(|tv| &tv.name) == Some(&bound_name) {
                return Err(TypeError::OccursCheck {
                    var: Type::Var(TVar {
                        name: bound_name,
                        kind: Kind::Row,
                    })
                    .to_string(),
                    ty: rhs.to_string(),
                    span: self.span,
                });
            }
        }

        self.unify_types(field, &rhs_field)?;
        self.unify_types(tail, &rhs_rest)
    }

    /// Rewrite `row` so that `label` surfaces at its head. Returns the
    /// field type found (or invented) for the label, the row minus that
    /// label, and the tail variable bound along the way, if any.
    ///
    /// Rewriting is bounded: each rewrite introduces exactly one fresh
    /// tail variable, and reaching the empty row fails instead of
    /// extending a closed row.
    fn rewrite_row(
        &mut self,
        row: &Type,
        label: &Label,
        full_row: &Type,
    ) -> Result<(Type, Type, Option<TVarName>)> {
        match row {
            Type::RowEmpty => Err(TypeError::RowLabelMissing {
                label: label.0.clone(),
                row: full_row.to_string(),
                span: self.span,
            }),

            Type::RowExt {
                label: l2,
                field: f2,
                tail,
            } => {
                if l2 == label {
                    return Ok(((**f2).clone(), (**tail).clone(), None));
                }
                let (found, rest, bound) = self.rewrite_row(tail, label, full_row)?;
                Ok((
                    found,
                    Type::row_ext(l2.clone(), (**f2).clone(), rest),
                    bound,
                ))
            }

            Type::Var(tv) => {
                if tv.is_user_specified() {
                    // Extending a user-written row variable would make the
                    // annotation wider than what the user declared.
                    return Err(self.annotation_too_general(tv, full_row));
                }
                let fresh_field = self.state.fresh_value();
                let fresh_tail = self.state.fresh_row();
                let ext = Type::row_ext(label.clone(), fresh_field.clone(), fresh_tail.clone());
                self.extend(tv.name.clone(), ext);
                Ok((fresh_field, fresh_tail, Some(tv.name.clone())))
            }

            other => Err(TypeError::RowKindMismatch {
                found: other.to_string(),
                span: self.span,
            }),
        }
    }

    fn constant_mismatch(&self, expected: &Type, found: &Type) -> TypeError {
        TypeError::ConstantMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            span: self.span,
        }
    }

    fn annotation_too_general(&self, var: &TVar, inferred: &Type) -> TypeError {
        TypeError::AnnotationTooGeneral {
            annotated: Type::Var(var.clone()).to_string(),
            inferred: inferred.to_string(),
            span: self.span,
        }
    }
}
