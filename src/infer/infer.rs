//! The constraint generator.
//!
//! A single structural walk over the expression tree. Each form receives
//! a fresh value type and a fresh effect row; the walk emits equality,
//! effect-equality, and instance constraints into a shared accumulator
//! and records free-variable uses as assumptions. The generator never
//! fails: even ill-typed code produces constraints, and all errors
//! surface later in the solver with the constraint's source span.
//!
//! Scoping works through marks on the assumption accumulator: a binder
//! walks its body, then resolves exactly the assumptions recorded since
//! the mark, so sibling scopes never capture each other's uses.

use std::collections::HashSet;

use crate::syntax::ast::{Expr, ExprKind, MatchCase};
use crate::syntax::Span;
use crate::types::{Kind, TVar, TVarName, Type, VALUES_LABEL};

use super::aliases::AliasTable;
use super::annot::lower_annotation;
use super::constraint::{Assumption, Constraint};
use super::state::InferState;
use super::typed::{TypedExpr, TypedExprKind, TypedMatchCase};

pub struct ConstraintGenerator<'a> {
    state: &'a mut InferState,
    aliases: &'a AliasTable,
    constraints: Vec<Constraint>,
    assumptions: Vec<Assumption>,
    /// Variables that are monomorphic in the current scope: the types of
    /// enclosing function parameters and other per-call binders.
    m_stack: Vec<TVar>,
}

impl<'a> ConstraintGenerator<'a> {
    pub fn new(state: &'a mut InferState, aliases: &'a AliasTable) -> Self {
        ConstraintGenerator {
            state,
            aliases,
            constraints: Vec::new(),
            assumptions: Vec::new(),
            m_stack: Vec::new(),
        }
    }

    /// Hand back everything accumulated across the walks.
    pub fn into_parts(self) -> (Vec<Constraint>, Vec<Assumption>) {
        (self.constraints, self.assumptions)
    }

    fn equal(&mut self, left: Type, right: Type, span: Span) {
        self.constraints.push(Constraint::Equal { left, right, span });
    }

    fn effect_equal(&mut self, left: Type, right: Type, span: Span) {
        self.constraints
            .push(Constraint::EffectEqual { left, right, span });
    }

    fn monovar_names(&self) -> HashSet<TVarName> {
        self.m_stack.iter().map(|tv| tv.name.clone()).collect()
    }

    /// Infer the type of an expression, accumulating constraints and
    /// assumptions as a side effect.
    pub fn infer_expr(&mut self, expr: &Expr) -> TypedExpr {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Number(value) => self.literal(
                TypedExprKind::Number(*value),
                Type::number(),
                span,
            ),
            ExprKind::Str(value) => self.literal(
                TypedExprKind::Str(value.clone()),
                Type::string(),
                span,
            ),
            ExprKind::Boolean(value) => self.literal(
                TypedExprKind::Boolean(*value),
                Type::boolean(),
                span,
            ),

            // A gap left by a syntax error: fresh and unconstrained, so
            // inference continues around it.
            ExprKind::Unknown => {
                let ty = self.state.fresh_value();
                self.literal(TypedExprKind::Unknown, ty, span)
            }

            ExprKind::Var(name) => {
                let ty = self.state.fresh_value();
                let effect = self.state.fresh_row();
                self.assumptions.push(Assumption {
                    name: name.clone(),
                    ty: ty.clone(),
                    span,
                });
                TypedExpr {
                    kind: TypedExprKind::Var(name.clone()),
                    span,
                    ty,
                    effect,
                }
            }

            // A keyword in callee position is a field accessor with an
            // inline type: `(-> {label τ | ρ} ε τ)`.
            ExprKind::Keyword(label) => {
                let field = self.state.fresh_value();
                let rest = self.state.fresh_row();
                let inner_effect = self.state.fresh_row();
                let ty = Type::function(
                    vec![Type::record(Type::row_ext(
                        label.as_str(),
                        field.clone(),
                        rest,
                    ))],
                    inner_effect,
                    field,
                );
                let effect = self.state.fresh_row();
                TypedExpr {
                    kind: TypedExprKind::Keyword(label.clone()),
                    span,
                    ty,
                    effect,
                }
            }

            ExprKind::Vector(elements) => {
                let element_ty = self.state.fresh_value();
                let effect = self.state.fresh_row();
                let typed: Vec<TypedExpr> = elements
                    .iter()
                    .map(|e| {
                        let te = self.infer_expr(e);
                        self.equal(te.ty.clone(), element_ty.clone(), te.span);
                        self.effect_equal(te.effect.clone(), effect.clone(), te.span);
                        te
                    })
                    .collect();
                TypedExpr {
                    kind: TypedExprKind::Vector(typed),
                    span,
                    ty: Type::vector(element_ty),
                    effect,
                }
            }

            ExprKind::Record { fields, tail } => self.infer_record(fields, tail.as_deref(), span),

            ExprKind::If { cond, then, els } => {
                let ty = self.state.fresh_value();
                let effect = self.state.fresh_row();

                let cond = self.infer_expr(cond);
                self.equal(cond.ty.clone(), Type::boolean(), cond.span);
                self.effect_equal(cond.effect.clone(), effect.clone(), cond.span);

                let then = self.infer_expr(then);
                self.equal(then.ty.clone(), ty.clone(), then.span);
                self.effect_equal(then.effect.clone(), effect.clone(), then.span);

                let els = self.infer_expr(els);
                self.equal(els.ty.clone(), ty.clone(), els.span);
                self.effect_equal(els.effect.clone(), effect.clone(), els.span);

                TypedExpr {
                    kind: TypedExprKind::If {
                        cond: Box::new(cond),
                        then: Box::new(then),
                        els: Box::new(els),
                    },
                    span,
                    ty,
                    effect,
                }
            }

            ExprKind::Lambda { params, body } => self.infer_lambda(params, body, span),

            ExprKind::Call { callee, args } => {
                let ty = self.state.fresh_value();
                let effect = self.state.fresh_row();

                let callee = self.infer_expr(callee);
                let typed_args: Vec<TypedExpr> =
                    args.iter().map(|a| self.infer_expr(a)).collect();

                let expected = Type::function(
                    typed_args.iter().map(|a| a.ty.clone()).collect(),
                    effect.clone(),
                    ty.clone(),
                );
                self.equal(callee.ty.clone(), expected, span);
                self.effect_equal(callee.effect.clone(), effect.clone(), callee.span);
                for arg in &typed_args {
                    self.effect_equal(arg.effect.clone(), effect.clone(), arg.span);
                }

                TypedExpr {
                    kind: TypedExprKind::Call {
                        callee: Box::new(callee),
                        args: typed_args,
                    },
                    span,
                    ty,
                    effect,
                }
            }

            ExprKind::Let { bindings, body } => self.infer_let(bindings, body, span),

            ExprKind::Annotated { ty, expr } => {
                let annotated = lower_annotation(self.state, self.aliases, ty);
                let typed = self.infer_expr(expr);
                self.equal(typed.ty.clone(), annotated.clone(), span);
                let effect = typed.effect.clone();
                TypedExpr {
                    kind: TypedExprKind::Annotated {
                        expr: Box::new(typed),
                    },
                    span,
                    ty: annotated,
                    effect,
                }
            }

            ExprKind::Do { forms } => {
                let effect = self.state.fresh_row();
                let (typed, result_ty) = self.infer_body(forms, &effect);
                TypedExpr {
                    kind: TypedExprKind::Do { forms: typed },
                    span,
                    ty: result_ty,
                    effect,
                }
            }

            ExprKind::Match { subject, cases } => self.infer_match(subject, cases, span),

            ExprKind::Values(elements) => self.infer_values(elements, span),

            ExprKind::MvBind {
                names,
                producer,
                body,
            } => self.infer_mv_bind(names, producer, body, span),
        }
    }

    fn literal(&mut self, kind: TypedExprKind, ty: Type, span: Span) -> TypedExpr {
        let effect = self.state.fresh_row();
        TypedExpr {
            kind,
            span,
            ty,
            effect,
        }
    }

    /// Walk a body sequence: every form shares the given effect row and
    /// the last form's type is the sequence's type.
    fn infer_body(&mut self, forms: &[Expr], effect: &Type) -> (Vec<TypedExpr>, Type) {
        let typed: Vec<TypedExpr> = forms
            .iter()
            .map(|f| {
                let tf = self.infer_expr(f);
                self.effect_equal(tf.effect.clone(), effect.clone(), tf.span);
                tf
            })
            .collect();
        let result = typed
            .last()
            .map(|tf| tf.ty.clone())
            .unwrap_or_else(Type::void);
        (typed, result)
    }

    /// Resolve assumptions made since `mark` whose name is bound
    /// monomorphically to `lookup(name)`. Unmatched assumptions escape.
    fn bind_monomorphic<F>(&mut self, mark: usize, lookup: F)
    where
        F: Fn(&str) -> Option<Type>,
    {
        let escaped = self.assumptions.split_off(mark);
        for assumption in escaped {
            match lookup(&assumption.name) {
                Some(bound_ty) => {
                    self.constraints.push(Constraint::Equal {
                        left: assumption.ty,
                        right: bound_ty,
                        span: assumption.span,
                    });
                }
                None => self.assumptions.push(assumption),
            }
        }
    }

    fn infer_record(
        &mut self,
        fields: &[(String, Expr)],
        tail: Option<&Expr>,
        span: Span,
    ) -> TypedExpr {
        let effect = self.state.fresh_row();

        let typed_fields: Vec<(String, TypedExpr)> = fields
            .iter()
            .map(|(label, value)| {
                let tv = self.infer_expr(value);
                self.effect_equal(tv.effect.clone(), effect.clone(), tv.span);
                (label.clone(), tv)
            })
            .collect();

        let (typed_tail, extends) = match tail {
            None => (None, Type::RowEmpty),
            Some(tail_expr) => {
                let typed_tail = self.infer_expr(tail_expr);
                self.effect_equal(typed_tail.effect.clone(), effect.clone(), typed_tail.span);

                // The tail must be a record carrying every listed label
                // (at whatever old types) plus a shared remainder. The
                // listed labels override; the remainder carries through.
                let rest = self.state.fresh_row();
                let old_fields: Vec<(String, Type)> = typed_fields
                    .iter()
                    .map(|(label, _)| (label.clone(), self.state.fresh_value()))
                    .collect();
                let expected = Type::record(Type::row(old_fields, rest.clone()));
                self.equal(typed_tail.ty.clone(), expected, typed_tail.span);
                (Some(Box::new(typed_tail)), rest)
            }
        };

        let row = Type::row(
            typed_fields
                .iter()
                .map(|(label, tv)| (label.clone(), tv.ty.clone()))
                .collect(),
            extends,
        );

        TypedExpr {
            kind: TypedExprKind::Record {
                fields: typed_fields,
                tail: typed_tail,
            },
            span,
            ty: Type::record(row),
            effect,
        }
    }

    fn infer_lambda(&mut self, params: &[String], body: &[Expr], span: Span) -> TypedExpr {
        let param_vars: Vec<TVar> = params.iter().map(|_| self.state.fresh(Kind::Value)).collect();
        let body_effect = self.state.fresh_row();

        self.m_stack.extend(param_vars.iter().cloned());
        let mark = self.assumptions.len();
        let (typed_body, result_ty) = self.infer_body(body, &body_effect);

        let typed_params: Vec<(String, Type)> = params
            .iter()
            .zip(param_vars.iter())
            .map(|(name, tv)| (name.clone(), Type::Var(tv.clone())))
            .collect();
        self.bind_monomorphic(mark, |name| {
            typed_params
                .iter()
                .rev()
                .find(|(p, _)| p == name)
                .map(|(_, t)| t.clone())
        });
        self.m_stack.truncate(self.m_stack.len() - param_vars.len());

        let ty = Type::function(
            typed_params.iter().map(|(_, t)| t.clone()).collect(),
            body_effect,
            result_ty,
        );
        // Constructing the closure itself is effect-free in the caller's
        // context: the outer effect stays unconstrained.
        let effect = self.state.fresh_row();

        TypedExpr {
            kind: TypedExprKind::Lambda {
                params: typed_params,
                body: typed_body,
            },
            span,
            ty,
            effect,
        }
    }

    fn infer_let(&mut self, bindings: &[(String, Expr)], body: &[Expr], span: Span) -> TypedExpr {
        let effect = self.state.fresh_row();

        // Bindings are inferred first; their own assumptions escape to an
        // enclosing scope or the module, which is what lets definitions
        // recurse. Each bound value must be effect-free: that is what
        // makes generalizing it sound.
        let typed_bindings: Vec<(String, TypedExpr)> = bindings
            .iter()
            .map(|(name, value)| {
                let tv = self.infer_expr(value);
                self.effect_equal(tv.effect.clone(), Type::RowEmpty, tv.span);
                (name.clone(), tv)
            })
            .collect();

        let mark = self.assumptions.len();
        let (typed_body, result_ty) = self.infer_body(body, &effect);

        // Body uses of a bound name become implicit-instance constraints
        // against the binding's type: let-polymorphism.
        let monovars = self.monovar_names();
        let escaped = self.assumptions.split_off(mark);
        for assumption in escaped {
            let binding = typed_bindings
                .iter()
                .rev()
                .find(|(name, _)| *name == assumption.name);
            match binding {
                Some((_, bound)) => {
                    self.constraints.push(Constraint::ImplicitInstance {
                        ty: assumption.ty,
                        monovars: monovars.clone(),
                        template: bound.ty.clone(),
                        span: assumption.span,
                    });
                }
                None => self.assumptions.push(assumption),
            }
        }

        TypedExpr {
            kind: TypedExprKind::Let {
                bindings: typed_bindings,
                body: typed_body,
            },
            span,
            ty: result_ty,
            effect,
        }
    }

    fn infer_match(&mut self, subject: &Expr, cases: &[MatchCase], span: Span) -> TypedExpr {
        let ty = self.state.fresh_value();
        let effect = self.state.fresh_row();

        let typed_subject = self.infer_expr(subject);
        self.effect_equal(typed_subject.effect.clone(), effect.clone(), typed_subject.span);

        // One fresh payload type per case label; the subject must be the
        // variant of exactly these cases.
        let case_vars: Vec<TVar> = cases.iter().map(|_| self.state.fresh(Kind::Value)).collect();
        let row = Type::row(
            cases
                .iter()
                .zip(case_vars.iter())
                .map(|(case, tv)| (case.label.as_str(), Type::Var(tv.clone())))
                .collect(),
            Type::RowEmpty,
        );
        self.equal(typed_subject.ty.clone(), Type::variant(row), typed_subject.span);

        let typed_cases: Vec<TypedMatchCase> = cases
            .iter()
            .zip(case_vars.iter())
            .map(|(case, tv)| {
                let binder_ty = Type::Var(tv.clone());
                self.m_stack.push(tv.clone());
                let mark = self.assumptions.len();
                let (typed_body, body_ty) = self.infer_body(&case.body, &effect);

                let binder = case.binder.clone();
                let bty = binder_ty.clone();
                self.bind_monomorphic(mark, |name| {
                    (name == binder).then(|| bty.clone())
                });
                self.m_stack.pop();

                self.equal(body_ty, ty.clone(), case.span);
                TypedMatchCase {
                    label: case.label.clone(),
                    binder: case.binder.clone(),
                    binder_ty,
                    body: typed_body,
                    span: case.span,
                }
            })
            .collect();

        TypedExpr {
            kind: TypedExprKind::Match {
                subject: Box::new(typed_subject),
                cases: typed_cases,
            },
            span,
            ty,
            effect,
        }
    }

    /// `(values e₁ … eₙ)`: the expression's own type is the primary
    /// value's type; the full tuple rides the effect row as a record
    /// payload under the reserved `values` label.
    fn infer_values(&mut self, elements: &[Expr], span: Span) -> TypedExpr {
        let rest = self.state.fresh_row();
        let typed: Vec<TypedExpr> = elements
            .iter()
            .map(|e| {
                let te = self.infer_expr(e);
                self.effect_equal(te.effect.clone(), rest.clone(), te.span);
                te
            })
            .collect();

        let primary = typed
            .first()
            .map(|te| te.ty.clone())
            .unwrap_or_else(Type::void);
        let tuple = Type::record(Type::row(
            typed
                .iter()
                .enumerate()
                .map(|(i, te)| (format!("v{}", i), te.ty.clone()))
                .collect(),
            Type::RowEmpty,
        ));
        let effect = Type::row_ext(VALUES_LABEL, tuple, rest);

        TypedExpr {
            kind: TypedExprKind::Values(typed),
            span,
            ty: primary,
            effect,
        }
    }

    /// `(multiple-value-bind (x₁ … xₙ) producer body…)`: widen the
    /// consumer to the full tuple by reading the `values` label off the
    /// producer's effect row; the label is consumed, so the form's own
    /// effect is the producer's remaining tail.
    fn infer_mv_bind(
        &mut self,
        names: &[String],
        producer: &Expr,
        body: &[Expr],
        span: Span,
    ) -> TypedExpr {
        let effect = self.state.fresh_row();

        let typed_producer = self.infer_expr(producer);
        let binder_vars: Vec<TVar> = names.iter().map(|_| self.state.fresh(Kind::Value)).collect();
        let tuple = Type::record(Type::row(
            binder_vars
                .iter()
                .enumerate()
                .map(|(i, tv)| (format!("v{}", i), Type::Var(tv.clone())))
                .collect(),
            Type::RowEmpty,
        ));
        let expected_effect = Type::row_ext(VALUES_LABEL, tuple, effect.clone());
        self.effect_equal(
            typed_producer.effect.clone(),
            expected_effect,
            typed_producer.span,
        );

        let typed_names: Vec<(String, Type)> = names
            .iter()
            .zip(binder_vars.iter())
            .map(|(name, tv)| (name.clone(), Type::Var(tv.clone())))
            .collect();

        self.m_stack.extend(binder_vars.iter().cloned());
        let mark = self.assumptions.len();
        let (typed_body, result_ty) = self.infer_body(body, &effect);
        self.bind_monomorphic(mark, |name| {
            typed_names
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, t)| t.clone())
        });
        self.m_stack.truncate(self.m_stack.len() - binder_vars.len());

        TypedExpr {
            kind: TypedExprKind::MvBind {
                names: typed_names,
                producer: Box::new(typed_producer),
                body: typed_body,
            },
            span,
            ty: result_ty,
            effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn generate(expr: &Expr) -> (TypedExpr, Vec<Constraint>, Vec<Assumption>) {
        let mut state = InferState::new();
        let aliases = AliasTable::new(HashMap::new());
        let mut generator = ConstraintGenerator::new(&mut state, &aliases);
        let typed = generator.infer_expr(expr);
        let (constraints, assumptions) = generator.into_parts();
        (typed, constraints, assumptions)
    }

    #[test]
    fn test_literals_produce_no_constraints() {
        let (typed, constraints, assumptions) = generate(&Expr::number(1.0));
        assert_eq!(typed.ty, Type::number());
        assert!(constraints.is_empty());
        assert!(assumptions.is_empty());
    }

    #[test]
    fn test_variable_produces_assumption() {
        let (_, constraints, assumptions) = generate(&Expr::var("x"));
        assert!(constraints.is_empty());
        assert_eq!(assumptions.len(), 1);
        assert_eq!(assumptions[0].name, "x");
    }

    #[test]
    fn test_lambda_binds_its_parameters() {
        let (_, _, assumptions) = generate(&Expr::lambda(vec!["x"], vec![Expr::var("x")]));
        assert!(assumptions.is_empty());
    }

    #[test]
    fn test_lambda_lets_free_vars_escape() {
        let (_, _, assumptions) = generate(&Expr::lambda(vec!["x"], vec![Expr::var("y")]));
        assert_eq!(assumptions.len(), 1);
        assert_eq!(assumptions[0].name, "y");
    }

    #[test]
    fn test_sibling_scope_does_not_capture() {
        // (f (lambda (f) f)): the callee use of f must escape even though
        // the argument binds a parameter of the same name.
        let expr = Expr::call(
            Expr::var("f"),
            vec![Expr::lambda(vec!["f"], vec![Expr::var("f")])],
        );
        let (_, _, assumptions) = generate(&expr);
        assert_eq!(assumptions.len(), 1);
        assert_eq!(assumptions[0].name, "f");
    }

    #[test]
    fn test_let_emits_implicit_instance() {
        let expr = Expr::let_(
            vec![("id", Expr::lambda(vec!["x"], vec![Expr::var("x")]))],
            vec![Expr::var("id")],
        );
        let (_, constraints, assumptions) = generate(&expr);
        assert!(assumptions.is_empty());
        assert!(constraints
            .iter()
            .any(|c| matches!(c, Constraint::ImplicitInstance { .. })));
    }

    #[test]
    fn test_let_bindings_must_be_pure() {
        let expr = Expr::let_(vec![("x", Expr::number(1.0))], vec![Expr::var("x")]);
        let (_, constraints, _) = generate(&expr);
        assert!(constraints.iter().any(|c| matches!(
            c,
            Constraint::EffectEqual { right: Type::RowEmpty, .. }
        )));
    }

    #[test]
    fn test_lambda_parameters_are_monomorphic_for_inner_lets() {
        // (lambda (x) (let {y x} y)): the implicit instance for y must
        // keep x's type variable in its monomorphic set.
        let expr = Expr::lambda(
            vec!["x"],
            vec![Expr::let_(vec![("y", Expr::var("x"))], vec![Expr::var("y")])],
        );
        let (_, constraints, _) = generate(&expr);
        let implicit = constraints
            .iter()
            .find_map(|c| match c {
                Constraint::ImplicitInstance { monovars, .. } => Some(monovars),
                _ => None,
            })
            .expect("let should emit an implicit instance");
        assert!(!implicit.is_empty());
    }

    #[test]
    fn test_generator_is_deterministic() {
        let expr = Expr::lambda(
            vec!["f", "x"],
            vec![Expr::call(Expr::var("f"), vec![Expr::var("x")])],
        );
        let (t1, c1, _) = generate(&expr);
        let (t2, c2, _) = generate(&expr);
        assert_eq!(format!("{:?}", t1), format!("{:?}", t2));
        assert_eq!(c1.len(), c2.len());
    }
}
