//! The typed tree produced by inference.
//!
//! Every expression node carries its value type and its effect row;
//! definitions carry the type of their value. The driver applies the
//! final substitution over whole typed modules through `Substitutable`.

use std::collections::HashSet;

use crate::syntax::Span;
use crate::types::{Subst, Substitutable, TVar, Type};

/// An expression annotated with its inferred type and effect.
#[derive(Clone, Debug)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub span: Span,
    /// The value type of this expression.
    pub ty: Type,
    /// The effect row describing effects performed when evaluating it.
    pub effect: Type,
}

#[derive(Clone, Debug)]
pub enum TypedExprKind {
    Number(f64),
    Str(String),
    Boolean(bool),
    Unknown,
    Var(String),
    Keyword(String),
    Vector(Vec<TypedExpr>),
    Record {
        fields: Vec<(String, TypedExpr)>,
        tail: Option<Box<TypedExpr>>,
    },
    If {
        cond: Box<TypedExpr>,
        then: Box<TypedExpr>,
        els: Box<TypedExpr>,
    },
    Lambda {
        /// Parameters with their inferred types.
        params: Vec<(String, Type)>,
        body: Vec<TypedExpr>,
    },
    Call {
        callee: Box<TypedExpr>,
        args: Vec<TypedExpr>,
    },
    Let {
        bindings: Vec<(String, TypedExpr)>,
        body: Vec<TypedExpr>,
    },
    /// The annotation's type is folded into the node's `ty`.
    Annotated { expr: Box<TypedExpr> },
    Do { forms: Vec<TypedExpr> },
    Match {
        subject: Box<TypedExpr>,
        cases: Vec<TypedMatchCase>,
    },
    Values(Vec<TypedExpr>),
    MvBind {
        names: Vec<(String, Type)>,
        producer: Box<TypedExpr>,
        body: Vec<TypedExpr>,
    },
}

/// One typed case of a `match` form.
#[derive(Clone, Debug)]
pub struct TypedMatchCase {
    pub label: String,
    pub binder: String,
    pub binder_ty: Type,
    pub body: Vec<TypedExpr>,
    pub span: Span,
}

/// A fully typed module.
#[derive(Clone, Debug)]
pub struct TypedModule {
    pub forms: Vec<TypedForm>,
}

#[derive(Clone, Debug)]
pub enum TypedForm {
    Def {
        name: String,
        value: TypedExpr,
        /// The type of the definition's value.
        ty: Type,
        span: Span,
    },
    DefAlias {
        name: String,
        ty: Type,
        span: Span,
    },
    Export { names: Vec<String>, span: Span },
    Expr(TypedExpr),
}

/// A variable use whose name resolved to no binding. Carries the type
/// inferred at the use site so the caller can phrase the report.
#[derive(Clone, Debug)]
pub struct Unknown {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

impl Substitutable for TypedExpr {
    fn apply_subst(&self, subst: &Subst) -> Self {
        TypedExpr {
            kind: self.kind.apply_subst(subst),
            span: self.span,
            ty: self.ty.apply_subst(subst),
            effect: self.effect.apply_subst(subst),
        }
    }

    fn free_vars(&self) -> HashSet<TVar> {
        let mut vars = self.ty.free_vars();
        vars.extend(self.effect.free_vars());
        vars.extend(self.kind.free_vars());
        vars
    }
}

impl Substitutable for TypedExprKind {
    fn apply_subst(&self, subst: &Subst) -> Self {
        match self {
            TypedExprKind::Number(_)
            | TypedExprKind::Str(_)
            | TypedExprKind::Boolean(_)
            | TypedExprKind::Unknown
            | TypedExprKind::Var(_)
            | TypedExprKind::Keyword(_) => self.clone(),
            TypedExprKind::Vector(elements) => {
                TypedExprKind::Vector(elements.apply_subst(subst))
            }
            TypedExprKind::Record { fields, tail } => TypedExprKind::Record {
                fields: fields
                    .iter()
                    .map(|(l, e)| (l.clone(), e.apply_subst(subst)))
                    .collect(),
                tail: tail.as_ref().map(|e| Box::new(e.apply_subst(subst))),
            },
            TypedExprKind::If { cond, then, els } => TypedExprKind::If {
                cond: Box::new(cond.apply_subst(subst)),
                then: Box::new(then.apply_subst(subst)),
                els: Box::new(els.apply_subst(subst)),
            },
            TypedExprKind::Lambda { params, body } => TypedExprKind::Lambda {
                params: params
                    .iter()
                    .map(|(n, t)| (n.clone(), t.apply_subst(subst)))
                    .collect(),
                body: body.apply_subst(subst),
            },
            TypedExprKind::Call { callee, args } => TypedExprKind::Call {
                callee: Box::new(callee.apply_subst(subst)),
                args: args.apply_subst(subst),
            },
            TypedExprKind::Let { bindings, body } => TypedExprKind::Let {
                bindings: bindings
                    .iter()
                    .map(|(n, e)| (n.clone(), e.apply_subst(subst)))
                    .collect(),
                body: body.apply_subst(subst),
            },
            TypedExprKind::Annotated { expr } => TypedExprKind::Annotated {
                expr: Box::new(expr.apply_subst(subst)),
            },
            TypedExprKind::Do { forms } => TypedExprKind::Do {
                forms: forms.apply_subst(subst),
            },
            TypedExprKind::Match { subject, cases } => TypedExprKind::Match {
                subject: Box::new(subject.apply_subst(subst)),
                cases: cases.apply_subst(subst),
            },
            TypedExprKind::Values(elements) => {
                TypedExprKind::Values(elements.apply_subst(subst))
            }
            TypedExprKind::MvBind {
                names,
                producer,
                body,
            } => TypedExprKind::MvBind {
                names: names
                    .iter()
                    .map(|(n, t)| (n.clone(), t.apply_subst(subst)))
                    .collect(),
                producer: Box::new(producer.apply_subst(subst)),
                body: body.apply_subst(subst),
            },
        }
    }

    fn free_vars(&self) -> HashSet<TVar> {
        let mut vars = HashSet::new();
        match self {
            TypedExprKind::Number(_)
            | TypedExprKind::Str(_)
            | TypedExprKind::Boolean(_)
            | TypedExprKind::Unknown
            | TypedExprKind::Var(_)
            | TypedExprKind::Keyword(_) => {}
            TypedExprKind::Vector(elements) | TypedExprKind::Values(elements) => {
                vars.extend(elements.free_vars())
            }
            TypedExprKind::Record { fields, tail } => {
                for (_, e) in fields {
                    vars.extend(e.free_vars());
                }
                vars.extend(tail.as_deref().map(|e| e.free_vars()).unwrap_or_default());
            }
            TypedExprKind::If { cond, then, els } => {
                vars.extend(cond.free_vars());
                vars.extend(then.free_vars());
                vars.extend(els.free_vars());
            }
            TypedExprKind::Lambda { params, body } => {
                for (_, t) in params {
                    vars.extend(t.free_vars());
                }
                vars.extend(body.free_vars());
            }
            TypedExprKind::Call { callee, args } => {
                vars.extend(callee.free_vars());
                vars.extend(args.free_vars());
            }
            TypedExprKind::Let { bindings, body } => {
                for (_, e) in bindings {
                    vars.extend(e.free_vars());
                }
                vars.extend(body.free_vars());
            }
            TypedExprKind::Annotated { expr } => vars.extend(expr.free_vars()),
            TypedExprKind::Do { forms } => vars.extend(forms.free_vars()),
            TypedExprKind::Match { subject, cases } => {
                vars.extend(subject.free_vars());
                vars.extend(cases.free_vars());
            }
            TypedExprKind::MvBind {
                names,
                producer,
                body,
            } => {
                for (_, t) in names {
                    vars.extend(t.free_vars());
                }
                vars.extend(producer.free_vars());
                vars.extend(body.free_vars());
            }
        }
        vars
    }
}

impl Substitutable for TypedMatchCase {
    fn apply_subst(&self, subst: &Subst) -> Self {
        TypedMatchCase {
            label: self.label.clone(),
            binder: self.binder.clone(),
            binder_ty: self.binder_ty.apply_subst(subst),
            body: self.body.apply_subst(subst),
            span: self.span,
        }
    }

    fn free_vars(&self) -> HashSet<TVar> {
        let mut vars = self.binder_ty.free_vars();
        vars.extend(self.body.free_vars());
        vars
    }
}

impl Substitutable for TypedForm {
    fn apply_subst(&self, subst: &Subst) -> Self {
        match self {
            TypedForm::Def {
                name,
                value,
                ty,
                span,
            } => TypedForm::Def {
                name: name.clone(),
                value: value.apply_subst(subst),
                ty: ty.apply_subst(subst),
                span: *span,
            },
            TypedForm::DefAlias { name, ty, span } => TypedForm::DefAlias {
                name: name.clone(),
                ty: ty.apply_subst(subst),
                span: *span,
            },
            TypedForm::Export { .. } => self.clone(),
            TypedForm::Expr(e) => TypedForm::Expr(e.apply_subst(subst)),
        }
    }

    fn free_vars(&self) -> HashSet<TVar> {
        match self {
            TypedForm::Def { value, ty, .. } => {
                let mut vars = value.free_vars();
                vars.extend(ty.free_vars());
                vars
            }
            TypedForm::DefAlias { ty, .. } => ty.free_vars(),
            TypedForm::Export { .. } => HashSet::new(),
            TypedForm::Expr(e) => e.free_vars(),
        }
    }
}

impl Substitutable for TypedModule {
    fn apply_subst(&self, subst: &Subst) -> Self {
        TypedModule {
            forms: self.forms.apply_subst(subst),
        }
    }

    fn free_vars(&self) -> HashSet<TVar> {
        self.forms.free_vars()
    }
}
