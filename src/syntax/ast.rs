//! Abstract syntax tree for Sprig modules.
//!
//! The reader and surface-syntax desugarer live outside this crate; they
//! hand the inference core an already-parsed tree in this shape. Every node
//! carries the span of the surface form it came from so that type errors
//! can point back into the source.

use super::span::Span;

/// A module: the unit of inference.
#[derive(Debug, Clone)]
pub struct Module {
    pub forms: Vec<ModuleForm>,
    pub span: Span,
}

/// Top-level forms of a module.
#[derive(Debug, Clone)]
pub enum ModuleForm {
    /// `(def name value)`
    Def {
        name: String,
        value: Expr,
        span: Span,
    },
    /// `(defalias name type)`
    DefAlias {
        name: String,
        ty: TypeExpr,
        span: Span,
    },
    /// `(export name …)`
    Export { names: Vec<String>, span: Span },
    /// A bare expression evaluated for its value.
    Expr(Expr),
}

/// An expression with its source span.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression forms.
///
/// `Unknown` stands for a surface form the reader could not make sense of;
/// it keeps inference going with a fresh, unconstrained type.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Number(f64),
    Str(String),
    Boolean(bool),
    Unknown,
    /// Variable reference.
    Var(String),
    /// A keyword in callee position, `(:label record)`: a field accessor.
    Keyword(String),
    /// `[e₁ … eₙ]`
    Vector(Vec<Expr>),
    /// `{:l₁ v₁ … :lₙ vₙ}`, optionally updating an existing record
    /// through `| tail`.
    Record {
        fields: Vec<(String, Expr)>,
        tail: Option<Box<Expr>>,
    },
    /// `(if cond then else)`
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
    },
    /// `(lambda (x₁ … xₙ) body…)` — body is a non-empty sequence.
    Lambda { params: Vec<String>, body: Vec<Expr> },
    /// `(f a₁ … aₙ)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `(let {x₁ v₁ … xₙ vₙ} body…)`
    Let {
        bindings: Vec<(String, Expr)>,
        body: Vec<Expr>,
    },
    /// `(the T e)` — user type annotation.
    Annotated { ty: TypeExpr, expr: Box<Expr> },
    /// `(do f₁ … fₙ)` — the last form is the returning form.
    Do { forms: Vec<Expr> },
    /// `(match v ({:L x} body…)…)`
    Match {
        subject: Box<Expr>,
        cases: Vec<MatchCase>,
    },
    /// `(values e₁ … eₙ)`
    Values(Vec<Expr>),
    /// `(multiple-value-bind (x₁ … xₙ) producer body…)`
    MvBind {
        names: Vec<String>,
        producer: Box<Expr>,
        body: Vec<Expr>,
    },
}

/// One case of a `match` form: `({:label binder} body…)`.
#[derive(Debug, Clone)]
pub struct MatchCase {
    pub label: String,
    pub binder: String,
    pub body: Vec<Expr>,
    pub span: Span,
}

/// A type annotation as written by the user, before lowering to a monotype.
///
/// The reader decides which surface names are type variables and which are
/// constants; by the time an annotation reaches the core the distinction is
/// syntactic (`Var` vs `Name`).
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// A type constant or alias reference: `number`, `point`.
    Name(String),
    /// A user-specified type variable: `a`.
    Var(String),
    /// `_` (fresh per occurrence) or `_name` (shared within one annotation).
    Wildcard(Option<String>),
    /// `(-> p₁ … pₙ effect result)`; a missing effect slot reads as `_`.
    Fn {
        params: Vec<TypeExpr>,
        effect: Option<Box<TypeExpr>>,
        result: Box<TypeExpr>,
    },
    /// `[t]`
    Vector(Box<TypeExpr>),
    /// `{:l₁ t₁ … | tail?}`
    Record {
        fields: Vec<(String, TypeExpr)>,
        tail: Option<Box<TypeExpr>>,
    },
    /// `(variant :L₁ t₁ … | tail?)`
    Variant {
        cases: Vec<(String, TypeExpr)>,
        tail: Option<Box<TypeExpr>>,
    },
    /// `(effect l₁ … | tail?)`; labels may carry a payload type.
    Effect {
        labels: Vec<(String, Option<TypeExpr>)>,
        tail: Option<Box<TypeExpr>>,
    },
    /// Application of a named constructor: `(pair a b)`.
    App { name: String, args: Vec<TypeExpr> },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    // Construction helpers. The reader builds spanned nodes directly; these
    // exist for building trees in code, so they default the span.

    pub fn number(value: f64) -> Self {
        Expr::new(ExprKind::Number(value), Span::default())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::Str(value.into()), Span::default())
    }

    pub fn boolean(value: bool) -> Self {
        Expr::new(ExprKind::Boolean(value), Span::default())
    }

    pub fn unknown() -> Self {
        Expr::new(ExprKind::Unknown, Span::default())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Var(name.into()), Span::default())
    }

    pub fn keyword(label: impl Into<String>) -> Self {
        Expr::new(ExprKind::Keyword(label.into()), Span::default())
    }

    pub fn vector(elements: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Vector(elements), Span::default())
    }

    pub fn record(fields: Vec<(&str, Expr)>) -> Self {
        Expr::new(
            ExprKind::Record {
                fields: fields
                    .into_iter()
                    .map(|(l, e)| (l.to_string(), e))
                    .collect(),
                tail: None,
            },
            Span::default(),
        )
    }

    pub fn record_update(fields: Vec<(&str, Expr)>, tail: Expr) -> Self {
        Expr::new(
            ExprKind::Record {
                fields: fields
                    .into_iter()
                    .map(|(l, e)| (l.to_string(), e))
                    .collect(),
                tail: Some(Box::new(tail)),
            },
            Span::default(),
        )
    }

    pub fn if_(cond: Expr, then: Expr, els: Expr) -> Self {
        Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                els: Box::new(els),
            },
            Span::default(),
        )
    }

    pub fn lambda(params: Vec<&str>, body: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::Lambda {
                params: params.into_iter().map(str::to_string).collect(),
                body,
            },
            Span::default(),
        )
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            Span::default(),
        )
    }

    pub fn let_(bindings: Vec<(&str, Expr)>, body: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::Let {
                bindings: bindings
                    .into_iter()
                    .map(|(n, e)| (n.to_string(), e))
                    .collect(),
                body,
            },
            Span::default(),
        )
    }

    pub fn the(ty: TypeExpr, expr: Expr) -> Self {
        Expr::new(
            ExprKind::Annotated {
                ty,
                expr: Box::new(expr),
            },
            Span::default(),
        )
    }

    pub fn do_(forms: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Do { forms }, Span::default())
    }

    pub fn match_(subject: Expr, cases: Vec<MatchCase>) -> Self {
        Expr::new(
            ExprKind::Match {
                subject: Box::new(subject),
                cases,
            },
            Span::default(),
        )
    }

    pub fn values(elements: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Values(elements), Span::default())
    }

    pub fn mv_bind(names: Vec<&str>, producer: Expr, body: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::MvBind {
                names: names.into_iter().map(str::to_string).collect(),
                producer: Box::new(producer),
                body,
            },
            Span::default(),
        )
    }
}

impl MatchCase {
    pub fn new(label: impl Into<String>, binder: impl Into<String>, body: Vec<Expr>) -> Self {
        MatchCase {
            label: label.into(),
            binder: binder.into(),
            body,
            span: Span::default(),
        }
    }
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        TypeExpr { kind, span }
    }

    pub fn name(name: impl Into<String>) -> Self {
        TypeExpr::new(TypeExprKind::Name(name.into()), Span::default())
    }

    pub fn var(name: impl Into<String>) -> Self {
        TypeExpr::new(TypeExprKind::Var(name.into()), Span::default())
    }

    pub fn wildcard() -> Self {
        TypeExpr::new(TypeExprKind::Wildcard(None), Span::default())
    }

    pub fn named_wildcard(name: impl Into<String>) -> Self {
        TypeExpr::new(TypeExprKind::Wildcard(Some(name.into())), Span::default())
    }

    pub fn fn_(params: Vec<TypeExpr>, effect: Option<TypeExpr>, result: TypeExpr) -> Self {
        TypeExpr::new(
            TypeExprKind::Fn {
                params,
                effect: effect.map(Box::new),
                result: Box::new(result),
            },
            Span::default(),
        )
    }

    pub fn vector(element: TypeExpr) -> Self {
        TypeExpr::new(TypeExprKind::Vector(Box::new(element)), Span::default())
    }

    pub fn record(fields: Vec<(&str, TypeExpr)>, tail: Option<TypeExpr>) -> Self {
        TypeExpr::new(
            TypeExprKind::Record {
                fields: fields
                    .into_iter()
                    .map(|(l, t)| (l.to_string(), t))
                    .collect(),
                tail: tail.map(Box::new),
            },
            Span::default(),
        )
    }
}

impl Module {
    pub fn new(forms: Vec<ModuleForm>) -> Self {
        Module {
            forms,
            span: Span::default(),
        }
    }

    /// A module consisting of a single expression form.
    pub fn of_expr(expr: Expr) -> Self {
        Module::new(vec![ModuleForm::Expr(expr)])
    }
}
