//! Error types for the Sprig type checker.

use crate::syntax::Span;
use thiserror::Error;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, TypeError>;

/// Errors surfaced by the inference core.
///
/// The constraint generator never fails; every failure originates in the
/// solver (on a specific constraint, whose carrier node provides the span)
/// or in the alias cycle detector. Types are carried pre-rendered, after
/// the substitution in force at the point of failure.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("cannot unify {expected} with {found}")]
    ConstantMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("wrong number of type arguments: expected {expected}, found {found}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("kind mismatch: cannot unify {left} with {right}")]
    KindMismatch {
        left: String,
        right: String,
        span: Span,
    },

    #[error("infinite type: {var} occurs in {ty}")]
    OccursCheck { var: String, ty: String, span: Span },

    #[error("label :{label} is missing from {row}")]
    RowLabelMissing {
        label: String,
        row: String,
        span: Span,
    },

    #[error("expected a row, found {found}")]
    RowKindMismatch { found: String, span: Span },

    #[error("annotation is too general: {annotated} does not match {inferred}")]
    AnnotationTooGeneral {
        annotated: String,
        inferred: String,
        span: Span,
    },

    #[error("recursive type aliases are not allowed: {path}")]
    RecursiveTypeAlias { path: String, span: Span },

    #[error("no solvable constraint remains")]
    SolverStuck { span: Span },
}

impl TypeError {
    /// The source location the error points at.
    pub fn span(&self) -> Span {
        match self {
            TypeError::ConstantMismatch { span, .. } => *span,
            TypeError::ArityMismatch { span, .. } => *span,
            TypeError::KindMismatch { span, .. } => *span,
            TypeError::OccursCheck { span, .. } => *span,
            TypeError::RowLabelMissing { span, .. } => *span,
            TypeError::RowKindMismatch { span, .. } => *span,
            TypeError::AnnotationTooGeneral { span, .. } => *span,
            TypeError::RecursiveTypeAlias { span, .. } => *span,
            TypeError::SolverStuck { span } => *span,
        }
    }
}
