//! Diagnostic printing for Sprig type errors.

use ariadne::{Color, ColorGenerator, Fmt, Label, Report, ReportKind, Source};

use crate::error::TypeError;

/// Print a type error with colored diagnostics over the source text.
pub fn print_error(filename: &str, source: &str, error: &TypeError) {
    let mut colors = ColorGenerator::new();
    let expected_color = colors.next();
    let found_color = colors.next();

    let span = error.span();
    let (message, note) = match error {
        TypeError::ConstantMismatch {
            expected, found, ..
        } => (
            format!(
                "Type mismatch: {} '{}', {} '{}'",
                "expected".fg(expected_color),
                expected,
                "found".fg(found_color),
                found
            ),
            Some(format!(
                "cannot unify '{}' with '{}'",
                expected, found
            )),
        ),
        TypeError::ArityMismatch {
            expected, found, ..
        } => (
            format!(
                "Wrong number of arguments: expected {}, found {}",
                expected, found
            ),
            None,
        ),
        TypeError::KindMismatch { left, right, .. } => (
            format!("Kind mismatch: cannot unify '{}' with '{}'", left, right),
            Some("row types and value types never unify with each other".to_string()),
        ),
        TypeError::OccursCheck { var, ty, .. } => (
            format!("Infinite type: {} occurs in '{}'", var, ty),
            None,
        ),
        TypeError::RowLabelMissing { label, row, .. } => (
            format!("Label :{} is missing from '{}'", label, row),
            Some("records are closed: an update cannot add new fields".to_string()),
        ),
        TypeError::RowKindMismatch { found, .. } => (
            format!("Expected a row, found '{}'", found),
            None,
        ),
        TypeError::AnnotationTooGeneral {
            annotated,
            inferred,
            ..
        } => (
            format!(
                "Annotation is too general: '{}' does not match the inferred '{}'",
                annotated, inferred
            ),
            Some("an annotation may be more specific than the inferred type, never wider".to_string()),
        ),
        TypeError::RecursiveTypeAlias { path, .. } => (
            format!("Recursive type aliases are not allowed: {}", path),
            None,
        ),
        TypeError::SolverStuck { .. } => (
            "No solvable constraint remains; this is a bug in the constraint generator"
                .to_string(),
            None,
        ),
    };

    let mut report = Report::build(ReportKind::Error, (filename, span.start..span.end))
        .with_message(&message)
        .with_label(
            Label::new((filename, span.start..span.end))
                .with_message(&message)
                .with_color(Color::Red),
        );

    if let Some(note) = note {
        report.add_note(note);
    }

    eprintln!();
    report
        .finish()
        .eprint((filename, Source::from(source)))
        .unwrap();
    eprintln!();
}
