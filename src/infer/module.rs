//! The module driver.
//!
//! Sequences a module's forms through the generator, partitions the
//! accumulated assumptions into internal, external, and unknown, solves
//! the resulting constraint set, and applies the solution back over the
//! typed tree. Unknowns are data, not errors: each carries the type
//! inferred at its use site so the caller can phrase the report.

use std::collections::HashMap;

use crate::error::Result;
use crate::syntax::ast::{Expr, Module, ModuleForm};
use crate::types::{Substitutable, Type};

use super::aliases::AliasTable;
use super::annot::lower_annotation;
use super::constraint::Constraint;
use super::env::ExternalEnv;
use super::infer::ConstraintGenerator;
use super::solve::solve;
use super::state::InferState;
use super::typed::{TypedForm, TypedModule, Unknown};

/// Infer a whole module against an external environment.
///
/// Returns the fully typed module plus the unresolved variable uses,
/// both with the final substitution applied.
pub fn infer_module(
    module: &Module,
    externals: &ExternalEnv,
) -> Result<(TypedModule, Vec<Unknown>)> {
    let mut state = InferState::new();

    // Aliases first: collect, reject cycles, and pre-lower the bodies for
    // the typed output.
    let mut aliases = AliasTable::new(externals.aliases().clone());
    for form in &module.forms {
        if let ModuleForm::DefAlias { name, ty, span } = form {
            aliases.insert(name.clone(), ty.clone(), *span);
        }
    }
    aliases.check_cycles()?;

    let mut lowered_aliases: HashMap<String, Type> = HashMap::new();
    for form in &module.forms {
        if let ModuleForm::DefAlias { name, ty, .. } = form {
            let lowered = lower_annotation(&mut state, &aliases, ty);
            lowered_aliases.insert(name.clone(), lowered);
        }
    }

    // Generate constraints over every form. Definition types are recorded
    // as inference proceeds so assumptions can be resolved against them
    // afterwards, which is what allows forward and recursive references.
    let mut generator = ConstraintGenerator::new(&mut state, &aliases);
    let mut typed_forms = Vec::new();
    let mut def_types: HashMap<String, Type> = HashMap::new();

    for form in &module.forms {
        match form {
            ModuleForm::Def { name, value, span } => {
                let typed = generator.infer_expr(value);
                def_types.insert(name.clone(), typed.ty.clone());
                typed_forms.push(TypedForm::Def {
                    name: name.clone(),
                    ty: typed.ty.clone(),
                    value: typed,
                    span: *span,
                });
            }
            ModuleForm::DefAlias { name, span, .. } => {
                typed_forms.push(TypedForm::DefAlias {
                    name: name.clone(),
                    ty: lowered_aliases[name].clone(),
                    span: *span,
                });
            }
            ModuleForm::Export { names, span } => {
                typed_forms.push(TypedForm::Export {
                    names: names.clone(),
                    span: *span,
                });
            }
            ModuleForm::Expr(expr) => {
                let typed = generator.infer_expr(expr);
                typed_forms.push(TypedForm::Expr(typed));
            }
        }
    }

    let (mut constraints, assumptions) = generator.into_parts();

    // Partition assumptions: module definitions become implicit instances
    // (with an empty monomorphic set at module level), externally known
    // names become explicit instances, and the rest are unknowns.
    let mut unknowns = Vec::new();
    for assumption in assumptions {
        if let Some(def_ty) = def_types.get(&assumption.name) {
            constraints.push(Constraint::ImplicitInstance {
                ty: assumption.ty,
                monovars: Default::default(),
                template: def_ty.clone(),
                span: assumption.span,
            });
        } else if let Some(scheme) = externals.lookup(&assumption.name) {
            constraints.push(Constraint::ExplicitInstance {
                ty: assumption.ty,
                scheme: scheme.clone(),
                span: assumption.span,
            });
        } else {
            unknowns.push(Unknown {
                name: assumption.name,
                ty: assumption.ty,
                span: assumption.span,
            });
        }
    }

    let solution = solve(&mut state, constraints)?;

    let typed = TypedModule {
        forms: typed_forms,
    }
    .apply_subst(&solution);
    let unknowns = unknowns
        .into_iter()
        .map(|u| Unknown {
            name: u.name,
            ty: solution.apply(&u.ty),
            span: u.span,
        })
        .collect();

    Ok((typed, unknowns))
}

/// Infer a single expression, as a one-form module.
pub fn infer_expression(expr: &Expr, externals: &ExternalEnv) -> Result<(Type, Vec<Unknown>)> {
    let module = Module::of_expr(expr.clone());
    let (typed, unknowns) = infer_module(&module, externals)?;
    match typed.forms.into_iter().next() {
        Some(TypedForm::Expr(e)) => Ok((e.ty, unknowns)),
        _ => unreachable!("a single-expression module yields a single expression form"),
    }
}
