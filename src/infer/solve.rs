//! The constraint solver.
//!
//! A work-list scheduler over the constraints emitted by the generator.
//! Equality constraints discharge through unification; explicit-instance
//! constraints instantiate their scheme and reduce to equality;
//! implicit-instance constraints wait until the variables they would
//! generalize are no longer being refined by any other pending
//! constraint, then generalize and reduce to explicit instances.
//!
//! The work list is processed in emission order and every step is
//! deterministic, so identical inputs produce identical substitutions,
//! error messages, and generalization choices.

use std::collections::{HashSet, VecDeque};

use crate::error::{Result, TypeError};
use crate::types::{Scheme, Subst, TVarName};

use super::constraint::{ActiveVars, Constraint};
use super::state::InferState;
use super::unify::unify;

/// Solve a constraint list, returning the satisfying substitution.
pub fn solve(state: &mut InferState, constraints: Vec<Constraint>) -> Result<Subst> {
    let mut solution = Subst::empty();
    let mut queue: VecDeque<Constraint> = constraints.into();
    // Consecutive deferrals; a full lap without progress means no
    // constraint is solvable and the generator emitted an unsolvable set.
    let mut deferred = 0usize;

    while let Some(constraint) = queue.pop_front() {
        match constraint {
            Constraint::Equal { left, right, span }
            | Constraint::EffectEqual { left, right, span } => {
                let sub = unify(state, span, &left, &right)?;
                if !sub.is_empty() {
                    for pending in queue.iter_mut() {
                        pending.apply_mut(&sub);
                    }
                    solution = sub.compose(&solution);
                }
                deferred = 0;
            }

            Constraint::ExplicitInstance { ty, scheme, span } => {
                let instance = state.instantiate(&scheme);
                queue.push_back(Constraint::Equal {
                    left: ty,
                    right: instance,
                    span,
                });
                deferred = 0;
            }

            Constraint::ImplicitInstance {
                ty,
                monovars,
                template,
                span,
            } => {
                if solvable(&monovars, &template, &queue) {
                    let scheme = Scheme::quantify(&template, &monovars);
                    queue.push_back(Constraint::ExplicitInstance { ty, scheme, span });
                    deferred = 0;
                } else {
                    deferred += 1;
                    if deferred > queue.len() {
                        return Err(TypeError::SolverStuck { span });
                    }
                    queue.push_back(Constraint::ImplicitInstance {
                        ty,
                        monovars,
                        template,
                        span,
                    });
                }
            }
        }
    }

    Ok(solution)
}

/// An implicit-instance constraint may generalize only once the variables
/// it would quantify no longer appear active in any *other* pending
/// constraint; otherwise generalization would freeze variables that are
/// still being refined.
fn solvable(
    monovars: &HashSet<TVarName>,
    template: &crate::types::Type,
    rest: &VecDeque<Constraint>,
) -> bool {
    let generalizable: HashSet<TVarName> = template
        .free_var_names()
        .into_iter()
        .filter(|name| !monovars.contains(name))
        .collect();
    if generalizable.is_empty() {
        return true;
    }
    let (front, back) = rest.as_slices();
    let mut active = front.active_vars();
    active.extend(back.active_vars());
    generalizable.is_disjoint(&active)
}
