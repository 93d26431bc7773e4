//! Property-based tests for the inference invariants.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::builtins::initial_env;
use crate::infer::{infer_expression, unify, InferState};
use crate::syntax::ast::Expr;
use crate::syntax::Span;
use crate::types::{Kind, PrettyContext, Subst, TVar, TVarName, Type};

// Strategy for var-free leaf types.
fn leaf_type() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::number()),
        Just(Type::string()),
        Just(Type::boolean()),
        Just(Type::void()),
    ]
}

// Strategy for var-free monotypes of bounded depth, including records
// and functions (whose effect slots are closed rows here).
fn ground_type() -> impl Strategy<Value = Type> {
    leaf_type().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::vector),
            proptest::collection::btree_map(r"[a-z]{1,4}", inner.clone(), 0..3).prop_map(
                |fields| {
                    Type::record(Type::row(
                        fields.into_iter().collect::<Vec<_>>(),
                        Type::RowEmpty,
                    ))
                }
            ),
            (inner.clone(), inner).prop_map(|(param, ret)| {
                Type::function(vec![param], Type::RowEmpty, ret)
            }),
        ]
    })
}

// Strategy for monotypes that may contain value variables with ids below
// `var_bound`.
fn monotype(var_bound: u32) -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![
        leaf_type(),
        (0..var_bound).prop_map(|id| Type::Var(TVar::generated(id, Kind::Value))),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::vector),
            proptest::collection::btree_map(r"[a-z]{1,4}", inner.clone(), 0..3).prop_map(
                |fields| {
                    Type::record(Type::row(
                        fields.into_iter().collect::<Vec<_>>(),
                        Type::RowEmpty,
                    ))
                }
            ),
            (inner.clone(), inner).prop_map(|(param, ret)| {
                Type::function(vec![param], Type::RowEmpty, ret)
            }),
        ]
    })
}

/// Replace some subtrees of `ty` with fresh variables of the subtree's
/// kind, consuming one decision per node visited.
fn abstract_type(state: &mut InferState, ty: &Type, decisions: &mut Vec<bool>) -> Type {
    if decisions.pop().unwrap_or(false) {
        return Type::Var(state.fresh(ty.kind()));
    }
    match ty {
        Type::Const(_) | Type::RowEmpty | Type::Var(_) => ty.clone(),
        Type::App { op, args } => Type::App {
            op: op.clone(),
            args: args
                .iter()
                .map(|a| abstract_type(state, a, decisions))
                .collect(),
        },
        Type::RowExt { label, field, tail } => Type::RowExt {
            label: label.clone(),
            field: Box::new(abstract_type(state, field, decisions)),
            tail: Box::new(abstract_type(state, tail, decisions)),
        },
    }
}

// An acyclic substitution: variable `i` may only map to types whose
// variables have strictly larger ids, so application terminates and the
// fixpoint is reachable.
fn acyclic_subst() -> impl Strategy<Value = Subst> {
    proptest::collection::vec(leaf_type(), 1..6).prop_map(|leaves| {
        let mut subst = Subst::empty();
        for (i, leaf) in leaves.iter().enumerate() {
            let i = i as u32;
            let target = if i + 1 < leaves.len() as u32 && i % 2 == 0 {
                // Chain through the next variable to exercise the
                // fixpoint in apply.
                Type::function(
                    vec![Type::Var(TVar::generated(i + 1, Kind::Value))],
                    Type::Var(TVar::generated(5000 + i, Kind::Row)),
                    leaf.clone(),
                )
            } else {
                leaf.clone()
            };
            subst.insert(TVarName::Generated(i), target);
        }
        subst
    })
}

proptest! {
    // apply(s, apply(s, t)) == apply(s, t)
    #[test]
    fn subst_application_is_idempotent(subst in acyclic_subst(), ty in monotype(8)) {
        let once = subst.apply(&ty);
        let twice = subst.apply(&once);
        prop_assert_eq!(once, twice);
    }

    // Two independent abstractions of one ground type must unify, and
    // every binding in the result maps a variable to a type of the same
    // kind.
    #[test]
    fn unification_preserves_kinds(
        ground in ground_type(),
        mut left_decisions in proptest::collection::vec(any::<bool>(), 0..32),
        mut right_decisions in proptest::collection::vec(any::<bool>(), 0..32),
    ) {
        let mut state = InferState::new();
        let t1 = abstract_type(&mut state, &ground, &mut left_decisions);
        let t2 = abstract_type(&mut state, &ground, &mut right_decisions);

        let mut kinds: HashMap<TVarName, Kind> = HashMap::new();
        for tv in t1.free_vars().into_iter().chain(t2.free_vars()) {
            kinds.insert(tv.name, tv.kind);
        }

        let sub = unify(&mut state, Span::default(), &t1, &t2).unwrap();
        for (name, bound) in sub.iter() {
            // Variables invented by row rewriting are not in the map;
            // every variable we created must bind at its own kind.
            if let Some(kind) = kinds.get(name) {
                prop_assert_eq!(*kind, bound.kind());
            }
        }
        // Both sides collapse to the same type under the solution.
        prop_assert_eq!(sub.apply(&t1), sub.apply(&t2));
    }

    // Two rows listing the same distinct labels in different orders unify
    // without introducing any new tail variable.
    #[test]
    fn rows_unify_up_to_permutation(
        fields in proptest::collection::btree_map(r"[a-z]{1,6}", leaf_type(), 1..6),
        seed in any::<u64>(),
    ) {
        let ordered: Vec<(String, Type)> = fields.into_iter().collect();
        let mut shuffled = ordered.clone();
        // A deterministic shuffle driven by the seed.
        let len = shuffled.len();
        for i in 0..len {
            let j = (seed as usize).wrapping_mul(i + 1) % len;
            shuffled.swap(i, j);
        }

        let r1 = Type::row(ordered, Type::RowEmpty);
        let r2 = Type::row(shuffled, Type::RowEmpty);

        let mut state = InferState::new();
        let sub = unify(&mut state, Span::default(), &r1, &r2).unwrap();
        prop_assert!(sub.is_empty());
    }

    // Unification never produces a self-referential binding: either it
    // fails the occurs check or every binding is well-founded.
    #[test]
    fn occurs_soundness(ty in monotype(4)) {
        let mut state = InferState::new();
        for _ in 0..3000 {
            state.fresh(Kind::Value);
        }
        let probe = Type::Var(TVar::generated(0, Kind::Value));
        match unify(&mut state, Span::default(), &probe, &ty) {
            Ok(sub) => {
                for (name, bound) in sub.iter() {
                    prop_assert!(
                        !bound.free_var_names().contains(name),
                        "binding {:?} -> {} is self-referential",
                        name,
                        bound
                    );
                }
            }
            // An occurs failure is the sound outcome when ty contains
            // the probe variable.
            Err(_) => {}
        }
    }

    // For a fixed fresh-variable seed, inferring the same input twice
    // yields identical types and identical printed output.
    #[test]
    fn inference_is_deterministic(n in 0.0..100.0f64, label in r"[a-z]{1,5}") {
        let expr = Expr::let_(
            vec![("id", Expr::lambda(vec!["x"], vec![Expr::var("x")]))],
            vec![Expr::call(
                Expr::var("id"),
                vec![Expr::record(vec![(label.as_str(), Expr::number(n))])],
            )],
        );

        let (t1, _) = infer_expression(&expr, &initial_env()).unwrap();
        let (t2, _) = infer_expression(&expr, &initial_env()).unwrap();
        prop_assert_eq!(t1.clone(), t2);
        prop_assert_eq!(
            PrettyContext::new().format_type(&t1),
            format!("{{:{} number}}", label)
        );
    }
}
