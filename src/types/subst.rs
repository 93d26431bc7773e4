//! Substitution for type inference.
//!
//! Implements the substitution data structure and the Substitutable trait
//! for applying substitutions to types, schemes, and other structures.
//! Application is a fixpoint per call: if the image of a variable itself
//! contains variables still in the domain, they are substituted as well.

use std::collections::{HashMap, HashSet};

use super::ty::{Scheme, TVar, TVarName, Type};

/// A substitution mapping type variable names to monotypes.
#[derive(Clone, Debug, Default)]
pub struct Subst {
    map: HashMap<TVarName, Type>,
}

impl Subst {
    /// Create an empty substitution.
    pub fn empty() -> Self {
        Subst {
            map: HashMap::new(),
        }
    }

    /// Create a singleton substitution.
    pub fn singleton(var: TVarName, ty: Type) -> Self {
        let mut map = HashMap::new();
        map.insert(var, ty);
        Subst { map }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Get the type for a variable, if present.
    pub fn get(&self, var: &TVarName) -> Option<&Type> {
        self.map.get(var)
    }

    /// Check if a variable is in the domain.
    pub fn contains(&self, var: &TVarName) -> bool {
        self.map.contains_key(var)
    }

    /// Insert a mapping. The caller is responsible for the occurs check;
    /// the unifier never inserts a self-referential binding.
    pub fn insert(&mut self, var: TVarName, ty: Type) {
        self.map.insert(var, ty);
    }

    /// The domain (set of variable names) of this substitution.
    pub fn domain(&self) -> HashSet<TVarName> {
        self.map.keys().cloned().collect()
    }

    /// Free variables occurring in the range of this substitution.
    pub fn free_vars(&self) -> HashSet<TVar> {
        let mut vars = HashSet::new();
        for ty in self.map.values() {
            vars.extend(ty.free_vars());
        }
        vars
    }

    /// Compose two substitutions: apply `self` to the range of `other`,
    /// then union. Bindings in `self` win on domain overlap, so
    /// `self.compose(other)` behaves as self ∘ other.
    pub fn compose(&self, other: &Subst) -> Subst {
        let mut map = HashMap::new();
        for (var, ty) in &other.map {
            map.insert(var.clone(), self.apply(ty));
        }
        for (var, ty) in &self.map {
            map.insert(var.clone(), ty.clone());
        }
        Subst { map }
    }

    /// Apply this substitution to a substitutable value.
    pub fn apply<T: Substitutable>(&self, t: &T) -> T {
        t.apply_subst(self)
    }

    /// A copy of this substitution with certain variables removed.
    pub fn remove_vars(&self, vars: &[TVar]) -> Subst {
        let mut map = self.map.clone();
        for var in vars {
            map.remove(&var.name);
        }
        Subst { map }
    }

    /// Iterate over the mappings.
    pub fn iter(&self) -> impl Iterator<Item = (&TVarName, &Type)> {
        self.map.iter()
    }
}

impl FromIterator<(TVarName, Type)> for Subst {
    fn from_iter<T: IntoIterator<Item = (TVarName, Type)>>(iter: T) -> Self {
        Subst {
            map: iter.into_iter().collect(),
        }
    }
}

/// Trait for values a substitution can be applied to.
pub trait Substitutable {
    /// Apply a substitution to this value.
    fn apply_subst(&self, subst: &Subst) -> Self;

    /// Collect all free type variables.
    fn free_vars(&self) -> HashSet<TVar>;
}

impl Substitutable for Type {
    fn apply_subst(&self, subst: &Subst) -> Self {
        match self {
            Type::Const(_) | Type::RowEmpty => self.clone(),

            Type::Var(tv) => {
                if let Some(ty) = subst.get(&tv.name) {
                    // Keep substituting so the result is fully resolved.
                    ty.apply_subst(subst)
                } else {
                    self.clone()
                }
            }

            Type::App { op, args } => Type::App {
                op: Box::new(op.apply_subst(subst)),
                args: args.iter().map(|a| a.apply_subst(subst)).collect(),
            },

            Type::RowExt { label, field, tail } => Type::RowExt {
                label: label.clone(),
                field: Box::new(field.apply_subst(subst)),
                tail: Box::new(tail.apply_subst(subst)),
            },
        }
    }

    fn free_vars(&self) -> HashSet<TVar> {
        Type::free_vars(self)
    }
}

impl Substitutable for Scheme {
    fn apply_subst(&self, subst: &Subst) -> Self {
        // Quantified variables are bound: shield them from the substitution.
        let filtered = subst.remove_vars(&self.vars);
        Scheme {
            vars: self.vars.clone(),
            body: self.body.apply_subst(&filtered),
        }
    }

    fn free_vars(&self) -> HashSet<TVar> {
        Scheme::free_vars(self)
    }
}

impl<T: Substitutable> Substitutable for Vec<T> {
    fn apply_subst(&self, subst: &Subst) -> Self {
        self.iter().map(|t| t.apply_subst(subst)).collect()
    }

    fn free_vars(&self) -> HashSet<TVar> {
        let mut vars = HashSet::new();
        for t in self {
            vars.extend(t.free_vars());
        }
        vars
    }
}

impl<T: Substitutable> Substitutable for Option<T> {
    fn apply_subst(&self, subst: &Subst) -> Self {
        self.as_ref().map(|t| t.apply_subst(subst))
    }

    fn free_vars(&self) -> HashSet<TVar> {
        self.as_ref().map(|t| t.free_vars()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;

    fn val(id: u32) -> TVar {
        TVar::generated(id, Kind::Value)
    }

    #[test]
    fn test_empty_subst() {
        let subst = Subst::empty();
        assert!(subst.is_empty());

        let ty = Type::Var(val(0));
        assert_eq!(subst.apply(&ty), ty);
    }

    #[test]
    fn test_singleton_subst() {
        let subst = Subst::singleton(TVarName::Generated(0), Type::number());
        assert_eq!(subst.apply(&Type::Var(val(0))), Type::number());
        assert_eq!(subst.apply(&Type::Var(val(1))), Type::Var(val(1)));
    }

    #[test]
    fn test_apply_is_fixpoint() {
        // a0 -> a1, a1 -> number: applying once fully resolves a0.
        let mut subst = Subst::empty();
        subst.insert(TVarName::Generated(0), Type::Var(val(1)));
        subst.insert(TVarName::Generated(1), Type::number());

        assert_eq!(subst.apply(&Type::Var(val(0))), Type::number());
    }

    #[test]
    fn test_apply_in_rows() {
        let subst = Subst::singleton(
            TVarName::Generated(0),
            Type::row(vec![("y", Type::string())], Type::RowEmpty),
        );
        let row = Type::row(
            vec![("x", Type::number())],
            Type::Var(TVar::generated(0, Kind::Row)),
        );
        let applied = subst.apply(&row);
        // The open tail is replaced by the bound row, splicing y after x.
        assert_eq!(
            applied,
            Type::row(
                vec![("x", Type::number()), ("y", Type::string())],
                Type::RowEmpty
            )
        );
    }

    #[test]
    fn test_compose() {
        // s1: a0 -> number; s2: a1 -> a0
        // s1.compose(s2): a0 -> number, a1 -> number
        let s1 = Subst::singleton(TVarName::Generated(0), Type::number());
        let s2 = Subst::singleton(TVarName::Generated(1), Type::Var(val(0)));
        let composed = s1.compose(&s2);

        assert_eq!(composed.apply(&Type::Var(val(0))), Type::number());
        assert_eq!(composed.apply(&Type::Var(val(1))), Type::number());
    }

    #[test]
    fn test_compose_left_bias() {
        let s1 = Subst::singleton(TVarName::Generated(0), Type::number());
        let s2 = Subst::singleton(TVarName::Generated(0), Type::string());
        let composed = s1.compose(&s2);
        assert_eq!(composed.apply(&Type::Var(val(0))), Type::number());
    }

    #[test]
    fn test_scheme_subst_respects_quantifiers() {
        // forall a0. a0 -> a1: substituting a0 must only touch a1.
        let scheme = Scheme::poly(
            vec![val(0)],
            Type::function(
                vec![Type::Var(val(0))],
                Type::RowEmpty,
                Type::Var(val(1)),
            ),
        );

        let mut subst = Subst::empty();
        subst.insert(TVarName::Generated(0), Type::number());
        subst.insert(TVarName::Generated(1), Type::string());
        let result = subst.apply(&scheme);

        assert_eq!(result.vars, vec![val(0)]);
        assert_eq!(
            result.body,
            Type::function(vec![Type::Var(val(0))], Type::RowEmpty, Type::string())
        );
    }
}
