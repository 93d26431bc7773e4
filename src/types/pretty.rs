//! Pretty-printing for types.
//!
//! Renders types in the surface syntax used by error messages:
//! constants by name, applications as `(op arg …)`, function types as
//! `(-> p₁ … pₙ effect result)`, vectors as `[t]`, records as
//! `{:l t … | tail?}`, effects as `(effect l … | tail?)`. Generated
//! variables print as Greek letters in order of first appearance;
//! user-specified variables print under their own names.

use std::collections::HashMap;
use std::fmt::{self, Display, Write};

use super::ty::{con, Scheme, TVar, TVarId, TVarName, Type};

const GREEK: [&str; 24] = [
    "α", "β", "γ", "δ", "ε", "ζ", "η", "θ", "ι", "κ", "λ", "μ", "ν", "ξ", "ο", "π", "ρ", "σ",
    "τ", "υ", "φ", "χ", "ψ", "ω",
];

/// Context for pretty-printing, tracking generated-variable names.
///
/// Names are stable within one context, so printing two related types
/// through the same context keeps shared variables consistent.
pub struct PrettyContext {
    var_names: HashMap<TVarId, String>,
    next_name: usize,
}

impl PrettyContext {
    pub fn new() -> Self {
        PrettyContext {
            var_names: HashMap::new(),
            next_name: 0,
        }
    }

    fn get_var_name(&mut self, id: TVarId) -> String {
        if let Some(name) = self.var_names.get(&id) {
            return name.clone();
        }
        let name = self.generate_name();
        self.var_names.insert(id, name.clone());
        name
    }

    fn generate_name(&mut self) -> String {
        let idx = self.next_name;
        self.next_name += 1;

        let letter = GREEK[idx % GREEK.len()];
        if idx < GREEK.len() {
            letter.to_string()
        } else {
            format!("{}{}", letter, idx / GREEK.len())
        }
    }

    /// Format a type to a string.
    pub fn format_type(&mut self, ty: &Type) -> String {
        let mut s = String::new();
        self.write_type(&mut s, ty).unwrap();
        s
    }

    /// Format a type scheme to a string.
    pub fn format_scheme(&mut self, scheme: &Scheme) -> String {
        let mut s = String::new();
        self.write_scheme(&mut s, scheme).unwrap();
        s
    }

    fn write_type<W: Write>(&mut self, w: &mut W, ty: &Type) -> fmt::Result {
        match ty {
            Type::Const(name) => write!(w, "{}", name),

            Type::Var(tv) => self.write_var(w, tv),

            Type::App { op, args } => match (op.as_ref(), args.as_slice()) {
                (Type::Const(name), [params @ .., effect, result]) if name == con::FN => {
                    write!(w, "(->")?;
                    for param in params {
                        write!(w, " ")?;
                        self.write_type(w, param)?;
                    }
                    write!(w, " ")?;
                    self.write_effect(w, effect)?;
                    write!(w, " ")?;
                    self.write_type(w, result)?;
                    write!(w, ")")
                }
                (Type::Const(name), [element]) if name == con::VECTOR => {
                    write!(w, "[")?;
                    self.write_type(w, element)?;
                    write!(w, "]")
                }
                (Type::Const(name), [row]) if name == con::RECORD => self.write_record_row(w, row),
                (Type::Const(name), [row]) if name == con::VARIANT => {
                    write!(w, "(variant")?;
                    self.write_labeled_tail(w, row)?;
                    write!(w, ")")
                }
                (Type::Const(name), [row]) if name == con::EFFECT => self.write_effect(w, row),
                _ => {
                    write!(w, "(")?;
                    self.write_type(w, op)?;
                    for arg in args {
                        write!(w, " ")?;
                        self.write_type(w, arg)?;
                    }
                    write!(w, ")")
                }
            },

            // A bare row outside a wrapper prints in record syntax.
            Type::RowEmpty | Type::RowExt { .. } => self.write_record_row(w, ty),
        }
    }

    fn write_var<W: Write>(&mut self, w: &mut W, tv: &TVar) -> fmt::Result {
        match &tv.name {
            TVarName::Generated(id) => {
                let name = self.get_var_name(*id);
                write!(w, "{}", name)
            }
            TVarName::Named(name) => write!(w, "{}", name),
        }
    }

    /// An effect position: a plain variable prints bare, anything with
    /// structure prints as `(effect l … | tail?)`.
    fn write_effect<W: Write>(&mut self, w: &mut W, effect: &Type) -> fmt::Result {
        match effect {
            Type::Var(tv) => self.write_var(w, tv),
            _ => {
                write!(w, "(effect")?;
                self.write_effect_labels(w, effect)?;
                write!(w, ")")
            }
        }
    }

    fn write_effect_labels<W: Write>(&mut self, w: &mut W, row: &Type) -> fmt::Result {
        match row {
            Type::RowEmpty => Ok(()),
            Type::RowExt { label, field, tail } => {
                if matches!(field.as_ref(), Type::Const(name) if name == con::VOID) {
                    write!(w, " {}", label.0)?;
                } else {
                    write!(w, " ({} ", label.0)?;
                    self.write_type(w, field)?;
                    write!(w, ")")?;
                }
                self.write_effect_labels(w, tail)
            }
            Type::Var(tv) => {
                write!(w, " | ")?;
                self.write_var(w, tv)
            }
            other => {
                write!(w, " | ")?;
                self.write_type(w, other)
            }
        }
    }

    fn write_record_row<W: Write>(&mut self, w: &mut W, row: &Type) -> fmt::Result {
        write!(w, "{{")?;
        self.write_record_fields(w, row, true)?;
        write!(w, "}}")
    }

    fn write_record_fields<W: Write>(&mut self, w: &mut W, row: &Type, first: bool) -> fmt::Result {
        match row {
            Type::RowEmpty => Ok(()),
            Type::RowExt { label, field, tail } => {
                if !first {
                    write!(w, " ")?;
                }
                write!(w, ":{} ", label.0)?;
                self.write_type(w, field)?;
                self.write_record_fields(w, tail, false)
            }
            other => {
                if !first {
                    write!(w, " ")?;
                }
                write!(w, "| ")?;
                self.write_type(w, other)
            }
        }
    }

    fn write_labeled_tail<W: Write>(&mut self, w: &mut W, row: &Type) -> fmt::Result {
        match row {
            Type::RowEmpty => Ok(()),
            Type::RowExt { label, field, tail } => {
                write!(w, " :{} ", label.0)?;
                self.write_type(w, field)?;
                self.write_labeled_tail(w, tail)
            }
            other => {
                write!(w, " | ")?;
                self.write_type(w, other)
            }
        }
    }

    fn write_scheme<W: Write>(&mut self, w: &mut W, scheme: &Scheme) -> fmt::Result {
        if scheme.vars.is_empty() {
            return self.write_type(w, &scheme.body);
        }
        write!(w, "(forall (")?;
        for (i, var) in scheme.vars.iter().enumerate() {
            if i > 0 {
                write!(w, " ")?;
            }
            self.write_var(w, var)?;
        }
        write!(w, ") ")?;
        self.write_type(w, &scheme.body)?;
        write!(w, ")")
    }
}

impl Default for PrettyContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Display implementations use a fresh context each time.
impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyContext::new();
        write!(f, "{}", ctx.format_type(self))
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyContext::new();
        write!(f, "{}", ctx.format_scheme(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;

    fn val(id: u32) -> Type {
        Type::Var(TVar::generated(id, Kind::Value))
    }

    fn row_var(id: u32) -> Type {
        Type::Var(TVar::generated(id, Kind::Row))
    }

    #[test]
    fn test_constants() {
        assert_eq!(Type::number().to_string(), "number");
        assert_eq!(Type::string().to_string(), "string");
        assert_eq!(Type::void().to_string(), "void");
    }

    #[test]
    fn test_function_type() {
        let f = Type::function(vec![val(0)], row_var(1), val(0));
        assert_eq!(f.to_string(), "(-> α β α)");
    }

    #[test]
    fn test_nested_function_type() {
        let inner = Type::function(vec![val(0)], row_var(1), val(2));
        let f = Type::function(vec![inner, val(0)], row_var(1), val(2));
        assert_eq!(f.to_string(), "(-> (-> α β γ) α β γ)");
    }

    #[test]
    fn test_vector_type() {
        assert_eq!(Type::vector(Type::number()).to_string(), "[number]");
        assert_eq!(Type::vector(val(0)).to_string(), "[α]");
    }

    #[test]
    fn test_record_type() {
        let r = Type::record(Type::row(
            vec![("x", Type::number()), ("y", Type::string())],
            Type::RowEmpty,
        ));
        assert_eq!(r.to_string(), "{:x number :y string}");

        let open = Type::record(Type::row(vec![("x", Type::number())], row_var(0)));
        assert_eq!(open.to_string(), "{:x number | α}");
    }

    #[test]
    fn test_effect_row_in_function() {
        let eff = Type::row(vec![("console", Type::void())], row_var(0));
        let f = Type::function(vec![Type::string()], eff, Type::string());
        assert_eq!(f.to_string(), "(-> string (effect console | α) string)");
    }

    #[test]
    fn test_user_specified_var_keeps_name() {
        let a = Type::Var(TVar::named("a", Kind::Value));
        let f = Type::function(vec![a.clone()], row_var(0), a);
        assert_eq!(f.to_string(), "(-> a α a)");
    }

    #[test]
    fn test_scheme_display() {
        let a = TVar::generated(0, Kind::Value);
        let scheme = Scheme::poly(vec![a.clone()], Type::Var(a));
        assert_eq!(scheme.to_string(), "(forall (α) α)");
    }

    #[test]
    fn test_shared_context_names_are_stable() {
        let mut ctx = PrettyContext::new();
        assert_eq!(ctx.format_type(&val(3)), "α");
        assert_eq!(ctx.format_type(&val(5)), "β");
        assert_eq!(ctx.format_type(&val(3)), "α");
    }
}
