//! Type alias table with cycle detection.
//!
//! Aliases declared in the module under inference are transparent: any
//! annotation constant naming one is replaced by its expanded body.
//! Aliases are checked for cycles up front; a self-loop or longer cycle
//! is rejected before any inference runs. Imported aliases arrive as
//! already-lowered monotypes and cannot participate in cycles.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, TypeError};
use crate::syntax::ast::{TypeExpr, TypeExprKind};
use crate::syntax::Span;
use crate::types::Type;

/// One alias declared in the module under inference.
#[derive(Debug, Clone)]
struct AliasDef {
    body: TypeExpr,
    span: Span,
}

/// The alias environment visible to annotation lowering.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// Module-declared aliases, ordered by name for deterministic checks.
    module: BTreeMap<String, AliasDef>,
    /// Imported aliases, already lowered to monotypes.
    external: HashMap<String, Type>,
}

impl AliasTable {
    pub fn new(external: HashMap<String, Type>) -> Self {
        AliasTable {
            module: BTreeMap::new(),
            external,
        }
    }

    /// Declare a module alias.
    pub fn insert(&mut self, name: impl Into<String>, body: TypeExpr, span: Span) {
        self.module.insert(name.into(), AliasDef { body, span });
    }

    /// Look up a module alias body.
    pub fn module_alias(&self, name: &str) -> Option<&TypeExpr> {
        self.module.get(name).map(|def| &def.body)
    }

    /// Look up an imported alias.
    pub fn external_alias(&self, name: &str) -> Option<&Type> {
        self.external.get(name)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.module.contains_key(name) || self.external.contains_key(name)
    }

    /// Reject cyclic alias declarations. Walks the reference graph of the
    /// module aliases depth-first; a back edge is a cycle, reported with
    /// the offending path.
    pub fn check_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();

        fn visit<'a>(
            table: &'a AliasTable,
            name: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|n| *n == name).unwrap_or(0);
                    let mut cycle: Vec<&str> = path[start..].to_vec();
                    cycle.push(name);
                    let span = table.module.get(name).map(|d| d.span).unwrap_or_default();
                    return Err(TypeError::RecursiveTypeAlias {
                        path: cycle.join(" -> "),
                        span,
                    });
                }
                None => {}
            }

            let Some(def) = table.module.get(name) else {
                return Ok(());
            };
            marks.insert(name, Mark::Visiting);
            path.push(name);

            let mut refs = Vec::new();
            collect_refs(&def.body, &mut refs);
            for reference in refs {
                if table.module.contains_key(reference) {
                    visit(table, reference, marks, path)?;
                }
            }

            path.pop();
            marks.insert(name, Mark::Done);
            Ok(())
        }

        for name in self.module.keys() {
            visit(self, name, &mut marks, &mut Vec::new())?;
        }
        Ok(())
    }
}

/// Collect the constant names referenced by an annotation body.
fn collect_refs<'a>(te: &'a TypeExpr, out: &mut Vec<&'a str>) {
    match &te.kind {
        TypeExprKind::Name(name) => out.push(name),
        TypeExprKind::Var(_) | TypeExprKind::Wildcard(_) => {}
        TypeExprKind::Fn {
            params,
            effect,
            result,
        } => {
            for p in params {
                collect_refs(p, out);
            }
            if let Some(e) = effect {
                collect_refs(e, out);
            }
            collect_refs(result, out);
        }
        TypeExprKind::Vector(element) => collect_refs(element, out),
        TypeExprKind::Record { fields, tail } => {
            for (_, t) in fields {
                collect_refs(t, out);
            }
            if let Some(t) = tail {
                collect_refs(t, out);
            }
        }
        TypeExprKind::Variant { cases, tail } => {
            for (_, t) in cases {
                collect_refs(t, out);
            }
            if let Some(t) = tail {
                collect_refs(t, out);
            }
        }
        TypeExprKind::Effect { labels, tail } => {
            for (_, payload) in labels {
                if let Some(t) = payload {
                    collect_refs(t, out);
                }
            }
            if let Some(t) = tail {
                collect_refs(t, out);
            }
        }
        TypeExprKind::App { name, args } => {
            out.push(name);
            for a in args {
                collect_refs(a, out);
            }
        }
    }
}
