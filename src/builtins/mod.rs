//! Built-in primitives for Sprig inference.
//!
//! Provides the initial external environment: the schemes of the
//! primitive operations every module can reach without importing. The
//! quantified variable ids here are arbitrary; instantiation replaces
//! them with fresh variables on every use.

use crate::infer::ExternalEnv;
use crate::types::{Kind, Scheme, TVar, Type};

/// `∀ρ. (-> number number ρ number)`
fn numeric_binop() -> Scheme {
    let rho = TVar::generated(101, Kind::Row);
    Scheme::poly(
        vec![rho.clone()],
        Type::function(
            vec![Type::number(), Type::number()],
            Type::Var(rho),
            Type::number(),
        ),
    )
}

/// `∀ρ. (-> number number ρ boolean)`
fn numeric_comparison() -> Scheme {
    let rho = TVar::generated(101, Kind::Row);
    Scheme::poly(
        vec![rho.clone()],
        Type::function(
            vec![Type::number(), Type::number()],
            Type::Var(rho),
            Type::boolean(),
        ),
    )
}

/// Create the initial external environment with built-in bindings.
pub fn initial_env() -> ExternalEnv {
    let mut env = ExternalEnv::empty();

    for op in ["+", "-", "*", "/", "mod"] {
        env = env.extend(op, numeric_binop());
    }
    for op in ["<", ">", "<=", ">="] {
        env = env.extend(op, numeric_comparison());
    }

    // Equality works at any single type.
    let a = TVar::generated(100, Kind::Value);
    let rho = TVar::generated(101, Kind::Row);
    env = env.extend(
        "=",
        Scheme::poly(
            vec![a.clone(), rho.clone()],
            Type::function(
                vec![Type::Var(a.clone()), Type::Var(a)],
                Type::Var(rho),
                Type::boolean(),
            ),
        ),
    );

    let rho = TVar::generated(101, Kind::Row);
    env = env.extend(
        "not",
        Scheme::poly(
            vec![rho.clone()],
            Type::function(vec![Type::boolean()], Type::Var(rho), Type::boolean()),
        ),
    );

    let rho = TVar::generated(101, Kind::Row);
    env = env.extend(
        "concat",
        Scheme::poly(
            vec![rho.clone()],
            Type::function(
                vec![Type::string(), Type::string()],
                Type::Var(rho),
                Type::string(),
            ),
        ),
    );

    let rho = TVar::generated(101, Kind::Row);
    env = env.extend(
        "string-length",
        Scheme::poly(
            vec![rho.clone()],
            Type::function(vec![Type::string()], Type::Var(rho), Type::number()),
        ),
    );

    let a = TVar::generated(100, Kind::Value);
    let rho = TVar::generated(101, Kind::Row);
    env = env.extend(
        "vector-length",
        Scheme::poly(
            vec![a.clone(), rho.clone()],
            Type::function(
                vec![Type::vector(Type::Var(a))],
                Type::Var(rho),
                Type::number(),
            ),
        ),
    );

    // Printing performs the console effect; everything else about the
    // caller's effect row stays open.
    let rho = TVar::generated(101, Kind::Row);
    env = env.extend(
        "print",
        Scheme::poly(
            vec![rho.clone()],
            Type::function(
                vec![Type::string()],
                Type::row_ext("console", Type::void(), Type::Var(rho)),
                Type::void(),
            ),
        ),
    );

    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_env_has_arithmetic() {
        let env = initial_env();
        for op in ["+", "-", "*", "/", "=", "<"] {
            assert!(env.contains(op), "missing builtin {}", op);
        }
    }

    #[test]
    fn test_builtin_schemes_are_closed() {
        let env = initial_env();
        for name in ["+", "=", "print", "vector-length"] {
            let scheme = env.lookup(name).unwrap();
            assert!(
                scheme.free_vars().is_empty(),
                "builtin {} leaks free variables",
                name
            );
        }
    }

    #[test]
    fn test_print_carries_console_effect() {
        let env = initial_env();
        let scheme = env.lookup("print").unwrap();
        match &scheme.body {
            Type::App { args, .. } => {
                let effect = &args[args.len() - 2];
                assert!(matches!(effect, Type::RowExt { label, .. } if label.0 == "console"));
            }
            _ => panic!("print should be a function"),
        }
    }
}
