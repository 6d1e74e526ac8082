//! Symbolic expressions emitted by the decompiler for calldata reads.
//!
//! Only the shapes needed to name calldata locations are modeled precisely;
//! everything else is carried as an opaque `Op` node so it can still be rendered.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Compile-time known integer.
    Num(u64),
    /// Named variable or otherwise opaque symbol.
    Var(String),
    /// Pointer to a named parameter (the head word of a dynamic argument).
    Param(String),
    /// 32-byte read from calldata at the given location.
    Calldata(Box<Expr>),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    /// Any other operator, kept for rendering only.
    Op(String, Vec<Expr>),
}

impl Expr {
    pub fn calldata(loc: Expr) -> Self {
        Expr::Calldata(Box::new(loc))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Expr::Add(vec![lhs, rhs])
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Expr::Mul(vec![lhs, rhs])
    }

    pub fn param(name: impl Into<String>) -> Self {
        Expr::Param(name.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn as_num(&self) -> Option<u64> {
        match self {
            Expr::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Collapse multiplications by one, bottom-up.
    ///
    /// `mul(1, x)` becomes `x`, a product left with a single factor becomes that
    /// factor, and a product of only ones becomes `1`.
    pub fn strip_mul_one(&self) -> Expr {
        match self {
            Expr::Mul(factors) => {
                let mut kept: Vec<Expr> = factors
                    .iter()
                    .map(Expr::strip_mul_one)
                    .filter(|f| f.as_num() != Some(1))
                    .collect();
                match kept.len() {
                    0 => Expr::Num(1),
                    1 => kept.remove(0),
                    _ => Expr::Mul(kept),
                }
            }
            Expr::Add(terms) => Expr::Add(terms.iter().map(Expr::strip_mul_one).collect()),
            Expr::Calldata(loc) => Expr::calldata(loc.strip_mul_one()),
            Expr::Op(op, args) => {
                Expr::Op(op.clone(), args.iter().map(Expr::strip_mul_one).collect())
            }
            Expr::Num(_) | Expr::Var(_) | Expr::Param(_) => self.clone(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) if *n >= 0x10000 => write!(f, "{n:#x}"),
            Expr::Num(n) => write!(f, "{n}"),
            Expr::Var(name) | Expr::Param(name) => f.write_str(name),
            Expr::Calldata(loc) => write!(f, "cd[{loc}]"),
            Expr::Add(terms) => write_joined(f, terms, " + "),
            Expr::Mul(factors) => write_joined(f, factors, " * "),
            Expr::Op(op, args) => {
                write!(f, "{op}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_mul_one_collapses_nested_products() {
        let loc = Expr::add(
            Expr::Num(4),
            Expr::calldata(Expr::mul(Expr::Num(1), Expr::add(Expr::Num(4), Expr::var("x")))),
        );
        let cleaned = loc.strip_mul_one();
        assert_eq!(
            cleaned,
            Expr::add(Expr::Num(4), Expr::calldata(Expr::add(Expr::Num(4), Expr::var("x"))))
        );
    }

    #[test]
    fn strip_mul_one_keeps_real_products() {
        let product = Expr::Mul(vec![Expr::Num(32), Expr::Num(1), Expr::var("i")]);
        assert_eq!(product.strip_mul_one(), Expr::mul(Expr::Num(32), Expr::var("i")));
        assert_eq!(Expr::mul(Expr::Num(1), Expr::Num(1)).strip_mul_one(), Expr::Num(1));
    }

    #[test]
    fn display_renders_calldata_reads() {
        let expr = Expr::calldata(Expr::add(Expr::Num(36), Expr::var("i")));
        assert_eq!(expr.to_string(), "cd[(36 + i)]");
    }
}
