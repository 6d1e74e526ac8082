//! Calldata parameter naming.
//!
//! Turns a symbolic calldata read into a reference to the current function's
//! parameters. ABI-encoded calldata is a 4-byte selector followed by 32-byte
//! head slots; dynamic arguments store an offset in their head slot and their
//! length plus elements in the tail. The shapes recognized here, in priority order:
//!
//! | location                    | rendered as            |
//! |-----------------------------|------------------------|
//! | `4 + 32*i`                  | name of parameter `i`  |
//! | `4 + param(p)`              | `p.length`             |
//! | `4 + cd[x]`                 | `<name of cd[x]>.length` |
//! | `k + cd[x]`                 | `<name of cd[x]>[(k - 36) / 32]` |
//!
//! Anything else is returned unresolved.

use std::fmt;

use crate::abi::AbiContext;
use crate::db::Param;
use crate::expr::Expr;
use crate::render::{colorize, COLOR_GREEN};

/// Calldata offset of the first head slot (right after the selector).
const HEAD_START: u64 = 4;

/// Size of one ABI word.
const WORD: u64 = 32;

/// Offset of the first element of a dynamic array relative to the array's
/// pointer value: selector plus the length word.
const FIRST_ELEMENT: u64 = HEAD_START + WORD;

/// Outcome of naming a calldata read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamRef {
    Named(String),
    /// No known shape applied; the expression is shown as is.
    Unresolved(Expr),
}

impl ParamRef {
    pub fn is_named(&self) -> bool {
        matches!(self, ParamRef::Named(_))
    }
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamRef::Named(name) => f.write_str(name),
            ParamRef::Unresolved(expr) => write!(f, "{expr}"),
        }
    }
}

/// The finite set of calldata location shapes the resolver understands.
enum Shape<'a> {
    /// Constant head-slot offset.
    Slot(u64),
    ArrayLength(&'a str),
    NestedLength(&'a Expr),
    Element { offset: u64, pointer: &'a Expr },
    Unrecognized,
}

fn classify(loc: &Expr) -> Shape<'_> {
    match loc {
        Expr::Num(offset) => Shape::Slot(*offset),
        Expr::Add(terms) => match terms.as_slice() {
            [Expr::Num(HEAD_START), Expr::Param(name)] => Shape::ArrayLength(name),
            [Expr::Num(HEAD_START), Expr::Calldata(pointer)] => Shape::NestedLength(pointer),
            [Expr::Num(offset), Expr::Calldata(pointer)] => {
                Shape::Element { offset: *offset, pointer }
            }
            _ => Shape::Unrecognized,
        },
        _ => Shape::Unrecognized,
    }
}

/// Name `expr` against the function currently entered in `ctx`.
///
/// Returns `Unresolved` when there is no current function, its parameters are
/// unknown, or the read does not match a known shape.
pub fn resolve_param(ctx: &AbiContext, expr: &Expr, add_color: bool) -> ParamRef {
    match ctx.current_entry().and_then(|entry| entry.params.as_deref()) {
        Some(params) => resolve_with(params, expr, add_color),
        None => ParamRef::Unresolved(expr.clone()),
    }
}

/// Same as [`resolve_param`] with the parameter list given explicitly.
///
/// Unresolved reads come back with multiply-by-one factors removed.
pub fn resolve_with(params: &[Param], expr: &Expr, add_color: bool) -> ParamRef {
    let Expr::Calldata(loc) = expr else {
        return ParamRef::Unresolved(expr.clone());
    };

    let cleaned;
    let loc: &Expr = if loc.as_num().is_some() {
        &**loc
    } else {
        cleaned = loc.strip_mul_one();
        &cleaned
    };

    let named = |text: String| ParamRef::Named(colorize(&text, COLOR_GREEN, add_color));
    let unresolved = || ParamRef::Unresolved(Expr::calldata(loc.clone()));

    match classify(loc) {
        Shape::Slot(offset) => {
            if offset < HEAD_START || (offset - HEAD_START) % WORD != 0 {
                return unresolved();
            }
            let index = (offset - HEAD_START) / WORD;
            // An index past the declared parameters means the chosen signature
            // does not match this calldata layout.
            match usize::try_from(index).ok().and_then(|i| params.get(i)) {
                Some(param) => named(param.name.clone()),
                None => unresolved(),
            }
        }
        Shape::ArrayLength(name) => named(format!("{name}.length")),
        Shape::NestedLength(pointer) => {
            let inner = resolve_with(params, &Expr::calldata(pointer.clone()), false);
            named(format!("{inner}.length"))
        }
        Shape::Element { offset, pointer } if offset >= FIRST_ELEMENT => {
            let inner = resolve_with(params, &Expr::calldata(pointer.clone()), false);
            named(format!("{inner}[{}]", (offset - FIRST_ELEMENT) / WORD))
        }
        Shape::Element { .. } | Shape::Unrecognized => unresolved(),
    }
}
