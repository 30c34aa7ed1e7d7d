//! Datatype Conversions
//!
//! The interpreter stores every value as a string. This module holds the
//! conversions and checked application helpers the builtin library uses to
//! treat those strings as booleans and numbers.
//!
//! Numbers parse as integers first, then floats. Mixing an integer with a
//! float promotes the whole operation to floats, and integer overflow
//! falls back to float arithmetic rather than wrapping.

use std::fmt;

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::InterpreterContext;

pub const TRUE: &str = "1";
pub const FALSE: &str = "0";

/// "0" is false, everything else is true.
pub fn str_to_bool(x: &str) -> bool {
    x != FALSE
}

pub fn bool_to_str(b: bool) -> &'static str {
    if b {
        TRUE
    } else {
        FALSE
    }
}

// ============================================================================
// Numeric values
// ============================================================================

/// A string interpreted as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Numeric::Int(n) => n as f64,
            Numeric::Float(f) => f,
        }
    }

    /// Truncate toward zero.
    pub fn truncated(&self) -> i64 {
        match *self {
            Numeric::Int(n) => n,
            Numeric::Float(f) => f as i64,
        }
    }

    pub fn to_float(self) -> Numeric {
        Numeric::Float(self.as_f64())
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Numeric::Float(_))
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Numeric::Int(n) => write!(f, "{}", n),
            // Debug formatting keeps the trailing .0 on integral floats.
            Numeric::Float(x) => write!(f, "{:?}", x),
        }
    }
}

pub fn str_to_numeric(s: &str) -> Option<Numeric> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(Numeric::Int(n));
    }
    s.parse::<f64>().ok().map(Numeric::Float)
}

pub fn require_numeric(
    context: &InterpreterContext,
    s: &str,
) -> Result<Numeric, InterpreterError> {
    match str_to_numeric(s) {
        Some(n) => Ok(n),
        None => Err(context.error(format!(
            "{}: {} is not a valid int or float",
            context.call_name()?,
            s
        ))),
    }
}

/// Parse every string numerically. One float promotes the whole list.
pub fn require_all_numeric(
    context: &InterpreterContext,
    strs: &[String],
) -> Result<Vec<Numeric>, InterpreterError> {
    let mut out = Vec::with_capacity(strs.len());
    let mut promote = false;
    for s in strs {
        let n = require_numeric(context, s)?;
        if n.is_float() {
            promote = true;
        }
        out.push(n);
    }

    if promote {
        Ok(out.into_iter().map(Numeric::to_float).collect())
    } else {
        Ok(out)
    }
}

pub fn require_arg_length(
    context: &InterpreterContext,
    n: usize,
) -> Result<(), InterpreterError> {
    if context.args()?.len() < n {
        let plural = if n == 1 { "" } else { "s" };
        return Err(context.error(format!(
            "{} requires at least {} argument{}",
            context.call_name()?,
            n,
            plural
        )));
    }
    Ok(())
}

// ============================================================================
// Numeric operations
// ============================================================================

fn division_by_zero(context: &InterpreterContext) -> InterpreterError {
    match context.call_name() {
        Ok(name) => context.error(format!("{}: division by zero", name)),
        Err(e) => e,
    }
}

pub fn num_add(a: Numeric, b: Numeric) -> Numeric {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => match x.checked_add(y) {
            Some(n) => Numeric::Int(n),
            None => Numeric::Float(x as f64 + y as f64),
        },
        _ => Numeric::Float(a.as_f64() + b.as_f64()),
    }
}

pub fn num_sub(a: Numeric, b: Numeric) -> Numeric {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => match x.checked_sub(y) {
            Some(n) => Numeric::Int(n),
            None => Numeric::Float(x as f64 - y as f64),
        },
        _ => Numeric::Float(a.as_f64() - b.as_f64()),
    }
}

pub fn num_mul(a: Numeric, b: Numeric) -> Numeric {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => match x.checked_mul(y) {
            Some(n) => Numeric::Int(n),
            None => Numeric::Float(x as f64 * y as f64),
        },
        _ => Numeric::Float(a.as_f64() * b.as_f64()),
    }
}

pub fn num_neg(a: Numeric) -> Numeric {
    match a {
        Numeric::Int(n) => match n.checked_neg() {
            Some(m) => Numeric::Int(m),
            None => Numeric::Float(-(n as f64)),
        },
        Numeric::Float(f) => Numeric::Float(-f),
    }
}

/// True division always produces a float.
pub fn num_div(
    context: &InterpreterContext,
    a: Numeric,
    b: Numeric,
) -> Result<Numeric, InterpreterError> {
    if b.as_f64() == 0.0 {
        return Err(division_by_zero(context));
    }
    Ok(Numeric::Float(a.as_f64() / b.as_f64()))
}

/// Floor division. Stays integral for two ints, floors the float quotient
/// otherwise.
pub fn num_floordiv(
    context: &InterpreterContext,
    a: Numeric,
    b: Numeric,
) -> Result<Numeric, InterpreterError> {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => {
            if y == 0 {
                return Err(division_by_zero(context));
            }
            match x.checked_div(y) {
                Some(q) => {
                    let q = if x % y != 0 && (x < 0) != (y < 0) {
                        q - 1
                    } else {
                        q
                    };
                    Ok(Numeric::Int(q))
                }
                None => Ok(Numeric::Float((x as f64 / y as f64).floor())),
            }
        }
        _ => {
            let (fa, fb) = (a.as_f64(), b.as_f64());
            if fb == 0.0 {
                return Err(division_by_zero(context));
            }
            Ok(Numeric::Float((fa / fb).floor()))
        }
    }
}

/// Modulo with the remainder taking the divisor's sign.
pub fn num_mod(
    context: &InterpreterContext,
    a: Numeric,
    b: Numeric,
) -> Result<Numeric, InterpreterError> {
    match (a, b) {
        (Numeric::Int(x), Numeric::Int(y)) => {
            if y == 0 {
                return Err(division_by_zero(context));
            }
            match x.checked_rem(y) {
                Some(r) => {
                    let r = if r != 0 && (r < 0) != (y < 0) { r + y } else { r };
                    Ok(Numeric::Int(r))
                }
                None => Ok(Numeric::Int(0)),
            }
        }
        _ => {
            let (fa, fb) = (a.as_f64(), b.as_f64());
            if fb == 0.0 {
                return Err(division_by_zero(context));
            }
            Ok(Numeric::Float(fa - (fa / fb).floor() * fb))
        }
    }
}

// ============================================================================
// Checked application
// ============================================================================

pub fn apply_unary_num_op<F>(
    context: &InterpreterContext,
    op: F,
) -> Result<Numeric, InterpreterError>
where
    F: Fn(&InterpreterContext, Numeric) -> Result<Numeric, InterpreterError>,
{
    require_arg_length(context, 1)?;
    let args = context.args()?;
    let n = require_numeric(context, &args[0])?;
    op(context, n)
}

pub fn apply_binary_num_op<F>(
    context: &InterpreterContext,
    op: F,
) -> Result<Numeric, InterpreterError>
where
    F: Fn(&InterpreterContext, Numeric, Numeric) -> Result<Numeric, InterpreterError>,
{
    let args = context.args()?;
    if args.len() != 2 {
        return Err(context.error(format!(
            "{}: must have exactly 2 args",
            context.call_name()?
        )));
    }

    let nums = require_all_numeric(context, args)?;
    op(context, nums[0], nums[1])
}

pub fn apply_reduce_num_op<F>(
    context: &InterpreterContext,
    op: F,
) -> Result<Numeric, InterpreterError>
where
    F: Fn(&InterpreterContext, Numeric, Numeric) -> Result<Numeric, InterpreterError>,
{
    require_arg_length(context, 1)?;
    let nums = require_all_numeric(context, context.args()?)?;

    let mut iter = nums.into_iter();
    let first = match iter.next() {
        Some(n) => n,
        None => return Err(context.internal_error("reduce over empty argument list.")),
    };
    iter.try_fold(first, |acc, n| op(context, acc, n))
}

/// Reduce the tail with `reduce_op`, then combine with the head through
/// `final_op`. Subtraction and division distribute over their tails this
/// way: `(- a b c)` is `a - (b + c)`.
pub fn apply_mass_num_op<R, F>(
    context: &InterpreterContext,
    reduce_op: R,
    final_op: F,
) -> Result<Numeric, InterpreterError>
where
    R: Fn(&InterpreterContext, Numeric, Numeric) -> Result<Numeric, InterpreterError>,
    F: Fn(&InterpreterContext, Numeric, Numeric) -> Result<Numeric, InterpreterError>,
{
    if context.args()?.len() < 2 {
        return Err(context.error(format!(
            "{} requires at least two arguments",
            context.call_name()?
        )));
    }
    let nums = require_all_numeric(context, context.args()?)?;

    let mut iter = nums.into_iter();
    let (head, tail_first) = match (iter.next(), iter.next()) {
        (Some(head), Some(tail_first)) => (head, tail_first),
        _ => return Err(context.internal_error("reduce over empty argument list.")),
    };

    let tail = iter.try_fold(tail_first, |acc, n| reduce_op(context, acc, n))?;
    final_op(context, head, tail)
}

pub fn apply_unary_bool_op<F>(
    context: &InterpreterContext,
    op: F,
) -> Result<bool, InterpreterError>
where
    F: Fn(bool) -> bool,
{
    require_arg_length(context, 1)?;
    let args = context.args()?;
    Ok(op(str_to_bool(&args[0])))
}

pub fn apply_reduce_bool_op<F>(
    context: &InterpreterContext,
    op: F,
) -> Result<bool, InterpreterError>
where
    F: Fn(bool, bool) -> bool,
{
    require_arg_length(context, 1)?;
    let mut values = context.args()?.iter().map(|s| str_to_bool(s));

    let first = match values.next() {
        Some(v) => v,
        None => return Err(context.internal_error("reduce over empty argument list.")),
    };
    Ok(values.fold(first, op))
}
