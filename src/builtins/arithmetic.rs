//! Arithmetic Expansions
//!
//! All math runs on strings parsed as integers first, floats second.
//! Subtraction and the divisions distribute over their tails, so (- a b c)
//! is a - (b + c) and (/ a b c) is a / (b * c).

use crate::builtins::datatypes::{
    apply_binary_num_op, apply_mass_num_op, apply_reduce_num_op, apply_unary_num_op, num_add,
    num_div, num_floordiv, num_mod, num_mul, num_neg, num_sub, Numeric,
};
use crate::interpreter::callhandler::CallbackCallHandler;

/// toint, tofloat, +, -, *, /, //, %.
pub fn arithmetic_expansions() -> CallbackCallHandler<String> {
    let mut handler = CallbackCallHandler::new();

    handler.add_call("toint", |_, context| {
        let n = apply_unary_num_op(context, |_, n| Ok(Numeric::Int(n.truncated())))?;
        Ok(n.to_string())
    });

    handler.add_call("tofloat", |_, context| {
        let n = apply_unary_num_op(context, |_, n| Ok(n.to_float()))?;
        Ok(n.to_string())
    });

    handler.add_call("+", |_, context| {
        let n = apply_reduce_num_op(context, |_, a, b| Ok(num_add(a, b)))?;
        Ok(n.to_string())
    });

    handler.add_call("-", |_, context| {
        let n = if context.args()?.len() == 1 {
            apply_unary_num_op(context, |_, n| Ok(num_neg(n)))?
        } else {
            apply_mass_num_op(
                context,
                |_, a, b| Ok(num_add(a, b)),
                |_, a, b| Ok(num_sub(a, b)),
            )?
        };
        Ok(n.to_string())
    });

    handler.add_call("*", |_, context| {
        let n = apply_reduce_num_op(context, |_, a, b| Ok(num_mul(a, b)))?;
        Ok(n.to_string())
    });

    handler.add_call("/", |_, context| {
        let n = apply_mass_num_op(context, |_, a, b| Ok(num_mul(a, b)), num_div)?;
        Ok(n.to_string())
    });

    handler.add_call("//", |_, context| {
        let n = apply_mass_num_op(context, |_, a, b| Ok(num_mul(a, b)), num_floordiv)?;
        Ok(n.to_string())
    });

    handler.add_call("%", |_, context| {
        let n = apply_binary_num_op(context, num_mod)?;
        Ok(n.to_string())
    });

    handler
}
