//! Comparison Expansions
//!
//! Equality tries numbers first, so 2 equals 2.0, and falls back to exact
//! string equality when either side is not a number. The ordering
//! operators insist on numbers.

use std::cmp::Ordering;

use crate::builtins::datatypes::{
    bool_to_str, require_all_numeric, str_to_numeric, Numeric,
};
use crate::interpreter::callhandler::CallbackCallHandler;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::InterpreterContext;

fn require_two(context: &InterpreterContext) -> Result<(), InterpreterError> {
    if context.args()?.len() != 2 {
        return Err(context.error(format!(
            "{}: must have exactly 2 args",
            context.call_name()?
        )));
    }
    Ok(())
}

fn equal_args(context: &InterpreterContext) -> Result<bool, InterpreterError> {
    require_two(context)?;
    let args = context.args()?;
    Ok(match (str_to_numeric(&args[0]), str_to_numeric(&args[1])) {
        (Some(Numeric::Int(a)), Some(Numeric::Int(b))) => a == b,
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => args[0] == args[1],
    })
}

fn apply_ordering<F>(context: &InterpreterContext, holds: F) -> Result<String, InterpreterError>
where
    F: Fn(Ordering) -> bool,
{
    require_two(context)?;
    let nums = require_all_numeric(context, context.args()?)?;

    let ordering = match (nums[0], nums[1]) {
        (Numeric::Int(a), Numeric::Int(b)) => a.cmp(&b),
        (a, b) => match a.as_f64().partial_cmp(&b.as_f64()) {
            Some(o) => o,
            // NaN compares false against everything.
            None => return Ok(bool_to_str(false).to_string()),
        },
    };
    Ok(bool_to_str(holds(ordering)).to_string())
}

/// eq? (alias ==), neq?, >, <, >=, <=, in?.
pub fn comparison_expansions() -> CallbackCallHandler<String> {
    let mut handler = CallbackCallHandler::new();

    handler.add_call("eq?", |_, context| {
        Ok(bool_to_str(equal_args(context)?).to_string())
    });
    handler.add_alias("==", "eq?");

    handler.add_call("neq?", |_, context| {
        Ok(bool_to_str(!equal_args(context)?).to_string())
    });

    handler.add_call(">", |_, context| {
        Ok(apply_ordering(context, |o| o.is_gt())?)
    });

    handler.add_call("<", |_, context| {
        Ok(apply_ordering(context, |o| o.is_lt())?)
    });

    handler.add_call(">=", |_, context| {
        Ok(apply_ordering(context, |o| o.is_ge())?)
    });

    handler.add_call("<=", |_, context| {
        Ok(apply_ordering(context, |o| o.is_le())?)
    });

    handler.add_call("in?", |_, context| {
        let args = context.args()?;
        if args.is_empty() {
            return Err(context
                .error("in? requires at least one argument")
                .into());
        }
        Ok(bool_to_str(args[1..].contains(&args[0])).to_string())
    });

    handler
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::commands::builtin_commands;
    use crate::errors::ScrollError;
    use crate::interpreter::interpreter::Interpreter;

    fn eval(expansion: &str) -> Result<String, ScrollError> {
        let mut interp = Interpreter::new();
        interp
            .expansion_handlers_mut()
            .add("comparison", comparison_expansions());
        interp
            .command_handlers_mut()
            .add("builtin_commands", builtin_commands());

        let ctx = interp.run(&format!("set out $({})", expansion))?;
        Ok(ctx.get_var("out").unwrap_or_default().to_string())
    }

    #[test]
    fn test_equality_is_numeric_when_possible() {
        assert_eq!(eval("eq? 2 2.0").unwrap(), "1");
        assert_eq!(eval("== 2 2").unwrap(), "1");
        assert_eq!(eval("eq? 2 3").unwrap(), "0");
    }

    #[test]
    fn test_equality_falls_back_to_strings() {
        assert_eq!(eval("eq? abc abc").unwrap(), "1");
        assert_eq!(eval("eq? 2 two").unwrap(), "0");
    }

    #[test]
    fn test_inequality_negates() {
        assert_eq!(eval("neq? a b").unwrap(), "1");
        assert_eq!(eval("neq? 2 2.0").unwrap(), "0");
    }

    #[test]
    fn test_ordering_operators() {
        assert_eq!(eval("> 3 2").unwrap(), "1");
        assert_eq!(eval("> 2 3").unwrap(), "0");
        assert_eq!(eval("< 1.5 2").unwrap(), "1");
        assert_eq!(eval(">= 2 2").unwrap(), "1");
        assert_eq!(eval("<= 2 1").unwrap(), "0");
    }

    #[test]
    fn test_ordering_requires_numbers() {
        let err = eval("< a 1").unwrap_err();
        assert!(err.to_string().contains("<: a is not a valid int or float"));
    }

    #[test]
    fn test_comparisons_require_two_args() {
        let err = eval("eq? 1").unwrap_err();
        assert!(err.to_string().contains("eq?: must have exactly 2 args"));

        let err = eval("> 1 2 3").unwrap_err();
        assert!(err.to_string().contains(">: must have exactly 2 args"));
    }

    #[test]
    fn test_membership() {
        assert_eq!(eval("in? b a b c").unwrap(), "1");
        assert_eq!(eval("in? z a b c").unwrap(), "0");
        assert_eq!(eval("in? lone").unwrap(), "0");
    }

    #[test]
    fn test_membership_requires_a_needle() {
        let err = eval("in?").unwrap_err();
        assert!(err
            .to_string()
            .contains("in? requires at least one argument"));
    }
}
