//! Logic Expansions
//!
//! Boolean operators over the string truth convention, where "0" is false
//! and every other string is true. and, or, and xor fold across all of
//! their arguments.

use crate::builtins::datatypes::{apply_reduce_bool_op, apply_unary_bool_op, bool_to_str};
use crate::interpreter::callhandler::CallbackCallHandler;

/// not, and, or, xor.
pub fn logic_expansions() -> CallbackCallHandler<String> {
    let mut handler = CallbackCallHandler::new();

    handler.add_call("not", |_, context| {
        Ok(bool_to_str(apply_unary_bool_op(context, |v| !v)?).to_string())
    });

    handler.add_call("and", |_, context| {
        Ok(bool_to_str(apply_reduce_bool_op(context, |a, b| a && b)?).to_string())
    });

    handler.add_call("or", |_, context| {
        Ok(bool_to_str(apply_reduce_bool_op(context, |a, b| a || b)?).to_string())
    });

    handler.add_call("xor", |_, context| {
        Ok(bool_to_str(apply_reduce_bool_op(context, |a, b| a ^ b)?).to_string())
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
            .add("logic", logic_expansions());
        interp
            .command_handlers_mut()
            .add("builtin_commands", builtin_commands());

        let ctx = interp.run(&format!("set out $({})", expansion))?;
        Ok(ctx.get_var("out").unwrap_or_default().to_string())
    }

    #[test]
    fn test_not() {
        assert_eq!(eval("not 0").unwrap(), "1");
        assert_eq!(eval("not 1").unwrap(), "0");
        assert_eq!(eval("not hello").unwrap(), "0");
    }

    #[test]
    fn test_and_folds_all_args() {
        assert_eq!(eval("and 1 1 1").unwrap(), "1");
        assert_eq!(eval("and 1 0 1").unwrap(), "0");
        assert_eq!(eval("and 1").unwrap(), "1");
    }

    #[test]
    fn test_or_folds_all_args() {
        assert_eq!(eval("or 0 0 1").unwrap(), "1");
        assert_eq!(eval("or 0 0").unwrap(), "0");
    }

    #[test]
    fn test_xor_folds_all_args() {
        assert_eq!(eval("xor 1 0").unwrap(), "1");
        assert_eq!(eval("xor 1 1").unwrap(), "0");
        assert_eq!(eval("xor 1 0 1").unwrap(), "0");
    }

    #[test]
    fn test_logic_requires_an_argument() {
        let err = eval("and").unwrap_err();
        assert!(err
            .to_string()
            .contains("and requires at least 1 argument"));
    }
}
