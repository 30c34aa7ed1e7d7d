//! String Expansions
//!
//! Concatenation and vector helpers. Vectors are plain strings whose
//! elements are separated by whitespace, so these mostly wrap careful
//! splitting.

use crate::builtins::datatypes::{bool_to_str, require_all_numeric, require_arg_length};
use crate::interpreter::callhandler::CallbackCallHandler;

/// Everything after the first element and the whitespace run that follows
/// it. Internal and trailing whitespace survive untouched.
fn split_tail(vector: &str) -> &str {
    let trimmed = vector.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(idx) => trimmed[idx..].trim_start(),
        None => "",
    }
}

/// cat (alias concat), vempty?, vhead, vtail, rangev.
pub fn string_expansions() -> CallbackCallHandler<String> {
    let mut handler = CallbackCallHandler::new();

    handler.add_call("cat", |_, context| Ok(context.args()?.concat()));
    handler.add_alias("concat", "cat");

    handler.add_call("vempty?", |_, context| {
        require_arg_length(context, 1)?;
        Ok(bool_to_str(context.args()?[0].is_empty()).to_string())
    });

    handler.add_call("vhead", |_, context| {
        require_arg_length(context, 1)?;
        match context.args()?[0].split_whitespace().next() {
            Some(head) => Ok(head.to_string()),
            None => Err(context.error("vhead: vector is empty").into()),
        }
    });

    handler.add_call("vtail", |_, context| {
        require_arg_length(context, 1)?;
        Ok(split_tail(&context.args()?[0]).to_string())
    });

    handler.add_call("rangev", |_, context| {
        require_arg_length(context, 2)?;
        let nums = require_all_numeric(context, context.args()?)?;

        let (a, b) = (nums[0].truncated(), nums[1].truncated());
        let range: Vec<String> = (a..b).map(|x| x.to_string()).collect();
        Ok(range.join(" "))
    });

    handler
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::commands::builtin_commands;
    use crate::errors::ScrollError;
    use crate::interpreter::interpreter::Interpreter;

    fn eval_script(script: &str) -> Result<String, ScrollError> {
        let mut interp = Interpreter::new();
        interp
            .expansion_handlers_mut()
            .add("string", string_expansions());
        interp
            .command_handlers_mut()
            .add("builtin_commands", builtin_commands());

        let ctx = interp.run(script)?;
        Ok(ctx.get_var("out").unwrap_or_default().to_string())
    }

    fn eval(expansion: &str) -> Result<String, ScrollError> {
        eval_script(&format!("set out $({})", expansion))
    }

    #[test]
    fn test_cat_joins_without_spaces() {
        assert_eq!(eval("cat a b c").unwrap(), "abc");
        assert_eq!(
            eval_script("set v Hello world\nset out $(concat $v !)").unwrap(),
            "Hello world!"
        );
    }

    #[test]
    fn test_vempty() {
        assert_eq!(eval_script("set e\nset out $(vempty? $e)").unwrap(), "1");
        assert_eq!(eval("vempty? full").unwrap(), "0");
    }

    #[test]
    fn test_vhead_takes_first_element() {
        assert_eq!(
            eval_script("set vec 2 4 8 16\nset out $(vhead $vec)").unwrap(),
            "2"
        );
    }

    #[test]
    fn test_vhead_of_empty_vector_errors() {
        let err = eval_script("set e\nset out $(vhead $e)").unwrap_err();
        assert!(err.to_string().contains("vhead: vector is empty"));
    }

    #[test]
    fn test_vtail_drops_first_element() {
        assert_eq!(
            eval_script("set vec 2 4 8 16\nset out $(vtail $vec)").unwrap(),
            "4 8 16"
        );
        assert_eq!(eval("vtail lone").unwrap(), "");
        assert_eq!(eval_script("set e\nset out $(vtail $e)").unwrap(), "");
    }

    #[test]
    fn test_split_tail_preserves_inner_whitespace() {
        assert_eq!(split_tail(" a   b  c "), "b  c ");
        assert_eq!(split_tail("a"), "");
        assert_eq!(split_tail(""), "");
    }

    #[test]
    fn test_rangev_builds_vectors() {
        assert_eq!(eval("rangev 0 4").unwrap(), "0 1 2 3");
        assert_eq!(eval("rangev 2 2").unwrap(), "");
        assert_eq!(eval("rangev 0 2.9").unwrap(), "0 1");
    }

    #[test]
    fn test_rangev_argument_errors() {
        let err = eval("rangev 1").unwrap_err();
        assert!(err
            .to_string()
            .contains("rangev requires at least 2 arguments"));

        let err = eval("rangev a 2").unwrap_err();
        assert!(err
            .to_string()
            .contains("rangev: a is not a valid int or float"));
    }
}
