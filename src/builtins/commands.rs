//! Builtin Commands
//!
//! Core commands every configuration carries: variable assignment, scope
//! redirection, and run termination. Console commands (print, input) are a
//! separate opt-in handler so embedders without a console can leave them
//! out.

use std::io;
use std::io::BufRead;

use crate::builtins::datatypes::require_arg_length;
use crate::interpreter::callhandler::CallbackCallHandler;
use crate::interpreter::errors::Unwind;

/// set, unset, return, stop, nonlocal, global.
pub fn builtin_commands() -> CallbackCallHandler<()> {
    let mut handler = CallbackCallHandler::new();

    handler.add_call("set", |_, context| {
        let (name, value) = {
            let args = context.args()?;
            if args.is_empty() {
                return Err(context.error("set: variable name is not specified").into());
            }
            (args[0].clone(), args[1..].join(" "))
        };
        context.set_var(&name, &value);
        Ok(())
    });

    handler.add_call("unset", |_, context| {
        let name = {
            let args = context.args()?;
            if args.is_empty() {
                return Err(context
                    .error("unset: variable name is not specified")
                    .into());
            }
            args[0].clone()
        };
        if !context.del_var(&name) {
            return Err(context
                .error(format!("unset: no such variable {}", name))
                .into());
        }
        Ok(())
    });

    handler.add_call("return", |_, context| {
        let value = context.args()?.join(" ");
        context.set_retval(&value)?;
        Err(Unwind::Return)
    });

    handler.add_call("stop", |_, _| Err(Unwind::Stop));

    handler.add_call("nonlocal", |_, context| {
        require_arg_length(context, 1)?;
        let name = context.args()?[0].clone();
        context.vars_mut().declare_nonlocal(&name);
        Ok(())
    });

    handler.add_call("global", |_, context| {
        require_arg_length(context, 1)?;
        let name = context.args()?[0].clone();
        context.vars_mut().declare_global(&name);
        Ok(())
    });

    handler
}

/// print, input.
pub fn stdio_commands() -> CallbackCallHandler<()> {
    let mut handler = CallbackCallHandler::new();

    handler.add_call("print", |_, context| {
        println!("{}", context.args()?.join(" "));
        Ok(())
    });

    handler.add_call("input", |_, context| {
        let name = {
            let args = context.args()?;
            if args.is_empty() {
                return Err(context
                    .error("input: variable name is not specified")
                    .into());
            }
            args[0].clone()
        };

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| context.error(format!("input: {}", e)))?;
        if read == 0 {
            return Err(context.error("input: unexpected end of input").into());
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }

        context.set_var(&name, &line);
        Ok(())
    });

    handler
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::interpreter::Interpreter;
    use crate::interpreter::types::InterpreterContext;

    fn interpreter() -> Interpreter {
        let mut interp = Interpreter::new();
        interp
            .command_handlers_mut()
            .add("builtin_commands", builtin_commands());
        interp
    }

    #[test]
    fn test_set_assigns_variables() {
        let ctx = interpreter().run("set greeting hello world").unwrap();
        assert_eq!(ctx.get_var("greeting"), Some("hello world"));
    }

    #[test]
    fn test_set_without_value_assigns_empty() {
        let ctx = interpreter().run("set flag").unwrap();
        assert_eq!(ctx.get_var("flag"), Some(""));
    }

    #[test]
    fn test_set_requires_name() {
        let err = interpreter().run("set").unwrap_err();
        assert!(err
            .to_string()
            .contains("set: variable name is not specified"));
    }

    #[test]
    fn test_unset_removes_variables() {
        let ctx = interpreter().run("set x 1; unset x").unwrap();
        assert_eq!(ctx.get_var("x"), None);
    }

    #[test]
    fn test_unset_missing_variable_errors() {
        let err = interpreter().run("unset ghost").unwrap_err();
        assert!(err.to_string().contains("unset: no such variable ghost"));
    }

    #[test]
    fn test_stop_skips_rest_of_script() {
        let ctx = interpreter().run("set x 1; stop; set x 2").unwrap();
        assert_eq!(ctx.get_var("x"), Some("1"));
    }

    #[test]
    fn test_return_at_top_level_errors() {
        let err = interpreter().run("return 5").unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot return, no call stack (outside calls)"));
    }

    #[test]
    fn test_nonlocal_requires_name() {
        let err = interpreter().run("nonlocal").unwrap_err();
        assert!(err
            .to_string()
            .contains("nonlocal requires at least 1 argument"));
    }

    #[test]
    fn test_global_assigns_through_scopes() {
        let interp = interpreter();
        let mut ctx = InterpreterContext::new();

        ctx.vars_mut().new_scope();
        interp.run_statement("global x", &mut ctx, false).unwrap();
        interp.run_statement("set x 5", &mut ctx, false).unwrap();
        ctx.vars_mut().destroy_scope();

        assert_eq!(ctx.get_var("x"), Some("5"));
    }

    #[test]
    fn test_input_requires_variable_name() {
        let mut interp = interpreter();
        interp.command_handlers_mut().add("stdio", stdio_commands());
        let err = interp.run("input").unwrap_err();
        assert!(err
            .to_string()
            .contains("input: variable name is not specified"));
    }
}
