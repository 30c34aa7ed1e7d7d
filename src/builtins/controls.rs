//! Builtin Controls
//!
//! Flow control: repeat, for, if, while, and def. Control handlers receive
//! their body unevaluated and call back into the engine to run it, so a
//! body may run any number of times, or never.

use std::rc::Rc;

use crate::ast::types::{ASTNode, NodeKind};
use crate::builtins::datatypes::{require_arg_length, str_to_bool};
use crate::interpreter::callhandler::CallbackCallHandler;

/// Whether `node` contains a literal `return` command of its own. Returns
/// inside nested definitions belong to those definitions, and computed
/// call names never count.
fn contains_direct_return(node: &ASTNode) -> bool {
    let name = node.children.first().and_then(|child| child.str_content());
    match node.kind {
        NodeKind::CommandCall if name == Some("return") => return true,
        NodeKind::ControlCall if name == Some("def") => return false,
        _ => {}
    }
    node.children.iter().any(contains_direct_return)
}

/// repeat, for, if, while, def.
pub fn builtin_controls() -> CallbackCallHandler<()> {
    let mut handler = CallbackCallHandler::new();

    handler.add_call("repeat", |interpreter, context| {
        if context.args()?.len() != 1 {
            return Err(context
                .error("repeat requires exactly one argument, the number of times to repeat")
                .into());
        }
        let body = context.control_node()?;

        context.anchor_to_arg(0);
        let raw = context.args()?[0].clone();
        let times = match raw.trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => {
                return Err(context
                    .error(format!("'{}' is not a valid integer", raw))
                    .into())
            }
        };

        for _ in 0..times {
            interpreter.interpret_statement(context, &body)?;
        }
        Ok(())
    });

    handler.add_call("for", |interpreter, context| {
        if context.args()?.len() < 3 {
            return Err(context
                .error("bad format in !for: expected !for(VARNAME in ARGS)")
                .into());
        }
        let body = context.control_node()?;
        let (var_name, keyword, values) = {
            let args = context.args()?;
            (args[0].clone(), args[1].clone(), args[2..].to_vec())
        };

        if keyword != "in" {
            context.anchor_to_arg(1);
            return Err(context
                .error(format!("unexpected token '{}', should be 'in'", keyword))
                .into());
        }

        for value in &values {
            context.set_var(&var_name, value);
            interpreter.interpret_statement(context, &body)?;
        }
        context.del_var(&var_name);
        Ok(())
    });

    handler.add_call("if", |interpreter, context| {
        if context.args()?.len() != 1 {
            return Err(context
                .error("if: needs one and only one argument")
                .into());
        }
        if str_to_bool(&context.args()?[0]) {
            let body = context.control_node()?;
            interpreter.interpret_statement(context, &body)?;
        }
        Ok(())
    });

    handler.add_call("while", |interpreter, context| {
        if context.args()?.len() != 1 {
            return Err(context
                .error("while: needs one and only one argument")
                .into());
        }
        let body = context.control_node()?;
        let condition = match context.arg_nodes()?.get(0) {
            Some(node) => Rc::clone(node),
            None => {
                return Err(context
                    .internal_error("while: condition has no source node.")
                    .into())
            }
        };

        // The first check uses the already-evaluated argument; later checks
        // re-evaluate the condition's source node so the loop observes its
        // own effects.
        let mut check = str_to_bool(&context.args()?[0]);
        while check {
            interpreter.interpret_statement(context, &body)?;

            let values = interpreter.interpret_string_or_expansion(context, &condition)?;
            check = match values.first() {
                Some(value) => str_to_bool(value),
                None => {
                    return Err(context
                        .error("while: condition produced no value")
                        .into())
                }
            };
        }
        Ok(())
    });

    handler.add_call("def", |_, context| {
        require_arg_length(context, 1)?;
        let (name, params) = {
            let args = context.args()?;
            (args[0].clone(), args[1..].to_vec())
        };
        let body = context.control_node()?;

        // Definitions with a literal return become expansions, the rest
        // become commands.
        if contains_direct_return(&body) {
            context.runtime_expansions_mut().define(name, body, params);
        } else {
            context.runtime_commands_mut().define(name, body, params);
        }
        Ok(())
    });

    handler
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::builtins::commands::builtin_commands;
    use crate::interpreter::interpreter::Interpreter;

    fn interpreter() -> (Interpreter, Rc<RefCell<Vec<String>>>) {
        let mut interp = Interpreter::new();
        interp
            .control_handlers_mut()
            .add("builtin_controls", builtin_controls());
        interp
            .command_handlers_mut()
            .add("builtin_commands", builtin_commands());

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut printer = CallbackCallHandler::new();
        printer.add_call("print", move |_, context| {
            sink.borrow_mut().push(context.args()?.join(" "));
            Ok(())
        });
        interp.command_handlers_mut().add("printer", printer);

        (interp, log)
    }

    #[test]
    fn test_repeat_runs_body_n_times() {
        let (interp, log) = interpreter();
        interp.run("!repeat(3) { print x }").unwrap();
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_repeat_negative_count_skips_body() {
        let (interp, log) = interpreter();
        interp.run("!repeat(-2) { print never }").unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_repeat_rejects_bad_counts() {
        let (interp, _log) = interpreter();
        let err = interp.run("!repeat(banana) { print x }").unwrap_err();
        assert!(err.to_string().contains("'banana' is not a valid integer"));

        let err = interp.run("!repeat(1 2) { print x }").unwrap_err();
        assert!(err
            .to_string()
            .contains("repeat requires exactly one argument"));
    }

    #[test]
    fn test_for_iterates_and_cleans_up() {
        let (interp, log) = interpreter();
        let ctx = interp.run("!for(x in a b c) { print $x }").unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(ctx.get_var("x"), None);
    }

    #[test]
    fn test_for_requires_in_keyword() {
        let (interp, _log) = interpreter();
        let err = interp.run("!for(x of a b) { print $x }").unwrap_err();
        assert!(err
            .to_string()
            .contains("unexpected token 'of', should be 'in'"));

        let err = interp.run("!for(x) { print $x }").unwrap_err();
        assert!(err
            .to_string()
            .contains("bad format in !for: expected !for(VARNAME in ARGS)"));
    }

    #[test]
    fn test_if_runs_body_on_truth() {
        let (interp, log) = interpreter();
        interp.run("!if(1) { print yes }\n!if(0) { print no }").unwrap();
        assert_eq!(*log.borrow(), vec!["yes".to_string()]);
    }

    #[test]
    fn test_if_requires_one_argument() {
        let (interp, _log) = interpreter();
        let err = interp.run("!if(1 2) { print x }").unwrap_err();
        assert!(err
            .to_string()
            .contains("if: needs one and only one argument"));
    }

    #[test]
    fn test_while_reevaluates_condition() {
        let (interp, log) = interpreter();
        interp
            .run("set flag 1\n!while($flag) { print tick; set flag 0 }")
            .unwrap();
        assert_eq!(*log.borrow(), vec!["tick".to_string()]);
    }

    #[test]
    fn test_while_false_condition_skips_body() {
        let (interp, log) = interpreter();
        interp.run("!while(0) { print never }").unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_def_creates_commands() {
        let (interp, log) = interpreter();
        interp
            .run("!def(greet who) { print hello $who }\ngreet world")
            .unwrap();
        assert_eq!(*log.borrow(), vec!["hello world".to_string()]);
    }

    #[test]
    fn test_def_with_return_creates_expansions() {
        let (interp, log) = interpreter();
        interp
            .run("!def(twice x) { return $x $x }\nprint $(twice 5)")
            .unwrap();
        assert_eq!(*log.borrow(), vec!["5 5".to_string()]);
    }

    #[test]
    fn test_def_ignores_returns_of_nested_definitions() {
        let (interp, log) = interpreter();
        let script = "!def(outer) { !def(inner) { return 1 }; print made inner }\nouter\nprint $(inner)";
        interp.run(script).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["made inner".to_string(), "1".to_string()]
        );
    }

    #[test]
    fn test_def_requires_a_name() {
        let (interp, _log) = interpreter();
        let err = interp.run("!def() { print x }").unwrap_err();
        assert!(err.to_string().contains("def requires at least 1 argument"));
    }
}
