//! Builtin Library
//!
//! The standard set of commands, controls, and expansions, grouped into
//! call handlers. [base_config] bundles the core pieces; console and
//! random handlers are opt-in extras.
//!
//! Handlers are plain constructor functions, so embedders can pick
//! individual pieces without taking a whole configuration.

pub mod arithmetic;
pub mod commands;
pub mod comparison;
pub mod controls;
pub mod datatypes;
pub mod logic;
pub mod random;
pub mod strings;

pub use arithmetic::arithmetic_expansions;
pub use commands::{builtin_commands, stdio_commands};
pub use comparison::comparison_expansions;
pub use controls::builtin_controls;
pub use logic::logic_expansions;
pub use random::random_expansions;
pub use strings::string_expansions;

use crate::interpreter::callhandler::CallHandler;
use crate::interpreter::errors::Unwind;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::types::InterpreterContext;

/// Seeds every fresh context with the `true` and `false` variables.
pub struct BuiltinInitializer;

impl CallHandler<()> for BuiltinInitializer {
    fn handle_call(
        &self,
        _interpreter: &Interpreter,
        context: &mut InterpreterContext,
    ) -> Result<(), Unwind> {
        context.set_var("true", datatypes::TRUE);
        context.set_var("false", datatypes::FALSE);
        Ok(())
    }

    fn contains(&self, _name: &str) -> bool {
        false
    }
}

/// A bundle of named call handlers applied to an interpreter in one step.
///
/// Handlers register in insertion order, which is also dispatch order, so
/// earlier handlers shadow later ones for the names they share.
#[derive(Default)]
pub struct InterpreterConfig {
    initializers: Vec<(String, Box<dyn CallHandler<()>>)>,
    commands: Vec<(String, Box<dyn CallHandler<()>>)>,
    controls: Vec<(String, Box<dyn CallHandler<()>>)>,
    expansions: Vec<(String, Box<dyn CallHandler<String>>)>,
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initializer(
        mut self,
        name: impl Into<String>,
        handler: impl CallHandler<()> + 'static,
    ) -> Self {
        self.initializers.push((name.into(), Box::new(handler)));
        self
    }

    pub fn with_command_handler(
        mut self,
        name: impl Into<String>,
        handler: impl CallHandler<()> + 'static,
    ) -> Self {
        self.commands.push((name.into(), Box::new(handler)));
        self
    }

    pub fn with_control_handler(
        mut self,
        name: impl Into<String>,
        handler: impl CallHandler<()> + 'static,
    ) -> Self {
        self.controls.push((name.into(), Box::new(handler)));
        self
    }

    pub fn with_expansion_handler(
        mut self,
        name: impl Into<String>,
        handler: impl CallHandler<String> + 'static,
    ) -> Self {
        self.expansions.push((name.into(), Box::new(handler)));
        self
    }

    /// Register everything on `interpreter`.
    pub fn configure(self, interpreter: &mut Interpreter) {
        for (name, handler) in self.initializers {
            interpreter.initializers_mut().add(name, handler);
        }
        for (name, handler) in self.commands {
            interpreter.command_handlers_mut().add(name, handler);
        }
        for (name, handler) in self.controls {
            interpreter.control_handlers_mut().add(name, handler);
        }
        for (name, handler) in self.expansions {
            interpreter.expansion_handlers_mut().add(name, handler);
        }
    }
}

/// The standard library: initializer, core commands and controls, and the
/// arithmetic, comparison, logic, and string expansions.
///
/// Console and random handlers are left out; add [stdio_commands] and
/// [random_expansions] where they make sense.
pub fn base_config() -> InterpreterConfig {
    InterpreterConfig::new()
        .with_initializer("builtin_initializer", BuiltinInitializer)
        .with_command_handler("builtin_commands", commands::builtin_commands())
        .with_control_handler("builtin_controls", controls::builtin_controls())
        .with_expansion_handler("arithmetic", arithmetic::arithmetic_expansions())
        .with_expansion_handler("comparison", comparison::comparison_expansions())
        .with_expansion_handler("logic", logic::logic_expansions())
        .with_expansion_handler("string", strings::string_expansions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::callhandler::CallbackCallHandler;

    fn configured() -> Interpreter {
        let mut interp = Interpreter::new();
        base_config().configure(&mut interp);
        interp
    }

    #[test]
    fn test_initializer_seeds_truth_variables() {
        let ctx = configured().run("").unwrap();
        assert_eq!(ctx.get_var("true"), Some("1"));
        assert_eq!(ctx.get_var("false"), Some("0"));
    }

    #[test]
    fn test_base_config_runs_loops() {
        let ctx = configured()
            .run("set n 0\n!while($(< $n 3)) { set n $(+ $n 1) }\nset out $n")
            .unwrap();
        assert_eq!(ctx.get_var("out"), Some("3"));
    }

    #[test]
    fn test_base_config_supports_recursion() {
        let script = "\
!def(fact n) {
    !if($(<= $n 1)) {
        return 1
    }
    return $(* $n $(fact $(- $n 1)))
}
set out $(fact 5)";
        let ctx = configured().run(script).unwrap();
        assert_eq!(ctx.get_var("out"), Some("120"));
    }

    #[test]
    fn test_console_handlers_are_opt_in() {
        let err = configured().run("print hi").unwrap_err();
        assert!(err.to_string().contains("Command 'print' not found."));
    }

    #[test]
    fn test_earlier_handlers_shadow_later_ones() {
        let mut custom = CallbackCallHandler::new();
        custom.add_call("+", |_, _| Ok("custom".to_string()));

        let mut interp = Interpreter::new();
        InterpreterConfig::new()
            .with_expansion_handler("custom", custom)
            .configure(&mut interp);
        base_config().configure(&mut interp);

        let ctx = interp.run("set out $(+ 1 2)").unwrap();
        assert_eq!(ctx.get_var("out"), Some("custom"));
    }
}
