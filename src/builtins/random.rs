//! Random Expansions
//!
//! Chance-based expansions, opt-in and outside the base configuration.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::builtins::datatypes::require_arg_length;
use crate::interpreter::callhandler::CallbackCallHandler;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::InterpreterContext;

fn parse_float(context: &InterpreterContext, s: &str) -> Result<f64, InterpreterError> {
    s.trim().parse::<f64>().map_err(|_| {
        context.error(format!("uniform: could not convert string to float: '{}'", s))
    })
}

/// select, shuffle, uniform.
pub fn random_expansions() -> CallbackCallHandler<String> {
    let mut handler = CallbackCallHandler::new();

    handler.add_call("select", |_, context| {
        require_arg_length(context, 1)?;
        match context.args()?.choose(&mut rand::thread_rng()) {
            Some(choice) => Ok(choice.clone()),
            None => Err(context
                .internal_error("select: no arguments after length check.")
                .into()),
        }
    });

    handler.add_call("shuffle", |_, context| {
        let mut args = context.args()?.to_vec();
        args.shuffle(&mut rand::thread_rng());
        Ok(args.join(" "))
    });

    handler.add_call("uniform", |_, context| {
        let (lower, upper) = {
            let args = context.args()?;
            if args.len() != 2 {
                return Err(context
                    .error(format!(
                        "uniform: must have two args. (got {})",
                        args.join(", ")
                    ))
                    .into());
            }
            (parse_float(context, &args[0])?, parse_float(context, &args[1])?)
        };

        let t: f64 = rand::thread_rng().gen();
        Ok(format!("{:?}", lower + (upper - lower) * t))
    });

    handler
}
