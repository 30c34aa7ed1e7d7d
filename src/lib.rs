//! scrolls - An embeddable scripting language
//!
//! This library provides the full pipeline for scroll scripts: a
//! context-sensitive tokenizer, a backtracking parser producing a
//! homogeneous AST, and a tree-walking interpreter dispatching every call
//! through pluggable handler containers.
//!
//! The quickest way to a working interpreter is
//! [`builtins::base_config`], which bundles the standard library:
//!
//! ```
//! use scrolls::builtins::base_config;
//! use scrolls::interpreter::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! base_config().configure(&mut interpreter);
//!
//! let context = interpreter.run("set greeting hello").unwrap();
//! assert_eq!(context.get_var("greeting"), Some("hello"));
//! ```

pub mod ast;
pub mod builtins;
pub mod errors;
pub mod interpreter;
pub mod parser;

pub use ast::{ASTNode, NodeKind, AST};
pub use builtins::{base_config, BuiltinInitializer, InterpreterConfig};
pub use errors::ScrollError;
pub use interpreter::{
    CallHandler, CallHandlerContainer, CallbackCallHandler, ExecutionLimits, Interpreter,
    InterpreterContext, InterpreterError, RuntimeCallHandler, Unwind,
};
pub use parser::{parse_scroll, Tokenizer};
