//! Interpreter module
//!
//! This module contains the scroll interpreter implementation.

pub mod callhandler;
pub mod errors;
pub mod interpreter;
pub mod types;

// Re-exports
pub use callhandler::{
    CallHandler, CallHandlerContainer, CallbackCallHandler, RuntimeCallHandler, ScrollCallback,
};
pub use errors::{CallKind, InterpreterError, InterpreterErrorKind, SourceAnchor, Unwind};
pub use interpreter::Interpreter;
pub use types::{ArgSourceMap, CallContext, ExecutionLimits, InterpreterContext, ScopedVarStore};
