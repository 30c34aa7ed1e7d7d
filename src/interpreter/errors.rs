//! Interpreter Errors and Unwind Signals
//!
//! Runtime errors are anchored to the source position of whichever AST node
//! the engine was visiting when they were raised, so errors thrown deep
//! inside a handler still point at a line and column.
//!
//! Stop and Return are not errors. They implement intentional non-local
//! control transfer:
//! - stop: Halt the whole run
//! - return: Unwind to the nearest runtime-call frame
//!
//! Both travel through the same result channel as errors so that every
//! unwinding path restores the call stack the same way.

use std::fmt;

use crate::ast::types::NodeKind;
use crate::errors::render_positional;

/// Source position an interpreter error is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceAnchor {
    pub line: usize,
    pub column: usize,
}

impl SourceAnchor {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The three call namespaces a name can be looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Command,
    Control,
    Expansion,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Control => "control",
            Self::Expansion => "expansion",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Command => "Command",
            Self::Control => "Control",
            Self::Expansion => "Expansion",
        }
    }

    /// The call node kind this namespace is dispatched from.
    pub fn node_kind(&self) -> NodeKind {
        match self {
            Self::Command => NodeKind::CommandCall,
            Self::Control => NodeKind::ControlCall,
            Self::Expansion => NodeKind::ExpansionCall,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterErrorKind {
    General,
    /// A violated engine invariant. Never expected in correct usage.
    Internal,
    /// A call name that resolved to no handler.
    MissingCall { kind: CallKind, name: String },
}

/// Runtime error raised during interpretation.
#[derive(Debug, Clone)]
pub struct InterpreterError {
    pub kind: InterpreterErrorKind,
    pub message: String,
    pub anchor: Option<SourceAnchor>,
    pub script: String,
}

impl InterpreterError {
    pub fn new(
        message: impl Into<String>,
        anchor: Option<SourceAnchor>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            kind: InterpreterErrorKind::General,
            message: message.into(),
            anchor,
            script: script.into(),
        }
    }

    pub fn internal(
        message: impl Into<String>,
        anchor: Option<SourceAnchor>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            kind: InterpreterErrorKind::Internal,
            message: format!(
                "INTERNAL ERROR. If you see this, please report it!\n{}",
                message.into()
            ),
            anchor,
            script: script.into(),
        }
    }

    pub fn missing_call(
        kind: CallKind,
        name: impl Into<String>,
        anchor: Option<SourceAnchor>,
        script: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            kind: InterpreterErrorKind::MissingCall {
                kind,
                name: name.clone(),
            },
            message: format!("{} '{}' not found.", kind.label(), name),
            anchor,
            script: script.into(),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind == InterpreterErrorKind::Internal
    }

    pub fn is_missing_call(&self) -> bool {
        matches!(self.kind, InterpreterErrorKind::MissingCall { .. })
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor {
            Some(anchor) => write!(
                f,
                "{}",
                render_positional(anchor.line, anchor.column, &self.script, &self.message)
            ),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for InterpreterError {}

/// Non-local exit carried through interpretation results.
#[derive(Debug)]
pub enum Unwind {
    /// Halt the whole run. Not a failure.
    Stop,
    /// Unwind to the nearest active runtime-call frame.
    Return,
    Err(InterpreterError),
}

impl Unwind {
    pub fn is_stop(&self) -> bool {
        matches!(self, Unwind::Stop)
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Unwind::Return)
    }
}

impl From<InterpreterError> for Unwind {
    fn from(e: InterpreterError) -> Self {
        Unwind::Err(e)
    }
}
