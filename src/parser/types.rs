//! Parser Types
//!
//! Shared types used across parser modules.

use std::fmt;

use crate::errors::render_positional;
use crate::parser::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    General,
    /// Ran out of tokens where more were required.
    Eof,
    /// A specific token type was required and something else was found.
    Expect,
}

/// Error raised when the parser rejects a token stream.
///
/// Fatal errors abort backtracking: once a parse path fails fatally, sibling
/// alternatives are not tried and the error propagates to the caller.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub source: String,
    pub fatal: bool,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        line: usize,
        column: usize,
        source: String,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column,
            source,
            fatal: false,
        }
    }

    /// Position the error at `token`.
    pub fn with_token(
        kind: ParseErrorKind,
        token: &Token,
        source: String,
        message: impl Into<String>,
    ) -> Self {
        Self::new(kind, token.line, token.column, source, message)
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            render_positional(self.line, self.column, &self.source, &self.message)
        )
    }
}

impl std::error::Error for ParseError {}
