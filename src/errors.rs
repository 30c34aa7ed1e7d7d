//! Positional Error Reporting
//!
//! Every tokenizer, parser, and interpreter error points at a location in the
//! source script. `render_positional` produces the standard report for such an
//! error: a numbered window of source lines ending at the failing line, a
//! caret marking the failing column, and a `line N: message` trailer. Line and
//! column numbers are both 0-based.

use std::fmt;

use thiserror::Error;

use crate::interpreter::errors::InterpreterError;
use crate::parser::lexer::TokenizeError;
use crate::parser::types::ParseError;

/// Number of source lines printed above the failing line.
pub const PRIOR_LINES: usize = 3;

/// Render a positional error report for `message` at `line`/`pos` in `source`.
pub fn render_positional(line: usize, pos: usize, source: &str, message: &str) -> String {
    let zfill = source.len().max(1).ilog10().max(1) as usize;
    let numbered: Vec<String> = source
        .lines()
        .enumerate()
        .map(|(n, text)| format!("{:0zfill$} {}", n, text))
        .collect();

    let start = line.saturating_sub(PRIOR_LINES);
    let end = (line + 1).min(numbered.len());

    let mut out: Vec<String> = Vec::new();
    if line > PRIOR_LINES {
        out.push("...".to_string());
    }
    if start < end {
        out.extend_from_slice(&numbered[start..end]);
    }
    out.push(format!("{}^", " ".repeat(pos + 1 + zfill)));
    out.push(format!("line {}: {}", line, message));

    out.join("\n")
}

/// Unified error type for everything that can fail while loading or running
/// a script.
#[derive(Debug, Clone, Error)]
pub enum ScrollError {
    Tokenize(#[from] TokenizeError),
    Parse(#[from] ParseError),
    Interpreter(#[from] InterpreterError),
}

impl fmt::Display for ScrollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollError::Tokenize(e) => write!(f, "{}", e),
            ScrollError::Parse(e) => write!(f, "{}", e),
            ScrollError::Interpreter(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_caret_under_failing_column() {
        let src = "foo bar\nbaz qux";
        let out = render_positional(1, 4, src, "Test message.");
        assert_eq!(out, "0 foo bar\n1 baz qux\n      ^\nline 1: Test message.");
    }

    #[test]
    fn test_render_elides_distant_lines() {
        let src = "a\nb\nc\nd\ne\nf";
        let out = render_positional(5, 0, src, "boom");
        assert_eq!(out, "...\n2 c\n3 d\n4 e\n5 f\n  ^\nline 5: boom");
    }

    #[test]
    fn test_render_empty_source() {
        let out = render_positional(0, 0, "", "oops");
        assert_eq!(out, "  ^\nline 0: oops");
    }

    #[test]
    fn test_render_widens_line_numbers_for_long_sources() {
        let src = "one\n".repeat(30);
        let out = render_positional(0, 0, &src, "x");
        assert!(out.starts_with("00 one"));
    }
}
