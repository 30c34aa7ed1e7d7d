//! Parser module for scroll scripts
//!
//! This module contains the tokenizer and parser for scroll scripts.

pub mod types;
pub mod lexer;
pub mod parser;

// Re-exports
pub use types::{ParseError, ParseErrorKind};
pub use lexer::{Token, TokenType, TokenizeError, TokenizeErrorKind, Tokenizer};
pub use parser::{parse_scroll, Parser};
