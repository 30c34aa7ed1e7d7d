//! Abstract Syntax Tree (AST) Types for Scrolls
//!
//! This module defines the homogeneous node structure scroll parsers produce
//! and the interpreter walks.
//!
//! Architecture:
//!   Input -> Tokenizer -> Parser -> AST -> Interpreter -> Output

pub mod types;

pub use types::{ASTNode, NodeKind, AST};
