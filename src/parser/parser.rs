//! Recursive Descent Parser for Scroll Scripts
//!
//! This parser consumes tokens from the tokenizer and produces a homogeneous
//! AST. Alternatives are tried in order with full backtracking: a failed
//! alternative restores the cursor before the next one runs. Errors marked
//! fatal abort backtracking and propagate unchanged.
//!
//! Grammar (simplified):
//!   root            ::= block_body(top_level)
//!   block_body      ::= (command_separator | statement)* until '}' or EOF
//!   statement       ::= block | control | command
//!   block           ::= '{' block_body '}'
//!   control         ::= '!' eventual_string '(' eventual_string* ')' statement
//!   command         ::= eventual_string eventual_string*
//!   eventual_string ::= expansion | string_literal
//!   expansion       ::= '$' ['^'] (expansion_call | expansion_var)
//!   expansion_call  ::= '(' eventual_string eventual_string* ')'
//!   expansion_var   ::= string_literal

use tracing::trace;

use crate::ast::types::{ASTNode, NodeKind, AST};
use crate::errors::ScrollError;
use crate::parser::lexer::{Token, TokenType, Tokenizer};
use crate::parser::types::{ParseError, ParseErrorKind};

type ParseFn = fn(&mut Parser) -> Result<ASTNode, ParseError>;

/// Cursor over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, source: String) -> Self {
        let mut tokens = tokens;
        if tokens.is_empty() {
            tokens.push(Token::new(TokenType::Eof, "", 0, 0));
        }
        Self {
            tokens,
            pos: 0,
            source,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        if self.pos + 1 >= self.tokens.len() {
            return Err(self.error(ParseErrorKind::Eof, "Unexpected end of script."));
        }
        self.pos += 1;
        trace!("advance token: {}", self.current());
        Ok(())
    }

    fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError::with_token(kind, self.current(), self.source.clone(), message)
    }

    /// Consume and return the current token if it matches, without error.
    fn get(&mut self, token_type: TokenType) -> Result<Option<Token>, ParseError> {
        if self.current().token_type == token_type {
            let tok = self.current().clone();
            self.advance()?;
            Ok(Some(tok))
        } else {
            Ok(None)
        }
    }

    /// Consume the current token if it matches, otherwise error.
    fn expect(&mut self, token_type: TokenType, fatal_on_error: bool) -> Result<Token, ParseError> {
        match self.get(token_type)? {
            Some(tok) => Ok(tok),
            None => {
                let current = self.current();
                let message = format!(
                    "expected {} here, but got {}({})",
                    token_type.as_str(),
                    current.token_type.as_str(),
                    current.value
                );
                let mut err = self.error(ParseErrorKind::Expect, message);
                if fatal_on_error {
                    err = err.fatal();
                }
                Err(err)
            }
        }
    }

    /// Apply `parser` repeatedly, collecting successes. Stops on the first
    /// non-fatal failure without consuming the failed attempt.
    fn parse_greedy(&mut self, parser: ParseFn) -> Result<Vec<ASTNode>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            let save = self.pos;
            match parser(self) {
                Ok(node) => nodes.push(node),
                Err(e) if e.fatal => return Err(e),
                Err(_) => {
                    self.pos = save;
                    return Ok(nodes);
                }
            }
        }
    }

    /// Try each parser in order, backtracking after non-fatal failures. A
    /// fatal failure aborts immediately; if every alternative fails, the last
    /// error is returned.
    fn parse_choice(&mut self, parsers: &[ParseFn]) -> Result<ASTNode, ParseError> {
        let mut last_err: Option<ParseError> = None;
        for parser in parsers {
            let save = self.pos;
            match parser(self) {
                Ok(node) => return Ok(node),
                Err(e) => {
                    let fatal = e.fatal;
                    if !fatal {
                        self.pos = save;
                    }
                    last_err = Some(e);
                    if fatal {
                        break;
                    }
                }
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Err(self.error(
                ParseErrorKind::General,
                "internal: no parsers provided for parse_choice",
            )),
        }
    }

    fn parse_strtok(&mut self) -> Result<ASTNode, ParseError> {
        let tok = self.expect(TokenType::StringLiteral, false)?;
        Ok(ASTNode::new(NodeKind::String, Some(tok)))
    }

    fn parse_expansion_var(&mut self) -> Result<ASTNode, ParseError> {
        trace!("parse_expansion_var");
        Ok(self.parse_strtok()?.wrap(NodeKind::ExpansionVar, true))
    }

    fn parse_expansion_call_args(&mut self) -> Result<ASTNode, ParseError> {
        trace!("parse_expansion_call_args");
        let args = self.parse_greedy(Self::parse_eventual_string)?;
        let first_tok = args.first().and_then(|n| n.token.clone());

        let mut args_node = ASTNode::new(NodeKind::ExpansionArguments, first_tok);
        args_node.children.extend(args);
        Ok(args_node)
    }

    fn parse_expansion_call(&mut self) -> Result<ASTNode, ParseError> {
        trace!("parse_expansion_call");
        let open = self.expect(TokenType::OpenParen, false)?;
        let mut call_node = ASTNode::new(NodeKind::ExpansionCall, Some(open));

        call_node.children.push(self.parse_eventual_string()?);
        call_node.children.push(self.parse_expansion_call_args()?);

        self.expect(TokenType::CloseParen, true)?;
        Ok(call_node)
    }

    fn parse_expansion(&mut self) -> Result<ASTNode, ParseError> {
        trace!("parse_expansion");
        let sigil = self.expect(TokenType::ExpansionSigil, false)?;
        let mut expansion_node = ASTNode::new(NodeKind::Expansion, Some(sigil));

        match self.get(TokenType::MultiSigil)? {
            Some(multi) => expansion_node
                .children
                .push(ASTNode::new(NodeKind::ExpansionMulti, Some(multi))),
            None => expansion_node
                .children
                .push(ASTNode::new(NodeKind::ExpansionSingle, None)),
        }

        expansion_node.children.push(
            self.parse_choice(&[Self::parse_expansion_call, Self::parse_expansion_var])?,
        );

        Ok(expansion_node)
    }

    /// Something that evaluates to a string: a literal, or an expansion.
    fn parse_eventual_string(&mut self) -> Result<ASTNode, ParseError> {
        self.parse_choice(&[Self::parse_expansion, Self::parse_strtok])
    }

    fn parse_command_args(&mut self) -> Result<ASTNode, ParseError> {
        trace!("parse_command_args");
        let args = self.parse_greedy(Self::parse_eventual_string)?;
        let first_tok = args.first().and_then(|n| n.token.clone());

        let mut args_node = ASTNode::new(NodeKind::CommandArguments, first_tok);
        args_node.children.extend(args);
        Ok(args_node)
    }

    fn parse_command(&mut self) -> Result<ASTNode, ParseError> {
        trace!("parse_command");
        let mut command_node = self
            .parse_eventual_string()?
            .wrap(NodeKind::CommandCall, true);
        command_node.children.push(self.parse_command_args()?);
        Ok(command_node)
    }

    fn parse_control_args(&mut self) -> Result<ASTNode, ParseError> {
        trace!("parse_control_args");
        let open = self.expect(TokenType::OpenParen, false)?;
        let mut args_node = ASTNode::new(NodeKind::ControlArguments, Some(open));
        args_node
            .children
            .extend(self.parse_greedy(Self::parse_eventual_string)?);
        self.expect(TokenType::CloseParen, true)?;
        Ok(args_node)
    }

    fn parse_control(&mut self) -> Result<ASTNode, ParseError> {
        trace!("parse_control");
        let sigil = self.expect(TokenType::ControlSigil, false)?;
        let mut control_node = ASTNode::new(NodeKind::ControlCall, Some(sigil));

        control_node.children.push(self.parse_eventual_string()?);
        control_node.children.push(self.parse_control_args()?);
        control_node.children.push(self.parse_statement()?);

        Ok(control_node)
    }

    fn parse_block(&mut self) -> Result<ASTNode, ParseError> {
        let open = self.expect(TokenType::OpenBlock, false)?;
        let mut node = ASTNode::new(NodeKind::Block, Some(open));
        node.children.extend(self.parse_block_body(false)?);
        self.expect(TokenType::CloseBlock, true)?;
        Ok(node)
    }

    pub fn parse_statement(&mut self) -> Result<ASTNode, ParseError> {
        self.parse_choice(&[Self::parse_block, Self::parse_control, Self::parse_command])
    }

    fn parse_block_body(&mut self, top_level: bool) -> Result<Vec<ASTNode>, ParseError> {
        trace!("parse_block_body");
        let mut nodes = Vec::new();

        loop {
            if self.current().token_type == TokenType::CloseBlock {
                if top_level {
                    return Err(self
                        .error(ParseErrorKind::General, "Unexpected block close.")
                        .fatal());
                }
                return Ok(nodes);
            }

            if self.current().token_type == TokenType::Eof {
                if top_level {
                    return Ok(nodes);
                }
                return Err(self
                    .error(
                        ParseErrorKind::Eof,
                        "Unexpected end of script while parsing block.",
                    )
                    .fatal());
            }

            // Separators between statements carry no structure.
            if self.get(TokenType::CommandSep)?.is_some() {
                continue;
            }

            match self.parse_statement() {
                Ok(node) => nodes.push(node),
                Err(e) if e.fatal => return Err(e),
                Err(_) => {
                    return Err(self
                        .error(ParseErrorKind::General, "Expected statement or block here.")
                        .fatal());
                }
            }
        }
    }

    pub fn parse_root(&mut self) -> Result<ASTNode, ParseError> {
        let mut root_node = ASTNode::new(NodeKind::Root, None);
        root_node.children.extend(self.parse_block_body(true)?);
        Ok(root_node)
    }
}

/// Parse a complete scroll from `tokenizer`.
pub fn parse_scroll(tokenizer: Tokenizer) -> Result<AST, ScrollError> {
    let source = tokenizer.source().to_string();
    let tokens = tokenizer.get_all_tokens()?;
    let mut parser = Parser::new(tokens, source.clone());
    let root = parser.parse_root()?;
    Ok(AST::new(root, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(input: &str) -> AST {
        parse_scroll(Tokenizer::new(input, HashMap::new())).unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        match parse_scroll(Tokenizer::new(input, HashMap::new())) {
            Err(ScrollError::Parse(e)) => e,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_command() {
        let ast = parse("print hello world");
        assert_eq!(ast.root.kind, NodeKind::Root);
        assert_eq!(ast.root.children.len(), 1);

        let stmt = &ast.root.children[0];
        assert_eq!(stmt.kind, NodeKind::CommandCall);
        assert_eq!(stmt.children[0].str_content(), Some("print"));

        let args = &stmt.children[1];
        assert_eq!(args.kind, NodeKind::CommandArguments);
        assert_eq!(args.children.len(), 2);
        assert_eq!(args.children[0].str_content(), Some("hello"));
        assert_eq!(args.children[1].str_content(), Some("world"));
        assert_eq!(args.token, args.children[0].token);
    }

    #[test]
    fn test_parse_empty_script() {
        let ast = parse("");
        assert!(ast.root.children.is_empty());
    }

    #[test]
    fn test_parse_separators_between_statements() {
        let ast = parse("a\n\n;;b");
        assert_eq!(ast.root.children.len(), 2);
        assert_eq!(ast.root.children[0].children[0].str_content(), Some("a"));
        assert_eq!(ast.root.children[1].children[0].str_content(), Some("b"));
    }

    #[test]
    fn test_parse_block() {
        let ast = parse("{ a; b }");
        let block = &ast.root.children[0];
        assert_eq!(block.kind, NodeKind::Block);
        assert_eq!(block.children.len(), 2);
        assert_eq!(block.children[0].kind, NodeKind::CommandCall);
        assert_eq!(block.children[1].kind, NodeKind::CommandCall);
    }

    #[test]
    fn test_parse_control() {
        let ast = parse("!repeat(3) { print hi }");
        let control = &ast.root.children[0];
        assert_eq!(control.kind, NodeKind::ControlCall);
        assert_eq!(control.children[0].str_content(), Some("repeat"));

        let args = &control.children[1];
        assert_eq!(args.kind, NodeKind::ControlArguments);
        assert_eq!(args.children.len(), 1);
        assert_eq!(args.children[0].str_content(), Some("3"));

        assert_eq!(control.children[2].kind, NodeKind::Block);
    }

    #[test]
    fn test_parse_expansion_var() {
        let ast = parse("print $x");
        let arg = &ast.root.children[0].children[1].children[0];
        assert_eq!(arg.kind, NodeKind::Expansion);
        assert_eq!(arg.children[0].kind, NodeKind::ExpansionSingle);
        assert!(arg.children[0].token.is_none());

        let var = &arg.children[1];
        assert_eq!(var.kind, NodeKind::ExpansionVar);
        assert_eq!(var.children[0].str_content(), Some("x"));
    }

    #[test]
    fn test_parse_expansion_call_with_multi() {
        let ast = parse("print $^(range 3)");
        let arg = &ast.root.children[0].children[1].children[0];
        assert_eq!(arg.kind, NodeKind::Expansion);
        assert_eq!(arg.children[0].kind, NodeKind::ExpansionMulti);

        let call = &arg.children[1];
        assert_eq!(call.kind, NodeKind::ExpansionCall);
        assert_eq!(call.children[0].str_content(), Some("range"));

        let call_args = &call.children[1];
        assert_eq!(call_args.kind, NodeKind::ExpansionArguments);
        assert_eq!(call_args.children[0].str_content(), Some("3"));
    }

    #[test]
    fn test_parse_computed_command_name() {
        let ast = parse("$(pick) arg");
        let stmt = &ast.root.children[0];
        assert_eq!(stmt.kind, NodeKind::CommandCall);
        assert_eq!(stmt.children[0].kind, NodeKind::Expansion);
        assert_eq!(stmt.children[1].children[0].str_content(), Some("arg"));
    }

    #[test]
    fn test_nested_blocks() {
        let ast = parse("{ { a } }");
        let outer = &ast.root.children[0];
        assert_eq!(outer.kind, NodeKind::Block);
        let inner = &outer.children[0];
        assert_eq!(inner.kind, NodeKind::Block);
        assert_eq!(inner.children[0].kind, NodeKind::CommandCall);
    }

    #[test]
    fn test_statement_after_block() {
        let ast = parse("{ a } b");
        assert_eq!(ast.root.children.len(), 2);
        assert_eq!(ast.root.children[0].kind, NodeKind::Block);
        assert_eq!(ast.root.children[1].kind, NodeKind::CommandCall);
    }

    #[test]
    fn test_unterminated_block_is_fatal() {
        let err = parse_err("{ a");
        assert!(err.fatal);
        assert_eq!(err.kind, ParseErrorKind::Eof);
        assert_eq!(err.message, "Unexpected end of script while parsing block.");
    }

    #[test]
    fn test_unmatched_block_close() {
        let err = parse_err("a\n}");
        assert!(err.fatal);
        assert_eq!(err.message, "Unexpected block close.");
    }

    #[test]
    fn test_missing_close_paren_is_fatal() {
        let err = parse_err("!if (x { }");
        assert!(err.fatal);
        assert_eq!(err.kind, ParseErrorKind::Expect);
        assert!(err.message.contains("CLOSE_PAREN"));
    }

    #[test]
    fn test_fatal_error_skips_remaining_alternatives() {
        // The unclosed expansion call fails fatally; the expansion_var
        // alternative must not run, so the close-paren error survives.
        let err = parse_err("print $( f");
        assert!(err.fatal);
        assert!(err.message.contains("CLOSE_PAREN"));
    }

    #[test]
    fn test_failed_alternative_restores_cursor() {
        // "!cmd x" is not a valid control (no parens), and after backtracking
        // it is not a valid command either. The error lands on the sigil.
        let err = parse_err("!cmd x");
        assert!(err.fatal);
        assert_eq!(err.message, "Expected statement or block here.");
        assert_eq!((err.line, err.column), (0, 0));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let script = "!def(f a) { return $a }\nprint $(f 5)";
        let first = parse(script);
        let second = parse(script);
        assert_eq!(first.root, second.root);
    }
}
