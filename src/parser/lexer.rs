//! Tokenizer for Scroll Scripts
//!
//! The tokenizer converts source text into a flat stream of typed tokens that
//! the parser consumes. It handles:
//! - Single-character structural tokens (sigils, brackets, separators)
//! - String literals (any other run of non-delimiter characters)
//! - The consume-rest sub-mode, which captures the remainder of a statement
//!   as a single literal after a configured trigger word
//!
//! Line and column numbers are 0-based. Carriage returns and surrounding
//! whitespace are stripped from the input before tokenizing.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::errors::render_positional;

/// Token types produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    OpenParen,
    CloseParen,
    OpenBlock,
    CloseBlock,
    ExpansionSigil,
    MultiSigil,
    ControlSigil,
    CommandSep,
    StringLiteral,
    Eof,
    Whitespace,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenParen => "OPEN_PAREN",
            Self::CloseParen => "CLOSE_PAREN",
            Self::OpenBlock => "OPEN_BLOCK",
            Self::CloseBlock => "CLOSE_BLOCK",
            Self::ExpansionSigil => "EXPANSION_SIGIL",
            Self::MultiSigil => "MULTI_SIGIL",
            Self::ControlSigil => "CONTROL_SIGIL",
            Self::CommandSep => "COMMAND_SEP",
            Self::StringLiteral => "STRING_LITERAL",
            Self::Eof => "EOF",
            Self::Whitespace => "WHITESPACE",
        }
    }
}

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub line: usize,
    pub column: usize,
    /// Set on literals captured while the tokenizer was in consume-rest mode.
    pub consume_rest: bool,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            token_type,
            value: value.into(),
            line,
            column,
            consume_rest: false,
        }
    }

    pub fn with_consume_rest(mut self, consume_rest: bool) -> Self {
        self.consume_rest = consume_rest;
        self
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.token_type.as_str(), self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeErrorKind {
    General,
    Eof,
}

/// Error raised when the tokenizer encounters invalid input.
#[derive(Debug, Clone)]
pub struct TokenizeError {
    pub kind: TokenizeErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub source: String,
}

impl TokenizeError {
    pub fn new(
        kind: TokenizeErrorKind,
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
        }
    }
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            render_positional(self.line, self.column, &self.source, &self.message)
        )
    }
}

impl std::error::Error for TokenizeError {}

/// Characters treated as whitespace between tokens.
const WHITESPACE: &[char] = &['\t', ' '];

/// Default stop characters for consume-rest literals.
const CONSUME_REST_STOP: &[char] = &['\n', ';', '{', '}'];

lazy_static::lazy_static! {
    /// Single characters that map directly to token types.
    static ref CHAR_TOKENS: HashMap<char, TokenType> = {
        let mut m = HashMap::new();
        m.insert('\n', TokenType::CommandSep);
        m.insert(';', TokenType::CommandSep);
        m.insert('(', TokenType::OpenParen);
        m.insert(')', TokenType::CloseParen);
        m.insert('{', TokenType::OpenBlock);
        m.insert('}', TokenType::CloseBlock);
        m.insert('$', TokenType::ExpansionSigil);
        m.insert('!', TokenType::ControlSigil);
        m.insert('^', TokenType::MultiSigil);
        m
    };

    /// Stop characters for normal string literals.
    static ref STRING_LITERAL_STOP: Vec<char> = {
        let mut v: Vec<char> = CHAR_TOKENS.keys().copied().collect();
        v.extend_from_slice(WHITESPACE);
        v
    };
}

/// State machine for consume-rest tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsumeRestState {
    Off,
    Counting,
    Consume,
}

/// Tokenizer over a scroll source string.
pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    source: String,
    consume_rest_triggers: HashMap<String, usize>,
    consume_rest_state: ConsumeRestState,
    consume_rest_count: usize,
    previous_token_was_sep: bool,
    consume_rest_stop: Vec<char>,
}

impl Tokenizer {
    pub fn new(input: &str, consume_rest_triggers: HashMap<String, usize>) -> Self {
        let source = input.replace('\r', "").trim().to_string();
        Self {
            input: source.chars().collect(),
            pos: 0,
            line: 0,
            column: 0,
            source,
            consume_rest_triggers,
            consume_rest_state: ConsumeRestState::Off,
            consume_rest_count: 0,
            previous_token_was_sep: true,
            consume_rest_stop: CONSUME_REST_STOP.to_vec(),
        }
    }

    /// When enabled, consume-rest literals run to the end of the input
    /// instead of stopping at statement boundaries.
    pub fn set_consume_rest_all(&mut self, consume_all: bool) {
        if consume_all {
            self.consume_rest_stop.clear();
        } else {
            self.consume_rest_stop = CONSUME_REST_STOP.to_vec();
        }
    }

    /// The normalized source this tokenizer reads from.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn error(&self, kind: TokenizeErrorKind, message: impl Into<String>) -> TokenizeError {
        TokenizeError::new(kind, self.line, self.column, self.source.clone(), message)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn get_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn next_char(&mut self) {
        if let Some(c) = self.get_char() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn accept_eof(&self) -> Option<Token> {
        if self.at_eof() {
            Some(Token::new(TokenType::Eof, "", self.line, self.column))
        } else {
            None
        }
    }

    fn accept_whitespace(&mut self) -> Option<Token> {
        let c = self.get_char()?;
        if WHITESPACE.contains(&c) {
            let tok = Token::new(TokenType::Whitespace, c.to_string(), self.line, self.column);
            self.next_char();
            Some(tok)
        } else {
            None
        }
    }

    fn accept_single_char(&mut self) -> Option<Token> {
        let c = self.get_char()?;
        let token_type = *CHAR_TOKENS.get(&c)?;
        let tok = Token::new(token_type, c.to_string(), self.line, self.column);
        self.next_char();
        Some(tok)
    }

    /// Read a literal until one of `stop_chars` or EOF. Starting at EOF is
    /// an error.
    fn accept_string_literal(&mut self, stop_chars: &[char]) -> Result<Token, TokenizeError> {
        let mut c = match self.get_char() {
            Some(c) => c,
            None => {
                return Err(self.error(
                    TokenizeErrorKind::Eof,
                    "String literal should not start on EOF",
                ))
            }
        };

        let line = self.line;
        let column = self.column;
        let mut chars = String::new();

        while !stop_chars.contains(&c) {
            chars.push(c);
            self.next_char();
            match self.get_char() {
                Some(next) => c = next,
                None => break,
            }
        }

        Ok(Token::new(TokenType::StringLiteral, chars, line, column))
    }

    fn accept_string_literal_normal(&mut self) -> Result<Token, TokenizeError> {
        self.accept_string_literal(&STRING_LITERAL_STOP)
    }

    fn accept_string_literal_consume_rest(&mut self) -> Result<Token, TokenizeError> {
        let stop_chars = self.consume_rest_stop.clone();
        self.accept_string_literal(&stop_chars)
    }

    fn handle_consume_rest(&mut self, tok: &Token) {
        match self.consume_rest_state {
            ConsumeRestState::Off => self.handle_consume_rest_off(tok),
            ConsumeRestState::Counting => self.handle_consume_rest_counting(tok),
            ConsumeRestState::Consume => self.handle_consume_rest_consume(),
        }
    }

    fn handle_consume_rest_off(&mut self, tok: &Token) {
        if matches!(
            tok.token_type,
            TokenType::CommandSep | TokenType::CloseBlock | TokenType::CloseParen
        ) {
            self.previous_token_was_sep = true;
            return;
        }

        // Only a trigger word at the start of a statement arms consume-rest.
        let trigger = if self.previous_token_was_sep && tok.token_type == TokenType::StringLiteral
        {
            self.consume_rest_triggers.get(&tok.value).copied()
        } else {
            None
        };
        self.previous_token_was_sep = false;

        if let Some(count) = trigger {
            if count == 0 {
                self.consume_rest_state = ConsumeRestState::Consume;
            } else {
                self.consume_rest_state = ConsumeRestState::Counting;
                self.consume_rest_count = count;
            }
        }
    }

    fn handle_consume_rest_counting(&mut self, tok: &Token) {
        self.previous_token_was_sep = false;

        if tok.token_type == TokenType::StringLiteral {
            self.consume_rest_count -= 1;
            if self.consume_rest_count == 0 {
                self.consume_rest_state = ConsumeRestState::Consume;
            }
        } else {
            // Any non-literal token cancels consume-rest.
            self.consume_rest_state = ConsumeRestState::Off;
            self.consume_rest_count = 0;
        }
    }

    fn handle_consume_rest_consume(&mut self) {
        // One capture per trigger.
        self.consume_rest_state = ConsumeRestState::Off;
        self.consume_rest_count = 0;
    }

    pub fn next_token(&mut self) -> Result<Token, TokenizeError> {
        if self.consume_rest_state == ConsumeRestState::Consume {
            while self.accept_whitespace().is_some() {}

            let tok = self
                .accept_string_literal_consume_rest()?
                .with_consume_rest(true);
            trace!("tokenize: got token {}", tok);
            self.handle_consume_rest_consume();
            Ok(tok)
        } else {
            loop {
                if let Some(tok) = self.accept_eof() {
                    self.handle_consume_rest(&tok);
                    return Ok(tok);
                }
                if self.accept_whitespace().is_some() {
                    continue;
                }

                let tok = match self.accept_single_char() {
                    Some(tok) => tok,
                    None => self.accept_string_literal_normal()?,
                };
                trace!("tokenize: got token {}", tok);
                self.handle_consume_rest(&tok);
                return Ok(tok);
            }
        }
    }

    /// Tokenize the whole input. The returned stream always ends with a
    /// single EOF token and contains no whitespace tokens.
    pub fn get_all_tokens(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.token_type == TokenType::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }
}
