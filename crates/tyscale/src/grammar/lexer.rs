// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DSL tokenizer.

use crate::error::ParseError;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(u64),
    Hash,
    At,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LAngle,
    RAngle,
    LBrace,
    RBrace,
    Semi,
    Comma,
    Colon,
    Equals,
    Pipe,
    Newline,
    Eof,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{}`", name),
            Self::Number(n) => format!("number `{}`", n),
            Self::Newline => "end of line".to_string(),
            Self::Eof => "end of input".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::Hash => "#",
            Self::At => "@",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LAngle => "<",
            Self::RAngle => ">",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Semi => ";",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Equals => "=",
            Self::Pipe => "|",
            _ => "",
        }
    }
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub(crate) fn source(&self) -> &'a str {
        self.input
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Skip spaces, tabs, carriage returns and `//` comments, but not newlines.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            if ch.is_whitespace() {
                self.next_char();
            } else if ch == '/' && self.peek_second() == Some('/') {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.next_char();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.next_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn read_number(&mut self, line: usize, column: usize) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.next_char();
            } else {
                break;
            }
        }
        if self
            .peek_char()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            return Err(self.error(line, column, "malformed number literal"));
        }
        let text = &self.input[start..self.pos];
        text.parse::<u64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(line, column, format!("number `{}` is too large", text)))
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.input, line, column, message)
    }

    pub(crate) fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();

        let (line, column) = (self.line, self.column);
        let ch = match self.peek_char() {
            Some(c) => c,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    line,
                    column,
                })
            }
        };

        let kind = if ch.is_ascii_digit() {
            self.read_number(line, column)?
        } else if ch.is_alphabetic() || ch == '_' {
            TokenKind::Ident(self.read_identifier())
        } else {
            let kind = match ch {
                '\n' => TokenKind::Newline,
                '#' => TokenKind::Hash,
                '@' => TokenKind::At,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '<' => TokenKind::LAngle,
                '>' => TokenKind::RAngle,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                ';' => TokenKind::Semi,
                ',' => TokenKind::Comma,
                ':' => TokenKind::Colon,
                '=' => TokenKind::Equals,
                '|' => TokenKind::Pipe,
                other => {
                    return Err(self.error(
                        line,
                        column,
                        format!("unexpected character '{}'", other),
                    ))
                }
            };
            self.next_char();
            kind
        };

        Ok(Token { kind, line, column })
    }
}
