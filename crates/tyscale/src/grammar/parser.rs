// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recursive-descent parser for the type definition language.

use super::lexer::{Lexer, Token, TokenKind};
use super::{Definition, FieldExpr, TypeExpr, VariantExpr};
use crate::error::ParseError;

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// Bracket nesting; newlines are insignificant while it is non-zero.
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        loop {
            self.current = self.lexer.next_token()?;
            if self.depth == 0 || self.current.kind != TokenKind::Newline {
                return Ok(());
            }
        }
    }

    fn open(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        self.advance()
    }

    fn close(&mut self, expected: TokenKind) -> Result<(), ParseError> {
        if self.current.kind != expected {
            return Err(self.unexpected(&expected.describe()));
        }
        self.depth = self.depth.saturating_sub(1);
        self.advance()
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError::new(self.lexer.source(), token.line, token.column, message)
    }

    fn unexpected(&self, wanted: &str) -> ParseError {
        self.error_at(
            &self.current,
            format!("expected {}, found {}", wanted, self.current.kind.describe()),
        )
    }

    fn at_separator(&self) -> bool {
        matches!(self.current.kind, TokenKind::Newline | TokenKind::Semi)
    }

    fn skip_separators(&mut self) -> Result<(), ParseError> {
        while self.at_separator() {
            self.advance()?;
        }
        Ok(())
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn expect_number(&mut self, what: &str) -> Result<u64, ParseError> {
        match self.current.kind {
            TokenKind::Number(n) => {
                self.advance()?;
                Ok(n)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn parse_definitions(&mut self) -> Result<Vec<Definition>, ParseError> {
        let mut definitions = Vec::new();
        loop {
            self.skip_separators()?;
            if self.current.kind == TokenKind::Eof {
                return Ok(definitions);
            }
            definitions.push(self.parse_definition()?);
            if !self.at_separator() && self.current.kind != TokenKind::Eof {
                return Err(self.unexpected("end of definition"));
            }
        }
    }

    fn parse_definition(&mut self) -> Result<Definition, ParseError> {
        let start = self.current.clone();
        let head = self.parse_type()?;

        if self.current.kind != TokenKind::Equals {
            return Ok(Definition {
                name: None,
                params: Vec::new(),
                body: head,
                line: start.line,
            });
        }

        let (name, args) = match head {
            TypeExpr::Named { name, args } => (name, args),
            _ => {
                return Err(self.error_at(
                    &start,
                    "left side of a definition must be a name",
                ))
            }
        };

        let mut params = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                TypeExpr::Named { name: param, args } if args.is_empty() => {
                    if params.contains(&param) {
                        return Err(self.error_at(
                            &start,
                            format!("duplicate generic parameter `{}`", param),
                        ));
                    }
                    params.push(param);
                }
                other => {
                    return Err(self.error_at(
                        &start,
                        format!("generic parameter `{}` must be a plain identifier", other),
                    ))
                }
            }
        }

        self.advance()?; // consume '='
        while self.current.kind == TokenKind::Newline {
            self.advance()?;
        }
        let body = self.parse_type()?;
        Ok(Definition {
            name: Some(name),
            params,
            body,
            line: start.line,
        })
    }

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Hash => {
                self.advance()?;
                let name = self.expect_ident("primitive name after `#`")?;
                Ok(TypeExpr::Primitive(name))
            }
            TokenKind::At => {
                self.advance()?;
                let inner = self.parse_type()?;
                Ok(TypeExpr::Compact(Box::new(inner)))
            }
            TokenKind::Number(n) => {
                let index = usize::try_from(n)
                    .map_err(|_| self.unexpected("a type index"))?;
                self.advance()?;
                Ok(TypeExpr::Index(index))
            }
            TokenKind::Ident(name) => {
                self.advance()?;
                let mut args = Vec::new();
                if self.current.kind == TokenKind::LAngle {
                    self.open()?;
                    args = self.parse_list(TokenKind::RAngle, false, Self::parse_type)?;
                    if args.is_empty() {
                        return Err(self.error_at(
                            &self.current,
                            format!("`{}<>` needs at least one type argument", name),
                        ));
                    }
                }
                Ok(TypeExpr::Named { name, args })
            }
            TokenKind::LBracket => {
                self.open()?;
                let element = self.parse_type()?;
                if self.current.kind == TokenKind::Semi {
                    self.advance()?;
                    let len = self.expect_number("array length")?;
                    let len = usize::try_from(len)
                        .map_err(|_| self.unexpected("an array length that fits in memory"))?;
                    self.close(TokenKind::RBracket)?;
                    Ok(TypeExpr::Array(Box::new(element), len))
                } else {
                    self.close(TokenKind::RBracket)?;
                    Ok(TypeExpr::Sequence(Box::new(element)))
                }
            }
            TokenKind::LParen => {
                self.open()?;
                let members = self.parse_list(TokenKind::RParen, false, Self::parse_type)?;
                Ok(TypeExpr::Tuple(members))
            }
            TokenKind::LAngle => {
                let opening = self.current.clone();
                self.open()?;
                let variants = self.parse_list(TokenKind::RAngle, true, Self::parse_variant)?;
                if variants.is_empty() {
                    return Err(self.error_at(&opening, "enum must declare at least one variant"));
                }
                Ok(TypeExpr::Enum(variants))
            }
            TokenKind::LBrace => {
                self.open()?;
                let fields = self.parse_list(TokenKind::RBrace, false, Self::parse_field)?;
                Ok(TypeExpr::Struct(fields))
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    /// Items separated by `,` (or `|` when allowed), trailing separator
    /// permitted, up to and including `close`.
    fn parse_list<T>(
        &mut self,
        close: TokenKind,
        allow_pipe: bool,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        while self.current.kind != close {
            if self.current.kind == TokenKind::Eof {
                return Err(self.unexpected(&close.describe()));
            }
            items.push(item(self)?);
            let separator = self.current.kind == TokenKind::Comma
                || (allow_pipe && self.current.kind == TokenKind::Pipe);
            if separator {
                self.advance()?;
            } else if self.current.kind != close {
                return Err(self.unexpected(&format!("`,` or {}", close.describe())));
            }
        }
        self.close(close)?;
        Ok(items)
    }

    fn parse_variant(&mut self) -> Result<VariantExpr, ParseError> {
        let name = self.expect_ident("variant name")?;
        let mut payload = None;
        let mut index = None;

        if self.current.kind == TokenKind::Colon {
            self.advance()?;
            if self.current.kind == TokenKind::Colon {
                // `Name::index`
                self.advance()?;
                index = Some(self.expect_number("variant index")?);
            } else {
                payload = Some(self.parse_type()?);
                if self.current.kind == TokenKind::Colon {
                    self.advance()?;
                    index = Some(self.expect_number("variant index")?);
                }
            }
        }

        Ok(VariantExpr {
            name,
            payload,
            index,
        })
    }

    fn parse_field(&mut self) -> Result<FieldExpr, ParseError> {
        let name = self.expect_ident("field name")?;
        if self.current.kind != TokenKind::Colon {
            return Err(self.unexpected("`:` after field name"));
        }
        self.advance()?;
        let ty = self.parse_type()?;
        Ok(FieldExpr { name, ty })
    }
}

/// Parse DSL text into its top-level definitions, in declaration order.
///
/// Blank lines and `//` comments are ignored. A definition may span several
/// lines as long as a bracket is open.
pub fn parse_definitions(text: &str) -> Result<Vec<Definition>, ParseError> {
    let mut parser = Parser::new(text)?;
    parser.parse_definitions()
}

/// Parse a single type expression such as `Info<Option<u32>>` or `[u8;32]`.
pub fn parse_type_expr(text: &str) -> Result<TypeExpr, ParseError> {
    let mut parser = Parser::new(text)?;
    parser.skip_separators()?;
    let expr = parser.parse_type()?;
    parser.skip_separators()?;
    if parser.current.kind != TokenKind::Eof {
        return Err(parser.unexpected("end of type expression"));
    }
    Ok(expr)
}
