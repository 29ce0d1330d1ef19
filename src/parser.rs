//! Statement parser plus an expression splitter driven by the operator table.
//!
//! Expressions are parsed by finding the loosest-binding operator outside
//! parentheses and recursing on both sides of it.

use rustc_hash::FxHashMap;

use crate::ast::Node;
use crate::token::{OperatorTable, Token, TokenType};

mod error;

pub use error::{ParseError, ParseResult};

/// Deepest combined block and sub-expression nesting the parser accepts.
/// The compiler recurses once per level, so this also bounds its stack use.
pub const MAX_NESTING: usize = 128;

/// A parsed program. Variable and function names are interned to ids in
/// order of first appearance; `names[id]` is the source spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub root: Option<Node>,
    pub names: Vec<String>,
}

pub struct Parser<'a, 't> {
    tokens: Vec<Token<'a>>,
    position: usize,
    table: &'t OperatorTable,
    ids: FxHashMap<&'a str, i64>,
    names: Vec<String>,
    depth: usize,
}

impl<'a, 't> Parser<'a, 't> {
    pub fn new(tokens: Vec<Token<'a>>, table: &'t OperatorTable) -> Self {
        Self {
            tokens,
            position: 0,
            table,
            ids: FxHashMap::default(),
            names: Vec::new(),
            depth: 0,
        }
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        while self.position < self.tokens.len() {
            if let Some(statement) = self.parse_statement()? {
                statements.push(statement);
            }
        }
        Ok(Program {
            root: Node::sequence(statements),
            names: self.names,
        })
    }

    fn parse_statement(&mut self) -> ParseResult<Option<Node>> {
        let kind = self.current_kind("statement")?;
        let statement = match kind {
            TokenType::EndInstr => {
                self.advance();
                return Ok(None);
            }
            TokenType::DeclVar => {
                self.advance();
                let id = self.expect_name()?;
                self.expect(TokenType::EndInstr, "';'")?;
                Node::declare(id)
            }
            TokenType::Print => {
                self.advance();
                let expr = self.parse_parenthesized()?;
                self.expect(TokenType::EndInstr, "';'")?;
                Node::print(expr)
            }
            TokenType::If => {
                self.advance();
                let condition = self.parse_parenthesized()?;
                let then_body = self.parse_block()?;
                let else_body = if self.check(TokenType::Else) {
                    self.advance();
                    self.parse_block()?
                } else {
                    None
                };
                Node::if_else(condition, then_body, else_body)
            }
            TokenType::While => {
                self.advance();
                let condition = self.parse_parenthesized()?;
                let body = self.parse_block()?;
                Node::while_loop(condition, body)
            }
            TokenType::Def => {
                self.advance();
                let id = self.expect_name()?;
                let body = self.parse_block()?;
                Node::def(id, body)
            }
            TokenType::Nop => {
                self.advance();
                self.expect(TokenType::EndInstr, "';'")?;
                Node::new(TokenType::Nop)
            }
            _ => {
                let end = self.statement_end();
                let expr = self.parse_range(self.position, end)?;
                self.position = end;
                self.expect(TokenType::EndInstr, "';'")?;
                Node::statement(expr)
            }
        };
        Ok(Some(statement))
    }

    fn parse_block(&mut self) -> ParseResult<Option<Node>> {
        self.enter(self.position)?;
        let block = self.parse_block_body();
        self.depth -= 1;
        block
    }

    fn parse_block_body(&mut self) -> ParseResult<Option<Node>> {
        self.expect(TokenType::OpenBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(TokenType::CloseBrace) {
            if let Some(statement) = self.parse_statement()? {
                statements.push(statement);
            }
        }
        self.expect(TokenType::CloseBrace, "'}'")?;
        Ok(Node::sequence(statements))
    }

    /// `( expr )`, leaving the cursor after the closing parenthesis.
    fn parse_parenthesized(&mut self) -> ParseResult<Node> {
        let open = self.position;
        self.expect(TokenType::OpenPar, "'('")?;
        let close = self.matching_close(open, self.tokens.len())?;
        let expr = self.parse_range(open + 1, close)?;
        self.position = close + 1;
        Ok(expr)
    }

    /// First `;`, `{` or `}` outside parentheses, or the end of input.
    fn statement_end(&self) -> usize {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(self.position) {
            match token.kind {
                TokenType::OpenPar => depth += 1,
                TokenType::ClosePar => depth = depth.saturating_sub(1),
                TokenType::EndInstr | TokenType::OpenBrace | TokenType::CloseBrace
                    if depth == 0 =>
                {
                    return index;
                }
                _ => {}
            }
        }
        self.tokens.len()
    }

    fn parse_range(&mut self, start: usize, end: usize) -> ParseResult<Node> {
        self.enter(start)?;
        let node = self.parse_range_body(start, end);
        self.depth -= 1;
        node
    }

    fn parse_range_body(&mut self, start: usize, end: usize) -> ParseResult<Node> {
        if start >= end {
            return Err(ParseError::EmptyExpression {
                position: self.offset_at(start),
            });
        }

        if self.tokens[start].kind == TokenType::OpenPar
            && self.matching_close(start, end)? == end - 1
        {
            return self.parse_range(start + 1, end - 1);
        }

        if let Some(split) = self.split_point(start, end)? {
            let kind = self.tokens[split].kind;
            if kind == TokenType::Assign {
                let target = self.tokens[start].clone();
                if split != start + 1 || target.kind != TokenType::Name {
                    return Err(ParseError::InvalidAssignTarget {
                        position: target.span.start,
                    });
                }
                let id = self.intern(target.text);
                let value = self.parse_range(split + 1, end)?;
                return Ok(Node::assign(id, value));
            }
            let left = self.parse_range(start, split)?;
            let right = self.parse_range(split + 1, end)?;
            return Ok(Node::binary(kind, left, right));
        }

        if end - start > 1 {
            let extra = &self.tokens[start + 1];
            return Err(ParseError::UnexpectedToken {
                expected: "operator",
                found: extra.text.to_string(),
                position: extra.span.start,
            });
        }
        let token = self.tokens[start].clone();
        match token.kind {
            TokenType::Const => Ok(Node::constant(token.value.unwrap_or_default())),
            TokenType::Name => {
                let id = self.intern(token.text);
                Ok(Node::name(id))
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "value",
                found: token.text.to_string(),
                position: token.span.start,
            }),
        }
    }

    /// Index of the operator the range splits at: the lowest precedence at
    /// depth 0, rightmost for left-associative operators and leftmost for
    /// right-associative ones.
    fn split_point(&self, start: usize, end: usize) -> ParseResult<Option<usize>> {
        let mut depth = 0usize;
        let mut best: Option<(usize, i32)> = None;
        for index in start..end {
            let token = &self.tokens[index];
            match token.kind {
                TokenType::OpenPar => depth += 1,
                TokenType::ClosePar => {
                    depth = depth.checked_sub(1).ok_or_else(|| ParseError::UnexpectedToken {
                        expected: "expression",
                        found: token.text.to_string(),
                        position: token.span.start,
                    })?;
                }
                kind if depth == 0 && kind.is_binary_operator() => {
                    let Some(priority) = self.table.precedence(kind) else {
                        continue;
                    };
                    let replace = match best {
                        None => true,
                        Some((_, best_priority)) if priority < best_priority => true,
                        Some((_, best_priority)) => {
                            priority == best_priority && !self.table.is_right_associative(kind)
                        }
                    };
                    if replace {
                        best = Some((index, priority));
                    }
                }
                _ => {}
            }
        }
        Ok(best.map(|(index, _)| index))
    }

    fn matching_close(&self, open: usize, end: usize) -> ParseResult<usize> {
        let mut depth = 0usize;
        for index in open..end {
            match self.tokens[index].kind {
                TokenType::OpenPar => depth += 1,
                TokenType::ClosePar => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(index);
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::UnexpectedEnd { expected: "')'" })
    }

    fn enter(&mut self, index: usize) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING,
                position: self.offset_at(index),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn intern(&mut self, name: &'a str) -> i64 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as i64;
        self.ids.insert(name, id);
        self.names.push(name.to_string());
        id
    }

    fn expect_name(&mut self) -> ParseResult<i64> {
        let token = self.expect(TokenType::Name, "name")?;
        Ok(self.intern(token.text))
    }

    fn expect(&mut self, kind: TokenType, expected: &'static str) -> ParseResult<Token<'a>> {
        match self.tokens.get(self.position) {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.advance();
                Ok(token)
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                expected,
                found: token.text.to_string(),
                position: token.span.start,
            }),
            None => Err(ParseError::UnexpectedEnd { expected }),
        }
    }

    fn check(&self, kind: TokenType) -> bool {
        self.tokens
            .get(self.position)
            .is_some_and(|token| token.kind == kind)
    }

    fn current_kind(&self, expected: &'static str) -> ParseResult<TokenType> {
        self.tokens
            .get(self.position)
            .map(|token| token.kind)
            .ok_or(ParseError::UnexpectedEnd { expected })
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn offset_at(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .or_else(|| self.tokens.last())
            .map(|token| token.span.start)
            .unwrap_or_default()
    }
}

pub fn parse_tokens(tokens: Vec<Token<'_>>, table: &OperatorTable) -> ParseResult<Program> {
    Parser::new(tokens, table).parse_program()
}
