use std::{iter::Peekable, str::CharIndices};

use crate::token::{OperatorTable, Span, Token, TokenType};

mod error;

pub use error::{LexError, LexResult};

const SYMBOLS: &str = "+-*/%&|^<=(){};";

pub struct Lexer<'a, 't> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    table: &'t OperatorTable,
}

impl<'a, 't> Lexer<'a, 't> {
    pub fn new(input: &'a str, table: &'t OperatorTable) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            table,
        }
    }

    /// Returns `Ok(None)` once the input is exhausted.
    pub fn next_token(&mut self) -> LexResult<Option<Token<'a>>> {
        self.skip_whitespace();

        let Some(&(start, ch)) = self.chars.peek() else {
            return Ok(None);
        };

        match ch {
            ':' => self.read_assign(start).map(Some),
            c if SYMBOLS.contains(c) => {
                self.chars.next();
                let lexeme = &self.input[start..start + 1];
                let kind = self.lookup(lexeme, start)?;
                Ok(Some(Token::new(
                    kind,
                    lexeme,
                    Span {
                        start,
                        end: start + 1,
                    },
                )))
            }
            c if c.is_ascii_lowercase() || c == '_' => self.read_word(start).map(Some),
            c if c.is_ascii_digit() => self.read_integer(start).map(Some),
            _ => Err(LexError::UnknownToken {
                lexeme: ch.to_string(),
                position: start,
            }),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn read_assign(&mut self, start: usize) -> LexResult<Token<'a>> {
        self.chars.next(); // ':'
        match self.chars.peek() {
            Some(&(_, '=')) => {
                self.chars.next();
                let lexeme = &self.input[start..start + 2];
                let kind = self.lookup(lexeme, start)?;
                Ok(Token::new(
                    kind,
                    lexeme,
                    Span {
                        start,
                        end: start + 2,
                    },
                ))
            }
            _ => Err(LexError::MalformedAssign { position: start }),
        }
    }

    fn read_word(&mut self, start: usize) -> LexResult<Token<'a>> {
        let end =
            self.consume_while(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        let word = &self.input[start..end];
        let span = Span { start, end };
        let kind = self.table.lookup(word).unwrap_or(TokenType::Name);
        Ok(Token::new(kind, word, span))
    }

    fn read_integer(&mut self, start: usize) -> LexResult<Token<'a>> {
        let end = self.consume_while(|c| c.is_ascii_digit());
        let literal = &self.input[start..end];
        let value = literal
            .parse::<i64>()
            .map_err(|_| LexError::InvalidIntegerLiteral {
                literal: literal.to_string(),
                position: start,
            })?;
        Ok(Token::constant(value, literal, Span { start, end }))
    }

    fn consume_while(&mut self, accept: impl Fn(char) -> bool) -> usize {
        while let Some(&(idx, c)) = self.chars.peek() {
            if accept(c) {
                self.chars.next();
            } else {
                return idx;
            }
        }
        self.input.len()
    }

    fn lookup(&self, lexeme: &str, position: usize) -> LexResult<TokenType> {
        self.table
            .lookup(lexeme)
            .ok_or_else(|| LexError::UnknownToken {
                lexeme: lexeme.to_string(),
                position,
            })
    }
}

impl<'a> Iterator for Lexer<'a, '_> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

pub fn tokenize<'a>(input: &'a str, table: &OperatorTable) -> LexResult<Vec<Token<'a>>> {
    let tokens = Lexer::new(input, table).collect::<LexResult<Vec<_>>>()?;
    Ok(insert_implicit_multiplication(tokens))
}

/// `2x` reads as `2 * x` and `3(x)` / `x(y)` as a product.
fn insert_implicit_multiplication(tokens: Vec<Token<'_>>) -> Vec<Token<'_>> {
    let mut normalized: Vec<Token<'_>> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(prev) = normalized.last() {
            let implicit = match (prev.kind, token.kind) {
                (TokenType::Const | TokenType::Name, TokenType::OpenPar) => true,
                (TokenType::Const, TokenType::Name) => true,
                _ => false,
            };
            if implicit {
                let at = token.span.start;
                normalized.push(Token::new(
                    TokenType::Mult,
                    "*",
                    Span { start: at, end: at },
                ));
            }
        }
        normalized.push(token);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(input: &str) -> Vec<TokenType> {
        tokenize(input, &OperatorTable::new())
            .expect("tokenize should succeed")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_simple_program() {
        let input = indoc! {"
            var a;
            a := 1;
            while (a < 10) {
                print(a);
                a := a + 1;
            }
        "};
        let expected = vec![
            TokenType::DeclVar,
            TokenType::Name,
            TokenType::EndInstr,
            TokenType::Name,
            TokenType::Assign,
            TokenType::Const,
            TokenType::EndInstr,
            TokenType::While,
            TokenType::OpenPar,
            TokenType::Name,
            TokenType::Less,
            TokenType::Const,
            TokenType::ClosePar,
            TokenType::OpenBrace,
            TokenType::Print,
            TokenType::OpenPar,
            TokenType::Name,
            TokenType::ClosePar,
            TokenType::EndInstr,
            TokenType::Name,
            TokenType::Assign,
            TokenType::Name,
            TokenType::Plus,
            TokenType::Const,
            TokenType::EndInstr,
            TokenType::CloseBrace,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn keeps_literal_values_and_names() {
        let table = OperatorTable::new();
        let tokens = tokenize("counter := 42;", &table).expect("tokenize");
        assert_eq!(tokens[0].text, "counter");
        assert_eq!(tokens[1].span, Span { start: 8, end: 10 });
        assert_eq!(tokens[2].value, Some(42));
    }

    #[test]
    fn inserts_implicit_multiplication() {
        assert_eq!(
            kinds("2x + 3(x)"),
            vec![
                TokenType::Const,
                TokenType::Mult,
                TokenType::Name,
                TokenType::Plus,
                TokenType::Const,
                TokenType::Mult,
                TokenType::OpenPar,
                TokenType::Name,
                TokenType::ClosePar,
            ]
        );
        // `print(` is a keyword call, not a product
        assert_eq!(kinds("print(1)")[1], TokenType::OpenPar);
    }

    #[test]
    fn names_are_lowercase() {
        let table = OperatorTable::new();
        let tokens = tokenize("snake_case_2 := 1;", &table).expect("tokenize");
        assert_eq!(tokens[0].text, "snake_case_2");

        assert_eq!(
            tokenize("var Count;", &table).expect_err("uppercase start"),
            LexError::UnknownToken {
                lexeme: "C".to_string(),
                position: 4,
            }
        );
        assert_eq!(
            tokenize("var countX;", &table).expect_err("uppercase inside"),
            LexError::UnknownToken {
                lexeme: "X".to_string(),
                position: 9,
            }
        );
    }

    #[test]
    fn errors_on_invalid_character() {
        let err = tokenize("x := 1 @ 2;", &OperatorTable::new()).expect_err("expected failure");
        assert_eq!(
            err,
            LexError::UnknownToken {
                lexeme: "@".to_string(),
                position: 7,
            }
        );
    }

    #[test]
    fn errors_on_lone_colon() {
        let err = tokenize("x : 1;", &OperatorTable::new()).expect_err("expected failure");
        assert!(err.to_string().contains("Expected '=' after ':'"));
    }

    #[test]
    fn errors_on_integer_overflow() {
        let err = tokenize("n := 99999999999999999999999999;", &OperatorTable::new())
            .expect_err("expected overflow");
        assert!(err.to_string().contains("Invalid integer literal"));
    }
}
