use thiserror::Error;

use crate::token::TokenType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Token {kind:?} cannot be compiled")]
    UnknownToken { kind: TokenType },
    #[error("Undeclared variable with id {id}")]
    UndeclaredVariable { id: i64 },
    #[error("Malformed {kind:?} node: {reason}")]
    MalformedTree {
        kind: TokenType,
        reason: &'static str,
    },
}

pub type CompileResult<T> = Result<T, CompileError>;
