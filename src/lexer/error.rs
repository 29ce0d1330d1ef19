use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unknown token '{lexeme}' at position {position}")]
    UnknownToken { lexeme: String, position: usize },
    #[error("Invalid integer literal '{literal}' at position {position}")]
    InvalidIntegerLiteral { literal: String, position: usize },
    #[error("Expected '=' after ':' at position {position}")]
    MalformedAssign { position: usize },
}

pub type LexResult<T> = Result<T, LexError>;
