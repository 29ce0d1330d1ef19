use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected {expected}, got '{found}' at position {position}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        position: usize,
    },
    #[error("Expected {expected}, got end of input")]
    UnexpectedEnd { expected: &'static str },
    #[error("Missing operand at position {position}")]
    EmptyExpression { position: usize },
    #[error("Left side of ':=' must be a variable name at position {position}")]
    InvalidAssignTarget { position: usize },
    #[error("Nesting deeper than {limit} levels at position {position}")]
    NestingTooDeep { limit: usize, position: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;
