use thiserror::Error;

use crate::asm::{AsmError, Label};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error(transparent)]
    Asm(#[from] AsmError),
    #[error("Label {label} is defined more than once")]
    DuplicateLabel { label: Label },
    #[error("Jump to undefined label {label}")]
    UndefinedLabel { label: Label },
    #[error("Stack underflow at instruction {ip}")]
    StackUnderflow { ip: usize },
    #[error("Division by zero at instruction {ip}")]
    DivisionByZero { ip: usize },
    #[error("Invalid memory address {address} at instruction {ip}")]
    InvalidAddress { address: i64, ip: usize },
    #[error("Step limit of {limit} exceeded")]
    StepLimitExceeded { limit: usize },
}

pub type VmResult<T> = Result<T, VmError>;
