pub mod asm;
pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod vm;

use thiserror::Error;

use crate::asm::Assembly;
use crate::token::OperatorTable;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] lexer::LexError),
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
    #[error(transparent)]
    Compile(#[from] compiler::CompileError),
}

/// Lexes, parses and compiles `source` with a fresh operator table.
pub fn compile_source(source: &str) -> Result<Assembly, Error> {
    compile_source_with(source, &OperatorTable::new())
}

pub fn compile_source_with(source: &str, table: &OperatorTable) -> Result<Assembly, Error> {
    let tokens = lexer::tokenize(source, table)?;
    let program = parser::parse_tokens(tokens, table)?;
    match program.root {
        Some(root) => Ok(compiler::compile(&root)?),
        None => Ok(Assembly::new()),
    }
}
