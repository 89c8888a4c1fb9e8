//! Filter-crate-local error type. `compile()` turns [`CompileError`] into a
//! `librarian_core::LibraryError::Compilation`; evaluation errors stay as
//! [`EvalError`] until the evaluator attaches a record id and converts them
//! to `LibraryError::Evaluation`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("expression does not evaluate to a boolean")]
    NotBoolean,
    #[error("empty expression")]
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown identifier: {0}")]
    UnknownIdent(String),
    #[error("unknown helper function: {0}")]
    UnknownHelper(String),
    #[error("wrong argument count for {name}: expected {expected}, got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("type error: {0}")]
    TypeError(String),
    #[error("expression did not evaluate to a boolean")]
    NotBoolean,
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(String),
}
