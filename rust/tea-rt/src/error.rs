//! Runtime error taxonomy (spec.md §7).
//!
//! Every variant carries the 1-based source line of the node that raised it.
//! `CastError` is also exposed standalone from [`crate::value`] since the
//! value/type system's `cast` contract is defined independently of any
//! particular evaluation site; [`RuntimeError::CastError`] wraps it with the
//! line at which the cast was requested.

use crate::value::CastError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("line {line}: {message}")]
    NamespaceError { line: usize, message: String },

    #[error("line {line}: {cause}")]
    CastError { line: usize, cause: CastError },

    #[error("line {line}: {message}")]
    AssignmentError { line: usize, message: String },

    #[error("line {line}: {message}")]
    ArgumentError { line: usize, message: String },

    #[error("line {line}: {message}")]
    ArgumentCastError { line: usize, message: String },

    #[error("line {line}: {message}")]
    FunctionError { line: usize, message: String },

    #[error("line {line}: {message}")]
    OperatorError { line: usize, message: String },

    /// Catch-all for the errors spec.md §7 leaves unnamed: "Bad conditional",
    /// division by zero, equality across incompatible types.
    #[error("line {line}: {message}")]
    RuntimeError { line: usize, message: String },
}

impl RuntimeError {
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::NamespaceError { line, .. }
            | RuntimeError::CastError { line, .. }
            | RuntimeError::AssignmentError { line, .. }
            | RuntimeError::ArgumentError { line, .. }
            | RuntimeError::ArgumentCastError { line, .. }
            | RuntimeError::FunctionError { line, .. }
            | RuntimeError::OperatorError { line, .. }
            | RuntimeError::RuntimeError { line, .. } => *line,
        }
    }
}
