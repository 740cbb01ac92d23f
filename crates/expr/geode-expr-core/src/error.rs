//! Errors raised while building, parsing or evaluating expressions.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// A call node was built with the wrong number of arguments.
    #[error("function '{function}' takes {expected} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// A variable had no value in the binding context at evaluation time.
    #[error("unbound variable '{0}'")]
    UnboundVariable(String),
    #[error("parse error at {position}: {message}")]
    Parse { position: usize, message: String },
    #[error("expression nesting exceeds limit of {limit}")]
    TooDeep { limit: usize },
}

impl ExprError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        ExprError::Parse {
            position,
            message: message.into(),
        }
    }
}
