use thiserror::Error;

/// Failures raised while binding or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("expression parse error in `{source_text}`: {message}")]
    Parse { source_text: String, message: String },

    #[error("unbound variable `{0}`")]
    UnboundVariable(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("function `{name}` expects {expected} argument(s), got {got}")]
    Arity { name: String, expected: usize, got: usize },

    #[error("domain error: `{0}` evaluated to a non-finite value")]
    Domain(String),

    #[error("evaluation failed: {0}")]
    Failed(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
