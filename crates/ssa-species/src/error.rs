use ssa_expr::EvalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeciesError {
    #[error("species `{species}`: cannot remove {requested} unit(s), only {available} present")]
    BufferUnderflow {
        species:   String,
        requested: u64,
        available: u64,
    },

    #[error("branch node `{0}`: a branch node's count must never be decreased")]
    Routing(String),

    #[error("species `{species}` is not an individual pool")]
    NotAPool { species: String },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type SpeciesResult<T> = Result<T, SpeciesError>;
