use ssa_core::CoreError;
use ssa_expr::EvalError;
use ssa_reaction::ReactionError;
use ssa_species::SpeciesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Species(#[from] SpeciesError),

    #[error(transparent)]
    Reaction(#[from] ReactionError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("no stochastic reaction selected for target {target} of total propensity {total}")]
    Selection { target: f64, total: f64 },
}

pub type SimResult<T> = Result<T, SimError>;
