use ssa_core::SpeciesId;
use ssa_expr::EvalError;
use ssa_species::SpeciesError;
use thiserror::Error;

use crate::Role;

#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("reaction `{reaction}`: {species} already registered as {existing}, cannot add it as {requested}")]
    RoleConflict {
        reaction:  String,
        species:   SpeciesId,
        existing:  Role,
        requested: Role,
    },

    #[error("reaction `{reaction}`: stoichiometry of {species} must be positive")]
    ZeroStoichiometry { reaction: String, species: SpeciesId },

    #[error("reaction `{reaction}`: invalid parameter: {message}")]
    InvalidParameter { reaction: String, message: String },

    #[error(transparent)]
    Species(#[from] SpeciesError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type ReactionResult<T> = Result<T, ReactionError>;
