//! The closed set of reaction kinds the simulation loop dispatches on.

use ssa_core::{SimRng, SpeciesId};
use ssa_expr::NameResolver;
use ssa_species::{FireContext, SpeciesArena, Term};

use crate::{DelayReaction, ReactionError, ReactionResult, StochasticReaction, TimerReaction};

#[derive(Debug, Clone)]
pub enum Reaction {
    Stochastic(StochasticReaction),
    Delay(DelayReaction),
    Timer(TimerReaction),
}

impl Reaction {
    pub fn name(&self) -> &str {
        match self {
            Reaction::Stochastic(r) => r.name(),
            Reaction::Delay(r) => r.name(),
            Reaction::Timer(r) => r.name(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reaction::Stochastic(_) => "stochastic",
            Reaction::Delay(_) => "delay",
            Reaction::Timer(_) => "timer",
        }
    }

    /// `true` for reactions with a deterministic next-fire time.
    pub fn is_scheduled(&self) -> bool {
        !matches!(self, Reaction::Stochastic(_))
    }

    /// Reset per-run state and bind rate expressions.
    pub fn initialize(&mut self, resolver: &dyn NameResolver) -> ReactionResult<()> {
        match self {
            Reaction::Stochastic(r) => r.bind(resolver)?,
            Reaction::Delay(_) => {}
            Reaction::Timer(r) => r.initialize(),
        }
        Ok(())
    }

    /// Drop rate bindings.  Timers keep `has_fired` until the next run.
    pub fn uninitialize(&mut self) {
        if let Reaction::Stochastic(r) = self {
            r.unbind();
        }
    }

    /// Propensity; always 0 for scheduled reactions.
    pub fn propensity(&self, species: &SpeciesArena, time: f64, rng: &mut SimRng) -> ReactionResult<f64> {
        match self {
            Reaction::Stochastic(r) => Ok(r.compute_rate(species, time, rng)?),
            Reaction::Delay(_) | Reaction::Timer(_) => Ok(0.0),
        }
    }

    /// Next deterministic fire time; `+∞` for stochastic reactions.
    pub fn next_fire_time(&self, species: &SpeciesArena) -> f64 {
        match self {
            Reaction::Stochastic(_) => f64::INFINITY,
            Reaction::Delay(r) => r.next_fire_time(species),
            Reaction::Timer(r) => r.next_fire_time(),
        }
    }

    pub fn fire(&mut self, species: &mut SpeciesArena, ctx: &mut FireContext<'_>) -> ReactionResult<()> {
        match self {
            Reaction::Stochastic(r) => r.fire(species, ctx),
            Reaction::Delay(r) => r.fire(species, ctx),
            Reaction::Timer(r) => r.fire(species, ctx),
        }
    }
}

/// Append a product term, summing stoichiometries of repeated species.
pub(crate) fn push_term(
    products: &mut Vec<Term>,
    reaction: &str,
    species:  SpeciesId,
    stoich:   u64,
) -> ReactionResult<()> {
    if stoich == 0 {
        return Err(ReactionError::ZeroStoichiometry {
            reaction: reaction.to_owned(),
            species,
        });
    }
    match products.iter_mut().find(|t| t.species == species) {
        Some(term) => term.stoich += stoich,
        None => products.push(Term::new(species, stoich)),
    }
    Ok(())
}
