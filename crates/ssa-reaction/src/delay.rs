//! `DelayReaction` — fires a fixed time after the oldest unit of a pool was
//! created.

use ssa_core::SpeciesId;
use ssa_expr::NamedVar;
use ssa_species::{FireContext, SpeciesArena, Term};

use crate::reaction::push_term;
use crate::{ReactionError, ReactionResult};

#[derive(Debug, Clone)]
pub struct DelayReaction {
    name:       String,
    pool:       SpeciesId,
    delay:      f64,
    products:   Vec<Term>,
    forward_as: Option<String>,
}

impl DelayReaction {
    pub fn new(name: impl Into<String>, pool: SpeciesId, delay: f64) -> ReactionResult<Self> {
        let name = name.into();
        if !delay.is_finite() || delay < 0.0 {
            return Err(ReactionError::InvalidParameter {
                reaction: name,
                message:  format!("delay must be finite and non-negative, got {delay}"),
            });
        }
        Ok(Self {
            name,
            pool,
            delay,
            products: Vec::new(),
            forward_as: None,
        })
    }

    /// Pass the removed unit's modification counter to the products as the
    /// named variable `name`.
    pub fn forward_modifications_as(mut self, name: impl Into<String>) -> Self {
        self.forward_as = Some(name.into());
        self
    }

    pub fn add_product(&mut self, species: SpeciesId, stoich: u64) -> ReactionResult<()> {
        push_term(&mut self.products, &self.name, species, stoich)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> SpeciesId {
        self.pool
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn products(&self) -> &[Term] {
        &self.products
    }

    /// `oldest.created_at + delay`, or `+∞` for an empty pool.
    pub fn next_fire_time(&self, species: &SpeciesArena) -> f64 {
        species
            .peek_first(self.pool)
            .map_or(f64::INFINITY, |unit| unit.created_at + self.delay)
    }

    /// Pop the oldest unit, then add the products.
    pub fn fire(&self, species: &mut SpeciesArena, ctx: &mut FireContext<'_>) -> ReactionResult<()> {
        let unit = species.take_first(self.pool, ctx)?;
        let vars: Vec<NamedVar> = self
            .forward_as
            .iter()
            .map(|name| (name.clone(), unit.modifications as f64))
            .collect();
        for term in &self.products {
            species.add(term.species, term.stoich, &vars, ctx)?;
        }
        Ok(())
    }
}
