//! `TimerReaction` — fires once per run at a preset absolute time.

use ssa_core::SpeciesId;
use ssa_species::{FireContext, SpeciesArena, Term};

use crate::reaction::push_term;
use crate::{ReactionError, ReactionResult};

#[derive(Debug, Clone)]
pub struct TimerReaction {
    name:      String,
    fire_time: f64,
    products:  Vec<Term>,
    has_fired: bool,
}

impl TimerReaction {
    pub fn new(name: impl Into<String>, fire_time: f64) -> ReactionResult<Self> {
        let name = name.into();
        if !fire_time.is_finite() || fire_time < 0.0 {
            return Err(ReactionError::InvalidParameter {
                reaction: name,
                message:  format!("fire time must be finite and non-negative, got {fire_time}"),
            });
        }
        Ok(Self {
            name,
            fire_time,
            products: Vec::new(),
            has_fired: false,
        })
    }

    pub fn add_product(&mut self, species: SpeciesId, stoich: u64) -> ReactionResult<()> {
        push_term(&mut self.products, &self.name, species, stoich)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fire_time(&self) -> f64 {
        self.fire_time
    }

    pub fn has_fired(&self) -> bool {
        self.has_fired
    }

    pub fn products(&self) -> &[Term] {
        &self.products
    }

    pub fn initialize(&mut self) {
        self.has_fired = false;
    }

    pub fn next_fire_time(&self) -> f64 {
        if self.has_fired { f64::INFINITY } else { self.fire_time }
    }

    pub fn fire(&mut self, species: &mut SpeciesArena, ctx: &mut FireContext<'_>) -> ReactionResult<()> {
        self.has_fired = true;
        for term in &self.products {
            species.add(term.species, term.stoich, &[], ctx)?;
        }
        Ok(())
    }
}
