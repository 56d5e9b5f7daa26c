//! `BranchNode` — a zero-count pseudo-species that routes each unit added
//! to it into one of two product sets.
//!
//! The routing itself needs mutable access to the target species, so it is
//! driven by [`SpeciesArena::add`](crate::SpeciesArena::add); this type only
//! holds the condition, the two product sets and the persistent named-variable
//! table.

use std::collections::HashMap;

use ssa_core::{SimRng, SpeciesId};
use ssa_expr::{EvalContext, EvalResult, Expression, NamedVar, SpeciesCounts, SymbolTable};

use crate::{SpeciesError, SpeciesResult, Term};

#[derive(Debug, Clone)]
pub struct BranchNode {
    name:      String,
    condition: Box<dyn Expression>,
    on_true:   Vec<Term>,
    on_false:  Vec<Term>,
    slots:     Vec<NamedVar>,
}

impl BranchNode {
    pub fn new(
        name:      impl Into<String>,
        condition: Box<dyn Expression>,
        on_true:   Vec<Term>,
        on_false:  Vec<Term>,
    ) -> Self {
        Self {
            name: name.into(),
            condition,
            on_true,
            on_false,
            slots: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Always 0: units pass straight through.
    #[inline]
    pub fn count(&self) -> u64 {
        0
    }

    pub fn on_true(&self) -> &[Term] {
        &self.on_true
    }

    pub fn on_false(&self) -> &[Term] {
        &self.on_false
    }

    /// Named variables seen so far this run, in first-seen order.
    pub fn slots(&self) -> &[NamedVar] {
        &self.slots
    }

    /// Always fails.
    pub fn remove(&self, _n: u64) -> SpeciesResult<()> {
        Err(SpeciesError::Routing(self.name.clone()))
    }

    #[inline]
    pub fn transform(&mut self, _n: u64) {}

    /// Forget the slot table and bind the condition against species names.
    pub fn initialize(&mut self, species: &HashMap<String, SpeciesId>) -> EvalResult<()> {
        self.slots.clear();
        self.condition.bind(&SymbolTable::new(species, &self.slots))
    }

    /// Drop this run's slot table and the condition's bindings.
    pub fn uninitialize(&mut self) {
        self.slots.clear();
        self.condition.unbind();
    }

    /// Overwrite known slots with `vars`, append unknown ones, and re-bind
    /// the condition if any name was new.
    pub fn merge_vars(
        &mut self,
        vars:    &[NamedVar],
        species: &HashMap<String, SpeciesId>,
    ) -> EvalResult<()> {
        let mut grew = false;
        for (name, value) in vars {
            match self.slots.iter_mut().find(|(slot, _)| slot == name) {
                Some(slot) => slot.1 = *value,
                None => {
                    self.slots.push((name.clone(), *value));
                    grew = true;
                }
            }
        }
        if grew {
            self.condition.bind(&SymbolTable::new(species, &self.slots))?;
        }
        Ok(())
    }

    /// Evaluate the condition once.  Non-zero routes to the true branch.
    pub fn decide(
        &self,
        time:   f64,
        counts: &dyn SpeciesCounts,
        rng:    &mut SimRng,
    ) -> EvalResult<bool> {
        let mut ctx = EvalContext::new(time, counts, &self.slots, rng);
        Ok(self.condition.evaluate(&mut ctx)? != 0.0)
    }
}
