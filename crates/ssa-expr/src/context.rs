//! What an expression can see while it evaluates.

use std::collections::HashMap;

use ssa_core::{SimRng, SpeciesId};

/// A call-scoped `(name, value)` pair threaded into expression evaluation
/// without becoming species state.
pub type NamedVar = (String, f64);

/// Read access to current species counts.
pub trait SpeciesCounts {
    fn count_of(&self, id: SpeciesId) -> u64;
}

/// Where a free name in an expression reads its value from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VarSlot {
    /// Current count of a species.
    Species(SpeciesId),
    /// Position in the named-variable table passed with the evaluation.
    Named(usize),
    /// Current simulation time.
    Time,
    /// A fresh uniform draw on `[0, 1)` per read.
    Random,
}

/// Name lookup used by [`Expression::bind`][crate::Expression::bind].
pub trait NameResolver {
    fn resolve(&self, name: &str) -> Option<VarSlot>;
}

/// The standard resolver: named variables shadow species names, which shadow
/// the reserved names `time`/`t` and `rand`.
pub struct SymbolTable<'a> {
    species: &'a HashMap<String, SpeciesId>,
    named:   &'a [NamedVar],
}

impl<'a> SymbolTable<'a> {
    pub fn new(species: &'a HashMap<String, SpeciesId>, named: &'a [NamedVar]) -> Self {
        Self { species, named }
    }
}

impl NameResolver for SymbolTable<'_> {
    fn resolve(&self, name: &str) -> Option<VarSlot> {
        if let Some(pos) = self.named.iter().position(|(n, _)| n == name) {
            return Some(VarSlot::Named(pos));
        }
        if let Some(&id) = self.species.get(name) {
            return Some(VarSlot::Species(id));
        }
        match name {
            "time" | "t" => Some(VarSlot::Time),
            "rand" => Some(VarSlot::Random),
            _ => None,
        }
    }
}

/// Snapshot handed to [`Expression::evaluate`][crate::Expression::evaluate].
///
/// The RNG travels with the context instead of living in global state, so an
/// expression that draws randomness consumes the simulation's own stream.
pub struct EvalContext<'a> {
    pub time:   f64,
    pub counts: &'a dyn SpeciesCounts,
    pub vars:   &'a [NamedVar],
    pub rng:    &'a mut SimRng,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        time:   f64,
        counts: &'a dyn SpeciesCounts,
        vars:   &'a [NamedVar],
        rng:    &'a mut SimRng,
    ) -> Self {
        Self { time, counts, vars, rng }
    }

    /// Read the current value behind `slot`, or `None` when a named slot is
    /// out of range for this call's variable table.
    pub fn read(&mut self, slot: VarSlot) -> Option<f64> {
        match slot {
            VarSlot::Species(id) => Some(self.counts.count_of(id) as f64),
            VarSlot::Named(pos) => self.vars.get(pos).map(|(_, v)| *v),
            VarSlot::Time => Some(self.time),
            VarSlot::Random => Some(self.rng.uniform01()),
        }
    }
}
