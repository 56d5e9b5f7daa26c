//! `SimpleCounter` — a species that is only a number.

use crate::{SpeciesError, SpeciesResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCounter {
    name:    String,
    initial: u64,
    count:   u64,
}

impl SimpleCounter {
    pub fn new(name: impl Into<String>, initial: u64) -> Self {
        Self { name: name.into(), initial, count: initial }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial(&self) -> u64 {
        self.initial
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn initialize(&mut self) {
        self.count = self.initial;
    }

    #[inline]
    pub fn add(&mut self, n: u64) {
        self.count += n;
    }

    /// Fails instead of going negative; a failure means an upstream logic
    /// error (a reaction fired without enough reactant).
    pub fn remove(&mut self, n: u64) -> SpeciesResult<()> {
        if n > self.count {
            return Err(SpeciesError::BufferUnderflow {
                species:   self.name.clone(),
                requested: n,
                available: self.count,
            });
        }
        self.count -= n;
        Ok(())
    }

    /// Count-only species have no per-unit state to transform.
    #[inline]
    pub fn transform(&mut self, _n: u64) {}
}
