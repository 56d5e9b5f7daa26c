//! `IndividualPool` — a species whose members are distinguishable.
//!
//! # Lazy eviction
//!
//! Random removal marks the drawn slot invalidated instead of shifting the
//! buffer.  The front slot is always valid: whenever the front is popped, any
//! invalidated slots behind it are popped too.  So:
//!
//! ```text
//! count() == number of non-invalidated slots <= physical_len() <= capacity()
//! ```
//!
//! Draws are uniform over physical slots.  Landing on an invalidated slot is a
//! miss; after three misses in one removal the buffer is compacted (every
//! invalidated slot dropped) and the draw is repeated over valid slots only.

use ssa_core::SimRng;
use tracing::debug;

use crate::{RingBuffer, SpeciesError, SpeciesResult};

/// Consecutive invalidated draws tolerated before compacting.
const MISSES_BEFORE_COMPACTION: u32 = 3;

/// One individual of an [`IndividualPool`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Unit {
    /// Simulation time at which the unit was added.
    pub created_at:    f64,
    /// How many times the unit has been transformed.
    pub modifications: u64,
    invalidated:       bool,
}

impl Unit {
    pub fn new(created_at: f64) -> Self {
        Self { created_at, modifications: 0, invalidated: false }
    }
}

#[derive(Debug, Clone)]
pub struct IndividualPool {
    name:            String,
    initial:         u64,
    units:           RingBuffer<Unit>,
    live:            usize,
    report_removals: bool,
}

impl IndividualPool {
    pub fn new(name: impl Into<String>, initial: u64) -> Self {
        Self {
            name: name.into(),
            initial,
            units: RingBuffer::with_capacity(initial as usize),
            live: 0,
            report_removals: false,
        }
    }

    /// Ask the arena to report every removed unit to the run's observer.
    pub fn with_removal_reports(mut self, enabled: bool) -> Self {
        self.report_removals = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial(&self) -> u64 {
        self.initial
    }

    pub fn reports_removals(&self) -> bool {
        self.report_removals
    }

    /// Logical size: units not marked invalidated.
    #[inline]
    pub fn count(&self) -> u64 {
        self.live as u64
    }

    /// Occupied buffer slots, invalidated ones included.
    #[inline]
    pub fn physical_len(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.units.capacity()
    }

    /// Reset to `initial` units created at time 0.
    pub fn initialize(&mut self) {
        self.units.clear();
        self.live = 0;
        self.add(self.initial, 0.0);
    }

    /// Append `n` fresh units stamped `created_at`.
    pub fn add(&mut self, n: u64, created_at: f64) {
        for _ in 0..n {
            *self.units.push_tail() = Unit::new(created_at);
        }
        self.live += n as usize;
    }

    /// Oldest valid unit.
    pub fn peek_first(&self) -> Option<&Unit> {
        self.units.front()
    }

    /// Iterate valid units, oldest first.
    pub fn iter_valid(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(|u| !u.invalidated)
    }

    pub fn remove_random(&mut self, n: u64, rng: &mut SimRng) -> SpeciesResult<()> {
        self.remove_random_with(n, rng, |_| {})
    }

    /// Remove `n` uniformly chosen units, calling `on_removed` once for each
    /// at the moment it leaves the logical population.
    pub fn remove_random_with(
        &mut self,
        n:              u64,
        rng:            &mut SimRng,
        mut on_removed: impl FnMut(&Unit),
    ) -> SpeciesResult<()> {
        self.ensure_available(n)?;
        for _ in 0..n {
            let idx = self.draw_valid(rng);
            if idx == 0 {
                let unit = self.pop_front_valid()?;
                on_removed(&unit);
            } else {
                let unit = &mut self.units[idx];
                unit.invalidated = true;
                self.live -= 1;
                on_removed(unit);
            }
        }
        Ok(())
    }

    /// Remove and return the `n` oldest units.
    pub fn remove_first(&mut self, n: u64) -> SpeciesResult<Vec<Unit>> {
        self.ensure_available(n)?;
        (0..n).map(|_| self.pop_front_valid()).collect()
    }

    /// Add `delta` to the modification counter of `n` uniformly drawn units
    /// (with replacement).
    pub fn transform_random(&mut self, n: u64, rng: &mut SimRng, delta: u64) -> SpeciesResult<()> {
        if n > 0 && self.live == 0 {
            return Err(self.underflow(n));
        }
        for _ in 0..n {
            let idx = self.draw_valid(rng);
            self.units[idx].modifications += delta;
        }
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn ensure_available(&self, n: u64) -> SpeciesResult<()> {
        if n > self.count() {
            return Err(self.underflow(n));
        }
        Ok(())
    }

    fn underflow(&self, requested: u64) -> SpeciesError {
        SpeciesError::BufferUnderflow {
            species: self.name.clone(),
            requested,
            available: self.count(),
        }
    }

    /// Draw a physical index holding a valid unit.  Requires `live > 0`.
    fn draw_valid(&mut self, rng: &mut SimRng) -> usize {
        let mut misses = 0;
        loop {
            if misses == MISSES_BEFORE_COMPACTION {
                self.compact();
                misses = 0;
            }
            let idx = rng.index_below(self.units.len());
            if !self.units[idx].invalidated {
                return idx;
            }
            misses += 1;
        }
    }

    /// Pop the (valid) front unit, then every invalidated unit behind it.
    fn pop_front_valid(&mut self) -> SpeciesResult<Unit> {
        let unit = self.units.pop_top().map_err(|_| self.underflow(1))?;
        self.live -= 1;
        while self.units.front().is_some_and(|u| u.invalidated) {
            let _ = self.units.pop_top();
        }
        Ok(unit)
    }

    /// Move invalidated slots to the front (stable), valid ones after them in
    /// creation order, then drop exactly the invalidated prefix.
    fn compact(&mut self) {
        let dropped = self.units.len() - self.live;
        self.units.make_contiguous().sort_by(|a, b| {
            b.invalidated
                .cmp(&a.invalidated)
                .then_with(|| match (a.invalidated, b.invalidated) {
                    (false, false) => a.created_at.total_cmp(&b.created_at),
                    _ => std::cmp::Ordering::Equal,
                })
        });
        for _ in 0..dropped {
            let _ = self.units.pop_top();
        }
        debug!(species = %self.name, dropped, live = self.live, "compacted individual pool");
    }
}
