//! The `Species` enum and the arena that owns every species of a model.

use std::collections::HashMap;

use ssa_core::{SimRng, SpeciesId};
use ssa_expr::{NamedVar, SpeciesCounts};

use crate::{BranchNode, IndividualPool, SimpleCounter, SpeciesError, SpeciesResult, Unit};

/// A species reference with a strictly positive stoichiometry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Term {
    pub species: SpeciesId,
    pub stoich:  u64,
}

impl Term {
    pub fn new(species: SpeciesId, stoich: u64) -> Self {
        Self { species, stoich }
    }
}

// ── Species ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Species {
    Counter(SimpleCounter),
    Pool(IndividualPool),
    Branch(BranchNode),
}

impl Species {
    pub fn name(&self) -> &str {
        match self {
            Species::Counter(c) => c.name(),
            Species::Pool(p) => p.name(),
            Species::Branch(b) => b.name(),
        }
    }

    #[inline]
    pub fn count(&self) -> u64 {
        match self {
            Species::Counter(c) => c.count(),
            Species::Pool(p) => p.count(),
            Species::Branch(b) => b.count(),
        }
    }

    pub fn initial(&self) -> u64 {
        match self {
            Species::Counter(c) => c.initial(),
            Species::Pool(p) => p.initial(),
            Species::Branch(_) => 0,
        }
    }

    /// Short label, useful in logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Species::Counter(_) => "counter",
            Species::Pool(_) => "pool",
            Species::Branch(_) => "branch",
        }
    }

    pub fn as_pool(&self) -> Option<&IndividualPool> {
        match self {
            Species::Pool(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_branch(&self) -> Option<&BranchNode> {
        match self {
            Species::Branch(b) => Some(b),
            _ => None,
        }
    }
}

// ── Mutation context ──────────────────────────────────────────────────────────

/// Receives units leaving pools that have removal reporting enabled.
pub trait RemovalSink {
    fn unit_removed(&mut self, species: SpeciesId, unit: &Unit, time: f64);
}

/// A [`RemovalSink`] that drops every report.
pub struct NoRemovalSink;

impl RemovalSink for NoRemovalSink {
    fn unit_removed(&mut self, _species: SpeciesId, _unit: &Unit, _time: f64) {}
}

/// Everything a runtime mutation needs besides the arena itself.
pub struct FireContext<'a> {
    pub time:     f64,
    pub rng:      &'a mut SimRng,
    pub removals: &'a mut dyn RemovalSink,
}

impl<'a> FireContext<'a> {
    pub fn new(time: f64, rng: &'a mut SimRng, removals: &'a mut dyn RemovalSink) -> Self {
        Self { time, rng, removals }
    }
}

// ── SpeciesArena ──────────────────────────────────────────────────────────────

/// Owns every species of a model; everything else holds [`SpeciesId`]s.
#[derive(Debug, Clone, Default)]
pub struct SpeciesArena {
    species: Vec<Species>,
    by_name: HashMap<String, SpeciesId>,
}

impl SpeciesArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a species.  Returns `None` if the name is already taken.
    pub fn insert(&mut self, species: Species) -> Option<SpeciesId> {
        if self.by_name.contains_key(species.name()) {
            return None;
        }
        let id = SpeciesId::try_from(self.species.len()).ok()?;
        self.by_name.insert(species.name().to_owned(), id);
        self.species.push(species);
        Some(id)
    }

    pub fn id_of(&self, name: &str) -> Option<SpeciesId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id.index())
    }

    /// Name → id map, as seen by expression binding.
    pub fn names(&self) -> &HashMap<String, SpeciesId> {
        &self.by_name
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Species in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (SpeciesId, &Species)> + '_ {
        self.species
            .iter()
            .enumerate()
            .map(|(i, s)| (SpeciesId(i as u32), s))
    }

    #[inline]
    pub fn count(&self, id: SpeciesId) -> u64 {
        self.species[id.index()].count()
    }

    /// Oldest unit of a pool; `None` for empty pools and non-pool species.
    pub fn peek_first(&self, id: SpeciesId) -> Option<&Unit> {
        self.species[id.index()].as_pool()?.peek_first()
    }

    /// Reset every species to its initial condition and re-bind branch
    /// conditions.
    pub fn initialize(&mut self) -> SpeciesResult<()> {
        for species in &mut self.species {
            match species {
                Species::Counter(c) => c.initialize(),
                Species::Pool(p) => p.initialize(),
                Species::Branch(b) => b.initialize(&self.by_name)?,
            }
        }
        Ok(())
    }

    /// Release per-run state.  Counts are left as the run ended.
    pub fn uninitialize(&mut self) {
        for species in &mut self.species {
            if let Species::Branch(b) = species {
                b.uninitialize();
            }
        }
    }

    /// Add `n` units of species `id`.  Pools stamp them with `ctx.time`;
    /// branch nodes route each one separately, forwarding `vars`.
    pub fn add(
        &mut self,
        id:   SpeciesId,
        n:    u64,
        vars: &[NamedVar],
        ctx:  &mut FireContext<'_>,
    ) -> SpeciesResult<()> {
        if n == 0 {
            return Ok(());
        }
        let (on_true, on_false) = match &mut self.species[id.index()] {
            Species::Counter(c) => {
                c.add(n);
                return Ok(());
            }
            Species::Pool(p) => {
                p.add(n, ctx.time);
                return Ok(());
            }
            Species::Branch(b) => {
                b.merge_vars(vars, &self.by_name)?;
                (b.on_true().to_vec(), b.on_false().to_vec())
            }
        };

        // One evaluation per unit: conditions may draw randomness or read
        // counts that the previous unit just changed.
        for _ in 0..n {
            let terms = if self.route(id, ctx)? { &on_true } else { &on_false };
            for term in terms {
                self.add(term.species, term.stoich, vars, ctx)?;
            }
        }
        Ok(())
    }

    /// Remove `n` units of species `id`.  Pools evict uniformly at random.
    pub fn remove(&mut self, id: SpeciesId, n: u64, ctx: &mut FireContext<'_>) -> SpeciesResult<()> {
        match &mut self.species[id.index()] {
            Species::Counter(c) => c.remove(n),
            Species::Pool(p) => {
                let report = p.reports_removals();
                let time = ctx.time;
                let sink = &mut *ctx.removals;
                p.remove_random_with(n, ctx.rng, |unit| {
                    if report {
                        sink.unit_removed(id, unit, time);
                    }
                })
            }
            Species::Branch(b) => b.remove(n),
        }
    }

    /// Mark `n` random units of a pool as modified once more.  No-op for
    /// counters and branch nodes.
    pub fn transform(&mut self, id: SpeciesId, n: u64, ctx: &mut FireContext<'_>) -> SpeciesResult<()> {
        match &mut self.species[id.index()] {
            Species::Counter(c) => {
                c.transform(n);
                Ok(())
            }
            Species::Pool(p) => p.transform_random(n, ctx.rng, 1),
            Species::Branch(b) => {
                b.transform(n);
                Ok(())
            }
        }
    }

    /// Remove and return the oldest unit of pool `id`.
    pub fn take_first(&mut self, id: SpeciesId, ctx: &mut FireContext<'_>) -> SpeciesResult<Unit> {
        let pool = match &mut self.species[id.index()] {
            Species::Pool(pool) => pool,
            other => {
                return Err(SpeciesError::NotAPool { species: other.name().to_owned() });
            }
        };
        let unit = pool
            .remove_first(1)?
            .pop()
            .ok_or_else(|| SpeciesError::BufferUnderflow {
                species:   pool.name().to_owned(),
                requested: 1,
                available: 0,
            })?;
        if pool.reports_removals() {
            ctx.removals.unit_removed(id, &unit, ctx.time);
        }
        Ok(unit)
    }

    /// Evaluate branch `id`'s condition once.
    fn route(&self, id: SpeciesId, ctx: &mut FireContext<'_>) -> SpeciesResult<bool> {
        let branch = self.species[id.index()]
            .as_branch()
            .ok_or_else(|| SpeciesError::Routing(self.species[id.index()].name().to_owned()))?;
        Ok(branch.decide(ctx.time, self, ctx.rng)?)
    }
}

impl SpeciesCounts for SpeciesArena {
    fn count_of(&self, id: SpeciesId) -> u64 {
        self.species.get(id.index()).map_or(0, Species::count)
    }
}
