//! The `Sim` struct and its hybrid event-selection loop.

use std::time::Instant;

use ssa_core::{LogClock, ReactionId, SimConfig, SimRng, SpeciesId};
use ssa_expr::SymbolTable;
use ssa_reaction::Reaction;
use ssa_species::{FireContext, RemovalSink, Species, SpeciesArena, Unit};
use tracing::{debug, info, trace, warn};

use crate::{RunContext, SimError, SimObserver, SimResult};

/// Lifecycle of a [`Sim`]: `Idle → Running → Finished | Failed`.  A finished
/// or failed sim may be run again; every run starts from the initial
/// conditions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Finished,
    Failed,
}

/// Routes pool removal reports to the observer during a firing.
struct Removals<'o, O: SimObserver>(&'o mut O);

impl<O: SimObserver> RemovalSink for Removals<'_, O> {
    fn unit_removed(&mut self, species: SpeciesId, unit: &Unit, time: f64) {
        self.0.on_unit_removed(species, unit, time);
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The simulation runner.
///
/// Owns every species (in a [`SpeciesArena`]), every reaction, and the single
/// RNG of the run.  Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    config:    SimConfig,
    species:   SpeciesArena,
    reactions: Vec<Reaction>,
    names:     Vec<String>,

    /// Indices into `reactions`, registration order preserved.
    stochastic: Vec<usize>,
    scheduled:  Vec<usize>,

    /// Propensities from step (a) of the current iteration, parallel to
    /// `stochastic`.  Reused for the weighted choice.
    rates: Vec<f64>,

    fired: Vec<u64>,
    rng:   SimRng,
    time:  f64,
    state: RunState,
}

impl Sim {
    pub(crate) fn new(config: SimConfig, species: SpeciesArena, reactions: Vec<Reaction>) -> Self {
        let names = reactions.iter().map(|r| r.name().to_owned()).collect();
        let (scheduled, stochastic): (Vec<usize>, Vec<usize>) =
            (0..reactions.len()).partition(|&i| reactions[i].is_scheduled());
        Self {
            rng: SimRng::new(config.seed),
            config,
            species,
            rates: vec![0.0; stochastic.len()],
            fired: vec![0; reactions.len()],
            reactions,
            names,
            stochastic,
            scheduled,
            time: 0.0,
            state: RunState::Idle,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the initial conditions until the next event would fall after
    /// `max_time`.
    ///
    /// The observer is always uninitialized before this returns, also when
    /// the run fails.  A failure leaves the state exactly as the failing
    /// firing left it; nothing is rolled back.
    pub fn run<O: SimObserver>(&mut self, max_time: f64, observer: &mut O) -> SimResult<()> {
        if !max_time.is_finite() || max_time < 0.0 {
            return Err(SimError::Config(format!(
                "max time must be finite and non-negative, got {max_time}"
            )));
        }

        let started = Instant::now();
        self.state = RunState::Running;
        info!(
            seed = self.config.seed,
            max_time,
            species = self.species.len(),
            reactions = self.reactions.len(),
            "simulation starting"
        );

        let result = self
            .initialize(max_time, observer)
            .and_then(|()| self.run_loop(max_time, observer));
        self.uninitialize();
        observer.uninitialize();

        match &result {
            Ok(()) => {
                self.state = RunState::Finished;
                info!(
                    time = self.time,
                    fired = self.fired.iter().sum::<u64>(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "simulation finished"
                );
            }
            Err(err) => {
                self.state = RunState::Failed;
                warn!(time = self.time, error = %err, "simulation aborted");
            }
        }
        result
    }

    /// Current simulation time.  After a successful run this is `max_time`.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn species_id(&self, name: &str) -> Option<SpeciesId> {
        self.species.id_of(name)
    }

    pub fn species(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id)
    }

    /// Every species, in registration order.
    pub fn arena(&self) -> &SpeciesArena {
        &self.species
    }

    /// Current count of the species called `name`.
    pub fn count(&self, name: &str) -> Option<u64> {
        self.species.id_of(name).map(|id| self.species.count(id))
    }

    /// Reaction names indexed by `ReactionId`.
    pub fn reaction_names(&self) -> &[String] {
        &self.names
    }

    /// How often the reaction called `name` fired in the last run.
    pub fn fired_count(&self, name: &str) -> Option<u64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.fired[i])
    }

    // ── Run phases ────────────────────────────────────────────────────────

    fn initialize<O: SimObserver>(&mut self, max_time: f64, observer: &mut O) -> SimResult<()> {
        self.rng.reseed(self.config.seed);
        self.time = 0.0;
        self.fired.fill(0);

        self.species.initialize()?;
        let resolver = SymbolTable::new(self.species.names(), &[]);
        for reaction in &mut self.reactions {
            reaction.initialize(&resolver)?;
        }

        observer.initialize(&RunContext {
            seed:       self.config.seed,
            log_period: self.config.log_period,
            max_time,
            species:    &self.species,
            reactions:  &self.names,
        });
        Ok(())
    }

    fn uninitialize(&mut self) {
        self.species.uninitialize();
        for reaction in &mut self.reactions {
            reaction.uninitialize();
        }
    }

    fn run_loop<O: SimObserver>(&mut self, max_time: f64, observer: &mut O) -> SimResult<()> {
        let mut clock = LogClock::new(self.config.log_period);

        loop {
            // (a) total propensity
            let mut total = 0.0;
            for (slot, &idx) in self.stochastic.iter().enumerate() {
                let rate = self.reactions[idx].propensity(&self.species, self.time, &mut self.rng)?;
                // Non-positive (or NaN) rates contribute nothing and are never chosen.
                let rate = if rate > 0.0 { rate } else { 0.0 };
                self.rates[slot] = rate;
                total += rate;
            }

            // (b) stochastic candidate
            let stochastic_time = if total > 0.0 {
                self.time - self.rng.uniform_open01().ln() / total
            } else {
                f64::INFINITY
            };

            // (c) scheduled candidate; strict `<` keeps the first registered on ties
            let mut event: Option<(usize, f64)> = None;
            for &idx in &self.scheduled {
                let at = self.reactions[idx].next_fire_time(&self.species);
                if at < event.map_or(f64::INFINITY, |(_, best)| best) {
                    event = Some((idx, at));
                }
            }
            let event_time = event.map_or(f64::INFINITY, |(_, at)| at);

            // (d)
            let next_time = stochastic_time.min(event_time);

            // (e) every log tick up to the next event, none skipped
            while let Some(tick) = clock.pop_due(next_time.min(max_time)) {
                debug!(tick, "log tick");
                observer.write_log(tick, &self.species);
            }

            // (f)
            if next_time > max_time {
                self.time = max_time;
                return Ok(());
            }

            // (g) scheduled event, winning ties with the stochastic clock
            let idx = match event {
                Some((idx, at)) if at <= stochastic_time => {
                    self.time = at;
                    idx
                }
                // (h) weighted choice among stochastic reactions
                _ => {
                    self.time = stochastic_time;
                    self.select(total)?
                }
            };
            self.fire(idx, observer)?;
        }
    }

    /// Pick the first stochastic reaction whose running propensity sum
    /// exceeds `U[0,1) · total`.
    ///
    /// Weights are the propensities cached in step (a), not re-evaluated at
    /// the advanced clock.  A custom rate that reads `t` or `rand` is
    /// therefore weighted by its value at the start of the step, and draws
    /// no further numbers from the stream here.
    fn select(&mut self, total: f64) -> SimResult<usize> {
        let target = self.rng.uniform01() * total;
        let mut acc = 0.0;
        let mut last_positive = None;
        for (slot, &idx) in self.stochastic.iter().enumerate() {
            let rate = self.rates[slot];
            if rate <= 0.0 {
                continue;
            }
            acc += rate;
            last_positive = Some(idx);
            if acc > target {
                return Ok(idx);
            }
        }
        // Rounding can leave `acc` a hair below `target`.
        last_positive.ok_or(SimError::Selection { target, total })
    }

    fn fire<O: SimObserver>(&mut self, idx: usize, observer: &mut O) -> SimResult<()> {
        let mut removals = Removals(&mut *observer);
        let mut ctx = FireContext::new(self.time, &mut self.rng, &mut removals);
        self.reactions[idx].fire(&mut self.species, &mut ctx)?;

        self.fired[idx] += 1;
        let name = &self.names[idx];
        trace!(time = self.time, reaction = %name, "fired");
        observer.on_fire(self.time, ReactionId(idx as u32), name);
        Ok(())
    }
}
