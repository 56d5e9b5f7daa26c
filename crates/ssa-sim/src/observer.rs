//! Simulation observer trait for logging and data collection.

use ssa_core::{ReactionId, SpeciesId};
use ssa_species::{SpeciesArena, Unit};

/// Read-only facts about the run that is starting.
pub struct RunContext<'a> {
    pub seed:       u64,
    pub log_period: f64,
    pub max_time:   f64,
    /// Species already reset to their initial conditions.
    pub species:    &'a SpeciesArena,
    /// Reaction names in registration order, indexed by `ReactionId`.
    pub reactions:  &'a [String],
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  Hooks are infallible: an observer that can
/// fail (e.g. one writing files) keeps its first error and exposes it after
/// the run.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl SimObserver for Progress {
///     fn write_log(&mut self, time: f64, species: &SpeciesArena) {
///         println!("t = {time}: {} species", species.len());
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once per run, after every species and reaction is initialized.
    fn initialize(&mut self, _ctx: &RunContext<'_>) {}

    /// Called at every log tick, in increasing order, with the state as it
    /// was at that tick.
    fn write_log(&mut self, _time: f64, _species: &SpeciesArena) {}

    /// Called after a reaction fired successfully.
    fn on_fire(&mut self, _time: f64, _reaction: ReactionId, _name: &str) {}

    /// Called once per unit leaving a pool with removal reporting enabled.
    fn on_unit_removed(&mut self, _species: SpeciesId, _unit: &Unit, _time: f64) {}

    /// Called once per run, on success and on failure alike.
    fn uninitialize(&mut self) {}

    /// `true` if the observer persists anything.
    fn writes_to_disk(&self) -> bool {
        false
    }
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Fan out every hook to two observers, `A` first.
impl<A: SimObserver, B: SimObserver> SimObserver for (A, B) {
    fn initialize(&mut self, ctx: &RunContext<'_>) {
        self.0.initialize(ctx);
        self.1.initialize(ctx);
    }

    fn write_log(&mut self, time: f64, species: &SpeciesArena) {
        self.0.write_log(time, species);
        self.1.write_log(time, species);
    }

    fn on_fire(&mut self, time: f64, reaction: ReactionId, name: &str) {
        self.0.on_fire(time, reaction, name);
        self.1.on_fire(time, reaction, name);
    }

    fn on_unit_removed(&mut self, species: SpeciesId, unit: &Unit, time: f64) {
        self.0.on_unit_removed(species, unit, time);
        self.1.on_unit_removed(species, unit, time);
    }

    fn uninitialize(&mut self) {
        self.0.uninitialize();
        self.1.uninitialize();
    }

    fn writes_to_disk(&self) -> bool {
        self.0.writes_to_disk() || self.1.writes_to_disk()
    }
}

// ── TrajectoryRecorder ────────────────────────────────────────────────────────

/// Keeps the run in memory: every firing as `(time, reaction name)` and every
/// log tick as `(time, counts in species order)`.
///
/// Two runs with the same seed record identical `firings`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrajectoryRecorder {
    pub firings:   Vec<(f64, String)>,
    pub snapshots: Vec<(f64, Vec<u64>)>,
    pub finished:  bool,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the last firing, or `None` if nothing fired.
    pub fn last_firing_time(&self) -> Option<f64> {
        self.firings.last().map(|(t, _)| *t)
    }
}

impl SimObserver for TrajectoryRecorder {
    fn initialize(&mut self, _ctx: &RunContext<'_>) {
        self.firings.clear();
        self.snapshots.clear();
        self.finished = false;
    }

    fn write_log(&mut self, time: f64, species: &SpeciesArena) {
        let counts = species.iter().map(|(_, s)| s.count()).collect();
        self.snapshots.push((time, counts));
    }

    fn on_fire(&mut self, time: f64, _reaction: ReactionId, name: &str) {
        self.firings.push((time, name.to_owned()));
    }

    fn uninitialize(&mut self) {
        self.finished = true;
    }
}
