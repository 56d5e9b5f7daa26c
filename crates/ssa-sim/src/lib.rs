//! `ssa-sim` — the hybrid event-selection loop for the rust_ssa simulator.
//!
//! # Loop
//!
//! ```text
//! initialize species, reactions, observer; time = 0
//! loop:
//!   a0      = Σ propensities of stochastic reactions
//!   t_ssa   = time − ln(U(0,1)) / a0            (+∞ when a0 == 0)
//!   t_event = min next-fire time of scheduled reactions (first registered wins ties)
//!   next    = min(t_ssa, t_event)
//!   emit every log tick ≤ min(next, max_time)
//!   next > max_time        → time = max_time, stop
//!   t_event ≤ t_ssa        → fire the scheduled reaction
//!   otherwise              → fire one stochastic reaction, chosen ∝ propensity
//! uninitialize observer (always, also after an error)
//! ```
//!
//! Errors abort the loop where they happen.  Mutations already applied by a
//! partially fired reaction are not rolled back.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ssa_core::SimConfig;
//! use ssa_reaction::Rate;
//! use ssa_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(SimConfig::new(42, 1.0))
//!     .counter("X", 100)
//!     .stochastic("decay", Rate::Constant(1.0)).reactant("X", 1).done()
//!     .build()?;
//! sim.run(1000.0, &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::{SimBuilder, StochasticBuilder};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, RunContext, SimObserver, TrajectoryRecorder};
pub use sim::{RunState, Sim};
