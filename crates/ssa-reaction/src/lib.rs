//! `ssa-reaction` — the reactions that compete for the next event.
//!
//! # Two kinds of clock
//!
//! | Kind                    | Clock                                              |
//! |-------------------------|----------------------------------------------------|
//! | [`StochasticReaction`]  | propensity; the loop samples an exponential time   |
//! | [`DelayReaction`]       | oldest unit of a pool + fixed delay                |
//! | [`TimerReaction`]       | one preset absolute time, once per run             |
//!
//! All three are wrapped by the closed [`Reaction`] enum, which is what the
//! simulation loop stores and dispatches on.

pub mod delay;
pub mod error;
pub mod reaction;
pub mod stochastic;
pub mod timer;


pub use delay::DelayReaction;
pub use error::{ReactionError, ReactionResult};
pub use reaction::Reaction;
pub use stochastic::{Participant, Rate, Role, StochasticReaction, falling_factorial};
pub use timer::TimerReaction;
