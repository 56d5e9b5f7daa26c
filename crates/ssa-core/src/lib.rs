//! `ssa-core` — foundational types for the `rust_ssa` reaction-network
//! simulator.
//!
//! This crate is a dependency of every other `ssa-*` crate.  It intentionally
//! has no `ssa-*` dependencies and minimal external ones (`rand`,
//! `rand_chacha` and `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`ids`]     | `SpeciesId`, `ReactionId`                             |
//! | [`rng`]     | `SimRng` (the run's single seeded stream)             |
//! | [`time`]    | `SimConfig`, `LogClock`                               |
//! | [`error`]   | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and `SimConfig`.     |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{ReactionId, SpeciesId};
pub use rng::SimRng;
pub use time::{LogClock, SimConfig};
