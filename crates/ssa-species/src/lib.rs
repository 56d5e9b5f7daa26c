//! `ssa-species` — the species arena of the rust_ssa simulator.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                |
//! |-----------------|---------------------------------------------------------|
//! | [`ring_buffer`] | `RingBuffer<T>` — auto-doubling circular buffer         |
//! | [`pool`]        | `Unit`, `IndividualPool` — identity-tracked species     |
//! | [`counter`]     | `SimpleCounter` — count-only species                    |
//! | [`branch`]      | `BranchNode` — probabilistic router                     |
//! | [`species`]     | `Species` enum, `SpeciesArena`, `FireContext`           |
//! | [`error`]       | `SpeciesError`, `SpeciesResult<T>`                      |
//!
//! # Mutation model
//!
//! Every runtime mutation goes through [`SpeciesArena`], because adding to a
//! branch node fans out into other species:
//!
//! ```text
//! arena.add(id, n, vars, ctx)        counter += n | pool gets n units | branch routes n units
//! arena.remove(id, n, ctx)           counter -= n | pool random eviction | branch → RoutingError
//! arena.transform(id, n, ctx)        no-op        | pool marks n units   | no-op
//! arena.take_first(id, ctx)          pool only: pop the oldest unit
//! ```

pub mod branch;
pub mod counter;
pub mod error;
pub mod pool;
pub mod ring_buffer;
pub mod species;


pub use branch::BranchNode;
pub use counter::SimpleCounter;
pub use error::{SpeciesError, SpeciesResult};
pub use pool::{IndividualPool, Unit};
pub use ring_buffer::{BufferUnderflow, RingBuffer};
pub use species::{FireContext, NoRemovalSink, RemovalSink, Species, SpeciesArena, Term};
