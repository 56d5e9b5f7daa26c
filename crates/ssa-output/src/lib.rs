//! `ssa-output` — simulation output writers for the rust_ssa simulator.
//!
//! | Backend | Files created                                  |
//! |---------|------------------------------------------------|
//! | CSV     | `species_counts.csv`, `unit_removals.csv`      |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `ssa_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ssa_output::{CsvObserver, CsvWriter};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = CsvObserver::new(writer);
//! sim.run(100.0, &mut obs)?;
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::{CsvObserver, SimOutputObserver};
pub use row::{CountRow, RemovalRow};
pub use writer::OutputWriter;
