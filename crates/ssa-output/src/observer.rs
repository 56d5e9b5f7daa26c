//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use ssa_core::SpeciesId;
use ssa_sim::{RunContext, SimObserver};
use ssa_species::{SpeciesArena, Unit};
use tracing::{debug, warn};

use crate::row::{CountRow, RemovalRow};
use crate::writer::OutputWriter;
use crate::{CsvWriter, OutputError, OutputResult};

/// The observer most runs want: counts and removals as CSV.
pub type CsvObserver = SimOutputObserver<CsvWriter>;

/// A [`SimObserver`] that writes species counts and removed pool units to
/// any [`OutputWriter`] backend.
///
/// A count row is written at time 0 and at every log tick.  Removed units
/// are buffered and written in batches at each log tick and at the end of
/// the run.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    names:      Vec<String>,
    pending:    Vec<RemovalRow>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            names:      Vec::new(),
            pending:    Vec::new(),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn write_row(&mut self, time: f64, species: &SpeciesArena) {
        let row = CountRow {
            time,
            counts: species.iter().map(|(_, s)| s.count()).collect(),
        };
        let result = self.writer.write_counts(&row);
        self.store_err(result);
    }

    fn flush_removals(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let result = self.writer.write_removals(&self.pending);
        self.pending.clear();
        self.store_err(result);
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                warn!(error = %e, "output write failed");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn initialize(&mut self, ctx: &RunContext<'_>) {
        self.names = ctx.species.iter().map(|(_, s)| s.name().to_owned()).collect();
        self.pending.clear();
        let result = self.writer.begin(&self.names);
        self.store_err(result);
        self.write_row(0.0, ctx.species);
    }

    fn write_log(&mut self, time: f64, species: &SpeciesArena) {
        self.write_row(time, species);
        self.flush_removals();
    }

    fn on_unit_removed(&mut self, species: SpeciesId, unit: &Unit, time: f64) {
        let name = self
            .names
            .get(species.index())
            .cloned()
            .unwrap_or_else(|| species.to_string());
        self.pending.push(RemovalRow {
            species:       name,
            created_at:    unit.created_at,
            removed_at:    time,
            modifications: unit.modifications,
        });
    }

    fn uninitialize(&mut self) {
        self.flush_removals();
        let result = self.writer.finish();
        self.store_err(result);
        debug!(species = self.names.len(), "output finished");
    }

    fn writes_to_disk(&self) -> bool {
        true
    }
}
