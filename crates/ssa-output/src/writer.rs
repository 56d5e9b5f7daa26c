//! The `OutputWriter` trait implemented by all backend writers.

use crate::{CountRow, OutputResult, RemovalRow};

/// Trait implemented by output backends.
///
/// All methods are infallible from the observer's perspective — errors are
/// stored internally and retrieved with
/// [`SimOutputObserver::take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Called at the start of a run with the species names, in the order
    /// `CountRow::counts` will use.
    fn begin(&mut self, species: &[String]) -> OutputResult<()>;

    /// Write one row of counts.
    fn write_counts(&mut self, row: &CountRow) -> OutputResult<()>;

    /// Write a batch of removed units.
    fn write_removals(&mut self, rows: &[RemovalRow]) -> OutputResult<()>;

    /// Flush all underlying file handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
