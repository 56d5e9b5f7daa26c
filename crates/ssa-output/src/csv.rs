//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `species_counts.csv` — `time` followed by one column per species
//! - `unit_removals.csv` — `species, created_at, removed_at, modifications`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{CountRow, OutputResult, RemovalRow};

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    counts:   Writer<File>,
    removals: Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create the two CSV files in `dir`.  The removal header is written
    /// now; the count header once the species are known.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let counts = Writer::from_path(dir.join("species_counts.csv"))?;

        let mut removals = Writer::from_path(dir.join("unit_removals.csv"))?;
        removals.write_record(["species", "created_at", "removed_at", "modifications"])?;

        Ok(Self {
            counts,
            removals,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn begin(&mut self, species: &[String]) -> OutputResult<()> {
        let header = std::iter::once("time").chain(species.iter().map(String::as_str));
        self.counts.write_record(header)?;
        Ok(())
    }

    fn write_counts(&mut self, row: &CountRow) -> OutputResult<()> {
        let fields = std::iter::once(row.time.to_string())
            .chain(row.counts.iter().map(u64::to_string));
        self.counts.write_record(fields)?;
        Ok(())
    }

    fn write_removals(&mut self, rows: &[RemovalRow]) -> OutputResult<()> {
        for row in rows {
            self.removals.write_record(&[
                row.species.clone(),
                row.created_at.to_string(),
                row.removed_at.to_string(),
                row.modifications.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.counts.flush()?;
        self.removals.flush()?;
        Ok(())
    }
}
