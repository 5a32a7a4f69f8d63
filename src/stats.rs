//! The statistics ledger: one [`TickRecord`] per completed tick, preceded by a baseline record
//! for tick 0. Reporting consumers read it after a run; the engine is its only writer.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AirborneError;
use crate::population::StateCounts;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: usize,
    pub infectious: usize,
    pub recovered: usize,
    pub dead: usize,
    pub susceptible: usize,
    pub r_effective: f64,
    /// Transmissions that happened during the tick.
    pub new_infections: usize,
    /// Susceptible people found inside a contagious person's contact disk during the tick.
    pub contacts: usize,
}

impl TickRecord {
    #[must_use]
    pub fn new(tick: usize, counts: StateCounts, r_effective: f64) -> Self {
        TickRecord {
            tick,
            infectious: counts.infected,
            recovered: counts.recovered,
            dead: counts.dead,
            susceptible: counts.susceptible,
            r_effective,
            new_infections: 0,
            contacts: 0,
        }
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.infectious + self.recovered + self.dead + self.susceptible
    }
}

/// Scalars describing a whole run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub ticks: usize,
    pub seed: u64,
    pub max_infectious: usize,
    pub total_recovered: usize,
    pub total_dead: usize,
    pub peak_r_effective: f64,
    pub final_r_effective: f64,
    /// Everybody who was ever infected, including the initial cases.
    pub total_infected: usize,
}

#[derive(Clone, Debug)]
pub struct StatsLedger {
    pop_size: usize,
    records: Vec<TickRecord>,
}

impl StatsLedger {
    #[must_use]
    pub fn new(pop_size: usize) -> Self {
        StatsLedger {
            pop_size,
            records: Vec::new(),
        }
    }

    /// Appends the record of the next tick.
    ///
    /// # Panics
    ///
    /// If the record does not account for the whole population or is not for the tick after
    /// the last one recorded.
    pub fn push(&mut self, record: TickRecord) {
        assert_eq!(
            record.population(),
            self.pop_size,
            "tick {} accounts for {} people out of {}",
            record.tick,
            record.population(),
            self.pop_size
        );
        let expected = self.records.last().map_or(0, |last| last.tick + 1);
        assert_eq!(record.tick, expected, "ticks must be recorded in order");
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    #[must_use]
    pub fn last(&self) -> Option<&TickRecord> {
        self.records.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn pop_size(&self) -> usize {
        self.pop_size
    }

    #[must_use]
    pub fn summary(&self, seed: u64) -> Summary {
        let last = self.records.last();
        Summary {
            ticks: last.map_or(0, |record| record.tick),
            seed,
            max_infectious: self
                .records
                .iter()
                .map(|record| record.infectious)
                .max()
                .unwrap_or(0),
            total_recovered: last.map_or(0, |record| record.recovered),
            total_dead: last.map_or(0, |record| record.dead),
            peak_r_effective: self
                .records
                .iter()
                .map(|record| record.r_effective)
                .fold(0.0, f64::max),
            final_r_effective: last.map_or(0.0, |record| record.r_effective),
            total_infected: last.map_or(0, |record| self.pop_size - record.susceptible),
        }
    }

    /// Writes every record as a row of a CSV file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns a `ReportError` if `path` does not end in `.csv`, or an I/O or CSV error if the
    /// file cannot be written.
    pub fn write_csv(&self, path: &Path) -> Result<(), AirborneError> {
        let file = generate_validate_filepath(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path) -> Result<File, AirborneError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(AirborneError::ReportError(format!(
            "ledger output files must be CSVs, got {}",
            path.display()
        ))),
    }
}
