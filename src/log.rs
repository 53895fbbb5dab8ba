//! Driving-log ingestion.
//!
//! The simulator writes `driving_log.csv` next to its `IMG/` directory:
//! headerless, one row per recorded frame, columns
//! `center,left,right,steering,throttle,brake,speed`. Image paths are
//! relative to the data directory and resolved here, once, at load time.

use crate::types::{DatasetError, DatasetResult, LogRecord, Sample};
use std::fs::File;
use std::path::Path;

pub const DRIVING_LOG_NAME: &str = "driving_log.csv";

/// Load every row of `<data_dir>/driving_log.csv`.
///
/// Malformed rows fail the whole load; there is no partial-row recovery.
pub fn load_driving_log(data_dir: &Path) -> DatasetResult<Vec<Sample>> {
    let log_path = data_dir.join(DRIVING_LOG_NAME);
    let file = File::open(&log_path).map_err(|source| DatasetError::Io {
        path: log_path.clone(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut samples = Vec::new();
    for result in reader.deserialize() {
        let record: LogRecord = result.map_err(|source| DatasetError::Log {
            path: log_path.clone(),
            source,
        })?;
        samples.push(Sample {
            center: data_dir.join(&record.center),
            left: data_dir.join(&record.left),
            right: data_dir.join(&record.right),
            steering: record.steering,
            throttle: record.throttle,
            brake: record.brake,
            speed: record.speed,
        });
    }
    Ok(samples)
}
