//! Typed CSV loading for each pipeline stage.

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::records::{MergedRecord, RawTransitRecord, TransitRecord, WeatherRecord};

fn load_csv<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    if !Path::new(path).exists() {
        return Err(PipelineError::MissingFile(path.to_string()));
    }

    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result?;
        rows.push(record);
    }

    debug!(path, rows = rows.len(), "Loaded CSV");
    Ok(rows)
}

/// Loads the raw agency export.
pub fn load_raw_transit(path: &str) -> Result<Vec<RawTransitRecord>> {
    load_csv(path)
}

/// Loads a cleaned transit table written by the cleaning stage.
pub fn load_transit(path: &str) -> Result<Vec<TransitRecord>> {
    load_csv(path)
}

/// Loads the daily weather export.
pub fn load_weather(path: &str) -> Result<Vec<WeatherRecord>> {
    load_csv(path)
}

/// Loads a merged table written by the join stage.
pub fn load_merged(path: &str) -> Result<Vec<MergedRecord>> {
    load_csv(path)
}
