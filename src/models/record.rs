//! Input rows and output records.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One row of the delimited input file.
///
/// Several rows may carry the same address; the retrieval result is fetched
/// once per address and shared across them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRow {
    /// Opaque row identifier
    pub id: String,

    /// Search string handed to the mapping service
    pub address: String,

    /// Reference latitude, when known
    #[serde(default)]
    pub lat: Option<String>,

    /// Reference longitude, when known
    #[serde(default)]
    pub lon: Option<String>,

    /// Sub-unit label carried through to the output
    #[serde(default)]
    pub porch: Option<String>,
}

impl AddressRow {
    /// A bare-address row with a synthesized identifier.
    pub fn bare(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            lat: None,
            lon: None,
            porch: None,
        }
    }

    /// Reference coordinates, when both fields are present and parseable.
    pub fn ref_coords(&self) -> Option<(f64, f64)> {
        let lat = parse_coord(self.lat.as_deref()?)?;
        let lon = parse_coord(self.lon.as_deref()?)?;
        Some((lat, lon))
    }

    /// Load rows from a delimited input file.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| AppError::config(format!("cannot read input file {path:?}: {e}")))?;

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        if rows.is_empty() {
            return Err(AppError::config(format!("input file {path:?} has no rows")));
        }
        Ok(rows)
    }

    /// Load bare addresses from a newline-delimited list, synthesizing row
    /// identifiers from line numbers.
    pub fn load_list(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read address list {path:?}: {e}")))?;

        let rows: Vec<Self> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, address)| Self::bare((i + 1).to_string(), address))
            .collect();

        if rows.is_empty() {
            return Err(AppError::config(format!(
                "address list {path:?} has no addresses"
            )));
        }
        Ok(rows)
    }
}

/// Parse a coordinate accepting either `.` or `,` as decimal separator.
pub fn parse_coord(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse().ok()
}

/// A resolved entrance row written to the success file.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessRecord {
    pub id: String,
    pub address: String,
    pub porch: String,
    pub lat: f64,
    pub lon: f64,
    pub azimuth: Option<f64>,
    pub source: String,
}

/// A per-row failure written to the failure file.
///
/// Carries everything needed for offline diagnosis: the constructed search
/// URL, the URL the service resolved to, and the raw parsed embedded
/// document when one was obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    pub id: String,
    pub address: String,
    pub search_url: String,
    pub result_url: String,
    pub raw_document: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}
