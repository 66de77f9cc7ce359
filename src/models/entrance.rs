//! Building-entrance data structures.

use serde::{Deserialize, Serialize};

/// A building entrance extracted from the mapping service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrance {
    /// Porch label: the entrance name when the service provides one,
    /// otherwise a synthetic sequential label.
    pub porch: String,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lon: f64,

    /// Compass bearing the entrance faces, in degrees. Absent when the
    /// service does not report one; never defaulted to 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azimuth: Option<f64>,
}

impl Entrance {
    /// Identity key used for deduplication: the porch label when the service
    /// named the entrance, otherwise the coordinate pair.
    pub fn dedup_key(name: Option<&str>, lat: f64, lon: f64) -> String {
        match name {
            Some(n) if !n.trim().is_empty() => format!("name:{}", n.trim()),
            _ => format!("coord:{lat:.7}:{lon:.7}"),
        }
    }
}

/// An entrance paired with its distance from a reference coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub entrance: Entrance,

    /// Distance from the reference coordinate in meters, via the local
    /// planar approximation.
    pub distance_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_prefers_name() {
        let by_name = Entrance::dedup_key(Some("2"), 55.0, 37.0);
        let by_coord = Entrance::dedup_key(None, 55.0, 37.0);
        assert!(by_name.starts_with("name:"));
        assert!(by_coord.starts_with("coord:"));
        assert_ne!(by_name, by_coord);
    }

    #[test]
    fn dedup_key_blank_name_falls_back_to_coordinates() {
        assert_eq!(
            Entrance::dedup_key(Some("   "), 55.0, 37.0),
            Entrance::dedup_key(None, 55.0, 37.0)
        );
    }
}
