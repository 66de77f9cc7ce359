//! Nearest-entrance matching.
//!
//! Distances use a local planar approximation with a longitude correction
//! fixed at 0.6. The constant stands in for cos(latitude) across the target
//! region's latitude band; this is not a general geodesic formula.

use crate::models::{Entrance, MatchResult};

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Fixed longitude scale for the target latitude band.
const LON_SCALE: f64 = 0.6;

/// Planar distance in meters between two coordinates.
pub fn planar_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat1 - lat2) * METERS_PER_DEGREE;
    let d_lon = (lon1 - lon2) * METERS_PER_DEGREE * LON_SCALE;
    (d_lat * d_lat + d_lon * d_lon).sqrt()
}

/// Find the entrance closest to the reference coordinate.
///
/// Returns `None` when the entrance list is empty or the minimum distance is
/// not strictly below `max_distance_m`. Ties keep the first entrance in
/// input order.
pub fn nearest(
    ref_lat: f64,
    ref_lon: f64,
    entrances: &[Entrance],
    max_distance_m: f64,
) -> Option<MatchResult> {
    let mut best: Option<MatchResult> = None;

    for entrance in entrances {
        let distance_m = planar_distance_m(ref_lat, ref_lon, entrance.lat, entrance.lon);
        let closer = match &best {
            Some(current) => distance_m < current.distance_m,
            None => true,
        };
        if closer {
            best = Some(MatchResult {
                entrance: entrance.clone(),
                distance_m,
            });
        }
    }

    best.filter(|m| m.distance_m < max_distance_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REF_LAT: f64 = 55.7558;
    const REF_LON: f64 = 37.6173;

    fn entrance(porch: &str, lat: f64, lon: f64) -> Entrance {
        Entrance {
            porch: porch.to_string(),
            lat,
            lon,
            azimuth: None,
        }
    }

    /// Entrance displaced north by the given planar distance.
    fn displaced(porch: &str, meters: f64) -> Entrance {
        entrance(porch, REF_LAT + meters / METERS_PER_DEGREE, REF_LON)
    }

    #[test]
    fn empty_list_yields_no_match() {
        assert!(nearest(REF_LAT, REF_LON, &[], 200.0).is_none());
    }

    #[test]
    fn entrance_inside_threshold_is_accepted() {
        let entrances = vec![displaced("1", 199.0)];
        let result = nearest(REF_LAT, REF_LON, &entrances, 200.0).unwrap();
        assert_eq!(result.entrance.porch, "1");
        assert!((result.distance_m - 199.0).abs() < 0.5);
    }

    #[test]
    fn entrance_outside_threshold_is_rejected() {
        let entrances = vec![displaced("1", 201.0)];
        assert!(nearest(REF_LAT, REF_LON, &entrances, 200.0).is_none());
    }

    #[test]
    fn closest_of_several_wins() {
        let entrances = vec![
            displaced("far", 150.0),
            displaced("near", 30.0),
            displaced("mid", 90.0),
        ];
        let result = nearest(REF_LAT, REF_LON, &entrances, 200.0).unwrap();
        assert_eq!(result.entrance.porch, "near");
    }

    #[test]
    fn equal_distances_keep_first_in_input_order() {
        let offset = 50.0 / METERS_PER_DEGREE;
        let entrances = vec![
            entrance("north", REF_LAT + offset, REF_LON),
            entrance("south", REF_LAT - offset, REF_LON),
        ];
        let result = nearest(REF_LAT, REF_LON, &entrances, 200.0).unwrap();
        assert_eq!(result.entrance.porch, "north");
    }

    #[test]
    fn longitude_distances_use_the_fixed_scale() {
        // One longitude degree counts 0.6 of a latitude degree.
        let d = planar_distance_m(55.0, 37.0, 55.0, 37.001);
        assert!((d - 111_000.0 * 0.001 * 0.6).abs() < 1e-6);
    }
}
