//! Great-circle distance and containment primitives.
//!
//! Pure functions over validated [`SpatialPoint`] values. Coordinate
//! validation happens at the model boundary, so nothing here re-checks
//! ranges or finiteness.

use cortado_model::SpatialPoint;

use crate::error::{DispatchError, Result};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine great-circle distance between two points, in meters.
///
/// Symmetric and non-negative by construction; numerically stable from
/// sub-meter separations up to antipodal pairs.
pub fn distance_m(a: SpatialPoint, b: SpatialPoint) -> f64 {
    let dlat = (b.latitude() - a.latitude()).to_radians();
    let dlon = (b.longitude() - a.longitude()).to_radians();
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

/// Whether `point` lies within `radius_m` meters of `center`.
pub fn inside_circle(point: SpatialPoint, center: SpatialPoint, radius_m: f64) -> bool {
    distance_m(point, center) <= radius_m
}

/// Even-odd ray-casting containment test against an ordered vertex
/// ring.
///
/// Vertices are treated as a planar polygon in lon/lat space, which is
/// accurate at venue scale. Self-intersecting rings are the caller's
/// responsibility; fewer than 3 vertices is rejected.
pub fn inside_polygon(point: SpatialPoint, vertices: &[SpatialPoint]) -> Result<bool> {
    if vertices.len() < 3 {
        return Err(DispatchError::DegeneratePolygon {
            vertices: vertices.len(),
        });
    }

    let px = point.longitude();
    let py = point.latitude();
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = (vertices[i].longitude(), vertices[i].latitude());
        let (xj, yj) = (vertices[j].longitude(), vertices[j].latitude());
        let crosses = (yi > py) != (yj > py);
        if crosses && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    Ok(inside)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> SpatialPoint {
        SpatialPoint::new(lat, lon).expect("valid test point")
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let p = point(55.6761, 12.5683);
        assert_eq!(distance_m(p, p), 0.0);
    }

    #[test]
    fn distance_matches_known_city_pair() {
        // Paris <-> London is roughly 343.5 km.
        let paris = point(48.8566, 2.3522);
        let london = point(51.5074, -0.1278);
        let d = distance_m(paris, london);
        assert!((d - 343_500.0).abs() < 2_000.0, "got {d}");
    }

    #[test]
    fn distance_is_accurate_at_table_scale() {
        // 0.0001 degrees of latitude is ~11.1 m everywhere.
        let a = point(40.0, -73.0);
        let b = point(40.0001, -73.0);
        let d = distance_m(a, b);
        assert!((d - 11.1).abs() < 0.2, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(-33.8688, 151.2093);
        let b = point(35.6762, 139.6503);
        assert_eq!(distance_m(a, b), distance_m(b, a));
    }

    #[test]
    fn circle_includes_boundary_and_interior() {
        let center = point(10.0, 10.0);
        let near = point(10.00005, 10.0); // ~5.5 m north
        assert!(inside_circle(near, center, 6.0));
        assert!(inside_circle(center, center, 0.0));
        assert!(!inside_circle(near, center, 5.0));
    }

    #[test]
    fn polygon_contains_interior_point() {
        let square = [
            point(0.0, 0.0),
            point(0.0, 1.0),
            point(1.0, 1.0),
            point(1.0, 0.0),
        ];
        assert!(inside_polygon(point(0.5, 0.5), &square).unwrap());
        assert!(!inside_polygon(point(1.5, 0.5), &square).unwrap());
        assert!(!inside_polygon(point(-0.5, -0.5), &square).unwrap());
    }

    #[test]
    fn concave_polygon_excludes_the_notch() {
        // U-shaped ring; the notch between the arms is outside.
        let ring = [
            point(0.0, 0.0),
            point(3.0, 0.0),
            point(3.0, 3.0),
            point(2.0, 3.0),
            point(2.0, 1.0),
            point(1.0, 1.0),
            point(1.0, 3.0),
            point(0.0, 3.0),
        ];
        assert!(inside_polygon(point(0.5, 2.0), &ring).unwrap());
        assert!(!inside_polygon(point(1.5, 2.0), &ring).unwrap());
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let line = [point(0.0, 0.0), point(1.0, 1.0)];
        let err = inside_polygon(point(0.5, 0.5), &line).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::DegeneratePolygon { vertices: 2 }
        ));
    }
}
