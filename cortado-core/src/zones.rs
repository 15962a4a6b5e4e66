//! Zone classification for session gating.
//!
//! Zones describe where the platform will open a table session: the
//! terrace, the main floor, a roped-off event area. A point may sit in
//! several overlapping zones at once; this module reports all of them
//! and leaves overlap resolution (zone priority, etc.) to the caller.

use cortado_model::{SpatialPoint, ZoneId};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo;

/// Geometric footprint of a zone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ZoneShape {
    Circle {
        center: SpatialPoint,
        radius_m: f64,
    },
    /// Ordered vertex ring; at least 3 vertices.
    Polygon { vertices: Vec<SpatialPoint> },
}

/// Zone lifecycle status, owned by the external store.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ZoneStatus {
    Active,
    Inactive,
}

/// Operational settings attached to a zone.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ZoneSettings {
    /// Whether the zone currently admits new table sessions.
    pub accepts_new_sessions: bool,
}

/// Read-only snapshot of one zone definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub shape: ZoneShape,
    pub status: ZoneStatus,
    pub settings: ZoneSettings,
}

impl Zone {
    /// Cheap pre-geometry eligibility check.
    fn is_open(&self) -> bool {
        self.status == ZoneStatus::Active && self.settings.accepts_new_sessions
    }

    /// Geometric containment test for this zone's shape.
    pub fn contains(&self, point: SpatialPoint) -> Result<bool> {
        match &self.shape {
            ZoneShape::Circle { center, radius_m } => {
                Ok(geo::inside_circle(point, *center, *radius_m))
            }
            ZoneShape::Polygon { vertices } => geo::inside_polygon(point, vertices),
        }
    }

    /// Representative point used for nearest-zone queries: the circle
    /// center, or the polygon vertex centroid.
    pub fn anchor(&self) -> Result<SpatialPoint> {
        match &self.shape {
            ZoneShape::Circle { center, .. } => Ok(*center),
            ZoneShape::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(crate::error::DispatchError::DegeneratePolygon {
                        vertices: vertices.len(),
                    });
                }
                let n = vertices.len() as f64;
                let lat = vertices.iter().map(|v| v.latitude()).sum::<f64>() / n;
                let lon = vertices.iter().map(|v| v.longitude()).sum::<f64>() / n;
                Ok(SpatialPoint::new(lat, lon)?)
            }
        }
    }
}

/// All open zones containing `point`. Inactive zones and zones closed
/// to new sessions are rejected before any geometry runs.
pub fn classify<'a>(point: SpatialPoint, zones: &'a [Zone]) -> Result<Vec<&'a Zone>> {
    let mut containing = Vec::new();
    for zone in zones.iter().filter(|z| z.is_open()) {
        if zone.contains(point)? {
            containing.push(zone);
        }
    }
    Ok(containing)
}

/// The nearest open zone whose anchor lies within `max_distance_m` of
/// `point`, if any.
pub fn nearest<'a>(
    point: SpatialPoint,
    zones: &'a [Zone],
    max_distance_m: f64,
) -> Result<Option<&'a Zone>> {
    let mut best: Option<(&Zone, f64)> = None;
    for zone in zones.iter().filter(|z| z.is_open()) {
        let d = geo::distance_m(point, zone.anchor()?);
        if d > max_distance_m {
            continue;
        }
        match best {
            Some((_, best_d)) if best_d <= d => {}
            _ => best = Some((zone, d)),
        }
    }
    Ok(best.map(|(zone, _)| zone))
}
