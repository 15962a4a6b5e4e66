use crate::error::{ModelError, Result};

/// A validated WGS84 coordinate pair.
///
/// Construction is the validation boundary: a `SpatialPoint` always
/// holds finite values with latitude in `[-90, 90]` and longitude in
/// `[-180, 180]`, so downstream geometry never re-checks.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpatialPoint {
    latitude: f64,
    longitude: f64,
}

impl SpatialPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let finite = latitude.is_finite() && longitude.is_finite();
        let in_range =
            (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        if !finite || !in_range {
            return Err(ModelError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for SpatialPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}
