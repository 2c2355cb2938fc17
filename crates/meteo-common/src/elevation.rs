//! Surface elevation as stored in a domain's static terrain file.

use serde::{Deserialize, Serialize};

/// Sentinel written by the ingest pipeline for grid points over sea.
pub const SEA_SENTINEL: f32 = -999.0;

/// Elevation of a grid point or a request target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Elevation {
    /// Terrain height in metres above sea level.
    Metres(f32),
    /// Open water.
    Sea,
    /// No static terrain file, or the point is missing from it.
    NoData,
}

impl Elevation {
    /// Decode the value read from a static terrain file.
    pub fn from_static_value(value: f32) -> Self {
        if value.is_nan() {
            Self::NoData
        } else if value <= SEA_SENTINEL {
            Self::Sea
        } else {
            Self::Metres(value)
        }
    }

    /// The value written into a static terrain file.
    pub fn to_static_value(&self) -> f32 {
        match self {
            Self::Metres(m) => *m,
            Self::Sea => SEA_SENTINEL,
            Self::NoData => f32::NAN,
        }
    }

    /// Height in metres, treating sea as 0. `None` when unknown.
    pub fn metres(&self) -> Option<f32> {
        match self {
            Self::Metres(m) => Some(*m),
            Self::Sea => Some(0.0),
            Self::NoData => None,
        }
    }

    /// Whether this point is open water.
    pub fn is_sea(&self) -> bool {
        matches!(self, Self::Sea)
    }
}
