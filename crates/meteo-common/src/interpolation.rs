//! Per-variable interpolation semantics.
//!
//! Each raw variable declares how a native-resolution sequence is converted
//! to the requested resolution. The kind drives both the time-range
//! expansion (how many extra native samples to read on each side) and the
//! resampling arithmetic itself.

use serde::{Deserialize, Serialize};

/// How a variable's native-dt sequence maps onto a requested dt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InterpolationKind {
    /// Linear between bracketing samples.
    Linear,
    /// Linear on the 0–360° circle with the shortest-arc rule. Used for
    /// wind and wave directions.
    LinearDegrees,
    /// Cubic Hermite over four consecutive samples, optionally clamped to
    /// physical bounds (e.g. 0–100 for relative humidity).
    Hermite {
        bounds: Option<(f32, f32)>,
    },
    /// Samples are backward averages over the native step; disaggregate via
    /// the solar-zenith integral and re-integrate over the requested window.
    SolarBackwardsAveraged,
    /// As `SolarBackwardsAveraged`, but gaps are instantaneous rather than
    /// averaged (sub-hourly satellite radiation archives).
    SolarBackwardsMissingNotAveraged,
    /// Each native-dt sample is a sum over the preceding step: distribute
    /// uniformly when refining, add member steps when coarsening.
    BackwardsSum,
    /// Each native-dt sample covers the preceding step: replicate into every
    /// sub-step.
    Backwards,
}

impl InterpolationKind {
    /// Cubic Hermite clamped to a plausible range.
    pub const fn hermite_bounded(min: f32, max: f32) -> Self {
        Self::Hermite {
            bounds: Some((min, max)),
        }
    }

    /// Unbounded cubic Hermite.
    pub const fn hermite() -> Self {
        Self::Hermite { bounds: None }
    }

    /// Left/right sample count of the interpolation kernel.
    pub fn padding(&self) -> i64 {
        match self {
            Self::Linear | Self::LinearDegrees => 1,
            Self::Hermite { .. } => 2,
            Self::SolarBackwardsAveraged | Self::SolarBackwardsMissingNotAveraged => 2,
            Self::BackwardsSum | Self::Backwards => 1,
        }
    }

    /// Whether a sample describes the preceding interval rather than the
    /// instant. These kinds aggregate by extending the window backwards.
    pub fn is_backwards(&self) -> bool {
        matches!(
            self,
            Self::SolarBackwardsAveraged
                | Self::SolarBackwardsMissingNotAveraged
                | Self::BackwardsSum
                | Self::Backwards
        )
    }
}
