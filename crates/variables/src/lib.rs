//! Typed weather variable model.
//!
//! Variables are tagged identifiers in three orthogonal families (surface,
//! pressure-level, height-level), each split into raw archive variables and
//! derived variables computed from raw reads. Every raw variable carries
//! its storage key, compression scale factor, interpolation semantics, unit
//! and mixing flags; derived variables declare their prerequisites in the
//! reader's derivation engine.
//!
//! Alias spellings (`windspeed_10m`/`wind_speed_10m`, `cloudcover`/
//! `cloud_cover`, `dewpoint_2m`/`dew_point_2m`) resolve to one canonical
//! tag at parse time; everything downstream sees only canonical tags.

pub mod derived;
pub mod height;
pub mod parse;
pub mod pressure;
pub mod surface;

pub use derived::{PressureDerived, PressureDerivedVariable, SurfaceDerived};
pub use height::{HeightLevel, HeightVariable, HeightVariableType};
pub use pressure::{PressureVariable, PressureVariableType};
pub use surface::SurfaceVariable;

use meteo_common::{InterpolationKind, Unit};

/// Attributes every raw archive variable carries.
pub trait VariableAttributes {
    /// Stable snake_case file-name fragment.
    fn storage_key(&self) -> String;

    /// Float-to-int16 compression factor used at ingest.
    fn scalefactor(&self) -> f32;

    /// How native-step samples map onto other resolutions.
    fn interpolation(&self) -> InterpolationKind;

    /// Unit after the read-side transform.
    fn unit(&self) -> Unit;

    /// Multiply-add applied after decoding, before interpolation
    /// (pascal to hectopascal, geopotential to geopotential height).
    fn transform(&self) -> Option<(f32, f32)> {
        None
    }

    /// Whether the lapse-rate elevation correction applies. True only for
    /// temperature-like Celsius variables.
    fn is_elevation_correctable(&self) -> bool {
        false
    }

    /// Whether mixing across model boundaries must splice the series with
    /// an additive offset. True for cumulative processes such as soil
    /// moisture buckets and snow depth.
    fn requires_offset_correction_for_mixing(&self) -> bool {
        false
    }
}

/// Any raw archive variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawVariable {
    Surface(SurfaceVariable),
    Pressure(PressureVariable),
    Height(HeightVariable),
}

impl VariableAttributes for RawVariable {
    fn storage_key(&self) -> String {
        match self {
            Self::Surface(v) => v.storage_key(),
            Self::Pressure(v) => v.storage_key(),
            Self::Height(v) => v.storage_key(),
        }
    }

    fn scalefactor(&self) -> f32 {
        match self {
            Self::Surface(v) => v.scalefactor(),
            Self::Pressure(v) => v.scalefactor(),
            Self::Height(v) => v.scalefactor(),
        }
    }

    fn interpolation(&self) -> InterpolationKind {
        match self {
            Self::Surface(v) => v.interpolation(),
            Self::Pressure(v) => v.interpolation(),
            Self::Height(v) => v.interpolation(),
        }
    }

    fn unit(&self) -> Unit {
        match self {
            Self::Surface(v) => v.unit(),
            Self::Pressure(v) => v.unit(),
            Self::Height(v) => v.unit(),
        }
    }

    fn transform(&self) -> Option<(f32, f32)> {
        match self {
            Self::Surface(v) => v.transform(),
            Self::Pressure(v) => v.transform(),
            Self::Height(v) => v.transform(),
        }
    }

    fn is_elevation_correctable(&self) -> bool {
        match self {
            Self::Surface(v) => v.is_elevation_correctable(),
            Self::Pressure(_) | Self::Height(_) => false,
        }
    }

    fn requires_offset_correction_for_mixing(&self) -> bool {
        match self {
            Self::Surface(v) => v.requires_offset_correction_for_mixing(),
            Self::Pressure(_) | Self::Height(_) => false,
        }
    }
}

impl From<SurfaceVariable> for RawVariable {
    fn from(v: SurfaceVariable) -> Self {
        Self::Surface(v)
    }
}

impl From<PressureVariable> for RawVariable {
    fn from(v: PressureVariable) -> Self {
        Self::Pressure(v)
    }
}

impl From<HeightVariable> for RawVariable {
    fn from(v: HeightVariable) -> Self {
        Self::Height(v)
    }
}

/// Any requestable variable, raw or derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variable {
    Raw(RawVariable),
    SurfaceDerived(SurfaceDerived),
    PressureDerived(PressureDerivedVariable),
}

impl Variable {
    /// Unit of the served series.
    pub fn unit(&self) -> Unit {
        match self {
            Self::Raw(v) => v.unit(),
            Self::SurfaceDerived(v) => v.unit(),
            Self::PressureDerived(v) => v.unit(),
        }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw(v) => f.write_str(&v.storage_key()),
            Self::SurfaceDerived(v) => write!(f, "{:?}", v),
            Self::PressureDerived(v) => write!(f, "{:?}_{}hPa", v.variable, v.level),
        }
    }
}

impl From<RawVariable> for Variable {
    fn from(v: RawVariable) -> Self {
        Self::Raw(v)
    }
}

impl From<SurfaceVariable> for Variable {
    fn from(v: SurfaceVariable) -> Self {
        Self::Raw(RawVariable::Surface(v))
    }
}

impl From<PressureVariable> for Variable {
    fn from(v: PressureVariable) -> Self {
        Self::Raw(RawVariable::Pressure(v))
    }
}

impl From<HeightVariable> for Variable {
    fn from(v: HeightVariable) -> Self {
        Self::Raw(RawVariable::Height(v))
    }
}

impl From<SurfaceDerived> for Variable {
    fn from(v: SurfaceDerived) -> Self {
        Self::SurfaceDerived(v)
    }
}

impl From<PressureDerivedVariable> for Variable {
    fn from(v: PressureDerivedVariable) -> Self {
        Self::PressureDerived(v)
    }
}
