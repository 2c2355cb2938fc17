//! Raw pressure-level variables.
//!
//! The pressure level is encoded in the storage path, so every level is its
//! own file family; the chunk sub-dimension stays free for ensemble
//! members.

use meteo_common::{InterpolationKind, Unit};

use crate::VariableAttributes;

/// Standard acceleration of gravity, for geopotential conversion.
const GRAVITY: f32 = 9.80665;

/// What is stored per pressure level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressureVariableType {
    Temperature,
    RelativeHumidity,
    WindU,
    WindV,
    /// Stored as geopotential in m²/s², served as geopotential height.
    Geopotential,
    CloudCover,
}

/// A raw variable on an isobaric surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PressureVariable {
    pub variable: PressureVariableType,
    /// Level in hectopascal.
    pub level: i32,
}

impl PressureVariable {
    pub fn new(variable: PressureVariableType, level: i32) -> Self {
        Self { variable, level }
    }
}

impl VariableAttributes for PressureVariable {
    fn storage_key(&self) -> String {
        let base = match self.variable {
            PressureVariableType::Temperature => "temperature",
            PressureVariableType::RelativeHumidity => "relative_humidity",
            PressureVariableType::WindU => "wind_u_component",
            PressureVariableType::WindV => "wind_v_component",
            PressureVariableType::Geopotential => "geopotential_height",
            PressureVariableType::CloudCover => "cloud_cover",
        };
        format!("{}_{}hPa", base, self.level)
    }

    fn scalefactor(&self) -> f32 {
        match self.variable {
            PressureVariableType::Temperature => 20.0,
            PressureVariableType::RelativeHumidity => 1.0,
            PressureVariableType::WindU | PressureVariableType::WindV => 10.0,
            PressureVariableType::Geopotential => 0.1,
            PressureVariableType::CloudCover => 1.0,
        }
    }

    fn interpolation(&self) -> InterpolationKind {
        match self.variable {
            PressureVariableType::RelativeHumidity | PressureVariableType::CloudCover => {
                InterpolationKind::hermite_bounded(0.0, 100.0)
            }
            _ => InterpolationKind::hermite(),
        }
    }

    fn unit(&self) -> Unit {
        match self.variable {
            PressureVariableType::Temperature => Unit::Celsius,
            PressureVariableType::RelativeHumidity | PressureVariableType::CloudCover => {
                Unit::Percent
            }
            PressureVariableType::WindU | PressureVariableType::WindV => Unit::MetresPerSecond,
            PressureVariableType::Geopotential => Unit::Metre,
        }
    }

    fn transform(&self) -> Option<(f32, f32)> {
        match self.variable {
            // Geopotential m²/s² to geopotential height.
            PressureVariableType::Geopotential => Some((1.0 / GRAVITY, 0.0)),
            _ => None,
        }
    }
}
