//! Raw height-level variables (fixed metres above ground).

use meteo_common::{InterpolationKind, Unit};

use crate::VariableAttributes;

/// Heights above ground the archive stores wind and temperature at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeightLevel {
    M80,
    M120,
    M180,
}

impl HeightLevel {
    pub fn metres(&self) -> u32 {
        match self {
            Self::M80 => 80,
            Self::M120 => 120,
            Self::M180 => 180,
        }
    }
}

/// What is stored per height level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeightVariableType {
    WindU,
    WindV,
    Temperature,
}

/// A raw variable at a fixed height above ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeightVariable {
    pub variable: HeightVariableType,
    pub level: HeightLevel,
}

impl HeightVariable {
    pub fn new(variable: HeightVariableType, level: HeightLevel) -> Self {
        Self { variable, level }
    }
}

impl VariableAttributes for HeightVariable {
    fn storage_key(&self) -> String {
        let base = match self.variable {
            HeightVariableType::WindU => "wind_u_component",
            HeightVariableType::WindV => "wind_v_component",
            HeightVariableType::Temperature => "temperature",
        };
        format!("{}_{}m", base, self.level.metres())
    }

    fn scalefactor(&self) -> f32 {
        match self.variable {
            HeightVariableType::WindU | HeightVariableType::WindV => 10.0,
            HeightVariableType::Temperature => 20.0,
        }
    }

    fn interpolation(&self) -> InterpolationKind {
        InterpolationKind::hermite()
    }

    fn unit(&self) -> Unit {
        match self.variable {
            HeightVariableType::WindU | HeightVariableType::WindV => Unit::MetresPerSecond,
            HeightVariableType::Temperature => Unit::Celsius,
        }
    }
}
