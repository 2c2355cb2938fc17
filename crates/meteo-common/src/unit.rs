//! Physical units attached to read results.

use serde::{Deserialize, Serialize};

/// SI-leaning unit of a returned value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Celsius,
    Percent,
    MetresPerSecond,
    Millimetre,
    Centimetre,
    Metre,
    HectoPascal,
    KiloPascal,
    WattPerSquareMetre,
    /// Direction in degrees clockwise from north, [0, 360).
    DegreeDirection,
    JoulePerKilogram,
    Seconds,
    Dimensionless,
    /// WMO weather interpretation code.
    WmoCode,
    /// Volumetric soil moisture.
    CubicMetrePerCubicMetre,
}

impl Unit {
    /// Short label used in responses and logs.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Percent => "%",
            Self::MetresPerSecond => "m/s",
            Self::Millimetre => "mm",
            Self::Centimetre => "cm",
            Self::Metre => "m",
            Self::HectoPascal => "hPa",
            Self::KiloPascal => "kPa",
            Self::WattPerSquareMetre => "W/m²",
            Self::DegreeDirection => "°",
            Self::JoulePerKilogram => "J/kg",
            Self::Seconds => "s",
            Self::Dimensionless => "",
            Self::WmoCode => "wmo code",
            Self::CubicMetrePerCubicMetre => "m³/m³",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}
