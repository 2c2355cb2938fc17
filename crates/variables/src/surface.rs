//! Raw surface-level variables.

use meteo_common::{InterpolationKind, Unit};

use crate::VariableAttributes;

/// Raw single-level variables as stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceVariable {
    Temperature2m,
    RelativeHumidity2m,
    DewPoint2m,
    /// Mean sea level pressure, stored in pascal.
    PressureMsl,
    WindU10m,
    WindV10m,
    WindGusts10m,
    CloudCover,
    CloudCoverLow,
    CloudCoverMid,
    CloudCoverHigh,
    /// Total precipitation per native step, millimetres.
    Precipitation,
    /// Convective precipitation per native step, millimetres.
    Showers,
    /// Snowfall water equivalent per native step, millimetres.
    SnowfallWaterEquivalent,
    /// Freezing rain categorical rate, millimetres per native step.
    FreezingRain,
    /// Snow pack depth, metres. Cumulative bucket.
    SnowDepth,
    ShortwaveRadiation,
    DirectRadiation,
    DiffuseRadiation,
    Cape,
    LiftedIndex,
    Visibility,
    /// Volumetric soil moisture 0-7 cm. Cumulative bucket.
    SoilMoisture0To7cm,
    SoilTemperature0cm,
    /// Producer-supplied WMO weather code, where the model emits one.
    WeatherCode,
}

impl VariableAttributes for SurfaceVariable {
    fn storage_key(&self) -> String {
        match self {
            Self::Temperature2m => "temperature_2m",
            Self::RelativeHumidity2m => "relative_humidity_2m",
            Self::DewPoint2m => "dew_point_2m",
            Self::PressureMsl => "pressure_msl",
            Self::WindU10m => "wind_u_component_10m",
            Self::WindV10m => "wind_v_component_10m",
            Self::WindGusts10m => "wind_gusts_10m",
            Self::CloudCover => "cloud_cover",
            Self::CloudCoverLow => "cloud_cover_low",
            Self::CloudCoverMid => "cloud_cover_mid",
            Self::CloudCoverHigh => "cloud_cover_high",
            Self::Precipitation => "precipitation",
            Self::Showers => "showers",
            Self::SnowfallWaterEquivalent => "snowfall_water_equivalent",
            Self::FreezingRain => "freezing_rain",
            Self::SnowDepth => "snow_depth",
            Self::ShortwaveRadiation => "shortwave_radiation",
            Self::DirectRadiation => "direct_radiation",
            Self::DiffuseRadiation => "diffuse_radiation",
            Self::Cape => "cape",
            Self::LiftedIndex => "lifted_index",
            Self::Visibility => "visibility",
            Self::SoilMoisture0To7cm => "soil_moisture_0_to_7cm",
            Self::SoilTemperature0cm => "soil_temperature_0cm",
            Self::WeatherCode => "weather_code",
        }
        .to_string()
    }

    fn scalefactor(&self) -> f32 {
        match self {
            Self::Temperature2m | Self::DewPoint2m | Self::SoilTemperature0cm => 20.0,
            Self::RelativeHumidity2m => 1.0,
            // Stored in pascal; 0.1 Pa resolution is enough after /100.
            Self::PressureMsl => 0.1,
            Self::WindU10m | Self::WindV10m | Self::WindGusts10m => 10.0,
            Self::CloudCover | Self::CloudCoverLow | Self::CloudCoverMid | Self::CloudCoverHigh => 1.0,
            Self::Precipitation | Self::Showers | Self::SnowfallWaterEquivalent | Self::FreezingRain => 10.0,
            Self::SnowDepth => 100.0,
            Self::ShortwaveRadiation | Self::DirectRadiation | Self::DiffuseRadiation => 1.0,
            Self::Cape => 0.1,
            Self::LiftedIndex => 10.0,
            Self::Visibility => 0.05,
            Self::SoilMoisture0To7cm => 1000.0,
            Self::WeatherCode => 1.0,
        }
    }

    fn interpolation(&self) -> InterpolationKind {
        match self {
            Self::Temperature2m | Self::DewPoint2m | Self::SoilTemperature0cm => {
                InterpolationKind::hermite()
            }
            Self::RelativeHumidity2m => InterpolationKind::hermite_bounded(0.0, 100.0),
            Self::PressureMsl => InterpolationKind::hermite(),
            Self::WindU10m | Self::WindV10m | Self::WindGusts10m => InterpolationKind::hermite(),
            Self::CloudCover | Self::CloudCoverLow | Self::CloudCoverMid | Self::CloudCoverHigh => {
                InterpolationKind::hermite_bounded(0.0, 100.0)
            }
            Self::Precipitation
            | Self::Showers
            | Self::SnowfallWaterEquivalent
            | Self::FreezingRain => InterpolationKind::BackwardsSum,
            Self::SnowDepth => InterpolationKind::Linear,
            Self::ShortwaveRadiation | Self::DirectRadiation | Self::DiffuseRadiation => {
                InterpolationKind::SolarBackwardsAveraged
            }
            Self::Cape => InterpolationKind::hermite_bounded(0.0, f32::MAX),
            Self::LiftedIndex => InterpolationKind::hermite(),
            Self::Visibility => InterpolationKind::Linear,
            Self::SoilMoisture0To7cm => InterpolationKind::hermite_bounded(0.0, 10.0),
            Self::WeatherCode => InterpolationKind::Backwards,
        }
    }

    fn unit(&self) -> Unit {
        match self {
            Self::Temperature2m | Self::DewPoint2m | Self::SoilTemperature0cm => Unit::Celsius,
            Self::RelativeHumidity2m => Unit::Percent,
            Self::PressureMsl => Unit::HectoPascal,
            Self::WindU10m | Self::WindV10m | Self::WindGusts10m => Unit::MetresPerSecond,
            Self::CloudCover | Self::CloudCoverLow | Self::CloudCoverMid | Self::CloudCoverHigh => {
                Unit::Percent
            }
            Self::Precipitation
            | Self::Showers
            | Self::SnowfallWaterEquivalent
            | Self::FreezingRain => Unit::Millimetre,
            Self::SnowDepth => Unit::Metre,
            Self::ShortwaveRadiation | Self::DirectRadiation | Self::DiffuseRadiation => {
                Unit::WattPerSquareMetre
            }
            Self::Cape => Unit::JoulePerKilogram,
            Self::LiftedIndex => Unit::Dimensionless,
            Self::Visibility => Unit::Metre,
            Self::SoilMoisture0To7cm => Unit::CubicMetrePerCubicMetre,
            Self::WeatherCode => Unit::WmoCode,
        }
    }

    fn transform(&self) -> Option<(f32, f32)> {
        match self {
            // Pascal to hectopascal.
            Self::PressureMsl => Some((0.01, 0.0)),
            _ => None,
        }
    }

    fn is_elevation_correctable(&self) -> bool {
        matches!(self, Self::Temperature2m | Self::DewPoint2m)
    }

    fn requires_offset_correction_for_mixing(&self) -> bool {
        matches!(self, Self::SnowDepth | Self::SoilMoisture0To7cm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_correctable_only_for_celsius() {
        for v in [
            SurfaceVariable::Temperature2m,
            SurfaceVariable::DewPoint2m,
            SurfaceVariable::Precipitation,
            SurfaceVariable::WindU10m,
            SurfaceVariable::PressureMsl,
        ] {
            if v.is_elevation_correctable() {
                assert_eq!(v.unit(), Unit::Celsius, "{:?}", v);
            }
        }
    }

    #[test]
    fn test_cumulative_buckets_need_offset_correction() {
        assert!(SurfaceVariable::SnowDepth.requires_offset_correction_for_mixing());
        assert!(SurfaceVariable::SoilMoisture0To7cm.requires_offset_correction_for_mixing());
        assert!(!SurfaceVariable::Precipitation.requires_offset_correction_for_mixing());
    }

    #[test]
    fn test_pressure_is_served_in_hectopascal() {
        assert_eq!(SurfaceVariable::PressureMsl.unit(), Unit::HectoPascal);
        assert_eq!(SurfaceVariable::PressureMsl.transform(), Some((0.01, 0.0)));
    }
}
