//! Derived variable tags.
//!
//! These identify computations over raw reads; the dependency tables and
//! compute functions live in the reader's derivation engine. Tags carry
//! only what the computation is parameterized by (height level, pressure
//! level, panel geometry).

use meteo_common::Unit;

/// Derived single-level variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceDerived {
    WindSpeed10m,
    WindDirection10m,
    WindSpeed80m,
    WindDirection80m,
    DewPoint2m,
    ApparentTemperature,
    WetBulbTemperature2m,
    /// Station pressure reduced from mean sea level pressure.
    SurfacePressure,
    VapourPressureDeficit,
    Rain,
    Snowfall,
    Showers,
    DirectRadiation,
    DiffuseRadiation,
    DirectNormalIrradiance,
    /// Hay-Davies transposition onto a tilted panel.
    GlobalTiltedIrradiance {
        /// Panel tilt from horizontal, degrees.
        tilt: f32,
        /// Panel azimuth, degrees clockwise from north.
        azimuth: f32,
    },
    Et0FaoEvapotranspiration,
    WeatherCode,
    /// Share of ensemble members with measurable precipitation.
    PrecipitationProbability,
}

impl SurfaceDerived {
    pub fn unit(&self) -> Unit {
        match self {
            Self::WindSpeed10m | Self::WindSpeed80m => Unit::MetresPerSecond,
            Self::WindDirection10m | Self::WindDirection80m => Unit::DegreeDirection,
            Self::DewPoint2m
            | Self::ApparentTemperature
            | Self::WetBulbTemperature2m => Unit::Celsius,
            Self::SurfacePressure => Unit::HectoPascal,
            Self::VapourPressureDeficit => Unit::KiloPascal,
            Self::Rain | Self::Showers | Self::Et0FaoEvapotranspiration => Unit::Millimetre,
            Self::Snowfall => Unit::Centimetre,
            Self::DirectRadiation
            | Self::DiffuseRadiation
            | Self::DirectNormalIrradiance
            | Self::GlobalTiltedIrradiance { .. } => Unit::WattPerSquareMetre,
            Self::WeatherCode => Unit::WmoCode,
            Self::PrecipitationProbability => Unit::Percent,
        }
    }
}

/// Derived computations on an isobaric surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressureDerived {
    WindSpeed,
    WindDirection,
    DewPoint,
    /// Slingo's relative-humidity relation, for models that do not emit
    /// per-level cloud cover.
    CloudCover,
}

/// A derived computation bound to its pressure level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PressureDerivedVariable {
    pub variable: PressureDerived,
    /// Level in hectopascal.
    pub level: i32,
}

impl PressureDerivedVariable {
    pub fn new(variable: PressureDerived, level: i32) -> Self {
        Self { variable, level }
    }

    pub fn unit(&self) -> Unit {
        match self.variable {
            PressureDerived::WindSpeed => Unit::MetresPerSecond,
            PressureDerived::WindDirection => Unit::DegreeDirection,
            PressureDerived::DewPoint => Unit::Celsius,
            PressureDerived::CloudCover => Unit::Percent,
        }
    }
}
