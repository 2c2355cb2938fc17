//! Request-name parsing and alias resolution.
//!
//! Historic spellings without underscores (`windspeed_10m`, `cloudcover`,
//! `dewpoint_2m`) stay accepted and resolve to the same canonical tag as
//! the modern names. The core never sees an alias.

use crate::derived::{PressureDerived, PressureDerivedVariable, SurfaceDerived};
use crate::height::{HeightLevel, HeightVariable, HeightVariableType};
use crate::pressure::{PressureVariable, PressureVariableType};
use crate::surface::SurfaceVariable;
use crate::{RawVariable, Variable};

impl Variable {
    /// Parse a request-facing variable name, including alias spellings.
    pub fn parse(name: &str) -> Option<Variable> {
        let canonical = canonicalize(name);
        let name = canonical.as_str();

        if let Some((base, level)) = split_pressure_level(name) {
            return parse_pressure(base, level);
        }

        let surface = match name {
            "temperature_2m" => SurfaceVariable::Temperature2m.into(),
            "relative_humidity_2m" => SurfaceVariable::RelativeHumidity2m.into(),
            "pressure_msl" => SurfaceVariable::PressureMsl.into(),
            "wind_u_component_10m" => SurfaceVariable::WindU10m.into(),
            "wind_v_component_10m" => SurfaceVariable::WindV10m.into(),
            "wind_gusts_10m" => SurfaceVariable::WindGusts10m.into(),
            "cloud_cover" => SurfaceVariable::CloudCover.into(),
            "cloud_cover_low" => SurfaceVariable::CloudCoverLow.into(),
            "cloud_cover_mid" => SurfaceVariable::CloudCoverMid.into(),
            "cloud_cover_high" => SurfaceVariable::CloudCoverHigh.into(),
            "precipitation" => SurfaceVariable::Precipitation.into(),
            "snowfall_water_equivalent" => SurfaceVariable::SnowfallWaterEquivalent.into(),
            "snow_depth" => SurfaceVariable::SnowDepth.into(),
            "shortwave_radiation" => SurfaceVariable::ShortwaveRadiation.into(),
            "cape" => SurfaceVariable::Cape.into(),
            "lifted_index" => SurfaceVariable::LiftedIndex.into(),
            "visibility" => SurfaceVariable::Visibility.into(),
            "soil_moisture_0_to_7cm" => SurfaceVariable::SoilMoisture0To7cm.into(),
            "soil_temperature_0cm" => SurfaceVariable::SoilTemperature0cm.into(),

            "wind_u_component_80m" => {
                HeightVariable::new(HeightVariableType::WindU, HeightLevel::M80).into()
            }
            "wind_v_component_80m" => {
                HeightVariable::new(HeightVariableType::WindV, HeightLevel::M80).into()
            }
            "temperature_80m" => {
                HeightVariable::new(HeightVariableType::Temperature, HeightLevel::M80).into()
            }
            "temperature_120m" => {
                HeightVariable::new(HeightVariableType::Temperature, HeightLevel::M120).into()
            }

            "wind_speed_10m" => SurfaceDerived::WindSpeed10m.into(),
            "wind_direction_10m" => SurfaceDerived::WindDirection10m.into(),
            "wind_speed_80m" => SurfaceDerived::WindSpeed80m.into(),
            "wind_direction_80m" => SurfaceDerived::WindDirection80m.into(),
            "dew_point_2m" => SurfaceDerived::DewPoint2m.into(),
            "apparent_temperature" => SurfaceDerived::ApparentTemperature.into(),
            "wet_bulb_temperature_2m" => SurfaceDerived::WetBulbTemperature2m.into(),
            "surface_pressure" => SurfaceDerived::SurfacePressure.into(),
            "vapour_pressure_deficit" | "vapor_pressure_deficit" => {
                SurfaceDerived::VapourPressureDeficit.into()
            }
            "rain" => SurfaceDerived::Rain.into(),
            "snowfall" => SurfaceDerived::Snowfall.into(),
            "showers" => SurfaceDerived::Showers.into(),
            "direct_radiation" => SurfaceDerived::DirectRadiation.into(),
            "diffuse_radiation" => SurfaceDerived::DiffuseRadiation.into(),
            "direct_normal_irradiance" => SurfaceDerived::DirectNormalIrradiance.into(),
            "et0_fao_evapotranspiration" => SurfaceDerived::Et0FaoEvapotranspiration.into(),
            "weather_code" => SurfaceDerived::WeatherCode.into(),
            "precipitation_probability" => SurfaceDerived::PrecipitationProbability.into(),
            _ => return None,
        };
        Some(surface)
    }
}

/// Expand underscore-less alias prefixes to the canonical spelling.
fn canonicalize(name: &str) -> String {
    for (alias, canonical) in [
        ("windspeed", "wind_speed"),
        ("winddirection", "wind_direction"),
        ("windgusts", "wind_gusts"),
        ("dewpoint", "dew_point"),
        ("cloudcover", "cloud_cover"),
        ("weathercode", "weather_code"),
        ("relativehumidity", "relative_humidity"),
        ("soilmoisture", "soil_moisture"),
        ("soiltemperature", "soil_temperature"),
    ] {
        if let Some(rest) = name.strip_prefix(alias) {
            return format!("{}{}", canonical, rest);
        }
    }
    name.to_string()
}

/// Split `temperature_850hPa` into (`temperature`, 850).
fn split_pressure_level(name: &str) -> Option<(&str, i32)> {
    let stripped = name.strip_suffix("hPa")?;
    let underscore = stripped.rfind('_')?;
    let level: i32 = stripped[underscore + 1..].parse().ok()?;
    Some((&stripped[..underscore], level))
}

fn parse_pressure(base: &str, level: i32) -> Option<Variable> {
    let raw = |v: PressureVariableType| -> Variable {
        Variable::Raw(RawVariable::Pressure(PressureVariable::new(v, level)))
    };
    let derived = |v: PressureDerived| -> Variable {
        Variable::PressureDerived(PressureDerivedVariable::new(v, level))
    };

    Some(match base {
        "temperature" => raw(PressureVariableType::Temperature),
        "relative_humidity" => raw(PressureVariableType::RelativeHumidity),
        "wind_u_component" => raw(PressureVariableType::WindU),
        "wind_v_component" => raw(PressureVariableType::WindV),
        "geopotential_height" => raw(PressureVariableType::Geopotential),
        "wind_speed" => derived(PressureDerived::WindSpeed),
        "wind_direction" => derived(PressureDerived::WindDirection),
        "dew_point" => derived(PressureDerived::DewPoint),
        "cloud_cover" => derived(PressureDerived::CloudCover),
        _ => return None,
    })
}
