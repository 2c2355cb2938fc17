//! Derived-variable engine.
//!
//! Each derived variable declares its direct prerequisites; prefetching
//! recurses through derived prerequisites down to raw archive reads, and
//! evaluation fetches every prerequisite concurrently before running the
//! pure compute function over the aligned series.

use futures::future::{join_all, try_join_all};
use meteo_common::{ReadResult, ReadSettings, TimeRange};
use solar::{
    cos_zenith, diffuse_fraction, direct_normal, global_tilted_irradiance, mean_cos_zenith,
    sun_position,
};
use variables::{
    HeightLevel, HeightVariable, HeightVariableType, PressureDerived, PressureDerivedVariable,
    PressureVariable, PressureVariableType, SurfaceDerived, SurfaceVariable, Variable,
};

use crate::reader::{DomainReader, PointReader, VariableData};
use crate::weather_code::{weather_code, WeatherInputs};

/// Direct prerequisites of a variable; empty for raw variables.
pub fn requirements(variable: Variable) -> Vec<Variable> {
    use SurfaceVariable as S;
    match variable {
        Variable::Raw(_) => Vec::new(),
        Variable::SurfaceDerived(derived) => match derived {
            SurfaceDerived::WindSpeed10m | SurfaceDerived::WindDirection10m => {
                vec![S::WindU10m.into(), S::WindV10m.into()]
            }
            SurfaceDerived::WindSpeed80m | SurfaceDerived::WindDirection80m => vec![
                HeightVariable::new(HeightVariableType::WindU, HeightLevel::M80).into(),
                HeightVariable::new(HeightVariableType::WindV, HeightLevel::M80).into(),
            ],
            SurfaceDerived::DewPoint2m
            | SurfaceDerived::WetBulbTemperature2m
            | SurfaceDerived::VapourPressureDeficit => {
                vec![S::Temperature2m.into(), S::RelativeHumidity2m.into()]
            }
            SurfaceDerived::ApparentTemperature => vec![
                SurfaceDerived::WindSpeed10m.into(),
                S::Temperature2m.into(),
                S::RelativeHumidity2m.into(),
                S::ShortwaveRadiation.into(),
            ],
            SurfaceDerived::SurfacePressure => {
                vec![S::PressureMsl.into(), S::Temperature2m.into()]
            }
            SurfaceDerived::Rain | SurfaceDerived::Snowfall => {
                vec![S::Precipitation.into(), S::Temperature2m.into()]
            }
            SurfaceDerived::Showers => vec![S::Precipitation.into()],
            SurfaceDerived::DiffuseRadiation => {
                vec![S::DiffuseRadiation.into(), S::ShortwaveRadiation.into()]
            }
            SurfaceDerived::DirectRadiation => vec![
                S::DirectRadiation.into(),
                S::ShortwaveRadiation.into(),
                SurfaceDerived::DiffuseRadiation.into(),
            ],
            SurfaceDerived::DirectNormalIrradiance => {
                vec![SurfaceDerived::DirectRadiation.into()]
            }
            SurfaceDerived::GlobalTiltedIrradiance { .. } => vec![
                S::ShortwaveRadiation.into(),
                SurfaceDerived::DiffuseRadiation.into(),
                SurfaceDerived::DirectRadiation.into(),
            ],
            SurfaceDerived::Et0FaoEvapotranspiration => vec![
                S::Temperature2m.into(),
                S::RelativeHumidity2m.into(),
                SurfaceDerived::WindSpeed10m.into(),
                S::ShortwaveRadiation.into(),
                SurfaceDerived::SurfacePressure.into(),
            ],
            SurfaceDerived::WeatherCode => vec![
                S::CloudCover.into(),
                S::Precipitation.into(),
                SurfaceDerived::Snowfall.into(),
                SurfaceDerived::Showers.into(),
                S::WindGusts10m.into(),
                S::Cape.into(),
                S::LiftedIndex.into(),
                S::Visibility.into(),
                S::FreezingRain.into(),
                S::Temperature2m.into(),
            ],
            // Resolved per ensemble member at evaluation time.
            SurfaceDerived::PrecipitationProbability => vec![S::Precipitation.into()],
        },
        Variable::PressureDerived(derived) => {
            let level = derived.level;
            let raw = |v: PressureVariableType| -> Variable {
                Variable::Raw(PressureVariable::new(v, level).into())
            };
            match derived.variable {
                PressureDerived::WindSpeed | PressureDerived::WindDirection => {
                    vec![raw(PressureVariableType::WindU), raw(PressureVariableType::WindV)]
                }
                PressureDerived::DewPoint => vec![
                    raw(PressureVariableType::Temperature),
                    raw(PressureVariableType::RelativeHumidity),
                ],
                PressureDerived::CloudCover => {
                    vec![raw(PressureVariableType::RelativeHumidity)]
                }
            }
        }
    }
}

/// Prefetch a variable and, recursively, everything it derives from.
pub async fn prefetch(
    reader: &DomainReader,
    variable: Variable,
    range: TimeRange,
    settings: ReadSettings,
) {
    match variable {
        Variable::Raw(raw) => reader.prefetch_raw(raw, range, settings).await,
        Variable::SurfaceDerived(SurfaceDerived::PrecipitationProbability) => {
            let members = reader.domain().ensemble_members;
            let fetches = (0..members).map(|member| {
                reader.prefetch_raw(
                    SurfaceVariable::Precipitation.into(),
                    range,
                    member_settings(reader, settings, member),
                )
            });
            join_all(fetches).await;
        }
        _ => {
            // PointReader::prefetch re-enters here for nested derived
            // prerequisites; the trait method boxes the recursion.
            let fetches = requirements(variable)
                .into_iter()
                .map(|dep| reader.prefetch(dep, range, settings));
            let _ = try_join_all(fetches).await;
        }
    }
}

/// Fetch prerequisite series concurrently; compute runs only once all are
/// complete, so it sees aligned arrays.
async fn fetch_all(
    reader: &DomainReader,
    variables: &[Variable],
    range: TimeRange,
    settings: ReadSettings,
) -> ReadResult<Vec<Vec<f32>>> {
    let reads = variables.iter().map(|v| reader.get(*v, range, settings));
    let results = try_join_all(reads).await?;
    Ok(results.into_iter().map(|r| r.data).collect())
}

fn member_settings(reader: &DomainReader, mut settings: ReadSettings, member: u32) -> ReadSettings {
    if reader.domain().packs_members_in_file {
        settings.ensemble_member_level = Some(member);
    } else {
        settings.ensemble_member = member;
    }
    settings
}

fn zip2(a: &[f32], b: &[f32], f: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
}

/// Wind speed from components.
fn wind_speed(u: &[f32], v: &[f32]) -> Vec<f32> {
    zip2(u, v, f32::hypot)
}

/// Meteorological wind direction: where the wind comes from, degrees
/// clockwise from north.
fn wind_direction(u: &[f32], v: &[f32]) -> Vec<f32> {
    zip2(u, v, |u, v| {
        (u.atan2(v).to_degrees() + 180.0).rem_euclid(360.0)
    })
}

/// Magnus saturation vapour pressure over water, hPa.
fn saturation_vapour_pressure(temperature: f32) -> f32 {
    6.1078 * (17.27 * temperature / (237.3 + temperature)).exp()
}

/// Magnus dew point from temperature and relative humidity.
fn dew_point(temperature: &[f32], relative_humidity: &[f32]) -> Vec<f32> {
    const A: f32 = 17.27;
    const B: f32 = 237.3;
    zip2(temperature, relative_humidity, |t, rh| {
        let gamma = (rh / 100.0).max(1e-4).ln() + A * t / (B + t);
        B * gamma / (A - gamma)
    })
}

/// Steadman apparent temperature with the radiation term.
fn apparent_temperature(
    wind_speed: &[f32],
    temperature: &[f32],
    relative_humidity: &[f32],
    shortwave: &[f32],
) -> Vec<f32> {
    wind_speed
        .iter()
        .zip(temperature)
        .zip(relative_humidity)
        .zip(shortwave)
        .map(|(((&ws, &t), &rh), &radiation)| {
            let e = rh / 100.0 * 6.105 * (17.27 * t / (237.7 + t)).exp();
            // Net absorbed share of global radiation on a person.
            let absorbed = if radiation.is_nan() { 0.0 } else { 0.1 * radiation };
            t + 0.348 * e - 0.70 * ws + 0.70 * absorbed / (ws + 10.0) - 4.25
        })
        .collect()
}

/// Wet-bulb temperature (Stull 2011).
fn wet_bulb(temperature: &[f32], relative_humidity: &[f32]) -> Vec<f32> {
    zip2(temperature, relative_humidity, |t, rh| {
        t * (0.151977 * (rh + 8.313659).sqrt()).atan() + (t + rh).atan() - (rh - 1.676331).atan()
            + 0.00391838 * rh.powf(1.5) * (0.023101 * rh).atan()
            - 4.686035
    })
}

/// Mean sea level pressure reduced to station elevation.
fn surface_pressure(pressure_msl: &[f32], temperature: &[f32], elevation: f32) -> Vec<f32> {
    if elevation == 0.0 || elevation.is_nan() {
        return pressure_msl.to_vec();
    }
    zip2(pressure_msl, temperature, |p, t| {
        p * (1.0 - 0.0065 * elevation / (t + 273.15 + 0.0065 * elevation)).powf(5.255)
    })
}

/// Vapour pressure deficit in kPa.
fn vapour_pressure_deficit(temperature: &[f32], relative_humidity: &[f32]) -> Vec<f32> {
    zip2(temperature, relative_humidity, |t, rh| {
        let es = saturation_vapour_pressure(t) / 10.0;
        (es * (1.0 - rh / 100.0)).max(0.0)
    })
}

/// Liquid share of precipitation.
fn rain(precipitation: &[f32], temperature: &[f32]) -> Vec<f32> {
    zip2(precipitation, temperature, |p, t| {
        if t >= 0.0 {
            p
        } else {
            0.0
        }
    })
}

/// Snow depth gain in centimetres from sub-freezing precipitation, using
/// the 0.7 cm per mm water-equivalent factor.
fn snowfall(precipitation: &[f32], temperature: &[f32]) -> Vec<f32> {
    zip2(precipitation, temperature, |p, t| {
        if t >= 0.0 {
            0.0
        } else {
            p * 0.7
        }
    })
}

/// Convective share fallback for domains without a separate showers field.
// TODO: confirm the clamp direction against the producer archives; several
// of them look like they intended the positive part here.
fn showers(precipitation: &[f32]) -> Vec<f32> {
    precipitation.iter().map(|p| p.min(0.0)).collect()
}

/// FAO-56 Penman-Monteith reference evapotranspiration per step, mm.
fn et0_fao(
    temperature: &[f32],
    relative_humidity: &[f32],
    wind_speed_10m: &[f32],
    shortwave: &[f32],
    surface_pressure_hpa: &[f32],
    dt: i64,
) -> Vec<f32> {
    let hours = dt as f32 / 3600.0;
    temperature
        .iter()
        .zip(relative_humidity)
        .zip(wind_speed_10m)
        .zip(shortwave)
        .zip(surface_pressure_hpa)
        .map(|((((&t, &rh), &ws10), &radiation), &pressure)| {
            let es = saturation_vapour_pressure(t) / 10.0;
            let ea = es * rh / 100.0;
            let delta = 4098.0 * es / (t + 237.3).powi(2);
            let gamma = 0.000665 * (pressure / 10.0);
            // Wind at 2 m from the 10 m value, logarithmic profile.
            let u2 = ws10 * 0.748;
            // Net shortwave in MJ/m² per step; albedo 0.23.
            let rn = radiation.max(0.0) * (1.0 - 0.23) * 0.0036 * hours;
            let numerator = 0.408 * delta * rn + gamma * 37.0 * hours / (t + 273.0) * u2 * (es - ea);
            let denominator = delta + gamma * (1.0 + 0.34 * u2);
            (numerator / denominator).max(0.0)
        })
        .collect()
}

/// Evaluate a derived single-level variable.
pub async fn get_surface(
    reader: &DomainReader,
    derived: SurfaceDerived,
    range: TimeRange,
    settings: ReadSettings,
) -> ReadResult<VariableData> {
    let unit = derived.unit();
    let deps = requirements(derived.into());

    let data = match derived {
        SurfaceDerived::WindSpeed10m | SurfaceDerived::WindSpeed80m => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            wind_speed(&inputs[0], &inputs[1])
        }
        SurfaceDerived::WindDirection10m | SurfaceDerived::WindDirection80m => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            wind_direction(&inputs[0], &inputs[1])
        }
        SurfaceDerived::DewPoint2m => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            dew_point(&inputs[0], &inputs[1])
        }
        SurfaceDerived::WetBulbTemperature2m => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            wet_bulb(&inputs[0], &inputs[1])
        }
        SurfaceDerived::VapourPressureDeficit => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            vapour_pressure_deficit(&inputs[0], &inputs[1])
        }
        SurfaceDerived::ApparentTemperature => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            apparent_temperature(&inputs[0], &inputs[1], &inputs[2], &inputs[3])
        }
        SurfaceDerived::SurfacePressure => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            let elevation = reader.target_elevation().metres().unwrap_or(f32::NAN);
            surface_pressure(&inputs[0], &inputs[1], elevation)
        }
        SurfaceDerived::Rain => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            rain(&inputs[0], &inputs[1])
        }
        SurfaceDerived::Snowfall => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            snowfall(&inputs[0], &inputs[1])
        }
        SurfaceDerived::Showers => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            showers(&inputs[0])
        }
        SurfaceDerived::DiffuseRadiation => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            let (lat, lon) = (reader.model_latitude(), reader.model_longitude());
            inputs[0]
                .iter()
                .zip(&inputs[1])
                .zip(range.iter())
                .map(|((&raw, &shortwave), t)| {
                    if !raw.is_nan() {
                        return raw;
                    }
                    if shortwave.is_nan() {
                        return f32::NAN;
                    }
                    let cz = mean_cos_zenith(t, range.dt, lat, lon);
                    shortwave * diffuse_fraction(shortwave, t, cz)
                })
                .collect()
        }
        SurfaceDerived::DirectRadiation => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            inputs[0]
                .iter()
                .zip(&inputs[1])
                .zip(&inputs[2])
                .map(|((&raw, &shortwave), &diffuse)| {
                    if !raw.is_nan() {
                        raw
                    } else {
                        (shortwave - diffuse).max(0.0)
                    }
                })
                .collect()
        }
        SurfaceDerived::DirectNormalIrradiance => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            let (lat, lon) = (reader.model_latitude(), reader.model_longitude());
            inputs[0]
                .iter()
                .zip(range.iter())
                .map(|(&direct, t)| direct_normal(direct, mean_cos_zenith(t, range.dt, lat, lon)))
                .collect()
        }
        SurfaceDerived::GlobalTiltedIrradiance { tilt, azimuth } => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            let (lat, lon) = (reader.model_latitude(), reader.model_longitude());
            inputs[0]
                .iter()
                .zip(&inputs[1])
                .zip(&inputs[2])
                .zip(range.iter())
                .map(|(((&shortwave, &diffuse), &direct), t)| {
                    // Sun position at the backward interval's midpoint.
                    let midpoint = t - range.dt / 2;
                    let sun = sun_position(midpoint, lat, lon);
                    let dni = direct_normal(direct, cos_zenith(midpoint, lat, lon).max(0.0));
                    global_tilted_irradiance(shortwave, diffuse, dni, sun, t, tilt, azimuth)
                })
                .collect()
        }
        SurfaceDerived::Et0FaoEvapotranspiration => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            et0_fao(
                &inputs[0], &inputs[1], &inputs[2], &inputs[3], &inputs[4], range.dt,
            )
        }
        SurfaceDerived::WeatherCode => {
            let inputs = fetch_all(reader, &deps, range, settings).await?;
            weather_code(&WeatherInputs {
                cloud_cover: &inputs[0],
                precipitation: &inputs[1],
                snowfall: &inputs[2],
                showers: &inputs[3],
                wind_gusts: &inputs[4],
                cape: &inputs[5],
                lifted_index: &inputs[6],
                visibility: &inputs[7],
                freezing_rain: &inputs[8],
                temperature: &inputs[9],
                dt: range.dt,
            })
        }
        SurfaceDerived::PrecipitationProbability => {
            return precipitation_probability(reader, range, settings).await;
        }
    };

    Ok(VariableData { data, unit })
}

/// Evaluate a derived pressure-level variable.
pub async fn get_pressure(
    reader: &DomainReader,
    derived: PressureDerivedVariable,
    range: TimeRange,
    settings: ReadSettings,
) -> ReadResult<VariableData> {
    let unit = derived.unit();
    let deps = requirements(derived.into());
    let inputs = fetch_all(reader, &deps, range, settings).await?;

    let data = match derived.variable {
        PressureDerived::WindSpeed => wind_speed(&inputs[0], &inputs[1]),
        PressureDerived::WindDirection => wind_direction(&inputs[0], &inputs[1]),
        PressureDerived::DewPoint => dew_point(&inputs[0], &inputs[1]),
        PressureDerived::CloudCover => {
            let sigma = derived.level as f32 / 1013.25;
            inputs[0]
                .iter()
                .map(|&rh| relative_humidity_to_cloud_cover(rh, sigma))
                .collect()
        }
    };

    Ok(VariableData { data, unit })
}

/// Slingo-style cloud cover from relative humidity.
///
/// The critical humidity drops towards mid-levels, so 60% humidity at
/// 500 hPa clouds over while the same humidity near the surface does not.
fn relative_humidity_to_cloud_cover(relative_humidity: f32, sigma: f32) -> f32 {
    let sigma = sigma.clamp(0.0, 1.0);
    let critical = 85.0 - 140.0 * sigma * (1.0 - sigma);
    if relative_humidity <= critical {
        return 0.0;
    }
    let fraction = (relative_humidity - critical) / (100.0 - critical);
    (fraction * fraction * 100.0).min(100.0)
}

/// Share of ensemble members with measurable precipitation, per sample.
async fn precipitation_probability(
    reader: &DomainReader,
    range: TimeRange,
    settings: ReadSettings,
) -> ReadResult<VariableData> {
    const MEASURABLE_MM: f32 = 0.1;
    let members = reader.domain().ensemble_members;
    if members <= 1 {
        // Deterministic domains have no members: the sample stays missing
        // and the mixer falls through to an ensemble reader.
        return Ok(VariableData {
            data: vec![f32::NAN; range.count()],
            unit: SurfaceDerived::PrecipitationProbability.unit(),
        });
    }

    let reads = (0..members).map(|member| {
        reader.read_raw(
            SurfaceVariable::Precipitation.into(),
            range,
            member_settings(reader, settings, member),
        )
    });
    let series = try_join_all(reads).await?;

    let data = (0..range.count())
        .map(|i| {
            let mut above = 0u32;
            let mut known = 0u32;
            for member in &series {
                let value = member[i];
                if value.is_nan() {
                    continue;
                }
                known += 1;
                if value >= MEASURABLE_MM {
                    above += 1;
                }
            }
            if known == 0 {
                f32::NAN
            } else {
                above as f32 / known as f32 * 100.0
            }
        })
        .collect();

    Ok(VariableData {
        data,
        unit: SurfaceDerived::PrecipitationProbability.unit(),
    })
}
