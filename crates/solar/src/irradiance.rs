//! Irradiance geometry: clearness, diffuse split and tilted transposition.

use chrono::{DateTime, Datelike, Utc};

use crate::position::SunPosition;

/// Solar constant in W/m².
const SOLAR_CONSTANT: f64 = 1367.0;

/// Ground albedo assumed for the reflected component of tilted irradiance.
const GROUND_ALBEDO: f64 = 0.2;

/// Sun angles below this cosine are treated as horizon for ratios.
const MIN_COS_ZENITH: f64 = 0.0523;

/// Extraterrestrial normal irradiance, W/m², with the orbital eccentricity
/// correction.
pub fn extraterrestrial_normal(timestamp: i64) -> f64 {
    let day = DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|t| t.ordinal0() as f64)
        .unwrap_or(0.0);
    let b = 2.0 * std::f64::consts::PI * day / 365.0;
    SOLAR_CONSTANT * (1.0 + 0.033 * b.cos())
}

/// Diffuse fraction of global horizontal irradiance (Erbs et al. 1982),
/// as a function of the clearness index.
pub fn diffuse_fraction(shortwave: f32, timestamp: i64, cos_zenith: f64) -> f32 {
    if cos_zenith <= 0.0 || shortwave <= 0.0 {
        return 1.0;
    }
    let kt = (shortwave as f64 / (extraterrestrial_normal(timestamp) * cos_zenith)).min(1.0);

    let fraction = if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.8 {
        0.9511 - 0.1604 * kt + 4.388 * kt.powi(2) - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    };
    fraction.clamp(0.0, 1.0) as f32
}

/// Direct normal irradiance from direct horizontal irradiance.
///
/// The zenith cosine is floored near the horizon so grazing sun does not
/// blow the ratio up.
pub fn direct_normal(direct_horizontal: f32, cos_zenith: f64) -> f32 {
    if cos_zenith <= 0.0 || direct_horizontal <= 0.0 {
        return 0.0;
    }
    (direct_horizontal as f64 / cos_zenith.max(MIN_COS_ZENITH)) as f32
}

/// Global irradiance on a tilted panel by the Hay-Davies transposition.
///
/// `tilt` is from horizontal, `panel_azimuth` clockwise from north, both in
/// degrees.
pub fn global_tilted_irradiance(
    shortwave: f32,
    diffuse: f32,
    direct_normal: f32,
    sun: SunPosition,
    timestamp: i64,
    tilt: f32,
    panel_azimuth: f32,
) -> f32 {
    let beta = (tilt as f64).to_radians();

    if sun.cos_zenith <= 0.0 {
        // Only the isotropic sky term survives below the horizon.
        return (diffuse as f64 * (1.0 + beta.cos()) / 2.0) as f32;
    }

    let sin_zenith = (1.0 - sun.cos_zenith * sun.cos_zenith).max(0.0).sqrt();
    let azimuth_delta = (sun.azimuth - panel_azimuth as f64).to_radians();
    let cos_incidence =
        (sun.cos_zenith * beta.cos() + sin_zenith * beta.sin() * azimuth_delta.cos()).max(0.0);

    let beam = direct_normal as f64 * cos_incidence;

    // Anisotropy index weights the circumsolar share of the diffuse sky.
    let anisotropy = (direct_normal as f64 / extraterrestrial_normal(timestamp)).clamp(0.0, 1.0);
    let rb = cos_incidence / sun.cos_zenith.max(MIN_COS_ZENITH);
    let sky = diffuse as f64 * ((1.0 - anisotropy) * (1.0 + beta.cos()) / 2.0 + anisotropy * rb);

    let ground = shortwave as f64 * GROUND_ALBEDO * (1.0 - beta.cos()) / 2.0;

    (beam + sky + ground).max(0.0) as f32
}
