//! Sun position from the Spencer Fourier series.
//!
//! Accuracy is a fraction of a degree, which is sufficient for
//! disaggregating step-averaged radiation and for panel geometry; this is
//! not an ephemeris.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Sun position at one instant and place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Cosine of the solar zenith angle; negative below the horizon.
    pub cos_zenith: f64,
    /// Azimuth in degrees clockwise from north.
    pub azimuth: f64,
}

/// Fractional year in radians for a UTC timestamp.
fn fractional_year(time: DateTime<Utc>) -> f64 {
    let day = time.ordinal0() as f64;
    let hour = time.hour() as f64 + time.minute() as f64 / 60.0;
    2.0 * std::f64::consts::PI / 365.0 * (day + (hour - 12.0) / 24.0)
}

/// Solar declination in radians (Spencer 1971).
fn declination(gamma: f64) -> f64 {
    0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin() - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin()
}

/// Equation of time in minutes (Spencer 1971).
fn equation_of_time(gamma: f64) -> f64 {
    229.18
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin())
}

/// Hour angle in radians for a timestamp and longitude.
fn hour_angle(time: DateTime<Utc>, gamma: f64, lon: f64) -> f64 {
    let minutes = time.hour() as f64 * 60.0 + time.minute() as f64 + time.second() as f64 / 60.0;
    let true_solar_minutes = minutes + equation_of_time(gamma) + 4.0 * lon;
    (true_solar_minutes / 4.0 - 180.0).to_radians()
}

/// Cosine of the solar zenith angle; negative below the horizon.
pub fn cos_zenith(timestamp: i64, lat: f64, lon: f64) -> f64 {
    let Some(time) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return 0.0;
    };
    let gamma = fractional_year(time);
    let decl = declination(gamma);
    let omega = hour_angle(time, gamma, lon);
    let phi = lat.to_radians();

    phi.sin() * decl.sin() + phi.cos() * decl.cos() * omega.cos()
}

/// Full sun position at one instant.
pub fn sun_position(timestamp: i64, lat: f64, lon: f64) -> SunPosition {
    let Some(time) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return SunPosition {
            cos_zenith: 0.0,
            azimuth: 0.0,
        };
    };
    let gamma = fractional_year(time);
    let decl = declination(gamma);
    let omega = hour_angle(time, gamma, lon);
    let phi = lat.to_radians();

    let cos_zenith = phi.sin() * decl.sin() + phi.cos() * decl.cos() * omega.cos();

    // Measured from south positive westward, then shifted to clockwise
    // from north.
    let from_south = omega
        .sin()
        .atan2(omega.cos() * phi.sin() - decl.tan() * phi.cos());
    let azimuth = (from_south.to_degrees() + 180.0).rem_euclid(360.0);

    SunPosition {
        cos_zenith,
        azimuth,
    }
}

/// Backward average of the above-horizon zenith cosine over
/// `[end - dt, end]`.
///
/// Numeric quadrature with sub-five-minute steps; matches the averaging the
/// radiation archives apply to their native step.
pub fn mean_cos_zenith(end: i64, dt: i64, lat: f64, lon: f64) -> f64 {
    let steps = ((dt / 300).clamp(1, 48)) as usize;
    let sub = dt as f64 / steps as f64;
    let mut sum = 0.0;
    for i in 0..steps {
        // Midpoint of each sub-interval.
        let t = end - dt + ((i as f64 + 0.5) * sub) as i64;
        sum += cos_zenith(t, lat, lon).max(0.0);
    }
    sum / steps as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().timestamp()
    }

    #[test]
    fn test_declination_solstices() {
        let summer = fractional_year(Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap());
        let winter = fractional_year(Utc.with_ymd_and_hms(2024, 12, 21, 12, 0, 0).unwrap());
        assert!((declination(summer).to_degrees() - 23.44).abs() < 0.5);
        assert!((declination(winter).to_degrees() + 23.44).abs() < 0.5);
    }

    #[test]
    fn test_equator_noon_equinox_overhead() {
        // Around the March equinox the sun stands nearly overhead at the
        // equator at solar noon.
        let cz = cos_zenith(epoch(2024, 3, 20, 12, 0), 0.0, 0.0);
        assert!(cz > 0.995, "cos zenith was {}", cz);
    }

    #[test]
    fn test_night_is_below_horizon() {
        let cz = cos_zenith(epoch(2024, 3, 20, 0, 0), 0.0, 0.0);
        assert!(cz < -0.9);
    }

    #[test]
    fn test_longitude_shifts_noon() {
        // Solar noon at 90°E happens 6 hours before Greenwich.
        let cz = cos_zenith(epoch(2024, 3, 20, 6, 0), 0.0, 90.0);
        assert!(cz > 0.995, "cos zenith was {}", cz);
    }

    #[test]
    fn test_azimuth_morning_east() {
        let position = sun_position(epoch(2024, 6, 21, 8, 0), 46.9, 8.7);
        assert!(
            position.azimuth > 60.0 && position.azimuth < 140.0,
            "morning sun should stand east-ish, azimuth {}",
            position.azimuth
        );
    }

    #[test]
    fn test_mean_cos_zenith_bounds_instantaneous() {
        // Over a short morning hour the average lies between the endpoint
        // values.
        let end = epoch(2024, 6, 21, 9, 0);
        let at_start = cos_zenith(end - 3600, 46.9, 8.7).max(0.0);
        let at_end = cos_zenith(end, 46.9, 8.7).max(0.0);
        let mean = mean_cos_zenith(end, 3600, 46.9, 8.7);
        let (lo, hi) = if at_start < at_end {
            (at_start, at_end)
        } else {
            (at_end, at_start)
        };
        assert!(mean >= lo && mean <= hi);
    }

    #[test]
    fn test_mean_cos_zenith_night_is_zero() {
        let mean = mean_cos_zenith(epoch(2024, 3, 20, 1, 0), 3600, 0.0, 0.0);
        assert_eq!(mean, 0.0);
    }
}
