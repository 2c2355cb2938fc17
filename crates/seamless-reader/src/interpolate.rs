//! Time-axis resampling between native and requested resolutions.
//!
//! The archive always serves native-step windows; this module converts them
//! to the requested step according to each variable's interpolation kind.
//! Instantaneous kinds interpolate between samples, backward kinds
//! distribute or aggregate the covering interval, and solar kinds
//! redistribute step-averaged radiation along the solar-zenith integral.

use meteo_common::{time::ceil_to, InterpolationKind, TimeRange};
use solar::{cos_zenith, mean_cos_zenith};

/// Coordinate the solar kinds disaggregate against.
#[derive(Debug, Clone, Copy)]
pub struct SolarContext {
    pub lat: f64,
    pub lon: f64,
}

/// Resample `data`, covering `native`, onto `target`.
///
/// The native window must cover the target window with enough padding for
/// the kind's kernel; samples the kernel cannot reach come out NaN. The
/// output length always equals `target.count()`.
pub fn interpolate(
    kind: InterpolationKind,
    data: &[f32],
    native: &TimeRange,
    target: &TimeRange,
    solar: Option<&SolarContext>,
) -> Vec<f32> {
    debug_assert_eq!(data.len(), native.count());

    match kind {
        InterpolationKind::Linear => point_sampled(data, native, target, lerp),
        InterpolationKind::LinearDegrees => point_sampled(data, native, target, lerp_degrees),
        InterpolationKind::Hermite { bounds } => hermite(data, native, target, bounds),
        InterpolationKind::Backwards => backwards(data, native, target),
        InterpolationKind::BackwardsSum => backwards_sum(data, native, target),
        InterpolationKind::SolarBackwardsAveraged => {
            solar_backwards(data, native, target, solar, true)
        }
        InterpolationKind::SolarBackwardsMissingNotAveraged => {
            solar_backwards(data, native, target, solar, false)
        }
    }
}

fn lerp(a: f32, b: f32, frac: f32) -> f32 {
    if frac == 0.0 {
        return a;
    }
    a + (b - a) * frac
}

/// Linear on the 0-360 circle along the shortest arc.
fn lerp_degrees(a: f32, b: f32, frac: f32) -> f32 {
    if frac == 0.0 {
        return a;
    }
    let mut delta = (b - a) % 360.0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    (a + delta * frac).rem_euclid(360.0)
}

fn point_sampled(
    data: &[f32],
    native: &TimeRange,
    target: &TimeRange,
    blend: fn(f32, f32, f32) -> f32,
) -> Vec<f32> {
    target
        .iter()
        .map(|t| {
            let position = (t - native.start) as f64 / native.dt as f64;
            let index = position.floor() as i64;
            let frac = (position - position.floor()) as f32;
            if index < 0 || index as usize >= data.len() {
                return f32::NAN;
            }
            let a = data[index as usize];
            if frac == 0.0 {
                return a;
            }
            let Some(&b) = data.get(index as usize + 1) else {
                return f32::NAN;
            };
            blend(a, b, frac)
        })
        .collect()
}

/// Catmull-Rom spline over four consecutive samples, optionally clamped.
/// Falls back to linear when the outer samples are missing.
fn hermite(data: &[f32], native: &TimeRange, target: &TimeRange, bounds: Option<(f32, f32)>) -> Vec<f32> {
    let clamp = |v: f32| match bounds {
        Some((lo, hi)) => v.clamp(lo, hi),
        None => v,
    };
    let at = |index: i64| -> f32 {
        if index < 0 || index as usize >= data.len() {
            f32::NAN
        } else {
            data[index as usize]
        }
    };

    target
        .iter()
        .map(|t| {
            let position = (t - native.start) as f64 / native.dt as f64;
            let i1 = position.floor() as i64;
            let frac = (position - position.floor()) as f32;

            let p1 = at(i1);
            if frac == 0.0 {
                return clamp(p1);
            }
            let p2 = at(i1 + 1);
            if p1.is_nan() || p2.is_nan() {
                return f32::NAN;
            }
            let p0 = at(i1 - 1);
            let p3 = at(i1 + 2);
            if p0.is_nan() || p3.is_nan() {
                return clamp(lerp(p1, p2, frac));
            }

            let t2 = frac * frac;
            let t3 = t2 * frac;
            let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
            let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
            let c = -0.5 * p0 + 0.5 * p2;
            clamp(a * t3 + b * t2 + c * frac + p1)
        })
        .collect()
}

/// Index of the native sample whose backward interval covers `t`.
fn covering_index(t: i64, native: &TimeRange) -> Option<usize> {
    let covering = ceil_to(t, native.dt);
    let index = (covering - native.start) / native.dt;
    if index < 0 || index as usize >= (native.end - native.start) as usize / native.dt as usize {
        None
    } else {
        Some(index as usize)
    }
}

/// Replicate the covering native step into every sub-step.
fn backwards(data: &[f32], native: &TimeRange, target: &TimeRange) -> Vec<f32> {
    target
        .iter()
        .map(|t| covering_index(t, native).map_or(f32::NAN, |i| data[i]))
        .collect()
}

/// Distribute native sums uniformly when refining; add member steps when
/// coarsening.
fn backwards_sum(data: &[f32], native: &TimeRange, target: &TimeRange) -> Vec<f32> {
    if target.dt <= native.dt {
        let steps = (native.dt / target.dt) as f32;
        target
            .iter()
            .map(|t| covering_index(t, native).map_or(f32::NAN, |i| data[i] / steps))
            .collect()
    } else {
        let members = target.dt / native.dt;
        target
            .iter()
            .map(|t| {
                let mut sum = 0.0;
                for m in 0..members {
                    let member_t = t - (members - 1 - m) * native.dt;
                    match covering_index(member_t, native) {
                        Some(i) => sum += data[i],
                        None => return f32::NAN,
                    }
                }
                sum
            })
            .collect()
    }
}

/// Redistribute step-averaged radiation along the solar-zenith integral.
///
/// With `averaged`, the native sample is the mean power over its backward
/// interval and the sub-step value preserves the interval's energy; without
/// it the sample is treated as instantaneous and scaled by the ratio of
/// zenith cosines.
fn solar_backwards(
    data: &[f32],
    native: &TimeRange,
    target: &TimeRange,
    solar: Option<&SolarContext>,
    averaged: bool,
) -> Vec<f32> {
    let Some(ctx) = solar else {
        // No coordinate: degrade to plain backward replication.
        return backwards(data, native, target);
    };

    if target.dt >= native.dt {
        // Coarsening step-averaged power is a plain mean of member steps.
        let members = target.dt / native.dt;
        return target
            .iter()
            .map(|t| {
                let mut sum = 0.0;
                for m in 0..members {
                    let member_t = t - (members - 1 - m) * native.dt;
                    match covering_index(member_t, native) {
                        Some(i) => sum += data[i],
                        None => return f32::NAN,
                    }
                }
                sum / members as f32
            })
            .collect();
    }

    target
        .iter()
        .map(|t| {
            let Some(index) = covering_index(t, native) else {
                return f32::NAN;
            };
            let value = data[index];
            if value.is_nan() {
                return f32::NAN;
            }
            let covering_end = ceil_to(t, native.dt);

            let (numerator, denominator) = if averaged {
                (
                    mean_cos_zenith(t, target.dt, ctx.lat, ctx.lon),
                    mean_cos_zenith(covering_end, native.dt, ctx.lat, ctx.lon),
                )
            } else {
                (
                    cos_zenith(t, ctx.lat, ctx.lon).max(0.0),
                    cos_zenith(covering_end, ctx.lat, ctx.lon).max(0.0),
                )
            };

            if denominator <= 0.0 {
                return 0.0;
            }
            (value as f64 * numerator / denominator) as f32
        })
        .collect()
}
