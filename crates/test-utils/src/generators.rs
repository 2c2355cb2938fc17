//! Value-series generators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A constant series.
pub fn constant_series(value: f32, count: usize) -> Vec<f32> {
    vec![value; count]
}

/// A day-shaped series: `base` plus a sine hump peaking mid-period.
pub fn diurnal_series(base: f32, amplitude: f32, count: usize, steps_per_day: usize) -> Vec<f32> {
    (0..count)
        .map(|i| {
            let phase = (i % steps_per_day) as f32 / steps_per_day as f32;
            base + amplitude * (phase * std::f32::consts::PI).sin()
        })
        .collect()
}

/// A seeded noisy series for cache and codec stress tests.
pub fn noisy_series(seed: u64, base: f32, spread: f32, count: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| base + rng.gen_range(-spread..spread)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noisy_series_is_deterministic() {
        assert_eq!(noisy_series(7, 10.0, 2.0, 16), noisy_series(7, 10.0, 2.0, 16));
    }

    #[test]
    fn test_diurnal_peaks_midday() {
        let series = diurnal_series(10.0, 8.0, 24, 24);
        assert!(series[12] > series[0]);
        assert!(series[12] > series[23]);
    }
}
