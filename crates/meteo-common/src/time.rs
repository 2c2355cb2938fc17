//! Time-range algebra for archive reads.
//!
//! All arithmetic is in integer seconds since the Unix epoch, UTC only.
//! Time zones are a display concern handled outside this layer, so none of
//! the floor/ceil operations can cross a DST boundary.

use serde::{Deserialize, Serialize};

use crate::interpolation::InterpolationKind;

/// A closed-start/open-end read window aligned to a step `dt`.
///
/// `start` and `end` are epoch seconds; the described timestamps are
/// `start, start+dt, .., end-dt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
    pub dt: i64,
}

impl TimeRange {
    /// Create a range. `dt` must be positive and `start <= end`; both ends
    /// are expected to be aligned to `dt`.
    pub fn new(start: i64, end: i64, dt: i64) -> Self {
        debug_assert!(dt > 0, "dt must be positive");
        debug_assert!(start <= end, "start must not exceed end");
        debug_assert!(start % dt == 0 && end % dt == 0, "range must align to dt");
        Self { start, end, dt }
    }

    /// Range covering `count` steps from `start`.
    pub fn with_count(start: i64, count: usize, dt: i64) -> Self {
        Self::new(start, start + count as i64 * dt, dt)
    }

    /// Number of samples described by this range.
    pub fn count(&self) -> usize {
        ((self.end - self.start) / self.dt) as usize
    }

    /// Whether `timestamp` falls inside the half-open window.
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Sample index of `timestamp`, or `None` when outside the window or
    /// off the step raster.
    pub fn index_of(&self, timestamp: i64) -> Option<usize> {
        if !self.contains(timestamp) || (timestamp - self.start) % self.dt != 0 {
            return None;
        }
        Some(((timestamp - self.start) / self.dt) as usize)
    }

    /// Iterate the timestamps of the window.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        (self.start..self.end).step_by(self.dt as usize)
    }

    /// The same window re-described at a different step.
    pub fn with_dt(&self, dt: i64) -> Self {
        Self::new(floor_to(self.start, dt), ceil_to(self.end, dt), dt)
    }

    /// The window shifted back by whole days (previous-day comparison reads).
    pub fn previous_days(&self, days: u32) -> Self {
        let shift = days as i64 * 86_400;
        Self {
            start: self.start - shift,
            end: self.end - shift,
            dt: self.dt,
        }
    }

    /// Expand this window to the native step of a model so that the
    /// interpolation kernel has enough samples on both sides.
    ///
    /// The first requested sample needs the native sample at or before it,
    /// the last one the native sample at or after it; each side then widens
    /// by `model_dt * (padding - 1)` further samples for the kernel. The
    /// returned window is half-open like the input, so the right bracket is
    /// included by ending one native step past it.
    pub fn for_interpolation_to(&self, model_dt: i64, kind: InterpolationKind) -> Self {
        let pad = model_dt * (kind.padding() - 1);
        let first_bracket = floor_to(self.start, model_dt);
        let last_bracket = ceil_to(self.end - self.dt, model_dt);
        Self::new(first_bracket - pad, last_bracket + model_dt + pad, model_dt)
    }

    /// Expand this window for aggregation from `model_dt` up to this range's
    /// coarser step.
    ///
    /// Backward (summing/averaging) kinds need the member steps of the first
    /// coarse interval, so the start extends back by `model_dt * (steps - 1)`
    /// with `steps = dt / model_dt`. Point-sampling kinds are unchanged.
    pub fn for_aggregation_to(&self, model_dt: i64, kind: InterpolationKind) -> Self {
        if !kind.is_backwards() || self.dt <= model_dt {
            return Self::new(floor_to(self.start, model_dt), ceil_to(self.end, model_dt), model_dt);
        }
        let steps = self.dt / model_dt;
        Self::new(
            floor_to(self.start, model_dt) - model_dt * (steps - 1),
            ceil_to(self.end, model_dt),
            model_dt,
        )
    }
}

/// Per-request read settings carried alongside the time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadSettings {
    /// Ensemble member routed to a disjoint file family (members stored
    /// separately). Member 0 is the control run.
    pub ensemble_member: u32,
    /// Ensemble member selecting a sub-dimension within one file (members
    /// packed together). Preferred when the domain supports it.
    pub ensemble_member_level: Option<u32>,
    /// Shift the read window back this many whole days.
    pub previous_day: u32,
}

/// Round down to a multiple of `step` (also for negative timestamps).
pub fn floor_to(value: i64, step: i64) -> i64 {
    value.div_euclid(step) * step
}

/// Round up to a multiple of `step`.
pub fn ceil_to(value: i64, step: i64) -> i64 {
    floor_to(value + step - 1, step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_and_iter() {
        let range = TimeRange::new(0, 12 * 3600, 3600);
        assert_eq!(range.count(), 12);
        let times: Vec<i64> = range.iter().collect();
        assert_eq!(times.len(), 12);
        assert_eq!(times[0], 0);
        assert_eq!(times[11], 11 * 3600);
    }

    #[test]
    fn test_index_of() {
        let range = TimeRange::new(7200, 7200 + 6 * 3600, 3600);
        assert_eq!(range.index_of(7200), Some(0));
        assert_eq!(range.index_of(7200 + 3 * 3600), Some(3));
        assert_eq!(range.index_of(7200 + 6 * 3600), None);
        assert_eq!(range.index_of(7200 + 1800), None);
        assert_eq!(range.index_of(0), None);
    }

    #[test]
    fn test_floor_ceil() {
        assert_eq!(floor_to(3700, 3600), 3600);
        assert_eq!(ceil_to(3700, 3600), 7200);
        assert_eq!(floor_to(3600, 3600), 3600);
        assert_eq!(ceil_to(3600, 3600), 3600);
        assert_eq!(floor_to(-100, 3600), -3600);
        assert_eq!(ceil_to(-100, 3600), 0);
    }

    #[test]
    fn test_for_interpolation_linear_brackets_only() {
        // Hourly request against a 3-hourly model: linear needs the
        // bracketing native samples and nothing more. The last requested
        // sample is 4h, bracketed by the native samples at 3h and 6h.
        let range = TimeRange::new(3600, 5 * 3600, 3600);
        let expanded = range.for_interpolation_to(10800, InterpolationKind::Linear);
        assert_eq!(expanded, TimeRange::new(0, 32400, 10800));
        let samples: Vec<i64> = expanded.iter().collect();
        assert_eq!(samples, vec![0, 10800, 21600]);
    }

    #[test]
    fn test_for_interpolation_hermite_widens() {
        // Hermite needs one further sample on each side of the brackets.
        let range = TimeRange::new(3600, 5 * 3600, 3600);
        let expanded = range.for_interpolation_to(10800, InterpolationKind::hermite());
        assert_eq!(expanded, TimeRange::new(-10800, 43200, 10800));
    }

    #[test]
    fn test_for_interpolation_aligned_request_is_covered() {
        // A request already on the native raster still includes its own
        // samples and the right bracket of the final step.
        let range = TimeRange::new(0, 6 * 3600, 3600);
        let expanded = range.for_interpolation_to(3600, InterpolationKind::Linear);
        assert_eq!(expanded, TimeRange::new(0, 6 * 3600, 3600));
    }

    #[test]
    fn test_for_aggregation_backwards_sum() {
        // 6-hourly precipitation sums requested from an hourly model: the
        // first 6h interval needs the 5 preceding hourly members.
        let range = TimeRange::new(21600, 43200, 21600);
        let expanded = range.for_aggregation_to(3600, InterpolationKind::BackwardsSum);
        assert_eq!(expanded, TimeRange::new(21600 - 5 * 3600, 43200, 3600));
    }

    #[test]
    fn test_for_aggregation_point_sampled_unchanged() {
        let range = TimeRange::new(21600, 43200, 21600);
        let expanded = range.for_aggregation_to(3600, InterpolationKind::Linear);
        assert_eq!(expanded, TimeRange::new(21600, 43200, 3600));
    }

    #[test]
    fn test_previous_days() {
        let range = TimeRange::new(86_400, 2 * 86_400, 3600);
        let shifted = range.previous_days(1);
        assert_eq!(shifted, TimeRange::new(0, 86_400, 3600));
    }
}
