//! Polar stereographic projection, north polar aspect.
//!
//! Used by the GEM regional (RDPS) grid over Canada.

use std::f64::consts::FRAC_PI_4;

use crate::projected::Projection;

/// Spherical north-polar stereographic with true scale at `lat_ts`.
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// Orientation meridian in radians.
    lon0: f64,
    /// Radial scale `R * (1 + sin(lat_ts))`.
    scale: f64,
}

impl PolarStereographic {
    /// Orientation meridian `lon0` and true-scale latitude `lat_ts` in
    /// degrees, earth radius in metres.
    pub fn new(lon0: f64, lat_ts: f64, radius: f64) -> Self {
        Self {
            lon0: lon0.to_radians(),
            scale: radius * (1.0 + lat_ts.to_radians().sin()),
        }
    }
}

impl Projection for PolarStereographic {
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let rho = self.scale * (FRAC_PI_4 - lat.to_radians() / 2.0).tan();
        let theta = lon.to_radians() - self.lon0;
        (rho * theta.sin(), -rho * theta.cos())
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let rho = (x * x + y * y).sqrt();
        let lat = std::f64::consts::FRAC_PI_2 - 2.0 * (rho / self.scale).atan();
        let lon = self.lon0 + x.atan2(-y);
        (lat.to_degrees(), lon.to_degrees())
    }
}
