//! Lambert azimuthal equal-area projection.
//!
//! Used by the KNMI Harmonie archive over the Netherlands and North Sea.

use crate::projected::Projection;

/// Spherical Lambert azimuthal equal-area centred on `(lat0, lon0)`.
#[derive(Debug, Clone)]
pub struct LambertAzimuthalEqualArea {
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
    radius: f64,
}

impl LambertAzimuthalEqualArea {
    /// Projection centre in degrees and earth radius in metres.
    pub fn new(lat0: f64, lon0: f64, radius: f64) -> Self {
        let lat0 = lat0.to_radians();
        Self {
            lon0: lon0.to_radians(),
            sin_lat0: lat0.sin(),
            cos_lat0: lat0.cos(),
            radius,
        }
    }
}

impl Projection for LambertAzimuthalEqualArea {
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let dlam = lon.to_radians() - self.lon0;

        let k = (2.0
            / (1.0 + self.sin_lat0 * phi.sin() + self.cos_lat0 * phi.cos() * dlam.cos()))
        .sqrt();

        let x = self.radius * k * phi.cos() * dlam.sin();
        let y = self.radius * k * (self.cos_lat0 * phi.sin() - self.sin_lat0 * phi.cos() * dlam.cos());
        (x, y)
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let rho = (x * x + y * y).sqrt();
        if rho < 1e-9 {
            return (self.sin_lat0.asin().to_degrees(), self.lon0.to_degrees());
        }
        let c = 2.0 * (rho / (2.0 * self.radius)).asin();

        let phi = (c.cos() * self.sin_lat0 + y * c.sin() * self.cos_lat0 / rho).asin();
        let lam = self.lon0
            + (x * c.sin()).atan2(rho * self.cos_lat0 * c.cos() - y * self.sin_lat0 * c.sin());
        (phi.to_degrees(), lam.to_degrees())
    }
}
