//! Lambert conformal conic projection.
//!
//! Used by HRRR, MetNo Nordic and the MeteoFrance mesoscale grids. Maps a
//! cone secant (or tangent, when the standard parallels coincide) to the
//! sphere onto the plane.

use std::f64::consts::PI;

use crate::projected::Projection;

/// Spherical Lambert conformal conic.
///
/// Grids do not agree on an earth radius; the GRIB-declared radius of the
/// producing centre must be passed in.
#[derive(Debug, Clone)]
pub struct LambertConformalConic {
    /// Central meridian in radians.
    lon0: f64,
    /// Cone constant.
    n: f64,
    /// F constant.
    f: f64,
    /// Radial distance of the reference latitude.
    rho0: f64,
    /// Earth radius in metres.
    radius: f64,
}

impl LambertConformalConic {
    /// Build from the grid's declared parameters, all angles in degrees:
    /// central meridian `lon0`, reference latitude `lat0`, standard
    /// parallels `lat1`/`lat2` and the earth `radius` in metres.
    pub fn new(lon0: f64, lat0: f64, lat1: f64, lat2: f64, radius: f64) -> Self {
        let lat0 = lat0.to_radians();
        let lat1 = lat1.to_radians();
        let lat2 = lat2.to_radians();

        let n = if (lat1 - lat2).abs() < 1e-10 {
            lat1.sin()
        } else {
            let ln_cos = (lat1.cos() / lat2.cos()).ln();
            let ln_tan = ((PI / 4.0 + lat2 / 2.0).tan() / (PI / 4.0 + lat1 / 2.0).tan()).ln();
            ln_cos / ln_tan
        };

        let f = lat1.cos() * (PI / 4.0 + lat1 / 2.0).tan().powf(n) / n;
        let rho0 = radius * f / (PI / 4.0 + lat0 / 2.0).tan().powf(n);

        Self {
            lon0: lon0.to_radians(),
            n,
            f,
            rho0,
            radius,
        }
    }

    fn rho(&self, lat: f64) -> f64 {
        self.radius * self.f / (PI / 4.0 + lat / 2.0).tan().powf(self.n)
    }
}

impl Projection for LambertConformalConic {
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let lat = lat.to_radians();
        let mut dlon = lon.to_radians() - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let rho = self.rho(lat);
        let theta = self.n * dlon;
        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let mut rho = (x * x + (self.rho0 - y) * (self.rho0 - y)).sqrt();
        if self.n < 0.0 {
            rho = -rho;
        }
        let theta = (x / (self.rho0 - y)).atan();

        let lat = 2.0 * (self.radius * self.f / rho).powf(1.0 / self.n).atan() - PI / 2.0;
        let lon = self.lon0 + theta / self.n;
        (lat.to_degrees(), lon.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projected::ProjectedGrid;
    use crate::Grid;

    /// HRRR: 3 km CONUS grid, secant parallels both at 38.5°N.
    fn hrrr() -> ProjectedGrid<LambertConformalConic> {
        let proj = LambertConformalConic::new(-97.5, 38.5, 38.5, 38.5, 6_371_229.0);
        ProjectedGrid::new(proj, 21.138123, -122.719528, 3000.0, 3000.0, 1799, 1059)
    }

    #[test]
    fn test_first_grid_point_is_origin() {
        let grid = hrrr();
        let (x, y) = grid.forward(21.138123, -122.719528);
        assert!(x.abs() < 0.01, "x should be ~0, got {}", x);
        assert!(y.abs() < 0.01, "y should be ~0, got {}", y);
    }

    #[test]
    fn test_roundtrip_mid_latitudes() {
        let grid = hrrr();
        let (x, y) = grid.forward(39.0, -94.5);
        let (lat, lon) = grid.inverse(x, y);
        assert!((lat - 39.0).abs() < 1e-4);
        assert!((lon + 94.5).abs() < 1e-4);
    }

    #[test]
    fn test_conus_centre_lands_mid_grid() {
        let grid = hrrr();
        let (x, y) = grid.forward(39.0, -94.5);
        assert!(x > 700.0 && x < 1100.0, "x should be mid grid, got {}", x);
        assert!(y > 400.0 && y < 700.0, "y should be mid grid, got {}", y);
    }

    #[test]
    fn test_outside_grid() {
        let grid = hrrr();
        assert!(grid.find_point(46.88, 8.67).is_none());
        assert!(grid.find_point(39.0, -94.5).is_some());
    }
}
