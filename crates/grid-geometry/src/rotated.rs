//! Rotated latitude/longitude grid (COSMO/ICON-D2 style).
//!
//! The grid is regular in a coordinate system whose north pole has been
//! moved to `(pole_lat, pole_lon)`. The transform is composed from two
//! rotations: about the z-axis by the pole longitude and about the y-axis
//! by the pole colatitude. Rotated longitude 0 lies on the geographic
//! meridian `pole_lon + 180`, matching the convention of the COSMO grid
//! description files.

use crate::{normalize_lon, regular::RegularGrid, Grid};

/// A regular grid in rotated-pole coordinates.
#[derive(Debug, Clone)]
pub struct RotatedGrid {
    /// Geographic latitude of the rotated north pole in degrees.
    pub pole_lat: f64,
    /// Geographic longitude of the rotated north pole in degrees.
    pub pole_lon: f64,
    /// The underlying regular grid, described in rotated coordinates.
    pub inner: RegularGrid,
    /// sin/cos of the pole colatitude (the y-axis rotation angle).
    sin_beta: f64,
    cos_beta: f64,
}

impl RotatedGrid {
    pub fn new(pole_lat: f64, pole_lon: f64, inner: RegularGrid) -> Self {
        let beta = (90.0 - pole_lat).to_radians();
        Self {
            pole_lat,
            pole_lon,
            inner,
            sin_beta: beta.sin(),
            cos_beta: beta.cos(),
        }
    }

    /// Geographic to rotated coordinates, both in degrees.
    pub fn to_rotated(&self, lat: f64, lon: f64) -> (f64, f64) {
        let lam = (lon - self.pole_lon).to_radians();
        let phi = lat.to_radians();

        let x = lam.cos() * phi.cos();
        let y = lam.sin() * phi.cos();
        let z = phi.sin();

        let xr = self.cos_beta * x - self.sin_beta * z;
        let yr = y;
        let zr = self.sin_beta * x + self.cos_beta * z;

        let lat_r = zr.asin().to_degrees();
        // Rotated longitude is measured from the meridian opposite the pole.
        let lon_r = (-yr).atan2(-xr).to_degrees();
        (lat_r, lon_r)
    }

    /// Rotated to geographic coordinates, both in degrees.
    pub fn from_rotated(&self, lat_r: f64, lon_r: f64) -> (f64, f64) {
        let lam = lon_r.to_radians();
        let phi = lat_r.to_radians();

        let xr = -lam.cos() * phi.cos();
        let yr = -lam.sin() * phi.cos();
        let zr = phi.sin();

        let x = self.cos_beta * xr + self.sin_beta * zr;
        let y = yr;
        let z = -self.sin_beta * xr + self.cos_beta * zr;

        let lat = z.asin().to_degrees();
        let lon = y.atan2(x).to_degrees() + self.pole_lon;
        (lat, normalize_lon(lon))
    }

    /// Fractional grid coordinates of a geographic point.
    pub fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (lat_r, lon_r) = self.to_rotated(lat, lon);
        self.inner.forward(lat_r, lon_r)
    }

    /// Geographic coordinates of fractional grid coordinates.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let (lat_r, lon_r) = self.inner.inverse(x, y);
        self.from_rotated(lat_r, lon_r)
    }
}

impl Grid for RotatedGrid {
    fn count(&self) -> usize {
        self.inner.count()
    }

    fn find_point(&self, lat: f64, lon: f64) -> Option<usize> {
        let (lat_r, lon_r) = self.to_rotated(lat, lon);
        self.inner.find_point(lat_r, lon_r)
    }

    fn coordinates(&self, gridpoint: usize) -> (f64, f64) {
        let (lat_r, lon_r) = self.inner.coordinates(gridpoint);
        self.from_rotated(lat_r, lon_r)
    }

    fn neighbourhood(&self, gridpoint: usize) -> Vec<usize> {
        self.inner.neighbourhood(gridpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ICON-D2: rotated pole at (40N, 170W), 0.02° spacing.
    fn icon_d2() -> RotatedGrid {
        RotatedGrid::new(
            40.0,
            -170.0,
            RegularGrid::new(1215, 746, -6.3, -7.5, 0.02, 0.02),
        )
    }

    #[test]
    fn test_rotation_roundtrip() {
        let grid = icon_d2();
        let (lat_r, lon_r) = grid.to_rotated(46.88, 8.67);
        let (lat, lon) = grid.from_rotated(lat_r, lon_r);
        assert!((lat - 46.88).abs() < 1e-9);
        assert!((lon - 8.67).abs() < 1e-9);
    }

    #[test]
    fn test_pole_on_true_north_is_identity() {
        // Pole at (90, 180) leaves coordinates unchanged: the colatitude
        // rotation vanishes and the longitude origin convention cancels the
        // pole longitude.
        let grid = RotatedGrid::new(90.0, 180.0, RegularGrid::new(10, 10, 0.0, 0.0, 1.0, 1.0));
        let (lat_r, lon_r) = grid.to_rotated(45.0, 10.0);
        assert!((lat_r - 45.0).abs() < 1e-9);
        assert!((lon_r - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_germany_near_rotated_equator() {
        // The rotated equator of the COSMO pole runs through central Europe.
        let grid = icon_d2();
        let (lat_r, lon_r) = grid.to_rotated(50.0, 10.0);
        assert!(lat_r.abs() < 0.5, "rotated lat should be near 0, got {}", lat_r);
        assert!(lon_r.abs() < 0.5, "rotated lon should be near 0, got {}", lon_r);
    }

    #[test]
    fn test_find_point_roundtrip() {
        let grid = icon_d2();
        let point = grid.find_point(46.88, 8.67).expect("central Europe is covered");
        let (lat, lon) = grid.coordinates(point);
        assert!((lat - 46.88).abs() < 0.03);
        assert!((lon - 8.67).abs() < 0.03);
    }

    #[test]
    fn test_outside_domain() {
        let grid = icon_d2();
        assert!(grid.find_point(10.0, -120.0).is_none());
    }
}
