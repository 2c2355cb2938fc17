//! Reduced Gaussian octahedral grids (ECMWF IFS).
//!
//! An O-series grid has `2N` latitude rows at the Gauss–Legendre quadrature
//! nodes of degree `2N`. Row counts start at 20 points on the polar rows
//! and grow by 4 per row towards the equator; the southern hemisphere
//! mirrors the northern. Longitudes within a row are uniform:
//! `lon(j) = 360 * j / nx(row)`.

use once_cell::sync::Lazy;

use crate::{normalize_lon, Grid};

/// A reduced Gaussian octahedral grid with `2n` rows.
#[derive(Debug)]
pub struct GaussianGrid {
    /// Row latitudes in degrees, northernmost first.
    latitudes: Vec<f64>,
    /// Points per row.
    row_counts: Vec<usize>,
    /// Flat index of the first point of each row (prefix sums), plus the
    /// total count as a final sentinel.
    offsets: Vec<usize>,
}

static O1280: Lazy<GaussianGrid> = Lazy::new(|| GaussianGrid::octahedral(1280));

impl GaussianGrid {
    /// The ECMWF O1280 grid (2560 rows, 6 599 680 points), built once.
    pub fn o1280() -> &'static GaussianGrid {
        &O1280
    }

    /// Build an octahedral grid with `n` rows per hemisphere.
    pub fn octahedral(n: usize) -> Self {
        let rows = 2 * n;
        let latitudes = gauss_legendre_latitudes(rows);

        let mut row_counts = Vec::with_capacity(rows);
        for y in 0..rows {
            let hemisphere_row = if y < n { y } else { rows - 1 - y };
            row_counts.push(20 + 4 * hemisphere_row);
        }

        let mut offsets = Vec::with_capacity(rows + 1);
        let mut total = 0;
        for &nx in &row_counts {
            offsets.push(total);
            total += nx;
        }
        offsets.push(total);

        Self {
            latitudes,
            row_counts,
            offsets,
        }
    }

    /// Points in row `y`.
    pub fn nx_of(&self, y: usize) -> usize {
        self.row_counts[y]
    }

    /// Row whose Gaussian latitude is nearest to `lat`.
    fn nearest_row(&self, lat: f64) -> usize {
        // Latitudes are strictly descending; find the insertion point.
        let after = self.latitudes.partition_point(|&row_lat| row_lat > lat);
        if after == 0 {
            return 0;
        }
        if after >= self.latitudes.len() {
            return self.latitudes.len() - 1;
        }
        let above = self.latitudes[after - 1] - lat;
        let below = lat - self.latitudes[after];
        if above <= below {
            after - 1
        } else {
            after
        }
    }

    /// Row and in-row index of a flat grid point.
    fn row_of(&self, gridpoint: usize) -> (usize, usize) {
        let row = self.offsets.partition_point(|&o| o <= gridpoint) - 1;
        (row, gridpoint - self.offsets[row])
    }

    fn point_in_row(&self, row: usize, lon: f64) -> usize {
        let nx = self.row_counts[row];
        let j = (lon.rem_euclid(360.0) / 360.0 * nx as f64).round() as usize % nx;
        self.offsets[row] + j
    }
}

impl Grid for GaussianGrid {
    fn count(&self) -> usize {
        *self.offsets.last().unwrap()
    }

    fn find_point(&self, lat: f64, lon: f64) -> Option<usize> {
        if !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        Some(self.point_in_row(self.nearest_row(lat), lon))
    }

    fn coordinates(&self, gridpoint: usize) -> (f64, f64) {
        let (row, j) = self.row_of(gridpoint);
        let lon = 360.0 * j as f64 / self.row_counts[row] as f64;
        (self.latitudes[row], normalize_lon(lon))
    }

    fn neighbourhood(&self, gridpoint: usize) -> Vec<usize> {
        let (row, j) = self.row_of(gridpoint);
        let nx = self.row_counts[row];
        let lon = 360.0 * j as f64 / nx as f64;

        let mut points = Vec::with_capacity(9);
        points.push(gridpoint);
        points.push(self.offsets[row] + (j + nx - 1) % nx);
        points.push(self.offsets[row] + (j + 1) % nx);

        for adjacent in [row.wrapping_sub(1), row + 1] {
            if adjacent >= self.row_counts.len() {
                continue;
            }
            let centre = self.point_in_row(adjacent, lon);
            let (_, cj) = self.row_of(centre);
            let anx = self.row_counts[adjacent];
            points.push(centre);
            points.push(self.offsets[adjacent] + (cj + anx - 1) % anx);
            points.push(self.offsets[adjacent] + (cj + 1) % anx);
        }
        points
    }
}

/// Latitudes of the Gauss–Legendre quadrature nodes of degree `n`, in
/// degrees, northernmost first.
///
/// Roots of the Legendre polynomial are found by Newton iteration from the
/// standard Chebyshev initial guess; five iterations reach f64 precision.
fn gauss_legendre_latitudes(n: usize) -> Vec<f64> {
    let mut latitudes = Vec::with_capacity(n);
    for i in 0..n {
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre(n, x);
            let step = p / dp;
            x -= step;
            if step.abs() < 1e-15 {
                break;
            }
        }
        latitudes.push(x.asin().to_degrees());
    }
    // The Chebyshev guess enumerates roots from +1 downwards, so latitudes
    // are already descending; sort defensively against rounding ties.
    latitudes.sort_by(|a, b| b.partial_cmp(a).unwrap());
    latitudes
}

/// Legendre polynomial `P_n(x)` and its derivative by the three-term
/// recurrence.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p = x;
    for k in 2..=n {
        let k = k as f64;
        let next = ((2.0 * k - 1.0) * x * p - (k - 1.0) * p_prev) / k;
        p_prev = p;
        p = next;
    }
    let dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
    (p, dp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octahedral_row_counts() {
        let grid = GaussianGrid::octahedral(4);
        assert_eq!(grid.nx_of(0), 20);
        assert_eq!(grid.nx_of(3), 32);
        assert_eq!(grid.nx_of(4), 32);
        assert_eq!(grid.nx_of(7), 20);
        assert_eq!(grid.count(), 2 * (20 + 24 + 28 + 32));
    }

    #[test]
    fn test_gauss_latitudes_symmetric() {
        let grid = GaussianGrid::octahedral(16);
        let rows = grid.latitudes.len();
        for y in 0..rows / 2 {
            assert!(
                (grid.latitudes[y] + grid.latitudes[rows - 1 - y]).abs() < 1e-10,
                "row {} not mirrored",
                y
            );
        }
        assert!(grid.latitudes[0] > grid.latitudes[1]);
    }

    #[test]
    fn test_gauss_nodes_match_quadrature() {
        // Degree-8 Gauss–Legendre nodes are tabulated: the largest is
        // x = 0.96028985649753623.
        let lats = gauss_legendre_latitudes(8);
        let x = lats[0].to_radians().sin();
        assert!((x - 0.960_289_856_497_536).abs() < 1e-12);
    }

    #[test]
    fn test_o1280_total_count() {
        assert_eq!(GaussianGrid::o1280().count(), 6_599_680);
    }

    #[test]
    fn test_o1280_known_point() {
        // South Pacific point with a tabulated flat index.
        let grid = GaussianGrid::o1280();
        let point = grid.find_point(-51.98594, 174.38531).unwrap();
        assert_eq!(point, 6_005_636);

        let (lat, lon) = grid.coordinates(point);
        assert!((lat + 51.98594).abs() < 1e-4, "lat {}", lat);
        assert!((lon - 174.38531).abs() < 1e-4, "lon {}", lon);
    }

    #[test]
    fn test_neighbourhood_spans_rows() {
        let grid = GaussianGrid::octahedral(16);
        let point = grid.find_point(10.0, 40.0).unwrap();
        let hood = grid.neighbourhood(point);
        assert_eq!(hood.len(), 9);
        assert_eq!(hood[0], point);
        // All neighbours stay within a couple of degrees.
        let (lat0, lon0) = grid.coordinates(point);
        for &n in &hood {
            let (lat, lon) = grid.coordinates(n);
            assert!((lat - lat0).abs() < 2.0 * 180.0 / 32.0 + 1e-9);
            let dlon = (lon - lon0).abs().min(360.0 - (lon - lon0).abs());
            assert!(dlon < 25.0);
        }
    }

    #[test]
    fn test_polar_rows_clamp() {
        let grid = GaussianGrid::octahedral(16);
        assert!(grid.find_point(89.99, 0.0).is_some());
        assert!(grid.find_point(-89.99, 0.0).is_some());
        assert!(grid.find_point(91.0, 0.0).is_none());
    }
}
