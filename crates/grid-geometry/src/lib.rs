//! Grid geometry for NWP model domains.
//!
//! Every supported grid maps between geographic coordinates and a flat
//! enumeration of cells:
//!
//! - regular latitude/longitude (with longitude wrap for global grids)
//! - rotated latitude/longitude (COSMO/ICON style rotated pole)
//! - Lambert conformal conic (HRRR, AROME, MetNo)
//! - Lambert azimuthal equal-area (KNMI Harmonie)
//! - polar stereographic (GEM regional)
//! - reduced Gaussian octahedral O1280 (ECMWF IFS)
//!
//! Concrete grids expose fractional `forward`/`inverse` transforms; the
//! object-safe [`Grid`] trait covers what the reader needs: cell count,
//! nearest-point lookup, cell coordinates and the 3×3 neighbourhood used by
//! terrain-aware selection.

pub mod gaussian;
pub mod lambert_azimuthal;
pub mod lambert_conformal;
pub mod projected;
pub mod regular;
pub mod rotated;
pub mod stereographic;
pub mod terrain;

pub use gaussian::GaussianGrid;
pub use lambert_azimuthal::LambertAzimuthalEqualArea;
pub use lambert_conformal::LambertConformalConic;
pub use projected::{ProjectedGrid, Projection};
pub use regular::RegularGrid;
pub use rotated::RotatedGrid;
pub use stereographic::PolarStereographic;
pub use terrain::{find_point_terrain_optimised, GridSelection, TerrainSelection};

/// A model grid: a flat enumeration of cells with geographic lookup.
///
/// Implementations must be cheap to share (`Arc<dyn Grid>`) and free of
/// interior mutability; all expensive tables are built at construction.
pub trait Grid: Send + Sync {
    /// Total number of grid points.
    fn count(&self) -> usize;

    /// Nearest grid point to a geographic coordinate, or `None` when the
    /// coordinate is outside the grid.
    fn find_point(&self, lat: f64, lon: f64) -> Option<usize>;

    /// Geographic coordinates of a grid point as (lat, lon) degrees.
    fn coordinates(&self, gridpoint: usize) -> (f64, f64);

    /// The grid point itself and its direct neighbours, nearest-first:
    /// centre, edge-adjacent, then diagonal. Used by terrain-optimised
    /// selection; all returned points are within 1.5 cell spacings.
    fn neighbourhood(&self, gridpoint: usize) -> Vec<usize>;
}

/// Neighbour offsets ordered centre, edges, diagonals.
pub(crate) const NEIGHBOUR_OFFSETS: [(i64, i64); 9] = [
    (0, 0),
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Normalize a longitude to [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == 180.0 {
        -180.0
    } else {
        wrapped
    }
}
