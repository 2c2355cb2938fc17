//! Terrain-aware grid point selection.
//!
//! Valley stations sit next to mountain flanks at model resolution; picking
//! the horizontally nearest cell can put a 600 m town on a 1900 m slope.
//! The terrain-optimised lookup searches the immediate neighbourhood for
//! the cell whose model terrain height is closest to the requested target.

use meteo_common::Elevation;

use crate::Grid;

/// How a coordinate is resolved onto a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridSelection {
    /// Horizontally nearest cell.
    #[default]
    Nearest,
    /// Nearest-elevation cell within the 3×3 neighbourhood.
    TerrainOptimised,
}

/// Result of a terrain-aware lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSelection {
    pub gridpoint: usize,
    /// Model terrain height of the selected cell.
    pub elevation: Elevation,
}

/// Maximum tolerated elevation mismatch in metres.
const ELEVATION_TOLERANCE: f32 = 100.0;

/// Pick, within the 3×3 neighbourhood of the nearest cell, the point whose
/// model terrain height best matches `target_elevation`.
///
/// Rules, in order:
/// - target at or below sea level: the nearest sea cell wins regardless of
///   elevation, falling through to terrain matching when no sea cell is in
///   reach;
/// - otherwise the neighbour minimising `|elevation - target|` wins,
///   provided the mismatch stays under 100 m;
/// - no qualifying neighbour: fall back to the nearest cell.
///
/// The neighbourhood is enumerated nearest-first by [`Grid::neighbourhood`],
/// which also bounds the horizontal displacement to 1.5 cell spacings.
pub fn find_point_terrain_optimised(
    grid: &dyn Grid,
    lat: f64,
    lon: f64,
    target_elevation: f32,
    elevation_at: &mut dyn FnMut(usize) -> Elevation,
) -> Option<TerrainSelection> {
    let nearest = grid.find_point(lat, lon)?;
    let neighbourhood = grid.neighbourhood(nearest);

    if target_elevation <= 0.0 {
        for &point in &neighbourhood {
            let elevation = elevation_at(point);
            if elevation.is_sea() {
                return Some(TerrainSelection {
                    gridpoint: point,
                    elevation,
                });
            }
        }
    }

    let mut best: Option<(f32, TerrainSelection)> = None;
    for &point in &neighbourhood {
        let elevation = elevation_at(point);
        let Some(metres) = elevation.metres() else {
            continue;
        };
        let mismatch = (metres - target_elevation).abs();
        if mismatch >= ELEVATION_TOLERANCE {
            continue;
        }
        if best.map_or(true, |(previous, _)| mismatch < previous) {
            best = Some((
                mismatch,
                TerrainSelection {
                    gridpoint: point,
                    elevation,
                },
            ));
        }
    }

    Some(best.map(|(_, selection)| selection).unwrap_or(TerrainSelection {
        gridpoint: nearest,
        elevation: elevation_at(nearest),
    }))
}
