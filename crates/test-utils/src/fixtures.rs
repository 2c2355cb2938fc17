//! Synthetic archive builder.

use std::path::Path;

use chunk_archive::{ArchiveWriter, ChunkGeometry, StaticKind};
use meteo_common::TimeRange;

/// Builds one domain's archive in a temporary directory, writing the same
/// series to every grid location of a small test grid.
pub struct SyntheticArchive {
    writer: ArchiveWriter,
    locations: usize,
}

impl SyntheticArchive {
    /// Archive for `domain_key` under `root` with `locations` grid cells.
    pub fn new(
        root: &Path,
        domain_key: &str,
        dt: i64,
        chunk_length: usize,
        locations: usize,
    ) -> Self {
        Self {
            writer: ArchiveWriter::new(root, domain_key, ChunkGeometry::new(dt, chunk_length)),
            locations,
        }
    }

    /// Write `series` identically to every location.
    pub fn uniform_series(
        &self,
        variable_file: &str,
        scalefactor: f32,
        range: TimeRange,
        series: &[f32],
    ) {
        assert_eq!(series.len(), range.count());
        let values: Vec<f32> = (0..self.locations)
            .flat_map(|_| series.iter().copied())
            .collect();
        self.writer
            .write_series(variable_file, 0, scalefactor, self.locations, 1, range, &values)
            .expect("fixture write");
    }

    /// Write `series` identically to every location for one ensemble
    /// member's file family.
    pub fn uniform_member_series(
        &self,
        variable_file: &str,
        member: u32,
        scalefactor: f32,
        range: TimeRange,
        series: &[f32],
    ) {
        assert_eq!(series.len(), range.count());
        let values: Vec<f32> = (0..self.locations)
            .flat_map(|_| series.iter().copied())
            .collect();
        self.writer
            .write_series(variable_file, member, scalefactor, self.locations, 1, range, &values)
            .expect("fixture write");
    }

    /// Write a per-location elevation field.
    pub fn elevations(&self, values: &[f32]) {
        assert_eq!(values.len(), self.locations);
        self.writer
            .write_static(StaticKind::Elevation, values)
            .expect("fixture write");
    }
}
