//! Archive writer.
//!
//! Used by the ingest pipeline after normalization and by the test suite to
//! build synthetic archives. Writing is plain synchronous filesystem I/O;
//! nothing on the serving path writes.

use std::io;
use std::path::{Path, PathBuf};

use meteo_common::TimeRange;

use crate::format::{encode_chunk, encode_static, ChunkHeader};
use crate::layout::{ArchiveLayout, ChunkGeometry};
use crate::meta::DomainMeta;
use crate::static_files::StaticKind;

/// Writes one domain's archive under a local root directory.
pub struct ArchiveWriter {
    root: PathBuf,
    layout: ArchiveLayout,
    geometry: ChunkGeometry,
}

impl ArchiveWriter {
    pub fn new(root: impl Into<PathBuf>, domain_key: &str, geometry: ChunkGeometry) -> Self {
        Self {
            root: root.into(),
            layout: ArchiveLayout::new(domain_key),
            geometry,
        }
    }

    fn write_file(&self, relative: &str, data: &[u8]) -> io::Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)
    }

    /// Write a variable's series for every location, splitting it into
    /// chunk files on the domain's chunk raster.
    ///
    /// `values` is indexed `[location][sub_dimension][time]` flattened, with
    /// the time axis covering `range` (which must use the native step).
    pub fn write_series(
        &self,
        variable_file: &str,
        member: u32,
        scalefactor: f32,
        locations: usize,
        sub_dimensions: u32,
        range: TimeRange,
        values: &[f32],
    ) -> io::Result<()> {
        assert_eq!(range.dt, self.geometry.dt, "series must use the native step");
        let samples = range.count();
        assert_eq!(
            values.len(),
            locations * sub_dimensions as usize * samples,
            "value count must match locations * sub_dimensions * samples"
        );

        let directory = ArchiveLayout::member_directory(variable_file, member);

        for index in self.geometry.indices_for(&range) {
            let chunk_range = self.geometry.chunk_range(index);
            let chunk_samples = chunk_range.count();

            let mut chunk_values =
                vec![f32::NAN; locations * sub_dimensions as usize * chunk_samples];
            for location in 0..locations {
                for sub in 0..sub_dimensions as usize {
                    let source_run = (location * sub_dimensions as usize + sub) * samples;
                    let target_run = (location * sub_dimensions as usize + sub) * chunk_samples;
                    for (slot, timestamp) in chunk_range.iter().enumerate() {
                        if let Some(i) = range.index_of(timestamp) {
                            chunk_values[target_run + slot] = values[source_run + i];
                        }
                    }
                }
            }

            let header = ChunkHeader {
                start: chunk_range.start,
                dt: self.geometry.dt,
                samples: chunk_samples as u32,
                locations: locations as u32,
                sub_dimensions,
                scalefactor,
            };
            let encoded = encode_chunk(&header, &chunk_values);
            self.write_file(&self.layout.chunk_file(&directory, index), &encoded)?;
        }
        Ok(())
    }

    /// Write a monolithic master file covering `range` for every location.
    pub fn write_master(
        &self,
        variable_file: &str,
        scalefactor: f32,
        locations: usize,
        range: TimeRange,
        values: &[f32],
    ) -> io::Result<()> {
        let header = ChunkHeader {
            start: range.start,
            dt: range.dt,
            samples: range.count() as u32,
            locations: locations as u32,
            sub_dimensions: 1,
            scalefactor,
        };
        let encoded = encode_chunk(&header, values);
        self.write_file(&self.layout.master_file(variable_file), &encoded)
    }

    /// Write a static file from one value per location.
    pub fn write_static(&self, kind: StaticKind, values: &[f32]) -> io::Result<()> {
        let encoded = encode_static(values);
        self.write_file(&self.layout.static_file(kind.file_name()), &encoded)
    }

    /// Write the domain metadata document.
    pub fn write_meta(&self, meta: &DomainMeta) -> io::Result<()> {
        self.write_file(&self.layout.meta_file(), &meta.to_json())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
