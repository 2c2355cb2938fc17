//! Point-wise reads from one domain's archive.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use meteo_common::{ReadResult, TimeRange};
use tracing::debug;

use crate::cache::FileCache;
use crate::format::{ChunkHeader, StaticHeader};
use crate::layout::{ArchiveLayout, ChunkGeometry};
use crate::meta::DomainMeta;
use crate::static_files::StaticKind;
use crate::store::{ArchiveStore, StoreDeadlines};

/// Read access to one domain's chunked archive.
///
/// All fetches go through the shared [`FileCache`], so concurrent requests
/// for the same chunk collapse to one download and repeated reads are
/// served from memory.
pub struct DomainArchive {
    store: Arc<dyn ArchiveStore>,
    cache: Arc<FileCache>,
    layout: ArchiveLayout,
    geometry: ChunkGeometry,
    deadlines: StoreDeadlines,
    meta: Option<DomainMeta>,
}

impl DomainArchive {
    /// Open a domain's archive, reading `meta.json` when present.
    ///
    /// A missing metadata document is not fatal: the archive falls back to
    /// `default_chunk_length` and serves chunk files only.
    pub async fn open(
        store: Arc<dyn ArchiveStore>,
        cache: Arc<FileCache>,
        domain_key: &str,
        dt: i64,
        default_chunk_length: usize,
        deadlines: StoreDeadlines,
    ) -> ReadResult<Self> {
        let layout = ArchiveLayout::new(domain_key);

        let meta_path = layout.meta_file();
        let meta = match store.fetch(&meta_path, deadlines.static_file).await? {
            Some(bytes) => Some(DomainMeta::from_json(&bytes, &meta_path)?),
            None => {
                debug!(domain = domain_key, "no meta.json, using defaults");
                None
            }
        };

        let chunk_length = meta
            .as_ref()
            .map(|m| m.chunk_length)
            .unwrap_or(default_chunk_length);

        Ok(Self {
            store,
            cache,
            layout,
            geometry: ChunkGeometry::new(dt, chunk_length),
            deadlines,
            meta,
        })
    }

    pub fn geometry(&self) -> ChunkGeometry {
        self.geometry
    }

    pub fn meta(&self) -> Option<&DomainMeta> {
        self.meta.as_ref()
    }

    pub fn domain_key(&self) -> &str {
        self.layout.domain_key()
    }

    /// Files a native-step read window touches, master file aware.
    fn files_for(&self, variable_file: &str, member: u32, range: &TimeRange) -> Vec<String> {
        let directory = ArchiveLayout::member_directory(variable_file, member);

        if let Some(master) = self.meta.as_ref().and_then(|m| m.master) {
            if master.covers(range) {
                return vec![self.layout.master_file(&directory)];
            }
        }

        self.geometry
            .indices_for(range)
            .map(|index| self.layout.chunk_file(&directory, index))
            .collect()
    }

    /// Read one grid location over a native-step window.
    ///
    /// Returns exactly `range.count()` samples; spans missing from the
    /// archive are NaN. `sub_dimension` selects a pressure or ensemble
    /// level within the file.
    pub async fn read(
        &self,
        variable_file: &str,
        location: usize,
        sub_dimension: Option<u32>,
        member: u32,
        range: TimeRange,
    ) -> ReadResult<Vec<f32>> {
        debug_assert_eq!(range.dt, self.geometry.dt, "archive reads are native-step");
        let mut out = vec![f32::NAN; range.count()];

        let paths = self.files_for(variable_file, member, &range);
        let fetches = paths.iter().map(|path| {
            let store = self.store.clone();
            let deadline = self.deadlines.chunk;
            async move {
                self.cache
                    .get_or_fetch(path, || async move { store.fetch(path, deadline).await })
                    .await
            }
        });
        let files = try_join_all(fetches).await?;

        let sub = sub_dimension.unwrap_or(0) as usize;
        for (path, file) in paths.iter().zip(files) {
            let Some(data) = file else {
                debug!(path = path.as_str(), "chunk missing, filling NaN");
                continue;
            };
            let header = ChunkHeader::parse(&data, path)?;
            if sub >= header.sub_dimensions as usize {
                continue;
            }
            header.decode_point(
                &data,
                location,
                sub,
                range.iter().map(|t| (t - header.start).div_euclid(header.dt)),
                &mut out,
            );
        }

        Ok(out)
    }

    /// Advisory prefetch of every file a read would touch.
    ///
    /// Failures are swallowed: the subsequent read reports them if they
    /// persist. Safe to call redundantly; already-cached and in-flight keys
    /// are no-ops.
    pub async fn will_need(&self, variable_file: &str, member: u32, range: TimeRange) {
        let paths = self.files_for(variable_file, member, &range);
        let fetches = paths.iter().map(|path| {
            let store = self.store.clone();
            let deadline = self.deadlines.chunk;
            async move {
                if let Err(e) = self
                    .cache
                    .get_or_fetch(path, || async move { store.fetch(path, deadline).await })
                    .await
                {
                    debug!(path = path.as_str(), error = %e, "prefetch failed");
                }
            }
        });
        join_all(fetches).await;
    }

    /// Look up one location in a static file.
    ///
    /// `None` when the domain has no such file or the location is missing
    /// from it.
    pub async fn read_static(&self, kind: StaticKind, location: usize) -> ReadResult<Option<f32>> {
        let path = self.layout.static_file(kind.file_name());
        let store = self.store.clone();
        let deadline = self.deadlines.static_file;

        let fetch_path = path.clone();
        let file = self
            .cache
            .get_or_fetch(&path, || async move { store.fetch(&fetch_path, deadline).await })
            .await?;
        let Some(data) = file else {
            return Ok(None);
        };

        let header = StaticHeader::parse(&data, &path)?;
        let value = header.decode_point(&data, location);
        Ok(if value.is_nan() { None } else { Some(value) })
    }
}
