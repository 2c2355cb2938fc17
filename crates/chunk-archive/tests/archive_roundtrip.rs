//! End-to-end archive tests: write with the ingest-side writer, read back
//! through the cache and chunk reader.

use std::sync::Arc;

use chunk_archive::{
    ArchiveWriter, ChunkGeometry, DomainArchive, DomainMeta, FileCache, LocalStore, MasterSpan,
    StaticKind, StoreDeadlines,
};
use chrono::{TimeZone, Utc};
use meteo_common::TimeRange;

const DT: i64 = 3600;
const CHUNK_LENGTH: usize = 24;

async fn open_archive(root: &std::path::Path, domain: &str) -> DomainArchive {
    let store = Arc::new(LocalStore::new(root));
    let cache = Arc::new(FileCache::new(16 * 1024 * 1024));
    DomainArchive::open(store, cache, domain, DT, CHUNK_LENGTH, StoreDeadlines::default())
        .await
        .expect("archive opens")
}

fn write_hourly(root: &std::path::Path, domain: &str, variable: &str, locations: usize, hours: usize) {
    let writer = ArchiveWriter::new(root, domain, ChunkGeometry::new(DT, CHUNK_LENGTH));
    let range = TimeRange::with_count(0, hours, DT);
    // Location l, hour t stores l*1000 + t.
    let values: Vec<f32> = (0..locations)
        .flat_map(|l| (0..hours).map(move |t| (l * 1000 + t) as f32))
        .collect();
    writer
        .write_series(variable, 0, 20.0, locations, 1, range, &values)
        .unwrap();
}

#[tokio::test]
async fn read_spans_multiple_chunks() {
    let dir = tempfile::tempdir().unwrap();
    write_hourly(dir.path(), "icon", "temperature_2m", 4, 72);

    let archive = open_archive(dir.path(), "icon").await;
    // 36 hours starting mid-first-chunk: crosses the chunk_0/chunk_1 seam.
    let range = TimeRange::with_count(12 * DT, 36, DT);
    let data = archive.read("temperature_2m", 2, None, 0, range).await.unwrap();

    assert_eq!(data.len(), 36);
    for (i, value) in data.iter().enumerate() {
        let expected = (2000 + 12 + i) as f32;
        assert!(
            (value - expected).abs() < 0.05,
            "sample {}: {} != {}",
            i,
            value,
            expected
        );
    }
}

#[tokio::test]
async fn missing_chunks_fill_nan_without_shortening() {
    let dir = tempfile::tempdir().unwrap();
    // Only 24 hours written; the second day's chunk does not exist.
    write_hourly(dir.path(), "icon", "temperature_2m", 2, 24);

    let archive = open_archive(dir.path(), "icon").await;
    let range = TimeRange::with_count(0, 48, DT);
    let data = archive.read("temperature_2m", 1, None, 0, range).await.unwrap();

    assert_eq!(data.len(), 48, "missing chunks must never shorten the result");
    assert!(!data[23].is_nan());
    assert!(data[24..].iter().all(|v| v.is_nan()));
}

#[tokio::test]
async fn missing_variable_is_all_nan() {
    let dir = tempfile::tempdir().unwrap();
    write_hourly(dir.path(), "icon", "temperature_2m", 2, 24);

    let archive = open_archive(dir.path(), "icon").await;
    let range = TimeRange::with_count(0, 24, DT);
    let data = archive.read("never_ingested", 0, None, 0, range).await.unwrap();
    assert_eq!(data.len(), 24);
    assert!(data.iter().all(|v| v.is_nan()));
}

#[tokio::test]
async fn ensemble_members_are_disjoint_files() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ArchiveWriter::new(dir.path(), "gfs_ens", ChunkGeometry::new(DT, CHUNK_LENGTH));
    let range = TimeRange::with_count(0, 24, DT);
    writer
        .write_series("precipitation", 0, 20.0, 1, 1, range, &vec![1.0; 24])
        .unwrap();
    writer
        .write_series("precipitation", 3, 20.0, 1, 1, range, &vec![7.0; 24])
        .unwrap();

    let archive = open_archive(dir.path(), "gfs_ens").await;
    let control = archive.read("precipitation", 0, None, 0, range).await.unwrap();
    let member = archive.read("precipitation", 0, None, 3, range).await.unwrap();
    assert!((control[5] - 1.0).abs() < 0.05);
    assert!((member[5] - 7.0).abs() < 0.05);
}

#[tokio::test]
async fn sub_dimension_selects_level() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ArchiveWriter::new(dir.path(), "icon", ChunkGeometry::new(DT, CHUNK_LENGTH));
    let range = TimeRange::with_count(0, 24, DT);
    // Two levels: level 0 stores 10s, level 1 stores 20s.
    let values: Vec<f32> = std::iter::repeat(10.0)
        .take(24)
        .chain(std::iter::repeat(20.0).take(24))
        .collect();
    writer
        .write_series("temperature", 0, 20.0, 1, 2, range, &values)
        .unwrap();

    let archive = open_archive(dir.path(), "icon").await;
    let level0 = archive.read("temperature", 0, Some(0), 0, range).await.unwrap();
    let level1 = archive.read("temperature", 0, Some(1), 0, range).await.unwrap();
    let level9 = archive.read("temperature", 0, Some(9), 0, range).await.unwrap();
    assert!((level0[0] - 10.0).abs() < 0.05);
    assert!((level1[0] - 20.0).abs() < 0.05);
    assert!(level9.iter().all(|v| v.is_nan()), "absent level reads as missing");
}

#[tokio::test]
async fn master_file_bypasses_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let geometry = ChunkGeometry::new(DT, CHUNK_LENGTH);
    let writer = ArchiveWriter::new(dir.path(), "reanalysis", geometry);

    let master_range = TimeRange::with_count(0, 100, DT);
    let values: Vec<f32> = (0..100).map(|t| t as f32).collect();
    writer
        .write_master("temperature_2m", 20.0, 1, master_range, &values)
        .unwrap();
    writer
        .write_meta(&DomainMeta {
            last_run: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            valid_times: master_range.iter().collect(),
            chunk_length: CHUNK_LENGTH,
            master: Some(MasterSpan {
                start: 0,
                end: 100 * DT,
            }),
        })
        .unwrap();

    let archive = open_archive(dir.path(), "reanalysis").await;
    // In-span read: served by master.dat although no chunk files exist.
    let range = TimeRange::with_count(30 * DT, 20, DT);
    let data = archive.read("temperature_2m", 0, None, 0, range).await.unwrap();
    assert!((data[0] - 30.0).abs() < 0.05);
    assert!((data[19] - 49.0).abs() < 0.05);

    // Out-of-span read falls back to (absent) chunks.
    let outside = TimeRange::with_count(90 * DT, 20, DT);
    let data = archive.read("temperature_2m", 0, None, 0, outside).await.unwrap();
    assert!(data.iter().all(|v| v.is_nan()));
}

#[tokio::test]
async fn static_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ArchiveWriter::new(dir.path(), "icon", ChunkGeometry::new(DT, CHUNK_LENGTH));
    writer
        .write_static(StaticKind::Elevation, &[650.0, -999.0, f32::NAN])
        .unwrap();

    let archive = open_archive(dir.path(), "icon").await;
    assert_eq!(
        archive.read_static(StaticKind::Elevation, 0).await.unwrap(),
        Some(650.0)
    );
    assert_eq!(
        archive.read_static(StaticKind::Elevation, 1).await.unwrap(),
        Some(-999.0)
    );
    assert_eq!(archive.read_static(StaticKind::Elevation, 2).await.unwrap(), None);
    assert_eq!(archive.read_static(StaticKind::SoilType, 0).await.unwrap(), None);
}

#[tokio::test]
async fn prefetch_then_read_hits_cache() {
    let dir = tempfile::tempdir().unwrap();
    write_hourly(dir.path(), "icon", "temperature_2m", 2, 48);

    let store = Arc::new(LocalStore::new(dir.path()));
    let cache = Arc::new(FileCache::new(16 * 1024 * 1024));
    let archive = DomainArchive::open(
        store,
        cache.clone(),
        "icon",
        DT,
        CHUNK_LENGTH,
        StoreDeadlines::default(),
    )
    .await
    .unwrap();

    let range = TimeRange::with_count(0, 48, DT);
    archive.will_need("temperature_2m", 0, range).await;
    archive.will_need("temperature_2m", 0, range).await;

    let misses_after_prefetch = cache.stats().misses;
    let data = archive.read("temperature_2m", 0, None, 0, range).await.unwrap();
    assert_eq!(data.len(), 48);
    assert_eq!(
        cache.stats().misses,
        misses_after_prefetch,
        "read after prefetch must be pure cache hits"
    );
}
