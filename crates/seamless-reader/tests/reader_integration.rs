//! End-to-end reader tests over synthetic archives.

use std::sync::Arc;

use chunk_archive::{DomainArchive, FileCache, LocalStore, StoreDeadlines};
use grid_geometry::{GridSelection, RegularGrid};
use meteo_common::{Elevation, ReadSettings, TimeRange};
use seamless_reader::{Domain, DomainKey, DomainReader, MultiDomainMixer, PointReader};
use test_utils::SyntheticArchive;
use variables::{SurfaceDerived, SurfaceVariable};

const DT: i64 = 3600;
const CHUNK_LENGTH: usize = 168;
const LOCATIONS: usize = 100;

/// A 10×10 one-tenth-degree grid over the central Alps.
fn small_domain(key: DomainKey, dt: i64) -> Arc<Domain> {
    Arc::new(Domain {
        key,
        grid: Arc::new(RegularGrid::new(10, 10, 46.0, 8.0, 0.1, 0.1)),
        dt,
        chunk_length: CHUNK_LENGTH,
        update_interval: 3600,
        ensemble_members: 1,
        packs_members_in_file: false,
    })
}

async fn open_reader(
    root: &std::path::Path,
    cache: Arc<FileCache>,
    domain: Arc<Domain>,
    elevation: Option<f32>,
    selection: GridSelection,
) -> DomainReader {
    let store = Arc::new(LocalStore::new(root));
    let archive = Arc::new(
        DomainArchive::open(
            store,
            cache,
            domain.key.as_str(),
            domain.dt,
            domain.chunk_length,
            StoreDeadlines::default(),
        )
        .await
        .unwrap(),
    );
    DomainReader::open(domain, archive, 46.5, 8.4, elevation, selection)
        .await
        .unwrap()
        .expect("coordinate is on the test grid")
}

fn cache() -> Arc<FileCache> {
    Arc::new(FileCache::new(64 * 1024 * 1024))
}

#[tokio::test]
async fn native_read_applies_scaling_only() {
    let dir = tempfile::tempdir().unwrap();
    let archive = SyntheticArchive::new(dir.path(), "icon_eu", DT, CHUNK_LENGTH, LOCATIONS);
    let range = TimeRange::with_count(0, 24, DT);
    let series: Vec<f32> = (0..24).map(|h| 10.0 + h as f32 * 0.5).collect();
    archive.uniform_series("temperature_2m", 20.0, range, &series);

    let reader = open_reader(
        dir.path(),
        cache(),
        small_domain(DomainKey::IconEu, DT),
        None,
        GridSelection::Nearest,
    )
    .await;

    let result = reader
        .get(SurfaceVariable::Temperature2m.into(), range, ReadSettings::default())
        .await
        .unwrap();

    assert_eq!(result.data.len(), 24);
    for (value, want) in result.data.iter().zip(&series) {
        assert!((value - want).abs() < 0.05, "{} vs {}", value, want);
    }
}

#[tokio::test]
async fn refining_interpolation_matches_sample_points() {
    // 3-hourly archive read at 1-hourly resolution: the native sample
    // instants must reproduce exactly, in-between values smoothly.
    let dir = tempfile::tempdir().unwrap();
    let dt = 3 * DT;
    let archive = SyntheticArchive::new(dir.path(), "icon", dt, 56, LOCATIONS);
    let native_range = TimeRange::with_count(0, 16, dt);
    let series: Vec<f32> = (0..16).map(|i| (i as f32 * 0.7).sin() * 10.0).collect();
    archive.uniform_series("temperature_2m", 20.0, native_range, &series);

    let reader = open_reader(
        dir.path(),
        cache(),
        small_domain(DomainKey::IconGlobal, dt),
        None,
        GridSelection::Nearest,
    )
    .await;

    let target = TimeRange::with_count(3 * DT, 36, DT);
    let result = reader
        .get(SurfaceVariable::Temperature2m.into(), target, ReadSettings::default())
        .await
        .unwrap();

    assert_eq!(result.data.len(), 36);
    assert!(result.data.iter().all(|v| !v.is_nan()));
    for (i, t) in target.iter().enumerate() {
        if let Some(native_index) = native_range.index_of(meteo_common::time::floor_to(t, dt)) {
            if t % dt == 0 {
                assert!(
                    (result.data[i] - series[native_index]).abs() < 0.06,
                    "native instant {} must reproduce",
                    i
                );
            }
        }
    }
}

#[tokio::test]
async fn elevation_correction_is_reversible() {
    let dir = tempfile::tempdir().unwrap();
    let archive = SyntheticArchive::new(dir.path(), "icon_eu", DT, CHUNK_LENGTH, LOCATIONS);
    let range = TimeRange::with_count(0, 6, DT);
    archive.uniform_series("temperature_2m", 20.0, range, &[20.0; 6]);
    archive.elevations(&[1000.0; LOCATIONS]);

    // Target equals model elevation: raw values.
    let reader = open_reader(
        dir.path(),
        cache(),
        small_domain(DomainKey::IconEu, DT),
        Some(1000.0),
        GridSelection::Nearest,
    )
    .await;
    let result = reader
        .get(SurfaceVariable::Temperature2m.into(), range, ReadSettings::default())
        .await
        .unwrap();
    assert!((result.data[0] - 20.0).abs() < 0.05);

    // Target 100 m below the model cell: lapse-rate warmer by 0.65 K.
    let reader = open_reader(
        dir.path(),
        cache(),
        small_domain(DomainKey::IconEu, DT),
        Some(900.0),
        GridSelection::Nearest,
    )
    .await;
    let corrected = reader
        .get(SurfaceVariable::Temperature2m.into(), range, ReadSettings::default())
        .await
        .unwrap();
    assert!(
        (corrected.data[0] - 20.65).abs() < 0.06,
        "got {}",
        corrected.data[0]
    );

    // Precipitation is never elevation corrected.
    archive.uniform_series("precipitation", 10.0, range, &[1.0; 6]);
    let precipitation = reader
        .get(SurfaceVariable::Precipitation.into(), range, ReadSettings::default())
        .await
        .unwrap();
    assert!((precipitation.data[0] - 1.0).abs() < 0.11);
}

#[tokio::test]
async fn terrain_optimised_selection_picks_matching_cell() {
    let dir = tempfile::tempdir().unwrap();
    let archive = SyntheticArchive::new(dir.path(), "icon_d2", DT, CHUNK_LENGTH, LOCATIONS);
    let range = TimeRange::with_count(0, 6, DT);
    archive.uniform_series("temperature_2m", 20.0, range, &[5.0; 6]);

    // Ridge everywhere, except a valley cell west of the nearest point.
    let mut elevations = vec![1900.0_f32; LOCATIONS];
    elevations[53] = 620.0;
    elevations[54] = 1906.0;
    archive.elevations(&elevations);

    let nearest = open_reader(
        dir.path(),
        cache(),
        small_domain(DomainKey::IconD2, DT),
        Some(650.0),
        GridSelection::Nearest,
    )
    .await;
    assert_eq!(nearest.model_elevation(), Elevation::Metres(1906.0));

    let optimised = open_reader(
        dir.path(),
        cache(),
        small_domain(DomainKey::IconD2, DT),
        Some(650.0),
        GridSelection::TerrainOptimised,
    )
    .await;
    assert_eq!(optimised.model_elevation(), Elevation::Metres(620.0));
}

#[tokio::test]
async fn derived_wind_from_components() {
    let dir = tempfile::tempdir().unwrap();
    let archive = SyntheticArchive::new(dir.path(), "icon_eu", DT, CHUNK_LENGTH, LOCATIONS);
    let range = TimeRange::with_count(0, 6, DT);
    archive.uniform_series("wind_u_component_10m", 10.0, range, &[3.0; 6]);
    archive.uniform_series("wind_v_component_10m", 10.0, range, &[4.0; 6]);

    let reader = open_reader(
        dir.path(),
        cache(),
        small_domain(DomainKey::IconEu, DT),
        None,
        GridSelection::Nearest,
    )
    .await;

    let speed = reader
        .get(SurfaceDerived::WindSpeed10m.into(), range, ReadSettings::default())
        .await
        .unwrap();
    assert!((speed.data[0] - 5.0).abs() < 0.02, "got {}", speed.data[0]);

    let direction = reader
        .get(SurfaceDerived::WindDirection10m.into(), range, ReadSettings::default())
        .await
        .unwrap();
    // u=3, v=4 blows towards the north-east, so it comes from the
    // south-west (around 217°).
    assert!(
        (direction.data[0] - 216.87).abs() < 1.0,
        "got {}",
        direction.data[0]
    );
}

#[tokio::test]
async fn apparent_temperature_prefetches_exactly_its_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let archive = SyntheticArchive::new(dir.path(), "icon_eu", DT, CHUNK_LENGTH, LOCATIONS);
    let range = TimeRange::with_count(0, 24, DT);
    archive.uniform_series("temperature_2m", 20.0, range, &[20.0; 24]);
    archive.uniform_series("relative_humidity_2m", 1.0, range, &[60.0; 24]);
    archive.uniform_series("wind_u_component_10m", 10.0, range, &[2.0; 24]);
    archive.uniform_series("wind_v_component_10m", 10.0, range, &[1.0; 24]);
    archive.uniform_series("shortwave_radiation", 1.0, range, &[300.0; 24]);
    // A decoy variable that must not be touched.
    archive.uniform_series("precipitation", 10.0, range, &[0.0; 24]);

    let shared_cache = cache();
    let reader = open_reader(
        dir.path(),
        shared_cache.clone(),
        small_domain(DomainKey::IconEu, DT),
        None,
        GridSelection::Nearest,
    )
    .await;

    reader
        .prefetch(
            SurfaceDerived::ApparentTemperature.into(),
            range,
            ReadSettings::default(),
        )
        .await
        .unwrap();

    let stats = shared_cache.stats();
    assert_eq!(
        stats.entries, 5,
        "exactly the five prerequisite chunk files are fetched"
    );

    // The evaluation itself is then served from cache.
    let misses_before = stats.misses;
    let result = reader
        .get(
            SurfaceDerived::ApparentTemperature.into(),
            range,
            ReadSettings::default(),
        )
        .await
        .unwrap();
    assert_eq!(result.data.len(), 24);
    assert!(result.data.iter().all(|v| !v.is_nan()));
    assert_eq!(shared_cache.stats().misses, misses_before);
}

#[tokio::test]
async fn mixer_prefers_regional_and_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let range = TimeRange::with_count(0, 13, DT);

    let global = SyntheticArchive::new(dir.path(), "icon", DT, CHUNK_LENGTH, LOCATIONS);
    global.uniform_series("temperature_2m", 20.0, range, &[10.0; 13]);

    let regional = SyntheticArchive::new(dir.path(), "icon_d2", DT, CHUNK_LENGTH, LOCATIONS);
    let short_range = TimeRange::with_count(0, 7, DT);
    regional.uniform_series("temperature_2m", 20.0, short_range, &[12.0; 7]);

    let shared_cache = cache();
    let global_reader = open_reader(
        dir.path(),
        shared_cache.clone(),
        small_domain(DomainKey::IconGlobal, DT),
        None,
        GridSelection::Nearest,
    )
    .await;
    let regional_reader = open_reader(
        dir.path(),
        shared_cache,
        small_domain(DomainKey::IconD2, DT),
        None,
        GridSelection::Nearest,
    )
    .await;

    let mixer = MultiDomainMixer::new(vec![
        Arc::new(global_reader) as Arc<dyn PointReader>,
        Arc::new(regional_reader) as Arc<dyn PointReader>,
    ])
    .unwrap();

    let result = mixer
        .get(SurfaceVariable::Temperature2m.into(), range, ReadSettings::default())
        .await
        .unwrap();

    assert_eq!(result.data.len(), 13);
    for (i, value) in result.data.iter().enumerate() {
        let want = if i < 7 { 12.0 } else { 10.0 };
        assert!((value - want).abs() < 0.05, "sample {}: {} vs {}", i, value, want);
    }
}

#[tokio::test]
async fn ensemble_precipitation_probability() {
    let dir = tempfile::tempdir().unwrap();
    let archive = SyntheticArchive::new(dir.path(), "icon_d2_eps", DT, CHUNK_LENGTH, LOCATIONS);
    let range = TimeRange::with_count(0, 6, DT);
    archive.uniform_member_series("precipitation", 0, 10.0, range, &[0.0; 6]);
    archive.uniform_member_series("precipitation", 1, 10.0, range, &[1.0; 6]);
    archive.uniform_member_series("precipitation", 2, 10.0, range, &[2.0; 6]);

    let domain = Arc::new(Domain {
        key: DomainKey::IconD2Eps,
        grid: Arc::new(RegularGrid::new(10, 10, 46.0, 8.0, 0.1, 0.1)),
        dt: DT,
        chunk_length: CHUNK_LENGTH,
        update_interval: 3600,
        ensemble_members: 3,
        packs_members_in_file: false,
    });
    let store = Arc::new(LocalStore::new(dir.path()));
    let archive_handle = Arc::new(
        DomainArchive::open(store, cache(), "icon_d2_eps", DT, CHUNK_LENGTH, StoreDeadlines::default())
            .await
            .unwrap(),
    );
    let reader = DomainReader::open(
        domain,
        archive_handle,
        46.5,
        8.4,
        None,
        GridSelection::Nearest,
    )
    .await
    .unwrap()
    .unwrap();

    let result = reader
        .get(
            SurfaceDerived::PrecipitationProbability.into(),
            range,
            ReadSettings::default(),
        )
        .await
        .unwrap();

    // Two of three members above 0.1 mm.
    for value in &result.data {
        assert!((value - 66.666).abs() < 0.1, "got {}", value);
    }
}
