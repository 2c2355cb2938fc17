//! Model domain registrations.
//!
//! A domain is one NWP model deployment: a grid, a native time step, an
//! update cadence and an archive layout. Registrations are immutable and
//! process-wide; the registry is built explicitly at startup and handed
//! around as an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use chunk_archive::{ArchiveStore, DomainArchive, FileCache, StoreDeadlines};
use grid_geometry::{
    GaussianGrid, Grid, LambertAzimuthalEqualArea, LambertConformalConic, PolarStereographic,
    ProjectedGrid, RegularGrid, RotatedGrid,
};
use meteo_common::ReadResult;
use tokio::sync::Mutex;

/// Mean earth radius used by the projected regional grids.
const EARTH_RADIUS: f64 = 6_371_229.0;

/// Every registered model domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKey {
    IconGlobal,
    IconEu,
    IconD2,
    IconD2_15min,
    EcmwfIfs,
    Gfs025,
    Hrrr,
    ArpegeEurope,
    AromeFrance,
    KnmiHarmonie,
    MetNoNordic,
    JmaMsm,
    GemGlobal,
    GemRegional,
    /// ICON-EPS, members packed into the chunk sub-dimension.
    IconEps,
    /// ICON-D2-EPS, members stored as disjoint file families. Grid and
    /// archive cadence are aliased from ICON-D2 until the EPS archive
    /// carries its own grid description.
    IconD2Eps,
}

impl DomainKey {
    /// Archive directory key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IconGlobal => "icon",
            Self::IconEu => "icon_eu",
            Self::IconD2 => "icon_d2",
            Self::IconD2_15min => "icon_d2_15min",
            Self::EcmwfIfs => "ecmwf_ifs",
            Self::Gfs025 => "gfs025",
            Self::Hrrr => "hrrr",
            Self::ArpegeEurope => "arpege_europe",
            Self::AromeFrance => "arome_france",
            Self::KnmiHarmonie => "knmi_harmonie",
            Self::MetNoNordic => "metno_nordic",
            Self::JmaMsm => "jma_msm",
            Self::GemGlobal => "gem_global",
            Self::GemRegional => "gem_regional",
            Self::IconEps => "icon_eps",
            Self::IconD2Eps => "icon_d2_eps",
        }
    }
}

/// One registered model source.
pub struct Domain {
    pub key: DomainKey,
    pub grid: Arc<dyn Grid>,
    /// Native time step in seconds.
    pub dt: i64,
    /// Default time steps per chunk file, overridable by `meta.json`.
    pub chunk_length: usize,
    /// Model update cadence in seconds.
    pub update_interval: i64,
    /// Ensemble size; 1 for deterministic runs.
    pub ensemble_members: u32,
    /// Whether members share one file (chunk sub-dimension) or live in
    /// disjoint file families.
    pub packs_members_in_file: bool,
}

impl Domain {
    fn new(key: DomainKey, grid: Arc<dyn Grid>, dt: i64, update_interval: i64) -> Self {
        Self {
            key,
            grid,
            dt,
            chunk_length: (7 * 86_400 / dt) as usize,
            update_interval,
            ensemble_members: 1,
            packs_members_in_file: false,
        }
    }

    fn with_members(mut self, members: u32, packed: bool) -> Self {
        self.ensemble_members = members;
        self.packs_members_in_file = packed;
        self
    }
}

fn icon_d2_grid() -> Arc<dyn Grid> {
    Arc::new(RotatedGrid::new(
        40.0,
        -170.0,
        RegularGrid::new(1215, 746, -6.3, -7.5, 0.02, 0.02),
    ))
}

fn build_domain(key: DomainKey) -> Domain {
    match key {
        DomainKey::IconGlobal => Domain::new(
            key,
            Arc::new(RegularGrid::new(2880, 1441, -90.0, -180.0, 0.125, 0.125)),
            10_800,
            6 * 3600,
        ),
        DomainKey::IconEu => Domain::new(
            key,
            Arc::new(RegularGrid::new(1377, 657, 29.5, -23.5, 0.0625, 0.0625)),
            3600,
            3 * 3600,
        ),
        DomainKey::IconD2 => Domain::new(key, icon_d2_grid(), 3600, 3 * 3600),
        DomainKey::IconD2_15min => Domain::new(key, icon_d2_grid(), 900, 3 * 3600),
        DomainKey::EcmwfIfs => Domain::new(
            key,
            {
                let grid: &'static GaussianGrid = GaussianGrid::o1280();
                Arc::new(StaticGrid(grid))
            },
            10_800,
            6 * 3600,
        ),
        DomainKey::Gfs025 => Domain::new(
            key,
            Arc::new(RegularGrid::new(1440, 721, -90.0, -180.0, 0.25, 0.25)),
            3600,
            6 * 3600,
        ),
        DomainKey::Hrrr => Domain::new(
            key,
            Arc::new(ProjectedGrid::new(
                LambertConformalConic::new(-97.5, 38.5, 38.5, 38.5, EARTH_RADIUS),
                21.138123,
                -122.719528,
                3000.0,
                3000.0,
                1799,
                1059,
            )),
            3600,
            3600,
        ),
        DomainKey::ArpegeEurope => Domain::new(
            key,
            Arc::new(RegularGrid::new(741, 521, 20.0, -32.0, 0.1, 0.1)),
            3600,
            6 * 3600,
        ),
        DomainKey::AromeFrance => Domain::new(
            key,
            Arc::new(ProjectedGrid::new(
                LambertConformalConic::new(2.0, 46.5, 46.5, 46.5, EARTH_RADIUS),
                37.5,
                -12.0,
                2500.0,
                2500.0,
                1121,
                717,
            )),
            3600,
            3 * 3600,
        ),
        DomainKey::KnmiHarmonie => Domain::new(
            key,
            Arc::new(ProjectedGrid::new(
                LambertAzimuthalEqualArea::new(52.5, 5.0, EARTH_RADIUS),
                49.0,
                0.0,
                2000.0,
                2000.0,
                390,
                390,
            )),
            3600,
            6 * 3600,
        ),
        DomainKey::MetNoNordic => Domain::new(
            key,
            Arc::new(ProjectedGrid::new(
                LambertConformalConic::new(15.0, 63.0, 63.0, 63.0, EARTH_RADIUS),
                52.3,
                1.9,
                2500.0,
                2500.0,
                1796,
                2321,
            )),
            3600,
            3600,
        ),
        DomainKey::JmaMsm => Domain::new(
            key,
            Arc::new(RegularGrid::new(481, 505, 22.4, 120.0, 0.0625, 0.05)),
            3600,
            3 * 3600,
        ),
        DomainKey::GemGlobal => Domain::new(
            key,
            Arc::new(RegularGrid::new(2400, 1201, -90.0, -180.0, 0.15, 0.15)),
            10_800,
            12 * 3600,
        ),
        DomainKey::GemRegional => Domain::new(
            key,
            Arc::new(ProjectedGrid::new(
                PolarStereographic::new(-111.0, 60.0, EARTH_RADIUS),
                18.14,
                -142.9,
                10_000.0,
                10_000.0,
                935,
                824,
            )),
            3600,
            6 * 3600,
        ),
        DomainKey::IconEps => Domain::new(
            key,
            Arc::new(RegularGrid::new(1440, 721, -90.0, -180.0, 0.25, 0.25)),
            10_800,
            6 * 3600,
        )
        .with_members(40, true),
        DomainKey::IconD2Eps => {
            Domain::new(key, icon_d2_grid(), 3600, 3 * 3600).with_members(20, false)
        }
    }
}

/// Adapter exposing the process-wide O1280 table through the grid trait.
struct StaticGrid(&'static GaussianGrid);

impl Grid for StaticGrid {
    fn count(&self) -> usize {
        self.0.count()
    }
    fn find_point(&self, lat: f64, lon: f64) -> Option<usize> {
        self.0.find_point(lat, lon)
    }
    fn coordinates(&self, gridpoint: usize) -> (f64, f64) {
        self.0.coordinates(gridpoint)
    }
    fn neighbourhood(&self, gridpoint: usize) -> Vec<usize> {
        self.0.neighbourhood(gridpoint)
    }
}

/// Process-wide domain registry and archive handles.
///
/// Built once at startup around a store and a shared file cache; archives
/// are opened lazily per domain (the first open reads `meta.json`) and then
/// shared by every request.
pub struct DomainRegistry {
    store: Arc<dyn ArchiveStore>,
    cache: Arc<FileCache>,
    deadlines: StoreDeadlines,
    domains: HashMap<DomainKey, Arc<Domain>>,
    archives: Mutex<HashMap<DomainKey, Arc<DomainArchive>>>,
}

impl DomainRegistry {
    pub fn new(store: Arc<dyn ArchiveStore>, cache: Arc<FileCache>, deadlines: StoreDeadlines) -> Self {
        let mut domains = HashMap::new();
        for key in [
            DomainKey::IconGlobal,
            DomainKey::IconEu,
            DomainKey::IconD2,
            DomainKey::IconD2_15min,
            DomainKey::EcmwfIfs,
            DomainKey::Gfs025,
            DomainKey::Hrrr,
            DomainKey::ArpegeEurope,
            DomainKey::AromeFrance,
            DomainKey::KnmiHarmonie,
            DomainKey::MetNoNordic,
            DomainKey::JmaMsm,
            DomainKey::GemGlobal,
            DomainKey::GemRegional,
            DomainKey::IconEps,
            DomainKey::IconD2Eps,
        ] {
            domains.insert(key, Arc::new(build_domain(key)));
        }
        Self {
            store,
            cache,
            deadlines,
            domains,
            archives: Mutex::new(HashMap::new()),
        }
    }

    pub fn domain(&self, key: DomainKey) -> Arc<Domain> {
        self.domains.get(&key).expect("every key is registered").clone()
    }

    pub fn cache(&self) -> &Arc<FileCache> {
        &self.cache
    }

    /// The shared archive handle of a domain, opened on first use.
    pub async fn archive(&self, key: DomainKey) -> ReadResult<Arc<DomainArchive>> {
        let mut archives = self.archives.lock().await;
        if let Some(archive) = archives.get(&key) {
            return Ok(archive.clone());
        }
        let domain = self.domain(key);
        let archive = Arc::new(
            DomainArchive::open(
                self.store.clone(),
                self.cache.clone(),
                key.as_str(),
                domain.dt,
                domain.chunk_length,
                self.deadlines,
            )
            .await?,
        );
        archives.insert(key, archive.clone());
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_length_default_is_one_week() {
        let hourly = build_domain(DomainKey::IconEu);
        assert_eq!(hourly.chunk_length, 168);
        let three_hourly = build_domain(DomainKey::IconGlobal);
        assert_eq!(three_hourly.chunk_length, 56);
        let sub_hourly = build_domain(DomainKey::IconD2_15min);
        assert_eq!(sub_hourly.chunk_length, 672);
    }

    #[test]
    fn test_eps_aliases_d2_grid() {
        let d2 = build_domain(DomainKey::IconD2);
        let eps = build_domain(DomainKey::IconD2Eps);
        assert_eq!(d2.grid.count(), eps.grid.count());
        assert_eq!(eps.ensemble_members, 20);
        assert!(!eps.packs_members_in_file);
        assert!(build_domain(DomainKey::IconEps).packs_members_in_file);
    }

    #[test]
    fn test_domain_coverage() {
        // Central Europe is on the global, EU and D2 grids; CONUS is not
        // on D2 but is on HRRR.
        let d2 = build_domain(DomainKey::IconD2);
        let hrrr = build_domain(DomainKey::Hrrr);
        assert!(d2.grid.find_point(46.88, 8.67).is_some());
        assert!(d2.grid.find_point(39.0, -94.5).is_none());
        assert!(hrrr.grid.find_point(39.0, -94.5).is_some());
    }
}
