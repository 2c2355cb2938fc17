//! Single-domain point readers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chunk_archive::{DomainArchive, StaticKind};
use grid_geometry::{find_point_terrain_optimised, GridSelection};
use meteo_common::{Elevation, ReadResult, ReadSettings, TimeRange, Unit};
use tracing::debug;
use variables::{RawVariable, Variable, VariableAttributes};

use crate::derived;
use crate::domain::Domain;
use crate::interpolate::{interpolate, SolarContext};

/// Lapse rate applied by the elevation correction, K per metre.
const LAPSE_RATE: f32 = 0.0065;

/// A value series with its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableData {
    pub data: Vec<f32>,
    pub unit: Unit,
}

/// The reader interface shared by single-domain readers and mixers.
#[async_trait]
pub trait PointReader: Send + Sync {
    /// Grid-cell latitude of the highest-priority resolved point.
    fn model_latitude(&self) -> f64;
    /// Grid-cell longitude of the highest-priority resolved point.
    fn model_longitude(&self) -> f64;
    /// Model terrain height of the resolved point.
    fn model_elevation(&self) -> Elevation;
    /// Elevation the caller asked for; defaults to the model elevation.
    fn target_elevation(&self) -> Elevation;

    /// Read one variable over a window. The result always has
    /// `range.count()` samples.
    async fn get(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: ReadSettings,
    ) -> ReadResult<VariableData>;

    /// Advisory prefetch of everything `get` would read.
    async fn prefetch(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: ReadSettings,
    ) -> ReadResult<()>;

    /// Static per-cell value (elevation, soil type).
    async fn get_static(&self, kind: StaticKind) -> ReadResult<Option<f32>>;
}

/// A coordinate resolved onto one domain.
pub struct DomainReader {
    pub(crate) domain: Arc<Domain>,
    pub(crate) archive: Arc<DomainArchive>,
    pub(crate) gridpoint: usize,
    model_lat: f64,
    model_lon: f64,
    model_elevation: Elevation,
    target_elevation: Elevation,
}

impl DomainReader {
    /// Resolve a coordinate on a domain.
    ///
    /// `Ok(None)` when the coordinate is outside the domain's grid. With
    /// terrain-optimised selection the 3×3 neighbourhood elevations are
    /// read from the static terrain file; a missing file degrades to
    /// nearest selection.
    pub async fn open(
        domain: Arc<Domain>,
        archive: Arc<DomainArchive>,
        lat: f64,
        lon: f64,
        elevation: Option<f32>,
        selection: GridSelection,
    ) -> ReadResult<Option<Self>> {
        let Some(nearest) = domain.grid.find_point(lat, lon) else {
            return Ok(None);
        };

        let (gridpoint, model_elevation) = match selection {
            GridSelection::Nearest => {
                let value = archive.read_static(StaticKind::Elevation, nearest).await?;
                (nearest, decode_elevation(value))
            }
            GridSelection::TerrainOptimised => {
                let target = match elevation {
                    Some(metres) => metres,
                    None => archive
                        .read_static(StaticKind::Elevation, nearest)
                        .await?
                        .unwrap_or(f32::NAN),
                };
                if target.is_nan() {
                    let value = archive.read_static(StaticKind::Elevation, nearest).await?;
                    (nearest, decode_elevation(value))
                } else {
                    let mut elevations = HashMap::new();
                    for point in domain.grid.neighbourhood(nearest) {
                        let value = archive.read_static(StaticKind::Elevation, point).await?;
                        elevations.insert(point, decode_elevation(value));
                    }
                    let selected = find_point_terrain_optimised(
                        domain.grid.as_ref(),
                        lat,
                        lon,
                        target,
                        &mut |point| elevations.get(&point).copied().unwrap_or(Elevation::NoData),
                    )
                    .expect("nearest point already resolved");
                    (selected.gridpoint, selected.elevation)
                }
            }
        };

        let (model_lat, model_lon) = domain.grid.coordinates(gridpoint);
        let target_elevation = elevation.map(Elevation::Metres).unwrap_or(model_elevation);

        debug!(
            domain = domain.key.as_str(),
            gridpoint, model_lat, model_lon, "resolved coordinate"
        );

        Ok(Some(Self {
            domain,
            archive,
            gridpoint,
            model_lat,
            model_lon,
            model_elevation,
            target_elevation,
        }))
    }

    pub(crate) fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    fn solar_context(&self) -> SolarContext {
        SolarContext {
            lat: self.model_lat,
            lon: self.model_lon,
        }
    }

    /// The native window a request expands to for this variable.
    fn native_range(&self, raw: RawVariable, range: &TimeRange) -> TimeRange {
        let kind = raw.interpolation();
        if range.dt == self.domain.dt {
            *range
        } else if range.dt < self.domain.dt {
            range.for_interpolation_to(self.domain.dt, kind)
        } else {
            range.for_aggregation_to(self.domain.dt, kind)
        }
    }

    fn archive_routing(&self, settings: &ReadSettings) -> (Option<u32>, u32) {
        if self.domain.packs_members_in_file {
            (
                settings.ensemble_member_level.or(Some(settings.ensemble_member)),
                0,
            )
        } else {
            (settings.ensemble_member_level, settings.ensemble_member)
        }
    }

    /// Read and resample one raw variable.
    pub(crate) async fn read_raw(
        &self,
        raw: RawVariable,
        range: TimeRange,
        settings: ReadSettings,
    ) -> ReadResult<Vec<f32>> {
        let range = if settings.previous_day > 0 {
            range.previous_days(settings.previous_day)
        } else {
            range
        };

        let native = self.native_range(raw, &range);
        let (sub_dimension, member) = self.archive_routing(&settings);

        let mut data = self
            .archive
            .read(&raw.storage_key(), self.gridpoint, sub_dimension, member, native)
            .await?;

        if let Some((multiply, add)) = raw.transform() {
            for value in &mut data {
                *value = *value * multiply + add;
            }
        }

        let mut data = if native == range {
            data
        } else {
            interpolate(
                raw.interpolation(),
                &data,
                &native,
                &range,
                Some(&self.solar_context()),
            )
        };

        if raw.is_elevation_correctable() && raw.unit() == Unit::Celsius {
            if let Some(correction) = self.elevation_correction() {
                for value in &mut data {
                    *value += correction;
                }
            }
        }

        Ok(data)
    }

    /// Prefetch the chunks a raw read would touch.
    pub(crate) async fn prefetch_raw(
        &self,
        raw: RawVariable,
        range: TimeRange,
        settings: ReadSettings,
    ) {
        let range = if settings.previous_day > 0 {
            range.previous_days(settings.previous_day)
        } else {
            range
        };
        let native = self.native_range(raw, &range);
        let (_, member) = self.archive_routing(&settings);
        self.archive.will_need(&raw.storage_key(), member, native).await;
    }

    /// Lapse-rate offset for correctable variables, when both elevations
    /// are known and differ.
    fn elevation_correction(&self) -> Option<f32> {
        let model = self.model_elevation.metres()?;
        let target = self.target_elevation.metres()?;
        if (model - target).abs() < f32::EPSILON {
            return None;
        }
        Some((model - target) * LAPSE_RATE)
    }
}

fn decode_elevation(value: Option<f32>) -> Elevation {
    match value {
        Some(v) => Elevation::from_static_value(v),
        None => Elevation::NoData,
    }
}

#[async_trait]
impl PointReader for DomainReader {
    fn model_latitude(&self) -> f64 {
        self.model_lat
    }

    fn model_longitude(&self) -> f64 {
        self.model_lon
    }

    fn model_elevation(&self) -> Elevation {
        self.model_elevation
    }

    fn target_elevation(&self) -> Elevation {
        self.target_elevation
    }

    async fn get(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: ReadSettings,
    ) -> ReadResult<VariableData> {
        match variable {
            Variable::Raw(raw) => {
                let data = self.read_raw(raw, range, settings).await?;
                Ok(VariableData {
                    data,
                    unit: raw.unit(),
                })
            }
            Variable::SurfaceDerived(v) => derived::get_surface(self, v, range, settings).await,
            Variable::PressureDerived(v) => derived::get_pressure(self, v, range, settings).await,
        }
    }

    async fn prefetch(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: ReadSettings,
    ) -> ReadResult<()> {
        derived::prefetch(self, variable, range, settings).await;
        Ok(())
    }

    async fn get_static(&self, kind: StaticKind) -> ReadResult<Option<f32>> {
        self.archive.read_static(kind, self.gridpoint).await
    }
}
