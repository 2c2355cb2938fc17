//! Multi-domain mixer: last-wins composition of point readers.

use std::sync::Arc;

use async_trait::async_trait;
use chunk_archive::StaticKind;
use meteo_common::{Elevation, ReadResult, ReadSettings, TimeRange};
use variables::{Variable, VariableAttributes};

use crate::reader::{PointReader, VariableData};

/// An ordered composition of readers over one coordinate.
///
/// `readers[0]` is the coarsest, least preferred source; the last reader
/// overrides. For every sample the highest-priority reader with a finite
/// value wins. Cumulative variables are spliced continuously across winner
/// changes with an additive offset.
pub struct MultiDomainMixer {
    readers: Vec<Arc<dyn PointReader>>,
}

impl MultiDomainMixer {
    /// Compose readers, lowest priority first. `None` when the list is
    /// empty (every lookup failed).
    pub fn new(readers: Vec<Arc<dyn PointReader>>) -> Option<Self> {
        if readers.is_empty() {
            None
        } else {
            Some(Self { readers })
        }
    }

    fn best(&self) -> &Arc<dyn PointReader> {
        self.readers.last().expect("mixer is never empty")
    }

    /// Splice per-sample winners into one series.
    ///
    /// `series` is ordered highest priority first; the winner of a sample
    /// is the first series with a finite value. When `offset_correct` is
    /// set and the winner changes between consecutive samples, the new
    /// winner's tail is shifted so the transition is continuous, until the
    /// winner changes again.
    fn splice(series: &[Vec<f32>], count: usize, offset_correct: bool) -> Vec<f32> {
        let winner_of = |i: usize| -> Option<usize> {
            series.iter().position(|s| !s[i].is_nan())
        };

        let mut out = vec![f32::NAN; count];
        let mut current: Option<usize> = None;
        let mut shift = 0.0f32;

        for i in 0..count {
            let Some(winner) = winner_of(i) else {
                current = None;
                shift = 0.0;
                continue;
            };

            if current != Some(winner) {
                shift = 0.0;
                if offset_correct && i > 0 {
                    if let Some(previous) = current {
                        // Prefer the seam at the previous step where the old
                        // winner is known good; fall back to an overlap at
                        // the crossover step itself.
                        let new_at_previous = series[winner][i - 1];
                        let old_at_crossover = series[previous][i];
                        if !new_at_previous.is_nan() && !out[i - 1].is_nan() {
                            shift = out[i - 1] - new_at_previous;
                        } else if !old_at_crossover.is_nan() {
                            shift = old_at_crossover - series[winner][i];
                        }
                    }
                }
                current = Some(winner);
            }

            out[i] = series[winner][i] + if offset_correct { shift } else { 0.0 };
        }
        out
    }
}

#[async_trait]
impl PointReader for MultiDomainMixer {
    fn model_latitude(&self) -> f64 {
        self.best().model_latitude()
    }

    fn model_longitude(&self) -> f64 {
        self.best().model_longitude()
    }

    fn model_elevation(&self) -> Elevation {
        self.best().model_elevation()
    }

    fn target_elevation(&self) -> Elevation {
        self.best().target_elevation()
    }

    async fn get(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: ReadSettings,
    ) -> ReadResult<VariableData> {
        let offset_correct = match variable {
            Variable::Raw(raw) => raw.requires_offset_correction_for_mixing(),
            _ => false,
        };
        let count = range.count();

        // Descend from the highest priority; lower readers are only
        // consulted while gaps remain.
        let mut series: Vec<Vec<f32>> = Vec::with_capacity(self.readers.len());
        for reader in self.readers.iter().rev() {
            let covered = |i: usize| series.iter().any(|s: &Vec<f32>| !s[i].is_nan());
            if (0..count).all(covered) {
                break;
            }
            series.push(reader.get(variable, range, settings).await?.data);
        }

        Ok(VariableData {
            data: Self::splice(&series, count, offset_correct),
            unit: variable.unit(),
        })
    }

    async fn prefetch(
        &self,
        variable: Variable,
        range: TimeRange,
        settings: ReadSettings,
    ) -> ReadResult<()> {
        let fetches = self
            .readers
            .iter()
            .map(|reader| reader.prefetch(variable, range, settings));
        futures::future::try_join_all(fetches).await?;
        Ok(())
    }

    async fn get_static(&self, kind: StaticKind) -> ReadResult<Option<f32>> {
        for reader in self.readers.iter().rev() {
            if let Some(value) = reader.get_static(kind).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
