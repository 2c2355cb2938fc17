//! Seamless model selection.
//!
//! A model token resolves to an ordered stack of single-domain readers for
//! a coordinate: always the global models, regional models where their
//! grids cover the point, high-resolution overlays on top, and an
//! ensemble-probability reader at the head of the list so probability
//! variables resolve even though the deterministic readers cannot serve
//! them.

use std::sync::Arc;

use grid_geometry::GridSelection;
use meteo_common::{ReadResult, ReadSettings, TimeRange};
use tracing::warn;
use variables::Variable;

use crate::domain::{DomainKey, DomainRegistry};
use crate::mixer::MultiDomainMixer;
use crate::reader::{DomainReader, PointReader};

/// A requestable model token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelToken {
    /// Region-aware stack fusing the best available models.
    BestMatch,
    IconSeamless,
    GfsSeamless,
    GemSeamless,
    MeteoFranceSeamless,
    /// Exactly one domain.
    Single(DomainKey),
}

impl ModelToken {
    /// Parse a request token.
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "best_match" => Self::BestMatch,
            "icon_seamless" => Self::IconSeamless,
            "gfs_seamless" => Self::GfsSeamless,
            "gem_seamless" => Self::GemSeamless,
            "meteofrance_seamless" => Self::MeteoFranceSeamless,
            "icon" | "icon_global" => Self::Single(DomainKey::IconGlobal),
            "icon_eu" => Self::Single(DomainKey::IconEu),
            "icon_d2" => Self::Single(DomainKey::IconD2),
            "icon_d2_15min" => Self::Single(DomainKey::IconD2_15min),
            "ecmwf_ifs" => Self::Single(DomainKey::EcmwfIfs),
            "gfs" | "gfs025" => Self::Single(DomainKey::Gfs025),
            "hrrr" => Self::Single(DomainKey::Hrrr),
            "arpege_europe" => Self::Single(DomainKey::ArpegeEurope),
            "arome_france" => Self::Single(DomainKey::AromeFrance),
            "knmi_harmonie" => Self::Single(DomainKey::KnmiHarmonie),
            "metno_nordic" => Self::Single(DomainKey::MetNoNordic),
            "jma_msm" => Self::Single(DomainKey::JmaMsm),
            "gem_global" => Self::Single(DomainKey::GemGlobal),
            "gem_regional" => Self::Single(DomainKey::GemRegional),
            "icon_eps" => Self::Single(DomainKey::IconEps),
            "icon_d2_eps" => Self::Single(DomainKey::IconD2Eps),
            _ => return None,
        })
    }
}

fn in_box(lat: f64, lon: f64, lat_range: (f64, f64), lon_range: (f64, f64)) -> bool {
    lat >= lat_range.0 && lat <= lat_range.1 && lon >= lon_range.0 && lon <= lon_range.1
}

/// Domains a best-match request stacks for a coordinate, coarsest first.
fn best_match_domains(lat: f64, lon: f64) -> Vec<DomainKey> {
    let mut stack = vec![DomainKey::Gfs025, DomainKey::IconGlobal];

    let western_europe = in_box(lat, lon, (35.0, 55.0), (-12.0, 16.0));
    if western_europe {
        stack.push(DomainKey::ArpegeEurope);
    }
    stack.push(DomainKey::IconEu);
    if in_box(lat, lon, (27.4, 42.65), (125.0, 145.0)) {
        stack.push(DomainKey::JmaMsm);
    }
    if in_box(lat, lon, (17.0, 75.0), (-170.0, -50.0)) {
        stack.push(DomainKey::Hrrr);
    }
    if lat >= 54.9 {
        stack.push(DomainKey::MetNoNordic);
    }
    if in_box(lat, lon, (49.35, 53.79), (2.19, 7.66)) {
        stack.push(DomainKey::KnmiHarmonie);
    }
    if western_europe {
        stack.push(DomainKey::AromeFrance);
    }
    stack.push(DomainKey::IconD2);
    stack
}

/// Domain stack of a token, coarsest first, plus the probability domain to
/// prepend when the token asks for one.
fn domains_for(token: ModelToken, lat: f64, lon: f64) -> (Vec<DomainKey>, Option<DomainKey>) {
    match token {
        ModelToken::BestMatch => (best_match_domains(lat, lon), Some(DomainKey::IconEps)),
        ModelToken::IconSeamless => (
            vec![
                DomainKey::IconGlobal,
                DomainKey::IconEu,
                DomainKey::IconD2,
                DomainKey::IconD2_15min,
            ],
            None,
        ),
        ModelToken::GfsSeamless => (vec![DomainKey::Gfs025, DomainKey::Hrrr], None),
        ModelToken::GemSeamless => (vec![DomainKey::GemGlobal, DomainKey::GemRegional], None),
        ModelToken::MeteoFranceSeamless => (
            vec![DomainKey::ArpegeEurope, DomainKey::AromeFrance],
            None,
        ),
        ModelToken::Single(key) => (vec![key], None),
    }
}

async fn open_domain_reader(
    registry: &DomainRegistry,
    key: DomainKey,
    lat: f64,
    lon: f64,
    elevation: Option<f32>,
    selection: GridSelection,
) -> ReadResult<Option<Arc<dyn PointReader>>> {
    let archive = registry.archive(key).await?;
    let reader = DomainReader::open(registry.domain(key), archive, lat, lon, elevation, selection)
        .await?;
    Ok(reader.map(|r| Arc::new(r) as Arc<dyn PointReader>))
}

/// Resolve a model token at a coordinate into one reader.
///
/// A single-domain token that misses the coordinate (or whose archive
/// cannot be opened) returns `Ok(None)`: no data for this location. In the
/// stacked tokens a failing member is skipped; only an empty stack returns
/// `Ok(None)`.
pub async fn open_reader(
    registry: &DomainRegistry,
    token: ModelToken,
    lat: f64,
    lon: f64,
    elevation: Option<f32>,
    selection: GridSelection,
) -> ReadResult<Option<Arc<dyn PointReader>>> {
    let (stack, probability) = domains_for(token, lat, lon);

    if let ModelToken::Single(key) = token {
        return match open_domain_reader(registry, key, lat, lon, elevation, selection).await {
            Ok(reader) => Ok(reader),
            Err(e) => {
                warn!(domain = key.as_str(), error = %e, "single-domain open failed");
                Ok(None)
            }
        };
    }

    let mut readers: Vec<Arc<dyn PointReader>> = Vec::with_capacity(stack.len() + 1);
    for key in probability.into_iter().chain(stack) {
        match open_domain_reader(registry, key, lat, lon, elevation, selection).await {
            Ok(Some(reader)) => readers.push(reader),
            Ok(None) => {}
            Err(e) => {
                // Non-fatal inside a stack: the remaining models still
                // serve the request.
                warn!(domain = key.as_str(), error = %e, "skipping stack member");
            }
        }
    }

    Ok(MultiDomainMixer::new(readers).map(|m| Arc::new(m) as Arc<dyn PointReader>))
}

/// Convenience wrapper mirroring the in-process API: parse, resolve, read.
pub async fn get(
    reader: &Arc<dyn PointReader>,
    variable: Variable,
    range: TimeRange,
    settings: ReadSettings,
) -> ReadResult<crate::reader::VariableData> {
    reader.get(variable, range, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_parsing() {
        assert_eq!(ModelToken::parse("best_match"), Some(ModelToken::BestMatch));
        assert_eq!(
            ModelToken::parse("icon_d2"),
            Some(ModelToken::Single(DomainKey::IconD2))
        );
        assert_eq!(
            ModelToken::parse("gfs"),
            Some(ModelToken::Single(DomainKey::Gfs025))
        );
        assert_eq!(ModelToken::parse("made_up_model"), None);
    }

    #[test]
    fn test_best_match_zurich() {
        // Western Europe: both global models, ARPEGE + AROME, EU and D2.
        let stack = best_match_domains(47.38, 8.54);
        assert_eq!(stack.first(), Some(&DomainKey::Gfs025));
        assert_eq!(stack.last(), Some(&DomainKey::IconD2));
        assert!(stack.contains(&DomainKey::AromeFrance));
        assert!(stack.contains(&DomainKey::ArpegeEurope));
        assert!(!stack.contains(&DomainKey::Hrrr));
        assert!(!stack.contains(&DomainKey::KnmiHarmonie));
    }

    #[test]
    fn test_best_match_amsterdam_adds_harmonie() {
        let stack = best_match_domains(52.37, 4.89);
        assert!(stack.contains(&DomainKey::KnmiHarmonie));
        // HARMONIE outranks ARPEGE but not AROME and D2.
        let harmonie = stack.iter().position(|k| *k == DomainKey::KnmiHarmonie).unwrap();
        let arpege = stack.iter().position(|k| *k == DomainKey::ArpegeEurope).unwrap();
        assert!(harmonie > arpege);
    }

    #[test]
    fn test_best_match_kansas_adds_hrrr() {
        let stack = best_match_domains(39.0, -94.5);
        assert!(stack.contains(&DomainKey::Hrrr));
        assert!(!stack.contains(&DomainKey::ArpegeEurope));
        assert!(!stack.contains(&DomainKey::JmaMsm));
    }

    #[test]
    fn test_best_match_tokyo_adds_msm() {
        let stack = best_match_domains(35.68, 139.69);
        assert!(stack.contains(&DomainKey::JmaMsm));
    }

    #[test]
    fn test_best_match_oslo_adds_metno() {
        let stack = best_match_domains(59.91, 10.75);
        assert!(stack.contains(&DomainKey::MetNoNordic));
        let stockholm_south = best_match_domains(54.0, 10.0);
        assert!(!stockholm_south.contains(&DomainKey::MetNoNordic));
    }

    #[test]
    fn test_best_match_attaches_probability_reader() {
        let (_, probability) = domains_for(ModelToken::BestMatch, 47.0, 8.0);
        assert_eq!(probability, Some(DomainKey::IconEps));
        let (_, none) = domains_for(ModelToken::IconSeamless, 47.0, 8.0);
        assert_eq!(none, None);
    }
}
