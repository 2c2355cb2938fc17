//! Per-domain archive metadata (`meta.json`).

use chrono::{DateTime, Utc};
use meteo_common::{ReadError, ReadResult, TimeRange};
use serde::{Deserialize, Serialize};

/// Timestamp span served by a monolithic master file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSpan {
    /// First covered timestamp, epoch seconds.
    pub start: i64,
    /// One past the last covered timestamp, epoch seconds.
    pub end: i64,
}

impl MasterSpan {
    /// Whether the whole read window lies inside the master file.
    pub fn covers(&self, range: &TimeRange) -> bool {
        range.start >= self.start && range.end <= self.end
    }
}

/// Metadata document written by the ingest pipeline after every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainMeta {
    /// Reference time of the last completed model run.
    pub last_run: DateTime<Utc>,
    /// Valid timestamps currently present in the archive, epoch seconds.
    pub valid_times: Vec<i64>,
    /// Time steps per chunk file.
    pub chunk_length: usize,
    /// Master-file span, for domains that expose one (reanalysis archives).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<MasterSpan>,
}

impl DomainMeta {
    /// Parse the JSON document.
    pub fn from_json(data: &[u8], path: &str) -> ReadResult<Self> {
        serde_json::from_slice(data).map_err(|e| ReadError::decode(path, e.to_string()))
    }

    /// Serialize to JSON for the writer.
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(self).expect("meta serialization cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meta_roundtrip() {
        let meta = DomainMeta {
            last_run: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            valid_times: vec![0, 3600, 7200],
            chunk_length: 168,
            master: None,
        };
        let json = meta.to_json();
        let parsed = DomainMeta::from_json(&json, "meta.json").unwrap();
        assert_eq!(parsed.valid_times, meta.valid_times);
        assert_eq!(parsed.chunk_length, 168);
        assert!(parsed.master.is_none());
    }

    #[test]
    fn test_master_span_covers() {
        let span = MasterSpan {
            start: 0,
            end: 100 * 3600,
        };
        assert!(span.covers(&TimeRange::new(0, 3600, 3600)));
        assert!(span.covers(&TimeRange::new(50 * 3600, 100 * 3600, 3600)));
        assert!(!span.covers(&TimeRange::new(99 * 3600, 101 * 3600, 3600)));
    }

    #[test]
    fn test_invalid_json_is_decode_failure() {
        let err = DomainMeta::from_json(b"not json", "icon/meta.json").unwrap_err();
        assert!(matches!(err, ReadError::DecodeFailure { .. }));
    }
}
