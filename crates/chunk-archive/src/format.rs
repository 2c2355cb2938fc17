//! On-disk codec of archive files.
//!
//! A chunk file holds, for one variable and one time window, the series of
//! every grid location as scaled little-endian `i16` samples:
//!
//! ```text
//! magic "TSC1" | version u32 | start i64 | dt i64 | samples u32
//! | locations u32 | sub_dimensions u32 | scalefactor f32
//! | i16 * (locations * sub_dimensions * samples)
//! ```
//!
//! Samples are location-major, then sub-dimension, then time, so one
//! location's series is a contiguous run. `i16::MIN` encodes a missing
//! sample. Static files carry one `f32` per location:
//!
//! ```text
//! magic "TSS1" | version u32 | locations u32 | f32 * locations
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use meteo_common::ReadError;

pub const CHUNK_MAGIC: &[u8; 4] = b"TSC1";
pub const STATIC_MAGIC: &[u8; 4] = b"TSS1";
pub const FORMAT_VERSION: u32 = 1;

const CHUNK_HEADER_LEN: usize = 40;
const STATIC_HEADER_LEN: usize = 12;

/// Missing-value sentinel in scaled samples.
pub const MISSING: i16 = i16::MIN;

/// Decoded header of a chunk file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkHeader {
    pub start: i64,
    pub dt: i64,
    pub samples: u32,
    pub locations: u32,
    pub sub_dimensions: u32,
    pub scalefactor: f32,
}

impl ChunkHeader {
    /// Parse and validate the fixed-size header.
    pub fn parse(data: &[u8], path: &str) -> Result<Self, ReadError> {
        if data.len() < CHUNK_HEADER_LEN {
            return Err(ReadError::decode(path, "file shorter than header"));
        }
        if &data[0..4] != CHUNK_MAGIC {
            return Err(ReadError::decode(path, "bad magic"));
        }
        let version = u32::from_le_bytes(data[4..8].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(ReadError::decode(path, format!("unsupported version {}", version)));
        }
        let header = Self {
            start: i64::from_le_bytes(data[8..16].try_into().unwrap()),
            dt: i64::from_le_bytes(data[16..24].try_into().unwrap()),
            samples: u32::from_le_bytes(data[24..28].try_into().unwrap()),
            locations: u32::from_le_bytes(data[28..32].try_into().unwrap()),
            sub_dimensions: u32::from_le_bytes(data[32..36].try_into().unwrap()),
            scalefactor: f32::from_le_bytes(data[36..40].try_into().unwrap()),
        };
        if header.dt <= 0 || header.sub_dimensions == 0 || header.scalefactor <= 0.0 {
            return Err(ReadError::decode(path, "implausible header fields"));
        }
        let expected = CHUNK_HEADER_LEN
            + header.locations as usize * header.sub_dimensions as usize * header.samples as usize * 2;
        if data.len() < expected {
            return Err(ReadError::decode(
                path,
                format!("truncated body: {} of {} bytes", data.len(), expected),
            ));
        }
        Ok(header)
    }

    /// Read the series of one location and sub-dimension, unscaled to f32.
    ///
    /// `indices` are intra-chunk time indices; out-of-chunk indices and
    /// missing samples decode to NaN.
    pub fn decode_point(
        &self,
        data: &[u8],
        location: usize,
        sub_dimension: usize,
        indices: impl Iterator<Item = i64>,
        out: &mut [f32],
    ) {
        let samples = self.samples as usize;
        let run = (location * self.sub_dimensions as usize + sub_dimension) * samples;
        let body = &data[CHUNK_HEADER_LEN..];

        for (slot, index) in out.iter_mut().zip(indices) {
            if index < 0 || index >= samples as i64 {
                continue;
            }
            let offset = (run + index as usize) * 2;
            let raw = i16::from_le_bytes([body[offset], body[offset + 1]]);
            if raw != MISSING {
                *slot = raw as f32 / self.scalefactor;
            }
        }
    }
}

/// Encode a chunk file from per-location series.
///
/// `values` is indexed `[location][sub_dimension][time]` flattened, in the
/// same order as the on-disk layout.
pub fn encode_chunk(header: &ChunkHeader, values: &[f32]) -> Bytes {
    let expected =
        header.locations as usize * header.sub_dimensions as usize * header.samples as usize;
    assert_eq!(values.len(), expected, "value count must match header");

    let mut buf = BytesMut::with_capacity(CHUNK_HEADER_LEN + values.len() * 2);
    buf.put_slice(CHUNK_MAGIC);
    buf.put_u32_le(FORMAT_VERSION);
    buf.put_i64_le(header.start);
    buf.put_i64_le(header.dt);
    buf.put_u32_le(header.samples);
    buf.put_u32_le(header.locations);
    buf.put_u32_le(header.sub_dimensions);
    buf.put_f32_le(header.scalefactor);

    for &value in values {
        let scaled = if value.is_nan() {
            MISSING
        } else {
            (value * header.scalefactor).round().clamp(
                (MISSING + 1) as f32,
                i16::MAX as f32,
            ) as i16
        };
        buf.put_i16_le(scaled);
    }
    buf.freeze()
}

/// Decoded header of a static file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHeader {
    pub locations: u32,
}

impl StaticHeader {
    pub fn parse(data: &[u8], path: &str) -> Result<Self, ReadError> {
        if data.len() < STATIC_HEADER_LEN {
            return Err(ReadError::decode(path, "file shorter than header"));
        }
        if &data[0..4] != STATIC_MAGIC {
            return Err(ReadError::decode(path, "bad magic"));
        }
        let version = u32::from_le_bytes(data[4..8].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(ReadError::decode(path, format!("unsupported version {}", version)));
        }
        let locations = u32::from_le_bytes(data[8..12].try_into().unwrap());
        if data.len() < STATIC_HEADER_LEN + locations as usize * 4 {
            return Err(ReadError::decode(path, "truncated body"));
        }
        Ok(Self { locations })
    }

    /// Value at one location; NaN when out of range.
    pub fn decode_point(&self, data: &[u8], location: usize) -> f32 {
        if location >= self.locations as usize {
            return f32::NAN;
        }
        let offset = STATIC_HEADER_LEN + location * 4;
        f32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
    }
}

/// Encode a static file from one value per location.
pub fn encode_static(values: &[f32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(STATIC_HEADER_LEN + values.len() * 4);
    buf.put_slice(STATIC_MAGIC);
    buf.put_u32_le(FORMAT_VERSION);
    buf.put_u32_le(values.len() as u32);
    for &value in values {
        buf.put_f32_le(value);
    }
    buf.freeze()
}
