//! Chunked time-series archive I/O.
//!
//! The archive stores one compressed time-series block per
//! `(variable, chunk index)` under a fixed per-domain layout:
//!
//! ```text
//! <root>/<domain-key>/<variable-file>/chunk_<index>.dat
//! <root>/<domain-key>/static/HSURF.dat
//! <root>/<domain-key>/static/soil_type.dat
//! <root>/<domain-key>/meta.json
//! ```
//!
//! Reads are point-wise: a single grid location over a time range, spanning
//! as many chunk files as the range requires. Missing files are normal
//! operation and fill with NaN; the output length always equals the
//! requested sample count. Files are fetched through a process-wide
//! byte-accounted LRU cache that collapses concurrent fetches of the same
//! key into one download.

pub mod cache;
pub mod format;
pub mod layout;
pub mod meta;
pub mod reader;
pub mod static_files;
pub mod store;
pub mod writer;

pub use cache::{CacheStats, FileCache};
pub use format::{ChunkHeader, StaticHeader};
pub use layout::{ArchiveLayout, ChunkGeometry};
pub use meta::{DomainMeta, MasterSpan};
pub use reader::DomainArchive;
pub use static_files::StaticKind;
pub use store::{ArchiveStore, LocalStore, RemoteStore, RemoteStoreConfig, StoreDeadlines};
pub use writer::ArchiveWriter;
