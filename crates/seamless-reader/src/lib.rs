//! Point-forecast readers over the chunked weather archive.
//!
//! The crate composes the geometry, archive and variable layers into the
//! serving core:
//!
//! ```text
//! model token
//!      │
//!      ▼
//! selector::open_reader ── region rules ──► [DomainReader, ..] stack
//!      │                                        │
//!      ▼                                        ▼
//! MultiDomainMixer ── last-wins per sample ─► DomainReader::get
//!      │                                        │
//!      ▼                                        ├─► derived engine
//! requested series                              │   (prerequisite reads)
//!                                               ├─► chunk archive (cache)
//!                                               └─► interpolate to dt
//! ```
//!
//! Readers are request-scoped and cheap; domains, grids and the file cache
//! are process-wide and shared through [`DomainRegistry`].

pub mod derived;
pub mod domain;
pub mod interpolate;
pub mod mixer;
pub mod reader;
pub mod selector;
pub mod weather_code;

pub use domain::{Domain, DomainKey, DomainRegistry};
pub use interpolate::{interpolate, SolarContext};
pub use mixer::MultiDomainMixer;
pub use reader::{DomainReader, PointReader, VariableData};
pub use selector::{open_reader, ModelToken};
