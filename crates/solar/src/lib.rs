//! Solar position and irradiance geometry.
//!
//! The interpolator uses the backward-averaged zenith integrals to
//! disaggregate radiation archives stored as step averages; the derivation
//! engine uses the same geometry for the diffuse split, direct normal
//! irradiance and tilted-panel transposition.

pub mod irradiance;
pub mod position;

pub use irradiance::{
    diffuse_fraction, direct_normal, extraterrestrial_normal, global_tilted_irradiance,
};
pub use position::{cos_zenith, mean_cos_zenith, sun_position, SunPosition};
