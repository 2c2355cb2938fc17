//! Static per-domain files: terrain height and soil type.

/// The static datasets a domain can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticKind {
    /// Model surface elevation (HSURF).
    Elevation,
    /// Dominant soil type class.
    SoilType,
}

impl StaticKind {
    /// File name under `<domain>/static/`.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Elevation => "HSURF.dat",
            Self::SoilType => "soil_type.dat",
        }
    }
}

impl std::fmt::Display for StaticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elevation => write!(f, "elevation"),
            Self::SoilType => write!(f, "soil_type"),
        }
    }
}
