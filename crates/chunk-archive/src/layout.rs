//! Archive path layout and chunk arithmetic.

use meteo_common::TimeRange;

/// Builds the storage paths of one domain's archive.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    domain_key: String,
}

impl ArchiveLayout {
    pub fn new(domain_key: impl Into<String>) -> Self {
        Self {
            domain_key: domain_key.into(),
        }
    }

    pub fn domain_key(&self) -> &str {
        &self.domain_key
    }

    /// Path of one time chunk of a variable.
    pub fn chunk_file(&self, variable_file: &str, chunk_index: i64) -> String {
        format!("{}/{}/chunk_{}.dat", self.domain_key, variable_file, chunk_index)
    }

    /// Path of the monolithic master file of a variable, when the domain
    /// provides one.
    pub fn master_file(&self, variable_file: &str) -> String {
        format!("{}/{}/master.dat", self.domain_key, variable_file)
    }

    /// Path of a static file (terrain height, soil type).
    pub fn static_file(&self, name: &str) -> String {
        format!("{}/static/{}", self.domain_key, name)
    }

    /// Path of the domain metadata document.
    pub fn meta_file(&self) -> String {
        format!("{}/meta.json", self.domain_key)
    }

    /// Directory name of a variable, routing ensemble members stored as
    /// disjoint file families to their own directory. Member 0 is the
    /// control run and shares the deterministic path.
    pub fn member_directory(variable_file: &str, member: u32) -> String {
        if member == 0 {
            variable_file.to_string()
        } else {
            format!("{}_member{:02}", variable_file, member)
        }
    }
}

/// Chunking of the time axis: a fixed number of native steps per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGeometry {
    /// Native model step in seconds.
    pub dt: i64,
    /// Time steps per chunk file.
    pub chunk_length: usize,
}

impl ChunkGeometry {
    pub fn new(dt: i64, chunk_length: usize) -> Self {
        debug_assert!(dt > 0 && chunk_length > 0);
        Self { dt, chunk_length }
    }

    /// Seconds covered by one chunk file.
    pub fn chunk_span(&self) -> i64 {
        self.dt * self.chunk_length as i64
    }

    /// Chunk file index containing `timestamp`.
    pub fn index_of(&self, timestamp: i64) -> i64 {
        timestamp.div_euclid(self.chunk_span())
    }

    /// The native time range covered by chunk `index`.
    pub fn chunk_range(&self, index: i64) -> TimeRange {
        let start = index * self.chunk_span();
        TimeRange::new(start, start + self.chunk_span(), self.dt)
    }

    /// Chunk indices a read window touches, in order.
    pub fn indices_for(&self, range: &TimeRange) -> std::ops::RangeInclusive<i64> {
        self.index_of(range.start)..=self.index_of(range.end - range.dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = ArchiveLayout::new("icon_d2");
        assert_eq!(
            layout.chunk_file("temperature_2m", 18920),
            "icon_d2/temperature_2m/chunk_18920.dat"
        );
        assert_eq!(layout.static_file("HSURF.dat"), "icon_d2/static/HSURF.dat");
        assert_eq!(layout.meta_file(), "icon_d2/meta.json");
        assert_eq!(
            layout.master_file("temperature_2m"),
            "icon_d2/temperature_2m/master.dat"
        );
    }

    #[test]
    fn test_member_directory() {
        assert_eq!(ArchiveLayout::member_directory("precipitation", 0), "precipitation");
        assert_eq!(
            ArchiveLayout::member_directory("precipitation", 7),
            "precipitation_member07"
        );
    }

    #[test]
    fn test_chunk_arithmetic() {
        // Hourly model, 7-day chunks.
        let geometry = ChunkGeometry::new(3600, 168);
        assert_eq!(geometry.chunk_span(), 604_800);
        assert_eq!(geometry.index_of(0), 0);
        assert_eq!(geometry.index_of(604_799), 0);
        assert_eq!(geometry.index_of(604_800), 1);
        assert_eq!(geometry.index_of(-1), -1);

        let range = geometry.chunk_range(2);
        assert_eq!(range.start, 1_209_600);
        assert_eq!(range.count(), 168);
    }

    #[test]
    fn test_indices_for_spanning_read() {
        let geometry = ChunkGeometry::new(3600, 24);
        // 36 hours starting mid-first-chunk touches two files.
        let range = TimeRange::new(12 * 3600, 48 * 3600, 3600);
        let indices: Vec<i64> = geometry.indices_for(&range).collect();
        assert_eq!(indices, vec![0, 1]);

        // A range ending exactly on a chunk boundary does not touch the
        // next file.
        let aligned = TimeRange::new(0, 24 * 3600, 3600);
        let indices: Vec<i64> = geometry.indices_for(&aligned).collect();
        assert_eq!(indices, vec![0]);
    }
}
