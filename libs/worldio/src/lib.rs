// This file is part of pigmap.
//
// pigmap is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// pigmap is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with pigmap.  If not, see <http://www.gnu.org/licenses/>.

//! Readers for the on-disk world formats (region containers, gzipped legacy
//! chunks, the two chunk payload layouts) and the per-worker caches over
//! them.

mod chunk;
mod compress;
mod region;

pub use chunk::{BlockOffset, ChunkCache, ChunkData};
pub use compress::{inflate_gz_or_zlib, read_gz_file};
pub use region::{RegionCache, RegionChunkIterator, RegionFile};

use std::ops::AddAssign;

/// The outcome of trying to fetch a piece of world data. Missing and
/// Corrupt are ordinary outcomes, not errors: the render carries on with
/// blank data, and the tables remember not to retry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReadOutcome {
    Ok,
    Missing,
    Corrupt,
}

/// Counters kept by each cache; merged across workers at the end of a run.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: i64,
    pub misses: i64,
    // types of misses:
    /// successfully read from disk
    pub read: i64,
    /// assumed not to exist because not required in a full render
    pub skipped: i64,
    /// non-required entry not present on disk
    pub missing: i64,
    /// required entry not present on disk
    pub reqmissing: i64,
    /// found on disk, but failed to read
    pub corrupt: i64,
}

impl AddAssign for CacheStats {
    fn add_assign(&mut self, s: CacheStats) {
        self.hits += s.hits;
        self.misses += s.misses;
        self.read += s.read;
        self.skipped += s.skipped;
        self.missing += s.missing;
        self.reqmissing += s.reqmissing;
        self.corrupt += s.corrupt;
    }
}
