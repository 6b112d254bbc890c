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
use crate::{compress::inflate_gz_or_zlib, CacheStats, ReadOutcome};
use log::error;
use mapgeom::{ChunkIdx, RegionIdx};
use std::{
    fs::File,
    io::{ErrorKind, Read},
    mem,
    path::{Path, PathBuf},
};
use tables::{ChunkTable, DiskState, PosChunkIdx, PosRegionIdx, RegionTable};
use byteorder::BigEndian;
use zerocopy::{byteorder::U32, LayoutVerified};

pub(crate) const REGION_SECTOR: usize = 4096;
pub(crate) const CHUNKS_PER_REGION: usize = 32 * 32;

/// Offset of a chunk within its region.
#[derive(Debug, Copy, Clone)]
pub(crate) struct ChunkOffset {
    x: i64,
    z: i64,
}

impl ChunkOffset {
    pub(crate) fn new(ci: ChunkIdx) -> Self {
        let ri = ci.region_idx();
        Self {
            x: ci.x - ri.x * 32,
            z: ci.z - ri.z * 32,
        }
    }

    fn idx(&self) -> usize {
        (self.z * 32 + self.x) as usize
    }
}

/// One region file read into memory.
///
/// A region file is a sequence of 4096-byte sectors. Sector 0 is a 32x32
/// array of big-endian chunk offsets `(sector_offset << 8) | size_sectors`,
/// indexed by z*32 + x; a zero offset means the chunk is absent. Each chunk
/// payload starts with a big-endian 32-bit length, then one byte of
/// compression scheme (1 = gzip, 2 = zlib; the length includes this byte),
/// then length - 1 bytes of compressed stream.
pub struct RegionFile {
    offsets: Vec<u32>,
    chunkdata: Vec<u8>,
    /// Whether this came from an Anvil (.mca) file or an old-style (.mcr) one.
    pub anvil: bool,
}

impl Default for RegionFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionFile {
    pub fn new() -> Self {
        Self {
            offsets: vec![0; CHUNKS_PER_REGION],
            chunkdata: Vec::new(),
            anvil: false,
        }
    }

    pub fn swap(&mut self, other: &mut RegionFile) {
        mem::swap(&mut self.offsets, &mut other.offsets);
        mem::swap(&mut self.chunkdata, &mut other.chunkdata);
        mem::swap(&mut self.anvil, &mut other.anvil);
    }

    fn sector_offset(&self, idx: usize) -> u32 {
        self.offsets[idx] >> 8
    }

    pub(crate) fn contains_chunk(&self, co: ChunkOffset) -> bool {
        self.offsets[co.idx()] != 0
    }

    fn open(&mut self, ri: RegionIdx, inputpath: &Path) -> Result<File, ReadOutcome> {
        // look for an Anvil region file first, then an old-style one
        let anvil_name = inputpath.join("region").join(ri.to_anvil_file_name());
        match File::open(&anvil_name) {
            Ok(f) => {
                self.anvil = true;
                return Ok(f);
            }
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(ReadOutcome::Corrupt),
            Err(_) => {}
        }
        let old_name = inputpath.join("region").join(ri.to_old_file_name());
        match File::open(&old_name) {
            Ok(f) => {
                self.anvil = false;
                Ok(f)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ReadOutcome::Missing),
            Err(_) => Err(ReadOutcome::Corrupt),
        }
    }

    fn read_header(&mut self, f: &mut File) -> ReadOutcome {
        let mut header = [0u8; REGION_SECTOR];
        if f.read_exact(&mut header).is_err() {
            return ReadOutcome::Corrupt;
        }
        let words = match LayoutVerified::<_, [U32<BigEndian>]>::new_slice(&header[..]) {
            Some(w) => w,
            None => return ReadOutcome::Corrupt,
        };
        for (dst, src) in self.offsets.iter_mut().zip(words.iter()) {
            *dst = src.get();
        }
        ReadOutcome::Ok
    }

    /// Read a whole region file: the header plus every chunk payload.
    pub fn load(&mut self, ri: RegionIdx, inputpath: &Path) -> ReadOutcome {
        let mut f = match self.open(ri, inputpath) {
            Ok(f) => f,
            Err(outcome) => return outcome,
        };
        match self.read_header(&mut f) {
            ReadOutcome::Ok => {}
            outcome => return outcome,
        }
        self.chunkdata.clear();
        // populated region files commonly run to several MiB; start there
        // and let the buffer ride between loads
        if self.chunkdata.capacity() < 8 * 1024 * 1024 {
            self.chunkdata.reserve(8 * 1024 * 1024);
        }
        if f.read_to_end(&mut self.chunkdata).is_err() {
            return ReadOutcome::Corrupt;
        }
        ReadOutcome::Ok
    }

    /// Read only sector 0, enough to enumerate which chunks exist without
    /// touching any payload.
    pub fn load_header_only(&mut self, ri: RegionIdx, inputpath: &Path) -> ReadOutcome {
        let mut f = match self.open(ri, inputpath) {
            Ok(f) => f,
            Err(outcome) => return outcome,
        };
        self.read_header(&mut f)
    }

    /// Inflate one chunk's payload into `buf`, replacing its contents.
    pub fn decompress_chunk(&self, ci: ChunkIdx, buf: &mut Vec<u8>) -> ReadOutcome {
        let co = ChunkOffset::new(ci);
        if !self.contains_chunk(co) {
            return ReadOutcome::Missing;
        }
        let sector = self.sector_offset(co.idx()) as usize;
        if sector < 1 {
            return ReadOutcome::Corrupt;
        }
        let start = (sector - 1) * REGION_SECTOR;
        let header = match self.chunkdata.get(start..start + 5) {
            Some(h) => h,
            None => return ReadOutcome::Corrupt,
        };
        let datasize = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if datasize < 1 {
            return ReadOutcome::Corrupt;
        }
        // the scheme byte at start+4 is included in datasize; we sniff the
        // stream itself rather than trusting it
        let stream = match self.chunkdata.get(start + 5..start + 4 + datasize) {
            Some(s) => s,
            None => return ReadOutcome::Corrupt,
        };
        if !inflate_gz_or_zlib(stream, buf) {
            return ReadOutcome::Corrupt;
        }
        ReadOutcome::Ok
    }

    /// Load a region's header and list the chunks that actually exist in it.
    pub fn contained_chunks(
        &mut self,
        ri: RegionIdx,
        inputpath: &Path,
        chunks: &mut Vec<ChunkIdx>,
    ) -> ReadOutcome {
        chunks.clear();
        match self.load_header_only(ri, inputpath) {
            ReadOutcome::Ok => {}
            outcome => return outcome,
        }
        for ci in RegionChunkIterator::new(ri) {
            if self.contains_chunk(ChunkOffset::new(ci)) {
                chunks.push(ci);
            }
        }
        ReadOutcome::Ok
    }
}

/// Iterates over the 32x32 chunks of a region, x fastest.
pub struct RegionChunkIterator {
    basechunk: ChunkIdx,
    i: usize,
}

impl RegionChunkIterator {
    pub fn new(ri: RegionIdx) -> Self {
        Self {
            basechunk: ri.base_chunk(),
            i: 0,
        }
    }
}

impl Iterator for RegionChunkIterator {
    type Item = ChunkIdx;

    fn next(&mut self) -> Option<ChunkIdx> {
        if self.i >= CHUNKS_PER_REGION {
            return None;
        }
        let ci = ChunkIdx::new(
            self.basechunk.x + (self.i % 32) as i64,
            self.basechunk.z + (self.i / 32) as i64,
        );
        self.i += 1;
        Some(ci)
    }
}

const RCACHE_BITS_X: i64 = 1;
const RCACHE_BITS_Z: i64 = 1;
const RCACHE_X_SIZE: i64 = 1 << RCACHE_BITS_X;
const RCACHE_Z_SIZE: i64 = 1 << RCACHE_BITS_Z;
const RCACHE_SIZE: usize = (RCACHE_X_SIZE * RCACHE_Z_SIZE) as usize;

struct RegionCacheEntry {
    ri: Option<PosRegionIdx>,
    regionfile: RegionFile,
}

impl RegionCacheEntry {
    fn new() -> Self {
        Self {
            ri: None,
            regionfile: RegionFile::new(),
        }
    }
}

/// A small direct-mapped cache of region files. Region files run three
/// orders of magnitude bigger than chunks, so a handful of slots is plenty.
///
/// `readbuf` is an extra less-important entry: when a new region is read,
/// it's this entry whose storage gets trashed for the read (which might
/// fail), but if the read succeeds, the new region is swapped into its
/// proper slot and the previous tenant there moves to the readbuf, where it
/// survives one additional step.
pub struct RegionCache {
    entries: Vec<RegionCacheEntry>,
    readbuf: RegionCacheEntry,
    inputpath: PathBuf,
    fullrender: bool,
    pub stats: CacheStats,
}

impl RegionCache {
    pub fn new(inputpath: &Path, fullrender: bool) -> Self {
        Self {
            entries: (0..RCACHE_SIZE).map(|_| RegionCacheEntry::new()).collect(),
            readbuf: RegionCacheEntry::new(),
            inputpath: inputpath.to_owned(),
            fullrender,
            stats: CacheStats::default(),
        }
    }

    fn entry_num(ri: PosRegionIdx) -> usize {
        ((ri.x & (RCACHE_X_SIZE - 1)) * RCACHE_Z_SIZE + (ri.z & (RCACHE_Z_SIZE - 1))) as usize
    }

    /// Inflate a chunk's payload into `buf`. Returns the outcome plus
    /// whether the owning region file was Anvil-format.
    pub fn get_decompressed_chunk(
        &mut self,
        ci: PosChunkIdx,
        buf: &mut Vec<u8>,
        chunktable: &mut ChunkTable,
        regiontable: &mut RegionTable,
    ) -> (ReadOutcome, bool) {
        let region_idx = ci.to_chunk_idx().region_idx();
        let ri = PosRegionIdx::from(region_idx);
        let e = Self::entry_num(ri);

        // if we already tried and failed to read this region, don't try
        // again--in fact we shouldn't even be able to get here, since every
        // chunk in the region was marked missing the first time we failed
        if regiontable.has_failed(ri) {
            error!("cache invariant failure!  tried to read already-failed region {}", region_idx);
            return (ReadOutcome::Missing, false);
        }

        // if the region is in the cache, extract the chunk from it; try the
        // real cache entry, then the extra readbuf
        if self.entries[e].ri == Some(ri) {
            self.stats.hits += 1;
            let entry = &self.entries[e];
            return (
                entry.regionfile.decompress_chunk(ci.to_chunk_idx(), buf),
                entry.regionfile.anvil,
            );
        }
        if self.readbuf.ri == Some(ri) {
            self.stats.hits += 1;
            return (
                self.readbuf.regionfile.decompress_chunk(ci.to_chunk_idx(), buf),
                self.readbuf.regionfile.anvil,
            );
        }
        self.stats.misses += 1;

        // if this is a full render and the region is not required, the world
        // scan already told us it doesn't exist
        let req = regiontable.is_required(ri);
        if self.fullrender && !req {
            self.stats.skipped += 1;
            Self::mark_region_failed(ri, chunktable, regiontable);
            return (ReadOutcome::Missing, false);
        }

        // okay, we actually have to read the region from disk, if it's there
        match self.read_region_file(ri, chunktable, regiontable) {
            ReadOutcome::Ok => {}
            ReadOutcome::Missing => {
                if req {
                    self.stats.reqmissing += 1;
                } else {
                    self.stats.missing += 1;
                }
                return (ReadOutcome::Missing, false);
            }
            ReadOutcome::Corrupt => {
                self.stats.corrupt += 1;
                return (ReadOutcome::Missing, false);
            }
        }

        // the read succeeded, so the region must now be in its real slot
        if self.entries[e].ri != Some(ri) {
            panic!(
                "grievous region cache failure!  {} not in slot {} after read",
                region_idx, e
            );
        }
        self.stats.read += 1;
        let entry = &self.entries[e];
        (
            entry.regionfile.decompress_chunk(ci.to_chunk_idx(), buf),
            entry.regionfile.anvil,
        )
    }

    // a region-level failure dooms all 1024 chunks it holds; propagate so
    // the chunk cache never sends us back here for them
    fn mark_region_failed(
        ri: PosRegionIdx,
        chunktable: &mut ChunkTable,
        regiontable: &mut RegionTable,
    ) {
        regiontable.set_failed(ri);
        for ci in RegionChunkIterator::new(ri.to_region_idx()) {
            chunktable.set_disk_state(PosChunkIdx::from(ci), DiskState::Missing);
        }
    }

    fn read_region_file(
        &mut self,
        ri: PosRegionIdx,
        chunktable: &mut ChunkTable,
        regiontable: &mut RegionTable,
    ) -> ReadOutcome {
        // forget the readbuf's tenant; its storage is about to be reused
        self.readbuf.ri = None;

        let outcome = self
            .readbuf
            .regionfile
            .load(ri.to_region_idx(), &self.inputpath);
        match outcome {
            ReadOutcome::Ok => {}
            ReadOutcome::Missing | ReadOutcome::Corrupt => {
                Self::mark_region_failed(ri, chunktable, regiontable);
                return outcome;
            }
        }

        // evict the slot's current tenant into the readbuf and move the new
        // region into its proper place
        let e = Self::entry_num(ri);
        self.entries[e].regionfile.swap(&mut self.readbuf.regionfile);
        self.readbuf.ri = self.entries[e].ri;
        self.entries[e].ri = Some(ri);
        ReadOutcome::Ok
    }
}
