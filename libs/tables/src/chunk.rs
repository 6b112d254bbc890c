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
use crate::BitWords;
use mapgeom::ChunkIdx;

pub(crate) const CT_DATA_SIZE: usize = 3;

pub(crate) const CT_LEVEL1_BITS: u32 = 5;
pub(crate) const CT_LEVEL2_BITS: u32 = 5;
pub(crate) const CT_LEVEL3_BITS: u32 = 8;

pub(crate) const CT_LEVEL1_SIZE: usize = 1 << CT_LEVEL1_BITS;
pub(crate) const CT_LEVEL2_SIZE: usize = 1 << CT_LEVEL2_BITS;
pub(crate) const CT_LEVEL3_SIZE: usize = 1 << CT_LEVEL3_BITS;
pub(crate) const CT_TOTAL_SIZE: i64 =
    (CT_LEVEL1_SIZE * CT_LEVEL2_SIZE * CT_LEVEL3_SIZE) as i64;

const SET_BITS: usize = CT_LEVEL1_SIZE * CT_LEVEL1_SIZE * CT_DATA_SIZE;
const SET_WORDS: usize = SET_BITS / 64;

#[inline]
fn level1(a: i64) -> usize {
    (a as usize) & (CT_LEVEL1_SIZE - 1)
}

#[inline]
fn level2(a: i64) -> usize {
    ((a as usize) >> CT_LEVEL1_BITS) & (CT_LEVEL2_SIZE - 1)
}

#[inline]
fn level3(a: i64) -> usize {
    ((a as usize) >> (CT_LEVEL1_BITS + CT_LEVEL2_BITS)) & (CT_LEVEL3_SIZE - 1)
}

/// Variation of ChunkIdx for use with the ChunkTable: translated so that all
/// coords are positive. Also serves to check for the map being too big.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PosChunkIdx {
    pub x: i64,
    pub z: i64,
}

impl PosChunkIdx {
    pub fn new(x: i64, z: i64) -> Self {
        Self { x, z }
    }

    pub fn to_chunk_idx(&self) -> ChunkIdx {
        ChunkIdx::new(self.x - CT_TOTAL_SIZE / 2, self.z - CT_TOTAL_SIZE / 2)
    }

    pub fn valid(&self) -> bool {
        self.x >= 0 && self.x < CT_TOTAL_SIZE && self.z >= 0 && self.z < CT_TOTAL_SIZE
    }
}

impl From<ChunkIdx> for PosChunkIdx {
    fn from(ci: ChunkIdx) -> Self {
        Self::new(ci.x + CT_TOTAL_SIZE / 2, ci.z + CT_TOTAL_SIZE / 2)
    }
}

/// What we know about a chunk's presence on disk.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DiskState {
    /// Have not tried to find the chunk on disk yet.
    Unknown,
    /// Successfully read; it's in the cache if we still need it.
    Cached,
    /// Does not exist on disk.
    Missing,
    /// Exists, but could not be read or parsed.
    Corrupted,
}

impl DiskState {
    fn from_bits(hi: bool, lo: bool) -> Self {
        match (hi, lo) {
            (false, false) => DiskState::Unknown,
            (false, true) => DiskState::Cached,
            (true, false) => DiskState::Missing,
            (true, true) => DiskState::Corrupted,
        }
    }

    fn to_bits(self) -> (bool, bool) {
        match self {
            DiskState::Unknown => (false, false),
            DiskState::Cached => (false, true),
            DiskState::Missing => (true, false),
            DiskState::Corrupted => (true, true),
        }
    }
}

// Each chunk gets 3 bits: the first is the required bit, the last two are
// the disk state.
#[derive(Debug, Clone)]
struct ChunkSet {
    bits: BitWords<SET_WORDS>,
}

impl ChunkSet {
    fn new() -> Self {
        Self {
            bits: BitWords::new(),
        }
    }

    #[inline]
    fn bit_idx(ci: PosChunkIdx) -> usize {
        (level1(ci.z) * CT_LEVEL1_SIZE + level1(ci.x)) * CT_DATA_SIZE
    }
}

// First level of indirection: a 32x32 group of sets, hence 1024x1024 chunks.
#[derive(Debug, Clone)]
struct ChunkGroup {
    chunksets: Vec<Option<Box<ChunkSet>>>,
}

impl ChunkGroup {
    fn new() -> Self {
        Self {
            chunksets: vec![None; CT_LEVEL2_SIZE * CT_LEVEL2_SIZE],
        }
    }

    #[inline]
    fn set_idx(ci: PosChunkIdx) -> usize {
        level2(ci.z) * CT_LEVEL2_SIZE + level2(ci.x)
    }

    fn get_or_alloc(&mut self, ci: PosChunkIdx) -> &mut ChunkSet {
        self.chunksets[Self::set_idx(ci)].get_or_insert_with(|| Box::new(ChunkSet::new()))
    }
}

/// Second (and final) level of indirection: 256x256 groups, so a
/// 262144x262144 space of chunks.
#[derive(Debug, Clone)]
pub struct ChunkTable {
    chunkgroups: Vec<Option<Box<ChunkGroup>>>,
}

impl Default for ChunkTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkTable {
    pub fn new() -> Self {
        Self {
            chunkgroups: vec![None; CT_LEVEL3_SIZE * CT_LEVEL3_SIZE],
        }
    }

    #[inline]
    fn group_idx(ci: PosChunkIdx) -> usize {
        level3(ci.z) * CT_LEVEL3_SIZE + level3(ci.x)
    }

    fn get_set(&self, ci: PosChunkIdx) -> Option<&ChunkSet> {
        self.chunkgroups[Self::group_idx(ci)]
            .as_deref()?
            .chunksets[ChunkGroup::set_idx(ci)]
            .as_deref()
    }

    fn get_or_alloc(&mut self, ci: PosChunkIdx) -> &mut ChunkSet {
        self.chunkgroups[Self::group_idx(ci)]
            .get_or_insert_with(|| Box::new(ChunkGroup::new()))
            .get_or_alloc(ci)
    }

    pub fn is_required(&self, ci: PosChunkIdx) -> bool {
        match self.get_set(ci) {
            Some(cs) => cs.bits.get(ChunkSet::bit_idx(ci)),
            None => false,
        }
    }

    pub fn get_disk_state(&self, ci: PosChunkIdx) -> DiskState {
        match self.get_set(ci) {
            Some(cs) => {
                let bi = ChunkSet::bit_idx(ci);
                DiskState::from_bits(cs.bits.get(bi + 1), cs.bits.get(bi + 2))
            }
            None => DiskState::Unknown,
        }
    }

    pub fn set_required(&mut self, ci: PosChunkIdx) {
        let cs = self.get_or_alloc(ci);
        cs.bits.set(ChunkSet::bit_idx(ci));
    }

    pub fn set_disk_state(&mut self, ci: PosChunkIdx, state: DiskState) {
        let cs = self.get_or_alloc(ci);
        let bi = ChunkSet::bit_idx(ci);
        let (hi, lo) = state.to_bits();
        cs.bits.assign(bi + 1, hi);
        cs.bits.assign(bi + 2, lo);
    }

    pub fn required_chunks(&self) -> RequiredChunkIterator {
        RequiredChunkIterator {
            table: self,
            cgi: 0,
            csi: 0,
            bi: 0,
        }
    }

    // given indices into the groups/sets/bitset, construct a PosChunkIdx
    pub(crate) fn to_pos_chunk_idx(cgi: usize, csi: usize, bi: usize) -> PosChunkIdx {
        let entry = bi / CT_DATA_SIZE;
        let x = (cgi % CT_LEVEL3_SIZE) * CT_LEVEL1_SIZE * CT_LEVEL2_SIZE
            + (csi % CT_LEVEL2_SIZE) * CT_LEVEL1_SIZE
            + entry % CT_LEVEL1_SIZE;
        let z = (cgi / CT_LEVEL3_SIZE) * CT_LEVEL1_SIZE * CT_LEVEL2_SIZE
            + (csi / CT_LEVEL2_SIZE) * CT_LEVEL1_SIZE
            + entry / CT_LEVEL1_SIZE;
        PosChunkIdx::new(x as i64, z as i64)
    }
}

/// Iterates over the required chunks in row-major subtree order.
pub struct RequiredChunkIterator<'a> {
    table: &'a ChunkTable,
    cgi: usize,
    csi: usize,
    bi: usize,
}

impl<'a> Iterator for RequiredChunkIterator<'a> {
    type Item = PosChunkIdx;

    fn next(&mut self) -> Option<PosChunkIdx> {
        while self.cgi < CT_LEVEL3_SIZE * CT_LEVEL3_SIZE {
            let cg = match &self.table.chunkgroups[self.cgi] {
                Some(cg) => cg,
                None => {
                    self.cgi += 1;
                    self.csi = 0;
                    self.bi = 0;
                    continue;
                }
            };
            while self.csi < CT_LEVEL2_SIZE * CT_LEVEL2_SIZE {
                let cs = match &cg.chunksets[self.csi] {
                    Some(cs) => cs,
                    None => {
                        self.csi += 1;
                        self.bi = 0;
                        continue;
                    }
                };
                while self.bi < SET_BITS {
                    let bi = self.bi;
                    self.bi += CT_DATA_SIZE;
                    if cs.bits.get(bi) {
                        return Some(ChunkTable::to_pos_chunk_idx(self.cgi, self.csi, bi));
                    }
                }
                self.csi += 1;
                self.bi = 0;
            }
            self.cgi += 1;
            self.csi = 0;
            self.bi = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_null_subtrees() {
        let table = ChunkTable::new();
        let ci = PosChunkIdx::from(ChunkIdx::new(12345, -6789));
        assert!(!table.is_required(ci));
        assert_eq!(table.get_disk_state(ci), DiskState::Unknown);
    }

    #[test]
    fn test_set_and_get() {
        let mut table = ChunkTable::new();
        let ci = PosChunkIdx::from(ChunkIdx::new(-1, 1));
        table.set_required(ci);
        assert!(table.is_required(ci));
        // neighbors untouched
        assert!(!table.is_required(PosChunkIdx::from(ChunkIdx::new(-1, 2))));
        assert!(!table.is_required(PosChunkIdx::from(ChunkIdx::new(0, 1))));

        for state in [
            DiskState::Cached,
            DiskState::Missing,
            DiskState::Corrupted,
            DiskState::Unknown,
        ] {
            table.set_disk_state(ci, state);
            assert_eq!(table.get_disk_state(ci), state);
            // the required bit survives disk state changes
            assert!(table.is_required(ci));
        }
    }

    #[test]
    fn test_pos_round_trip() {
        for ci in [
            ChunkIdx::new(0, 0),
            ChunkIdx::new(-1, -1),
            ChunkIdx::new(1000, -1000),
            ChunkIdx::new(-131072, 131071),
        ] {
            let pci = PosChunkIdx::from(ci);
            assert!(pci.valid());
            assert_eq!(pci.to_chunk_idx(), ci);
        }
        assert!(!PosChunkIdx::from(ChunkIdx::new(131072, 0)).valid());
        assert!(!PosChunkIdx::from(ChunkIdx::new(0, -131073)).valid());
    }

    #[test]
    fn test_required_iterator_yields_each_once() {
        let mut table = ChunkTable::new();
        // scatter marks across set/group/table boundaries
        let mut marked = Vec::new();
        for i in 0..200i64 {
            let ci = ChunkIdx::new(i * 37 % 2000 - 1000, i * 91 % 2000 - 1000);
            let pci = PosChunkIdx::from(ci);
            table.set_required(pci);
            if !marked.contains(&ci) {
                marked.push(ci);
            }
        }
        let mut found: Vec<ChunkIdx> =
            table.required_chunks().map(|p| p.to_chunk_idx()).collect();
        assert_eq!(found.len(), marked.len());
        found.sort();
        marked.sort();
        assert_eq!(found, marked);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut table = ChunkTable::new();
        let ci = PosChunkIdx::from(ChunkIdx::new(5, 5));
        table.set_required(ci);
        let mut copy = table.clone();
        copy.set_disk_state(ci, DiskState::Missing);
        copy.set_required(PosChunkIdx::from(ChunkIdx::new(6, 6)));
        assert_eq!(table.get_disk_state(ci), DiskState::Unknown);
        assert!(!table.is_required(PosChunkIdx::from(ChunkIdx::new(6, 6))));
    }
}
