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
use mapgeom::RegionIdx;

pub(crate) const RT_DATA_SIZE: usize = 2;

pub(crate) const RT_LEVEL1_BITS: u32 = 4;
pub(crate) const RT_LEVEL2_BITS: u32 = 4;
pub(crate) const RT_LEVEL3_BITS: u32 = 6;

pub(crate) const RT_LEVEL1_SIZE: usize = 1 << RT_LEVEL1_BITS;
pub(crate) const RT_LEVEL2_SIZE: usize = 1 << RT_LEVEL2_BITS;
pub(crate) const RT_LEVEL3_SIZE: usize = 1 << RT_LEVEL3_BITS;
pub(crate) const RT_TOTAL_SIZE: i64 =
    (RT_LEVEL1_SIZE * RT_LEVEL2_SIZE * RT_LEVEL3_SIZE) as i64;

const SET_BITS: usize = RT_LEVEL1_SIZE * RT_LEVEL1_SIZE * RT_DATA_SIZE;
const SET_WORDS: usize = SET_BITS / 64;

#[inline]
fn level1(a: i64) -> usize {
    (a as usize) & (RT_LEVEL1_SIZE - 1)
}

#[inline]
fn level2(a: i64) -> usize {
    ((a as usize) >> RT_LEVEL1_BITS) & (RT_LEVEL2_SIZE - 1)
}

#[inline]
fn level3(a: i64) -> usize {
    ((a as usize) >> (RT_LEVEL1_BITS + RT_LEVEL2_BITS)) & (RT_LEVEL3_SIZE - 1)
}

/// Variation of RegionIdx for use with the RegionTable: translated so that
/// all coords are positive.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PosRegionIdx {
    pub x: i64,
    pub z: i64,
}

impl PosRegionIdx {
    pub fn new(x: i64, z: i64) -> Self {
        Self { x, z }
    }

    pub fn to_region_idx(&self) -> RegionIdx {
        RegionIdx::new(self.x - RT_TOTAL_SIZE / 2, self.z - RT_TOTAL_SIZE / 2)
    }

    pub fn valid(&self) -> bool {
        self.x >= 0 && self.x < RT_TOTAL_SIZE && self.z >= 0 && self.z < RT_TOTAL_SIZE
    }
}

impl From<RegionIdx> for PosRegionIdx {
    fn from(ri: RegionIdx) -> Self {
        Self::new(ri.x + RT_TOTAL_SIZE / 2, ri.z + RT_TOTAL_SIZE / 2)
    }
}

// Each region gets two bits: required, then whether it has already failed
// to read from disk (either by being missing or corrupted).
#[derive(Debug, Clone)]
struct RegionSet {
    bits: BitWords<SET_WORDS>,
}

impl RegionSet {
    fn new() -> Self {
        Self {
            bits: BitWords::new(),
        }
    }

    #[inline]
    fn bit_idx(ri: PosRegionIdx) -> usize {
        (level1(ri.z) * RT_LEVEL1_SIZE + level1(ri.x)) * RT_DATA_SIZE
    }
}

#[derive(Debug, Clone)]
struct RegionGroup {
    regionsets: Vec<Option<Box<RegionSet>>>,
}

impl RegionGroup {
    fn new() -> Self {
        Self {
            regionsets: vec![None; RT_LEVEL2_SIZE * RT_LEVEL2_SIZE],
        }
    }

    #[inline]
    fn set_idx(ri: PosRegionIdx) -> usize {
        level2(ri.z) * RT_LEVEL2_SIZE + level2(ri.x)
    }
}

/// Sparse table over a 16384x16384 space of regions.
#[derive(Debug, Clone)]
pub struct RegionTable {
    regiongroups: Vec<Option<Box<RegionGroup>>>,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionTable {
    pub fn new() -> Self {
        Self {
            regiongroups: vec![None; RT_LEVEL3_SIZE * RT_LEVEL3_SIZE],
        }
    }

    #[inline]
    fn group_idx(ri: PosRegionIdx) -> usize {
        level3(ri.z) * RT_LEVEL3_SIZE + level3(ri.x)
    }

    fn get_set(&self, ri: PosRegionIdx) -> Option<&RegionSet> {
        self.regiongroups[Self::group_idx(ri)]
            .as_deref()?
            .regionsets[RegionGroup::set_idx(ri)]
            .as_deref()
    }

    fn get_or_alloc(&mut self, ri: PosRegionIdx) -> &mut RegionSet {
        self.regiongroups[Self::group_idx(ri)]
            .get_or_insert_with(|| Box::new(RegionGroup::new()))
            .regionsets[RegionGroup::set_idx(ri)]
            .get_or_insert_with(|| Box::new(RegionSet::new()))
    }

    pub fn is_required(&self, ri: PosRegionIdx) -> bool {
        match self.get_set(ri) {
            Some(rs) => rs.bits.get(RegionSet::bit_idx(ri)),
            None => false,
        }
    }

    pub fn has_failed(&self, ri: PosRegionIdx) -> bool {
        match self.get_set(ri) {
            Some(rs) => rs.bits.get(RegionSet::bit_idx(ri) + 1),
            None => false,
        }
    }

    pub fn set_required(&mut self, ri: PosRegionIdx) {
        let rs = self.get_or_alloc(ri);
        rs.bits.set(RegionSet::bit_idx(ri));
    }

    pub fn set_failed(&mut self, ri: PosRegionIdx) {
        let rs = self.get_or_alloc(ri);
        rs.bits.set(RegionSet::bit_idx(ri) + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_set() {
        let mut table = RegionTable::new();
        let ri = PosRegionIdx::from(RegionIdx::new(-3, 17));
        assert!(!table.is_required(ri));
        assert!(!table.has_failed(ri));
        table.set_required(ri);
        assert!(table.is_required(ri));
        assert!(!table.has_failed(ri));
        table.set_failed(ri);
        assert!(table.has_failed(ri));
        assert!(table.is_required(ri));
    }

    #[test]
    fn test_pos_round_trip() {
        for ri in [RegionIdx::new(0, 0), RegionIdx::new(-8192, 8191)] {
            let pri = PosRegionIdx::from(ri);
            assert!(pri.valid());
            assert_eq!(pri.to_region_idx(), ri);
        }
        assert!(!PosRegionIdx::from(RegionIdx::new(8192, 0)).valid());
    }

    #[test]
    fn test_clone_is_deep() {
        let mut table = RegionTable::new();
        let ri = PosRegionIdx::from(RegionIdx::new(1, 1));
        table.set_required(ri);
        let mut copy = table.clone();
        copy.set_failed(ri);
        assert!(!table.has_failed(ri));
        assert!(copy.has_failed(ri));
    }
}
