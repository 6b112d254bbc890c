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
use mapgeom::{from_z_order, MapParams, TileIdx, ZoomTileIdx};

pub(crate) const TT_DATA_SIZE: usize = 2;

pub(crate) const TT_LEVEL1_BITS: u32 = 4;
pub(crate) const TT_LEVEL2_BITS: u32 = 4;
pub(crate) const TT_LEVEL3_BITS: u32 = 8;

pub(crate) const TT_LEVEL1_SIZE: usize = 1 << TT_LEVEL1_BITS;
pub(crate) const TT_LEVEL2_SIZE: usize = 1 << TT_LEVEL2_BITS;
pub(crate) const TT_LEVEL3_SIZE: usize = 1 << TT_LEVEL3_BITS;
pub(crate) const TT_TOTAL_SIZE: i64 =
    (TT_LEVEL1_SIZE * TT_LEVEL2_SIZE * TT_LEVEL3_SIZE) as i64;

const SET_ENTRIES: usize = TT_LEVEL1_SIZE * TT_LEVEL1_SIZE;
const SET_BITS: usize = SET_ENTRIES * TT_DATA_SIZE;
const SET_WORDS: usize = SET_BITS / 64;

#[inline]
fn level1(a: i64) -> usize {
    (a as usize) & (TT_LEVEL1_SIZE - 1)
}

#[inline]
fn level2(a: i64) -> usize {
    ((a as usize) >> TT_LEVEL1_BITS) & (TT_LEVEL2_SIZE - 1)
}

#[inline]
fn level3(a: i64) -> usize {
    ((a as usize) >> (TT_LEVEL1_BITS + TT_LEVEL2_BITS)) & (TT_LEVEL3_SIZE - 1)
}

/// Variation of TileIdx for use with the TileTable: translated so that all
/// coords are positive. Also serves to check for the map being too big.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PosTileIdx {
    pub x: i64,
    pub y: i64,
}

impl PosTileIdx {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn to_tile_idx(&self) -> TileIdx {
        TileIdx::new(self.x - TT_TOTAL_SIZE / 2, self.y - TT_TOTAL_SIZE / 2)
    }

    pub fn valid(&self) -> bool {
        self.x >= 0 && self.x < TT_TOTAL_SIZE && self.y >= 0 && self.y < TT_TOTAL_SIZE
    }
}

impl From<TileIdx> for PosTileIdx {
    fn from(ti: TileIdx) -> Self {
        Self::new(ti.x + TT_TOTAL_SIZE / 2, ti.y + TT_TOTAL_SIZE / 2)
    }
}

// Each tile gets two bits: required, then drawn.
#[derive(Debug, Clone)]
struct TileSet {
    bits: BitWords<SET_WORDS>,
}

impl TileSet {
    fn new() -> Self {
        Self {
            bits: BitWords::new(),
        }
    }

    #[inline]
    fn bit_idx(ti: PosTileIdx) -> usize {
        (level1(ti.y) * TT_LEVEL1_SIZE + level1(ti.x)) * TT_DATA_SIZE
    }

    fn is_required(&self, ti: PosTileIdx) -> bool {
        self.bits.get(Self::bit_idx(ti))
    }

    // set the required bit and return its previous state
    fn set_required(&mut self, ti: PosTileIdx) -> bool {
        let bi = Self::bit_idx(ti);
        let prev = self.bits.get(bi);
        self.bits.set(bi);
        prev
    }

    fn count_required(&self) -> i64 {
        let mut count = 0;
        for entry in 0..SET_ENTRIES {
            if self.bits.get(entry * TT_DATA_SIZE) {
                count += 1;
            }
        }
        count
    }
}

// First level of indirection: a 256x256 set of tiles, plus a running count
// of how many of them are required (the scheduler leans on these).
#[derive(Debug, Clone)]
struct TileGroup {
    tilesets: Vec<Option<Box<TileSet>>>,
    reqcount: i64,
}

impl TileGroup {
    fn new() -> Self {
        Self {
            tilesets: vec![None; TT_LEVEL2_SIZE * TT_LEVEL2_SIZE],
            reqcount: 0,
        }
    }

    #[inline]
    fn set_idx(ti: PosTileIdx) -> usize {
        level2(ti.y) * TT_LEVEL2_SIZE + level2(ti.x)
    }

    fn get_or_alloc(&mut self, ti: PosTileIdx) -> &mut TileSet {
        self.tilesets[Self::set_idx(ti)].get_or_insert_with(|| Box::new(TileSet::new()))
    }

    fn set_required(&mut self, ti: PosTileIdx) -> bool {
        let prev = self.get_or_alloc(ti).set_required(ti);
        if !prev {
            self.reqcount += 1;
        }
        prev
    }
}

/// Second (and final) level of indirection: a 65536x65536 space of tiles.
#[derive(Debug, Clone)]
pub struct TileTable {
    tilegroups: Vec<Option<Box<TileGroup>>>,
    reqcount: i64,
}

impl Default for TileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TileTable {
    pub fn new() -> Self {
        Self {
            tilegroups: vec![None; TT_LEVEL3_SIZE * TT_LEVEL3_SIZE],
            reqcount: 0,
        }
    }

    #[inline]
    fn group_idx(ti: PosTileIdx) -> usize {
        level3(ti.y) * TT_LEVEL3_SIZE + level3(ti.x)
    }

    fn get_group(&self, ti: PosTileIdx) -> Option<&TileGroup> {
        self.tilegroups[Self::group_idx(ti)].as_deref()
    }

    fn get_set(&self, ti: PosTileIdx) -> Option<&TileSet> {
        self.get_group(ti)?.tilesets[TileGroup::set_idx(ti)].as_deref()
    }

    /// Total number of required tiles in the table.
    pub fn reqcount(&self) -> i64 {
        self.reqcount
    }

    pub fn is_required(&self, ti: PosTileIdx) -> bool {
        match self.get_set(ti) {
            Some(ts) => ts.bits.get(TileSet::bit_idx(ti)),
            None => false,
        }
    }

    pub fn is_drawn(&self, ti: PosTileIdx) -> bool {
        match self.get_set(ti) {
            Some(ts) => ts.bits.get(TileSet::bit_idx(ti) + 1),
            None => false,
        }
    }

    /// Set a tile's required bit; returns the previous state of the bit.
    pub fn set_required(&mut self, ti: PosTileIdx) -> bool {
        let group = self.tilegroups[Self::group_idx(ti)]
            .get_or_insert_with(|| Box::new(TileGroup::new()));
        let prev = group.set_required(ti);
        if !prev {
            self.reqcount += 1;
        }
        prev
    }

    pub fn set_drawn(&mut self, ti: PosTileIdx) {
        let group = self.tilegroups[Self::group_idx(ti)]
            .get_or_insert_with(|| Box::new(TileGroup::new()));
        let ts = group.get_or_alloc(ti);
        ts.bits.set(TileSet::bit_idx(ti) + 1);
    }

    /// See if an entire zoom tile can be rejected because the TileGroup or
    /// TileSet holding its extent was never allocated.
    pub fn reject(&self, zti: &ZoomTileIdx, mp: &MapParams) -> bool {
        // if the zoom tile includes more than one TileGroup, we can't
        // reject early
        if zti.zoom < mp.base_zoom - (TT_LEVEL1_BITS + TT_LEVEL2_BITS) as i32 {
            return false;
        }
        // zoom tiles anywhere except level 0 never cross set/group
        // boundaries--they're either entirely inside one, or contain entire
        // ones--but the level 0 tile straddles the center of the table, and
        // it has to be drawn anyway, so don't bother
        if zti.zoom == 0 {
            return false;
        }
        let ti = PosTileIdx::from(zti.to_tile_idx(mp));
        // contained within a single TileSet?
        if zti.zoom >= mp.base_zoom - TT_LEVEL1_BITS as i32 {
            return self.get_set(ti).is_none();
        }
        // within a single TileGroup, covering several TileSets
        self.get_group(ti).is_none()
    }

    /// Total number of required base tiles under a zoom tile.
    pub fn num_required(&self, zti: &ZoomTileIdx, mp: &MapParams) -> i64 {
        // the very top level holds everything
        if zti.zoom == 0 {
            return self.reqcount;
        }
        let topleft = PosTileIdx::from(zti.to_tile_idx(mp));
        // smaller than a TileSet: check the tiles individually
        if zti.zoom > mp.base_zoom - TT_LEVEL1_BITS as i32 {
            let ts = match self.get_set(topleft) {
                Some(ts) => ts,
                None => return 0,
            };
            let size = 1i64 << (mp.base_zoom - zti.zoom);
            let mut count = 0;
            for x in 0..size {
                for y in 0..size {
                    if ts.is_required(PosTileIdx::new(topleft.x + x, topleft.y + y)) {
                        count += 1;
                    }
                }
            }
            return count;
        }
        // at least a TileSet but smaller than a TileGroup: sum set counts
        if zti.zoom > mp.base_zoom - (TT_LEVEL1_BITS + TT_LEVEL2_BITS) as i32 {
            let tg = match self.get_group(topleft) {
                Some(tg) => tg,
                None => return 0,
            };
            let size = 1i64 << (mp.base_zoom - TT_LEVEL1_BITS as i32 - zti.zoom);
            let mut count = 0;
            for x in 0..size {
                for y in 0..size {
                    let ti = PosTileIdx::new(
                        topleft.x + (x << TT_LEVEL1_BITS),
                        topleft.y + (y << TT_LEVEL1_BITS),
                    );
                    if let Some(ts) = &tg.tilesets[TileGroup::set_idx(ti)] {
                        count += ts.count_required();
                    }
                }
            }
            return count;
        }
        // spans whole TileGroups: sum group reqcounts
        let size =
            1i64 << (mp.base_zoom - (TT_LEVEL1_BITS + TT_LEVEL2_BITS) as i32 - zti.zoom);
        let mut count = 0;
        for x in 0..size {
            for y in 0..size {
                let ti = PosTileIdx::new(
                    topleft.x + (x << (TT_LEVEL1_BITS + TT_LEVEL2_BITS)),
                    topleft.y + (y << (TT_LEVEL1_BITS + TT_LEVEL2_BITS)),
                );
                if let Some(tg) = self.get_group(ti) {
                    count += tg.reqcount;
                }
            }
        }
        count
    }

    /// Iterate the required tiles in Morton (Z-order) order, so that
    /// consumers grabbing contiguous ranges work in a locality-preserving
    /// way.
    pub fn required_tiles(&self) -> RequiredTileIterator {
        RequiredTileIterator {
            table: self,
            ztgi: 0,
            ztsi: 0,
            zbi: 0,
        }
    }

    pub(crate) fn to_pos_tile_idx(tgi: usize, tsi: usize, bi: usize) -> PosTileIdx {
        let entry = bi / TT_DATA_SIZE;
        let x = (tgi % TT_LEVEL3_SIZE) * TT_LEVEL1_SIZE * TT_LEVEL2_SIZE
            + (tsi % TT_LEVEL2_SIZE) * TT_LEVEL1_SIZE
            + entry % TT_LEVEL1_SIZE;
        let y = (tgi / TT_LEVEL3_SIZE) * TT_LEVEL1_SIZE * TT_LEVEL2_SIZE
            + (tsi / TT_LEVEL2_SIZE) * TT_LEVEL1_SIZE
            + entry / TT_LEVEL1_SIZE;
        PosTileIdx::new(x as i64, y as i64)
    }
}

/// Iterates the required tiles in Morton order. The internal counters are
/// Z-order indices, converted to row-major when the table is accessed.
pub struct RequiredTileIterator<'a> {
    table: &'a TileTable,
    ztgi: usize,
    ztsi: usize,
    zbi: usize,
}

impl<'a> Iterator for RequiredTileIterator<'a> {
    type Item = PosTileIdx;

    fn next(&mut self) -> Option<PosTileIdx> {
        while self.ztgi < TT_LEVEL3_SIZE * TT_LEVEL3_SIZE {
            let tgi = from_z_order(self.ztgi as u32, TT_LEVEL3_SIZE as u32) as usize;
            let tg = match &self.table.tilegroups[tgi] {
                Some(tg) => tg,
                None => {
                    self.ztgi += 1;
                    self.ztsi = 0;
                    self.zbi = 0;
                    continue;
                }
            };
            while self.ztsi < TT_LEVEL2_SIZE * TT_LEVEL2_SIZE {
                let tsi = from_z_order(self.ztsi as u32, TT_LEVEL2_SIZE as u32) as usize;
                let ts = match &tg.tilesets[tsi] {
                    Some(ts) => ts,
                    None => {
                        self.ztsi += 1;
                        self.zbi = 0;
                        continue;
                    }
                };
                while self.zbi < SET_ENTRIES {
                    let bi =
                        from_z_order(self.zbi as u32, TT_LEVEL1_SIZE as u32) as usize * TT_DATA_SIZE;
                    self.zbi += 1;
                    if ts.bits.get(bi) {
                        return Some(TileTable::to_pos_tile_idx(tgi, tsi, bi));
                    }
                }
                self.ztsi += 1;
                self.zbi = 0;
            }
            self.ztgi += 1;
            self.ztsi = 0;
            self.zbi = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_required_reports_previous_bit() {
        let mut table = TileTable::new();
        let ti = PosTileIdx::from(TileIdx::new(3, -4));
        assert!(!table.set_required(ti));
        assert!(table.set_required(ti));
        assert_eq!(table.reqcount(), 1);
    }

    #[test]
    fn test_drawn_and_required_are_independent() {
        let mut table = TileTable::new();
        let ti = PosTileIdx::from(TileIdx::new(0, 0));
        table.set_drawn(ti);
        assert!(table.is_drawn(ti));
        assert!(!table.is_required(ti));
        table.set_required(ti);
        assert!(table.is_drawn(ti));
        assert!(table.is_required(ti));
    }

    #[test]
    fn test_required_iterator_matches_marks_in_stable_order() {
        let mut table = TileTable::new();
        let mut marked = Vec::new();
        for i in 0..500i64 {
            let ti = TileIdx::new(i * 53 % 300 - 150, i * 17 % 300 - 150);
            table.set_required(PosTileIdx::from(ti));
            if !marked.contains(&ti) {
                marked.push(ti);
            }
        }
        let found: Vec<TileIdx> = table.required_tiles().map(|p| p.to_tile_idx()).collect();
        assert_eq!(found.len(), marked.len());
        let mut sorted_found = found.clone();
        sorted_found.sort();
        marked.sort();
        assert_eq!(sorted_found, marked);
        // stability: a second traversal yields the identical sequence
        let found2: Vec<TileIdx> = table.required_tiles().map(|p| p.to_tile_idx()).collect();
        assert_eq!(found, found2);
    }

    #[test]
    fn test_num_required_consistent_across_zoom_levels() {
        let mp = MapParams::new(6, 1, 10);
        let mut table = TileTable::new();
        for i in 0..400i64 {
            let ti = TileIdx::new(i * 7 % 200 - 100, i * 13 % 200 - 100);
            table.set_required(PosTileIdx::from(ti));
        }
        let total = table.reqcount();
        for z in 0..=mp.base_zoom {
            let mut count = 0;
            for x in 0..(1i64 << z) {
                for y in 0..(1i64 << z) {
                    count += table.num_required(&ZoomTileIdx::new(x, y, z), &mp);
                }
            }
            assert_eq!(count, total, "zoom {}", z);
        }
    }

    #[test]
    fn test_reject() {
        let mp = MapParams::new(6, 1, 10);
        let mut table = TileTable::new();
        table.set_required(PosTileIdx::from(TileIdx::new(0, 0)));
        // the root is never rejected
        assert!(!table.reject(&ZoomTileIdx::new(0, 0, 0), &mp));
        // the populated corner is not rejected at any level
        for z in 1..=mp.base_zoom {
            let zti = ZoomTileIdx::new(1 << (z - 1), 1 << (z - 1), z);
            assert!(!table.reject(&zti, &mp), "zoom {}", z);
        }
        // a far-away quadrant rejects once it's within a group's extent
        for z in (mp.base_zoom - (TT_LEVEL1_BITS + TT_LEVEL2_BITS) as i32)..=mp.base_zoom {
            let zti = ZoomTileIdx::new(0, 0, z);
            assert!(table.reject(&zti, &mp), "zoom {}", z);
        }
    }

    #[test]
    fn test_clone_is_deep() {
        let mut table = TileTable::new();
        table.set_required(PosTileIdx::from(TileIdx::new(1, 2)));
        let mut copy = table.clone();
        copy.set_drawn(PosTileIdx::from(TileIdx::new(1, 2)));
        copy.set_required(PosTileIdx::from(TileIdx::new(9, 9)));
        assert!(!table.is_drawn(PosTileIdx::from(TileIdx::new(1, 2))));
        assert_eq!(table.reqcount(), 1);
        assert_eq!(copy.reqcount(), 2);
    }
}
