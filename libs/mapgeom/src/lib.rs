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

// Minecraft coord system:
//
// +x = S    +z = W    +y = U
// -x = N    -z = E    -y = D
//
// The block size is a parameter B >= 2. Block [bx,bz,by] projects so that
// its center lands at absolute pixel [2*B*(bx+bz), B*(bz-bx-2*by)]; the
// pixels that correspond to block centers form a hexagonal grid:
//
//  x % 2B = 0
//  y % 2B = 0 (if x % 4B = 0)
//  y % 2B = B (if x % 4B = 2B)
//
// The center of the NED corner block of chunk [0,0] is the origin of the
// absolute pixel coordinate system; the NED corner of chunk [cx,cz] is at
// [32*B*(cx+cz), 16*B*(cz-cx)], and a chunk's endpoint-exclusive bounding
// box, from that corner, is [-2B,-269B] to [62B,17B].
//
// Tiles are 64*B*T pixels square. A tile's base chunk is the one whose
// bounding box shares its bottom-left corner with the tile's.

mod util;

pub use util::{
    ceildiv, deinterpolate, floordiv, floordiv16, from_base36, from_z_order, interpolate,
    mod64pos, to_base36, to_z_order,
};

use anyhow::{bail, Context, Result};
use std::{
    collections::HashMap,
    fmt,
    fs,
    ops::{Add, AddAssign, Sub, SubAssign},
    path::Path,
};

/// The immutable per-render parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MapParams {
    /// Block size; must be in 2..=16.
    pub b: i64,
    /// Tile multiplier; must be in 1..=16.
    pub t: i64,
    /// Zoom level of the base tiles; the map is 2^base_zoom tiles square.
    /// -1 while still unset (full renders may autodetect it).
    pub base_zoom: i32,
    /// Vertical render range; blocks outside it are ignored.
    pub min_y: i64,
    pub max_y: i64,
    /// Whether min_y/max_y were supplied by the user (and so belong in the
    /// params file) or are just the defaults.
    pub user_min_y: bool,
    pub user_max_y: bool,
}

impl MapParams {
    pub fn new(b: i64, t: i64, base_zoom: i32) -> Self {
        Self {
            b,
            t,
            base_zoom,
            min_y: 0,
            max_y: 255,
            user_min_y: false,
            user_max_y: false,
        }
    }

    pub fn tile_size(&self) -> i64 {
        64 * self.b * self.t
    }

    pub fn valid(&self) -> bool {
        (2..=16).contains(&self.b) && (1..=16).contains(&self.t)
    }

    pub fn valid_zoom(&self) -> bool {
        (0..=30).contains(&self.base_zoom)
    }

    pub fn valid_y_range(&self) -> bool {
        self.min_y <= self.max_y && self.min_y >= 0 && self.max_y <= 255
    }

    /// Read and validate "pigmap.params" from the top-level map directory.
    pub fn read_file(outputpath: &Path) -> Result<MapParams> {
        let filename = outputpath.join("pigmap.params");
        let text = fs::read_to_string(&filename)
            .with_context(|| format!("can't read {}", filename.display()))?;
        let mut params = HashMap::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let mut tokens = line.split(' ');
            match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(k), Some(v), None) => {
                    params.insert(k.to_owned(), v.to_owned());
                }
                _ => bail!("{}: malformed line {:?}", filename.display(), line),
            }
        }
        let get = |key: &str| -> Result<i64> {
            params
                .get(key)
                .with_context(|| format!("{}: missing key {}", filename.display(), key))?
                .parse::<i64>()
                .with_context(|| format!("{}: bad value for {}", filename.display(), key))
        };
        let mut mp = MapParams::new(get("B")?, get("T")?, get("baseZoom")? as i32);
        if let Some(v) = params.get("userMinY") {
            mp.min_y = v.parse().context("bad userMinY")?;
            mp.user_min_y = true;
        }
        if let Some(v) = params.get("userMaxY") {
            mp.max_y = v.parse().context("bad userMaxY")?;
            mp.user_max_y = true;
        }
        if !mp.valid() || !mp.valid_zoom() || !mp.valid_y_range() {
            bail!("{}: stored parameters are out of range", filename.display());
        }
        Ok(mp)
    }

    /// Write "pigmap.params" into the top-level map directory.
    pub fn write_file(&self, outputpath: &Path) -> Result<()> {
        let mut text = format!("B {}\nT {}\nbaseZoom {}\n", self.b, self.t, self.base_zoom);
        if self.user_min_y {
            text += &format!("userMinY {}\n", self.min_y);
        }
        if self.user_max_y {
            text += &format!("userMaxY {}\n", self.max_y);
        }
        let filename = outputpath.join("pigmap.params");
        fs::write(&filename, text).with_context(|| format!("can't write {}", filename.display()))
    }
}

/// Absolute pixel coordinates.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Pixel {
    pub x: i64,
    pub y: i64,
}

impl Pixel {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The base tile containing this pixel.
    pub fn tile(&self, mp: &MapParams) -> TileIdx {
        let xx = self.x + 2 * mp.b;
        let yy = self.y + mp.tile_size() - 17 * mp.b;
        TileIdx::new(floordiv(xx, mp.tile_size()), floordiv(yy, mp.tile_size()))
    }
}

impl Add for Pixel {
    type Output = Pixel;
    fn add(self, p: Pixel) -> Pixel {
        Pixel::new(self.x + p.x, self.y + p.y)
    }
}

impl Sub for Pixel {
    type Output = Pixel;
    fn sub(self, p: Pixel) -> Pixel {
        Pixel::new(self.x - p.x, self.y - p.y)
    }
}

impl AddAssign for Pixel {
    fn add_assign(&mut self, p: Pixel) {
        self.x += p.x;
        self.y += p.y;
    }
}

impl SubAssign for Pixel {
    fn sub_assign(&mut self, p: Pixel) {
        self.x -= p.x;
        self.y -= p.y;
    }
}

/// Endpoint-exclusive bounding box (right and bottom edges not included).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BBox {
    pub top_left: Pixel,
    pub bottom_right: Pixel,
}

impl BBox {
    pub fn new(top_left: Pixel, bottom_right: Pixel) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    pub fn includes(&self, p: Pixel) -> bool {
        p.x >= self.top_left.x
            && p.x < self.bottom_right.x
            && p.y >= self.top_left.y
            && p.y < self.bottom_right.y
    }

    pub fn overlaps(&self, bb: &BBox) -> bool {
        !(bb.top_left.x >= self.bottom_right.x
            || bb.top_left.y >= self.bottom_right.y
            || bb.bottom_right.x <= self.top_left.x
            || bb.bottom_right.y <= self.top_left.y)
    }
}

/// A voxel address.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockIdx {
    pub x: i64,
    pub z: i64,
    pub y: i64,
}

impl BlockIdx {
    pub fn new(x: i64, z: i64, y: i64) -> Self {
        Self { x, z, y }
    }

    /// Whether this block covers enough of bi's pixels that bi need not be
    /// drawn before it.
    pub fn occludes(&self, bi: &BlockIdx) -> bool {
        let dx = bi.x - self.x;
        let dz = bi.z - self.z;
        let dy = bi.y - self.y;
        // we cannot occlude anyone to the N, W, or U of us
        if dx < 0 || dz > 0 || dy > 0 {
            return false;
        }
        // see if the other block's center is 0 or 1 steps away from ours on
        // the triangular grid (the actual grid size doesn't matter; a dummy
        // size of 2x1 works)
        let imgxdiff = dx * 2 + dz * 2;
        let imgydiff = -dx + dz - dy * 2;
        imgxdiff <= 2 && imgydiff <= 2
    }

    pub fn is_occluded_by(&self, bi: &BlockIdx) -> bool {
        bi.occludes(self)
    }

    pub fn center(&self, mp: &MapParams) -> Pixel {
        Pixel::new(2 * mp.b * (self.x + self.z), mp.b * (self.z - self.x - 2 * self.y))
    }

    pub fn bbox(&self, mp: &MapParams) -> BBox {
        let c = self.center(mp);
        BBox::new(
            c - Pixel::new(2 * mp.b, 2 * mp.b),
            c + Pixel::new(2 * mp.b, 2 * mp.b),
        )
    }

    pub fn chunk_idx(&self) -> ChunkIdx {
        ChunkIdx::new(floordiv16(self.x), floordiv16(self.z))
    }

    /// One block projects to each pixel on the hexagonal grid for every
    /// height; this returns the topmost (at max_y), assuming the pixel is
    /// properly aligned on the block-center grid.
    pub fn top_block(p: Pixel, mp: &MapParams) -> BlockIdx {
        BlockIdx::new(
            (p.x - 2 * p.y) / (4 * mp.b) - mp.max_y,
            (p.x + 2 * p.y) / (4 * mp.b) + mp.max_y,
            mp.max_y,
        )
    }
}

impl Add for BlockIdx {
    type Output = BlockIdx;
    fn add(self, bi: BlockIdx) -> BlockIdx {
        BlockIdx::new(self.x + bi.x, self.z + bi.z, self.y + bi.y)
    }
}

impl Sub for BlockIdx {
    type Output = BlockIdx;
    fn sub(self, bi: BlockIdx) -> BlockIdx {
        BlockIdx::new(self.x - bi.x, self.z - bi.z, self.y - bi.y)
    }
}

impl AddAssign for BlockIdx {
    fn add_assign(&mut self, bi: BlockIdx) {
        self.x += bi.x;
        self.z += bi.z;
        self.y += bi.y;
    }
}

/// A 16x16 vertical column of blocks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChunkIdx {
    pub x: i64,
    pub z: i64,
}

impl ChunkIdx {
    pub fn new(x: i64, z: i64) -> Self {
        Self { x, z }
    }

    /// Just the filename, e.g. "c.0.0.dat".
    pub fn to_file_name(&self) -> String {
        format!("c.{}.{}.dat", to_base36(self.x), to_base36(self.z))
    }

    /// The relative path from the top level of world data, e.g. "0/0/c.0.0.dat".
    pub fn to_file_path(&self) -> String {
        format!(
            "{}/{}/{}",
            to_base36(mod64pos(self.x)),
            to_base36(mod64pos(self.z)),
            self.to_file_name()
        )
    }

    /// See if a path ends in a valid chunk filename and extract its chunk
    /// coords if so; accepts plain filenames, relative, or absolute paths.
    pub fn from_file_path(filename: &str) -> Option<ChunkIdx> {
        let name = filename.rsplit('/').next()?;
        let mut parts = name.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("c"), Some(x), Some(z), Some("dat"), None) => {
                Some(ChunkIdx::new(from_base36(x)?, from_base36(z)?))
            }
            _ => None,
        }
    }

    /// The NED corner block.
    pub fn base_corner(&self) -> BlockIdx {
        BlockIdx::new(self.x * 16, self.z * 16, 0)
    }

    pub fn bbox(&self, mp: &MapParams) -> BBox {
        let c = self.base_corner().center(mp);
        BBox::new(
            c - Pixel::new(2 * mp.b, 269 * mp.b),
            c + Pixel::new(62 * mp.b, 17 * mp.b),
        )
    }

    pub fn region_idx(&self) -> RegionIdx {
        RegionIdx::new(floordiv(self.x, 32), floordiv(self.z, 32))
    }

    /// The base tiles this chunk can contribute pixels to: the tile holding
    /// the NED corner, as many tiles up and down as the chunk's bounding box
    /// reaches, and possibly the same range one tile to the right.
    pub fn get_tiles(&self, mp: &MapParams) -> Vec<TileIdx> {
        let bbchunk = self.bbox(mp);
        let mut tiles = Vec::new();

        let tibase = self.base_corner().center(mp).tile(mp);
        tiles.push(tibase);

        let mut tidown = tibase + TileIdx::new(0, 1);
        while tidown.bbox(mp).overlaps(&bbchunk) {
            tiles.push(tidown);
            tidown += TileIdx::new(0, 1);
        }

        let mut tiup = tibase - TileIdx::new(0, 1);
        while tiup.bbox(mp).overlaps(&bbchunk) {
            tiles.push(tiup);
            tiup -= TileIdx::new(0, 1);
        }

        // we may also need the tiles to the right of all the ones so far
        let tiright = tibase + TileIdx::new(1, 0);
        if tiright.bbox(mp).overlaps(&bbchunk) {
            for i in 0..tiles.len() {
                tiles.push(tiles[i] + TileIdx::new(1, 0));
            }
        }

        tiles
    }
}

impl Add for ChunkIdx {
    type Output = ChunkIdx;
    fn add(self, ci: ChunkIdx) -> ChunkIdx {
        ChunkIdx::new(self.x + ci.x, self.z + ci.z)
    }
}

impl fmt::Display for ChunkIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.z)
    }
}

/// A 32x32 rectangle of chunks, stored as a single file.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RegionIdx {
    pub x: i64,
    pub z: i64,
}

impl RegionIdx {
    pub fn new(x: i64, z: i64) -> Self {
        Self { x, z }
    }

    pub fn to_old_file_name(&self) -> String {
        format!("r.{}.{}.mcr", self.x, self.z)
    }

    pub fn to_anvil_file_name(&self) -> String {
        format!("r.{}.{}.mca", self.x, self.z)
    }

    /// See if a path ends in a valid region filename (either flavor) and
    /// extract its region coords if so.
    pub fn from_file_path(filename: &str) -> Option<RegionIdx> {
        let name = filename.rsplit('/').next()?;
        let mut parts = name.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("r"), Some(x), Some(z), Some(ext), None) if ext == "mca" || ext == "mcr" => {
                Some(RegionIdx::new(x.parse().ok()?, z.parse().ok()?))
            }
            _ => None,
        }
    }

    /// The NE corner chunk.
    pub fn base_chunk(&self) -> ChunkIdx {
        ChunkIdx::new(self.x * 32, self.z * 32)
    }
}

impl fmt::Display for RegionIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.z)
    }
}

/// A tile at the base zoom level. These are not the same coords used by the
/// map viewer, whose coords are all positive; our tile [0,0] maps to its
/// tile [2^(baseZoom-1), 2^(baseZoom-1)].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TileIdx {
    pub x: i64,
    pub y: i64,
}

impl TileIdx {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The viewer limit is 2^Z by 2^Z tiles at zoom level Z; check whether
    /// this tile is within the allowed range for base_zoom.
    pub fn valid(&self, mp: &MapParams) -> bool {
        if mp.base_zoom == 0 {
            return self.x == 0 && self.y == 0;
        }
        let max = 1i64 << mp.base_zoom;
        let offset = max / 2;
        let gx = self.x + offset;
        let gy = self.y + offset;
        gx >= 0 && gx < max && gy >= 0 && gy < max
    }

    /// The tile's path under the output directory (e.g. "0/3/2.png"), or
    /// None for a tile outside the map.
    pub fn to_file_path(&self, mp: &MapParams) -> Option<String> {
        if !self.valid(mp) {
            return None;
        }
        self.to_zoom_tile_idx(mp).to_file_path()
    }

    pub fn base_chunk(&self, mp: &MapParams) -> ChunkIdx {
        ChunkIdx::new(mp.t * (self.x - 2 * self.y), mp.t * (self.x + 2 * self.y))
    }

    pub fn bbox(&self, mp: &MapParams) -> BBox {
        let bco = self.base_chunk(mp).base_corner().center(mp);
        let tl = bco + Pixel::new(-2 * mp.b, 17 * mp.b - mp.tile_size());
        BBox::new(tl, tl + Pixel::new(mp.tile_size(), mp.tile_size()))
    }

    pub fn to_zoom_tile_idx(&self, mp: &MapParams) -> ZoomTileIdx {
        let offset = (1i64 << mp.base_zoom) / 2;
        ZoomTileIdx::new(self.x + offset, self.y + offset, mp.base_zoom)
    }
}

impl Add for TileIdx {
    type Output = TileIdx;
    fn add(self, t: TileIdx) -> TileIdx {
        TileIdx::new(self.x + t.x, self.y + t.y)
    }
}

impl Sub for TileIdx {
    type Output = TileIdx;
    fn sub(self, t: TileIdx) -> TileIdx {
        TileIdx::new(self.x - t.x, self.y - t.y)
    }
}

impl AddAssign for TileIdx {
    fn add_assign(&mut self, t: TileIdx) {
        self.x += t.x;
        self.y += t.y;
    }
}

impl SubAssign for TileIdx {
    fn sub_assign(&mut self, t: TileIdx) {
        self.x -= t.x;
        self.y -= t.y;
    }
}

impl fmt::Display for TileIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// A tile at any zoom level, in all-positive viewer coords: each coord runs
/// from 0 to 2^zoom, zoom 0 being the single top-level tile.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ZoomTileIdx {
    pub x: i64,
    pub y: i64,
    pub zoom: i32,
}

impl ZoomTileIdx {
    pub fn new(x: i64, y: i64, zoom: i32) -> Self {
        Self { x, y, zoom }
    }

    pub fn valid(&self) -> bool {
        let max = 1i64 << self.zoom;
        self.x >= 0 && self.x < max && self.y >= 0 && self.y < max && self.zoom >= 0
    }

    /// The tile's path under the output directory: one digit directory per
    /// zoom level, most significant bit pair first; zoom 0 is "base.png".
    pub fn to_file_path(&self) -> Option<String> {
        if !self.valid() {
            return None;
        }
        if self.zoom == 0 {
            return Some("base.png".to_owned());
        }
        let mut parts = Vec::with_capacity(self.zoom as usize);
        for z in (0..self.zoom).rev() {
            let xbit = (self.x >> z) & 0x1;
            let ybit = (self.y >> z) & 0x1;
            parts.push((xbit + 2 * ybit).to_string());
        }
        Some(parts.join("/") + ".png")
    }

    /// The top-left base tile contained in this tile.
    pub fn to_tile_idx(&self, mp: &MapParams) -> TileIdx {
        let shift = mp.base_zoom - self.zoom;
        let offset = (1i64 << mp.base_zoom) / 2;
        TileIdx::new((self.x << shift) - offset, (self.y << shift) - offset)
    }

    /// If z > zoom, the top-left tile of those at level z that this tile
    /// includes; if z < zoom, the tile at level z that includes this one.
    pub fn to_zoom(&self, z: i32) -> ZoomTileIdx {
        if z > self.zoom {
            let shift = z - self.zoom;
            ZoomTileIdx::new(self.x << shift, self.y << shift, z)
        } else {
            let shift = self.zoom - z;
            ZoomTileIdx::new(self.x >> shift, self.y >> shift, z)
        }
    }

    // no Add impl; addition shouldn't be defined for tiles at different
    // zoom levels
    pub fn add(&self, dx: i64, dy: i64) -> ZoomTileIdx {
        ZoomTileIdx::new(self.x + dx, self.y + dy, self.zoom)
    }
}

impl fmt::Display for ZoomTileIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{},{}] @ {}", self.x, self.y, self.zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_block_round_trip() {
        // for every block center pixel, top_block must return a block whose
        // center is that pixel
        for b in 2..=6 {
            let mp = MapParams::new(b, 1, 4);
            for bx in -20..20 {
                for bz in -20..20 {
                    let bi = BlockIdx::new(bx, bz, mp.max_y);
                    let p = bi.center(&mp);
                    let top = BlockIdx::top_block(p, &mp);
                    assert_eq!(top, bi, "B = {}", b);
                    assert_eq!(top.center(&mp), p);
                }
            }
        }
    }

    #[test]
    fn test_tile_bboxes() {
        for b in 2..=4 {
            for t in 1..=3 {
                let mp = MapParams::new(b, t, 10);
                for tx in -3..=3i64 {
                    for ty in -3..=3i64 {
                        let ti = TileIdx::new(tx, ty);
                        let bbox = ti.bbox(&mp);
                        let xmin = 64 * b * t * tx - 2 * b;
                        let ymax = 64 * b * t * ty + 17 * b;
                        let xmax = xmin + mp.tile_size();
                        let ymin = ymax - mp.tile_size();
                        assert_eq!(bbox.top_left, Pixel::new(xmin, ymin));
                        assert_eq!(bbox.bottom_right, Pixel::new(xmax, ymax));
                        // spot-check inclusion around the corners
                        assert!(bbox.includes(Pixel::new(xmin, ymin)));
                        assert!(!bbox.includes(Pixel::new(xmin - 1, ymin)));
                        assert!(!bbox.includes(Pixel::new(xmax, ymin)));
                        assert!(bbox.includes(Pixel::new(xmax - 1, ymax - 1)));
                        assert!(!bbox.includes(Pixel::new(xmax - 1, ymax)));
                    }
                }
            }
        }
    }

    #[test]
    fn test_pixel_tile_matches_bbox() {
        let mp = MapParams::new(3, 2, 8);
        for tx in -2..=2 {
            for ty in -2..=2 {
                let ti = TileIdx::new(tx, ty);
                let bbox = ti.bbox(&mp);
                assert_eq!(bbox.top_left.tile(&mp), ti);
                assert_eq!((bbox.bottom_right - Pixel::new(1, 1)).tile(&mp), ti);
                assert_ne!(bbox.bottom_right.tile(&mp), ti);
            }
        }
    }

    #[test]
    fn test_tile_zoom_tile_round_trip() {
        for base_zoom in 3..11 {
            let mp = MapParams::new(6, 1, base_zoom);
            for x in -4..4 {
                for y in -4..4 {
                    let ti = TileIdx::new(x, y);
                    assert_eq!(ti.to_zoom_tile_idx(&mp).to_tile_idx(&mp), ti);
                }
            }
        }
    }

    #[test]
    fn test_zoom_tile_to_zoom_contains() {
        for base_zoom in 3..11 {
            let mp = MapParams::new(6, 1, base_zoom);
            for z in 0..4 {
                for x in 0..(1i64 << z) {
                    for y in 0..(1i64 << z) {
                        let zti = ZoomTileIdx::new(x, y, z);
                        let ti = zti.to_tile_idx(&mp);
                        let zti2 = zti.to_zoom(base_zoom);
                        assert_eq!(zti2.to_tile_idx(&mp), ti);
                        // descending then re-ascending returns the original
                        assert_eq!(zti2.to_zoom(z), zti);
                    }
                }
            }
        }
    }

    #[test]
    fn test_zoom_tile_file_paths() {
        assert_eq!(
            ZoomTileIdx::new(0, 0, 0).to_file_path(),
            Some("base.png".to_owned())
        );
        assert_eq!(
            ZoomTileIdx::new(0, 0, 1).to_file_path(),
            Some("0.png".to_owned())
        );
        assert_eq!(
            ZoomTileIdx::new(1, 1, 1).to_file_path(),
            Some("3.png".to_owned())
        );
        assert_eq!(
            ZoomTileIdx::new(1, 2, 2).to_file_path(),
            Some("2/1.png".to_owned())
        );
        assert_eq!(ZoomTileIdx::new(2, 0, 1).to_file_path(), None);
    }

    #[test]
    fn test_chunk_file_path_round_trip() {
        for x in (-123..=201).step_by(45) {
            for z in (-239..=196).step_by(57) {
                let ci = ChunkIdx::new(x, z);
                let path = ci.to_file_path();
                assert_eq!(ChunkIdx::from_file_path(&path), Some(ci), "{}", path);
            }
        }
        assert_eq!(
            ChunkIdx::from_file_path("/world/0/0/c.0.0.dat"),
            Some(ChunkIdx::new(0, 0))
        );
        assert_eq!(ChunkIdx::from_file_path("r.0.0.mca"), None);
        assert_eq!(ChunkIdx::from_file_path("c.0.dat"), None);
        assert_eq!(ChunkIdx::from_file_path("level.dat"), None);
    }

    #[test]
    fn test_region_file_path_round_trip() {
        let ri = RegionIdx::new(-1, 2);
        assert_eq!(ri.to_old_file_name(), "r.-1.2.mcr");
        assert_eq!(ri.to_anvil_file_name(), "r.-1.2.mca");
        assert_eq!(RegionIdx::from_file_path("region/r.-1.2.mca"), Some(ri));
        assert_eq!(RegionIdx::from_file_path("r.-1.2.mcr"), Some(ri));
        assert_eq!(RegionIdx::from_file_path("r.-1.2.dat"), None);
        assert_eq!(RegionIdx::from_file_path("r.x.2.mca"), None);
    }

    #[test]
    fn test_chunk_tile_overlap() {
        // every claimed tile really does intersect the chunk, and the claim
        // set stays within the two-wide by ceil(4.47/T)-tall range
        let mp = MapParams::new(3, 1, 10);
        for cx in -8..8 {
            for cz in -8..8 {
                let ci = ChunkIdx::new(cx, cz);
                let tiles = ci.get_tiles(&mp);
                let bb = ci.bbox(&mp);
                for ti in &tiles {
                    assert!(ti.bbox(&mp).overlaps(&bb), "chunk {} tile {}", ci, ti);
                }
                // T=1: at most 2 wide x 5 tall
                assert!(tiles.len() <= 10, "chunk {} hit {} tiles", ci, tiles.len());
            }
        }
    }

    #[test]
    fn test_occlusion_is_se_d_only() {
        let a = BlockIdx::new(0, 0, 0);
        // a block occludes itself, its S, E, D neighbors and combinations
        assert!(a.occludes(&BlockIdx::new(1, 0, 0)));
        assert!(a.occludes(&BlockIdx::new(0, -1, 0)));
        assert!(a.occludes(&BlockIdx::new(0, 0, -1)));
        assert!(a.occludes(&BlockIdx::new(1, -1, -1)));
        // never N, W, or U
        assert!(!a.occludes(&BlockIdx::new(-1, 0, 0)));
        assert!(!a.occludes(&BlockIdx::new(0, 1, 0)));
        assert!(!a.occludes(&BlockIdx::new(0, 0, 1)));
        // more than one hexagonal step away
        assert!(!a.occludes(&BlockIdx::new(2, 0, 0)));
        assert!(!a.occludes(&BlockIdx::new(0, -2, 0)));
        assert!(!a.occludes(&BlockIdx::new(0, 0, -9)));
        assert!(a.is_occluded_by(&BlockIdx::new(-1, 0, 0)));
    }

    #[test]
    fn test_params_file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut mp = MapParams::new(3, 2, 7);
        mp.write_file(dir.path())?;
        let mp2 = MapParams::read_file(dir.path())?;
        assert_eq!(mp, mp2);

        mp.min_y = 10;
        mp.max_y = 100;
        mp.user_min_y = true;
        mp.user_max_y = true;
        mp.write_file(dir.path())?;
        let mp3 = MapParams::read_file(dir.path())?;
        assert_eq!(mp, mp3);
        Ok(())
    }

    #[test]
    fn test_params_file_rejects_garbage() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("pigmap.params"), "B 99\nT 1\nbaseZoom 5\n")?;
        assert!(MapParams::read_file(dir.path()).is_err());
        std::fs::write(dir.path().join("pigmap.params"), "B 3 extra\n")?;
        assert!(MapParams::read_file(dir.path()).is_err());
        Ok(())
    }
}
