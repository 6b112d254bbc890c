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

//! Scene graph construction and tile drawing.
//!
//! The blocks in a tile partition by their center pixels into
//! pseudocolumns: sets of blocks that cover exactly the same pixels (each
//! block covers the block immediately SED of it, and so on). Each block can
//! also partially occlude blocks in the six neighboring pseudocolumns, so
//! the blocks form a DAG: each node carries up to 7 edges, each pointing at
//! the topmost occluded block of a pseudocolumn. A block can be drawn once
//! all of its descendants have been drawn.

use blockimages::BlockImages;
use log::{error, warn};
use mapgeom::{ceildiv, BBox, BlockIdx, MapParams, Pixel, TileIdx, ZoomTileIdx};
use rgba::{alphablit, blend, reduce_half, ImageRect, RGBAImage};
use std::path::PathBuf;
use tables::{PosChunkIdx, PosTileIdx, TileTable};
use worldio::{BlockOffset, CacheStats, ChunkCache};

/// Counters accumulated over a render and printed at the end.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderStats {
    pub reqchunkcount: i64,
    pub reqregioncount: i64,
    pub reqtilecount: i64,
    pub chunkcache: CacheStats,
    pub regioncache: CacheStats,
}

/// Everything one worker needs to render its share of tiles. The sprite
/// atlas is shared read-only; everything here is owned per worker.
pub struct RenderJob {
    /// Whether we're doing the entire world, as opposed to an incremental
    /// update.
    pub fullrender: bool,
    /// Whether the world is in region format (chunk format assumed if not).
    pub regionformat: bool,
    /// Don't actually draw anything or read chunks; just walk the data
    /// structures.
    pub testmode: bool,
    pub mp: MapParams,
    pub outputpath: PathBuf,
    pub tiletable: TileTable,
    /// Not present in test mode. Owns the chunk/region tables and the
    /// region cache.
    pub chunkcache: Option<ChunkCache>,
    pub tilecache: TileCache,
    pub scenegraph: SceneGraph,
    pub stats: RenderStats,
}

/// As tiles render recursively, each zoom level needs to hold four
/// intermediate child images; this keeps their storage around so it isn't
/// reallocated for every tile.
pub struct TileCache {
    /// Indexed by baseZoom - zoom - 1.
    pub levels: Vec<ZoomLevel>,
}

#[derive(Default)]
pub struct ZoomLevel {
    pub used: [bool; 4],
    pub tiles: [RGBAImage; 4],
}

impl TileCache {
    pub fn new(mp: &MapParams) -> Self {
        let size = mp.tile_size() as i32;
        let mut levels = Vec::new();
        for _ in 0..mp.base_zoom {
            let mut level = ZoomLevel::default();
            for tile in level.tiles.iter_mut() {
                tile.create(size, size);
            }
            levels.push(level);
        }
        Self { levels }
    }
}

/// Rendered zoom tiles at the worker partition level, indexed densely by
/// tile coordinate. Workers fill disjoint slots; the driver reads them all
/// while finishing the levels above.
pub struct ThreadOutputCache {
    pub zoom: i32,
    pub images: Vec<RGBAImage>,
    pub used: Vec<bool>,
}

impl ThreadOutputCache {
    pub fn new(zoom: i32) -> Self {
        let n = (1usize << zoom) * (1 << zoom);
        Self {
            zoom,
            images: (0..n).map(|_| RGBAImage::default()).collect(),
            used: vec![false; n],
        }
    }

    pub fn index(&self, zti: &ZoomTileIdx) -> Option<usize> {
        if zti.zoom != self.zoom {
            return None;
        }
        Some((zti.y * (1 << self.zoom) + zti.x) as usize)
    }
}

#[derive(Debug)]
pub struct SceneGraphNode {
    /// Top-left corner of the block's cell in tile image coords.
    pub xstart: i32,
    pub ystart: i32,
    /// Offset into the sprite atlas.
    pub bimgoffset: usize,
    // whether to darken various edges to indicate drop-off
    pub darken_eu: bool,
    pub darken_su: bool,
    pub darken_nd: bool,
    pub darken_wd: bool,
    pub drawn: bool,
    pub bi: BlockIdx,
    /// Child 0 is the same pseudocolumn; then N, E, SE, S, W, NW. Values
    /// index the SceneGraph's node vector; -1 is "none".
    pub children: [i32; 7],
}

impl SceneGraphNode {
    pub(crate) fn new(x: i32, y: i32, bi: BlockIdx, offset: usize) -> Self {
        Self {
            xstart: x,
            ystart: y,
            bimgoffset: offset,
            darken_eu: false,
            darken_su: false,
            darken_nd: false,
            darken_wd: false,
            drawn: false,
            bi,
            children: [-1; 7],
        }
    }
}

/// All nodes from all pseudocolumns, in sequence: ordered by pseudocolumn,
/// and within a pseudocolumn top to bottom. Cleared and rebuilt per tile.
pub struct SceneGraph {
    pub nodes: Vec<SceneGraphNode>,
    /// Offset into `nodes` of each pseudocolumn's head (-1 for empty ones).
    pub pcols: Vec<i32>,
    // scratch space for the drawing traversal
    nodestack: Vec<i32>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(2048),
            pcols: Vec::new(),
            nodestack: Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.pcols.clear();
    }

    fn top_node(&self, pcol: i32) -> i32 {
        self.pcols[pcol as usize]
    }
}

// topmost grid y-coord in a column (looks only at the top edge of the box)
fn top_pixel_y(x: i64, bbox_top: i64, b: i64) -> i64 {
    if x % (4 * b) == 0 {
        ceildiv(bbox_top, 2 * b) * 2 * b
    } else {
        ceildiv(bbox_top - b, 2 * b) * 2 * b + b
    }
}

/// One pseudocolumn center visited by [`TileBlockIterator`], with the
/// sequence positions of its already-visited neighbors (-1 if the neighbor
/// isn't in the tile).
#[derive(Debug, Copy, Clone)]
pub struct TileBlockPoint {
    pub center: Pixel,
    pub pos: i32,
    pub next_n: i32,
    pub next_e: i32,
    pub next_se: i32,
}

/// Iterates the hexagonal-grid pixels whose blocks can touch a tile,
/// column-major (down, then right). By the time a pseudocolumn comes up,
/// its N, E, and SE neighbors have already been visited.
pub struct TileBlockIterator {
    end: bool,
    current: Pixel,
    pos: i32,
    next_n: i32,
    next_e: i32,
    next_se: i32,
    b: i64,
    // the tile's bbox expanded by half a block's bbox, so any block
    // centered inside it hits the tile
    expanded: BBox,
    last_top: i32,
    last_bottom: i32,
}

impl TileBlockIterator {
    pub fn new(ti: TileIdx, mp: &MapParams) -> Self {
        let mut expanded = ti.bbox(mp);
        expanded.top_left -= Pixel::new(2 * mp.b - 1, 2 * mp.b - 1);
        expanded.bottom_right += Pixel::new(2 * mp.b - 1, 2 * mp.b - 1);
        let x = ceildiv(expanded.top_left.x, 2 * mp.b) * 2 * mp.b;
        let y = top_pixel_y(x, expanded.top_left.y, mp.b);
        Self {
            end: false,
            current: Pixel::new(x, y),
            pos: 0,
            next_n: -1,
            next_e: -1,
            next_se: -1,
            b: mp.b,
            expanded,
            last_top: 0,
            last_bottom: -1,
        }
    }

    fn advance(&mut self) {
        let b = self.b;
        // move down the column; our current pos is SE of our next pos
        self.current.y += 2 * b;
        self.next_se = self.pos;
        // when we reset at the top of a column, we may not get an E
        // neighbor, but we always get a N one; so no N neighbor means we're
        // on the left edge
        if self.next_n != -1 {
            // off the left edge, our N neighbor is our next position's E
            // neighbor, and so on
            self.next_e = self.next_n;
            self.next_n += 1;
            // watch for the bottom, where there's no N neighbor
            if self.next_e == self.last_bottom {
                self.next_n = -1;
            }
        }
        self.pos += 1;

        // off the bottom: move over to the next column
        if self.current.y >= self.expanded.bottom_right.y {
            self.current.x += 2 * b;
            if self.current.x >= self.expanded.bottom_right.x {
                self.end = true;
                return;
            }
            self.current.y = top_pixel_y(self.current.x, self.expanded.top_left.y, b);
            // up at the top there's no SE neighbor, but there is a N one,
            // and an E one if the column to the left starts above us
            self.next_se = -1;
            if top_pixel_y(self.current.x - 2 * b, self.expanded.top_left.y, b) < self.current.y {
                self.next_e = self.last_top;
                self.next_n = self.next_e + 1;
            } else {
                self.next_e = -1;
                self.next_n = self.last_top;
            }
            self.last_top = self.pos;
            self.last_bottom = self.pos - 1;
        }
    }
}

impl Iterator for TileBlockIterator {
    type Item = TileBlockPoint;

    fn next(&mut self) -> Option<TileBlockPoint> {
        if self.end {
            return None;
        }
        let out = TileBlockPoint {
            center: self.current,
            pos: self.pos,
            next_n: self.next_n,
            next_e: self.next_e,
            next_se: self.next_se,
        };
        self.advance();
        Some(out)
    }
}

/// Iterates the blocks that project to one center pixel, top to bottom:
/// starting from the topmost block and stepping (+1,-1,-1) until the bottom
/// of the render range.
pub struct PseudocolumnIterator {
    current: BlockIdx,
    min_y: i64,
}

impl PseudocolumnIterator {
    pub fn new(center: Pixel, mp: &MapParams) -> Self {
        Self {
            current: BlockIdx::top_block(center, mp),
            min_y: mp.min_y,
        }
    }
}

impl Iterator for PseudocolumnIterator {
    type Item = BlockIdx;

    fn next(&mut self) -> Option<BlockIdx> {
        if self.current.y < self.min_y {
            return None;
        }
        let out = self.current;
        self.current += BlockIdx::new(1, -1, -1);
        Some(out)
    }
}

// Travel down two neighboring pseudocolumns, adding occlusion edges between
// their nodes. pcol1 must be N, E, or SE of pcol2, and `which` is the edge
// slot from the first to the second--e.g. which == 4 means the first is N
// of the second, so its S edge (#4) is used and the second's N edge
// (which - 3 == #1) in the other direction.
fn build_dependencies(sg: &mut SceneGraph, pcol1: i32, pcol2: i32, which: usize) {
    let mut node1 = sg.top_node(pcol1);
    let mut node2 = sg.top_node(pcol2);
    if node1 == -1 || node2 == -1 {
        return;
    }

    loop {
        // if node1 occludes node2, scan down pcol1 for lower nodes that
        // also occlude it; the lowest such occluder takes the edge, and
        // node1 moves past it
        if sg.nodes[node1 as usize].bi.occludes(&sg.nodes[node2 as usize].bi) {
            let mut next1 = sg.nodes[node1 as usize].children[0];
            while next1 != -1
                && sg.nodes[next1 as usize].bi.occludes(&sg.nodes[node2 as usize].bi)
            {
                node1 = next1;
                next1 = sg.nodes[node1 as usize].children[0];
            }
            sg.nodes[node1 as usize].children[which] = node2;
            node1 = next1;
        }

        if node1 == -1 {
            return;
        }

        // ...same thing for the other direction
        if sg.nodes[node2 as usize].bi.occludes(&sg.nodes[node1 as usize].bi) {
            let mut next2 = sg.nodes[node2 as usize].children[0];
            while next2 != -1
                && sg.nodes[next2 as usize].bi.occludes(&sg.nodes[node1 as usize].bi)
            {
                node2 = next2;
                next2 = sg.nodes[node2 as usize].children[0];
            }
            sg.nodes[node2 as usize].children[which - 3] = node1;
            node2 = next2;
        }

        if node2 == -1 {
            return;
        }
    }
}

// block id (masked to the sprite table's 12 bits) and data of a neighbor
fn neighbor(cache: &mut ChunkCache, bi: BlockIdx) -> (u16, u8) {
    let ci = PosChunkIdx::from(bi.chunk_idx());
    let cd = cache.get_data(ci);
    let bo = BlockOffset::new(bi);
    (cd.id(bo) & 0xfff, cd.data(bo))
}

// Given a node that must be drawn, apply anything that doesn't depend
// purely on its own id/data: nodes with no S/E/D neighbors get drop-off
// edge darkening; water and ice drop hidden faces; fences pick their
// connectivity variant; chests collapse into double-chest halves or turn to
// face away from an opaque block.
pub(crate) fn check_special(
    node: &mut SceneGraphNode,
    block_id: u16,
    block_data: u8,
    cache: &mut ChunkCache,
    blockimages: &BlockImages,
) {
    let bi = node.bi;
    let n = BlockIdx::new(-1, 0, 0);
    let s = BlockIdx::new(1, 0, 0);
    let e = BlockIdx::new(0, -1, 0);
    let w = BlockIdx::new(0, 1, 0);
    let d = BlockIdx::new(0, 0, -1);

    if node.bimgoffset == 8 {
        // solid water: faces hidden behind more water aren't drawn
        let (id_n, _) = neighbor(cache, bi + n);
        let (id_w, _) = neighbor(cache, bi + w);
        let water_n = id_n == 8 || id_n == 9;
        let water_w = id_w == 8 || id_w == 9;
        if water_w && water_n {
            node.bimgoffset = 157;
        } else if water_w {
            node.bimgoffset = 178;
        } else if water_n {
            node.bimgoffset = 179;
        }
    } else if block_id == 79 {
        // ice: same deal
        let (id_n, _) = neighbor(cache, bi + n);
        let (id_w, _) = neighbor(cache, bi + w);
        let ice_n = id_n == 79;
        let ice_w = id_w == 79;
        if ice_w && ice_n {
            node.bimgoffset = 180;
        } else if ice_w {
            node.bimgoffset = 181;
        } else if ice_n {
            node.bimgoffset = 182;
        }
    } else if block_id == 85 {
        // fence: one of 16 connectivity variants
        let (id_n, _) = neighbor(cache, bi + n);
        let (id_s, _) = neighbor(cache, bi + s);
        let (id_e, _) = neighbor(cache, bi + e);
        let (id_w, _) = neighbor(cache, bi + w);
        let bits = usize::from(id_n == 85)
            | (usize::from(id_s == 85) << 1)
            | (usize::from(id_e == 85) << 2)
            | (usize::from(id_w == 85) << 3);
        if bits != 0 {
            node.bimgoffset = 157 + bits;
        }
    } else if block_id == 54 {
        // chest: join a neighboring chest into a double chest, or face N
        // when an opaque block sits to the W
        let (id_n, _) = neighbor(cache, bi + n);
        let (id_s, _) = neighbor(cache, bi + s);
        let (id_e, _) = neighbor(cache, bi + e);
        let (id_w, data_w) = neighbor(cache, bi + w);
        // a pair along the N-S axis shows a W or E front; along E-W, N or S
        let faces_e = block_data == 2 || block_data == 5;
        let faces_n = block_data == 4;
        if id_n == 54 {
            node.bimgoffset = if faces_e { 492 } else { 488 };
        } else if id_s == 54 {
            node.bimgoffset = if faces_e { 491 } else { 487 };
        } else if id_w == 54 {
            node.bimgoffset = if faces_n { 489 } else { 493 };
        } else if id_e == 54 {
            node.bimgoffset = if faces_n { 490 } else { 494 };
        } else if blockimages.is_opaque_block(id_w, data_w) {
            // note: checking just the neighbor's id/data isn't strictly
            // correct, since the neighbor might itself get special-cased
            // into a different sprite that's no longer opaque--but nothing
            // currently does that, and it'd be one strange block anyway
            node.bimgoffset = 485;
        }
    } else if block_id == 95 {
        // locked chest: only the face-N rotation applies
        let (id_w, data_w) = neighbor(cache, bi + w);
        if blockimages.is_opaque_block(id_w, data_w) {
            node.bimgoffset = 271;
        }
    }

    // only fully opaque sprites get drop-off shadows
    if blockimages.is_opaque(node.bimgoffset) {
        let (id_s, _) = neighbor(cache, bi + s);
        let (id_e, _) = neighbor(cache, bi + e);
        let (id_d, _) = neighbor(cache, bi + d);
        if id_s == 0 {
            node.darken_su = true;
        }
        if id_e == 0 {
            node.darken_eu = true;
        }
        if id_d == 0 {
            node.darken_nd = true;
            node.darken_wd = true;
        }
    }
}

const EDGE_SHADOW: u32 = 0x6000_0000;

// The four drop-off edges run along the 2B-1 pixel diagonals of the cell,
// alternating one-pixel and two-pixel steps.
fn darken_eu_edge(img: &mut RGBAImage, xstart: i32, ystart: i32, b: i32) {
    // EU edge starts at [2B-1,0], one step DL, then L, etc.
    let mut x = xstart + 2 * b - 1;
    let mut y = ystart;
    let mut which = true;
    for _ in 0..2 * b - 1 {
        if x >= 0 && x < img.w && y >= 0 && y < img.h {
            blend(img.get_mut(x, y), EDGE_SHADOW);
        }
        x -= 1;
        if which {
            y += 1;
        }
        which = !which;
    }
}

fn darken_su_edge(img: &mut RGBAImage, xstart: i32, ystart: i32, b: i32) {
    // SU edge starts at [2B,0], one step DR, then R, etc.
    let mut x = xstart + 2 * b;
    let mut y = ystart;
    let mut which = true;
    for _ in 0..2 * b - 1 {
        if x >= 0 && x < img.w && y >= 0 && y < img.h {
            blend(img.get_mut(x, y), EDGE_SHADOW);
        }
        x += 1;
        if which {
            y += 1;
        }
        which = !which;
    }
}

fn darken_nd_edge(img: &mut RGBAImage, xstart: i32, ystart: i32, b: i32) {
    // ND edge starts at [2B-1,4B-1], one step UL, then L, etc.
    let mut x = xstart + 2 * b - 1;
    let mut y = ystart + 4 * b - 1;
    let mut which = true;
    for _ in 0..2 * b - 1 {
        if x >= 0 && x < img.w && y >= 0 && y < img.h {
            blend(img.get_mut(x, y), EDGE_SHADOW);
        }
        x -= 1;
        if which {
            y -= 1;
        }
        which = !which;
    }
}

fn darken_wd_edge(img: &mut RGBAImage, xstart: i32, ystart: i32, b: i32) {
    // WD edge starts at [2B,4B-1], one step UR, then R, etc.
    let mut x = xstart + 2 * b;
    let mut y = ystart + 4 * b - 1;
    let mut which = true;
    for _ in 0..2 * b - 1 {
        if x >= 0 && x < img.w && y >= 0 && y < img.h {
            blend(img.get_mut(x, y), EDGE_SHADOW);
        }
        x += 1;
        if which {
            y -= 1;
        }
        which = !which;
    }
}

fn draw_node(sg: &mut SceneGraph, node_idx: usize, img: &mut RGBAImage, blockimages: &BlockImages) {
    let node = &sg.nodes[node_idx];
    let (xstart, ystart) = (node.xstart, node.ystart);
    alphablit(
        &blockimages.img,
        blockimages.get_rect(node.bimgoffset),
        img,
        xstart,
        ystart,
    );
    let b = blockimages.rectsize / 4;
    if node.darken_eu {
        darken_eu_edge(img, xstart, ystart, b);
    }
    if node.darken_su {
        darken_su_edge(img, xstart, ystart, b);
    }
    if node.darken_nd {
        darken_nd_edge(img, xstart, ystart, b);
    }
    if node.darken_wd {
        darken_wd_edge(img, xstart, ystart, b);
    }
    sg.nodes[node_idx].drawn = true;
}

// iterative DFS: draw every not-yet-drawn descendant of a node, then the
// node itself
fn draw_subgraph(
    sg: &mut SceneGraph,
    rootnode: usize,
    img: &mut RGBAImage,
    blockimages: &BlockImages,
) {
    if sg.nodes[rootnode].drawn {
        return;
    }
    let mut stack = std::mem::take(&mut sg.nodestack);
    stack.clear();
    stack.push(rootnode as i32);
    while let Some(&top) = stack.last() {
        let children = sg.nodes[top as usize].children;
        let mut pushed = false;
        for child in children {
            if child != -1 && !sg.nodes[child as usize].drawn {
                stack.push(child);
                pushed = true;
                break;
            }
        }
        if pushed {
            continue;
        }
        draw_node(sg, top as usize, img, blockimages);
        stack.pop();
    }
    sg.nodestack = stack;
}

/// Render a base tile into `tile` and write it to disk. Does nothing and
/// returns false if the tile is not required or out of range.
pub fn render_tile(
    ti: TileIdx,
    rj: &mut RenderJob,
    blockimages: &BlockImages,
    tile: &mut RGBAImage,
) -> bool {
    let pti = PosTileIdx::from(ti);
    if !rj.tiletable.is_required(pti) {
        return false;
    }

    // the tile has to fit on the map
    let tilefile = match ti.to_file_path(&rj.mp) {
        Some(path) => rj.outputpath.join(path),
        None => {
            warn!("tile {} exceeds the possible map size!  skipping...", ti);
            return false;
        }
    };
    // drawing the same tile twice in one run should not be possible
    if rj.tiletable.is_drawn(pti) {
        error!("attempted to draw tile {} more than once!", ti);
        return false;
    }

    if rj.testmode {
        rj.tiletable.set_drawn(pti);
        return true;
    }

    let cache = rj
        .chunkcache
        .as_mut()
        .expect("render jobs outside test mode carry a chunk cache");
    let sg = &mut rj.scenegraph;
    sg.clear();
    let size = rj.mp.tile_size() as i32;
    tile.create(size, size);

    // pseudocolumn centers come in absolute pixel coords; blitting wants
    // the block's cell origin in tile image coords (shift by the tile
    // corner, then another [2B,2B] from center to cell corner)
    let tilebb = ti.bbox(&rj.mp);
    let xoff = -tilebb.top_left.x - 2 * rj.mp.b;
    let yoff = -tilebb.top_left.y - 2 * rj.mp.b;

    // step 1: build the scene graph, moving down then right so that each
    // pseudocolumn's N, E, and SE neighbors are finished before it
    for tb in TileBlockIterator::new(ti, &rj.mp) {
        // walk the pseudocolumn top to bottom, adding non-air blocks,
        // stopping at the first totally opaque one
        sg.pcols.push(-1);
        let mut prevnode: i32 = -1;
        for bi in PseudocolumnIterator::new(tb.center, &rj.mp) {
            let ci = PosChunkIdx::from(bi.chunk_idx());
            let bo = BlockOffset::new(bi);
            let data = cache.get_data(ci);
            let block_id = data.id(bo) & 0xfff;
            let block_data = data.data(bo);

            // air is always transparent; it has no sprite at all
            if block_id == 0 {
                continue;
            }

            let initialoffset = blockimages.offset(block_id, block_data);
            let mut node = SceneGraphNode::new(
                (tb.center.x + xoff) as i32,
                (tb.center.y + yoff) as i32,
                bi,
                initialoffset,
            );

            // neighbor-dependent sprite variants and drop-off edges
            check_special(&mut node, block_id, block_data, cache, blockimages);

            // not air, but transparent anyway: skip it
            if blockimages.is_transparent(node.bimgoffset) {
                continue;
            }

            let opaque = blockimages.is_opaque(node.bimgoffset);
            let thisnode = sg.nodes.len() as i32;
            sg.nodes.push(node);

            // link the node above us in our pseudocolumn to us, or become
            // the pseudocolumn's head
            if prevnode != -1 {
                sg.nodes[prevnode as usize].children[0] = thisnode;
            } else {
                *sg.pcols.last_mut().unwrap() = thisnode;
            }
            prevnode = thisnode;

            // nothing below an opaque block is visible
            if opaque {
                break;
            }
        }

        // occlusion edges to our already-finished neighbors
        if tb.next_n != -1 {
            build_dependencies(sg, tb.next_n, tb.pos, 4);
        }
        if tb.next_e != -1 {
            build_dependencies(sg, tb.next_e, tb.pos, 5);
        }
        if tb.next_se != -1 {
            build_dependencies(sg, tb.next_se, tb.pos, 6);
        }
    }

    // step 2: traverse the graph and draw. Declaration order works as the
    // seed order because every predecessor of a node has a lower index.
    for i in 0..sg.nodes.len() {
        draw_subgraph(sg, i, tile, blockimages);
    }

    if let Err(e) = tile.write_png(&tilefile) {
        error!("failed to write {}: {:#}", tilefile.display(), e);
    }
    rj.tiletable.set_drawn(pti);
    true
}

/// Recursively render all required tiles a zoom tile depends on, then the
/// tile itself; the result lands in `tile` and on disk. Returns false (and
/// does nothing) for tiles with no required base tiles under them.
pub fn render_zoom_tile(
    zti: &ZoomTileIdx,
    rj: &mut RenderJob,
    blockimages: &BlockImages,
    tile: &mut RGBAImage,
) -> bool {
    // at the bottom of the pyramid, render the base tile itself
    if zti.zoom == rj.mp.base_zoom {
        return render_tile(zti.to_tile_idx(&rj.mp), rj, blockimages, tile);
    }

    if rj.tiletable.reject(zti, &rj.mp) {
        return false;
    }

    // render the four children into this level's scratch images
    let li = (rj.mp.base_zoom - zti.zoom - 1) as usize;
    let mut zlevel = std::mem::take(&mut rj.tilecache.levels[li]);
    let topleft = zti.to_zoom(zti.zoom + 1);
    zlevel.used[0] = render_zoom_tile(&topleft, rj, blockimages, &mut zlevel.tiles[0]);
    zlevel.used[1] = render_zoom_tile(&topleft.add(0, 1), rj, blockimages, &mut zlevel.tiles[1]);
    zlevel.used[2] = render_zoom_tile(&topleft.add(1, 0), rj, blockimages, &mut zlevel.tiles[2]);
    zlevel.used[3] = render_zoom_tile(&topleft.add(1, 1), rj, blockimages, &mut zlevel.tiles[3]);

    let drawn = combine_children(zti, rj, tile, &zlevel.used, [
        &zlevel.tiles[0],
        &zlevel.tiles[1],
        &zlevel.tiles[2],
        &zlevel.tiles[3],
    ]);
    rj.tilecache.levels[li] = zlevel;
    drawn
}

/// Second phase of a multi-worker run: recurse only down to the
/// ThreadOutputCache's level and pull the workers' images from there.
pub fn render_zoom_tile_from_cache(
    zti: &ZoomTileIdx,
    rj: &mut RenderJob,
    tile: &mut RGBAImage,
    tocache: &ThreadOutputCache,
) -> bool {
    // this variant never descends to the cache level itself
    if zti.zoom >= tocache.zoom {
        return false;
    }

    let li = (rj.mp.base_zoom - zti.zoom - 1) as usize;
    let mut zlevel = std::mem::take(&mut rj.tilecache.levels[li]);
    let topleft = zti.to_zoom(zti.zoom + 1);
    let children = [topleft, topleft.add(0, 1), topleft.add(1, 0), topleft.add(1, 1)];

    let drawn;
    if zti.zoom == tocache.zoom - 1 {
        // children sit in the output cache
        let mut images: [&RGBAImage; 4] = [&zlevel.tiles[0]; 4];
        for (i, child) in children.iter().enumerate() {
            let idx = tocache
                .index(child)
                .expect("child is one level below this tile");
            zlevel.used[i] = tocache.used[idx];
            images[i] = &tocache.images[idx];
        }
        drawn = combine_children(zti, rj, tile, &zlevel.used, images);
    } else {
        for (i, child) in children.iter().enumerate() {
            zlevel.used[i] =
                render_zoom_tile_from_cache(child, rj, &mut zlevel.tiles[i], tocache);
        }
        drawn = combine_children(zti, rj, tile, &zlevel.used, [
            &zlevel.tiles[0],
            &zlevel.tiles[1],
            &zlevel.tiles[2],
            &zlevel.tiles[3],
        ]);
    }
    rj.tilecache.levels[li] = zlevel;
    drawn
}

// Shrink the drawn children into this tile's quadrants and write it out.
// In incremental mode with partial children, the existing tile is read
// back first so unchanged quadrants survive.
fn combine_children(
    zti: &ZoomTileIdx,
    rj: &mut RenderJob,
    tile: &mut RGBAImage,
    used: &[bool; 4],
    children: [&RGBAImage; 4],
) -> bool {
    let usedcount = used.iter().filter(|&&u| u).count();
    if usedcount == 0 {
        return false;
    }
    if rj.testmode {
        return true;
    }

    let tilefile = rj
        .outputpath
        .join(zti.to_file_path().expect("recursion stays inside the pyramid"));
    let size = rj.mp.tile_size() as i32;
    let mut have_old = false;
    if usedcount < 4 && !rj.fullrender {
        // failure to read is no big deal; the tile may not exist yet
        have_old = tile.read_png(&tilefile).is_ok() && tile.w == size && tile.h == size;
    }
    if !have_old {
        tile.create(size, size);
    }

    let half = size / 2;
    let quadrants = [(0, 0), (0, half), (half, 0), (half, half)];
    for i in 0..4 {
        if used[i] {
            let (x, y) = quadrants[i];
            reduce_half(tile, ImageRect::new(x, y, half, half), children[i]);
        }
    }

    if let Err(e) = tile.write_png(&tilefile) {
        error!("failed to write {}: {:#}", tilefile.display(), e);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_block_iterator_neighbors() {
        // for each visited center, the recorded N/E/SE positions must hold
        // blocks in exactly those directions, and always earlier in the
        // sequence
        for b in 2..=6 {
            for t in 1..=3 {
                let mp = MapParams::new(b, t, 6);
                for tx in -2..=2 {
                    for ty in -2..=2 {
                        let ti = TileIdx::new(tx, ty);
                        let bbox = ti.bbox(&mp);
                        let mut blocks: Vec<BlockIdx> = Vec::new();
                        for tb in TileBlockIterator::new(ti, &mp) {
                            let bi = BlockIdx::top_block(tb.center, &mp);
                            assert_eq!(bi.center(&mp), tb.center);
                            assert!(bi.bbox(&mp).overlaps(&bbox));
                            assert_eq!(tb.pos as usize, blocks.len());
                            assert!(tb.next_e < tb.pos && tb.next_n < tb.pos && tb.next_se < tb.pos);
                            if tb.next_e != -1 {
                                assert_eq!(blocks[tb.next_e as usize].z, bi.z - 1);
                                assert_eq!(blocks[tb.next_e as usize].x, bi.x);
                            }
                            if tb.next_n != -1 {
                                assert_eq!(blocks[tb.next_n as usize].x, bi.x - 1);
                                assert_eq!(blocks[tb.next_n as usize].z, bi.z);
                            }
                            if tb.next_se != -1 {
                                assert_eq!(blocks[tb.next_se as usize].z, bi.z - 1);
                                assert_eq!(blocks[tb.next_se as usize].x, bi.x + 1);
                            }
                            blocks.push(bi);
                        }
                        assert!(!blocks.is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn test_pseudocolumn_iterator_tracks_neighbors() {
        let mp = MapParams::new(6, 1, 4);
        let ti = TileIdx::new(0, 0);
        let mut centers: Vec<Pixel> = Vec::new();
        for tb in TileBlockIterator::new(ti, &mp) {
            centers.push(tb.center);
            let mut nit = (tb.next_n != -1)
                .then(|| PseudocolumnIterator::new(centers[tb.next_n as usize], &mp));
            let mut eit = (tb.next_e != -1)
                .then(|| PseudocolumnIterator::new(centers[tb.next_e as usize], &mp));
            let mut seit = (tb.next_se != -1)
                .then(|| PseudocolumnIterator::new(centers[tb.next_se as usize], &mp));
            for bi in PseudocolumnIterator::new(tb.center, &mp) {
                if let Some(it) = nit.as_mut() {
                    let nbi = it.next().unwrap();
                    assert_eq!(nbi, bi + BlockIdx::new(-1, 0, 0));
                    assert_eq!(nbi.center(&mp), bi.center(&mp) + Pixel::new(-2 * mp.b, mp.b));
                }
                if let Some(it) = eit.as_mut() {
                    let ebi = it.next().unwrap();
                    assert_eq!(ebi, bi + BlockIdx::new(0, -1, 0));
                    assert_eq!(ebi.center(&mp), bi.center(&mp) + Pixel::new(-2 * mp.b, -mp.b));
                }
                if let Some(it) = seit.as_mut() {
                    let sbi = it.next().unwrap();
                    assert_eq!(sbi, bi + BlockIdx::new(1, -1, 0));
                    assert_eq!(sbi.center(&mp), bi.center(&mp) + Pixel::new(0, -2 * mp.b));
                }
            }
        }
    }

    #[test]
    fn test_pseudocolumn_respects_y_range() {
        let mut mp = MapParams::new(3, 1, 4);
        mp.min_y = 10;
        mp.max_y = 20;
        let center = BlockIdx::new(5, 5, mp.max_y).center(&mp);
        let blocks: Vec<BlockIdx> = PseudocolumnIterator::new(center, &mp).collect();
        assert_eq!(blocks.len(), 11);
        assert_eq!(blocks.first().unwrap().y, 20);
        assert_eq!(blocks.last().unwrap().y, 10);
    }

    #[test]
    fn test_build_dependencies_minimal_edges() {
        // two pseudocolumns with the second one step N of the first: every
        // node pair within one hexagonal step gets exactly one edge, held
        // by the lowest qualifying occluder
        let mp = MapParams::new(3, 1, 4);
        let mut sg = SceneGraph::new();
        let head = BlockIdx::new(0, 0, 4);
        let mut prev = -1;
        for i in 0..3 {
            let bi = head + BlockIdx::new(i, -i, -i);
            let idx = sg.nodes.len() as i32;
            sg.nodes.push(SceneGraphNode::new(0, 0, bi, 1));
            if prev != -1 {
                sg.nodes[prev as usize].children[0] = idx;
            }
            prev = idx;
        }
        sg.pcols.push(0);
        let nhead = head + BlockIdx::new(-1, 0, 0);
        let mut prev = -1;
        for i in 0..3 {
            let bi = nhead + BlockIdx::new(i, -i, -i);
            let idx = sg.nodes.len() as i32;
            sg.nodes.push(SceneGraphNode::new(0, 0, bi, 1));
            if prev != -1 {
                sg.nodes[prev as usize].children[0] = idx;
            }
            prev = idx;
        }
        sg.pcols.push(3);

        // pcol 0 (at index 1) is N of pcol 1... actually nhead is N of
        // head, so pcol1=pcol holding nhead must come first in N slot use
        build_dependencies(&mut sg, 1, 0, 4);

        // the S-direction edges (slot 4) go from the N column to the S one,
        // and the N-direction edges (slot 1) back
        let s_edges: Vec<(usize, i32)> = sg
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.children[4] != -1)
            .map(|(i, n)| (i, n.children[4]))
            .collect();
        let n_edges: Vec<(usize, i32)> = sg
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.children[1] != -1)
            .map(|(i, n)| (i, n.children[1]))
            .collect();
        assert!(!s_edges.is_empty());
        // every edge connects blocks where the source occludes the target
        for &(from, to) in s_edges.iter().chain(n_edges.iter()) {
            assert!(sg.nodes[from].bi.occludes(&sg.nodes[to as usize].bi));
        }
    }

    #[test]
    fn test_occlusion_descends_strictly() {
        // the occludes relation only points S/W/D, so bz+bx+by strictly
        // decreases along edges and the draw order can't cycle
        let a = BlockIdx::new(3, 4, 5);
        for dx in -1..=1i64 {
            for dz in -1..=1i64 {
                for dy in -1..=1i64 {
                    let other = a + BlockIdx::new(dx, dz, dy);
                    if a.occludes(&other) && other != a {
                        assert!(other.x > a.x || other.z < a.z || other.y < a.y);
                    }
                }
            }
        }
    }
}
