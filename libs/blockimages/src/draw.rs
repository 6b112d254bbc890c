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

//! Routines that paint one block sprite into its cell of the atlas. All of
//! them address source textures as tiles of a sheet image (16 tiles per
//! row, each 2Bx2B); a tile index of -1 means "no face here".
//!
//! Within a 4Bx4B cell, the N face starts at (0,B), the W face at (2B,2B),
//! and the U face at (2B-1,0).

use crate::iterators::{FaceIterator, RotatedFaceIterator, TopFaceIterator};
use rgba::{blend, darken, ImageRect, RGBAImage, RGBAPixel};

fn tile_origin(tile: i32, tilesize: i32) -> (i32, i32) {
    ((tile % 16) * tilesize, (tile / 16) * tilesize)
}

/// Draw a normal block image from up to three tiles, each with its own
/// rotation and flip, adding a bit of shadow to the N and W faces.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_rotated_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    nface: i32,
    wface: i32,
    uface: i32,
    rot_n: i32,
    flip_n: bool,
    rot_w: i32,
    flip_w: bool,
    rot_u: i32,
    flip_u: bool,
    b: i32,
) {
    let tilesize = 2 * b;
    if nface >= 0 {
        let (tx, ty) = tile_origin(nface, tilesize);
        let src = RotatedFaceIterator::new(tx, ty, rot_n, tilesize, flip_n);
        for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
        }
    }
    if wface >= 0 {
        let (tx, ty) = tile_origin(wface, tilesize);
        let src = RotatedFaceIterator::new(tx, ty, rot_w, tilesize, flip_w);
        for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
        }
    }
    if uface >= 0 {
        let (tx, ty) = tile_origin(uface, tilesize);
        let src = RotatedFaceIterator::new(tx, ty, rot_u, tilesize, flip_u);
        for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize)) {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
}

pub(crate) fn draw_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    nface: i32,
    wface: i32,
    uface: i32,
    b: i32,
) {
    draw_rotated_block_image(
        dest, drect, tiles, nface, wface, uface, 0, false, 0, false, 0, false, b,
    );
}

/// Draw a block that isn't full height (slabs, snow, beds, etc.).
/// `topcutoff`/`bottomcutoff` are the number of pixels (out of 2B) chopped
/// off the N/W faces; if `shift`, source pixels are taken from the very top
/// of the tile even with a topcutoff. The U face may be rotated, and the
/// N/W faces X-flipped (flip bit 0x1 for N, 0x2 for W).
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_partial_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    nface: i32,
    wface: i32,
    uface: i32,
    b: i32,
    topcutoff: i32,
    bottomcutoff: i32,
    rot: i32,
    flip: i32,
    shift: bool,
) {
    let tilesize = 2 * b;
    if topcutoff + bottomcutoff >= tilesize {
        return;
    }
    let end = tilesize - bottomcutoff;
    let shift_off = if shift { topcutoff } else { 0 };
    if nface >= 0 {
        let (tx, ty) = tile_origin(nface, tilesize);
        let src = RotatedFaceIterator::new(tx, ty, 0, tilesize, flip & 0x1 != 0);
        for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
            if d.pos % tilesize >= topcutoff && d.pos % tilesize < end {
                dest.set(d.x, d.y, tiles.get(s.x, s.y - shift_off));
                darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
            }
        }
    }
    if wface >= 0 {
        let (tx, ty) = tile_origin(wface, tilesize);
        let src = RotatedFaceIterator::new(tx, ty, 0, tilesize, flip & 0x2 != 0);
        for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
            if d.pos % tilesize >= topcutoff && d.pos % tilesize < end {
                dest.set(d.x, d.y, tiles.get(s.x, s.y - shift_off));
                darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
            }
        }
    }
    if uface >= 0 {
        let (tx, ty) = tile_origin(uface, tilesize);
        let src = RotatedFaceIterator::new(tx, ty, rot, tilesize, false);
        for (s, d) in src.zip(TopFaceIterator::new(
            drect.x + 2 * b - 1,
            drect.y + topcutoff,
            tilesize,
        )) {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
}

/// Draw two flat copies of a tile intersecting at the block center
/// (saplings, flowers, etc.), with each half-face optional.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_partial_item_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    rot: i32,
    flip_x: bool,
    b: i32,
    n: bool,
    s: bool,
    e: bool,
    w: bool,
) {
    if tile < 0 {
        return;
    }
    let tilesize = 2 * b;
    let cutoff = tilesize / 2;
    let (tx, ty) = tile_origin(tile, tilesize);
    // E/W face starting at [B,1.5B] -- southern half only
    if s {
        let src = RotatedFaceIterator::new(tx, ty, rot, tilesize, flip_x);
        for (sp, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b * 3 / 2, -1, tilesize)) {
            if d.pos / tilesize >= cutoff {
                blend(dest.get_mut(d.x, d.y), tiles.get(sp.x, sp.y));
            }
        }
    }
    // N/S face starting at [B,0.5B]
    if e || w {
        let src = RotatedFaceIterator::new(tx, ty, rot, tilesize, flip_x);
        for (sp, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b / 2, 1, tilesize)) {
            if (w && d.pos / tilesize >= cutoff) || (e && d.pos / tilesize < cutoff) {
                blend(dest.get_mut(d.x, d.y), tiles.get(sp.x, sp.y));
            }
        }
    }
    // E/W face starting at [B,1.5B] -- northern half only
    if n {
        let src = RotatedFaceIterator::new(tx, ty, rot, tilesize, flip_x);
        for (sp, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b * 3 / 2, -1, tilesize)) {
            if d.pos / tilesize < cutoff {
                blend(dest.get_mut(d.x, d.y), tiles.get(sp.x, sp.y));
            }
        }
    }
}

pub(crate) fn draw_item_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    b: i32,
) {
    draw_partial_item_block_image(dest, drect, tiles, tile, 0, false, b, true, true, true, true);
}

/// Draw four flat copies of a tile intersecting in a square (netherwart).
pub(crate) fn draw_multi_item_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    b: i32,
) {
    if tile < 0 {
        return;
    }
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    let quads = [
        // E/W faces at [0.5B,1.25B] and [1.5B,1.75B]
        (drect.x + b / 2, drect.y + b * 5 / 4, -1),
        (drect.x + 3 * b / 2, drect.y + b * 7 / 4, -1),
        // N/S faces at [0.5B,0.75B] and [1.5B,0.25B]
        (drect.x + b / 2, drect.y + b * 3 / 4, 1),
        (drect.x + 3 * b / 2, drect.y + b / 4, 1),
    ];
    for (dx, dy, delta) in quads {
        let src = RotatedFaceIterator::new(tx, ty, 0, tilesize, false);
        for (s, d) in src.zip(FaceIterator::new(dx, dy, delta, tilesize)) {
            blend(dest.get_mut(d.x, d.y), tiles.get(s.x, s.y));
        }
    }
}

fn single_face_params(face: i32, b: i32) -> (i32, i32, i32) {
    // 0 = S, 1 = N, 2 = W, 3 = E
    match face {
        0 => (2 * b, 0, 1),
        1 => (0, b, 1),
        2 => (2 * b, 2 * b, -1),
        _ => (0, b, -1),
    }
}

/// Draw a tile on a single upright face (torches, doors, ladders).
/// Handles transparency.
pub(crate) fn draw_single_face_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    face: i32,
    b: i32,
) {
    if tile < 0 {
        return;
    }
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    let (xoff, yoff, delta_y) = single_face_params(face, b);
    let src = RotatedFaceIterator::new(tx, ty, 0, tilesize, false);
    for (s, d) in src.zip(FaceIterator::new(
        drect.x + xoff,
        drect.y + yoff,
        delta_y,
        tilesize,
    )) {
        blend(dest.get_mut(d.x, d.y), tiles.get(s.x, s.y));
    }
}

/// Draw part of a tile on a single upright face (signs, buttons).
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_partial_single_face_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    face: i32,
    b: i32,
    fstartv: f64,
    fendv: f64,
    fstarth: f64,
    fendh: f64,
) {
    let tilesize = 2 * b;
    let cut = |f: f64| ((f * tilesize as f64) as i32).clamp(0, tilesize);
    let (vstart, vend, hstart, hend) = (cut(fstartv), cut(fendv), cut(fstarth), cut(fendh));
    let (tx, ty) = tile_origin(tile, tilesize);
    let (xoff, yoff, delta_y) = single_face_params(face, b);
    let src = RotatedFaceIterator::new(tx, ty, 0, tilesize, false);
    for (s, d) in src.zip(FaceIterator::new(
        drect.x + xoff,
        drect.y + yoff,
        delta_y,
        tilesize,
    )) {
        if d.pos % tilesize >= vstart
            && d.pos % tilesize < vend
            && d.pos / tilesize >= hstart
            && d.pos / tilesize < hend
        {
            blend(dest.get_mut(d.x, d.y), tiles.get(s.x, s.y));
        }
    }
}

/// Draw a single tile flat on the floor, possibly rotated.
/// rot: 0 = top of tile on the S side; 1 = W, 2 = N, 3 = E.
pub(crate) fn draw_floor_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    rot: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    let src = RotatedFaceIterator::new(tx, ty, rot, tilesize, false);
    for (s, d) in src.zip(TopFaceIterator::new(
        drect.x + 2 * b - 1,
        drect.y + 2 * b,
        tilesize,
    )) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
    }
}

/// Draw part of a single tile on the floor (pressure-ish shapes).
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_partial_floor_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    b: i32,
    fstartv: f64,
    fendv: f64,
    fstarth: f64,
    fendh: f64,
) {
    let tilesize = 2 * b;
    let cut = |f: f64| ((f * tilesize as f64) as i32).clamp(0, tilesize);
    let (vstart, vend, hstart, hend) = (cut(fstartv), cut(fendv), cut(fstarth), cut(fendh));
    let (tx, ty) = tile_origin(tile, tilesize);
    let src = RotatedFaceIterator::new(tx, ty, 0, tilesize, false);
    for (s, d) in src.zip(TopFaceIterator::new(
        drect.x + 2 * b - 1,
        drect.y + 2 * b,
        tilesize,
    )) {
        if d.pos % tilesize >= vstart
            && d.pos % tilesize < vend
            && d.pos / tilesize >= hstart
            && d.pos / tilesize < hend
        {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
}

/// Draw a single tile on the floor, angled upwards (ascending track).
/// rot as for [`draw_floor_block_image`]; up: which side is highest,
/// 0 = S, 1 = W, 2 = N, 3 = E.
pub(crate) fn draw_angled_floor_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    rot: i32,
    up: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    let src = RotatedFaceIterator::new(tx, ty, rot, tilesize, false);
    for (s, d) in src.zip(TopFaceIterator::new(
        drect.x + 2 * b - 1,
        drect.y + 2 * b,
        tilesize,
    )) {
        let row = d.pos % tilesize;
        let col = d.pos / tilesize;
        let yoff = match up {
            0 => tilesize - 1 - row,
            1 => col,
            2 => row,
            _ => tilesize - 1 - col,
        };
        blend(dest.get_mut(d.x, d.y - yoff), tiles.get(s.x, s.y));
        blend(dest.get_mut(d.x, d.y - yoff + 1), tiles.get(s.x, s.y));
    }
}

/// Draw a single tile on the ceiling, possibly rotated.
pub(crate) fn draw_ceil_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    rot: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    let src = RotatedFaceIterator::new(tx, ty, rot, tilesize, false);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
    }
}

/// Draw a block image that's just a single color (plus face shadows).
pub(crate) fn draw_solid_color_block_image(
    dest: &mut RGBAImage,
    drect: ImageRect,
    p: RGBAPixel,
    b: i32,
) {
    let tilesize = 2 * b;
    for d in FaceIterator::new(drect.x, drect.y + b, 1, tilesize) {
        dest.set(d.x, d.y, p);
        darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
    }
    for d in FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize) {
        dest.set(d.x, d.y, p);
        darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
    }
    for d in TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize) {
        dest.set(d.x, d.y, p);
    }
}

// For the top-face halves of stairs: if B is odd, take B pixels from each
// column; if even, alternate between B-1 and B+1.
fn stair_top_cutoff(b: i32, col: i32) -> i32 {
    if b % 2 == 0 {
        if col % 2 == 0 {
            b - 1
        } else {
            b + 1
        }
    } else {
        b
    }
}

/// Draw S-ascending stairs.
pub(crate) fn draw_stairs_s(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile_nw: i32,
    tile_u: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (nx, ny) = tile_origin(tile_nw, tilesize);
    let (ux, uy) = tile_origin(tile_u, tilesize);
    // bottom half of the normal N face at [0,B]
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
        if d.pos % tilesize >= b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
        }
    }
    // all but the upper-left quarter of the normal W face at [2B,2B]
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
        if d.pos % tilesize >= b || d.pos / tilesize >= b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
        }
    }
    // top half of the normal U face at [2B-1,0]
    let src = FaceIterator::new(ux, uy, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize)) {
        if d.pos % tilesize < stair_top_cutoff(b, d.pos / tilesize) {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
    // top half of another N face at [B,B/2]; odd B needs an extra [0,1] on
    // the even-numbered columns
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b / 2, 1, tilesize)) {
        let adjust = if b % 2 == 1 && (d.pos / tilesize) % 2 == 0 { 1 } else { 0 };
        if d.pos % tilesize < b {
            dest.set(d.x, d.y + adjust, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y + adjust), 0.9, 0.9, 0.9);
        }
    }
    // bottom half of another U face at [2B-1,B]
    let src = FaceIterator::new(ux, uy, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y + b, tilesize)) {
        if d.pos % tilesize >= stair_top_cutoff(b, d.pos / tilesize) {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
}

/// Draw S-ascending stairs inverted (hanging from the ceiling).
pub(crate) fn draw_inv_stairs_s(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile_nw: i32,
    tile_u: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (nx, ny) = tile_origin(tile_nw, tilesize);
    let (ux, uy) = tile_origin(tile_u, tilesize);
    // bottom half of a N face at [B,B/2] first; the others partially cover it
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b / 2, 1, tilesize)) {
        let adjust = if b % 2 == 1 && (d.pos / tilesize) % 2 == 0 { 1 } else { 0 };
        if d.pos % tilesize >= b {
            dest.set(d.x, d.y + adjust, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y + adjust), 0.9, 0.9, 0.9);
        }
    }
    // top half of the normal N face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
        if d.pos % tilesize < b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
        }
    }
    // all but the lower-left quarter of the normal W face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
        if d.pos % tilesize < b || d.pos / tilesize >= b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
        }
    }
    // the whole U face
    let src = FaceIterator::new(ux, uy, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
    }
}

/// Draw N-ascending stairs.
pub(crate) fn draw_stairs_n(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile_nw: i32,
    tile_u: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (nx, ny) = tile_origin(tile_nw, tilesize);
    let (ux, uy) = tile_origin(tile_u, tilesize);
    // top half of a U face at [2B-1,B]
    let src = FaceIterator::new(ux, uy, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y + b, tilesize)) {
        if d.pos % tilesize < stair_top_cutoff(b, d.pos / tilesize) {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
    // bottom half of the normal U face at [2B-1,0]
    let src = FaceIterator::new(ux, uy, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize)) {
        if d.pos % tilesize >= stair_top_cutoff(b, d.pos / tilesize) {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
    // the whole N face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
        darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
    }
    // all but the upper-right quarter of the W face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
        if d.pos % tilesize >= b || d.pos / tilesize < b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
        }
    }
}

/// Draw N-ascending stairs inverted.
pub(crate) fn draw_inv_stairs_n(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile_nw: i32,
    tile_u: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (nx, ny) = tile_origin(tile_nw, tilesize);
    let (ux, uy) = tile_origin(tile_u, tilesize);
    // the whole U face
    let src = FaceIterator::new(ux, uy, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
    }
    // the whole N face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
        darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
    }
    // all but the lower-right quarter of the W face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
        if d.pos % tilesize < b || d.pos / tilesize < b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
        }
    }
}

// For the left/right halves of stair top faces: if B is odd, the last pixel
// of the last left-half column is skipped and the very first pixel of the
// first right-half column added (and vice versa for the right half).
fn stairs_u_half(
    dest: &mut RGBAImage,
    tiles: &RGBAImage,
    ux: i32,
    uy: i32,
    dx: i32,
    dy: i32,
    b: i32,
    left: bool,
) {
    let tilesize = 2 * b;
    let mut cutoff = tilesize * b;
    let odd = b % 2 == 1;
    if left {
        if odd {
            cutoff -= 1;
        }
        let src = FaceIterator::new(ux, uy, 0, tilesize);
        for (s, d) in src.zip(TopFaceIterator::new(dx, dy, tilesize)) {
            if d.pos < cutoff || (odd && d.pos == cutoff + 1) {
                dest.set(d.x, d.y, tiles.get(s.x, s.y));
            }
        }
    } else {
        if odd {
            cutoff += 1;
        }
        let src = FaceIterator::new(ux, uy, 0, tilesize);
        for (s, d) in src.zip(TopFaceIterator::new(dx, dy, tilesize)) {
            if d.pos >= cutoff || (odd && d.pos == cutoff - 2) {
                dest.set(d.x, d.y, tiles.get(s.x, s.y));
            }
        }
    }
}

/// Draw E-ascending stairs.
pub(crate) fn draw_stairs_e(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile_nw: i32,
    tile_u: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (nx, ny) = tile_origin(tile_nw, tilesize);
    let (ux, uy) = tile_origin(tile_u, tilesize);
    // all but the upper-right quarter of the N face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
        if d.pos % tilesize >= b || d.pos / tilesize < b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
        }
    }
    // bottom half of the W face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
        if d.pos % tilesize >= b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
        }
    }
    // left half of the normal U face
    stairs_u_half(dest, tiles, ux, uy, drect.x + 2 * b - 1, drect.y, b, true);
    // top half of another W face at [B,1.5B]; odd B adds [0,1] to the
    // odd-numbered columns
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + 3 * b / 2, -1, tilesize)) {
        let adjust = if b % 2 == 1 && (d.pos / tilesize) % 2 == 1 { 1 } else { 0 };
        if d.pos % tilesize < b {
            dest.set(d.x, d.y + adjust, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y + adjust), 0.8, 0.8, 0.8);
        }
    }
    // right half of another U face at [2B-1,B]
    stairs_u_half(dest, tiles, ux, uy, drect.x + 2 * b - 1, drect.y + b, b, false);
}

/// Draw E-ascending stairs inverted.
pub(crate) fn draw_inv_stairs_e(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile_nw: i32,
    tile_u: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (nx, ny) = tile_origin(tile_nw, tilesize);
    let (ux, uy) = tile_origin(tile_u, tilesize);
    // bottom half of a W face at [B,1.5B] first; the others cover parts of it
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + 3 * b / 2, -1, tilesize)) {
        let adjust = if b % 2 == 1 && (d.pos / tilesize) % 2 == 1 { 1 } else { 0 };
        if d.pos % tilesize >= b {
            dest.set(d.x, d.y + adjust, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y + adjust), 0.8, 0.8, 0.8);
        }
    }
    // top half of the normal W face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
        if d.pos % tilesize < b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
        }
    }
    // all but the lower-right quarter of the N face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
        if d.pos % tilesize < b || d.pos / tilesize < b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
        }
    }
    // the whole U face
    let src = FaceIterator::new(ux, uy, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
    }
}

/// Draw W-ascending stairs.
pub(crate) fn draw_stairs_w(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile_nw: i32,
    tile_u: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (nx, ny) = tile_origin(tile_nw, tilesize);
    let (ux, uy) = tile_origin(tile_u, tilesize);
    // left half of a U face at [2B-1,B]
    stairs_u_half(dest, tiles, ux, uy, drect.x + 2 * b - 1, drect.y + b, b, true);
    // right half of the normal U face at [2B-1,0]
    stairs_u_half(dest, tiles, ux, uy, drect.x + 2 * b - 1, drect.y, b, false);
    // all but the upper-left quarter of the N face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
        if d.pos % tilesize >= b || d.pos / tilesize >= b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
        }
    }
    // the whole W face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
        darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
    }
}

/// Draw W-ascending stairs inverted.
pub(crate) fn draw_inv_stairs_w(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile_nw: i32,
    tile_u: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (nx, ny) = tile_origin(tile_nw, tilesize);
    let (ux, uy) = tile_origin(tile_u, tilesize);
    // the whole U face
    let src = FaceIterator::new(ux, uy, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(drect.x + 2 * b - 1, drect.y, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
    }
    // the whole W face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 2 * b, -1, tilesize)) {
        dest.set(d.x, d.y, tiles.get(s.x, s.y));
        darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
    }
    // all but the lower-left quarter of the N face
    let src = FaceIterator::new(nx, ny, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b, 1, tilesize)) {
        if d.pos % tilesize < b || d.pos / tilesize >= b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
        }
    }
}

/// Draw a fence post.
pub(crate) fn draw_fence_post(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    // a 2x2 top at [2B-1,B-1]
    for y in 0..2 {
        for x in 0..2 {
            dest.set(
                drect.x + 2 * b - 1 + x,
                drect.y + b - 1 + y,
                tiles.get(tx + x, ty + y),
            );
        }
    }
    // two 1x2B sides at [2B-1,B+1] and [2B,B+1]
    for y in 0..tilesize {
        dest.set(drect.x + 2 * b - 1, drect.y + b + 1 + y, tiles.get(tx, ty + y));
        dest.set(drect.x + 2 * b, drect.y + b + 1 + y, tiles.get(tx, ty + y));
    }
}

/// Draw a fence: a post and four rails, each optional.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_fence(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    n: bool,
    s: bool,
    e: bool,
    w: bool,
    post: bool,
    b: i32,
) {
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    let rail = |pos_mod: i32| ((pos_mod * 2 / b) % 4) == 1;
    // E and S rails first; the post goes in front of them
    if e {
        // N/S face starting at [B,0.5B]; left half, one strip
        let src = FaceIterator::new(tx, ty, 0, tilesize);
        for (sp, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b / 2, 1, tilesize)) {
            if d.pos / tilesize < b && rail(d.pos % tilesize) {
                dest.set(d.x, d.y, tiles.get(sp.x, sp.y));
            }
        }
    }
    if s {
        // E/W face starting at [B,1.5B]; right half, one strip
        let src = FaceIterator::new(tx, ty, 0, tilesize);
        for (sp, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b * 3 / 2, -1, tilesize)) {
            if d.pos / tilesize >= b && rail(d.pos % tilesize) {
                dest.set(d.x, d.y, tiles.get(sp.x, sp.y));
            }
        }
    }
    if post {
        draw_fence_post(dest, drect, tiles, tile, b);
    }
    if w {
        // N/S face starting at [B,0.5B]; right half, one strip
        let src = FaceIterator::new(tx, ty, 0, tilesize);
        for (sp, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b / 2, 1, tilesize)) {
            if d.pos / tilesize >= b && rail(d.pos % tilesize) {
                dest.set(d.x, d.y, tiles.get(sp.x, sp.y));
            }
        }
    }
    if n {
        // E/W face starting at [B,1.5B]; left half, one strip
        let src = FaceIterator::new(tx, ty, 0, tilesize);
        for (sp, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b * 3 / 2, -1, tilesize)) {
            if d.pos / tilesize < b && rail(d.pos % tilesize) {
                dest.set(d.x, d.y, tiles.get(sp.x, sp.y));
            }
        }
    }
}

/// Draw a sign facing out towards the viewer.
pub(crate) fn draw_sign(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    b: i32,
) {
    draw_fence_post(dest, drect, tiles, tile, b);
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    // the top half of a tile at [B,B]
    let src = FaceIterator::new(tx, ty, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + b, drect.y + b, 0, tilesize)) {
        if d.pos % tilesize < b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
}

pub(crate) fn draw_wall_lever(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    face: i32,
    b: i32,
) {
    draw_partial_single_face_block_image(dest, drect, tiles, 16, face, b, 0.5, 1.0, 0.35, 0.65);
    draw_single_face_block_image(dest, drect, tiles, 96, face, b);
}

pub(crate) fn draw_floor_lever_ns(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    b: i32,
) {
    draw_partial_floor_block_image(dest, drect, tiles, 16, b, 0.25, 0.75, 0.35, 0.65);
    draw_item_block_image(dest, drect, tiles, 96, b);
}

pub(crate) fn draw_floor_lever_ew(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    b: i32,
) {
    draw_partial_floor_block_image(dest, drect, tiles, 16, b, 0.35, 0.65, 0.25, 0.75);
    draw_item_block_image(dest, drect, tiles, 96, b);
}

pub(crate) fn draw_repeater(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    rot: i32,
    b: i32,
) {
    draw_floor_block_image(dest, drect, tiles, tile, rot, b);
    draw_item_block_image(dest, drect, tiles, 99, b);
}

pub(crate) fn draw_fire(dest: &mut RGBAImage, drect: ImageRect, firetile: &RGBAImage, b: i32) {
    for face in [0, 3, 1, 2] {
        draw_single_face_block_image(dest, drect, firetile, 0, face, b);
    }
}

/// Draw a brewing stand: full base tile plus an item-shaped stand.
pub(crate) fn draw_brewing_stand(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    base: i32,
    stand: i32,
    b: i32,
) {
    draw_floor_block_image(dest, drect, tiles, base, 0, b);
    draw_item_block_image(dest, drect, tiles, stand, b);
}

pub(crate) fn draw_cauldron(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    side: i32,
    liquid: i32,
    cutoff: i32,
    b: i32,
) {
    // E/S sides first, since the liquid goes in front of them
    draw_single_face_block_image(dest, drect, tiles, side, 0, b);
    draw_single_face_block_image(dest, drect, tiles, side, 3, b);
    if liquid >= 0 {
        draw_partial_block_image(dest, drect, tiles, -1, -1, liquid, b, cutoff, 0, 0, 0, true);
    }
    // now the N/W sides
    draw_single_face_block_image(dest, drect, tiles, side, 1, b);
    draw_single_face_block_image(dest, drect, tiles, side, 2, b);
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_vines(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    b: i32,
    n: bool,
    s: bool,
    e: bool,
    w: bool,
    top: bool,
) {
    if s {
        draw_single_face_block_image(dest, drect, tiles, tile, 0, b);
    }
    if e {
        draw_single_face_block_image(dest, drect, tiles, tile, 3, b);
    }
    if n {
        draw_single_face_block_image(dest, drect, tiles, tile, 1, b);
    }
    if w {
        draw_single_face_block_image(dest, drect, tiles, tile, 2, b);
    }
    if top {
        draw_ceil_block_image(dest, drect, tiles, tile, 0, b);
    }
}

/// Draw a dragon egg--just a half-size block.
pub(crate) fn draw_dragon_egg(
    dest: &mut RGBAImage,
    drect: ImageRect,
    tiles: &RGBAImage,
    tile: i32,
    b: i32,
) {
    let tilesize = 2 * b;
    let (tx, ty) = tile_origin(tile, tilesize);
    // N face at [0,0.5B]; bottom-right quarter
    let src = FaceIterator::new(tx, ty, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x, drect.y + b / 2, 1, tilesize)) {
        if d.pos % tilesize >= b && d.pos / tilesize >= b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.9, 0.9, 0.9);
        }
    }
    // W face at [2B,1.5B]; bottom-left quarter
    let src = FaceIterator::new(tx, ty, 0, tilesize);
    for (s, d) in src.zip(FaceIterator::new(drect.x + 2 * b, drect.y + 3 * b / 2, -1, tilesize)) {
        if d.pos % tilesize >= b && d.pos / tilesize < b {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
            darken(dest.get_mut(d.x, d.y), 0.8, 0.8, 0.8);
        }
    }
    // bottom-right quarter of a U face at [2B-1,0.5B]
    let src = FaceIterator::new(tx, ty, 0, tilesize);
    for (s, d) in src.zip(TopFaceIterator::new(
        drect.x + 2 * b - 1,
        drect.y + b / 2,
        tilesize,
    )) {
        let cutoff = stair_top_cutoff(b, d.pos / tilesize);
        if d.pos % tilesize >= cutoff && d.pos / tilesize >= cutoff {
            dest.set(d.x, d.y, tiles.get(s.x, s.y));
        }
    }
}
