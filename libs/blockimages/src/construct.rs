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

//! Builds the atlas from the source textures. In this file, confusingly,
//! "tile" refers to the tiles of terrain.png, not to map tiles.

use crate::draw::*;
use crate::{atlas_rect, NUM_BLOCK_IMAGES};
use anyhow::{ensure, Context, Result};
use mapgeom::deinterpolate;
use rgba::{blit, darken_rect, flip_x, make_rgba, resize, ImageRect, RGBAImage};
use std::path::Path;

// given terrain.png, resize it so every texture becomes 2Bx2B; the result
// is a 16x16 array of 2Bx2B tiles
fn get_resized_terrain(terrain: &RGBAImage, terrain_size: i32, b: i32) -> RGBAImage {
    let newsize = 2 * b;
    let mut img = RGBAImage::new(16 * newsize, 16 * newsize);
    for y in 0..16 {
        for x in 0..16 {
            resize(
                terrain,
                ImageRect::new(x * terrain_size, y * terrain_size, terrain_size, terrain_size),
                &mut img,
                ImageRect::new(x * newsize, y * newsize, newsize, newsize),
            );
        }
    }
    img
}

// take the textures from chest.png and build flat 14x14-ish tiles, then
// resize them to 2Bx2B; the result is a 3x1 array: top, front, side
fn get_resized_chest(chest: &RGBAImage, scale: i32, b: i32) -> RGBAImage {
    let chest_size = 14 * scale;
    let mut chesttiles = RGBAImage::new(chest_size * 3, chest_size);

    // top texture copies straight over
    blit(
        chest,
        ImageRect::new(14 * scale, 0, 14 * scale, 14 * scale),
        &mut chesttiles,
        0,
        0,
    );

    // front tile: front lid plus front bottom, then the latch on top
    blit(
        chest,
        ImageRect::new(14 * scale, 14 * scale, 14 * scale, 4 * scale),
        &mut chesttiles,
        chest_size,
        0,
    );
    blit(
        chest,
        ImageRect::new(14 * scale, 33 * scale, 14 * scale, 10 * scale),
        &mut chesttiles,
        chest_size,
        4 * scale,
    );
    blit(
        chest,
        ImageRect::new(scale, scale, 2 * scale, 4 * scale),
        &mut chesttiles,
        chest_size + 6 * scale,
        2 * scale,
    );

    // side tile: side lid plus side bottom
    blit(
        chest,
        ImageRect::new(28 * scale, 14 * scale, 14 * scale, 4 * scale),
        &mut chesttiles,
        chest_size * 2,
        0,
    );
    blit(
        chest,
        ImageRect::new(28 * scale, 33 * scale, 14 * scale, 10 * scale),
        &mut chesttiles,
        chest_size * 2,
        4 * scale,
    );

    let newsize = 2 * b;
    let mut img = RGBAImage::new(3 * newsize, newsize);
    for x in 0..3 {
        resize(
            &chesttiles,
            ImageRect::new(x * chest_size, 0, chest_size, chest_size),
            &mut img,
            ImageRect::new(x * newsize, 0, newsize, newsize),
        );
    }
    img
}

// same thing for largechest.png; the result is a 7x1 array:
// top-left, top-right, front-left, front-right, back-left, back-right, side
fn get_resized_large_chest(chest: &RGBAImage, scale: i32, b: i32) -> RGBAImage {
    let newsize = 2 * b;
    let mut img = RGBAImage::new(7 * newsize, newsize);

    // top texture copies straight over; the original is 30x14 going into
    // two squares
    resize(
        chest,
        ImageRect::new(14 * scale, 0, 30 * scale, 14 * scale),
        &mut img,
        ImageRect::new(0, 0, newsize * 2, newsize),
    );

    // front tile: front lid plus front bottom, then the latch
    let mut fronttiles = RGBAImage::new(30 * scale, 14 * scale);
    blit(
        chest,
        ImageRect::new(14 * scale, 14 * scale, 30 * scale, 4 * scale),
        &mut fronttiles,
        0,
        0,
    );
    blit(
        chest,
        ImageRect::new(14 * scale, 33 * scale, 30 * scale, 10 * scale),
        &mut fronttiles,
        0,
        4 * scale,
    );
    blit(
        chest,
        ImageRect::new(scale, scale, 2 * scale, 4 * scale),
        &mut fronttiles,
        14 * scale,
        2 * scale,
    );
    // two resizes, so the halves' edge processing picks up the latch
    resize(
        &fronttiles,
        ImageRect::new(0, 0, 15 * scale, 14 * scale),
        &mut img,
        ImageRect::new(2 * newsize, 0, newsize, newsize),
    );
    resize(
        &fronttiles,
        ImageRect::new(15 * scale, 0, 15 * scale, 14 * scale),
        &mut img,
        ImageRect::new(3 * newsize, 0, newsize, newsize),
    );

    // back tile: back lid plus back bottom
    let mut backtiles = RGBAImage::new(30 * scale, 14 * scale);
    blit(
        chest,
        ImageRect::new(58 * scale, 14 * scale, 30 * scale, 4 * scale),
        &mut backtiles,
        0,
        0,
    );
    blit(
        chest,
        ImageRect::new(58 * scale, 33 * scale, 30 * scale, 10 * scale),
        &mut backtiles,
        0,
        4 * scale,
    );
    resize(
        &backtiles,
        ImageRect::new(0, 0, 30 * scale, 14 * scale),
        &mut img,
        ImageRect::new(4 * newsize, 0, 2 * newsize, newsize),
    );

    // side tile: side lid plus side bottom
    let mut sidetile = RGBAImage::new(14 * scale, 14 * scale);
    blit(
        chest,
        ImageRect::new(44 * scale, 14 * scale, 14 * scale, 4 * scale),
        &mut sidetile,
        0,
        0,
    );
    blit(
        chest,
        ImageRect::new(44 * scale, 33 * scale, 14 * scale, 10 * scale),
        &mut sidetile,
        0,
        4 * scale,
    );
    resize(
        &sidetile,
        ImageRect::new(0, 0, 14 * scale, 14 * scale),
        &mut img,
        ImageRect::new(6 * newsize, 0, newsize, newsize),
    );

    img
}

fn load_png(path: &Path) -> Result<RGBAImage> {
    let mut img = RGBAImage::default();
    img.read_png(path)
        .with_context(|| format!("can't read {}", path.display()))?;
    Ok(img)
}

/// Build the atlas image from the source textures in `imgpath`.
pub(crate) fn construct(b: i32, imgpath: &Path) -> Result<RGBAImage> {
    ensure!(b >= 2, "block size must be at least 2");
    let rectsize = 4 * b;

    // read the terrain file, check it, and get a resized copy for use
    let terrain = load_png(&imgpath.join("terrain.png"))?;
    ensure!(
        terrain.w % 16 == 0 && terrain.h == terrain.w,
        "terrain.png must be square with a multiple-of-16 size"
    );
    let terrain_size = terrain.w / 16;
    let mut tiles = get_resized_terrain(&terrain, terrain_size, b);

    // fire.png, resized to a single tile
    let fire = load_png(&imgpath.join("fire.png"))?;
    ensure!(fire.w == fire.h, "fire.png must be square");
    let mut firetile = RGBAImage::new(2 * b, 2 * b);
    resize(
        &fire,
        ImageRect::new(0, 0, fire.w, fire.h),
        &mut firetile,
        ImageRect::new(0, 0, 2 * b, 2 * b),
    );

    // endportal.png, resized to a single tile
    let endportal = load_png(&imgpath.join("endportal.png"))?;
    ensure!(endportal.w == endportal.h, "endportal.png must be square");
    let mut endportaltile = RGBAImage::new(2 * b, 2 * b);
    resize(
        &endportal,
        ImageRect::new(0, 0, endportal.w, endportal.h),
        &mut endportaltile,
        ImageRect::new(0, 0, 2 * b, 2 * b),
    );

    // chest.png and enderchest.png, built into flat tiles
    let chest = load_png(&imgpath.join("chest.png"))?;
    ensure!(
        chest.w % 64 == 0 && chest.h == chest.w,
        "chest.png must be square with a multiple-of-64 size"
    );
    let chesttiles = get_resized_chest(&chest, chest.w / 64, b);

    let enderchest = load_png(&imgpath.join("enderchest.png"))?;
    ensure!(
        enderchest.w % 64 == 0 && enderchest.h == enderchest.w,
        "enderchest.png must be square with a multiple-of-64 size"
    );
    let enderchesttiles = get_resized_chest(&enderchest, enderchest.w / 64, b);

    // largechest.png is 2:1
    let largechest = load_png(&imgpath.join("largechest.png"))?;
    ensure!(
        largechest.w % 128 == 0 && largechest.h == largechest.w / 2,
        "largechest.png must be 2:1 with a multiple-of-128 width"
    );
    let largechesttiles = get_resized_large_chest(&largechest, largechest.w / 128, b);

    // colorize various tiles
    darken_rect(&mut tiles, ImageRect::new(0, 0, 2 * b, 2 * b), 0.6, 0.95, 0.3); // grass top
    darken_rect(&mut tiles, ImageRect::new(14 * b, 4 * b, 2 * b, 2 * b), 0.6, 0.95, 0.3); // tall grass
    darken_rect(&mut tiles, ImageRect::new(16 * b, 6 * b, 2 * b, 2 * b), 0.6, 0.95, 0.3); // fern
    darken_rect(&mut tiles, ImageRect::new(8 * b, 20 * b, 2 * b, 2 * b), 0.9, 0.1, 0.1); // redstone dust
    darken_rect(&mut tiles, ImageRect::new(24 * b, 8 * b, 2 * b, 2 * b), 0.3, 0.95, 0.3); // lily pad
    darken_rect(&mut tiles, ImageRect::new(30 * b, 16 * b, 2 * b, 2 * b), 0.35, 1.0, 0.15); // vines

    // colorized copies of the leaf tiles (can't colorize in place because
    // normal and birch leaves share a texture)
    let mut leaftiles = RGBAImage::new(8 * b, 2 * b);
    blit(&tiles, ImageRect::new(8 * b, 6 * b, 2 * b, 2 * b), &mut leaftiles, 0, 0);
    darken_rect(&mut leaftiles, ImageRect::new(0, 0, 2 * b, 2 * b), 0.3, 1.0, 0.1);
    blit(&tiles, ImageRect::new(8 * b, 16 * b, 2 * b, 2 * b), &mut leaftiles, 2 * b, 0);
    darken_rect(&mut leaftiles, ImageRect::new(2 * b, 0, 2 * b, 2 * b), 0.3, 1.0, 0.45);
    blit(&tiles, ImageRect::new(8 * b, 6 * b, 2 * b, 2 * b), &mut leaftiles, 4 * b, 0);
    darken_rect(&mut leaftiles, ImageRect::new(4 * b, 0, 2 * b, 2 * b), 0.55, 0.9, 0.1);
    blit(&tiles, ImageRect::new(8 * b, 24 * b, 2 * b, 2 * b), &mut leaftiles, 6 * b, 0);
    darken_rect(&mut leaftiles, ImageRect::new(6 * b, 0, 2 * b, 2 * b), 0.35, 1.0, 0.05);

    // colorized/shortened copies of the stem tiles: growth levels 0-7, then
    // the melon/pumpkin connector and its flipped version
    let mut stemtiles = RGBAImage::new(20 * b, 2 * b);
    for i in 1..=8 {
        blit(
            &tiles,
            ImageRect::new(30 * b, 12 * b, 2 * b, i * b / 4),
            &mut stemtiles,
            (i - 1) * 2 * b,
            2 * b - i * b / 4,
        );
    }
    blit(&tiles, ImageRect::new(30 * b, 14 * b, 2 * b, 2 * b), &mut stemtiles, 16 * b, 0);
    blit(&tiles, ImageRect::new(30 * b, 14 * b, 2 * b, 2 * b), &mut stemtiles, 18 * b, 0);
    flip_x(&mut stemtiles, ImageRect::new(18 * b, 0, 2 * b, 2 * b));
    darken_rect(&mut stemtiles, ImageRect::new(0, 0, 14 * b, 2 * b), 0.45, 0.95, 0.4);
    darken_rect(&mut stemtiles, ImageRect::new(14 * b, 0, 6 * b, 2 * b), 0.75, 0.6, 0.3);

    // one pixel of the default 16x16 texture size, used to drop transparent
    // borders from the cactus and cake tiles
    let small = (terrain_size + 15) / 16;
    resize(
        &terrain,
        ImageRect::new(
            5 * terrain_size + small,
            4 * terrain_size + small,
            terrain_size - 2 * small,
            terrain_size - 2 * small,
        ),
        &mut tiles,
        ImageRect::new(5 * 2 * b, 4 * 2 * b, 2 * b, 2 * b),
    );
    resize(
        &terrain,
        ImageRect::new(
            6 * terrain_size + small,
            4 * terrain_size,
            terrain_size - 2 * small,
            terrain_size,
        ),
        &mut tiles,
        ImageRect::new(6 * 2 * b, 4 * 2 * b, 2 * b, 2 * b),
    );
    resize(
        &terrain,
        ImageRect::new(
            9 * terrain_size + small,
            7 * terrain_size + small,
            terrain_size - 2 * small,
            terrain_size - 2 * small,
        ),
        &mut tiles,
        ImageRect::new(9 * 2 * b, 7 * 2 * b, 2 * b, 2 * b),
    );
    resize(
        &terrain,
        ImageRect::new(
            10 * terrain_size + small,
            7 * terrain_size,
            terrain_size - 2 * small,
            terrain_size,
        ),
        &mut tiles,
        ImageRect::new(10 * 2 * b, 7 * 2 * b, 2 * b, 2 * b),
    );

    // cutoff values for partial block images: which pixel of a resized tile
    // is the first one past a given offset in the source texture
    let cutoff = |j: i32| {
        deinterpolate(
            (j * terrain_size / 16) as i64,
            terrain_size as i64,
            (2 * b) as i64,
        ) as i32
    };
    let cutoff_2_16 = cutoff(2);
    let cutoff_3_16 = cutoff(3);
    let cutoff_4_16 = cutoff(4);
    let cutoff_6_16 = cutoff(6);
    let cutoff_8_16 = cutoff(8);
    let cutoff_10_16 = cutoff(10);
    let cutoff_12_16 = cutoff(12);
    let cutoff_14_16 = cutoff(14);

    let mut img = RGBAImage::new(
        rectsize * 16,
        (NUM_BLOCK_IMAGES as i32 / 16 + 1) * rectsize,
    );
    let rect = |offset: usize| atlas_rect(offset, rectsize);

    // build all block images

    draw_block_image(&mut img, rect(1), &tiles, 1, 1, 1, b); // stone
    draw_block_image(&mut img, rect(2), &tiles, 3, 3, 0, b); // grass
    draw_block_image(&mut img, rect(3), &tiles, 2, 2, 2, b); // dirt
    draw_block_image(&mut img, rect(4), &tiles, 16, 16, 16, b); // cobblestone
    draw_block_image(&mut img, rect(5), &tiles, 4, 4, 4, b); // planks
    draw_block_image(&mut img, rect(435), &tiles, 198, 198, 198, b); // pine planks
    draw_block_image(&mut img, rect(436), &tiles, 214, 214, 214, b); // birch planks
    draw_block_image(&mut img, rect(437), &tiles, 199, 199, 199, b); // jungle planks
    draw_block_image(&mut img, rect(7), &tiles, 17, 17, 17, b); // bedrock
    draw_block_image(&mut img, rect(8), &tiles, 205, 205, 205, b); // full water
    draw_block_image(&mut img, rect(157), &tiles, -1, -1, 205, b); // water surface
    draw_block_image(&mut img, rect(178), &tiles, 205, -1, 205, b); // water missing W
    draw_block_image(&mut img, rect(179), &tiles, -1, 205, 205, b); // water missing N
    draw_block_image(&mut img, rect(16), &tiles, 237, 237, 237, b); // full lava
    draw_block_image(&mut img, rect(20), &tiles, 18, 18, 18, b); // sand
    draw_block_image(&mut img, rect(483), &tiles, 19, 19, 19, b); // gravel
    draw_block_image(&mut img, rect(22), &tiles, 32, 32, 32, b); // gold ore
    draw_block_image(&mut img, rect(23), &tiles, 33, 33, 33, b); // iron ore
    draw_block_image(&mut img, rect(24), &tiles, 34, 34, 34, b); // coal ore
    draw_block_image(&mut img, rect(25), &tiles, 20, 20, 21, b); // log
    draw_block_image(&mut img, rect(219), &tiles, 116, 116, 21, b); // pine log
    draw_block_image(&mut img, rect(220), &tiles, 117, 117, 21, b); // birch log
    draw_block_image(&mut img, rect(427), &tiles, 153, 153, 21, b); // jungle log
    draw_block_image(&mut img, rect(26), &leaftiles, 0, 0, 0, b); // leaves
    draw_block_image(&mut img, rect(248), &leaftiles, 1, 1, 1, b); // pine leaves
    draw_block_image(&mut img, rect(249), &leaftiles, 2, 2, 2, b); // birch leaves
    draw_block_image(&mut img, rect(428), &leaftiles, 3, 3, 3, b); // jungle leaves
    draw_block_image(&mut img, rect(27), &tiles, 48, 48, 48, b); // sponge
    draw_block_image(&mut img, rect(28), &tiles, 49, 49, 49, b); // glass
    draw_block_image(&mut img, rect(29), &tiles, 64, 64, 64, b); // white wool
    draw_block_image(&mut img, rect(204), &tiles, 210, 210, 210, b); // orange wool
    draw_block_image(&mut img, rect(205), &tiles, 194, 194, 194, b); // magenta wool
    draw_block_image(&mut img, rect(206), &tiles, 178, 178, 178, b); // light blue wool
    draw_block_image(&mut img, rect(207), &tiles, 162, 162, 162, b); // yellow wool
    draw_block_image(&mut img, rect(208), &tiles, 146, 146, 146, b); // lime wool
    draw_block_image(&mut img, rect(209), &tiles, 130, 130, 130, b); // pink wool
    draw_block_image(&mut img, rect(210), &tiles, 114, 114, 114, b); // gray wool
    draw_block_image(&mut img, rect(211), &tiles, 225, 225, 225, b); // light gray wool
    draw_block_image(&mut img, rect(212), &tiles, 209, 209, 209, b); // cyan wool
    draw_block_image(&mut img, rect(213), &tiles, 193, 193, 193, b); // purple wool
    draw_block_image(&mut img, rect(214), &tiles, 177, 177, 177, b); // blue wool
    draw_block_image(&mut img, rect(215), &tiles, 161, 161, 161, b); // brown wool
    draw_block_image(&mut img, rect(216), &tiles, 145, 145, 145, b); // green wool
    draw_block_image(&mut img, rect(217), &tiles, 129, 129, 129, b); // red wool
    draw_block_image(&mut img, rect(218), &tiles, 113, 113, 113, b); // black wool
    draw_block_image(&mut img, rect(34), &tiles, 23, 23, 23, b); // gold block
    draw_block_image(&mut img, rect(35), &tiles, 22, 22, 22, b); // iron block
    draw_block_image(&mut img, rect(36), &tiles, 5, 5, 6, b); // double stone slab
    draw_block_image(&mut img, rect(38), &tiles, 7, 7, 7, b); // brick
    draw_block_image(&mut img, rect(39), &tiles, 8, 8, 9, b); // TNT
    draw_block_image(&mut img, rect(40), &tiles, 35, 35, 4, b); // bookshelf
    draw_block_image(&mut img, rect(41), &tiles, 36, 36, 36, b); // mossy cobblestone
    draw_block_image(&mut img, rect(42), &tiles, 37, 37, 37, b); // obsidian
    draw_block_image(&mut img, rect(49), &tiles, 65, 65, 65, b); // spawner
    draw_block_image(&mut img, rect(484), &chesttiles, 2, 1, 0, b); // chest facing W
    draw_block_image(&mut img, rect(485), &chesttiles, 1, 2, 0, b); // chest facing N
    draw_block_image(&mut img, rect(486), &chesttiles, 2, 2, 0, b); // chest facing E/S
    draw_block_image(&mut img, rect(479), &enderchesttiles, 2, 1, 0, b); // ender chest facing W
    draw_block_image(&mut img, rect(480), &enderchesttiles, 1, 2, 0, b); // ender chest facing N
    draw_block_image(&mut img, rect(481), &enderchesttiles, 2, 2, 0, b); // ender chest facing E/S
    draw_block_image(&mut img, rect(489), &largechesttiles, 2, 6, 0, b); // double chest E facing N
    draw_block_image(&mut img, rect(490), &largechesttiles, 3, 6, 1, b); // double chest W facing N
    draw_block_image(&mut img, rect(493), &largechesttiles, 4, 6, 0, b); // double chest E facing S
    draw_block_image(&mut img, rect(494), &largechesttiles, 5, 6, 1, b); // double chest W facing S
    draw_block_image(&mut img, rect(270), &chesttiles, 2, 1, 0, b); // locked chest facing W
    draw_block_image(&mut img, rect(271), &chesttiles, 1, 2, 0, b); // locked chest facing N
    draw_block_image(&mut img, rect(56), &tiles, 50, 50, 50, b); // diamond ore
    draw_block_image(&mut img, rect(57), &tiles, 24, 24, 24, b); // diamond block
    draw_block_image(&mut img, rect(58), &tiles, 59, 60, 43, b); // workbench
    draw_block_image(&mut img, rect(67), &tiles, 2, 2, 87, b); // farmland
    draw_block_image(&mut img, rect(183), &tiles, 45, 44, 62, b); // furnace W
    draw_block_image(&mut img, rect(184), &tiles, 44, 45, 62, b); // furnace N
    draw_block_image(&mut img, rect(185), &tiles, 45, 45, 62, b); // furnace E/S
    draw_block_image(&mut img, rect(186), &tiles, 45, 61, 62, b); // lit furnace W
    draw_block_image(&mut img, rect(187), &tiles, 61, 45, 62, b); // lit furnace N
    draw_block_image(&mut img, rect(188), &tiles, 45, 45, 62, b); // lit furnace E/S
    draw_block_image(&mut img, rect(120), &tiles, 51, 51, 51, b); // redstone ore
    draw_block_image(&mut img, rect(128), &tiles, 67, 67, 67, b); // ice
    draw_block_image(&mut img, rect(180), &tiles, -1, -1, 67, b); // ice surface
    draw_block_image(&mut img, rect(181), &tiles, 67, -1, 67, b); // ice missing W
    draw_block_image(&mut img, rect(182), &tiles, -1, 67, 67, b); // ice missing N
    draw_block_image(&mut img, rect(129), &tiles, 66, 66, 66, b); // snow block
    draw_block_image(&mut img, rect(130), &tiles, 70, 70, 69, b); // cactus
    draw_block_image(&mut img, rect(131), &tiles, 72, 72, 72, b); // clay
    draw_block_image(&mut img, rect(133), &tiles, 74, 74, 75, b); // jukebox
    draw_block_image(&mut img, rect(135), &tiles, 118, 119, 102, b); // pumpkin facing W
    draw_block_image(&mut img, rect(153), &tiles, 118, 118, 102, b); // pumpkin facing E/S
    draw_block_image(&mut img, rect(154), &tiles, 119, 118, 102, b); // pumpkin facing N
    draw_block_image(&mut img, rect(136), &tiles, 103, 103, 103, b); // netherrack
    draw_block_image(&mut img, rect(137), &tiles, 104, 104, 104, b); // soul sand
    draw_block_image(&mut img, rect(138), &tiles, 105, 105, 105, b); // glowstone
    draw_block_image(&mut img, rect(140), &tiles, 118, 120, 102, b); // jack-o-lantern W
    draw_block_image(&mut img, rect(155), &tiles, 118, 118, 102, b); // jack-o-lantern E/S
    draw_block_image(&mut img, rect(156), &tiles, 120, 118, 102, b); // jack-o-lantern N
    draw_block_image(&mut img, rect(221), &tiles, 160, 160, 160, b); // lapis ore
    draw_block_image(&mut img, rect(222), &tiles, 144, 144, 144, b); // lapis block
    draw_block_image(&mut img, rect(223), &tiles, 45, 46, 62, b); // dispenser W
    draw_block_image(&mut img, rect(224), &tiles, 46, 45, 62, b); // dispenser N
    draw_block_image(&mut img, rect(225), &tiles, 45, 45, 62, b); // dispenser E/S
    draw_block_image(&mut img, rect(226), &tiles, 192, 192, 176, b); // sandstone
    draw_block_image(&mut img, rect(431), &tiles, 229, 229, 176, b); // hieroglyphic sandstone
    draw_block_image(&mut img, rect(432), &tiles, 230, 230, 176, b); // smooth sandstone
    draw_block_image(&mut img, rect(227), &tiles, 74, 74, 74, b); // note block
    draw_block_image(&mut img, rect(290), &tiles, 136, 136, 137, b); // melon
    draw_block_image(&mut img, rect(291), &tiles, 77, 77, 78, b); // mycelium
    draw_block_image(&mut img, rect(292), &tiles, 224, 224, 224, b); // nether brick
    draw_block_image(&mut img, rect(293), &tiles, 175, 175, 175, b); // end stone
    draw_block_image(&mut img, rect(294), &tiles, 54, 54, 54, b); // stone brick
    draw_block_image(&mut img, rect(295), &tiles, 100, 100, 100, b); // mossy stone brick
    draw_block_image(&mut img, rect(296), &tiles, 101, 101, 101, b); // cracked stone brick
    draw_block_image(&mut img, rect(430), &tiles, 213, 213, 213, b); // circle stone brick
    draw_block_image(&mut img, rect(336), &tiles, 142, 142, 142, b); // mushroom flesh
    draw_block_image(&mut img, rect(337), &tiles, 142, 142, 125, b); // red cap top only
    draw_block_image(&mut img, rect(338), &tiles, 125, 142, 125, b); // red cap N
    draw_block_image(&mut img, rect(339), &tiles, 142, 125, 125, b); // red cap W
    draw_block_image(&mut img, rect(340), &tiles, 125, 125, 125, b); // red cap NW
    draw_block_image(&mut img, rect(341), &tiles, 142, 142, 126, b); // brown cap top only
    draw_block_image(&mut img, rect(342), &tiles, 126, 142, 126, b); // brown cap N
    draw_block_image(&mut img, rect(343), &tiles, 142, 126, 126, b); // brown cap W
    draw_block_image(&mut img, rect(344), &tiles, 126, 126, 126, b); // brown cap NW
    draw_block_image(&mut img, rect(345), &tiles, 141, 141, 142, b); // mushroom stem
    draw_block_image(&mut img, rect(433), &tiles, 212, 212, 212, b); // redstone lamp on
    draw_block_image(&mut img, rect(434), &tiles, 211, 211, 211, b); // redstone lamp off
    draw_block_image(&mut img, rect(478), &tiles, 171, 171, 171, b); // emerald ore
    draw_block_image(&mut img, rect(482), &tiles, 25, 25, 25, b); // emerald block
    draw_rotated_block_image(&mut img, rect(407), &tiles, 108, 108, 109, 2, false, 2, false, 0, false, b); // closed piston D
    draw_rotated_block_image(&mut img, rect(408), &tiles, 108, 108, 107, 0, false, 0, false, 0, false, b); // closed piston U
    draw_rotated_block_image(&mut img, rect(409), &tiles, 107, 108, 108, 0, false, 1, false, 2, false, b); // closed piston N
    draw_rotated_block_image(&mut img, rect(410), &tiles, 109, 108, 108, 0, false, 3, false, 0, false, b); // closed piston S
    draw_rotated_block_image(&mut img, rect(411), &tiles, 108, 107, 108, 3, false, 0, false, 3, false, b); // closed piston W
    draw_rotated_block_image(&mut img, rect(412), &tiles, 108, 109, 108, 1, false, 0, false, 1, false, b); // closed piston E
    draw_rotated_block_image(&mut img, rect(413), &tiles, 108, 108, 109, 2, false, 2, false, 0, false, b); // closed sticky piston D
    draw_rotated_block_image(&mut img, rect(414), &tiles, 108, 108, 106, 0, false, 0, false, 0, false, b); // closed sticky piston U
    draw_rotated_block_image(&mut img, rect(415), &tiles, 106, 108, 108, 0, false, 1, false, 2, false, b); // closed sticky piston N
    draw_rotated_block_image(&mut img, rect(416), &tiles, 109, 108, 108, 0, false, 3, false, 0, false, b); // closed sticky piston S
    draw_rotated_block_image(&mut img, rect(417), &tiles, 108, 106, 108, 3, false, 0, false, 3, false, b); // closed sticky piston W
    draw_rotated_block_image(&mut img, rect(418), &tiles, 108, 109, 108, 1, false, 0, false, 1, false, b); // closed sticky piston E
    draw_rotated_block_image(&mut img, rect(487), &largechesttiles, 6, 2, 0, 0, false, 0, false, 1, false, b); // double chest N facing W
    draw_rotated_block_image(&mut img, rect(488), &largechesttiles, 6, 3, 1, 0, false, 0, false, 1, false, b); // double chest S facing W
    draw_rotated_block_image(&mut img, rect(491), &largechesttiles, 6, 4, 0, 0, false, 0, false, 1, false, b); // double chest N facing E
    draw_rotated_block_image(&mut img, rect(492), &largechesttiles, 6, 5, 1, 0, false, 0, false, 1, false, b); // double chest S facing E
    draw_rotated_block_image(&mut img, rect(531), &tiles, 20, 21, 20, 1, false, 0, false, 1, false, b); // log EW
    draw_rotated_block_image(&mut img, rect(532), &tiles, 21, 20, 20, 0, false, 3, false, 0, false, b); // log NS
    draw_rotated_block_image(&mut img, rect(533), &tiles, 116, 21, 116, 1, false, 0, false, 1, false, b); // pine log EW
    draw_rotated_block_image(&mut img, rect(534), &tiles, 21, 116, 116, 0, false, 3, false, 0, false, b); // pine log NS
    draw_rotated_block_image(&mut img, rect(535), &tiles, 117, 21, 117, 1, false, 0, false, 1, false, b); // birch log EW
    draw_rotated_block_image(&mut img, rect(536), &tiles, 21, 117, 117, 0, false, 3, false, 0, false, b); // birch log NS
    draw_rotated_block_image(&mut img, rect(537), &tiles, 153, 21, 153, 1, false, 0, false, 1, false, b); // jungle log EW
    draw_rotated_block_image(&mut img, rect(538), &tiles, 21, 153, 153, 0, false, 3, false, 0, false, b); // jungle log NS

    draw_partial_block_image(&mut img, rect(9), &tiles, 205, 205, 205, b, cutoff_2_16, 0, 0, 0, true); // water level 7
    draw_partial_block_image(&mut img, rect(10), &tiles, 205, 205, 205, b, cutoff_4_16, 0, 0, 0, true); // water level 6
    draw_partial_block_image(&mut img, rect(11), &tiles, 205, 205, 205, b, cutoff_6_16, 0, 0, 0, true); // water level 5
    draw_partial_block_image(&mut img, rect(12), &tiles, 205, 205, 205, b, cutoff_8_16, 0, 0, 0, true); // water level 4
    draw_partial_block_image(&mut img, rect(13), &tiles, 205, 205, 205, b, cutoff_10_16, 0, 0, 0, true); // water level 3
    draw_partial_block_image(&mut img, rect(14), &tiles, 205, 205, 205, b, cutoff_12_16, 0, 0, 0, true); // water level 2
    draw_partial_block_image(&mut img, rect(15), &tiles, 205, 205, 205, b, cutoff_14_16, 0, 0, 0, true); // water level 1
    draw_partial_block_image(&mut img, rect(17), &tiles, 237, 237, 237, b, cutoff_4_16, 0, 0, 0, true); // lava level 3
    draw_partial_block_image(&mut img, rect(18), &tiles, 237, 237, 237, b, cutoff_8_16, 0, 0, 0, true); // lava level 2
    draw_partial_block_image(&mut img, rect(19), &tiles, 237, 237, 237, b, cutoff_12_16, 0, 0, 0, true); // lava level 1
    draw_partial_block_image(&mut img, rect(37), &tiles, 5, 5, 6, b, cutoff_8_16, 0, 0, 0, true); // stone slab
    draw_partial_block_image(&mut img, rect(229), &tiles, 192, 192, 176, b, cutoff_8_16, 0, 0, 0, true); // sandstone slab
    draw_partial_block_image(&mut img, rect(230), &tiles, 4, 4, 4, b, cutoff_8_16, 0, 0, 0, true); // wooden slab
    draw_partial_block_image(&mut img, rect(231), &tiles, 16, 16, 16, b, cutoff_8_16, 0, 0, 0, true); // cobble slab
    draw_partial_block_image(&mut img, rect(302), &tiles, 7, 7, 7, b, cutoff_8_16, 0, 0, 0, true); // brick slab
    draw_partial_block_image(&mut img, rect(303), &tiles, 54, 54, 54, b, cutoff_8_16, 0, 0, 0, true); // stone brick slab
    draw_partial_block_image(&mut img, rect(464), &tiles, 198, 198, 198, b, cutoff_8_16, 0, 0, 0, true); // pine slab
    draw_partial_block_image(&mut img, rect(466), &tiles, 214, 214, 214, b, cutoff_8_16, 0, 0, 0, true); // birch slab
    draw_partial_block_image(&mut img, rect(468), &tiles, 199, 199, 199, b, cutoff_8_16, 0, 0, 0, true); // jungle slab
    draw_partial_block_image(&mut img, rect(458), &tiles, 5, 5, 6, b, 0, cutoff_8_16, 0, 0, false); // stone slab inv
    draw_partial_block_image(&mut img, rect(459), &tiles, 192, 192, 176, b, 0, cutoff_8_16, 0, 0, false); // sandstone slab inv
    draw_partial_block_image(&mut img, rect(460), &tiles, 4, 4, 4, b, 0, cutoff_8_16, 0, 0, false); // wooden slab inv
    draw_partial_block_image(&mut img, rect(461), &tiles, 16, 16, 16, b, 0, cutoff_8_16, 0, 0, false); // cobble slab inv
    draw_partial_block_image(&mut img, rect(462), &tiles, 7, 7, 7, b, 0, cutoff_8_16, 0, 0, false); // brick slab inv
    draw_partial_block_image(&mut img, rect(463), &tiles, 54, 54, 54, b, 0, cutoff_8_16, 0, 0, false); // stone brick slab inv
    draw_partial_block_image(&mut img, rect(465), &tiles, 198, 198, 198, b, 0, cutoff_8_16, 0, 0, false); // pine slab inv
    draw_partial_block_image(&mut img, rect(467), &tiles, 214, 214, 214, b, 0, cutoff_8_16, 0, 0, false); // birch slab inv
    draw_partial_block_image(&mut img, rect(469), &tiles, 199, 199, 199, b, 0, cutoff_8_16, 0, 0, false); // jungle slab inv
    draw_partial_block_image(&mut img, rect(110), &tiles, 1, 1, 1, b, cutoff_14_16, 0, 0, 0, true); // stone pressure plate
    draw_partial_block_image(&mut img, rect(119), &tiles, 4, 4, 4, b, cutoff_14_16, 0, 0, 0, true); // wood pressure plate
    draw_partial_block_image(&mut img, rect(127), &tiles, 66, 66, 66, b, cutoff_12_16, 0, 0, 0, true); // snow
    draw_partial_block_image(&mut img, rect(289), &tiles, 122, 122, 121, b, cutoff_8_16, 0, 0, 0, false); // cake
    draw_partial_block_image(&mut img, rect(281), &tiles, 151, 152, 135, b, cutoff_8_16, 0, 0, 0, false); // bed head W
    draw_partial_block_image(&mut img, rect(282), &tiles, 152, 151, 135, b, cutoff_8_16, 0, 3, 2, false); // bed head N
    draw_partial_block_image(&mut img, rect(283), &tiles, 151, -1, 135, b, cutoff_8_16, 0, 2, 1, false); // bed head E
    draw_partial_block_image(&mut img, rect(284), &tiles, -1, 151, 135, b, cutoff_8_16, 0, 1, 0, false); // bed head S
    draw_partial_block_image(&mut img, rect(285), &tiles, 150, -1, 134, b, cutoff_8_16, 0, 0, 0, false); // bed foot W
    draw_partial_block_image(&mut img, rect(286), &tiles, -1, 150, 134, b, cutoff_8_16, 0, 3, 2, false); // bed foot N
    draw_partial_block_image(&mut img, rect(287), &tiles, 150, 149, 134, b, cutoff_8_16, 0, 2, 1, false); // bed foot E
    draw_partial_block_image(&mut img, rect(288), &tiles, 149, 150, 134, b, cutoff_8_16, 0, 1, 0, false); // bed foot S
    draw_partial_block_image(&mut img, rect(348), &tiles, 182, 182, 166, b, cutoff_4_16, 0, 0, 0, false); // enchantment table
    draw_partial_block_image(&mut img, rect(349), &tiles, 159, 159, 158, b, cutoff_3_16, 0, 0, 0, false); // end portal frame
    draw_partial_block_image(&mut img, rect(377), &endportaltile, 0, 0, 0, b, cutoff_4_16, 0, 0, 0, true); // end portal

    draw_item_block_image(&mut img, rect(6), &tiles, 15, b); // sapling
    draw_item_block_image(&mut img, rect(30), &tiles, 13, b); // yellow flower
    draw_item_block_image(&mut img, rect(31), &tiles, 12, b); // red rose
    draw_item_block_image(&mut img, rect(32), &tiles, 29, b); // brown mushroom
    draw_item_block_image(&mut img, rect(33), &tiles, 28, b); // red mushroom
    draw_item_block_image(&mut img, rect(43), &tiles, 80, b); // torch floor
    draw_item_block_image(&mut img, rect(59), &tiles, 95, b); // wheat level 7
    draw_item_block_image(&mut img, rect(60), &tiles, 94, b); // wheat level 6
    draw_item_block_image(&mut img, rect(61), &tiles, 93, b); // wheat level 5
    draw_item_block_image(&mut img, rect(62), &tiles, 92, b); // wheat level 4
    draw_item_block_image(&mut img, rect(63), &tiles, 91, b); // wheat level 3
    draw_item_block_image(&mut img, rect(64), &tiles, 90, b); // wheat level 2
    draw_item_block_image(&mut img, rect(65), &tiles, 89, b); // wheat level 1
    draw_item_block_image(&mut img, rect(66), &tiles, 88, b); // wheat level 0
    draw_item_block_image(&mut img, rect(121), &tiles, 115, b); // red torch floor off
    draw_item_block_image(&mut img, rect(122), &tiles, 99, b); // red torch floor on
    draw_item_block_image(&mut img, rect(132), &tiles, 73, b); // reeds
    draw_item_block_image(&mut img, rect(250), &tiles, 63, b); // pine sapling
    draw_item_block_image(&mut img, rect(251), &tiles, 79, b); // birch sapling
    draw_item_block_image(&mut img, rect(429), &tiles, 30, b); // jungle sapling
    draw_item_block_image(&mut img, rect(272), &tiles, 11, b); // web
    draw_item_block_image(&mut img, rect(273), &tiles, 39, b); // tall grass
    draw_item_block_image(&mut img, rect(274), &tiles, 56, b); // fern
    draw_item_block_image(&mut img, rect(275), &tiles, 55, b); // dead shrub
    draw_multi_item_block_image(&mut img, rect(333), &tiles, 226, b); // netherwart small
    draw_multi_item_block_image(&mut img, rect(334), &tiles, 227, b); // netherwart medium
    draw_multi_item_block_image(&mut img, rect(335), &tiles, 228, b); // netherwart large
    draw_item_block_image(&mut img, rect(355), &tiles, 85, b); // iron bars NSEW
    draw_partial_item_block_image(&mut img, rect(356), &tiles, 85, 0, false, b, true, true, false, false); // iron bars NS
    draw_partial_item_block_image(&mut img, rect(357), &tiles, 85, 0, false, b, true, false, true, false); // iron bars NE
    draw_partial_item_block_image(&mut img, rect(358), &tiles, 85, 0, false, b, true, false, false, true); // iron bars NW
    draw_partial_item_block_image(&mut img, rect(359), &tiles, 85, 0, false, b, false, true, true, false); // iron bars SE
    draw_partial_item_block_image(&mut img, rect(360), &tiles, 85, 0, false, b, false, true, false, true); // iron bars SW
    draw_partial_item_block_image(&mut img, rect(361), &tiles, 85, 0, false, b, false, false, true, true); // iron bars EW
    draw_partial_item_block_image(&mut img, rect(362), &tiles, 85, 0, false, b, false, true, true, true); // iron bars SEW
    draw_partial_item_block_image(&mut img, rect(363), &tiles, 85, 0, false, b, true, false, true, true); // iron bars NEW
    draw_partial_item_block_image(&mut img, rect(364), &tiles, 85, 0, false, b, true, true, false, true); // iron bars NSW
    draw_partial_item_block_image(&mut img, rect(365), &tiles, 85, 0, false, b, true, true, true, false); // iron bars NSE
    draw_partial_item_block_image(&mut img, rect(419), &tiles, 85, 0, false, b, true, false, false, false); // iron bars N
    draw_partial_item_block_image(&mut img, rect(420), &tiles, 85, 0, false, b, false, true, false, false); // iron bars S
    draw_partial_item_block_image(&mut img, rect(421), &tiles, 85, 0, false, b, false, false, true, false); // iron bars E
    draw_partial_item_block_image(&mut img, rect(422), &tiles, 85, 0, false, b, false, false, false, true); // iron bars W
    draw_item_block_image(&mut img, rect(366), &tiles, 49, b); // glass pane NSEW
    draw_partial_item_block_image(&mut img, rect(367), &tiles, 49, 0, false, b, true, true, false, false); // glass pane NS
    draw_partial_item_block_image(&mut img, rect(368), &tiles, 49, 0, false, b, true, false, true, false); // glass pane NE
    draw_partial_item_block_image(&mut img, rect(369), &tiles, 49, 0, false, b, true, false, false, true); // glass pane NW
    draw_partial_item_block_image(&mut img, rect(370), &tiles, 49, 0, false, b, false, true, true, false); // glass pane SE
    draw_partial_item_block_image(&mut img, rect(371), &tiles, 49, 0, false, b, false, true, false, true); // glass pane SW
    draw_partial_item_block_image(&mut img, rect(372), &tiles, 49, 0, false, b, false, false, true, true); // glass pane EW
    draw_partial_item_block_image(&mut img, rect(373), &tiles, 49, 0, false, b, false, true, true, true); // glass pane SEW
    draw_partial_item_block_image(&mut img, rect(374), &tiles, 49, 0, false, b, true, false, true, true); // glass pane NEW
    draw_partial_item_block_image(&mut img, rect(375), &tiles, 49, 0, false, b, true, true, false, true); // glass pane NSW
    draw_partial_item_block_image(&mut img, rect(376), &tiles, 49, 0, false, b, true, true, true, false); // glass pane NSE
    draw_partial_item_block_image(&mut img, rect(423), &tiles, 49, 0, false, b, true, false, false, false); // glass pane N
    draw_partial_item_block_image(&mut img, rect(424), &tiles, 49, 0, false, b, false, true, false, false); // glass pane S
    draw_partial_item_block_image(&mut img, rect(425), &tiles, 49, 0, false, b, false, false, true, false); // glass pane E
    draw_partial_item_block_image(&mut img, rect(426), &tiles, 49, 0, false, b, false, false, false, true); // glass pane W
    draw_item_block_image(&mut img, rect(395), &stemtiles, 0, b); // stem level 0
    draw_item_block_image(&mut img, rect(396), &stemtiles, 1, b); // stem level 1
    draw_item_block_image(&mut img, rect(397), &stemtiles, 2, b); // stem level 2
    draw_item_block_image(&mut img, rect(398), &stemtiles, 3, b); // stem level 3
    draw_item_block_image(&mut img, rect(399), &stemtiles, 4, b); // stem level 4
    draw_item_block_image(&mut img, rect(400), &stemtiles, 5, b); // stem level 5
    draw_item_block_image(&mut img, rect(401), &stemtiles, 6, b); // stem level 6
    draw_item_block_image(&mut img, rect(402), &stemtiles, 7, b); // stem level 7
    draw_partial_item_block_image(&mut img, rect(403), &stemtiles, 8, 0, false, b, true, true, false, false); // stem pointing N
    draw_partial_item_block_image(&mut img, rect(404), &stemtiles, 9, 0, false, b, true, true, false, false); // stem pointing S
    draw_partial_item_block_image(&mut img, rect(405), &stemtiles, 8, 0, false, b, false, false, true, true); // stem pointing E
    draw_partial_item_block_image(&mut img, rect(406), &stemtiles, 9, 0, false, b, false, false, true, true); // stem pointing W
    draw_partial_item_block_image(&mut img, rect(519), &tiles, 170, 0, true, b, true, false, false, false); // cocoa level 0 stem N
    draw_partial_item_block_image(&mut img, rect(520), &tiles, 170, 0, false, b, false, true, false, false); // cocoa level 0 stem S
    draw_partial_item_block_image(&mut img, rect(521), &tiles, 170, 0, true, b, false, false, true, false); // cocoa level 0 stem E
    draw_partial_item_block_image(&mut img, rect(522), &tiles, 170, 0, false, b, false, false, false, true); // cocoa level 0 stem W
    draw_partial_item_block_image(&mut img, rect(523), &tiles, 169, 0, true, b, true, false, false, false); // cocoa level 1 stem N
    draw_partial_item_block_image(&mut img, rect(524), &tiles, 169, 0, false, b, false, true, false, false); // cocoa level 1 stem S
    draw_partial_item_block_image(&mut img, rect(525), &tiles, 169, 0, true, b, false, false, true, false); // cocoa level 1 stem E
    draw_partial_item_block_image(&mut img, rect(526), &tiles, 169, 0, false, b, false, false, false, true); // cocoa level 1 stem W
    draw_partial_item_block_image(&mut img, rect(527), &tiles, 168, 0, true, b, true, false, false, false); // cocoa level 2 stem N
    draw_partial_item_block_image(&mut img, rect(528), &tiles, 168, 0, false, b, false, true, false, false); // cocoa level 2 stem S
    draw_partial_item_block_image(&mut img, rect(529), &tiles, 168, 0, true, b, false, false, true, false); // cocoa level 2 stem E
    draw_partial_item_block_image(&mut img, rect(530), &tiles, 168, 0, false, b, false, false, false, true); // cocoa level 2 stem W
    draw_partial_item_block_image(&mut img, rect(543), &tiles, 173, 2, false, b, true, true, true, true); // tripwire NSEW
    draw_partial_item_block_image(&mut img, rect(544), &tiles, 173, 2, false, b, true, true, false, false); // tripwire NS
    draw_partial_item_block_image(&mut img, rect(545), &tiles, 173, 2, false, b, true, false, true, false); // tripwire NE
    draw_partial_item_block_image(&mut img, rect(546), &tiles, 173, 2, false, b, true, false, false, true); // tripwire NW
    draw_partial_item_block_image(&mut img, rect(547), &tiles, 173, 2, false, b, false, true, true, false); // tripwire SE
    draw_partial_item_block_image(&mut img, rect(548), &tiles, 173, 2, false, b, false, true, false, true); // tripwire SW
    draw_partial_item_block_image(&mut img, rect(549), &tiles, 173, 2, false, b, false, false, true, true); // tripwire EW
    draw_partial_item_block_image(&mut img, rect(550), &tiles, 173, 2, false, b, false, true, true, true); // tripwire SEW
    draw_partial_item_block_image(&mut img, rect(551), &tiles, 173, 2, false, b, true, false, true, true); // tripwire NEW
    draw_partial_item_block_image(&mut img, rect(552), &tiles, 173, 2, false, b, true, true, false, true); // tripwire NSW
    draw_partial_item_block_image(&mut img, rect(553), &tiles, 173, 2, false, b, true, true, true, false); // tripwire NSE

    draw_single_face_block_image(&mut img, rect(44), &tiles, 80, 1, b); // torch pointing S
    draw_single_face_block_image(&mut img, rect(45), &tiles, 80, 0, b); // torch pointing N
    draw_single_face_block_image(&mut img, rect(46), &tiles, 80, 3, b); // torch pointing W
    draw_single_face_block_image(&mut img, rect(47), &tiles, 80, 2, b); // torch pointing E
    draw_single_face_block_image(&mut img, rect(74), &tiles, 97, 3, b); // wood door S side
    draw_single_face_block_image(&mut img, rect(75), &tiles, 97, 2, b); // wood door N side
    draw_single_face_block_image(&mut img, rect(76), &tiles, 97, 0, b); // wood door W side
    draw_single_face_block_image(&mut img, rect(77), &tiles, 97, 1, b); // wood door E side
    draw_single_face_block_image(&mut img, rect(78), &tiles, 81, 3, b); // wood door top S
    draw_single_face_block_image(&mut img, rect(79), &tiles, 81, 2, b); // wood door top N
    draw_single_face_block_image(&mut img, rect(80), &tiles, 81, 0, b); // wood door top W
    draw_single_face_block_image(&mut img, rect(81), &tiles, 81, 1, b); // wood door top E
    draw_single_face_block_image(&mut img, rect(82), &tiles, 83, 2, b); // ladder E side
    draw_single_face_block_image(&mut img, rect(83), &tiles, 83, 3, b); // ladder W side
    draw_single_face_block_image(&mut img, rect(84), &tiles, 83, 0, b); // ladder N side
    draw_single_face_block_image(&mut img, rect(85), &tiles, 83, 1, b); // ladder S side
    draw_single_face_block_image(&mut img, rect(111), &tiles, 98, 3, b); // iron door S side
    draw_single_face_block_image(&mut img, rect(112), &tiles, 98, 2, b); // iron door N side
    draw_single_face_block_image(&mut img, rect(113), &tiles, 98, 0, b); // iron door W side
    draw_single_face_block_image(&mut img, rect(114), &tiles, 98, 1, b); // iron door E side
    draw_single_face_block_image(&mut img, rect(115), &tiles, 82, 3, b); // iron door top S
    draw_single_face_block_image(&mut img, rect(116), &tiles, 82, 2, b); // iron door top N
    draw_single_face_block_image(&mut img, rect(117), &tiles, 82, 0, b); // iron door top W
    draw_single_face_block_image(&mut img, rect(118), &tiles, 82, 1, b); // iron door top E
    draw_single_face_block_image(&mut img, rect(141), &tiles, 99, 1, b); // red torch S on
    draw_single_face_block_image(&mut img, rect(142), &tiles, 99, 0, b); // red torch N on
    draw_single_face_block_image(&mut img, rect(143), &tiles, 99, 3, b); // red torch W on
    draw_single_face_block_image(&mut img, rect(144), &tiles, 99, 2, b); // red torch E on
    draw_single_face_block_image(&mut img, rect(145), &tiles, 115, 1, b); // red torch S off
    draw_single_face_block_image(&mut img, rect(146), &tiles, 115, 0, b); // red torch N off
    draw_single_face_block_image(&mut img, rect(147), &tiles, 115, 3, b); // red torch W off
    draw_single_face_block_image(&mut img, rect(148), &tiles, 115, 2, b); // red torch E off
    draw_single_face_block_image(&mut img, rect(277), &tiles, 84, 2, b); // trapdoor open W
    draw_single_face_block_image(&mut img, rect(278), &tiles, 84, 3, b); // trapdoor open E
    draw_single_face_block_image(&mut img, rect(279), &tiles, 84, 0, b); // trapdoor open S
    draw_single_face_block_image(&mut img, rect(280), &tiles, 84, 1, b); // trapdoor open N
    draw_single_face_block_image(&mut img, rect(539), &tiles, 172, 0, b); // tripwire hook S
    draw_single_face_block_image(&mut img, rect(540), &tiles, 172, 1, b); // tripwire hook N
    draw_single_face_block_image(&mut img, rect(541), &tiles, 172, 2, b); // tripwire hook W
    draw_single_face_block_image(&mut img, rect(542), &tiles, 172, 3, b); // tripwire hook E

    draw_partial_single_face_block_image(&mut img, rect(100), &tiles, 4, 2, b, 0.25, 0.75, 0.0, 1.0); // wall sign facing E
    draw_partial_single_face_block_image(&mut img, rect(101), &tiles, 4, 3, b, 0.25, 0.75, 0.0, 1.0); // wall sign facing W
    draw_partial_single_face_block_image(&mut img, rect(102), &tiles, 4, 0, b, 0.25, 0.75, 0.0, 1.0); // wall sign facing N
    draw_partial_single_face_block_image(&mut img, rect(103), &tiles, 4, 1, b, 0.25, 0.75, 0.0, 1.0); // wall sign facing S
    draw_partial_single_face_block_image(&mut img, rect(190), &tiles, 1, 1, b, 0.35, 0.65, 0.35, 0.65); // stone button facing S
    draw_partial_single_face_block_image(&mut img, rect(191), &tiles, 1, 0, b, 0.35, 0.65, 0.35, 0.65); // stone button facing N
    draw_partial_single_face_block_image(&mut img, rect(192), &tiles, 1, 3, b, 0.35, 0.65, 0.35, 0.65); // stone button facing W
    draw_partial_single_face_block_image(&mut img, rect(193), &tiles, 1, 2, b, 0.35, 0.65, 0.35, 0.65); // stone button facing E

    draw_solid_color_block_image(&mut img, rect(139), make_rgba(0x48, 0x27, 0x7b, 0xd0), b); // portal

    draw_stairs_s(&mut img, rect(50), &tiles, 4, 4, b); // wood stairs asc S
    draw_stairs_n(&mut img, rect(51), &tiles, 4, 4, b); // wood stairs asc N
    draw_stairs_w(&mut img, rect(52), &tiles, 4, 4, b); // wood stairs asc W
    draw_stairs_e(&mut img, rect(53), &tiles, 4, 4, b); // wood stairs asc E
    draw_stairs_s(&mut img, rect(96), &tiles, 16, 16, b); // cobble stairs asc S
    draw_stairs_n(&mut img, rect(97), &tiles, 16, 16, b); // cobble stairs asc N
    draw_stairs_w(&mut img, rect(98), &tiles, 16, 16, b); // cobble stairs asc W
    draw_stairs_e(&mut img, rect(99), &tiles, 16, 16, b); // cobble stairs asc E
    draw_stairs_s(&mut img, rect(304), &tiles, 7, 7, b); // brick stairs asc S
    draw_stairs_n(&mut img, rect(305), &tiles, 7, 7, b); // brick stairs asc N
    draw_stairs_w(&mut img, rect(306), &tiles, 7, 7, b); // brick stairs asc W
    draw_stairs_e(&mut img, rect(307), &tiles, 7, 7, b); // brick stairs asc E
    draw_stairs_s(&mut img, rect(308), &tiles, 54, 54, b); // stone brick stairs asc S
    draw_stairs_n(&mut img, rect(309), &tiles, 54, 54, b); // stone brick stairs asc N
    draw_stairs_w(&mut img, rect(310), &tiles, 54, 54, b); // stone brick stairs asc W
    draw_stairs_e(&mut img, rect(311), &tiles, 54, 54, b); // stone brick stairs asc E
    draw_stairs_s(&mut img, rect(312), &tiles, 224, 224, b); // nether brick stairs asc S
    draw_stairs_n(&mut img, rect(313), &tiles, 224, 224, b); // nether brick stairs asc N
    draw_stairs_w(&mut img, rect(314), &tiles, 224, 224, b); // nether brick stairs asc W
    draw_stairs_e(&mut img, rect(315), &tiles, 224, 224, b); // nether brick stairs asc E
    draw_stairs_s(&mut img, rect(470), &tiles, 192, 176, b); // sandstone stairs asc S
    draw_stairs_n(&mut img, rect(471), &tiles, 192, 176, b); // sandstone stairs asc N
    draw_stairs_w(&mut img, rect(472), &tiles, 192, 176, b); // sandstone stairs asc W
    draw_stairs_e(&mut img, rect(473), &tiles, 192, 176, b); // sandstone stairs asc E
    draw_stairs_s(&mut img, rect(495), &tiles, 198, 198, b); // pine stairs asc S
    draw_stairs_n(&mut img, rect(496), &tiles, 198, 198, b); // pine stairs asc N
    draw_stairs_w(&mut img, rect(497), &tiles, 198, 198, b); // pine stairs asc W
    draw_stairs_e(&mut img, rect(498), &tiles, 198, 198, b); // pine stairs asc E
    draw_stairs_s(&mut img, rect(503), &tiles, 214, 214, b); // birch stairs asc S
    draw_stairs_n(&mut img, rect(504), &tiles, 214, 214, b); // birch stairs asc N
    draw_stairs_w(&mut img, rect(505), &tiles, 214, 214, b); // birch stairs asc W
    draw_stairs_e(&mut img, rect(506), &tiles, 214, 214, b); // birch stairs asc E
    draw_stairs_s(&mut img, rect(511), &tiles, 199, 199, b); // jungle stairs asc S
    draw_stairs_n(&mut img, rect(512), &tiles, 199, 199, b); // jungle stairs asc N
    draw_stairs_w(&mut img, rect(513), &tiles, 199, 199, b); // jungle stairs asc W
    draw_stairs_e(&mut img, rect(514), &tiles, 199, 199, b); // jungle stairs asc E
    draw_inv_stairs_s(&mut img, rect(438), &tiles, 4, 4, b); // wood stairs inv S
    draw_inv_stairs_n(&mut img, rect(439), &tiles, 4, 4, b); // wood stairs inv N
    draw_inv_stairs_w(&mut img, rect(440), &tiles, 4, 4, b); // wood stairs inv W
    draw_inv_stairs_e(&mut img, rect(441), &tiles, 4, 4, b); // wood stairs inv E
    draw_inv_stairs_s(&mut img, rect(442), &tiles, 16, 16, b); // cobble stairs inv S
    draw_inv_stairs_n(&mut img, rect(443), &tiles, 16, 16, b); // cobble stairs inv N
    draw_inv_stairs_w(&mut img, rect(444), &tiles, 16, 16, b); // cobble stairs inv W
    draw_inv_stairs_e(&mut img, rect(445), &tiles, 16, 16, b); // cobble stairs inv E
    draw_inv_stairs_s(&mut img, rect(446), &tiles, 7, 7, b); // brick stairs inv S
    draw_inv_stairs_n(&mut img, rect(447), &tiles, 7, 7, b); // brick stairs inv N
    draw_inv_stairs_w(&mut img, rect(448), &tiles, 7, 7, b); // brick stairs inv W
    draw_inv_stairs_e(&mut img, rect(449), &tiles, 7, 7, b); // brick stairs inv E
    draw_inv_stairs_s(&mut img, rect(450), &tiles, 54, 54, b); // stone brick stairs inv S
    draw_inv_stairs_n(&mut img, rect(451), &tiles, 54, 54, b); // stone brick stairs inv N
    draw_inv_stairs_w(&mut img, rect(452), &tiles, 54, 54, b); // stone brick stairs inv W
    draw_inv_stairs_e(&mut img, rect(453), &tiles, 54, 54, b); // stone brick stairs inv E
    draw_inv_stairs_s(&mut img, rect(454), &tiles, 224, 224, b); // nether brick stairs inv S
    draw_inv_stairs_n(&mut img, rect(455), &tiles, 224, 224, b); // nether brick stairs inv N
    draw_inv_stairs_w(&mut img, rect(456), &tiles, 224, 224, b); // nether brick stairs inv W
    draw_inv_stairs_e(&mut img, rect(457), &tiles, 224, 224, b); // nether brick stairs inv E
    draw_inv_stairs_s(&mut img, rect(474), &tiles, 192, 176, b); // sandstone stairs inv S
    draw_inv_stairs_n(&mut img, rect(475), &tiles, 192, 176, b); // sandstone stairs inv N
    draw_inv_stairs_w(&mut img, rect(476), &tiles, 192, 176, b); // sandstone stairs inv W
    draw_inv_stairs_e(&mut img, rect(477), &tiles, 192, 176, b); // sandstone stairs inv E
    draw_inv_stairs_s(&mut img, rect(499), &tiles, 198, 198, b); // pine stairs inv S
    draw_inv_stairs_n(&mut img, rect(500), &tiles, 198, 198, b); // pine stairs inv N
    draw_inv_stairs_w(&mut img, rect(501), &tiles, 198, 198, b); // pine stairs inv W
    draw_inv_stairs_e(&mut img, rect(502), &tiles, 198, 198, b); // pine stairs inv E
    draw_inv_stairs_s(&mut img, rect(507), &tiles, 214, 214, b); // birch stairs inv S
    draw_inv_stairs_n(&mut img, rect(508), &tiles, 214, 214, b); // birch stairs inv N
    draw_inv_stairs_w(&mut img, rect(509), &tiles, 214, 214, b); // birch stairs inv W
    draw_inv_stairs_e(&mut img, rect(510), &tiles, 214, 214, b); // birch stairs inv E
    draw_inv_stairs_s(&mut img, rect(515), &tiles, 199, 199, b); // jungle stairs inv S
    draw_inv_stairs_n(&mut img, rect(516), &tiles, 199, 199, b); // jungle stairs inv N
    draw_inv_stairs_w(&mut img, rect(517), &tiles, 199, 199, b); // jungle stairs inv W
    draw_inv_stairs_e(&mut img, rect(518), &tiles, 199, 199, b); // jungle stairs inv E

    draw_floor_block_image(&mut img, rect(55), &tiles, 164, 0, b); // redstone wire NSEW
    draw_floor_block_image(&mut img, rect(86), &tiles, 128, 1, b); // track EW
    draw_floor_block_image(&mut img, rect(87), &tiles, 128, 0, b); // track NS
    draw_floor_block_image(&mut img, rect(92), &tiles, 112, 1, b); // track NE corner
    draw_floor_block_image(&mut img, rect(93), &tiles, 112, 0, b); // track SE corner
    draw_floor_block_image(&mut img, rect(94), &tiles, 112, 3, b); // track SW corner
    draw_floor_block_image(&mut img, rect(95), &tiles, 112, 2, b); // track NW corner
    draw_floor_block_image(&mut img, rect(252), &tiles, 179, 1, b); // booster on EW
    draw_floor_block_image(&mut img, rect(253), &tiles, 179, 0, b); // booster on NS
    draw_floor_block_image(&mut img, rect(258), &tiles, 163, 1, b); // booster off EW
    draw_floor_block_image(&mut img, rect(259), &tiles, 163, 0, b); // booster off NS
    draw_floor_block_image(&mut img, rect(264), &tiles, 195, 1, b); // detector EW
    draw_floor_block_image(&mut img, rect(265), &tiles, 195, 0, b); // detector NS
    draw_floor_block_image(&mut img, rect(276), &tiles, 84, 0, b); // trapdoor closed
    draw_floor_block_image(&mut img, rect(316), &tiles, 76, 0, b); // lily pad

    draw_angled_floor_block_image(&mut img, rect(200), &tiles, 128, 0, 0, b); // track asc S
    draw_angled_floor_block_image(&mut img, rect(201), &tiles, 128, 0, 2, b); // track asc N
    draw_angled_floor_block_image(&mut img, rect(202), &tiles, 128, 1, 3, b); // track asc E
    draw_angled_floor_block_image(&mut img, rect(203), &tiles, 128, 1, 1, b); // track asc W
    draw_angled_floor_block_image(&mut img, rect(254), &tiles, 179, 0, 0, b); // booster on asc S
    draw_angled_floor_block_image(&mut img, rect(255), &tiles, 179, 0, 2, b); // booster on asc N
    draw_angled_floor_block_image(&mut img, rect(256), &tiles, 179, 1, 3, b); // booster on asc E
    draw_angled_floor_block_image(&mut img, rect(257), &tiles, 179, 1, 1, b); // booster on asc W
    draw_angled_floor_block_image(&mut img, rect(260), &tiles, 163, 0, 0, b); // booster off asc S
    draw_angled_floor_block_image(&mut img, rect(261), &tiles, 163, 0, 2, b); // booster off asc N
    draw_angled_floor_block_image(&mut img, rect(262), &tiles, 163, 1, 3, b); // booster off asc E
    draw_angled_floor_block_image(&mut img, rect(263), &tiles, 163, 1, 1, b); // booster off asc W
    draw_angled_floor_block_image(&mut img, rect(266), &tiles, 195, 0, 0, b); // detector asc S
    draw_angled_floor_block_image(&mut img, rect(267), &tiles, 195, 0, 2, b); // detector asc N
    draw_angled_floor_block_image(&mut img, rect(268), &tiles, 195, 1, 3, b); // detector asc E
    draw_angled_floor_block_image(&mut img, rect(269), &tiles, 195, 1, 1, b); // detector asc W

    draw_fence_post(&mut img, rect(134), &tiles, 4, b); // fence post
    draw_fence(&mut img, rect(158), &tiles, 4, true, false, false, false, true, b); // fence N
    draw_fence(&mut img, rect(159), &tiles, 4, false, true, false, false, true, b); // fence S
    draw_fence(&mut img, rect(160), &tiles, 4, true, true, false, false, true, b); // fence NS
    draw_fence(&mut img, rect(161), &tiles, 4, false, false, true, false, true, b); // fence E
    draw_fence(&mut img, rect(162), &tiles, 4, true, false, true, false, true, b); // fence NE
    draw_fence(&mut img, rect(163), &tiles, 4, false, true, true, false, true, b); // fence SE
    draw_fence(&mut img, rect(164), &tiles, 4, true, true, true, false, true, b); // fence NSE
    draw_fence(&mut img, rect(165), &tiles, 4, false, false, false, true, true, b); // fence W
    draw_fence(&mut img, rect(166), &tiles, 4, true, false, false, true, true, b); // fence NW
    draw_fence(&mut img, rect(167), &tiles, 4, false, true, false, true, true, b); // fence SW
    draw_fence(&mut img, rect(168), &tiles, 4, true, true, false, true, true, b); // fence NSW
    draw_fence(&mut img, rect(169), &tiles, 4, false, false, true, true, true, b); // fence EW
    draw_fence(&mut img, rect(170), &tiles, 4, true, false, true, true, true, b); // fence NEW
    draw_fence(&mut img, rect(171), &tiles, 4, false, true, true, true, true, b); // fence SEW
    draw_fence(&mut img, rect(172), &tiles, 4, true, true, true, true, true, b); // fence NSEW
    draw_fence_post(&mut img, rect(332), &tiles, 224, b); // nether fence post
    draw_fence(&mut img, rect(317), &tiles, 224, true, false, false, false, true, b); // nether fence N
    draw_fence(&mut img, rect(318), &tiles, 224, false, true, false, false, true, b); // nether fence S
    draw_fence(&mut img, rect(319), &tiles, 224, true, true, false, false, true, b); // nether fence NS
    draw_fence(&mut img, rect(320), &tiles, 224, false, false, true, false, true, b); // nether fence E
    draw_fence(&mut img, rect(321), &tiles, 224, true, false, true, false, true, b); // nether fence NE
    draw_fence(&mut img, rect(322), &tiles, 224, false, true, true, false, true, b); // nether fence SE
    draw_fence(&mut img, rect(323), &tiles, 224, true, true, true, false, true, b); // nether fence NSE
    draw_fence(&mut img, rect(324), &tiles, 224, false, false, false, true, true, b); // nether fence W
    draw_fence(&mut img, rect(325), &tiles, 224, true, false, false, true, true, b); // nether fence NW
    draw_fence(&mut img, rect(326), &tiles, 224, false, true, false, true, true, b); // nether fence SW
    draw_fence(&mut img, rect(327), &tiles, 224, true, true, false, true, true, b); // nether fence NSW
    draw_fence(&mut img, rect(328), &tiles, 224, false, false, true, true, true, b); // nether fence EW
    draw_fence(&mut img, rect(329), &tiles, 224, true, false, true, true, true, b); // nether fence NEW
    draw_fence(&mut img, rect(330), &tiles, 224, false, true, true, true, true, b); // nether fence SEW
    draw_fence(&mut img, rect(331), &tiles, 224, true, true, true, true, true, b); // nether fence NSEW
    draw_fence(&mut img, rect(346), &tiles, 4, false, false, true, true, false, b); // fence gate EW
    draw_fence(&mut img, rect(347), &tiles, 4, true, true, false, false, false, b); // fence gate NS

    draw_sign(&mut img, rect(70), &tiles, 4, b); // sign facing N/S
    draw_sign(&mut img, rect(71), &tiles, 4, b); // sign facing NE/SW
    draw_sign(&mut img, rect(72), &tiles, 4, b); // sign facing E/W
    draw_sign(&mut img, rect(73), &tiles, 4, b); // sign facing SE/NW

    draw_wall_lever(&mut img, rect(194), &tiles, 1, b); // wall lever facing S
    draw_wall_lever(&mut img, rect(195), &tiles, 0, b); // wall lever facing N
    draw_wall_lever(&mut img, rect(196), &tiles, 3, b); // wall lever facing W
    draw_wall_lever(&mut img, rect(197), &tiles, 2, b); // wall lever facing E
    draw_floor_lever_ew(&mut img, rect(198), &tiles, b); // ground lever EW
    draw_floor_lever_ns(&mut img, rect(199), &tiles, b); // ground lever NS

    draw_repeater(&mut img, rect(240), &tiles, 147, 0, b); // repeater on N
    draw_repeater(&mut img, rect(241), &tiles, 147, 2, b); // repeater on S
    draw_repeater(&mut img, rect(242), &tiles, 147, 3, b); // repeater on E
    draw_repeater(&mut img, rect(243), &tiles, 147, 1, b); // repeater on W
    draw_repeater(&mut img, rect(244), &tiles, 131, 0, b); // repeater off N
    draw_repeater(&mut img, rect(245), &tiles, 131, 2, b); // repeater off S
    draw_repeater(&mut img, rect(246), &tiles, 131, 3, b); // repeater off E
    draw_repeater(&mut img, rect(247), &tiles, 131, 1, b); // repeater off W

    draw_fire(&mut img, rect(189), &firetile, b); // fire

    draw_brewing_stand(&mut img, rect(350), &tiles, 156, 157, b); // brewing stand

    draw_cauldron(&mut img, rect(351), &tiles, 154, -1, 0, b); // cauldron empty
    draw_cauldron(&mut img, rect(352), &tiles, 154, 205, cutoff_10_16, b); // cauldron 1/3 full
    draw_cauldron(&mut img, rect(353), &tiles, 154, 205, cutoff_6_16, b); // cauldron 2/3 full
    draw_cauldron(&mut img, rect(354), &tiles, 154, 205, cutoff_2_16, b); // cauldron full

    draw_dragon_egg(&mut img, rect(378), &tiles, 167, b); // dragon egg

    draw_vines(&mut img, rect(379), &tiles, 143, b, false, false, false, false, true); // vines top only
    draw_vines(&mut img, rect(380), &tiles, 143, b, true, false, false, false, false); // vines N
    draw_vines(&mut img, rect(381), &tiles, 143, b, false, true, false, false, false); // vines S
    draw_vines(&mut img, rect(382), &tiles, 143, b, true, true, false, false, false); // vines NS
    draw_vines(&mut img, rect(383), &tiles, 143, b, false, false, true, false, false); // vines E
    draw_vines(&mut img, rect(384), &tiles, 143, b, true, false, true, false, false); // vines NE
    draw_vines(&mut img, rect(385), &tiles, 143, b, false, true, true, false, false); // vines SE
    draw_vines(&mut img, rect(386), &tiles, 143, b, true, true, true, false, false); // vines NSE
    draw_vines(&mut img, rect(387), &tiles, 143, b, false, false, false, true, false); // vines W
    draw_vines(&mut img, rect(388), &tiles, 143, b, true, false, false, true, false); // vines NW
    draw_vines(&mut img, rect(389), &tiles, 143, b, false, true, false, true, false); // vines SW
    draw_vines(&mut img, rect(390), &tiles, 143, b, true, true, false, true, false); // vines NSW
    draw_vines(&mut img, rect(391), &tiles, 143, b, false, false, true, true, false); // vines EW
    draw_vines(&mut img, rect(392), &tiles, 143, b, true, false, true, true, false); // vines NEW
    draw_vines(&mut img, rect(393), &tiles, 143, b, false, true, true, true, false); // vines SEW
    draw_vines(&mut img, rect(394), &tiles, 143, b, true, true, true, true, false); // vines NSEW

    Ok(img)
}
