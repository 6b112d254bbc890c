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

//! The block sprite atlas: one image holding every block sprite in rows of
//! 16 cells, plus per-sprite opacity/transparency flags and the dense
//! (id, data) -> sprite offset map.
//!
//! Each sprite is a hexagonal shape within a 4Bx4B cell, with the unused
//! area fully transparent. Example for B = 3, where U marks pixels of the
//! upward face, etc.:
//!
//! ```text
//!        UU
//!      UUUUUU
//!    UUUUUUUUUU
//!   NUUUUUUUUUUW
//!   NNNUUUUUUWWW
//!   NNNNNUUWWWWW
//!   NNNNNNWWWWWW
//!   NNNNNNWWWWWW
//!   NNNNNNWWWWWW
//!    NNNNNWWWWW
//!      NNNWWW
//!        NW
//! ```
//!
//! Translucent blocks are the most expensive to render, simply because you
//! can see what's behind them; when supplying custom sprites, making
//! unwanted blocks fully transparent (not just translucent) is what makes
//! them cheap.

mod construct;
mod draw;
mod iterators;
mod offsets;

pub use iterators::{FaceIterator, FacePoint, RotatedFaceIterator, TopFaceIterator};

use anyhow::{Context, Result};
use log::warn;
use rgba::{alpha, blit, set_alpha, ImageRect, RGBAImage};
use std::{fs, path::Path, path::PathBuf};

/// Total number of sprites, including the fully transparent dummy at
/// offset 0 used for unrecognized blocks.
pub const NUM_BLOCK_IMAGES: usize = 554;

pub(crate) fn atlas_rect(offset: usize, rectsize: i32) -> ImageRect {
    ImageRect::new(
        (offset as i32 % 16) * rectsize,
        (offset as i32 / 16) * rectsize,
        rectsize,
        rectsize,
    )
}

fn version_file_path(b: i32, imgpath: &Path) -> PathBuf {
    imgpath.join(format!("blocks-{}.version", b))
}

fn write_version(b: i32, imgpath: &Path, version: usize) -> Result<()> {
    let path = version_file_path(b, imgpath);
    fs::write(&path, version.to_string())
        .with_context(|| format!("can't write {}", path.display()))
}

// the version of blocks-B.png is the sprite count it was built with,
// stored next to it in blocks-B.version
fn read_version(b: i32, imgpath: &Path) -> usize {
    let path = version_file_path(b, imgpath);
    match fs::read_to_string(&path) {
        Ok(text) => match text.trim().parse::<i64>() {
            // a clearly insane version is ignored
            Ok(v) if (0..=10000).contains(&v) => v as usize,
            _ => 0,
        },
        Err(_) => {
            // no version file: assume the sprite count of the first release,
            // from before the version file existed
            if write_version(b, imgpath, 157).is_err() {
                warn!("can't write version file next to blocks-{}.png", b);
            }
            157
        }
    }
}

pub struct BlockImages {
    /// All sprites, in rows of 16 cells; the first is the transparent dummy.
    pub img: RGBAImage,
    /// Size of a sprite cell (4B).
    pub rectsize: i32,
    block_offsets: Vec<u16>,
    opacity: Vec<bool>,
    transparency: Vec<bool>,
}

impl BlockImages {
    /// Look for blocks-B.png in the image path and use it if its size and
    /// version check out; otherwise construct a new one from the source
    /// textures (preserving sprites from an older blocks-B.png where
    /// possible) and persist it.
    pub fn create(b: i32, imgpath: &Path) -> Result<BlockImages> {
        let rectsize = 4 * b;
        let mut bi = BlockImages {
            img: RGBAImage::default(),
            rectsize,
            block_offsets: offsets::build_block_offsets(),
            opacity: Vec::new(),
            transparency: Vec::new(),
        };

        let biversion = read_version(b, imgpath);
        let blocksfile = imgpath.join(format!("blocks-{}.png", b));
        let w = rectsize * 16;
        let h = (NUM_BLOCK_IMAGES as i32 / 16 + 1) * rectsize;
        let mut oldimg = None;
        match bi.img.read_png(&blocksfile) {
            Ok(()) => {
                if bi.img.w == w && bi.img.h == h && biversion == NUM_BLOCK_IMAGES {
                    bi.retouch_alphas(b);
                    bi.check_opacity_and_transparency(b);
                    return Ok(bi);
                }
                if biversion < NUM_BLOCK_IMAGES
                    && bi.img.w == w
                    && bi.img.h == (biversion as i32 / 16 + 1) * rectsize
                {
                    warn!(
                        "{} is missing some blocks; will fill them in from terrain.png",
                        blocksfile.display()
                    );
                    oldimg = Some(std::mem::take(&mut bi.img));
                } else {
                    warn!(
                        "{} has incorrect size (expected {}x{}); rebuilding from terrain.png",
                        blocksfile.display(),
                        w,
                        h
                    );
                }
            }
            Err(_) => {
                warn!(
                    "{} not found (or failed to read as PNG); will try to build from terrain.png",
                    blocksfile.display()
                );
            }
        }

        // build from terrain.png, fire.png, etc.
        bi.img = construct::construct(b, imgpath).context(
            "image path is missing at least one required file: terrain.png, chest.png, \
             largechest.png, enderchest.png (from minecraft.jar or your tile pack); \
             fire.png, endportal.png (included with pigmap)",
        )?;

        // preserve the previous version's sprites, for custom art
        if let Some(oldimg) = oldimg {
            for i in 0..biversion {
                let rect = bi.get_rect(i);
                blit(&oldimg, rect, &mut bi.img, rect.x, rect.y);
            }
        }

        bi.img
            .write_png(&blocksfile)
            .with_context(|| format!("can't write {}", blocksfile.display()))?;
        write_version(b, imgpath, NUM_BLOCK_IMAGES)?;

        bi.retouch_alphas(b);
        bi.check_opacity_and_transparency(b);
        Ok(bi)
    }

    /// Sprite offset for a block variant. Ids must already be masked to 12
    /// bits; unknown combinations return the dummy sprite.
    #[inline]
    pub fn offset(&self, block_id: u16, block_data: u8) -> usize {
        self.block_offsets[block_id as usize * 16 + block_data as usize] as usize
    }

    #[inline]
    pub fn is_opaque(&self, offset: usize) -> bool {
        self.opacity[offset]
    }

    #[inline]
    pub fn is_opaque_block(&self, block_id: u16, block_data: u8) -> bool {
        self.opacity[self.offset(block_id, block_data)]
    }

    #[inline]
    pub fn is_transparent(&self, offset: usize) -> bool {
        self.transparency[offset]
    }

    /// The cell in [`Self::img`] holding a sprite.
    pub fn get_rect(&self, offset: usize) -> ImageRect {
        atlas_rect(offset, self.rectsize)
    }

    // Walk each sprite's three visible faces: any non-100% alpha clears the
    // opaque flag, any non-0% alpha clears the transparent flag; each scan
    // aborts as soon as both flags are decided.
    fn check_opacity_and_transparency(&mut self, b: i32) {
        self.opacity.clear();
        self.opacity.resize(NUM_BLOCK_IMAGES, true);
        self.transparency.clear();
        self.transparency.resize(NUM_BLOCK_IMAGES, true);

        let tilesize = 2 * b;
        for i in 0..NUM_BLOCK_IMAGES {
            let rect = self.get_rect(i);
            let faces: [Box<dyn Iterator<Item = FacePoint>>; 3] = [
                Box::new(FaceIterator::new(rect.x, rect.y + b, 1, tilesize)),
                Box::new(FaceIterator::new(rect.x + 2 * b, rect.y + 2 * b, -1, tilesize)),
                Box::new(TopFaceIterator::new(rect.x + 2 * b - 1, rect.y, tilesize)),
            ];
            'faces: for face in faces {
                for p in face {
                    let a = alpha(self.img.get(p.x, p.y));
                    if a < 255 {
                        self.opacity[i] = false;
                    }
                    if a > 0 {
                        self.transparency[i] = false;
                    }
                    if !self.opacity[i] && !self.transparency[i] {
                        break 'faces;
                    }
                }
            }
        }
    }

    // Nearly-transparent and nearly-opaque pixels on the visible faces get
    // pushed all the way, so an accidental 99%-transparency image edit
    // doesn't turn every block translucent (and massively slow).
    fn retouch_alphas(&mut self, b: i32) {
        let tilesize = 2 * b;
        for i in 0..NUM_BLOCK_IMAGES {
            let rect = self.get_rect(i);
            let faces: [Box<dyn Iterator<Item = FacePoint>>; 3] = [
                Box::new(FaceIterator::new(rect.x, rect.y + b, 1, tilesize)),
                Box::new(FaceIterator::new(rect.x + 2 * b, rect.y + 2 * b, -1, tilesize)),
                Box::new(TopFaceIterator::new(rect.x + 2 * b - 1, rect.y, tilesize)),
            ];
            for face in faces {
                for p in face {
                    let a = alpha(self.img.get(p.x, p.y));
                    if a < 10 {
                        set_alpha(self.img.get_mut(p.x, p.y), 0);
                    } else if a > 245 {
                        set_alpha(self.img.get_mut(p.x, p.y), 255);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgba::make_rgba;

    // synthesize a plausible set of source textures: everything opaque with
    // varied colors
    fn write_textures(dir: &Path) {
        let mut terrain = RGBAImage::new(256, 256);
        for (i, p) in terrain.data.iter_mut().enumerate() {
            *p = make_rgba((i % 200) as u8 + 30, (i / 256) as u8, 77, 255);
        }
        terrain.write_png(&dir.join("terrain.png")).unwrap();

        let mut small = RGBAImage::new(16, 16);
        for p in small.data.iter_mut() {
            *p = make_rgba(200, 100, 50, 255);
        }
        small.write_png(&dir.join("fire.png")).unwrap();
        small.write_png(&dir.join("endportal.png")).unwrap();

        let mut chest = RGBAImage::new(64, 64);
        for p in chest.data.iter_mut() {
            *p = make_rgba(120, 80, 20, 255);
        }
        chest.write_png(&dir.join("chest.png")).unwrap();
        chest.write_png(&dir.join("enderchest.png")).unwrap();

        let mut large = RGBAImage::new(128, 64);
        for p in large.data.iter_mut() {
            *p = make_rgba(120, 80, 20, 255);
        }
        large.write_png(&dir.join("largechest.png")).unwrap();
    }

    #[test]
    fn test_create_builds_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        write_textures(dir.path());
        let b = 3;
        let bi = BlockImages::create(b, dir.path()).unwrap();
        assert_eq!(bi.rectsize, 4 * b);
        assert_eq!(bi.img.w, 4 * b * 16);
        assert_eq!(bi.img.h, (NUM_BLOCK_IMAGES as i32 / 16 + 1) * 4 * b);
        assert!(dir.path().join("blocks-3.png").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("blocks-3.version")).unwrap(),
            NUM_BLOCK_IMAGES.to_string()
        );

        // the dummy sprite is transparent; a full solid block is opaque;
        // a fence post is neither
        assert!(bi.is_transparent(0));
        assert!(!bi.is_opaque(0));
        assert!(bi.is_opaque(1), "stone sprite should be opaque");
        assert!(!bi.is_transparent(1));
        assert!(!bi.is_opaque(134));
        assert!(!bi.is_transparent(134));

        // offsets flow through to the flags
        assert!(bi.is_opaque_block(1, 0));
        assert_eq!(bi.offset(8, 0), 8);
        assert_eq!(bi.offset(0, 0), 0);

        // a second create loads the cached atlas and agrees
        let bi2 = BlockImages::create(b, dir.path()).unwrap();
        assert_eq!(bi.img, bi2.img);
    }

    #[test]
    fn test_create_fails_without_textures() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BlockImages::create(3, dir.path()).is_err());
    }

    #[test]
    fn test_old_version_sprites_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        write_textures(dir.path());
        let b = 2;
        let rectsize = 4 * b;
        let bi = BlockImages::create(b, dir.path()).unwrap();

        // fake an atlas from back when there were only 157 sprites, with
        // custom art in sprite 1's cell
        let old_h = (157 / 16 + 1) * rectsize;
        let mut old = RGBAImage::new(rectsize * 16, old_h);
        blit(
            &bi.img,
            ImageRect::new(0, 0, rectsize * 16, old_h),
            &mut old,
            0,
            0,
        );
        let rect = bi.get_rect(1);
        for y in rect.y..rect.y + rect.h {
            for x in rect.x..rect.x + rect.w {
                old.set(x, y, make_rgba(1, 2, 3, 255));
            }
        }
        old.write_png(&dir.path().join("blocks-2.png")).unwrap();
        fs::write(dir.path().join("blocks-2.version"), "157").unwrap();

        let rebuilt = BlockImages::create(b, dir.path()).unwrap();
        // the custom sprite survived the rebuild, and the new sprites exist
        assert_eq!(rebuilt.img.get(rect.x + b, rect.y + 2 * b), make_rgba(1, 2, 3, 255));
        assert_eq!(
            fs::read_to_string(dir.path().join("blocks-2.version")).unwrap(),
            NUM_BLOCK_IMAGES.to_string()
        );
        assert!(rebuilt.is_opaque(1));
        // sprite 553 (tripwire) comes from the fresh build
        assert!(!rebuilt.is_opaque(553));
    }
}
