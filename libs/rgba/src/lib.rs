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
use anyhow::{anyhow, Result};
use std::{fs, path::Path};

/// A packed RGBA pixel: red in the low byte, alpha in the high byte.
pub type RGBAPixel = u32;

#[inline]
pub fn make_rgba(r: u8, g: u8, b: u8, a: u8) -> RGBAPixel {
    ((a as u32) << 24) | ((b as u32) << 16) | ((g as u32) << 8) | r as u32
}

#[inline]
pub fn alpha(p: RGBAPixel) -> u32 {
    (p >> 24) & 0xff
}

#[inline]
pub fn blue(p: RGBAPixel) -> u32 {
    (p >> 16) & 0xff
}

#[inline]
pub fn green(p: RGBAPixel) -> u32 {
    (p >> 8) & 0xff
}

#[inline]
pub fn red(p: RGBAPixel) -> u32 {
    p & 0xff
}

#[inline]
pub fn set_alpha(p: &mut RGBAPixel, a: u32) {
    *p = (*p & 0x00ff_ffff) | ((a & 0xff) << 24);
}

/// A rectangle within an image, in pixel units.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl ImageRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// An owned W x H buffer of packed RGBA pixels.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RGBAImage {
    pub w: i32,
    pub h: i32,
    pub data: Vec<RGBAPixel>,
}

impl RGBAImage {
    pub fn new(w: i32, h: i32) -> Self {
        Self {
            w,
            h,
            data: vec![0; (w * h) as usize],
        }
    }

    /// Resize the buffer and clear it to fully transparent.
    pub fn create(&mut self, w: i32, h: i32) {
        self.w = w;
        self.h = h;
        self.data.clear();
        self.data.resize((w * h) as usize, 0);
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> RGBAPixel {
        self.data[(y * self.w + x) as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> &mut RGBAPixel {
        &mut self.data[(y * self.w + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, p: RGBAPixel) {
        self.data[(y * self.w + x) as usize] = p;
    }

    /// Read an RGBA8 PNG into this buffer, replacing its contents.
    pub fn read_png(&mut self, path: &Path) -> Result<()> {
        let img = image::open(path)?;
        let rgba = match img {
            image::DynamicImage::ImageRgba8(rgba) => rgba,
            _ => return Err(anyhow!("{}: not an RGBA8 PNG", path.display())),
        };
        self.w = rgba.width() as i32;
        self.h = rgba.height() as i32;
        self.data.clear();
        self.data.reserve((self.w * self.h) as usize);
        for px in rgba.pixels() {
            let [r, g, b, a] = px.0;
            self.data.push(make_rgba(r, g, b, a));
        }
        Ok(())
    }

    /// Write the buffer as an RGBA8 PNG. If the first attempt fails because
    /// the parent directory is missing, create it and try again.
    pub fn write_png(&self, path: &Path) -> Result<()> {
        let mut bytes = Vec::with_capacity(self.data.len() * 4);
        for &p in &self.data {
            bytes.extend_from_slice(&[red(p) as u8, green(p) as u8, blue(p) as u8, alpha(p) as u8]);
        }
        let save = |b: &[u8]| {
            image::save_buffer(
                path,
                b,
                self.w as u32,
                self.h as u32,
                image::ColorType::Rgba8,
            )
        };
        if let Err(first) = save(&bytes) {
            let parent = path.parent().ok_or_else(|| anyhow!("{}: no parent directory", path.display()))?;
            if parent.as_os_str().is_empty() || parent.exists() {
                return Err(first.into());
            }
            fs::create_dir_all(parent)?;
            save(&bytes)?;
        }
        Ok(())
    }
}

fn fullblend(dest: &mut RGBAPixel, source: RGBAPixel) {
    // get sa and sainv in the range 1-256; this way, the possible results of
    // blending 8-bit color channels sc and dc (using sc*sa + dc*sainv) span
    // the range 0x0000-0xffff, so we can just truncate and shift
    let sa = (alpha(source) + 1) as u64;
    let sainv = 257 - sa;
    // compute the new RGB channels
    let d = *dest as u64;
    let s = source as u64;
    let d = ((d << 16) & 0xff_0000_0000) | ((d << 8) & 0xff_0000) | (d & 0xff);
    let s = ((s << 16) & 0xff_0000_0000) | ((s << 8) & 0xff_0000) | (s & 0xff);
    let newrgb = s * sa + d * sainv;
    // compute the new alpha channel
    let dainv = (256 - alpha(*dest)) as u64;
    let newa = sainv * dainv; // result is from 1-0x10000
    let newa = (newa - 1) >> 8; // result is from 0-0xff
    let newa = 255 - newa; // if either input was 255, so is this; opacity is preserved
    *dest = ((newa as u32) << 24)
        | (((newrgb >> 24) & 0xff_0000) | ((newrgb >> 16) & 0xff00) | ((newrgb >> 8) & 0xff)) as u32;
}

// if the destination pixel is already 100% opaque, there's no need to
// calculate its new alpha
fn opaqueblend(dest: &mut RGBAPixel, source: RGBAPixel) {
    let sa = (alpha(source) + 1) as u64;
    let sainv = 257 - sa;
    let d = *dest as u64;
    let s = source as u64;
    let d = ((d << 16) & 0xff_0000_0000) | ((d << 8) & 0xff_0000) | (d & 0xff);
    let s = ((s << 16) & 0xff_0000_0000) | ((s << 8) & 0xff_0000) | (s & 0xff);
    let newrgb = s * sa + d * sainv;
    *dest = 0xff00_0000
        | (((newrgb >> 24) & 0xff_0000) | ((newrgb >> 16) & 0xff00) | ((newrgb >> 8) & 0xff)) as u32;
}

/// Alpha-blend a source pixel onto a destination pixel.
///
/// The alpha channel of the result is not computed the same way as the RGB
/// channels: instead of interpolating between the source and dest alphas, it
/// is the inverse product of their inverses, so drawing a translucent pixel
/// on top of an opaque one leaves the result opaque.
#[inline]
pub fn blend(dest: &mut RGBAPixel, source: RGBAPixel) {
    // if source is transparent, there's nothing to do
    if source <= 0xff_ffff {
        // nothing
    } else if source >= 0xff00_0000 || *dest <= 0xff_ffff {
        // if source is opaque, or destination is transparent, just copy it over
        *dest = source;
    } else if *dest >= 0xff00_0000 {
        opaqueblend(dest, source);
    } else {
        fullblend(dest, source);
    }
}

/// Alpha-blend a source rect onto a same-sized destination rect, clipping
/// silently at all four image boundaries.
pub fn alphablit(source: &RGBAImage, srect: ImageRect, dest: &mut RGBAImage, dxstart: i32, dystart: i32) {
    let ybegin = 0.max(-srect.y).max(-dystart);
    let yend = srect.h.min(source.h - srect.y).min(dest.h - dystart);
    let xbegin = 0.max(-srect.x).max(-dxstart);
    let xend = srect.w.min(source.w - srect.x).min(dest.w - dxstart);
    for yoff in ybegin..yend {
        for xoff in xbegin..xend {
            blend(
                dest.get_mut(dxstart + xoff, dystart + yoff),
                source.get(srect.x + xoff, srect.y + yoff),
            );
        }
    }
}

/// Overwrite-copy a source rect onto a same-sized destination rect, with the
/// same silent clipping as [`alphablit`].
pub fn blit(source: &RGBAImage, srect: ImageRect, dest: &mut RGBAImage, dxstart: i32, dystart: i32) {
    let ybegin = 0.max(-srect.y).max(-dystart);
    let yend = srect.h.min(source.h - srect.y).min(dest.h - dystart);
    let xbegin = 0.max(-srect.x).max(-dxstart);
    let xend = srect.w.min(source.w - srect.x).min(dest.w - dxstart);
    for yoff in ybegin..yend {
        for xoff in xbegin..xend {
            dest.set(
                dxstart + xoff,
                dystart + yoff,
                source.get(srect.x + xoff, srect.y + yoff),
            );
        }
    }
}

/// Average the source image 2x2 into a destination rect half its size.
/// Does nothing if the rect isn't exactly half the size of the source.
pub fn reduce_half(dest: &mut RGBAImage, drect: ImageRect, source: &RGBAImage) {
    if source.w != drect.w * 2 || source.h != drect.h * 2 {
        return;
    }
    let mut sy = 0;
    for dy in drect.y..drect.y + drect.h {
        let mut sx = 0;
        for dx in drect.x..drect.x + drect.w {
            // shift each channel down before summing so the four addends
            // can't carry into a neighboring channel
            let p1 = (source.get(sx, sy) >> 2) & 0x3f3f_3f3f;
            let p2 = (source.get(sx + 1, sy) >> 2) & 0x3f3f_3f3f;
            let p3 = (source.get(sx, sy + 1) >> 2) & 0x3f3f_3f3f;
            let p4 = (source.get(sx + 1, sy + 1) >> 2) & 0x3f3f_3f3f;
            dest.set(dx, dy, p1 + p2 + p3 + p4);
            sx += 2;
        }
        sy += 2;
    }
}

/// Nearest-neighbor copy of a source rect into a destination rect of possibly
/// different size. Only used for atlas construction; quality is what it is.
pub fn resize(source: &RGBAImage, srect: ImageRect, dest: &mut RGBAImage, drect: ImageRect) {
    for y in drect.y..drect.y + drect.h {
        let ypct = (y - drect.y) as f32 / (drect.h - 1) as f32;
        let yoff = (ypct * (srect.h - 1) as f32) as i32;
        for x in drect.x..drect.x + drect.w {
            let xpct = (x - drect.x) as f32 / (drect.w - 1) as f32;
            let xoff = (xpct * (srect.w - 1) as f32) as i32;
            dest.set(x, y, source.get(srect.x + xoff, srect.y + yoff));
        }
    }
}

/// Darken a pixel by multiplying its RGB components by factors in [0,1].
#[inline]
pub fn darken(dest: &mut RGBAPixel, r: f64, g: f64, b: f64) {
    let newr = (r * red(*dest) as f64) as u8;
    let newg = (g * green(*dest) as f64) as u8;
    let newb = (b * blue(*dest) as f64) as u8;
    *dest = make_rgba(newr, newg, newb, alpha(*dest) as u8);
}

/// Darken every pixel in a rect.
pub fn darken_rect(img: &mut RGBAImage, rect: ImageRect, r: f64, g: f64, b: f64) {
    for y in rect.y..rect.y + rect.h {
        for x in rect.x..rect.x + rect.w {
            darken(img.get_mut(x, y), r, g, b);
        }
    }
}

/// Mirror a rect horizontally in place.
pub fn flip_x(img: &mut RGBAImage, rect: ImageRect) {
    for y in rect.y..rect.y + rect.h {
        for i in 0..rect.w / 2 {
            let a = img.get(rect.x + i, y);
            let b = img.get(rect.x + rect.w - 1 - i, y);
            img.set(rect.x + i, y, b);
            img.set(rect.x + rect.w - 1 - i, y, a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_accessors() {
        let p = make_rgba(1, 2, 3, 4);
        assert_eq!(red(p), 1);
        assert_eq!(green(p), 2);
        assert_eq!(blue(p), 3);
        assert_eq!(alpha(p), 4);
        let mut p = p;
        set_alpha(&mut p, 255);
        assert_eq!(alpha(p), 255);
        assert_eq!(red(p), 1);
    }

    #[test]
    fn test_blend_early_outs() {
        // transparent source leaves dest alone
        let mut d = make_rgba(10, 20, 30, 128);
        blend(&mut d, make_rgba(99, 99, 99, 0));
        assert_eq!(d, make_rgba(10, 20, 30, 128));
        // opaque source replaces dest
        blend(&mut d, make_rgba(1, 2, 3, 255));
        assert_eq!(d, make_rgba(1, 2, 3, 255));
        // any source replaces a transparent dest
        let mut d = 0;
        blend(&mut d, make_rgba(5, 6, 7, 100));
        assert_eq!(d, make_rgba(5, 6, 7, 100));
    }

    #[test]
    fn test_blend_preserves_opacity() {
        // translucent over opaque stays opaque
        let mut d = make_rgba(100, 100, 100, 255);
        blend(&mut d, make_rgba(200, 200, 200, 128));
        assert_eq!(alpha(d), 255);
        // the color channels moved toward the source
        assert!(red(d) > 100 && red(d) < 200);
    }

    #[test]
    fn test_blend_alpha_is_inverse_product() {
        // half over half: 1 - 0.5*0.5 = 0.75ish
        let mut d = make_rgba(0, 0, 0, 128);
        blend(&mut d, make_rgba(255, 255, 255, 128));
        let a = alpha(d);
        assert!((190..=193).contains(&a), "alpha was {}", a);
    }

    #[test]
    fn test_reduce_half_averages() {
        let mut src = RGBAImage::new(2, 2);
        src.set(0, 0, make_rgba(0, 0, 0, 255));
        src.set(1, 0, make_rgba(0, 0, 0, 255));
        src.set(0, 1, make_rgba(100, 100, 100, 255));
        src.set(1, 1, make_rgba(100, 100, 100, 255));
        let mut dest = RGBAImage::new(1, 1);
        reduce_half(&mut dest, ImageRect::new(0, 0, 1, 1), &src);
        let p = dest.get(0, 0);
        assert_eq!(alpha(p), 252); // 4 * (255 >> 2)
        assert_eq!(red(p), 50);
    }

    #[test]
    fn test_reduce_half_size_mismatch_is_noop() {
        let src = RGBAImage::new(3, 3);
        let mut dest = RGBAImage::new(1, 1);
        dest.set(0, 0, 0xdead_beef);
        reduce_half(&mut dest, ImageRect::new(0, 0, 1, 1), &src);
        assert_eq!(dest.get(0, 0), 0xdead_beef);
    }

    #[test]
    fn test_blit_clips_silently() {
        let mut src = RGBAImage::new(4, 4);
        for p in src.data.iter_mut() {
            *p = make_rgba(9, 9, 9, 255);
        }
        let mut dest = RGBAImage::new(4, 4);
        // blit partially off every edge; must not panic
        blit(&src, ImageRect::new(0, 0, 4, 4), &mut dest, -2, -2);
        blit(&src, ImageRect::new(0, 0, 4, 4), &mut dest, 3, 3);
        assert_eq!(dest.get(0, 0), make_rgba(9, 9, 9, 255));
        assert_eq!(dest.get(3, 3), make_rgba(9, 9, 9, 255));
        assert_eq!(dest.get(2, 0), 0);
    }

    #[test]
    fn test_darken() {
        let mut p = make_rgba(100, 200, 50, 77);
        darken(&mut p, 0.5, 0.5, 0.5);
        assert_eq!(p, make_rgba(50, 100, 25, 77));
    }

    #[test]
    fn test_flip_x() {
        let mut img = RGBAImage::new(3, 1);
        img.set(0, 0, 1);
        img.set(1, 0, 2);
        img.set(2, 0, 3);
        flip_x(&mut img, ImageRect::new(0, 0, 3, 1));
        assert_eq!(img.data, vec![3, 2, 1]);
    }

    #[test]
    fn test_png_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("t.png");
        let mut img = RGBAImage::new(17, 9);
        for (i, p) in img.data.iter_mut().enumerate() {
            let i = i as u32;
            *p = make_rgba(
                (i * 7 % 256) as u8,
                (i * 13 % 256) as u8,
                (i * 29 % 256) as u8,
                (i * 31 % 256) as u8,
            );
        }
        img.write_png(&path)?;
        let mut img2 = RGBAImage::default();
        img2.read_png(&path)?;
        assert_eq!(img, img2);
        Ok(())
    }

    #[test]
    fn test_png_write_creates_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("0/1/2/t.png");
        let img = RGBAImage::new(2, 2);
        img.write_png(&path)?;
        assert!(path.exists());
        Ok(())
    }
}
