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

//! Pixel walkers for the three faces of a block cell. Source rectangles and
//! destination parallelograms are visited in the same column-major order,
//! so a source walker zipped with a destination walker copies one face.

/// One visited pixel; `pos` is the position within the walk, used by the
/// partial-face drawing routines to cut faces up.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FacePoint {
    pub x: i32,
    pub y: i32,
    pub pos: i32,
}

/// Walks a `size`-column parallelogram, skewing the y-coord by `delta_y`
/// every two columns: -1 or 1 for the upright faces, 0 for a plain square
/// source rectangle.
pub struct FaceIterator {
    x: i32,
    y: i32,
    pos: i32,
    size: i32,
    delta_y: i32,
}

impl FaceIterator {
    pub fn new(xstart: i32, ystart: i32, delta_y: i32, size: i32) -> Self {
        Self {
            x: xstart,
            y: ystart,
            pos: 0,
            size,
            delta_y,
        }
    }
}

impl Iterator for FaceIterator {
    type Item = FacePoint;

    fn next(&mut self) -> Option<FacePoint> {
        if self.pos >= self.size * self.size {
            return None;
        }
        let out = FacePoint {
            x: self.x,
            y: self.y,
            pos: self.pos,
        };
        self.pos += 1;
        self.y += 1;
        if self.pos % self.size == 0 {
            self.x += 1;
            self.y -= self.size;
            if self.pos % (2 * self.size) == self.size {
                self.y += self.delta_y;
            }
        }
        Some(out)
    }
}

/// Like [`FaceIterator`] with no skew, but with the source rotated and/or
/// X-flipped. rot: 0 = down then right; 1 = left then down; 2 = up then
/// left; 3 = right then up.
pub struct RotatedFaceIterator {
    x: i32,
    y: i32,
    pos: i32,
    size: i32,
    dx1: i32,
    dy1: i32,
    dx2: i32,
    dy2: i32,
}

impl RotatedFaceIterator {
    pub fn new(xstart: i32, ystart: i32, rot: i32, size: i32, flip_x: bool) -> Self {
        let (x, y, dx1, dy1, dx2, dy2) = match rot {
            0 => (
                if flip_x { xstart + size - 1 } else { xstart },
                ystart,
                0,
                1,
                if flip_x { -1 } else { 1 },
                0,
            ),
            1 => (
                if flip_x { xstart } else { xstart + size - 1 },
                ystart,
                if flip_x { 1 } else { -1 },
                0,
                0,
                1,
            ),
            2 => (
                if flip_x { xstart } else { xstart + size - 1 },
                ystart + size - 1,
                0,
                -1,
                if flip_x { 1 } else { -1 },
                0,
            ),
            _ => (
                if flip_x { xstart + size - 1 } else { xstart },
                ystart + size - 1,
                if flip_x { -1 } else { 1 },
                0,
                0,
                -1,
            ),
        };
        Self {
            x,
            y,
            pos: 0,
            size,
            dx1,
            dy1,
            dx2,
            dy2,
        }
    }
}

impl Iterator for RotatedFaceIterator {
    type Item = FacePoint;

    fn next(&mut self) -> Option<FacePoint> {
        if self.pos >= self.size * self.size {
            return None;
        }
        let out = FacePoint {
            x: self.x,
            y: self.y,
            pos: self.pos,
        };
        self.pos += 1;
        self.x += self.dx1;
        self.y += self.dy1;
        if self.pos % self.size == 0 {
            self.x += self.dx2;
            self.y += self.dy2;
            self.x -= self.dx1 * self.size;
            self.y -= self.dy1 * self.size;
        }
        Some(out)
    }
}

/// Walks the top (U) face of a block, whose columns zigzag down-left across
/// the rhombus.
pub struct TopFaceIterator {
    x: i32,
    y: i32,
    pos: i32,
    size: i32,
}

impl TopFaceIterator {
    pub fn new(xstart: i32, ystart: i32, size: i32) -> Self {
        Self {
            x: xstart,
            y: ystart,
            pos: 0,
            size,
        }
    }
}

impl Iterator for TopFaceIterator {
    type Item = FacePoint;

    fn next(&mut self) -> Option<FacePoint> {
        if self.pos >= self.size * self.size {
            return None;
        }
        let out = FacePoint {
            x: self.x,
            y: self.y,
            pos: self.pos,
        };
        let size = self.size;
        if (self.pos / size) % 2 == 0 {
            let m = self.pos % size;
            if m == size - 1 {
                self.x += size - 1;
                self.y -= size / 2;
            } else if m == size - 2 {
                self.y += 1;
            } else if m % 2 == 0 {
                self.x -= 1;
                self.y += 1;
            } else {
                self.x -= 1;
            }
        } else {
            let m = self.pos % size;
            if m == 0 {
                self.y += 1;
            } else if m == size - 1 {
                self.x += size - 1;
                self.y -= size / 2 - 1;
            } else if m % 2 == 0 {
                self.x -= 1;
                self.y += 1;
            } else {
                self.x -= 1;
            }
        }
        self.pos += 1;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_face_iterator_counts_and_skew() {
        for size in [4, 6, 8] {
            let pts: Vec<FacePoint> = FaceIterator::new(0, 0, 1, size).collect();
            assert_eq!(pts.len(), (size * size) as usize);
            // first column runs straight down
            for i in 0..size {
                assert_eq!((pts[i as usize].x, pts[i as usize].y), (0, i));
            }
            // second column is skewed down by one
            assert_eq!((pts[size as usize].x, pts[size as usize].y), (1, 1));
            // positions are sequential
            for (i, pt) in pts.iter().enumerate() {
                assert_eq!(pt.pos, i as i32);
            }
        }
    }

    #[test]
    fn test_face_iterator_no_skew_covers_square() {
        let size = 6;
        let pts: HashSet<(i32, i32)> = FaceIterator::new(0, 0, 0, size)
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(pts.len(), (size * size) as usize);
        for x in 0..size {
            for y in 0..size {
                assert!(pts.contains(&(x, y)));
            }
        }
    }

    #[test]
    fn test_rotated_face_iterator_covers_square_every_way() {
        let size = 6;
        for rot in 0..4 {
            for flip in [false, true] {
                let pts: HashSet<(i32, i32)> =
                    RotatedFaceIterator::new(0, 0, rot, size, flip)
                        .map(|p| (p.x, p.y))
                        .collect();
                assert_eq!(pts.len(), (size * size) as usize, "rot {} flip {}", rot, flip);
                for x in 0..size {
                    for y in 0..size {
                        assert!(pts.contains(&(x, y)));
                    }
                }
            }
        }
    }

    #[test]
    fn test_rotated_matches_plain_for_identity() {
        let size = 8;
        let a: Vec<(i32, i32)> = FaceIterator::new(3, 5, 0, size).map(|p| (p.x, p.y)).collect();
        let b: Vec<(i32, i32)> = RotatedFaceIterator::new(3, 5, 0, size, false)
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rotation_one_turns_columns_into_rows() {
        let size = 4;
        let pts: Vec<(i32, i32)> = RotatedFaceIterator::new(0, 0, 1, size, false)
            .map(|p| (p.x, p.y))
            .collect();
        // first "column" of the rotated walk reads the top row right-to-left
        assert_eq!(&pts[0..4], &[(3, 0), (2, 0), (1, 0), (0, 0)]);
        assert_eq!(pts[4], (3, 1));
    }

    #[test]
    fn test_top_face_iterator_stays_in_cell() {
        // the U face walk must stay within the 4B x 2B rhombus area of the
        // cell: x in [-(2B-1), 2B], y in [0, 2B)
        for b in [2, 3, 5, 8] {
            let size = 2 * b;
            let pts: Vec<FacePoint> = TopFaceIterator::new(0, 0, size).collect();
            assert_eq!(pts.len(), (size * size) as usize);
            let unique: HashSet<(i32, i32)> = pts.iter().map(|p| (p.x, p.y)).collect();
            assert_eq!(unique.len(), pts.len(), "B = {}", b);
            for p in &pts {
                assert!(p.x >= -(size - 1) && p.x <= size, "B = {} point {:?}", b, p);
                assert!(p.y >= 0 && p.y < size, "B = {} point {:?}", b, p);
            }
        }
    }
}
