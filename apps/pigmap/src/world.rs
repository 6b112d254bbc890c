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

//! World scanning: walking a world's region or chunk files (or an update
//! list naming some of them) and marking everything they touch as required
//! in the tables.

use anyhow::{bail, Context, Result};
use log::{error, warn};
use mapgeom::{ChunkIdx, MapParams, RegionIdx};
use rayon::prelude::*;
use std::{fs, path::Path};
use tables::{ChunkTable, PosChunkIdx, PosRegionIdx, PosTileIdx, RegionTable, TileTable};
use worldio::{ReadOutcome, RegionFile};

/// Whether an update list could be applied, or needs a bigger map first.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScanOutcome {
    Ok,
    /// Some implied tile doesn't fit at the current baseZoom.
    ZoomTooSmall,
}

/// A world is in region format iff it has a region subdirectory.
pub fn detect_region_format(inputpath: &Path) -> bool {
    inputpath.join("region").is_dir()
}

pub struct ScanCounts {
    pub reqchunkcount: i64,
    pub reqregioncount: i64,
    pub reqtilecount: i64,
}

// Mark one chunk and the tiles it can touch. Returns false (without
// touching anything) when baseZoom is fixed and too small for a tile.
fn mark_chunk(
    ci: ChunkIdx,
    chunktable: &mut ChunkTable,
    tiletable: &mut TileTable,
    mp: &mut MapParams,
    find_base_zoom: bool,
    reqchunkcount: &mut i64,
) -> bool {
    let pci = PosChunkIdx::from(ci);
    if !pci.valid() {
        warn!("ignoring extremely-distant chunk {} (world may be corrupt)", ci.to_file_name());
        return true;
    }
    chunktable.set_required(pci);
    *reqchunkcount += 1;
    for tile in ci.get_tiles(mp) {
        // first the fixed-size table range...
        let pti = PosTileIdx::from(tile);
        if !pti.valid() {
            warn!("ignoring extremely-distant tile {} (world may be corrupt)", tile);
            continue;
        }
        tiletable.set_required(pti);
        // ...then the map range, which can grow if we're choosing baseZoom
        if !tile.valid(mp) {
            if find_base_zoom {
                while !tile.valid(mp) {
                    mp.base_zoom += 1;
                }
            } else {
                error!("baseZoom too small!  can't fit tile {}", tile);
                return false;
            }
        }
    }
    true
}

// Read region headers (in parallel) and hand back each region's contained
// chunks.
fn scan_region_headers(
    names: &[String],
    inputpath: &Path,
) -> Vec<(String, RegionIdx, Option<Vec<ChunkIdx>>)> {
    names
        .par_iter()
        .filter_map(|name| {
            let ri = RegionIdx::from_file_path(name)?;
            let mut reader = RegionFile::new();
            let mut chunks = Vec::new();
            let contents = match reader.contained_chunks(ri, inputpath, &mut chunks) {
                ReadOutcome::Ok => Some(chunks),
                _ => None,
            };
            Some((name.clone(), ri, contents))
        })
        .collect()
}

fn region_file_names(inputpath: &Path) -> Result<Vec<String>> {
    let pattern = inputpath.join("region").join("r.*.mc[ar]");
    let pattern = pattern.to_str().context("input path is not valid UTF-8")?;
    let mut names = Vec::new();
    for entry in glob::glob(pattern)? {
        names.push(entry?.to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Full render, region format: find every region on disk, mark it and its
/// chunks required, and mark every tile those chunks touch. With baseZoom
/// unset (-1) coming in, it's grown to the smallest zoom that fits.
pub fn make_all_regions_required(
    inputpath: &Path,
    chunktable: &mut ChunkTable,
    tiletable: &mut TileTable,
    regiontable: &mut RegionTable,
    mp: &mut MapParams,
) -> Result<ScanCounts> {
    let find_base_zoom = mp.base_zoom == -1;
    if find_base_zoom {
        mp.base_zoom = 0;
    }
    let mut counts = ScanCounts {
        reqchunkcount: 0,
        reqregioncount: 0,
        reqtilecount: 0,
    };
    let names = region_file_names(inputpath)?;
    for (name, ri, contents) in scan_region_headers(&names, inputpath) {
        let pri = PosRegionIdx::from(ri);
        if !pri.valid() {
            warn!("ignoring extremely-distant region {} (world may be corrupt)", name);
            continue;
        }
        // the world may contain both .mca and .mcr files for one region
        if regiontable.is_required(pri) {
            continue;
        }
        let chunks = match contents {
            Some(chunks) => chunks,
            None => {
                warn!("can't open region {} to list chunks", name);
                continue;
            }
        };
        if chunks.is_empty() {
            continue;
        }
        regiontable.set_required(pri);
        counts.reqregioncount += 1;
        for ci in chunks {
            if !mark_chunk(
                ci,
                chunktable,
                tiletable,
                mp,
                find_base_zoom,
                &mut counts.reqchunkcount,
            ) {
                bail!("world does not fit at baseZoom {}", mp.base_zoom);
            }
        }
    }
    counts.reqtilecount = tiletable.reqcount();
    if find_base_zoom {
        println!("baseZoom set to {}", mp.base_zoom);
    }
    Ok(counts)
}

/// Full render, legacy format: walk the 64x64 subdirectory grid for chunk
/// files.
pub fn make_all_chunks_required(
    inputpath: &Path,
    chunktable: &mut ChunkTable,
    tiletable: &mut TileTable,
    mp: &mut MapParams,
) -> Result<ScanCounts> {
    let find_base_zoom = mp.base_zoom == -1;
    if find_base_zoom {
        mp.base_zoom = 0;
    }
    let mut counts = ScanCounts {
        reqchunkcount: 0,
        reqregioncount: 0,
        reqtilecount: 0,
    };
    let pattern = inputpath.join("*").join("*").join("c.*.dat");
    let pattern = pattern.to_str().context("input path is not valid UTF-8")?;
    for entry in glob::glob(pattern)? {
        let path = entry?;
        let Some(ci) = ChunkIdx::from_file_path(&path.to_string_lossy()) else {
            continue;
        };
        if !mark_chunk(
            ci,
            chunktable,
            tiletable,
            mp,
            find_base_zoom,
            &mut counts.reqchunkcount,
        ) {
            bail!("world does not fit at baseZoom {}", mp.base_zoom);
        }
    }
    counts.reqtilecount = tiletable.reqcount();
    if find_base_zoom {
        println!("baseZoom set to {}", mp.base_zoom);
    }
    Ok(counts)
}

/// Incremental render: a text file naming modified regions, one per line.
/// Marks them, their contained chunks, and the touched tiles required.
pub fn read_regionlist(
    regionlist: &Path,
    inputpath: &Path,
    chunktable: &mut ChunkTable,
    tiletable: &mut TileTable,
    regiontable: &mut RegionTable,
    mp: &MapParams,
    counts: &mut ScanCounts,
) -> Result<ScanOutcome> {
    let text = fs::read_to_string(regionlist)
        .with_context(|| format!("couldn't open regionlist {}", regionlist.display()))?;
    let mut reader = RegionFile::new();
    let mut mp_fixed = *mp;
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let Some(ri) = RegionIdx::from_file_path(line) else {
            continue;
        };
        let pri = PosRegionIdx::from(ri);
        if !pri.valid() {
            warn!("ignoring extremely-distant region {} (world may be corrupt)", line);
            continue;
        }
        if regiontable.is_required(pri) {
            continue;
        }
        let mut chunks = Vec::new();
        match reader.contained_chunks(ri, inputpath, &mut chunks) {
            ReadOutcome::Ok => {}
            _ => {
                warn!("can't open region {} to list chunks", line);
                continue;
            }
        }
        if chunks.is_empty() {
            continue;
        }
        regiontable.set_required(pri);
        counts.reqregioncount += 1;
        for ci in chunks {
            if !mark_chunk(
                ci,
                chunktable,
                tiletable,
                &mut mp_fixed,
                false,
                &mut counts.reqchunkcount,
            ) {
                return Ok(ScanOutcome::ZoomTooSmall);
            }
        }
    }
    counts.reqtilecount = tiletable.reqcount();
    Ok(ScanOutcome::Ok)
}

/// Incremental render: a text file naming modified chunks, one per line.
pub fn read_chunklist(
    chunklist: &Path,
    chunktable: &mut ChunkTable,
    tiletable: &mut TileTable,
    mp: &MapParams,
    counts: &mut ScanCounts,
) -> Result<ScanOutcome> {
    let text = fs::read_to_string(chunklist)
        .with_context(|| format!("couldn't open chunklist {}", chunklist.display()))?;
    let mut mp_fixed = *mp;
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let Some(ci) = ChunkIdx::from_file_path(line) else {
            continue;
        };
        if !mark_chunk(
            ci,
            chunktable,
            tiletable,
            &mut mp_fixed,
            false,
            &mut counts.reqchunkcount,
        ) {
            return Ok(ScanOutcome::ZoomTooSmall);
        }
    }
    counts.reqtilecount = tiletable.reqcount();
    Ok(ScanOutcome::Ok)
}

/// Build a procedural required set of approximately `size` chunks: a solid
/// central disk, some concentric rings, and four diagonal spokes. Used only
/// to exercise the tables, scheduler, and renderer plumbing without real
/// world data.
pub fn make_test_world(
    size: i64,
    chunktable: &mut ChunkTable,
    tiletable: &mut TileTable,
    mp: &mut MapParams,
) -> ScanCounts {
    let find_base_zoom = mp.base_zoom == -1;
    if find_base_zoom {
        mp.base_zoom = 0;
    }
    let mut counts = ScanCounts {
        reqchunkcount: 0,
        reqregioncount: 0,
        reqtilecount: 0,
    };
    let mut mark = |ci: ChunkIdx,
                    chunktable: &mut ChunkTable,
                    tiletable: &mut TileTable,
                    mp: &mut MapParams,
                    count: &mut i64| {
        chunktable.set_required(PosChunkIdx::from(ci));
        *count += 1;
        for tile in ci.get_tiles(mp) {
            tiletable.set_required(PosTileIdx::from(tile));
            while find_base_zoom && !tile.valid(mp) {
                mp.base_zoom += 1;
            }
        }
    };

    // 95% of the chunks go in a solid block at the center
    let size2 = ((size as f64 * 0.95).sqrt() / 2.0) as i64;
    for x in -size2..size2 {
        for z in -size2..size2 {
            mark(ChunkIdx::new(x, z), chunktable, tiletable, mp, &mut counts.reqchunkcount);
        }
    }
    // circles with radii up to four times the center block's radius
    for m in 2..=4 {
        let rad = size2 as f64 * m as f64;
        let mut t = -std::f64::consts::PI;
        while t < std::f64::consts::PI {
            let ci = ChunkIdx::new((t.cos() * rad) as i64, (t.sin() * rad) as i64);
            mark(ci, chunktable, tiletable, mp, &mut counts.reqchunkcount);
            t += 0.002;
        }
    }
    // spokes from the center out to the outermost circle
    let irad = size2 * 4;
    for z in -irad..irad {
        mark(ChunkIdx::new(0, z), chunktable, tiletable, mp, &mut counts.reqchunkcount);
    }
    for x in -irad..irad {
        mark(ChunkIdx::new(x, 0), chunktable, tiletable, mp, &mut counts.reqchunkcount);
    }
    for i in -irad..irad {
        mark(ChunkIdx::new(i, i), chunktable, tiletable, mp, &mut counts.reqchunkcount);
        mark(ChunkIdx::new(-i, i), chunktable, tiletable, mp, &mut counts.reqchunkcount);
    }
    counts.reqtilecount = tiletable.reqcount();
    if find_base_zoom {
        println!("baseZoom set to {}", mp.base_zoom);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::ZlibEncoder, Compression};
    use std::io::Write;

    fn zlib(bytes: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    // a minimal region file with chunks at the given offsets
    fn write_region(dir: &Path, ri: RegionIdx, offsets: &[(usize, usize)]) {
        let payload = zlib(b"data");
        let mut header = vec![0u8; 4096];
        let mut body = Vec::new();
        for (i, &(x, z)) in offsets.iter().enumerate() {
            let sector = i + 1;
            let idx = (z * 32 + x) * 4;
            header[idx..idx + 4].copy_from_slice(&(((sector as u32) << 8) | 1).to_be_bytes());
            let mut sectorbuf = vec![0u8; 4096];
            sectorbuf[0..4].copy_from_slice(&((payload.len() + 1) as u32).to_be_bytes());
            sectorbuf[4] = 2;
            sectorbuf[5..5 + payload.len()].copy_from_slice(&payload);
            body.extend_from_slice(&sectorbuf);
        }
        header.extend_from_slice(&body);
        fs::write(dir.join("region").join(ri.to_anvil_file_name()), header).unwrap();
    }

    #[test]
    fn test_region_scan_marks_required() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("region"))?;
        write_region(dir.path(), RegionIdx::new(0, 0), &[(0, 0), (5, 9)]);
        write_region(dir.path(), RegionIdx::new(-1, 0), &[(31, 0)]);
        // an empty region is ignored entirely
        write_region(dir.path(), RegionIdx::new(3, 3), &[]);

        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mut regiontable = RegionTable::new();
        let mut mp = MapParams::new(3, 1, -1);
        let counts = make_all_regions_required(
            dir.path(),
            &mut chunktable,
            &mut tiletable,
            &mut regiontable,
            &mut mp,
        )?;
        assert_eq!(counts.reqregioncount, 2);
        assert_eq!(counts.reqchunkcount, 3);
        assert!(counts.reqtilecount > 0);
        assert!(mp.base_zoom >= 0);
        assert!(detect_region_format(dir.path()));

        assert!(chunktable.is_required(PosChunkIdx::from(ChunkIdx::new(0, 0))));
        assert!(chunktable.is_required(PosChunkIdx::from(ChunkIdx::new(5, 9))));
        assert!(chunktable.is_required(PosChunkIdx::from(ChunkIdx::new(-1, 0))));
        assert!(!chunktable.is_required(PosChunkIdx::from(ChunkIdx::new(1, 1))));
        assert!(regiontable.is_required(PosRegionIdx::from(RegionIdx::new(0, 0))));
        assert!(!regiontable.is_required(PosRegionIdx::from(RegionIdx::new(3, 3))));

        // every tile touched by a required chunk is required
        for ci in [ChunkIdx::new(0, 0), ChunkIdx::new(5, 9), ChunkIdx::new(-1, 0)] {
            for ti in ci.get_tiles(&mp) {
                assert!(tiletable.is_required(PosTileIdx::from(ti)));
            }
        }
        Ok(())
    }

    #[test]
    fn test_chunk_scan_marks_required() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let chunks = [ChunkIdx::new(0, 0), ChunkIdx::new(-2, 7), ChunkIdx::new(100, -3)];
        for ci in chunks {
            let path = dir.path().join(ci.to_file_path());
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, b"gz")?;
        }
        // decoys that must be ignored
        fs::write(dir.path().join("0/0/level.dat"), b"x")?;

        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mut mp = MapParams::new(3, 1, -1);
        let counts =
            make_all_chunks_required(dir.path(), &mut chunktable, &mut tiletable, &mut mp)?;
        assert_eq!(counts.reqchunkcount, 3);
        for ci in chunks {
            assert!(chunktable.is_required(PosChunkIdx::from(ci)));
        }
        assert!(!detect_region_format(dir.path()));
        Ok(())
    }

    #[test]
    fn test_chunklist_zoom_too_small() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let listfile = dir.path().join("chunklist.txt");
        // a chunk very far out cannot fit on a zoom-1 map
        fs::write(&listfile, format!("{}\n", ChunkIdx::new(500, 500).to_file_path()))?;
        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mp = MapParams::new(3, 1, 1);
        let mut counts = ScanCounts {
            reqchunkcount: 0,
            reqregioncount: 0,
            reqtilecount: 0,
        };
        let outcome = read_chunklist(&listfile, &mut chunktable, &mut tiletable, &mp, &mut counts)?;
        assert_eq!(outcome, ScanOutcome::ZoomTooSmall);

        // the same chunk fits fine on a deep map
        let mp = MapParams::new(3, 1, 10);
        let mut counts = ScanCounts {
            reqchunkcount: 0,
            reqregioncount: 0,
            reqtilecount: 0,
        };
        let outcome = read_chunklist(&listfile, &mut chunktable, &mut tiletable, &mp, &mut counts)?;
        assert_eq!(outcome, ScanOutcome::Ok);
        assert_eq!(counts.reqchunkcount, 1);
        Ok(())
    }

    #[test]
    fn test_required_iterators_agree_with_scan() -> Result<()> {
        // the tile table must contain exactly the tiles derivable from the
        // required chunks
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("region"))?;
        write_region(dir.path(), RegionIdx::new(0, 0), &[(0, 0), (1, 0), (17, 22)]);
        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mut regiontable = RegionTable::new();
        let mut mp = MapParams::new(3, 2, 10);
        make_all_regions_required(
            dir.path(),
            &mut chunktable,
            &mut tiletable,
            &mut regiontable,
            &mut mp,
        )?;
        let mut from_chunks: Vec<_> = chunktable
            .required_chunks()
            .flat_map(|pci| pci.to_chunk_idx().get_tiles(&mp))
            .collect();
        from_chunks.sort();
        from_chunks.dedup();
        let mut from_tiles: Vec<_> =
            tiletable.required_tiles().map(|p| p.to_tile_idx()).collect();
        from_tiles.sort();
        assert_eq!(from_chunks, from_tiles);
        Ok(())
    }

    #[test]
    fn test_test_world_shape() {
        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mut mp = MapParams::new(3, 1, -1);
        let counts = make_test_world(1000, &mut chunktable, &mut tiletable, &mut mp);
        assert!(counts.reqchunkcount > 1000);
        assert!(counts.reqtilecount > 0);
        assert!(mp.base_zoom > 0);
        // center disk present
        assert!(chunktable.is_required(PosChunkIdx::from(ChunkIdx::new(0, 0))));
        // spoke tip present
        let size2 = ((1000f64 * 0.95).sqrt() / 2.0) as i64;
        assert!(chunktable.is_required(PosChunkIdx::from(ChunkIdx::new(0, size2 * 4 - 1))));
    }
}
