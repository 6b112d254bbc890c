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
mod render;
mod sched;
mod world;

use crate::{
    render::{
        render_zoom_tile, render_zoom_tile_from_cache, RenderJob, RenderStats, SceneGraph,
        ThreadOutputCache, TileCache,
    },
    sched::{assign_worker_tasks, WorkerPlan, DEFAULT_OUTPUT_BUDGET},
    world::{
        detect_region_format, make_all_chunks_required, make_all_regions_required,
        make_test_world, read_chunklist, read_regionlist, ScanCounts, ScanOutcome,
    },
};
use anyhow::{bail, Context, Result};
use blockimages::BlockImages;
use log::{error, warn};
use mapgeom::{MapParams, ZoomTileIdx};
use parking_lot::Mutex;
use rgba::{reduce_half, ImageRect, RGBAImage};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::{Instant, SystemTime},
};
use structopt::{clap::AppSettings, StructOpt};
use tables::{ChunkTable, RegionTable, TileTable};
use worldio::ChunkCache;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pigmap",
    about = "Render an isometric slippy-map tile pyramid from world data.",
    settings = &[AppSettings::DisableHelpFlags, AppSettings::DisableVersion]
)]
struct Opt {
    /// World directory to read.
    #[structopt(short = "i", parse(from_os_str))]
    inputpath: Option<PathBuf>,

    /// Map directory to write.
    #[structopt(short = "o", parse(from_os_str))]
    outputpath: Option<PathBuf>,

    /// Directory holding the block textures (and the cached blocks-B.png).
    #[structopt(short = "g", default_value = ".", parse(from_os_str))]
    imgpath: PathBuf,

    /// Incremental mode: file listing modified chunk files.
    #[structopt(short = "c", parse(from_os_str))]
    chunklist: Option<PathBuf>,

    /// Incremental mode: file listing modified region files.
    #[structopt(short = "r", parse(from_os_str))]
    regionlist: Option<PathBuf>,

    /// Block size.
    #[structopt(short = "B")]
    block_size: Option<i64>,

    /// Tile multiplier.
    #[structopt(short = "T")]
    tile_multiplier: Option<i64>,

    /// Base zoom level (omit to choose automatically).
    #[structopt(short = "Z")]
    base_zoom: Option<i32>,

    /// Number of worker threads.
    #[structopt(short = "h", default_value = "1")]
    threads: usize,

    /// Allow expanding the map when an incremental update doesn't fit.
    #[structopt(short = "x")]
    expand: bool,

    /// Directory holding the HTML template.
    #[structopt(short = "m", default_value = ".", parse(from_os_str))]
    htmlpath: PathBuf,

    /// Build a procedural test world of about this many chunks.
    #[structopt(short = "w")]
    testworldsize: Option<i64>,
}

// Adapted inline progress meter: a single percentage updated in place.
struct InlinePercentProgress {
    total: i64,
    current: i64,
    start_time: Instant,
}

impl InlinePercentProgress {
    fn new(label: &str, total: i64) -> Self {
        print!("{} 000.00%", label);
        std::io::stdout().flush().ok();
        Self {
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    fn poke_chunk(&mut self, chunk_size: i64) {
        self.current += chunk_size;
        let percent = self.current as f64 / self.total.max(1) as f64 * 100.0;
        print!(
            "\x1B[7D{:03}.{:02}%",
            percent.floor() as u32,
            ((percent - percent.floor()) * 100.0) as u32
        );
        std::io::stdout().flush().ok();
    }

    fn finish(&self) {
        println!(", completed in {:?}", self.start_time.elapsed());
    }
}

fn print_stats(seconds: u64, stats: &RenderStats) {
    println!(
        "{} chunks    {} regions   {} base tiles    {} seconds",
        stats.reqchunkcount, stats.reqregioncount, stats.reqtilecount, seconds
    );
    println!(
        "chunk cache: {} hits   {} misses",
        stats.chunkcache.hits, stats.chunkcache.misses
    );
    println!(
        "             {} read   {} skipped   {} missing   {} reqmissing   {} corrupt",
        stats.chunkcache.read,
        stats.chunkcache.skipped,
        stats.chunkcache.missing,
        stats.chunkcache.reqmissing,
        stats.chunkcache.corrupt
    );
    println!(
        "region requests: {} read   {} skipped",
        stats.regioncache.read, stats.regioncache.skipped
    );
    println!(
        "                 {} missing   {} reqmissing   {} corrupt",
        stats.regioncache.missing, stats.regioncache.reqmissing, stats.regioncache.corrupt
    );
}

struct RenderConfig {
    fullrender: bool,
    regionformat: bool,
    testmode: bool,
    mp: MapParams,
    inputpath: PathBuf,
    outputpath: PathBuf,
}

impl RenderConfig {
    fn make_job(
        &self,
        chunktable: ChunkTable,
        regiontable: RegionTable,
        tiletable: TileTable,
    ) -> RenderJob {
        let chunkcache = (!self.testmode).then(|| {
            ChunkCache::new(
                chunktable,
                regiontable,
                &self.inputpath,
                self.fullrender,
                self.regionformat,
            )
        });
        RenderJob {
            fullrender: self.fullrender,
            regionformat: self.regionformat,
            testmode: self.testmode,
            mp: self.mp,
            outputpath: self.outputpath.clone(),
            tiletable,
            chunkcache,
            tilecache: TileCache::new(&self.mp),
            scenegraph: SceneGraph::new(),
            stats: RenderStats::default(),
        }
    }
}

fn collect_cache_stats(rj: &mut RenderJob) {
    if let Some(cache) = &rj.chunkcache {
        rj.stats.chunkcache = cache.stats;
        rj.stats.regioncache = cache.regioncache.stats;
    }
}

fn run_single_thread(
    config: &RenderConfig,
    chunktable: ChunkTable,
    regiontable: RegionTable,
    tiletable: TileTable,
    blockimages: &BlockImages,
    stats: &mut RenderStats,
) -> TileTable {
    println!("single thread will render {} base tiles", stats.reqtilecount);
    let mut rj = config.make_job(chunktable, regiontable, tiletable);
    let mut topimg = RGBAImage::default();
    render_zoom_tile(&ZoomTileIdx::new(0, 0, 0), &mut rj, blockimages, &mut topimg);
    collect_cache_stats(&mut rj);
    stats.chunkcache = rj.stats.chunkcache;
    stats.regioncache = rj.stats.regioncache;
    rj.tiletable
}

struct WorkerOutput {
    stats: RenderStats,
    tiletable: TileTable,
    images: Vec<(usize, RGBAImage)>,
}

fn run_worker(
    config: &RenderConfig,
    plan: &WorkerPlan,
    chunktable: ChunkTable,
    regiontable: RegionTable,
    tiletable: TileTable,
    blockimages: &BlockImages,
    tocache_zoom: i32,
    progress: &Mutex<InlinePercentProgress>,
) -> WorkerOutput {
    let mut rj = config.make_job(chunktable, regiontable, tiletable);
    let mut images = Vec::new();
    for zti in &plan.zoomtiles {
        let mut img = RGBAImage::default();
        if render_zoom_tile(zti, &mut rj, blockimages, &mut img) {
            let idx = (zti.y * (1 << tocache_zoom) + zti.x) as usize;
            images.push((idx, img));
        }
        progress
            .lock()
            .poke_chunk(rj.tiletable.num_required(zti, &rj.mp));
    }
    collect_cache_stats(&mut rj);
    WorkerOutput {
        stats: rj.stats,
        tiletable: rj.tiletable,
        images,
    }
}

#[allow(clippy::too_many_arguments)]
fn run_multithreaded(
    config: &RenderConfig,
    chunktable: ChunkTable,
    regiontable: RegionTable,
    tiletable: TileTable,
    blockimages: &BlockImages,
    threads: usize,
    stats: &mut RenderStats,
) -> TileTable {
    // divide the required tiles evenly: find a zoom level with enough
    // tiles for a balanced assignment, then give each worker some of them
    let (worker_zoom, plans) =
        assign_worker_tasks(&tiletable, &config.mp, threads, DEFAULT_OUTPUT_BUDGET);
    for (i, plan) in plans.iter().enumerate() {
        println!("thread {} will render {} base tiles", i, plan.cost);
    }

    let progress = Mutex::new(InlinePercentProgress::new(
        "rendering tiles:",
        stats.reqtilecount,
    ));

    // each worker renders from its own deep copy of the tables; outputs
    // come back through the join
    let outputs: Vec<WorkerOutput> = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = plans
            .iter()
            .map(|plan| {
                let chunktable = chunktable.clone();
                let regiontable = regiontable.clone();
                let tiletable = tiletable.clone();
                let progress = &progress;
                s.spawn(move |_| {
                    run_worker(
                        config,
                        plan,
                        chunktable,
                        regiontable,
                        tiletable,
                        blockimages,
                        worker_zoom,
                        progress,
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker thread panicked"))
            .collect()
    })
    .expect("worker scope failed");
    progress.lock().finish();

    // gather the workers' zoom tiles into the dense output cache, and
    // combine their stats
    let mut tocache = ThreadOutputCache::new(worker_zoom);
    let mut worker_tables = Vec::new();
    for output in outputs {
        stats.chunkcache += output.stats.chunkcache;
        stats.regioncache += output.stats.regioncache;
        for (idx, img) in output.images {
            tocache.images[idx] = img;
            tocache.used[idx] = true;
        }
        worker_tables.push(output.tiletable);
    }

    // now that the workers are done, finish the zoom levels above their
    // partition on this thread; no chunk data is touched up here
    println!("finishing top zoom levels...");
    let mut rj = RenderJob {
        fullrender: config.fullrender,
        regionformat: config.regionformat,
        testmode: config.testmode,
        mp: config.mp,
        outputpath: config.outputpath.clone(),
        tiletable,
        chunkcache: None,
        tilecache: TileCache::new(&config.mp),
        scenegraph: SceneGraph::new(),
        stats: RenderStats::default(),
    };
    let mut topimg = RGBAImage::default();
    render_zoom_tile_from_cache(&ZoomTileIdx::new(0, 0, 0), &mut rj, &mut topimg, &tocache);
    let mut tiletable = rj.tiletable;

    // merge the workers' drawn bits for the double-check
    for wt in worker_tables {
        let drawn: Vec<_> = tiletable
            .required_tiles()
            .filter(|&pti| wt.is_drawn(pti))
            .collect();
        for pti in drawn {
            tiletable.set_drawn(pti);
        }
    }
    tiletable
}

/// Grow an existing map by one zoom level: the old map becomes the central
/// quadrant of the new one, every old tile moving one level deeper.
fn expand_map(outputpath: &Path) -> Result<()> {
    let mp = MapParams::read_file(outputpath).context("pigmap.params missing or corrupt")?;
    let size = mp.tile_size() as i32;
    let half = size / 2;

    // each old quadrant becomes the inner quadrant of the matching new
    // one: old "0" is the new "0/3", old "1" the new "1/2", and so on
    let renames = [("0", "3"), ("1", "2"), ("2", "1"), ("3", "0")];
    for (outer, inner) in renames {
        let olddir = outputpath.join(outer);
        let tmpdir = outputpath.join(format!("old{}", outer));
        if olddir.exists() {
            fs::rename(&olddir, &tmpdir)?;
        }
        fs::create_dir_all(outputpath.join(outer))?;
        if tmpdir.exists() {
            fs::rename(&tmpdir, outputpath.join(outer).join(inner))?;
        }
        let oldpng = outputpath.join(format!("{}.png", outer));
        if oldpng.exists() {
            fs::rename(&oldpng, outputpath.join(outer).join(format!("{}.png", inner)))?;
        }
    }

    // build the new zoom 1 tiles: each holds a shrunk copy of the old one
    // in its inner quadrant
    let quadrants = [(half, half), (0, half), (half, 0), (0, 0)];
    let mut newimgs: [Option<RGBAImage>; 4] = [None, None, None, None];
    for (i, (outer, inner)) in renames.iter().enumerate() {
        let oldfile = outputpath.join(outer).join(format!("{}.png", inner));
        let mut oldimg = RGBAImage::default();
        if oldimg.read_png(&oldfile).is_err() {
            continue;
        }
        let mut newimg = RGBAImage::new(size, size);
        let (x, y) = quadrants[i];
        reduce_half(&mut newimg, ImageRect::new(x, y, half, half), &oldimg);
        newimg.write_png(&outputpath.join(format!("{}.png", outer)))?;
        newimgs[i] = Some(newimg);
    }

    // and a new base tile from the new zoom 1 tiles
    let mut newbase = RGBAImage::new(size, size);
    let base_quadrants = [(0, 0), (half, 0), (0, half), (half, half)];
    for (i, img) in newimgs.iter().enumerate() {
        if let Some(img) = img {
            let (x, y) = base_quadrants[i];
            reduce_half(&mut newbase, ImageRect::new(x, y, half, half), img);
        }
    }
    newbase.write_png(&outputpath.join("base.png"))?;

    let mut newmp = mp;
    newmp.base_zoom += 1;
    newmp.write_file(outputpath)?;

    // touch every tile: many new tiles share filenames with old tiles but
    // would otherwise carry older timestamps, confusing browser caches
    let pattern = outputpath.join("**").join("*.png");
    if let Some(pattern) = pattern.to_str() {
        let now = SystemTime::now();
        for entry in glob::glob(pattern)?.flatten() {
            if let Ok(f) = fs::File::options().append(true).open(&entry) {
                f.set_modified(now).ok();
            }
        }
    }

    Ok(())
}

/// Substitute the map parameters into the HTML template and drop it next
/// to the tiles, along with the stylesheet. A missing template is fine.
fn write_html(mp: &MapParams, outputpath: &Path, htmlpath: &Path) {
    let template = match fs::read_to_string(htmlpath.join("template.html")) {
        Ok(text) => text,
        Err(_) => return,
    };
    let text = template
        .replace("{tileSize}", &mp.tile_size().to_string())
        .replace("{B}", &mp.b.to_string())
        .replace("{T}", &mp.t.to_string())
        .replace("{baseZoom}", &mp.base_zoom.to_string());
    if let Err(e) = fs::write(outputpath.join("pigmap-default.html"), text) {
        warn!("can't write pigmap-default.html: {}", e);
    }
    if fs::copy(htmlpath.join("style.css"), outputpath.join("style.css")).is_err() {
        warn!("can't copy style.css into the output path");
    }
}

fn validate_common(opt: &Opt) -> Result<()> {
    // an upper thread limit is arbitrary, but you'd need a truly insanely
    // large map to benefit from more
    if opt.threads < 1 || opt.threads > 64 {
        bail!("-h must be in range 1-64");
    }
    if opt.imgpath.as_os_str().is_empty() {
        bail!("must provide non-empty image path, or omit -g to use \".\"");
    }
    if opt.htmlpath.as_os_str().is_empty() {
        bail!("must provide non-empty HTML path, or omit -m to use \".\"");
    }
    Ok(())
}

fn validate_params_test(opt: &Opt, mp: &MapParams) -> Result<()> {
    if opt.inputpath.is_some()
        || opt.outputpath.is_some()
        || opt.chunklist.is_some()
        || opt.regionlist.is_some()
        || opt.expand
        || opt.htmlpath != Path::new(".")
    {
        bail!("-i, -o, -c, -r, -x, -m not allowed for test worlds");
    }
    if !mp.valid() {
        bail!("-B must be in range 2-16; -T must be in range 1-16");
    }
    if !mp.valid_zoom() && mp.base_zoom != -1 {
        bail!("-Z must be in range 0-30, or may be omitted to set automatically");
    }
    if opt.testworldsize.unwrap() < 0 {
        bail!("testworld size must be positive");
    }
    validate_common(opt)
}

fn validate_params_full(opt: &Opt, mp: &MapParams) -> Result<()> {
    if opt.expand {
        bail!("-x not allowed for full renders");
    }
    if !mp.valid() {
        bail!("-B must be in range 2-16; -T must be in range 1-16");
    }
    if !mp.valid_zoom() && mp.base_zoom != -1 {
        bail!("-Z must be in range 0-30, or may be omitted to set automatically");
    }
    if opt.inputpath.is_none() || opt.outputpath.is_none() {
        bail!("must provide both input (-i) and output (-o) paths");
    }
    validate_common(opt)
}

// also pulls the map parameters from the existing map
fn validate_params_incremental(opt: &Opt) -> Result<MapParams> {
    if opt.block_size.is_some() || opt.tile_multiplier.is_some() || opt.base_zoom.is_some() {
        bail!("-B, -T, -Z not allowed for incremental updates");
    }
    let (Some(inputpath), Some(outputpath)) = (&opt.inputpath, &opt.outputpath) else {
        bail!("must provide both input (-i) and output (-o) paths");
    };
    if opt.chunklist.is_some() && opt.regionlist.is_some() {
        bail!("only one of -c, -r may be used");
    }
    if detect_region_format(inputpath) && opt.regionlist.is_none() {
        bail!("world is in region format; must use -r, not -c");
    }
    validate_common(opt)?;
    MapParams::read_file(outputpath).context("can't find pigmap.params in output path")
}

fn perform_render(opt: &Opt, mut mp: MapParams) -> Result<()> {
    let tstart = Instant::now();
    let testmode = opt.testworldsize.is_some();

    let blockimages = BlockImages::create(mp.b as i32, &opt.imgpath)
        .context("no block images available; aborting render")?;

    let inputpath = opt.inputpath.clone().unwrap_or_default();
    let outputpath = opt.outputpath.clone().unwrap_or_default();
    let regionformat = !testmode && detect_region_format(&inputpath);
    if !testmode {
        if regionformat {
            println!("region-format world detected");
        } else {
            println!("no regions detected; assuming chunk-format world");
        }
    }

    let mut chunktable = ChunkTable::new();
    let mut tiletable = TileTable::new();
    let mut regiontable = RegionTable::new();
    let mut stats = RenderStats::default();
    let fullrender;

    if let Some(size) = opt.testworldsize {
        fullrender = true;
        println!("building test world...");
        let counts = make_test_world(size, &mut chunktable, &mut tiletable, &mut mp);
        record_counts(&mut stats, counts);
    } else if opt.chunklist.is_none() && opt.regionlist.is_none() {
        // full render
        fullrender = true;
        println!("scanning world data...");
        let counts = if regionformat {
            make_all_regions_required(
                &inputpath,
                &mut chunktable,
                &mut tiletable,
                &mut regiontable,
                &mut mp,
            )?
        } else {
            make_all_chunks_required(&inputpath, &mut chunktable, &mut tiletable, &mut mp)?
        };
        record_counts(&mut stats, counts);
    } else {
        // incremental update
        fullrender = false;
        let mut counts = ScanCounts {
            reqchunkcount: 0,
            reqregioncount: 0,
            reqtilecount: 0,
        };
        let outcome = consume_lists(
            opt,
            &inputpath,
            &mut chunktable,
            &mut tiletable,
            &mut regiontable,
            &mp,
            &mut counts,
        )?;
        if outcome == ScanOutcome::ZoomTooSmall {
            if !opt.expand {
                bail!("baseZoom too small for the update; rerun with -x to expand the map");
            }
            // grow the map by one level and run the lists once more
            expand_map(&outputpath)?;
            mp.base_zoom += 1;
            println!(
                "baseZoom of output map has been increased to {}",
                mp.base_zoom
            );
            chunktable = ChunkTable::new();
            tiletable = TileTable::new();
            regiontable = RegionTable::new();
            counts = ScanCounts {
                reqchunkcount: 0,
                reqregioncount: 0,
                reqtilecount: 0,
            };
            let outcome = consume_lists(
                opt,
                &inputpath,
                &mut chunktable,
                &mut tiletable,
                &mut regiontable,
                &mp,
                &mut counts,
            )?;
            if outcome != ScanOutcome::Ok {
                bail!("update still does not fit after expanding the map");
            }
        }
        record_counts(&mut stats, counts);
    }

    if stats.reqtilecount == 0 {
        println!("nothing to do!  (no required tiles)");
        return Ok(());
    }

    println!("rendering tiles...");
    let config = RenderConfig {
        fullrender,
        regionformat,
        testmode,
        mp,
        inputpath,
        outputpath: outputpath.clone(),
    };
    // a zoom-0 map is a single tile; there is nothing to partition
    let final_tiletable = if opt.threads >= 2 && mp.base_zoom >= 1 {
        run_multithreaded(
            &config,
            chunktable,
            regiontable,
            tiletable,
            &blockimages,
            opt.threads,
            &mut stats,
        )
    } else {
        run_single_thread(
            &config,
            chunktable,
            regiontable,
            tiletable,
            &blockimages,
            &mut stats,
        )
    };

    // double-check that every required tile was drawn
    println!("performing double-check...");
    for pti in final_tiletable.required_tiles() {
        if !final_tiletable.is_drawn(pti) {
            error!(
                "required tile {} was somehow not drawn!",
                pti.to_tile_idx()
            );
        }
    }

    if !testmode {
        mp.write_file(&outputpath)?;
        write_html(&mp, &outputpath, &opt.htmlpath);
    }

    print_stats(tstart.elapsed().as_secs(), &stats);
    Ok(())
}

fn record_counts(stats: &mut RenderStats, counts: ScanCounts) {
    stats.reqchunkcount = counts.reqchunkcount;
    stats.reqregioncount = counts.reqregioncount;
    stats.reqtilecount = counts.reqtilecount;
}

#[allow(clippy::too_many_arguments)]
fn consume_lists(
    opt: &Opt,
    inputpath: &Path,
    chunktable: &mut ChunkTable,
    tiletable: &mut TileTable,
    regiontable: &mut RegionTable,
    mp: &MapParams,
    counts: &mut ScanCounts,
) -> Result<ScanOutcome> {
    if let Some(regionlist) = &opt.regionlist {
        println!("processing regionlist...");
        read_regionlist(
            regionlist,
            inputpath,
            chunktable,
            tiletable,
            regiontable,
            mp,
            counts,
        )
    } else {
        println!("processing chunklist...");
        let chunklist = opt.chunklist.as_ref().expect("incremental mode has a list");
        read_chunklist(chunklist, chunktable, tiletable, mp, counts)
    }
}

fn run() -> Result<()> {
    let opt = Opt::from_args();

    let mp = if opt.testworldsize.is_some() {
        let mp = MapParams::new(
            opt.block_size.unwrap_or(-1),
            opt.tile_multiplier.unwrap_or(-1),
            opt.base_zoom.unwrap_or(-1),
        );
        validate_params_test(&opt, &mp)?;
        mp
    } else if opt.chunklist.is_none() && opt.regionlist.is_none() {
        let mp = MapParams::new(
            opt.block_size.unwrap_or(-1),
            opt.tile_multiplier.unwrap_or(-1),
            opt.base_zoom.unwrap_or(-1),
        );
        validate_params_full(&opt, &mp)?;
        mp
    } else {
        validate_params_incremental(&opt)?
    };

    perform_render(&opt, mp)
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapgeom::{ChunkIdx, TileIdx};
    use tables::PosTileIdx;

    fn opt_for_test() -> Opt {
        Opt {
            inputpath: None,
            outputpath: None,
            imgpath: PathBuf::from("."),
            chunklist: None,
            regionlist: None,
            block_size: Some(3),
            tile_multiplier: Some(1),
            base_zoom: None,
            threads: 1,
            expand: false,
            htmlpath: PathBuf::from("."),
            testworldsize: None,
        }
    }

    #[test]
    fn test_validation_full() {
        let mut opt = opt_for_test();
        let mp = MapParams::new(3, 1, -1);
        // missing paths
        assert!(validate_params_full(&opt, &mp).is_err());
        opt.inputpath = Some(PathBuf::from("in"));
        opt.outputpath = Some(PathBuf::from("out"));
        assert!(validate_params_full(&opt, &mp).is_ok());
        // -x is for incremental only
        opt.expand = true;
        assert!(validate_params_full(&opt, &mp).is_err());
        opt.expand = false;
        // bad B
        assert!(validate_params_full(&opt, &MapParams::new(1, 1, -1)).is_err());
        // bad zoom
        assert!(validate_params_full(&opt, &MapParams::new(3, 1, 31)).is_err());
        // bad thread count
        opt.threads = 65;
        assert!(validate_params_full(&opt, &mp).is_err());
    }

    #[test]
    fn test_validation_test_mode() {
        let mut opt = opt_for_test();
        opt.testworldsize = Some(100);
        let mp = MapParams::new(3, 1, -1);
        assert!(validate_params_test(&opt, &mp).is_ok());
        opt.inputpath = Some(PathBuf::from("in"));
        assert!(validate_params_test(&opt, &mp).is_err());
    }

    #[test]
    fn test_validation_incremental() {
        let dir = tempfile::tempdir().unwrap();
        let mut opt = opt_for_test();
        opt.block_size = None;
        opt.tile_multiplier = None;
        opt.chunklist = Some(dir.path().join("list.txt"));
        opt.inputpath = Some(dir.path().join("world"));
        opt.outputpath = Some(dir.path().to_owned());
        // no pigmap.params yet
        assert!(validate_params_incremental(&opt).is_err());
        MapParams::new(3, 2, 5).write_file(dir.path()).unwrap();
        let mp = validate_params_incremental(&opt).unwrap();
        assert_eq!((mp.b, mp.t, mp.base_zoom), (3, 2, 5));
        // explicit -B conflicts
        opt.block_size = Some(3);
        assert!(validate_params_incremental(&opt).is_err());
        opt.block_size = None;
        // both lists conflict
        opt.regionlist = Some(dir.path().join("regions.txt"));
        assert!(validate_params_incremental(&opt).is_err());
        // a region-format world demands -r
        opt.regionlist = None;
        fs::create_dir_all(dir.path().join("world/region")).unwrap();
        assert!(validate_params_incremental(&opt).is_err());
    }

    #[test]
    fn test_expand_map_moves_quadrants() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mp = MapParams::new(2, 1, 3);
        mp.write_file(dir.path())?;
        let size = mp.tile_size() as i32;

        // a populated top-left quadrant with a solid tile
        fs::create_dir_all(dir.path().join("0/1"))?;
        let mut img = RGBAImage::new(size, size);
        for p in img.data.iter_mut() {
            *p = rgba::make_rgba(10, 200, 30, 255);
        }
        img.write_png(&dir.path().join("0.png"))?;
        img.write_png(&dir.path().join("0/1.png"))?;
        img.write_png(&dir.path().join("base.png"))?;

        expand_map(dir.path())?;

        // the old quadrant contents moved one level deeper
        assert!(dir.path().join("0/3.png").exists());
        assert!(dir.path().join("0/3/1.png").exists());
        assert!(!dir.path().join("0/1.png").exists());
        // the new 0.png holds a shrunk copy of the old one in its
        // bottom-right quadrant and nothing in its top-left
        let mut newimg = RGBAImage::default();
        newimg.read_png(&dir.path().join("0.png"))?;
        assert_eq!(rgba::alpha(newimg.get(0, 0)), 0);
        let p = newimg.get(size - 1, size - 1);
        assert!(rgba::alpha(p) > 0);
        // base.png was rebuilt: its center-ish top-left area now has the
        // shrunk-again copy
        let mut base = RGBAImage::default();
        base.read_png(&dir.path().join("base.png"))?;
        assert!(rgba::alpha(base.get(size / 2 - 1, size / 2 - 1)) > 0);
        assert_eq!(rgba::alpha(base.get(size - 1, size - 1)), 0);
        // and the params grew
        let newmp = MapParams::read_file(dir.path())?;
        assert_eq!(newmp.base_zoom, 4);
        Ok(())
    }

    #[test]
    fn test_write_html_substitutes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let htmldir = dir.path().join("html");
        let outdir = dir.path().join("out");
        fs::create_dir_all(&htmldir)?;
        fs::create_dir_all(&outdir)?;
        fs::write(
            htmldir.join("template.html"),
            "size={tileSize} b={B} t={T} zoom={baseZoom}",
        )?;
        fs::write(htmldir.join("style.css"), "body{}")?;
        let mp = MapParams::new(3, 2, 7);
        write_html(&mp, &outdir, &htmldir);
        let out = fs::read_to_string(outdir.join("pigmap-default.html"))?;
        assert_eq!(out, "size=384 b=3 t=2 zoom=7");
        assert!(outdir.join("style.css").exists());
        // a missing template is a silent no-op
        write_html(&mp, &outdir, &dir.path().join("nowhere"));
        Ok(())
    }

    // End-to-end: a one-chunk world of solid stone through the whole
    // pipeline at B=3, T=1, baseZoom=0.
    #[test]
    fn test_single_chunk_full_render() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let worlddir = dir.path().join("world");
        let outdir = dir.path().join("map");
        let imgdir = dir.path().join("img");
        fs::create_dir_all(worlddir.join("region"))?;
        fs::create_dir_all(&outdir)?;
        fs::create_dir_all(&imgdir)?;
        test_textures(&imgdir);
        write_stone_chunk_region(&worlddir, ChunkIdx::new(0, 0));

        let mut mp = MapParams::new(3, 1, -1);
        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mut regiontable = RegionTable::new();
        let counts = make_all_regions_required(
            &worlddir,
            &mut chunktable,
            &mut tiletable,
            &mut regiontable,
            &mut mp,
        )?;
        assert_eq!(counts.reqchunkcount, 1);
        assert_eq!(mp.base_zoom, 0);
        // the tile bbox promised by the spec of the layout
        let bbox = TileIdx::new(0, 0).bbox(&mp);
        assert_eq!(bbox.top_left.x, -6);
        assert_eq!(bbox.top_left.y, 51 - 192);
        assert_eq!(bbox.bottom_right.x, -6 + 192);
        assert_eq!(bbox.bottom_right.y, 51);

        let blockimages = BlockImages::create(3, &imgdir)?;
        let config = RenderConfig {
            fullrender: true,
            regionformat: true,
            testmode: false,
            mp,
            inputpath: worlddir,
            outputpath: outdir.clone(),
        };
        let mut stats = RenderStats::default();
        stats.reqtilecount = counts.reqtilecount;
        let final_table = run_single_thread(
            &config,
            chunktable,
            regiontable,
            tiletable,
            &blockimages,
            &mut stats,
        );
        mp.write_file(&outdir)?;

        // base.png exists, is the right size, and has stone pixels in it
        let mut base = RGBAImage::default();
        base.read_png(&outdir.join("base.png"))?;
        assert_eq!((base.w, base.h), (192, 192));
        assert!(base.data.iter().any(|&p| rgba::alpha(p) == 255));
        // params round-trip
        let stored = MapParams::read_file(&outdir)?;
        assert_eq!((stored.b, stored.t, stored.base_zoom), (3, 1, 0));
        // all required tiles drawn
        for pti in final_table.required_tiles() {
            assert!(final_table.is_drawn(pti));
        }
        // exactly one chunk was read, none missing or corrupt
        assert_eq!(stats.chunkcache.read, 1);
        assert_eq!(stats.chunkcache.corrupt, 0);
        assert_eq!(stats.chunkcache.reqmissing, 0);

        // rendering the same world again produces identical bytes
        let first = fs::read(outdir.join("base.png"))?;
        let mut tiletable2 = TileTable::new();
        let mut chunktable2 = ChunkTable::new();
        let mut regiontable2 = RegionTable::new();
        let mut mp2 = MapParams::new(3, 1, -1);
        make_all_regions_required(
            &config.inputpath,
            &mut chunktable2,
            &mut tiletable2,
            &mut regiontable2,
            &mut mp2,
        )?;
        run_single_thread(
            &config,
            chunktable2,
            regiontable2,
            tiletable2,
            &blockimages,
            &mut stats,
        );
        let second = fs::read(outdir.join("base.png"))?;
        assert_eq!(first, second);
        Ok(())
    }

    // Multithreaded and single-threaded renders of the same world must
    // agree about which tiles exist.
    #[test]
    fn test_multithreaded_matches_single() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let worlddir = dir.path().join("world");
        let out1 = dir.path().join("map1");
        let out2 = dir.path().join("map2");
        let imgdir = dir.path().join("img");
        fs::create_dir_all(worlddir.join("region"))?;
        fs::create_dir_all(&out1)?;
        fs::create_dir_all(&out2)?;
        fs::create_dir_all(&imgdir)?;
        test_textures(&imgdir);
        for ci in [
            ChunkIdx::new(0, 0),
            ChunkIdx::new(1, 0),
            ChunkIdx::new(0, 1),
            ChunkIdx::new(8, 8),
        ] {
            write_stone_chunk_region(&worlddir, ci);
        }

        let blockimages = BlockImages::create(2, &imgdir)?;
        let render = |outdir: &Path, threads: usize| -> Result<Vec<PathBuf>> {
            let mut mp = MapParams::new(2, 1, -1);
            let mut chunktable = ChunkTable::new();
            let mut tiletable = TileTable::new();
            let mut regiontable = RegionTable::new();
            let counts = make_all_regions_required(
                &worlddir,
                &mut chunktable,
                &mut tiletable,
                &mut regiontable,
                &mut mp,
            )?;
            let config = RenderConfig {
                fullrender: true,
                regionformat: true,
                testmode: false,
                mp,
                inputpath: worlddir.clone(),
                outputpath: outdir.to_owned(),
            };
            let mut stats = RenderStats::default();
            stats.reqtilecount = counts.reqtilecount;
            let table = if threads >= 2 {
                run_multithreaded(
                    &config,
                    chunktable,
                    regiontable,
                    tiletable,
                    &blockimages,
                    threads,
                    &mut stats,
                )
            } else {
                run_single_thread(
                    &config,
                    chunktable,
                    regiontable,
                    tiletable,
                    &blockimages,
                    &mut stats,
                )
            };
            for pti in table.required_tiles() {
                assert!(table.is_drawn(pti), "undrawn tile with {} threads", threads);
            }
            let mut files: Vec<PathBuf> = glob::glob(outdir.join("**/*.png").to_str().unwrap())?
                .flatten()
                .map(|p| p.strip_prefix(outdir).unwrap().to_owned())
                .collect();
            files.sort();
            Ok(files)
        };

        let single = render(&out1, 1)?;
        let multi = render(&out2, 3)?;
        assert_eq!(single, multi);
        assert!(!single.is_empty());
        // spot-check identical pixels on the top tile
        assert_eq!(
            fs::read(out1.join("base.png"))?,
            fs::read(out2.join("base.png"))?
        );
        Ok(())
    }

    // Incremental update: only the affected tiles change on disk.
    #[test]
    fn test_incremental_touches_only_affected_tiles() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let worlddir = dir.path().join("world");
        let outdir = dir.path().join("map");
        let imgdir = dir.path().join("img");
        fs::create_dir_all(worlddir.join("region"))?;
        fs::create_dir_all(&outdir)?;
        fs::create_dir_all(&imgdir)?;
        test_textures(&imgdir);
        write_stone_chunk_region(&worlddir, ChunkIdx::new(0, 0));
        write_stone_chunk_region(&worlddir, ChunkIdx::new(40, 40));

        // full render first, at a fixed baseZoom with room to spare
        let blockimages = BlockImages::create(2, &imgdir)?;
        let mut mp = MapParams::new(2, 1, 7);
        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mut regiontable = RegionTable::new();
        let counts = make_all_regions_required(
            &worlddir,
            &mut chunktable,
            &mut tiletable,
            &mut regiontable,
            &mut mp,
        )?;
        let config = RenderConfig {
            fullrender: true,
            regionformat: true,
            testmode: false,
            mp,
            inputpath: worlddir.clone(),
            outputpath: outdir.clone(),
        };
        let mut stats = RenderStats::default();
        stats.reqtilecount = counts.reqtilecount;
        run_single_thread(
            &config,
            chunktable,
            regiontable,
            tiletable,
            &blockimages,
            &mut stats,
        );
        mp.write_file(&outdir)?;

        let mtimes = |outdir: &Path| -> Vec<(PathBuf, SystemTime)> {
            let mut v: Vec<_> = glob::glob(outdir.join("**/*.png").to_str().unwrap())
                .unwrap()
                .flatten()
                .map(|p| (p.clone(), fs::metadata(&p).unwrap().modified().unwrap()))
                .collect();
            v.sort();
            v
        };
        let before = mtimes(&outdir);
        std::thread::sleep(std::time::Duration::from_millis(1100));

        // update naming only the far-away region
        let listfile = dir.path().join("regions.txt");
        fs::write(&listfile, "r.1.1.mca\n")?;
        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mut regiontable = RegionTable::new();
        let mut counts = ScanCounts {
            reqchunkcount: 0,
            reqregioncount: 0,
            reqtilecount: 0,
        };
        let outcome = read_regionlist(
            &listfile,
            &worlddir,
            &mut chunktable,
            &mut tiletable,
            &mut regiontable,
            &mp,
            &mut counts,
        )?;
        assert_eq!(outcome, ScanOutcome::Ok);
        assert_eq!(counts.reqchunkcount, 1);
        let config = RenderConfig {
            fullrender: false,
            regionformat: true,
            testmode: false,
            mp,
            inputpath: worlddir,
            outputpath: outdir.clone(),
        };
        let mut stats = RenderStats::default();
        stats.reqtilecount = counts.reqtilecount;
        run_single_thread(
            &config,
            chunktable,
            regiontable,
            tiletable,
            &blockimages,
            &mut stats,
        );

        let after = mtimes(&outdir);
        assert_eq!(before.len(), after.len());
        // the tiles over chunk (0,0) kept their mtimes; only the ones over
        // chunk (40,40) and their pyramid ancestors changed
        let mut allowed: Vec<String> = Vec::new();
        for ti in ChunkIdx::new(40, 40).get_tiles(&mp) {
            let Some(path) = ti.to_file_path(&mp) else { continue };
            allowed.push(path.clone());
            // ancestors: strip the last path component, the new leaf
            // becomes a .png ("0/3/2.png" -> "0/3.png" -> "0.png" -> base)
            let mut path = path;
            while let Some(slash) = path.rfind('/') {
                path = format!("{}.png", &path[..slash]);
                allowed.push(path.clone());
            }
        }
        allowed.push("base.png".to_owned());
        let mut changed = 0;
        for ((path, t_before), (path2, t_after)) in before.iter().zip(after.iter()) {
            assert_eq!(path, path2);
            let rel = path.strip_prefix(&outdir).unwrap().to_string_lossy();
            if t_before != t_after {
                changed += 1;
                assert!(
                    allowed.iter().any(|a| a.as_str() == rel),
                    "unexpected rewrite of {}",
                    rel
                );
            }
        }
        assert!(changed > 0);
        Ok(())
    }

    // The scene graph picks the right neighbor-dependent sprite variants.
    #[test]
    fn test_fence_and_water_variants() -> Result<()> {
        use crate::render::{check_special, SceneGraphNode};
        use worldio::{BlockOffset, ChunkCache};

        let dir = tempfile::tempdir()?;
        let worlddir = dir.path().join("world");
        let imgdir = dir.path().join("img");
        fs::create_dir_all(worlddir.join("region"))?;
        fs::create_dir_all(&imgdir)?;
        test_textures(&imgdir);

        // one chunk: a fence at (5,5,1) with fence neighbors N and E only,
        // and a line of three water blocks along -x at y=3
        let mut blocks = vec![0u8; 4096];
        let mut put = |x: i64, z: i64, y: i64, id: u8| {
            blocks[((y * 16 + z) * 16 + x) as usize] = id;
        };
        put(5, 5, 1, 85);
        put(4, 5, 1, 85); // N
        put(5, 4, 1, 85); // E
        put(6, 8, 3, 8);
        put(7, 8, 3, 8);
        put(8, 8, 3, 8);
        write_chunk_region(&worlddir, ChunkIdx::new(0, 0), &blocks);

        let blockimages = BlockImages::create(2, &imgdir)?;
        let mut cache = ChunkCache::new(
            ChunkTable::new(),
            RegionTable::new(),
            &worlddir,
            false,
            true,
        );

        let mut variant = |bi: mapgeom::BlockIdx| -> usize {
            let pci = tables::PosChunkIdx::from(bi.chunk_idx());
            let bo = BlockOffset::new(bi);
            let data = cache.get_data(pci);
            let id = data.id(bo) & 0xfff;
            let bdata = data.data(bo);
            let mut node =
                SceneGraphNode::new(0, 0, bi, blockimages.offset(id, bdata));
            check_special(&mut node, id, bdata, &mut cache, &blockimages);
            node.bimgoffset
        };

        // N+E connectivity is variant bits 0b0101, so sprite 157 + 5
        assert_eq!(variant(mapgeom::BlockIdx::new(5, 5, 1)), 162);
        // water with more water to its N hides that face; the northmost
        // block keeps the standard solid sprite
        assert_eq!(variant(mapgeom::BlockIdx::new(8, 8, 3)), 179);
        assert_eq!(variant(mapgeom::BlockIdx::new(7, 8, 3)), 179);
        assert_eq!(variant(mapgeom::BlockIdx::new(6, 8, 3)), 8);
        Ok(())
    }

    // ---- helpers for the end-to-end tests ----

    fn test_textures(imgdir: &Path) {
        let mut terrain = RGBAImage::new(256, 256);
        for (i, p) in terrain.data.iter_mut().enumerate() {
            *p = rgba::make_rgba((i % 251) as u8, (i % 83) as u8, (i % 127) as u8, 255);
        }
        terrain.write_png(&imgdir.join("terrain.png")).unwrap();
        let mut small = RGBAImage::new(16, 16);
        for p in small.data.iter_mut() {
            *p = rgba::make_rgba(200, 100, 0, 255);
        }
        small.write_png(&imgdir.join("fire.png")).unwrap();
        small.write_png(&imgdir.join("endportal.png")).unwrap();
        let mut chest = RGBAImage::new(64, 64);
        for p in chest.data.iter_mut() {
            *p = rgba::make_rgba(150, 100, 20, 255);
        }
        chest.write_png(&imgdir.join("chest.png")).unwrap();
        chest.write_png(&imgdir.join("enderchest.png")).unwrap();
        let mut large = RGBAImage::new(128, 64);
        for p in large.data.iter_mut() {
            *p = rgba::make_rgba(150, 100, 20, 255);
        }
        large.write_png(&imgdir.join("largechest.png")).unwrap();
    }

    // an Anvil chunk with one section (Y=0) holding the given block ids
    fn chunk_nbt(blocks: &[u8]) -> Vec<u8> {
        assert_eq!(blocks.len(), 4096);
        let mut out = vec![10u8, 0, 0]; // root compound, empty name
        out.push(10);
        out.extend_from_slice(&5u16.to_be_bytes());
        out.extend_from_slice(b"Level");
        out.push(9);
        out.extend_from_slice(&8u16.to_be_bytes());
        out.extend_from_slice(b"Sections");
        out.push(10);
        out.extend_from_slice(&1u32.to_be_bytes());
        out.push(1);
        out.extend_from_slice(&1u16.to_be_bytes());
        out.push(b'Y');
        out.push(0);
        out.push(7);
        out.extend_from_slice(&6u16.to_be_bytes());
        out.extend_from_slice(b"Blocks");
        out.extend_from_slice(&4096u32.to_be_bytes());
        out.extend_from_slice(blocks);
        out.push(7);
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(b"Data");
        out.extend_from_slice(&2048u32.to_be_bytes());
        out.extend_from_slice(&[0u8; 2048]);
        out.push(0); // end section
        out.push(0); // end Level
        out.push(0); // end root
        out
    }

    fn write_stone_chunk_region(worlddir: &Path, ci: ChunkIdx) {
        write_chunk_region(worlddir, ci, &[1u8; 4096]);
    }

    fn write_chunk_region(worlddir: &Path, ci: ChunkIdx, blocks: &[u8]) {
        use flate2::{write::ZlibEncoder, Compression};
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&chunk_nbt(blocks)).unwrap();
        let payload = enc.finish().unwrap();

        let ri = ci.region_idx();
        let path = worlddir.join("region").join(ri.to_anvil_file_name());
        // merge into an existing file if two chunks share a region
        let mut data = fs::read(&path).unwrap_or_else(|_| vec![0u8; 4096]);
        let sector = (data.len() / 4096).max(1);
        let off = ((ci.z - ri.z * 32) * 32 + (ci.x - ri.x * 32)) as usize * 4;
        data[off..off + 4].copy_from_slice(&(((sector as u32) << 8) | 1).to_be_bytes());
        let mut sectorbuf = vec![0u8; 4096];
        sectorbuf[0..4].copy_from_slice(&((payload.len() + 1) as u32).to_be_bytes());
        sectorbuf[4] = 2;
        sectorbuf[5..5 + payload.len()].copy_from_slice(&payload);
        data.extend_from_slice(&sectorbuf);
        fs::write(&path, data).unwrap();
    }

    // keep the chunk-table invariant honest: marking a chunk marks every
    // tile it touches
    #[test]
    fn test_required_invariant_after_scan() {
        let mut chunktable = ChunkTable::new();
        let mut tiletable = TileTable::new();
        let mut mp = MapParams::new(3, 1, -1);
        make_test_world(200, &mut chunktable, &mut tiletable, &mut mp);
        for pci in chunktable.required_chunks() {
            for ti in pci.to_chunk_idx().get_tiles(&mp) {
                assert!(tiletable.is_required(PosTileIdx::from(ti)));
            }
        }
    }
}
