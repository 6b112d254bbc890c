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

//! Partitioning of the required work across workers: pick a zoom level
//! whose tiles divide evenly, and assign each of that level's tiles to a
//! worker.

use mapgeom::{MapParams, ZoomTileIdx};
use tables::TileTable;

/// How much memory the partition level's output images may consume. The
/// finer the level, the more 2^W x 2^W images have to stay in memory at
/// once; levels past this budget aren't considered.
pub const DEFAULT_OUTPUT_BUDGET: i64 = 2 * 1024 * 1024 * 1024;

/// Greedy longest-processing-time schedule: walk the costs in descending
/// order, assigning each to the least-loaded worker. Returns the
/// per-cost worker assignments plus the max-min gap, absolute and as a
/// fraction of the max worker total.
pub fn schedule(costs: &[i64], threads: usize) -> (Vec<usize>, i64, f64) {
    let mut sorted: Vec<(i64, usize)> = costs.iter().copied().zip(0..).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut totals = vec![0i64; threads];
    let mut assignments = vec![0usize; costs.len()];

    let mut next = 0;
    for (cost, idx) in sorted {
        assignments[idx] = next;
        totals[next] += cost;
        for i in 0..threads {
            if totals[i] < totals[next] {
                next = i;
            }
        }
    }

    let min = totals.iter().copied().min().unwrap_or(0);
    let max = totals.iter().copied().max().unwrap_or(0);
    let frac = if max > 0 {
        (max - min) as f64 / max as f64
    } else {
        0.0
    };
    (assignments, max - min, frac)
}

/// One worker's share of the partition level.
#[derive(Debug, Default)]
pub struct WorkerPlan {
    pub zoomtiles: Vec<ZoomTileIdx>,
    /// Number of required base tiles under the assigned zoom tiles.
    pub cost: i64,
}

/// Find a zoom level with enough populated tiles to balance across the
/// workers, and split that level's tiles among them. Walks the levels
/// finest-ward from 1, stopping at the first whose imbalance drops under
/// 5% (or 50 tiles absolute, for small worlds), or at the best level seen
/// once the output images would no longer fit in the byte budget.
pub fn assign_worker_tasks(
    ttable: &TileTable,
    mp: &MapParams,
    threads: usize,
    output_budget: i64,
) -> (i32, Vec<WorkerPlan>) {
    let tile_bytes = mp.tile_size() * mp.tile_size() * 4;

    let mut best: Option<(Vec<ZoomTileIdx>, Vec<i64>, Vec<usize>)> = None;
    let mut best_error = 1.1f64;

    for zoom in 1..=mp.base_zoom {
        // all zoom tiles at this level with required base tiles under
        // them, and their costs
        let size = 1i64 << zoom;
        let mut reqzoomtiles = Vec::new();
        let mut costs = Vec::new();
        for x in 0..size {
            for y in 0..size {
                let zti = ZoomTileIdx::new(x, y, zoom);
                let numreq = ttable.num_required(&zti, mp);
                if numreq > 0 {
                    reqzoomtiles.push(zti);
                    costs.push(numreq);
                }
            }
        }
        // levels whose output images can't all be held at once are out of
        // reach, and so is everything finer
        if reqzoomtiles.len() as i64 * tile_bytes > output_budget {
            break;
        }
        let (assignments, gap, error) = schedule(&costs, threads);
        // under 5%, or under 50 tiles for small worlds, is good enough
        let stop = error < 0.05 || gap < 50;
        if error < best_error || stop {
            best_error = error;
            best = Some((reqzoomtiles, costs, assignments));
        }
        if stop {
            break;
        }
    }

    let (tiles, costs, assignments) =
        best.expect("zoom level 1 always fits in any reasonable budget");
    let zoom = tiles[0].zoom;
    let mut plans: Vec<WorkerPlan> = (0..threads).map(|_| WorkerPlan::default()).collect();
    for ((zti, cost), worker) in tiles.into_iter().zip(costs).zip(assignments) {
        plans[worker].zoomtiles.push(zti);
        plans[worker].cost += cost;
    }
    (zoom, plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapgeom::TileIdx;
    use tables::PosTileIdx;

    #[test]
    fn test_schedule_balances() {
        let costs = vec![10, 10, 10, 10, 1, 1, 1, 1];
        let (assignments, gap, frac) = schedule(&costs, 4);
        assert_eq!(assignments.len(), costs.len());
        // each worker ends up with one big and one small
        let mut totals = [0i64; 4];
        for (i, &w) in assignments.iter().enumerate() {
            totals[w] += costs[i];
        }
        assert!(totals.iter().all(|&t| t == 11), "totals {:?}", totals);
        assert_eq!(gap, 0);
        assert_eq!(frac, 0.0);
    }

    #[test]
    fn test_schedule_single_worker() {
        let costs = vec![5, 3, 9];
        let (assignments, gap, _) = schedule(&costs, 1);
        assert!(assignments.iter().all(|&w| w == 0));
        assert_eq!(gap, 0);
    }

    #[test]
    fn test_assign_worker_tasks_covers_all_required() {
        let mp = MapParams::new(3, 1, 8);
        let mut ttable = TileTable::new();
        for i in 0..300i64 {
            let ti = TileIdx::new(i * 11 % 120 - 60, i * 29 % 120 - 60);
            ttable.set_required(PosTileIdx::from(ti));
        }
        let threads = 4;
        let (zoom, plans) = assign_worker_tasks(&ttable, &mp, threads, DEFAULT_OUTPUT_BUDGET);
        assert!((1..=mp.base_zoom).contains(&zoom));
        assert_eq!(plans.len(), threads);
        // the assigned zoom tiles together cover every required tile, with
        // no double assignment
        let total: i64 = plans.iter().map(|p| p.cost).sum();
        assert_eq!(total, ttable.reqcount());
        let mut seen = Vec::new();
        for plan in &plans {
            for zti in &plan.zoomtiles {
                assert_eq!(zti.zoom, zoom);
                assert!(!seen.contains(&(zti.x, zti.y)));
                seen.push((zti.x, zti.y));
            }
        }
    }

    #[test]
    fn test_assign_worker_tasks_respects_budget() {
        let mp = MapParams::new(3, 1, 8);
        let mut ttable = TileTable::new();
        for x in -40..40 {
            for y in -40..40 {
                ttable.set_required(PosTileIdx::from(TileIdx::new(x, y)));
            }
        }
        // a budget that only fits a handful of tile images forces a coarse
        // partition level
        let tile_bytes = mp.tile_size() * mp.tile_size() * 4;
        let (zoom, _) = assign_worker_tasks(&ttable, &mp, 4, tile_bytes * 6);
        assert!(zoom <= 2, "zoom {} should have been capped by budget", zoom);
    }
}
