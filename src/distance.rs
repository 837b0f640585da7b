//! Ground distances over the mini tile grid.
//!
//! A Dijkstra sweep with 8-directional movement. Diagonal steps are only
//! allowed when both orthogonal cells they cut across can be entered, so
//! paths never squeeze between two touching obstacles. Costs are tracked in
//! fixed point and reported in pixels.

use crate::area::AreaId;
use crate::constants::*;
use crate::location::*;
use crate::terrain::*;
use fnv::{FnvHashMap, FnvHashSet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Distance reported for targets that cannot be reached.
pub const UNREACHABLE: u32 = u32::MAX;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct HeapEntry {
    pub cost: u64,
    pub index: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost, raster order on ties.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Converts a fixed-point cost to pixels.
#[inline]
pub(crate) fn cost_to_pixels(cost: u64) -> u32 {
    let pixels = (cost * MINI_TILE_SIZE as u64 + ORTHOGONAL_STEP_COST / 2) / ORTHOGONAL_STEP_COST;
    pixels.min((UNREACHABLE - 1) as u64) as u32
}

#[inline]
fn pixels_to_cost(pixels: u32) -> u64 {
    pixels as u64 * ORTHOGONAL_STEP_COST / MINI_TILE_SIZE as u64
}

/// Walkable mini tiles not covered by a blocking resource.
pub fn walkable_ground(_: WalkPosition, mini_tile: &MiniTile) -> bool {
    mini_tile.walkable() && !mini_tile.blocked()
}

/// Mini tiles labeled with `area`.
pub fn within_area(area: AreaId) -> impl Fn(WalkPosition, &MiniTile) -> bool {
    move |_, mini_tile| mini_tile.area_id() == Some(area)
}

/// Pixel distances from `start` to each of `targets`, walking only through
/// mini tiles accepted by `passable`. Targets themselves may always be
/// entered when walkable. Nothing is reachable from an unwalkable start.
pub fn compute_distances<F>(
    grid: &TerrainGrid,
    start: WalkPosition,
    targets: &[WalkPosition],
    passable: F,
) -> Vec<u32>
where
    F: Fn(WalkPosition, &MiniTile) -> bool,
{
    if !grid.valid_walk(start) || !grid.mini_tile(start).walkable() {
        return vec![UNREACHABLE; targets.len()];
    }
    sweep(grid, &[start], targets, passable, u64::MAX)
}

/// Like [`compute_distances`], measuring from the nearest of several
/// sources.
pub fn compute_distances_from_sources<F>(
    grid: &TerrainGrid,
    sources: &[WalkPosition],
    targets: &[WalkPosition],
    passable: F,
) -> Vec<u32>
where
    F: Fn(WalkPosition, &MiniTile) -> bool,
{
    sweep(grid, sources, targets, passable, u64::MAX)
}

/// Like [`compute_distances_from_sources`], giving up on anything farther
/// than `max_pixels`.
pub fn compute_distances_within<F>(
    grid: &TerrainGrid,
    sources: &[WalkPosition],
    targets: &[WalkPosition],
    passable: F,
    max_pixels: u32,
) -> Vec<u32>
where
    F: Fn(WalkPosition, &MiniTile) -> bool,
{
    sweep(grid, sources, targets, passable, pixels_to_cost(max_pixels))
}

fn sweep<F>(
    grid: &TerrainGrid,
    sources: &[WalkPosition],
    targets: &[WalkPosition],
    passable: F,
    max_cost: u64,
) -> Vec<u32>
where
    F: Fn(WalkPosition, &MiniTile) -> bool,
{
    let mut result = vec![UNREACHABLE; targets.len()];

    let mut slots: FnvHashMap<usize, Vec<usize>> = FnvHashMap::default();
    for (slot, target) in targets.iter().enumerate() {
        if grid.valid_walk(*target) {
            slots.entry(grid.walk_index(*target)).or_default().push(slot);
        }
    }

    let mut remaining = slots.len();
    if remaining == 0 {
        return result;
    }

    let enterable = |w: WalkPosition| -> bool {
        if !grid.valid_walk(w) {
            return false;
        }
        let mini_tile = grid.mini_tile(w);
        passable(w, mini_tile) || (mini_tile.walkable() && slots.contains_key(&grid.walk_index(w)))
    };

    let mut best: FnvHashMap<usize, u64> = FnvHashMap::default();
    let mut done: FnvHashSet<usize> = FnvHashSet::default();
    let mut heap = BinaryHeap::new();

    for source in sources.iter().filter(|s| grid.valid_walk(**s)) {
        let index = grid.walk_index(*source);
        if best.insert(index, 0).is_none() {
            heap.push(HeapEntry { cost: 0, index });
        }
    }

    while let Some(HeapEntry { cost, index }) = heap.pop() {
        if !done.insert(index) {
            continue;
        }

        if let Some(target_slots) = slots.get(&index) {
            let pixels = cost_to_pixels(cost);
            for slot in target_slots {
                result[*slot] = pixels;
            }
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }

        let current = grid.walk_position(index);

        for &(dx, dy) in NEIGHBORS_8.iter() {
            let next = current + (dx, dy);
            if !enterable(next) {
                continue;
            }

            let step = if dx != 0 && dy != 0 {
                if !enterable(current + (dx, 0)) || !enterable(current + (0, dy)) {
                    continue;
                }
                DIAGONAL_STEP_COST
            } else {
                ORTHOGONAL_STEP_COST
            };

            let next_cost = cost + step;
            if next_cost > max_cost {
                continue;
            }

            let next_index = grid.walk_index(next);
            if done.contains(&next_index) {
                continue;
            }

            match best.get(&next_index) {
                Some(&known) if known <= next_cost => {}
                _ => {
                    best.insert(next_index, next_cost);
                    heap.push(HeapEntry {
                        cost: next_cost,
                        index: next_index,
                    });
                }
            }
        }
    }

    result
}
