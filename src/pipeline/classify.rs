//! Walkability, sea/lake and altitude classification of the mini tiles, plus
//! resource occupancy and blocking-resource detection.

use super::BuildContext;
use crate::constants::*;
use crate::distance::HeapEntry;
use crate::location::*;
use crate::map_data::MapDataSource;
use crate::resource::*;
use crate::terrain::*;
use fnv::FnvHashSet;
use log::*;
use std::collections::BinaryHeap;

pub fn run(ctx: &mut BuildContext, data_source: &dyn MapDataSource) {
    mark_unwalkable_mini_tiles(ctx, data_source);
    mark_buildable_tiles_and_ground_height(ctx, data_source);
    decide_seas_or_lakes(ctx);
    compute_altitude(ctx);
    place_resources(ctx);
    mark_blocking_resources(ctx);
}

/// Every raw unwalkable mini tile also makes its 8 neighbors unwalkable.
pub fn mark_unwalkable_mini_tiles(ctx: &mut BuildContext, data_source: &dyn MapDataSource) {
    let positions: Vec<WalkPosition> = ctx.grid.walk_positions().collect();

    for w in positions {
        if data_source.is_walkable(w) {
            continue;
        }

        for dy in -1..=1 {
            for dx in -1..=1 {
                let n = w + (dx, dy);
                if ctx.grid.valid_walk(n) {
                    ctx.grid.mini_tile_mut(n).set_walkable(false);
                }
            }
        }
    }
}

/// Copies tile flags. Buildable tiles are walkable throughout.
pub fn mark_buildable_tiles_and_ground_height(ctx: &mut BuildContext, data_source: &dyn MapDataSource) {
    let positions: Vec<TilePosition> = ctx.grid.tile_positions().collect();

    for t in positions {
        let buildable = data_source.is_buildable(t);

        let mut flags = TileFlags::NONE;
        if buildable {
            flags |= TileFlags::BUILDABLE;
        }
        if data_source.is_doodad(t) {
            flags |= TileFlags::DOODAD;
        }

        ctx.grid
            .tile_mut(t)
            .set_flags(flags, data_source.ground_height(t));

        if buildable {
            let mini_tiles: Vec<WalkPosition> = ctx.grid.mini_tiles_of_rect(t, (1, 1)).collect();
            for w in mini_tiles {
                ctx.grid.mini_tile_mut(w).set_walkable(true);
            }
        }
    }
}

/// Splits the unwalkable mini tiles into sea and lakes. A lake is a small
/// unwalkable region that does not touch the map border.
pub fn decide_seas_or_lakes(ctx: &mut BuildContext) {
    let (walk_width, walk_height) = ctx.grid.walk_size();
    let max_mini_tiles = ctx.config.lake_max_mini_tiles;
    let max_width = ctx.config.lake_max_width_in_mini_tiles;

    let positions: Vec<WalkPosition> = ctx.grid.walk_positions().collect();

    for origin in positions {
        if !ctx.grid.mini_tile(origin).sea_or_lake() {
            continue;
        }

        let mut to_search = vec![origin];
        let mut extent = vec![origin];
        ctx.grid.mini_tile_mut(origin).set_sea();

        let (mut top_left, mut bottom_right) = ((origin.x(), origin.y()), (origin.x(), origin.y()));

        while let Some(current) = to_search.pop() {
            top_left = (top_left.0.min(current.x()), top_left.1.min(current.y()));
            bottom_right = (bottom_right.0.max(current.x()), bottom_right.1.max(current.y()));

            for &d in NEIGHBORS_4.iter() {
                let next = current + d;
                if ctx.grid.valid_walk(next) && ctx.grid.mini_tile(next).sea_or_lake() {
                    to_search.push(next);
                    if extent.len() <= max_mini_tiles {
                        extent.push(next);
                    }
                    ctx.grid.mini_tile_mut(next).set_sea();
                }
            }
        }

        let lake = extent.len() <= max_mini_tiles
            && bottom_right.0 - top_left.0 <= max_width
            && bottom_right.1 - top_left.1 <= max_width
            && top_left.0 >= 1
            && top_left.1 >= 1
            && bottom_right.0 < walk_width - 2
            && bottom_right.1 < walk_height - 2;

        if lake {
            trace!("Lake of {} mini tiles at {:?}", extent.len(), origin);
            for w in extent {
                ctx.grid.mini_tile_mut(w).set_lake();
            }
        }
    }
}

/// Distance transform from the sea. Everything beyond the map border counts
/// as sea.
pub fn compute_altitude(ctx: &mut BuildContext) {
    let (walk_width, walk_height) = ctx.grid.walk_size();
    let len = ctx.grid.mini_tiles().len();

    let mut best = vec![u64::MAX; len];
    let mut done = vec![false; len];
    let mut heap = BinaryHeap::new();

    for w in ctx.grid.walk_positions() {
        let index = ctx.grid.walk_index(w);
        let mini_tile = ctx.grid.mini_tile(w);

        if mini_tile.sea() {
            best[index] = 0;
            heap.push(HeapEntry { cost: 0, index });
        } else if w.x() == 0 || w.y() == 0 || w.x() == walk_width - 1 || w.y() == walk_height - 1 {
            best[index] = ORTHOGONAL_STEP_COST;
            heap.push(HeapEntry {
                cost: ORTHOGONAL_STEP_COST,
                index,
            });
        }
    }

    while let Some(HeapEntry { cost, index }) = heap.pop() {
        if done[index] {
            continue;
        }
        done[index] = true;

        let current = ctx.grid.walk_position(index);
        if cost > 0 {
            let pixels = crate::distance::cost_to_pixels(cost).max(1);
            ctx.grid
                .mini_tile_mut(current)
                .set_altitude(pixels.min(u16::MAX as u32) as u16);
        }

        for &(dx, dy) in NEIGHBORS_8.iter() {
            let next = current + (dx, dy);
            if !ctx.grid.valid_walk(next) {
                continue;
            }
            let next_index = ctx.grid.walk_index(next);
            if done[next_index] || ctx.grid.mini_tile(next).sea() {
                continue;
            }

            let step = if dx != 0 && dy != 0 {
                DIAGONAL_STEP_COST
            } else {
                ORTHOGONAL_STEP_COST
            };
            let next_cost = cost + step;
            if next_cost < best[next_index] {
                best[next_index] = next_cost;
                heap.push(HeapEntry {
                    cost: next_cost,
                    index: next_index,
                });
            }
        }
    }
}

/// Records which resource covers each tile.
pub fn place_resources(ctx: &mut BuildContext) {
    for resource in ctx.resources.iter() {
        for t in resource.tiles() {
            ctx.grid.tile_mut(t).set_resource(resource.id());
        }
    }
}

/// Finds the minerals that split the walkable ground around them and marks
/// their mini tiles as blocked.
pub fn mark_blocking_resources(ctx: &mut BuildContext) {
    for index in 0..ctx.resources.len() {
        if !ctx.resources[index].is_mineral() {
            continue;
        }

        let doors = true_doors(ctx, &ctx.resources[index]);
        if doors.len() < 2 {
            continue;
        }

        let resource = &ctx.resources[index];
        trace!(
            "Resource {:?} at {:?} is blocking with {} doors",
            resource.id(),
            resource.top_left(),
            doors.len()
        );

        let footprint: Vec<WalkPosition> = ctx
            .grid
            .mini_tiles_of_rect(resource.top_left(), resource.size())
            .collect();
        for w in footprint {
            let mini_tile = ctx.grid.mini_tile_mut(w);
            if mini_tile.area_id_missing() {
                mini_tile.set_blocked();
            }
        }

        ctx.resources[index].set_blocking(doors);
    }
}

fn covered_by_resource(grid: &TerrainGrid, w: WalkPosition) -> bool {
    grid.tile_of(w).resource().is_some()
}

fn adjoins_lake_or_resource(grid: &TerrainGrid, w: WalkPosition) -> bool {
    grid.neighbors_8(w)
        .any(|n| covered_by_resource(grid, n) || grid.mini_tile(n).lake())
}

/// Openings around the resource that each lead into a large walkable region.
fn true_doors(ctx: &BuildContext, resource: &Resource) -> Vec<WalkPosition> {
    let grid = &ctx.grid;

    let origin = WalkPosition::from(resource.top_left());
    let (w, h) = resource.size();
    let (w, h) = (w * MINI_TILES_PER_TILE, h * MINI_TILES_PER_TILE);

    // The ring of mini tiles just outside the footprint, without its corners.
    let mut border: Vec<WalkPosition> = Vec::new();
    for dy in -1..=h {
        for dx in -1..=w {
            let on_ring = dx == -1 || dy == -1 || dx == w || dy == h;
            let corner = (dx == -1 || dx == w) && (dy == -1 || dy == h);
            if on_ring && !corner {
                border.push(origin + (dx, dy));
            }
        }
    }
    border.retain(|p| {
        grid.valid_walk(*p) && grid.mini_tile(*p).walkable() && !covered_by_resource(grid, *p)
    });

    let mut doors = Vec::new();
    while let Some(door) = border.pop() {
        doors.push(door);

        // Walk around the resource, hugging it and any lakes, to drop the
        // ring positions that belong to the same opening.
        let mut visited: FnvHashSet<WalkPosition> = FnvHashSet::default();
        let mut to_visit = vec![door];
        visited.insert(door);

        while let Some(current) = to_visit.pop() {
            for next in grid.neighbors_4(current) {
                if visited.contains(&next) {
                    continue;
                }
                let mini_tile = grid.mini_tile(next);
                if mini_tile.walkable()
                    && !covered_by_resource(grid, next)
                    && adjoins_lake_or_resource(grid, next)
                {
                    visited.insert(next);
                    to_visit.push(next);
                }
            }
        }

        border.retain(|p| !visited.contains(p));
    }

    if doors.len() < 2 {
        return Vec::new();
    }

    let limit = ctx.config.blocking_door_min_mini_tiles;

    doors
        .into_iter()
        .filter(|door| {
            let mut visited: FnvHashSet<WalkPosition> = FnvHashSet::default();
            let mut to_visit = vec![*door];
            visited.insert(*door);

            while let Some(current) = to_visit.pop() {
                if visited.len() >= limit {
                    break;
                }
                for next in grid.neighbors_4(current) {
                    if !visited.contains(&next)
                        && grid.mini_tile(next).walkable()
                        && !covered_by_resource(grid, next)
                    {
                        visited.insert(next);
                        to_visit.push(next);
                    }
                }
            }

            visited.len() >= limit
        })
        .collect()
}
