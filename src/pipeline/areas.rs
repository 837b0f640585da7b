//! Area construction: a watershed over the mini tiles in decreasing altitude
//! order, followed by tile aggregation and per-area statistics.

use super::BuildContext;
use crate::area::*;
use crate::constants::*;
use crate::location::*;
use crate::terrain::*;
use fnv::FnvHashMap;
use itertools::*;
use log::*;

pub fn run(ctx: &mut BuildContext) {
    let order = sorted_mini_tiles(ctx);
    let temp_areas = compute_temp_areas(ctx, &order);
    create_areas(ctx, &temp_areas);
    set_area_id_in_tiles(ctx);
    collect_information(ctx);
}

/// A growing region during the watershed.
#[derive(Clone, Debug)]
struct TempArea {
    id: AreaId,
    top: WalkPosition,
    highest_altitude: u16,
    size: usize,
    valid: bool,
}

impl TempArea {
    fn new(id: AreaId, top: WalkPosition, altitude: u16) -> Self {
        TempArea {
            id,
            top,
            highest_altitude: altitude,
            size: 1,
            valid: true,
        }
    }

    fn add(&mut self) {
        assert!(self.valid, "adding to merged temp area {:?}", self.id);
        self.size += 1;
    }

    fn merge(&mut self, absorbed: &mut TempArea) {
        assert!(self.valid && absorbed.valid);
        self.size += absorbed.size;
        absorbed.valid = false;
    }
}

/// Unassigned walkable mini tiles, highest altitude first. The sort is stable
/// so equal altitudes keep raster order.
fn sorted_mini_tiles(ctx: &BuildContext) -> Vec<WalkPosition> {
    ctx.grid
        .walk_positions()
        .filter(|w| ctx.grid.mini_tile(*w).area_id_missing())
        .sorted_by_key(|w| std::cmp::Reverse(ctx.grid.mini_tile(*w).altitude().height()))
        .collect()
}

/// The first labeled 4-neighbor found, and the lowest id among the other
/// labeled neighbors.
fn find_neighboring_areas(grid: &TerrainGrid, w: WalkPosition) -> (Option<AreaId>, Option<AreaId>) {
    let mut result = (None, None);

    for n in grid.neighbors_4(w) {
        if let Some(id) = grid.mini_tile(n).area_id() {
            match result {
                (None, _) => result.0 = Some(id),
                (Some(first), second) if first != id => {
                    if second.map(|s| id < s).unwrap_or(true) {
                        result.1 = Some(id);
                    }
                }
                _ => {}
            }
        }
    }

    result
}

/// Alternates between the two areas each time the same pair meets.
fn choose_neighboring_area(
    counters: &mut FnvHashMap<(AreaId, AreaId), u32>,
    a: AreaId,
    b: AreaId,
) -> AreaId {
    let (a, b) = if a > b { (b, a) } else { (a, b) };
    let counter = counters.entry((a, b)).or_insert(0);
    let chosen = if *counter % 2 == 0 { a } else { b };
    *counter += 1;
    chosen
}

fn near_starting_location(ctx: &BuildContext, w: WalkPosition) -> bool {
    let t = TilePosition::from(w);
    ctx.starting_locations.iter().any(|start| {
        let anchor = *start + STARTING_LOCATION_OFFSET;
        t.distance(anchor) <= ctx.config.starting_location_merge_radius
    })
}

fn compute_temp_areas(ctx: &mut BuildContext, order: &[WalkPosition]) -> Vec<TempArea> {
    let mut temp_areas: Vec<TempArea> = Vec::new();
    let mut counters: FnvHashMap<(AreaId, AreaId), u32> = FnvHashMap::default();

    for &pos in order {
        let altitude = ctx.grid.mini_tile(pos).altitude().height();

        match find_neighboring_areas(&ctx.grid, pos) {
            (None, _) => {
                let id = AreaId::new(temp_areas.len() as u32 + 1);
                ctx.grid.mini_tile_mut(pos).set_area_id(id);
                temp_areas.push(TempArea::new(id, pos, altitude));
            }
            (Some(id), None) => {
                temp_areas[id.index()].add();
                ctx.grid.mini_tile_mut(pos).set_area_id(id);
            }
            (Some(first), Some(second)) => {
                let (smaller, bigger) = if temp_areas[first.index()].size > temp_areas[second.index()].size {
                    (second, first)
                } else {
                    (first, second)
                };

                let small = &temp_areas[smaller.index()];
                let big = &temp_areas[bigger.index()];
                let ratio = ctx.config.merge_altitude_ratio;

                let merge = small.size < ctx.config.merge_min_size
                    || small.highest_altitude < ctx.config.merge_min_altitude
                    || altitude as f64 / big.highest_altitude as f64 >= ratio
                    || altitude as f64 / small.highest_altitude as f64 >= ratio
                    || near_starting_location(ctx, pos);

                if merge {
                    temp_areas[bigger.index()].add();
                    ctx.grid.mini_tile_mut(pos).set_area_id(bigger);

                    let top = temp_areas[smaller.index()].top;
                    replace_area_ids(ctx, top, AreaTag::Area(bigger));

                    let (low, high) = if smaller < bigger {
                        (smaller.index(), bigger.index())
                    } else {
                        (bigger.index(), smaller.index())
                    };
                    let (head, tail) = temp_areas.split_at_mut(high);
                    if smaller.index() == low {
                        tail[0].merge(&mut head[low]);
                    } else {
                        head[low].merge(&mut tail[0]);
                    }
                } else {
                    let chosen = choose_neighboring_area(&mut counters, first, second);
                    temp_areas[chosen.index()].add();
                    ctx.grid.mini_tile_mut(pos).set_area_id(chosen);
                    ctx.raw_frontier.push(((first, second), pos));
                }
            }
        }
    }

    ctx.raw_frontier.retain(|((a, b), _)| a != b);

    trace!(
        "Watershed: {} temp areas, {} still valid",
        temp_areas.len(),
        temp_areas.iter().filter(|t| t.valid).count()
    );

    temp_areas
}

/// Relabels the 4-connected region containing `from` and keeps the raw
/// frontier pointing at live areas.
fn replace_area_ids(ctx: &mut BuildContext, from: WalkPosition, tag: AreaTag) {
    let old = ctx.grid.mini_tile(from).area();
    let old_id = match old.area_id() {
        Some(id) => id,
        None => panic!("relabeling unlabeled mini tile {:?}", from),
    };

    ctx.grid.mini_tile_mut(from).replace_area_id(tag);

    let mut to_search = vec![from];
    while let Some(current) = to_search.pop() {
        for &d in NEIGHBORS_4.iter() {
            let next = current + d;
            if ctx.grid.valid_walk(next) && ctx.grid.mini_tile(next).area() == old {
                to_search.push(next);
                ctx.grid.mini_tile_mut(next).replace_area_id(tag);
            }
        }
    }

    match tag {
        AreaTag::Area(new_id) => {
            for ((a, b), _) in ctx.raw_frontier.iter_mut() {
                if *a == old_id {
                    *a = new_id;
                }
                if *b == old_id {
                    *b = new_id;
                }
            }
        }
        _ => {
            ctx.raw_frontier
                .retain(|((a, b), _)| *a != old_id && *b != old_id);
        }
    }
}

/// Promotes the large temp areas to areas with dense ids. The others become
/// tiny regions.
fn create_areas(ctx: &mut BuildContext, temp_areas: &[TempArea]) {
    let mut next_id = 1u32;
    let mut next_tiny = -2i32;

    for temp in temp_areas.iter().filter(|t| t.valid) {
        if temp.size >= ctx.config.area_min_mini_tiles {
            let id = AreaId::new(next_id);
            next_id += 1;

            if id != temp.id {
                replace_area_ids(ctx, temp.top, AreaTag::Area(id));
            }

            ctx.areas
                .push(Area::new(id, temp.top, temp.highest_altitude, temp.size));
        } else {
            replace_area_ids(ctx, temp.top, AreaTag::Tiny(next_tiny));
            next_tiny -= 1;
        }
    }

    trace!(
        "Created {} areas and {} tiny regions",
        ctx.areas.len(),
        -2 - next_tiny
    );
}

/// A tile belongs to an area only if its 16 mini tiles all do.
fn set_area_id_in_tiles(ctx: &mut BuildContext) {
    let positions: Vec<TilePosition> = ctx.grid.tile_positions().collect();

    for t in positions {
        let mini_tiles: Vec<&MiniTile> = ctx
            .grid
            .mini_tiles_of_rect(t, (1, 1))
            .map(|w| ctx.grid.mini_tile(w))
            .collect();

        let area = match mini_tiles.iter().map(|m| m.area()).all_equal_value() {
            Ok(AreaTag::Area(id)) => Some(id),
            _ => None,
        };

        let min_altitude = mini_tiles
            .iter()
            .map(|m| m.altitude().height())
            .min()
            .unwrap_or(0);

        let tile = ctx.grid.tile_mut(t);
        tile.set_area(area);
        tile.set_min_altitude(min_altitude);
    }
}

/// Per-area tile statistics and resource ownership.
fn collect_information(ctx: &mut BuildContext) {
    for index in 0..ctx.resources.len() {
        let area = main_area(ctx, index);
        let resource = &mut ctx.resources[index];
        resource.set_area(area);

        if let Some(id) = area {
            let target = &mut ctx.areas[id.index()];
            if resource.is_mineral() {
                target.add_mineral(resource.id());
            } else {
                target.add_geyser(resource.id());
            }
        }
    }

    for t in ctx.grid.tile_positions() {
        let tile = ctx.grid.tile(t);
        if let Some(id) = tile.area() {
            ctx.areas[id.index()].add_tile_information(t, tile);
        }
    }

    for area in ctx.areas.iter_mut() {
        area.post_collect_information();
    }
}

/// The most common area under the resource footprint, else the area nearest
/// to its center.
fn main_area(ctx: &BuildContext, index: usize) -> Option<AreaId> {
    let resource = &ctx.resources[index];

    let counts = resource
        .tiles()
        .filter_map(|t| ctx.grid.tile(t).area())
        .counts();

    let mut best: Option<(AreaId, usize)> = None;
    for t in resource.tiles() {
        if let Some(id) = ctx.grid.tile(t).area() {
            let count = counts[&id];
            if best.map(|(_, c)| count > c).unwrap_or(true) {
                best = Some((id, count));
            }
        }
    }

    best.map(|(id, _)| id)
        .or_else(|| ctx.grid.nearest_area(WalkPosition::from(resource.center())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::map_data::MapData;
    use crate::pipeline::{classify, load, test_maps};

    fn build<'a>(map: &MapData, config: &'a AnalysisConfig) -> BuildContext<'a> {
        let mut ctx = load(map, config).unwrap();
        classify::run(&mut ctx, map);
        run(&mut ctx);
        ctx
    }

    #[test]
    fn neighboring_areas_prefer_the_lowest_second_id() {
        let mut grid = TerrainGrid::new(2, 2);
        let center = WalkPosition::new(4, 4);
        grid.mini_tile_mut(center + (0, -1)).set_area_id(AreaId::new(5));
        grid.mini_tile_mut(center + (-1, 0)).set_area_id(AreaId::new(7));
        grid.mini_tile_mut(center + (1, 0)).set_area_id(AreaId::new(3));
        grid.mini_tile_mut(center + (0, 1)).set_area_id(AreaId::new(5));

        assert_eq!(
            find_neighboring_areas(&grid, center),
            (Some(AreaId::new(5)), Some(AreaId::new(3)))
        );
        assert_eq!(find_neighboring_areas(&grid, WalkPosition::new(0, 7)), (None, None));
    }

    #[test]
    fn frontier_choice_alternates() {
        let mut counters = FnvHashMap::default();
        let (a, b) = (AreaId::new(2), AreaId::new(1));
        assert_eq!(choose_neighboring_area(&mut counters, a, b), b);
        assert_eq!(choose_neighboring_area(&mut counters, a, b), a);
        assert_eq!(choose_neighboring_area(&mut counters, b, a), b);
    }

    #[test]
    fn single_island_is_one_area() {
        let map = test_maps::island(24, 2);
        let config = AnalysisConfig::default();
        let ctx = build(&map, &config);

        assert_eq!(ctx.areas.len(), 1);
        assert!(ctx.raw_frontier.is_empty());

        let area = &ctx.areas[0];
        assert_eq!(area.tiles().len(), 20 * 20);
        assert_eq!(area.buildable_tile_count(), 20 * 20);
        assert_eq!(area.top_left(), TilePosition::new(2, 2));
        assert_eq!(area.bottom_right(), TilePosition::new(21, 21));
        assert_eq!(area.mini_tile_count(), 80 * 80);
        assert_eq!(
            ctx.grid.mini_tile(area.top()).altitude().height(),
            area.max_altitude()
        );
    }

    #[test]
    fn corridor_splits_two_islands() {
        let map = test_maps::two_islands_with_corridor();
        let config = AnalysisConfig::default();
        let ctx = build(&map, &config);

        assert_eq!(ctx.areas.len(), 2);
        assert_eq!(
            ctx.raw_frontier,
            vec![((AreaId::new(1), AreaId::new(2)), WalkPosition::new(103, 40))]
        );
        assert_eq!(ctx.grid.tile(TilePosition::new(5, 5)).area(), Some(AreaId::new(1)));
        assert_eq!(ctx.grid.tile(TilePosition::new(30, 5)).area(), Some(AreaId::new(2)));
        // The corridor only covers part of its tiles.
        assert_eq!(ctx.grid.tile(TilePosition::new(20, 10)).area(), None);
    }

    #[test]
    fn small_islands_are_tiny() {
        let mut map = test_maps::island(30, 2);
        map.set_tiles_walkable(TilePosition::new(14, 0), (2, 30), false)
            .set_buildable(TilePosition::new(14, 0), (2, 30), false)
            // Leaves a 6x6 mini tile islet once its edges erode.
            .set_tiles_walkable(TilePosition::new(14, 14), (2, 2), true);
        let config = AnalysisConfig::default();
        let ctx = build(&map, &config);

        assert_eq!(ctx.areas.len(), 2);
        let islet = ctx.grid.mini_tile(WalkPosition::new(60, 60)).area();
        assert_eq!(islet, AreaTag::Tiny(-2));
        assert!(ctx.grid.tile(TilePosition::new(15, 15)).area().is_none());
        assert!(ctx.grid.nearest_area(WalkPosition::new(60, 60)).is_some());
    }

    #[test]
    fn same_area_mini_tiles_are_connected() {
        let map = test_maps::two_islands_with_corridor();
        let config = AnalysisConfig::default();
        let ctx = build(&map, &config);

        for area in ctx.areas.iter() {
            let mut seen = std::collections::HashSet::new();
            let mut to_visit = vec![area.top()];
            seen.insert(area.top());
            while let Some(current) = to_visit.pop() {
                for n in ctx.grid.neighbors_4(current) {
                    if ctx.grid.mini_tile(n).area_id() == Some(area.id()) && seen.insert(n) {
                        to_visit.push(n);
                    }
                }
            }
            assert_eq!(seen.len(), area.mini_tile_count());
        }
    }

    #[test]
    fn resources_belong_to_the_area_under_them() {
        let mut map = test_maps::island(24, 2);
        map.add_mineral(TilePosition::new(6, 6), 1500)
            .add_geyser(TilePosition::new(12, 12), 5000);
        let config = AnalysisConfig::default();
        let ctx = build(&map, &config);

        let area = AreaId::new(1);
        assert!(ctx.resources.iter().all(|r| r.area() == Some(area)));
        assert_eq!(ctx.areas[0].minerals().len(), 1);
        assert_eq!(ctx.areas[0].geysers().len(), 1);
    }
}
