//! Base placement.
//!
//! Each resource spreads a potential over the tiles of its area that are
//! within reach: the closer a tile is (by ground distance), the higher its
//! potential. Bases are then placed greedily at the command center footprint
//! collecting the most potential, taking the resources around them out of
//! the field, until every resource of the area has a base or no valid
//! location remains.

use super::BuildContext;
use crate::area::*;
use crate::base::Base;
use crate::config::AnalysisConfig;
use crate::constants::*;
use crate::distance::{self, UNREACHABLE};
use crate::location::*;
use crate::resource::*;
use crate::terrain::*;
use fnv::{FnvHashMap, FnvHashSet};
use log::*;

const COMMAND_CENTER_SIZE: (i32, i32) = (COMMAND_CENTER_WIDTH, COMMAND_CENTER_HEIGHT);

pub fn run(ctx: &mut BuildContext) {
    for index in 0..ctx.areas.len() {
        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[index], &ctx.resources, ctx.config);
        let mut bases = placer.place_all();

        for base in bases.iter_mut() {
            let near_start = ctx
                .starting_locations
                .iter()
                .any(|s| s.chebyshev_distance(base.location()) <= RESOURCE_CLEARANCE_TILES);
            if near_start {
                base.set_starting();
            }
        }

        for base in bases {
            ctx.areas[index].add_base(base);
        }
    }

    for start in ctx.starting_locations.iter() {
        let found = ctx
            .areas
            .iter()
            .flat_map(|a| a.bases())
            .any(|b| b.starting() && b.location().chebyshev_distance(*start) <= RESOURCE_CLEARANCE_TILES);
        if !found {
            warn!("No base found for starting location {:?}", start);
        }
    }
}

/// Base placement state for one area.
pub struct BasePlacer<'a> {
    grid: &'a mut TerrainGrid,
    area: &'a Area,
    resources: &'a [Resource],
    config: &'a AnalysisConfig,
    remaining: Vec<ResourceId>,
    contributions: FnvHashMap<ResourceId, Vec<(TilePosition, i32)>>,
    forbidden: FnvHashSet<TilePosition>,
    bases: Vec<Base>,
}

impl<'a> BasePlacer<'a> {
    pub fn new(
        grid: &'a mut TerrainGrid,
        area: &'a Area,
        resources: &'a [Resource],
        config: &'a AnalysisConfig,
    ) -> Self {
        let remaining: Vec<ResourceId> = area
            .minerals()
            .iter()
            .filter(|id| resources[id.index()].initial_amount() >= config.min_mineral_amount)
            .chain(
                area.geysers()
                    .iter()
                    .filter(|id| resources[id.index()].initial_amount() >= config.min_geyser_amount),
            )
            .filter(|id| !resources[id.index()].blocking())
            .copied()
            .collect();

        let mut placer = BasePlacer {
            grid,
            area,
            resources,
            config,
            remaining,
            contributions: FnvHashMap::default(),
            forbidden: FnvHashSet::default(),
            bases: Vec::new(),
        };

        for id in placer.remaining.clone() {
            placer.add_potential(id);
            placer.forbid_around(id);
        }

        placer
    }

    /// Spreads the resource's potential over the tiles of the area.
    fn add_potential(&mut self, id: ResourceId) {
        let resource = &self.resources[id.index()];
        let (w, h) = resource.size();
        let max_tiles = self.config.max_tiles_between_command_center_and_resources;
        let full_potential = max_tiles + RESOURCE_CLEARANCE_TILES;

        let mut tiles = Vec::new();
        for dy in -COMMAND_CENTER_HEIGHT - max_tiles..h + COMMAND_CENTER_HEIGHT + max_tiles {
            for dx in -COMMAND_CENTER_WIDTH - max_tiles..w + COMMAND_CENTER_WIDTH + max_tiles {
                let t = resource.top_left() + (dx, dy);
                if self.grid.valid_tile(t) && self.grid.tile(t).area() == Some(self.area.id()) {
                    tiles.push(t);
                }
            }
        }

        let sources: Vec<WalkPosition> = self
            .grid
            .mini_tiles_of_rect(resource.top_left(), resource.size())
            .collect();
        let centers: Vec<WalkPosition> = tiles
            .iter()
            .map(|t| WalkPosition::from(*t) + (MINI_TILES_PER_TILE / 2, MINI_TILES_PER_TILE / 2))
            .collect();

        let distances = distance::compute_distances_within(
            self.grid,
            &sources,
            &centers,
            distance::walkable_ground,
            (full_potential * TILE_SIZE) as u32,
        );

        let mut contribution = Vec::new();
        for (t, pixels) in tiles.into_iter().zip(distances) {
            if pixels == UNREACHABLE {
                continue;
            }
            let dist_tiles = (pixels as i32 + TILE_SIZE / 2) / TILE_SIZE;
            let mut score = (full_potential - dist_tiles).max(0);
            if resource.is_geyser() {
                score *= GEYSER_POTENTIAL_FACTOR;
            }
            if score > 0 {
                let tile = self.grid.tile_mut(t);
                tile.set_internal_data(tile.internal_data() + score);
                contribution.push((t, score));
            }
        }

        self.contributions.insert(id, contribution);
    }

    fn remove_potential(&mut self, id: ResourceId) {
        if let Some(contribution) = self.contributions.remove(&id) {
            for (t, score) in contribution {
                let tile = self.grid.tile_mut(t);
                tile.set_internal_data(tile.internal_data() - score);
            }
        }
    }

    /// No command center may be built this close to a resource.
    fn forbid_around(&mut self, id: ResourceId) {
        let resource = &self.resources[id.index()];
        let (w, h) = resource.size();
        for dy in -RESOURCE_CLEARANCE_TILES..h + RESOURCE_CLEARANCE_TILES {
            for dx in -RESOURCE_CLEARANCE_TILES..w + RESOURCE_CLEARANCE_TILES {
                let t = resource.top_left() + (dx, dy);
                if self.grid.valid_tile(t) {
                    self.forbidden.insert(t);
                }
            }
        }
    }

    /// Sum of the potential under a command center at `location`, or -1 if
    /// one cannot be built there.
    pub fn compute_base_location_score(&self, location: TilePosition) -> i32 {
        let mut sum = 0;

        for dy in 0..COMMAND_CENTER_HEIGHT {
            for dx in 0..COMMAND_CENTER_WIDTH {
                let t = location + (dx, dy);
                if !self.grid.valid_tile(t) {
                    return -1;
                }

                let tile = self.grid.tile(t);
                if !tile.buildable()
                    || tile.area() != Some(self.area.id())
                    || self.forbidden.contains(&t)
                    || tile.resource().is_some()
                    || tile.claimed()
                {
                    return -1;
                }

                sum += tile.internal_data();
            }
        }

        sum
    }

    /// Checks the surroundings of `location`. Tiny minerals in the way are
    /// collected into `blocking_minerals` instead of rejecting the location.
    pub fn validate_base_location(&self, location: TilePosition, blocking_minerals: &mut Vec<ResourceId>) -> bool {
        blocking_minerals.clear();

        for dy in -RESOURCE_CLEARANCE_TILES..COMMAND_CENTER_HEIGHT + RESOURCE_CLEARANCE_TILES {
            for dx in -RESOURCE_CLEARANCE_TILES..COMMAND_CENTER_WIDTH + RESOURCE_CLEARANCE_TILES {
                let t = location + (dx, dy);
                if !self.grid.valid_tile(t) {
                    continue;
                }

                if let Some(id) = self.grid.tile(t).resource() {
                    let resource = &self.resources[id.index()];
                    if resource.is_geyser() || resource.initial_amount() >= BLOCKING_MINERAL_AMOUNT_LIMIT {
                        return false;
                    }
                    if !blocking_minerals.contains(&id) {
                        blocking_minerals.push(id);
                    }
                }
            }
        }

        self.bases
            .iter()
            .all(|b| b.location().rounded_distance(location) >= self.config.min_tiles_between_bases)
    }

    /// The valid location with the highest positive score; raster order
    /// breaks ties.
    pub fn find_best_location(&self) -> Option<(TilePosition, i32, Vec<ResourceId>)> {
        let top_left = self.area.top_left();
        let bottom_right = self.area.bottom_right();

        let mut best: Option<(TilePosition, i32, Vec<ResourceId>)> = None;
        let mut blocking = Vec::new();

        for y in top_left.y()..=bottom_right.y() - COMMAND_CENTER_HEIGHT + 1 {
            for x in top_left.x()..=bottom_right.x() - COMMAND_CENTER_WIDTH + 1 {
                let location = TilePosition::new(x, y);
                let score = self.compute_base_location_score(location);
                let best_score = best.as_ref().map(|(_, s, _)| *s).unwrap_or(0);
                if score <= best_score {
                    continue;
                }

                if self.validate_base_location(location, &mut blocking) {
                    best = Some((location, score, blocking.clone()));
                } else {
                    trace!("Rejected base location {:?} (score {})", location, score);
                }
            }
        }

        best
    }

    /// Places bases until every resource is taken or no location is left.
    pub fn place_all(mut self) -> Vec<Base> {
        let max_pixels = self.config.max_tiles_between_command_center_and_resources * TILE_SIZE;

        while !self.remaining.is_empty() {
            let (location, score, blocking_minerals) = match self.find_best_location() {
                Some(best) => best,
                None => break,
            };

            let resources = self.resources;
            let (assigned, remaining): (Vec<ResourceId>, Vec<ResourceId>) =
                self.remaining.iter().copied().partition(|id| {
                    let center = resources[id.index()].center();
                    distance_to_rectangle(center, location, COMMAND_CENTER_SIZE) + 2 <= max_pixels
                });

            if assigned.is_empty() {
                warn!(
                    "Area {:?}: base location {:?} collects no resources",
                    self.area.id(),
                    location
                );
                break;
            }

            self.remaining = remaining;
            for id in assigned.iter() {
                self.remove_potential(*id);
            }

            for dy in 0..COMMAND_CENTER_HEIGHT {
                for dx in 0..COMMAND_CENTER_WIDTH {
                    self.grid.tile_mut(location + (dx, dy)).claim();
                }
            }

            let (minerals, geysers): (Vec<ResourceId>, Vec<ResourceId>) = assigned
                .into_iter()
                .partition(|id| resources[id.index()].is_mineral());

            debug!(
                "Area {:?}: base at {:?} with {} minerals and {} geysers (score {})",
                self.area.id(),
                location,
                minerals.len(),
                geysers.len(),
                score
            );

            self.bases.push(Base::new(
                self.area.id(),
                location,
                minerals,
                geysers,
                blocking_minerals,
                score,
            ));
        }

        for id in self.remaining.clone() {
            self.remove_potential(id);
        }

        self.bases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_data::MapData;
    use crate::pipeline::{areas, chokepoints, classify, load, test_maps};

    fn prepared<'a>(map: &MapData, config: &'a AnalysisConfig) -> BuildContext<'a> {
        let mut ctx = load(map, config).unwrap();
        classify::run(&mut ctx, map);
        areas::run(&mut ctx);
        chokepoints::run(&mut ctx);
        ctx
    }

    fn two_minerals() -> MapData {
        let mut map = test_maps::island(24, 2);
        map.add_mineral(TilePosition::new(8, 9), 1500)
            .add_mineral(TilePosition::new(14, 9), 1500);
        map
    }

    #[test]
    fn score_is_negative_where_nothing_can_be_built() {
        let map = two_minerals();
        let config = AnalysisConfig::default();
        let mut ctx = prepared(&map, &config);

        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        assert_eq!(placer.compute_base_location_score(TilePosition::new(-1, 4)), -1);
        assert_eq!(placer.compute_base_location_score(TilePosition::new(21, 4)), -1);
        // Footprint covers the sea.
        assert_eq!(placer.compute_base_location_score(TilePosition::new(0, 4)), -1);
        // Footprint covers a mineral.
        assert_eq!(placer.compute_base_location_score(TilePosition::new(7, 8)), -1);
        assert!(placer.compute_base_location_score(TilePosition::new(8, 3)) > 0);
    }

    #[test]
    fn best_location_beats_every_valid_location() {
        let map = two_minerals();
        let config = AnalysisConfig::default();
        let mut ctx = prepared(&map, &config);

        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        let (best, best_score, _) = placer.find_best_location().unwrap();
        assert_eq!(placer.compute_base_location_score(best), best_score);

        let mut blocking = Vec::new();
        for y in 0..24 {
            for x in 0..24 {
                let location = TilePosition::new(x, y);
                if placer.validate_base_location(location, &mut blocking) {
                    assert!(placer.compute_base_location_score(location) <= best_score);
                }
            }
        }
    }

    #[test]
    fn one_base_takes_both_minerals() {
        let map = two_minerals();
        let config = AnalysisConfig::default();
        let mut ctx = prepared(&map, &config);

        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        let bases = placer.place_all();

        assert_eq!(bases.len(), 1);
        assert_eq!(bases[0].minerals().len(), 2);
        assert!(bases[0].geysers().is_empty());

        // The potential field is cleared once the area is done.
        assert!(ctx.grid.tile_positions().all(|t| ctx.grid.tile(t).internal_data() == 0));
        let location = bases[0].location();
        assert!(ctx.grid.tile(location).claimed());
    }

    #[test]
    fn tiny_minerals_block_without_rejecting() {
        let mut map = two_minerals();
        map.add_mineral(TilePosition::new(2, 2), 8);
        let config = AnalysisConfig::default();
        let mut ctx = prepared(&map, &config);

        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        let mut blocking = Vec::new();
        assert!(placer.validate_base_location(TilePosition::new(4, 2), &mut blocking));
        assert_eq!(blocking, vec![ctx.resources[2].id()]);

        // Full minerals nearby reject the location.
        assert!(!placer.validate_base_location(TilePosition::new(8, 5), &mut blocking));
    }

    #[test]
    fn claimed_footprints_score_negative() {
        let map = two_minerals();
        let config = AnalysisConfig::default();
        let mut ctx = prepared(&map, &config);

        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        let bases = placer.place_all();
        let location = bases[0].location();

        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        assert_eq!(placer.compute_base_location_score(location), -1);
        assert_eq!(placer.compute_base_location_score(location + (1, 1)), -1);
        assert_eq!(placer.compute_base_location_score(location + (-3, -2)), -1);
    }

    // Minerals below 9 only show up as path blockers on a few maps
    // (Andromeda's mineral walls); they never stop a base from being placed.
    #[test]
    fn andromeda_blocking_mineral_threshold_is_nine() {
        let location = TilePosition::new(4, 2);
        let config = AnalysisConfig::default();

        let mut map = two_minerals();
        map.add_mineral(TilePosition::new(2, 2), 8);
        let mut ctx = prepared(&map, &config);
        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        let mut blocking = Vec::new();
        assert!(placer.validate_base_location(location, &mut blocking));
        assert_eq!(blocking, vec![ResourceId::new(2)]);

        let mut map = two_minerals();
        map.add_mineral(TilePosition::new(2, 2), 9);
        let mut ctx = prepared(&map, &config);
        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        let mut blocking = Vec::new();
        assert!(!placer.validate_base_location(location, &mut blocking));
    }

    #[test]
    fn geysers_weigh_more_than_minerals() {
        let mut map = test_maps::island(40, 2);
        map.add_mineral(TilePosition::new(8, 8), 1500)
            .add_geyser(TilePosition::new(26, 26), 5000);
        let config = AnalysisConfig::default();
        let mut ctx = prepared(&map, &config);

        let placer = BasePlacer::new(&mut ctx.grid, &ctx.areas[0], &ctx.resources, &config);
        // Same offsets from each resource, just outside their clearance.
        let near_mineral = placer.compute_base_location_score(TilePosition::new(8, 2));
        let near_geyser = placer.compute_base_location_score(TilePosition::new(26, 20));
        assert!(near_mineral > 0);
        assert!(near_geyser > near_mineral);
    }
}
