//! Entry points for analysing a map, and the finished analysis.
//!
//! The analysis runs to completion in one call:
//!
//! ```ignore
//! let analysis = AnalyzerBuilder::new()
//!     .min_tiles_between_bases(12)
//!     .analyze(&map_data)?;
//!
//! for base in analysis.bases() {
//!     ...
//! }
//! ```
//!
//! Once built, a `TerrainAnalysis` is never modified; re-analysing a map
//! produces a new value.

use crate::area::*;
use crate::base::Base;
use crate::chokepoint::*;
use crate::config::AnalysisConfig;
use crate::constants::MINI_TILE_SIZE;
use crate::distance::{self, UNREACHABLE};
use crate::error::AnalysisError;
use crate::graph::Graph;
use crate::location::*;
use crate::map_data::MapDataSource;
use crate::resource::*;
use crate::terrain::*;

pub struct TerrainAnalysis {
    grid: TerrainGrid,
    graph: Graph,
    resources: Vec<Resource>,
    starting_locations: Vec<TilePosition>,
    config: AnalysisConfig,
}

impl TerrainAnalysis {
    pub(crate) fn new(
        grid: TerrainGrid,
        graph: Graph,
        resources: Vec<Resource>,
        starting_locations: Vec<TilePosition>,
        config: AnalysisConfig,
    ) -> Self {
        TerrainAnalysis {
            grid,
            graph,
            resources,
            starting_locations,
            config,
        }
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn walk_size(&self) -> (i32, i32) {
        self.grid.walk_size()
    }

    pub fn tile_size(&self) -> (i32, i32) {
        self.grid.tile_size()
    }

    pub fn mini_tile(&self, w: WalkPosition) -> Option<&MiniTile> {
        if self.grid.valid_walk(w) {
            Some(self.grid.mini_tile(w))
        } else {
            None
        }
    }

    pub fn tile(&self, t: TilePosition) -> Option<&Tile> {
        if self.grid.valid_tile(t) {
            Some(self.grid.tile(t))
        } else {
            None
        }
    }

    pub fn areas(&self) -> &[Area] {
        self.graph.areas()
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.graph.area(id)
    }

    pub fn chokepoints(&self) -> &[ChokePoint] {
        self.graph.chokepoints()
    }

    pub fn chokepoint(&self, id: ChokePointId) -> Option<&ChokePoint> {
        self.graph.chokepoint(id)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.index())
    }

    pub fn minerals(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.is_mineral())
    }

    pub fn geysers(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.is_geyser())
    }

    /// Every base of every area, area by area.
    pub fn bases(&self) -> impl Iterator<Item = &Base> {
        self.areas().iter().flat_map(|area| area.bases().iter())
    }

    pub fn starting_locations(&self) -> &[TilePosition] {
        &self.starting_locations
    }

    /// The area `w` belongs to. Tiny regions, lakes and unwalkable mini
    /// tiles have none.
    pub fn area_at(&self, w: WalkPosition) -> Option<&Area> {
        self.mini_tile(w)
            .and_then(|m| m.area_id())
            .and_then(|id| self.area(id))
    }

    /// The area covering every mini tile of `t`, if there is one.
    pub fn area_at_tile(&self, t: TilePosition) -> Option<&Area> {
        self.tile(t).and_then(|tile| tile.area()).and_then(|id| self.area(id))
    }

    /// The area of `w`, or of the closest mini tile that has one.
    pub fn nearest_area(&self, w: WalkPosition) -> Option<&Area> {
        self.grid.nearest_area(w).and_then(|id| self.area(id))
    }

    pub fn nearest_area_to_tile(&self, t: TilePosition) -> Option<&Area> {
        let center = WalkPosition::from(t) + (1, 1);
        self.nearest_area(center)
    }

    /// Ground distances in pixels from `start` to each target over the whole
    /// walkable surface. Blocking resources are not crossed.
    pub fn compute_distances(&self, start: WalkPosition, targets: &[WalkPosition]) -> Vec<u32> {
        if !self.grid.valid_walk(start) {
            return vec![UNREACHABLE; targets.len()];
        }
        distance::compute_distances(&self.grid, start, targets, distance::walkable_ground)
    }

    /// Ground distances from `start` to each target staying inside `area`.
    pub fn compute_distances_in_area(
        &self,
        area: AreaId,
        start: WalkPosition,
        targets: &[WalkPosition],
    ) -> Vec<u32> {
        if !self.grid.valid_walk(start) {
            return vec![UNREACHABLE; targets.len()];
        }
        distance::compute_distances(&self.grid, start, targets, distance::within_area(area))
    }

    pub fn compute_distances_from_chokepoint(&self, start: ChokePointId, targets: &[ChokePointId]) -> Vec<u32> {
        self.graph.compute_distances_from_chokepoint(start, targets)
    }

    /// Approximate ground distance between two points anywhere on the map,
    /// following the chokepoint graph between areas.
    pub fn ground_distance(&self, a: WalkPosition, b: WalkPosition) -> Option<u32> {
        self.path(a, b).map(|(_, d)| d)
    }

    /// The chokepoints crossed going from `a` to `b`, with the length of the
    /// route. `None` when no route exists.
    ///
    /// A point outside every area joins the route at the closest mini tile
    /// of an area; the straight line to that mini tile is part of the length.
    pub fn path(&self, a: WalkPosition, b: WalkPosition) -> Option<(Vec<ChokePointId>, u32)> {
        let (start_a, area_a) = self.nearest_area_position(a)?;
        let (start_b, area_b) = self.nearest_area_position(b)?;

        if area_a.group_id() != area_b.group_id() {
            return None;
        }

        let approach = Self::straight_line_pixels(a, start_a) + Self::straight_line_pixels(b, start_b);

        if area_a.id() == area_b.id() {
            let d = self.compute_distances(start_a, &[start_b])[0];
            return if d == UNREACHABLE {
                None
            } else {
                let total = (d as u64 + approach).min(UNREACHABLE as u64 - 1) as u32;
                Some((Vec::new(), total))
            };
        }

        let exits = self.open_chokepoints(area_a);
        let entries = self.open_chokepoints(area_b);

        let to_exits = self.distances_to_chokepoints(area_a.id(), start_a, &exits);
        let to_entries = self.distances_to_chokepoints(area_b.id(), start_b, &entries);

        let mut best: Option<(u64, ChokePointId, ChokePointId)> = None;

        for (exit, &d_exit) in exits.iter().zip(to_exits.iter()) {
            if d_exit == UNREACHABLE {
                continue;
            }
            for (entry, &d_entry) in entries.iter().zip(to_entries.iter()) {
                let across = self.graph.distance(*exit, *entry);
                if d_entry == UNREACHABLE || across == UNREACHABLE {
                    continue;
                }

                let total = approach + d_exit as u64 + across as u64 + d_entry as u64;
                if best.map_or(true, |(d, _, _)| total < d) {
                    best = Some((total, *exit, *entry));
                }
            }
        }

        let (total, exit, entry) = best?;
        let total = total.min(UNREACHABLE as u64 - 1) as u32;

        Some((self.graph.path(exit, entry).to_vec(), total))
    }

    /// Start of an in-area walk for `w`: `w` itself when it lies in an area,
    /// otherwise the closest mini tile that does.
    fn nearest_area_position(&self, w: WalkPosition) -> Option<(WalkPosition, &Area)> {
        let position = self
            .grid
            .breadth_first_search(w, |_, m| m.area_id().is_some(), |_, _| true)?;
        let area = self.area_at(position)?;
        Some((position, area))
    }

    fn straight_line_pixels(from: WalkPosition, to: WalkPosition) -> u64 {
        (from.rounded_distance(to) * MINI_TILE_SIZE) as u64
    }

    fn open_chokepoints(&self, area: &Area) -> Vec<ChokePointId> {
        area.chokepoints()
            .filter(|id| self.chokepoint(*id).map_or(false, |cp| !cp.blocked()))
            .collect()
    }

    fn distances_to_chokepoints(&self, area: AreaId, start: WalkPosition, chokepoints: &[ChokePointId]) -> Vec<u32> {
        let targets: Vec<WalkPosition> = chokepoints
            .iter()
            .filter_map(|id| self.chokepoint(*id))
            .map(|cp| cp.center())
            .collect();

        self.compute_distances_in_area(area, start, &targets)
    }
}

/// Configures and runs an analysis.
#[derive(Clone, Debug, Default)]
pub struct AnalyzerBuilder {
    config: AnalysisConfig,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn area_min_mini_tiles(mut self, value: usize) -> Self {
        self.config.area_min_mini_tiles = value;
        self
    }

    pub fn lake_max_mini_tiles(mut self, value: usize) -> Self {
        self.config.lake_max_mini_tiles = value;
        self
    }

    pub fn cluster_min_distance(mut self, value: i32) -> Self {
        self.config.cluster_min_distance = value;
        self
    }

    pub fn max_tiles_between_command_center_and_resources(mut self, value: i32) -> Self {
        self.config.max_tiles_between_command_center_and_resources = value;
        self
    }

    pub fn min_tiles_between_bases(mut self, value: i32) -> Self {
        self.config.min_tiles_between_bases = value;
        self
    }

    pub fn create_bases(mut self, value: bool) -> Self {
        self.config.create_bases = value;
        self
    }

    pub fn analyze(&self, data_source: &dyn MapDataSource) -> Result<TerrainAnalysis, AnalysisError> {
        crate::pipeline::run(data_source, &self.config)
    }
}

/// Analyse a map with the default configuration.
pub fn analyze_map(data_source: &dyn MapDataSource) -> Result<TerrainAnalysis, AnalysisError> {
    AnalyzerBuilder::default().analyze(data_source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_maps;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn analysis_can_be_shared() {
        assert_send_sync::<TerrainAnalysis>();
    }

    #[test]
    fn builder_overrides_config() {
        let builder = AnalyzerBuilder::new()
            .min_tiles_between_bases(12)
            .create_bases(false);

        assert_eq!(builder.config.min_tiles_between_bases, 12);
        assert!(!builder.config.create_bases);
        assert_eq!(builder.config.area_min_mini_tiles, 64);
    }

    #[test]
    fn queries_outside_the_map() {
        let analysis = analyze_map(&test_maps::island(24, 2)).unwrap();

        assert!(analysis.mini_tile(WalkPosition::new(-1, 0)).is_none());
        assert!(analysis.area_at(WalkPosition::new(0, 500)).is_none());
        assert_eq!(
            analysis.compute_distances(WalkPosition::new(-3, -3), &[WalkPosition::new(20, 20)]),
            vec![UNREACHABLE]
        );
    }

    #[test]
    fn sea_resolves_to_the_nearest_area() {
        let analysis = analyze_map(&test_maps::island(24, 2)).unwrap();

        assert!(analysis.area_at(WalkPosition::new(1, 1)).is_none());
        let nearest = analysis.nearest_area(WalkPosition::new(1, 1)).map(|a| a.id());
        assert_eq!(nearest, Some(AreaId::new(1)));
        assert_eq!(
            analysis.area_at_tile(TilePosition::new(10, 10)).map(|a| a.id()),
            Some(AreaId::new(1))
        );
    }

    #[test]
    fn same_area_distance_is_exact() {
        let analysis = analyze_map(&test_maps::island(24, 2)).unwrap();
        let a = WalkPosition::new(20, 20);
        let b = WalkPosition::new(30, 20);

        assert_eq!(analysis.ground_distance(a, b), Some(80));
        let (chokepoints, _) = analysis.path(a, b).unwrap();
        assert!(chokepoints.is_empty());
    }

    #[test]
    fn points_off_the_ground_count_their_approach() {
        let analysis = analyze_map(&test_maps::island(24, 2)).unwrap();
        let shore = WalkPosition::new(7, 20);
        let target = WalkPosition::new(20, 20);
        assert!(!analysis.grid().mini_tile(shore).walkable());

        let entry = analysis
            .grid()
            .breadth_first_search(shore, |_, m| m.area_id().is_some(), |_, _| true)
            .unwrap();
        let approach = shore.rounded_distance(entry) as u32 * 8;
        assert!(approach > 0);

        let on_ground = analysis.compute_distances(entry, &[target])[0];
        assert_eq!(analysis.ground_distance(shore, target), Some(approach + on_ground));
        assert_eq!(
            analysis.ground_distance(target, shore),
            analysis.ground_distance(shore, target)
        );
    }

    #[test]
    fn distance_through_the_corridor() {
        let analysis = analyze_map(&test_maps::two_islands_with_corridor()).unwrap();
        let west = WalkPosition::new(30, 40);
        let east = WalkPosition::new(130, 40);

        let (chokepoints, length) = analysis.path(west, east).unwrap();
        assert_eq!(chokepoints, vec![ChokePointId::new(0)]);

        // At least the straight line, at most a generous detour.
        assert!(length >= (130 - 30) * 8);
        assert!(length < (130 - 30) * 8 * 2);

        let exact = analysis.compute_distances(west, &[east])[0];
        assert!(exact <= length);
    }

    #[test]
    fn separate_islands_have_no_route() {
        let mut map = crate::map_data::MapData::new(40, 20);
        map.add_land(TilePosition::new(2, 2), (12, 16))
            .add_land(TilePosition::new(26, 2), (12, 16));
        let analysis = analyze_map(&map).unwrap();

        let west = WalkPosition::new(30, 40);
        let east = WalkPosition::new(130, 40);

        assert_eq!(analysis.areas().len(), 2);
        assert_ne!(analysis.areas()[0].group_id(), analysis.areas()[1].group_id());
        assert_eq!(analysis.ground_distance(west, east), None);
        assert_eq!(analysis.compute_distances(west, &[east]), vec![UNREACHABLE]);
    }
}
