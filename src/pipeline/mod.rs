//! The one-shot analysis pipeline.
//!
//! Each step reads and extends a shared `BuildContext`. Steps run strictly in
//! order; input problems are reported by the first step and nothing after it
//! can fail.

pub mod areas;
pub mod bases;
pub mod chokepoints;
pub mod classify;

use crate::analysis::TerrainAnalysis;
use crate::area::*;
use crate::chokepoint::*;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::graph::Graph;
use crate::location::*;
use crate::map_data::MapDataSource;
use crate::resource::*;
use crate::terrain::*;
use log::*;

/// Working state shared by the pipeline steps.
pub struct BuildContext<'a> {
    pub config: &'a AnalysisConfig,
    pub grid: TerrainGrid,
    pub resources: Vec<Resource>,
    pub starting_locations: Vec<TilePosition>,
    /// Mini tiles where two areas met without merging, with the two areas.
    pub raw_frontier: Vec<((AreaId, AreaId), WalkPosition)>,
    pub areas: Vec<Area>,
    pub chokepoints: Vec<ChokePoint>,
    /// Row-major chokepoint distance matrix, filled by the chokepoint step.
    pub chokepoint_distances: Vec<u32>,
    pub chokepoint_paths: Vec<Vec<ChokePointId>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AnalysisStep {
    Classify,
    Areas,
    ChokePoints,
    Bases,
    Complete,
}

impl AnalysisStep {
    fn next(self, config: &AnalysisConfig) -> Self {
        match self {
            AnalysisStep::Classify => AnalysisStep::Areas,
            AnalysisStep::Areas => AnalysisStep::ChokePoints,
            AnalysisStep::ChokePoints if config.create_bases => AnalysisStep::Bases,
            AnalysisStep::ChokePoints | AnalysisStep::Bases | AnalysisStep::Complete => {
                AnalysisStep::Complete
            }
        }
    }
}

/// Validate the input and build the context the steps work on.
pub fn load<'a>(
    data_source: &dyn MapDataSource,
    config: &'a AnalysisConfig,
) -> Result<BuildContext<'a>, AnalysisError> {
    let tiles = data_source.tile_size();
    let mini_tiles = data_source.walk_size();
    let per_tile = crate::constants::MINI_TILES_PER_TILE as usize;

    let valid_tiles = |n: usize| n > 0 && n <= crate::constants::MAX_MAP_TILES;
    if !valid_tiles(tiles.0)
        || !valid_tiles(tiles.1)
        || mini_tiles.0 != tiles.0 * per_tile
        || mini_tiles.1 != tiles.1 * per_tile
    {
        return Err(AnalysisError::InvalidDimensions { tiles, mini_tiles });
    }

    let grid = TerrainGrid::new(tiles.0, tiles.1);

    let mut resources = Vec::new();
    for (index, info) in data_source.resources().iter().enumerate() {
        let (w, h) = info.kind.size();
        let bottom_right = info.top_left + (w - 1, h - 1);
        if !grid.valid_tile(info.top_left) || !grid.valid_tile(bottom_right) {
            return Err(AnalysisError::ResourceOutOfBounds {
                index,
                x: info.top_left.x(),
                y: info.top_left.y(),
            });
        }
        resources.push(Resource::new(ResourceId::new(index), info));
    }

    let starting_locations = data_source.starting_locations().to_vec();
    if let Some(outside) = starting_locations.iter().find(|t| !grid.valid_tile(**t)) {
        return Err(AnalysisError::StartingLocationOutOfBounds {
            x: outside.x(),
            y: outside.y(),
        });
    }

    Ok(BuildContext {
        config,
        grid,
        resources,
        starting_locations,
        raw_frontier: Vec::new(),
        areas: Vec::new(),
        chokepoints: Vec::new(),
        chokepoint_distances: Vec::new(),
        chokepoint_paths: Vec::new(),
    })
}

/// Run every step of the analysis.
pub fn run(
    data_source: &dyn MapDataSource,
    config: &AnalysisConfig,
) -> Result<TerrainAnalysis, AnalysisError> {
    let mut ctx = load(data_source, config)?;
    let mut step = AnalysisStep::Classify;

    while step != AnalysisStep::Complete {
        match step {
            AnalysisStep::Classify => {
                classify::run(&mut ctx, data_source);
                debug!(
                    "Classify: {}x{} mini tiles, {} resources, {} blocking",
                    ctx.grid.walk_size().0,
                    ctx.grid.walk_size().1,
                    ctx.resources.len(),
                    ctx.resources.iter().filter(|r| r.blocking()).count()
                );
            }
            AnalysisStep::Areas => {
                areas::run(&mut ctx);
                debug!(
                    "Areas: {} areas, {} raw frontier positions",
                    ctx.areas.len(),
                    ctx.raw_frontier.len()
                );
            }
            AnalysisStep::ChokePoints => {
                chokepoints::run(&mut ctx);
                debug!("ChokePoints: {} chokepoints", ctx.chokepoints.len());
            }
            AnalysisStep::Bases => {
                bases::run(&mut ctx);
                debug!(
                    "Bases: {} bases",
                    ctx.areas.iter().map(|a| a.bases().len()).sum::<usize>()
                );
            }
            AnalysisStep::Complete => {}
        }

        step = step.next(config);
    }

    Ok(finish(ctx))
}

fn finish(ctx: BuildContext) -> TerrainAnalysis {
    let graph = Graph::new(
        ctx.areas,
        ctx.chokepoints,
        ctx.chokepoint_distances,
        ctx.chokepoint_paths,
    );

    TerrainAnalysis::new(
        ctx.grid,
        graph,
        ctx.resources,
        ctx.starting_locations,
        ctx.config.clone(),
    )
}

#[cfg(test)]
pub(crate) mod test_maps {
    use crate::location::*;
    use crate::map_data::MapData;

    /// One square of buildable land in the middle of the sea.
    pub fn island(tile_size: i32, land_offset: i32) -> MapData {
        let mut map = MapData::new(tile_size as usize, tile_size as usize);
        map.add_land(
            TilePosition::new(land_offset, land_offset),
            (tile_size - 2 * land_offset, tile_size - 2 * land_offset),
        );
        map
    }

    /// Two landmasses joined by a corridor one mini tile wide.
    pub fn two_islands_with_corridor() -> MapData {
        let mut map = MapData::new(40, 20);
        map.add_land(TilePosition::new(2, 2), (12, 16))
            .add_land(TilePosition::new(26, 2), (12, 16))
            // Three mini tiles wide before the erosion of unwalkable edges.
            .set_walkable(WalkPosition::new(56, 39), (48, 3), true);
        map
    }
}
