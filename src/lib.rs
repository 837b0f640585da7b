pub mod analysis;
pub mod area;
pub mod base;
pub mod chokepoint;
pub mod config;
pub mod constants;
pub mod distance;
pub mod error;
pub mod graph;
pub mod location;
pub mod map_data;
pub mod pipeline;
pub mod resource;
pub mod terrain;

pub use analysis::{analyze_map, AnalyzerBuilder, TerrainAnalysis};
pub use area::{Area, AreaId, GroupId};
pub use base::Base;
pub use chokepoint::{ChokePoint, ChokePointId, ChokePointNode};
pub use config::AnalysisConfig;
pub use distance::UNREACHABLE;
pub use error::AnalysisError;
pub use graph::Graph;
pub use location::*;
pub use map_data::{MapData, MapDataSource};
pub use resource::{Resource, ResourceId, ResourceInfo, ResourceKind};
pub use terrain::{Altitude, AreaTag, MiniTile, Tile, TileFlags, TerrainGrid};
