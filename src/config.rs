//! Tunables of the analysis.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Temporary areas smaller than this become tiny regions.
    pub area_min_mini_tiles: usize,
    /// Largest unwalkable region still counted as a lake.
    pub lake_max_mini_tiles: usize,
    pub lake_max_width_in_mini_tiles: i32,
    /// Two areas meeting at a tile merge when the smaller one has fewer mini
    /// tiles than this...
    pub merge_min_size: usize,
    /// ...or a highest altitude below this...
    pub merge_min_altitude: u16,
    /// ...or the meeting altitude reaches this fraction of either area's
    /// highest altitude.
    pub merge_altitude_ratio: f64,
    /// Areas always merge within this many tiles of a starting location.
    pub starting_location_merge_radius: f64,
    /// Frontier positions further apart than this (queen-wise, in mini
    /// tiles) form separate chokepoints.
    pub cluster_min_distance: i32,
    pub max_tiles_between_command_center_and_resources: i32,
    pub min_tiles_between_bases: i32,
    pub min_mineral_amount: u32,
    pub min_geyser_amount: u32,
    /// A door of a blocking candidate must open onto at least this many
    /// mini tiles.
    pub blocking_door_min_mini_tiles: usize,
    pub create_bases: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            area_min_mini_tiles: 64,
            lake_max_mini_tiles: 300,
            lake_max_width_in_mini_tiles: 8 * 4,
            merge_min_size: 80,
            merge_min_altitude: 80,
            merge_altitude_ratio: 0.90,
            starting_location_merge_radius: 3.0,
            cluster_min_distance: 17,
            max_tiles_between_command_center_and_resources: 10,
            min_tiles_between_bases: 10,
            min_mineral_amount: 40,
            min_geyser_amount: 300,
            blocking_door_min_mini_tiles: 400,
            create_bases: true,
        }
    }
}
