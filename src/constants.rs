/// Mini tiles along one side of a tile.
pub const MINI_TILES_PER_TILE: i32 = 4;
/// Pixels along one side of a mini tile.
pub const MINI_TILE_SIZE: i32 = 8;
/// Pixels along one side of a tile.
pub const TILE_SIZE: i32 = MINI_TILE_SIZE * MINI_TILES_PER_TILE;

/// Largest supported map side, in tiles.
pub const MAX_MAP_TILES: usize = 256;

/// Fixed-point cost of an orthogonal step between two neighboring cells.
pub const ORTHOGONAL_STEP_COST: u64 = 10_000;
/// Fixed-point cost of a diagonal step (`ORTHOGONAL_STEP_COST * sqrt(2)`).
pub const DIAGONAL_STEP_COST: u64 = 14_142;

/// Command center footprint, in tiles.
pub const COMMAND_CENTER_WIDTH: i32 = 4;
pub const COMMAND_CENTER_HEIGHT: i32 = 3;

/// Mineral field footprint, in tiles.
pub const MINERAL_WIDTH: i32 = 2;
pub const MINERAL_HEIGHT: i32 = 1;

/// Vespene geyser footprint, in tiles.
pub const GEYSER_WIDTH: i32 = 4;
pub const GEYSER_HEIGHT: i32 = 2;

/// The engine refuses command centers within this many tiles of a resource.
pub const RESOURCE_CLEARANCE_TILES: i32 = 3;

/// Minerals holding less than this are treated as placement blockers rather
/// than resources (the Andromeda special case).
pub const BLOCKING_MINERAL_AMOUNT_LIMIT: u32 = 9;

/// Geysers contribute this many times a mineral's potential.
pub const GEYSER_POTENTIAL_FACTOR: i32 = 3;

/// Offset from a starting location's top-left tile to the tile the
/// starting-location merge radius is measured from.
pub const STARTING_LOCATION_OFFSET: (i32, i32) = (2, 1);
