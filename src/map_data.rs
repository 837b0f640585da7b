//! Map input.
//!
//! `MapDataSource` is what the analysis reads a map through. `MapData` is an
//! owned, in-memory implementation for offline use and tests, with helpers
//! to paint terrain rectangle by rectangle or from ASCII rows.

use crate::constants::*;
use crate::location::*;
use crate::resource::*;
use crate::terrain::Grid;

/// Trait for providing raw map data to the analysis.
pub trait MapDataSource {
    /// Map size in tiles.
    fn tile_size(&self) -> (usize, usize);

    /// Map size in mini tiles. Four times the tile size on each axis.
    fn walk_size(&self) -> (usize, usize);

    fn is_walkable(&self, w: WalkPosition) -> bool;

    fn is_buildable(&self, t: TilePosition) -> bool;

    /// 0 = low ground, 1 = high ground, 2 = very high ground.
    fn ground_height(&self, t: TilePosition) -> u8;

    fn is_doodad(&self, _t: TilePosition) -> bool {
        false
    }

    fn resources(&self) -> &[ResourceInfo];

    fn starting_locations(&self) -> &[TilePosition] {
        &[]
    }
}

/// An in-memory map. Starts out entirely unwalkable and unbuildable.
#[derive(Clone, Debug)]
pub struct MapData {
    walkable: Grid<bool>,
    buildable: Grid<bool>,
    ground_height: Grid<u8>,
    doodads: Grid<bool>,
    resources: Vec<ResourceInfo>,
    starting_locations: Vec<TilePosition>,
}

impl MapData {
    pub fn new(tile_width: usize, tile_height: usize) -> Self {
        let per_tile = MINI_TILES_PER_TILE as usize;
        MapData {
            walkable: Grid::new(tile_width * per_tile, tile_height * per_tile, false),
            buildable: Grid::new(tile_width, tile_height, false),
            ground_height: Grid::new(tile_width, tile_height, 0),
            doodads: Grid::new(tile_width, tile_height, false),
            resources: Vec::new(),
            starting_locations: Vec::new(),
        }
    }

    /// Builds a map from one string per tile row.
    ///
    /// - `#` unwalkable
    /// - `,` walkable, not buildable
    /// - `.` buildable low ground
    /// - `h` buildable high ground
    /// - `v` buildable very high ground
    /// - `m` buildable, top-left tile of a 1500 mineral field
    /// - `g` buildable, top-left tile of a 5000 geyser
    /// - `s` buildable, a starting location
    pub fn from_tile_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        assert!(
            rows.iter().all(|r| r.chars().count() == width),
            "tile rows must all have the same length"
        );

        let mut map = MapData::new(width, height);

        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let t = TilePosition::new(x as i32, y as i32);
                match c {
                    '#' => {}
                    ',' => {
                        map.set_tiles_walkable(t, (1, 1), true);
                    }
                    _ => {
                        map.set_tiles_walkable(t, (1, 1), true);
                        map.set_buildable(t, (1, 1), true);
                    }
                }
                match c {
                    'h' => {
                        map.set_ground_height(t, (1, 1), 1);
                    }
                    'v' => {
                        map.set_ground_height(t, (1, 1), 2);
                    }
                    'm' => {
                        map.add_mineral(t, 1500);
                    }
                    'g' => {
                        map.add_geyser(t, 5000);
                    }
                    's' => {
                        map.add_starting_location(t);
                    }
                    _ => {}
                }
            }
        }

        map
    }

    /// Marks a rectangle of mini tiles walkable or not. Clipped to the map.
    pub fn set_walkable(&mut self, top_left: WalkPosition, size: (i32, i32), walkable: bool) -> &mut Self {
        for y in top_left.y()..top_left.y() + size.1 {
            for x in top_left.x()..top_left.x() + size.0 {
                if self.walkable.valid(x, y) {
                    self.walkable.set(x as usize, y as usize, walkable);
                }
            }
        }
        self
    }

    /// Marks every mini tile of a rectangle of tiles walkable or not.
    pub fn set_tiles_walkable(&mut self, top_left: TilePosition, size: (i32, i32), walkable: bool) -> &mut Self {
        self.set_walkable(
            WalkPosition::from(top_left),
            (size.0 * MINI_TILES_PER_TILE, size.1 * MINI_TILES_PER_TILE),
            walkable,
        )
    }

    pub fn set_buildable(&mut self, top_left: TilePosition, size: (i32, i32), buildable: bool) -> &mut Self {
        Self::fill_tiles(&mut self.buildable, top_left, size, buildable);
        self
    }

    pub fn set_ground_height(&mut self, top_left: TilePosition, size: (i32, i32), height: u8) -> &mut Self {
        Self::fill_tiles(&mut self.ground_height, top_left, size, height);
        self
    }

    pub fn set_doodad(&mut self, top_left: TilePosition, size: (i32, i32), doodad: bool) -> &mut Self {
        Self::fill_tiles(&mut self.doodads, top_left, size, doodad);
        self
    }

    /// Walkable, buildable ground over a rectangle of tiles.
    pub fn add_land(&mut self, top_left: TilePosition, size: (i32, i32)) -> &mut Self {
        self.set_tiles_walkable(top_left, size, true)
            .set_buildable(top_left, size, true)
    }

    pub fn add_mineral(&mut self, top_left: TilePosition, amount: u32) -> &mut Self {
        self.resources.push(ResourceInfo::mineral(top_left, amount));
        self
    }

    pub fn add_geyser(&mut self, top_left: TilePosition, amount: u32) -> &mut Self {
        self.resources.push(ResourceInfo::geyser(top_left, amount));
        self
    }

    pub fn add_resource(&mut self, resource: ResourceInfo) -> &mut Self {
        self.resources.push(resource);
        self
    }

    pub fn add_starting_location(&mut self, top_left: TilePosition) -> &mut Self {
        self.starting_locations.push(top_left);
        self
    }

    fn fill_tiles<T: Copy>(grid: &mut Grid<T>, top_left: TilePosition, size: (i32, i32), value: T) {
        for y in top_left.y()..top_left.y() + size.1 {
            for x in top_left.x()..top_left.x() + size.0 {
                if grid.valid(x, y) {
                    grid.set(x as usize, y as usize, value);
                }
            }
        }
    }
}

impl MapDataSource for MapData {
    fn tile_size(&self) -> (usize, usize) {
        (self.buildable.width(), self.buildable.height())
    }

    fn walk_size(&self) -> (usize, usize) {
        (self.walkable.width(), self.walkable.height())
    }

    fn is_walkable(&self, w: WalkPosition) -> bool {
        self.walkable.valid(w.x(), w.y()) && *self.walkable.get(w.x() as usize, w.y() as usize)
    }

    fn is_buildable(&self, t: TilePosition) -> bool {
        self.buildable.valid(t.x(), t.y()) && *self.buildable.get(t.x() as usize, t.y() as usize)
    }

    fn ground_height(&self, t: TilePosition) -> u8 {
        if self.ground_height.valid(t.x(), t.y()) {
            *self.ground_height.get(t.x() as usize, t.y() as usize)
        } else {
            0
        }
    }

    fn is_doodad(&self, t: TilePosition) -> bool {
        self.doodads.valid(t.x(), t.y()) && *self.doodads.get(t.x() as usize, t.y() as usize)
    }

    fn resources(&self) -> &[ResourceInfo] {
        &self.resources
    }

    fn starting_locations(&self) -> &[TilePosition] {
        &self.starting_locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_rows() {
        let map = MapData::from_tile_rows(&["#,.", "hm#"]);
        assert_eq!(map.tile_size(), (3, 2));
        assert_eq!(map.walk_size(), (12, 8));

        assert!(!map.is_walkable(WalkPosition::new(0, 0)));
        assert!(map.is_walkable(WalkPosition::new(4, 3)));
        assert!(!map.is_buildable(TilePosition::new(1, 0)));
        assert!(map.is_buildable(TilePosition::new(2, 0)));
        assert_eq!(map.ground_height(TilePosition::new(0, 1)), 1);
        assert_eq!(map.resources(), &[ResourceInfo::mineral(TilePosition::new(1, 1), 1500)]);
    }

    #[test]
    fn rectangles_are_clipped() {
        let mut map = MapData::new(2, 2);
        map.set_walkable(WalkPosition::new(6, 6), (5, 5), true);
        assert!(map.is_walkable(WalkPosition::new(7, 7)));
        assert!(!map.is_walkable(WalkPosition::new(8, 8)));
        assert!(!map.is_walkable(WalkPosition::new(5, 5)));
    }
}
