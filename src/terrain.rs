use crate::area::AreaId;
use crate::constants::*;
use crate::location::*;
use crate::resource::ResourceId;
use bitflags::*;
use fnv::FnvHashSet;
use std::collections::VecDeque;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u8 {
        const NONE = 0;
        const BUILDABLE = 1;
        const DOODAD = 2;
    }
}

/// Neighbor offsets for 8-directional movement, in raster order.
pub const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Neighbor offsets for 4-directional (cardinal) movement, in raster order.
pub const NEIGHBORS_4: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// A row-major 2D array covering the map at one resolution.
#[derive(Clone, Debug)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: usize, height: usize, initial: T) -> Self {
        Grid {
            width,
            height,
            data: vec![initial; width * height],
        }
    }
}

impl<T> Grid<T> {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn valid(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[y * self.width + x]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let index = y * self.width + x;
        &mut self.data[index]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }

    #[inline]
    pub fn get_index(&self, index: usize) -> &T {
        &self.data[index]
    }

    #[inline]
    pub fn get_index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(i, v)| {
            let x = i % width;
            let y = i / width;
            ((x, y), v)
        })
    }
}

/// Altitude of a mini tile: its distance to the nearest sea.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Altitude {
    /// Not computed yet.
    Unset,
    /// Unwalkable, not yet classified as sea or lake.
    SeaOrLake,
    Sea,
    /// Distance in pixels to the center of the nearest sea mini tile.
    Height(u16),
}

impl Altitude {
    /// Legacy integer encoding: -1 unset, 0 sea, 1 sea-or-lake marker,
    /// otherwise the height in pixels.
    pub fn value(self) -> i32 {
        match self {
            Altitude::Unset => -1,
            Altitude::SeaOrLake => 1,
            Altitude::Sea => 0,
            Altitude::Height(h) => h as i32,
        }
    }

    /// Height in pixels, zero for anything that has no computed height.
    pub fn height(self) -> u16 {
        match self {
            Altitude::Height(h) => h,
            _ => 0,
        }
    }
}

/// Area label of a mini tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AreaTag {
    Unwalkable,
    /// Walkable, not labeled yet.
    Unassigned,
    /// Walkable but covered by a blocking resource.
    Blocked,
    Area(AreaId),
    /// Walkable region too small to become an area. Always <= -2.
    Tiny(i32),
}

impl AreaTag {
    /// Legacy integer encoding: 0 unwalkable, -1 unassigned, positive area
    /// ids, negative tiny ids and `i32::MIN` for blocked.
    pub fn value(self) -> i32 {
        match self {
            AreaTag::Unwalkable => 0,
            AreaTag::Unassigned => -1,
            AreaTag::Blocked => i32::MIN,
            AreaTag::Area(id) => id.value() as i32,
            AreaTag::Tiny(id) => id,
        }
    }

    pub fn area_id(self) -> Option<AreaId> {
        match self {
            AreaTag::Area(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MiniTile {
    altitude: Altitude,
    area: AreaTag,
}

impl Default for MiniTile {
    fn default() -> Self {
        MiniTile {
            altitude: Altitude::Unset,
            area: AreaTag::Unassigned,
        }
    }
}

impl MiniTile {
    /// Walkable mini tiles are the terrain mini tiles. Unwalkable ones are
    /// either sea (altitude zero) or lake.
    #[inline]
    pub fn walkable(&self) -> bool {
        self.area != AreaTag::Unwalkable
    }

    #[inline]
    pub fn altitude(&self) -> Altitude {
        self.altitude
    }

    #[inline]
    pub fn area(&self) -> AreaTag {
        self.area
    }

    #[inline]
    pub fn area_id(&self) -> Option<AreaId> {
        self.area.area_id()
    }

    #[inline]
    pub fn sea(&self) -> bool {
        self.altitude == Altitude::Sea
    }

    /// Unwalkable mini tiles enclosed in terrain, small enough to be walked
    /// around.
    #[inline]
    pub fn lake(&self) -> bool {
        !self.walkable() && self.altitude != Altitude::Sea
    }

    #[inline]
    pub fn terrain(&self) -> bool {
        self.walkable()
    }

    #[inline]
    pub fn sea_or_lake(&self) -> bool {
        self.altitude == Altitude::SeaOrLake
    }

    #[inline]
    pub fn altitude_missing(&self) -> bool {
        self.altitude == Altitude::Unset
    }

    #[inline]
    pub fn area_id_missing(&self) -> bool {
        self.area == AreaTag::Unassigned
    }

    #[inline]
    pub fn blocked(&self) -> bool {
        self.area == AreaTag::Blocked
    }

    pub fn set_walkable(&mut self, walkable: bool) {
        if walkable {
            self.area = AreaTag::Unassigned;
            self.altitude = Altitude::Unset;
        } else {
            self.area = AreaTag::Unwalkable;
            self.altitude = Altitude::SeaOrLake;
        }
    }

    pub fn set_sea(&mut self) {
        assert!(
            !self.walkable() && self.sea_or_lake(),
            "set_sea on {:?}",
            self
        );
        self.altitude = Altitude::Sea;
    }

    pub fn set_lake(&mut self) {
        assert!(!self.walkable() && self.sea(), "set_lake on {:?}", self);
        self.altitude = Altitude::Unset;
    }

    pub fn set_altitude(&mut self, height: u16) {
        assert!(
            self.altitude_missing() && height > 0,
            "set_altitude({}) on {:?}",
            height,
            self
        );
        self.altitude = Altitude::Height(height);
    }

    pub fn set_area_id(&mut self, id: AreaId) {
        assert!(self.area_id_missing(), "set_area_id({:?}) on {:?}", id, self);
        self.area = AreaTag::Area(id);
    }

    pub fn replace_area_id(&mut self, tag: AreaTag) {
        let valid_target = match tag {
            AreaTag::Area(_) => true,
            AreaTag::Tiny(v) => v <= -2,
            _ => false,
        };
        assert!(
            matches!(self.area, AreaTag::Area(_)) && valid_target && tag != self.area,
            "replace_area_id({:?}) on {:?}",
            tag,
            self
        );
        self.area = tag;
    }

    pub fn set_blocked(&mut self) {
        assert!(self.area_id_missing(), "set_blocked on {:?}", self);
        self.area = AreaTag::Blocked;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Tile {
    flags: TileFlags,
    ground_height: u8,
    area: Option<AreaId>,
    min_altitude: u16,
    resource: Option<ResourceId>,
    claimed: bool,
    internal_data: i32,
}

impl Tile {
    #[inline]
    pub fn buildable(&self) -> bool {
        self.flags.contains(TileFlags::BUILDABLE)
    }

    #[inline]
    pub fn doodad(&self) -> bool {
        self.flags.contains(TileFlags::DOODAD)
    }

    #[inline]
    pub fn flags(&self) -> TileFlags {
        self.flags
    }

    /// 0 = low ground, 1 = high ground, 2 = very high ground.
    #[inline]
    pub fn ground_height(&self) -> u8 {
        self.ground_height
    }

    /// The area covering the whole tile, if all of its mini tiles are
    /// walkable and belong to that one area.
    #[inline]
    pub fn area(&self) -> Option<AreaId> {
        self.area
    }

    #[inline]
    pub fn min_altitude(&self) -> u16 {
        self.min_altitude
    }

    /// The resource whose footprint covers this tile.
    #[inline]
    pub fn resource(&self) -> Option<ResourceId> {
        self.resource
    }

    /// Whether a base footprint covers this tile.
    #[inline]
    pub fn claimed(&self) -> bool {
        self.claimed
    }

    /// Scratch value used by base placement for its potential field.
    #[inline]
    pub fn internal_data(&self) -> i32 {
        self.internal_data
    }

    pub(crate) fn set_flags(&mut self, flags: TileFlags, ground_height: u8) {
        self.flags = flags;
        self.ground_height = ground_height;
    }

    pub(crate) fn set_area(&mut self, area: Option<AreaId>) {
        self.area = area;
    }

    pub(crate) fn set_min_altitude(&mut self, altitude: u16) {
        self.min_altitude = altitude;
    }

    pub(crate) fn set_resource(&mut self, resource: ResourceId) {
        self.resource = Some(resource);
    }

    pub(crate) fn claim(&mut self) {
        self.claimed = true;
    }

    pub(crate) fn set_internal_data(&mut self, value: i32) {
        self.internal_data = value;
    }
}

/// Mini tile and tile grids for one map.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    mini_tiles: Grid<MiniTile>,
    tiles: Grid<Tile>,
}

impl TerrainGrid {
    pub fn new(tile_width: usize, tile_height: usize) -> Self {
        let per_tile = MINI_TILES_PER_TILE as usize;
        TerrainGrid {
            mini_tiles: Grid::new(
                tile_width * per_tile,
                tile_height * per_tile,
                MiniTile::default(),
            ),
            tiles: Grid::new(tile_width, tile_height, Tile::default()),
        }
    }

    /// Map size in mini tiles.
    pub fn walk_size(&self) -> (i32, i32) {
        (self.mini_tiles.width() as i32, self.mini_tiles.height() as i32)
    }

    /// Map size in tiles.
    pub fn tile_size(&self) -> (i32, i32) {
        (self.tiles.width() as i32, self.tiles.height() as i32)
    }

    #[inline]
    pub fn valid_walk(&self, w: WalkPosition) -> bool {
        self.mini_tiles.valid(w.x(), w.y())
    }

    #[inline]
    pub fn valid_tile(&self, t: TilePosition) -> bool {
        self.tiles.valid(t.x(), t.y())
    }

    #[inline]
    pub fn mini_tile(&self, w: WalkPosition) -> &MiniTile {
        self.mini_tiles.get(w.x() as usize, w.y() as usize)
    }

    #[inline]
    pub fn mini_tile_mut(&mut self, w: WalkPosition) -> &mut MiniTile {
        self.mini_tiles.get_mut(w.x() as usize, w.y() as usize)
    }

    #[inline]
    pub fn tile(&self, t: TilePosition) -> &Tile {
        self.tiles.get(t.x() as usize, t.y() as usize)
    }

    #[inline]
    pub fn tile_mut(&mut self, t: TilePosition) -> &mut Tile {
        self.tiles.get_mut(t.x() as usize, t.y() as usize)
    }

    /// The tile containing mini tile `w`.
    #[inline]
    pub fn tile_of(&self, w: WalkPosition) -> &Tile {
        self.tile(TilePosition::from(w))
    }

    #[inline]
    pub fn walk_index(&self, w: WalkPosition) -> usize {
        self.mini_tiles.index(w.x() as usize, w.y() as usize)
    }

    #[inline]
    pub fn walk_position(&self, index: usize) -> WalkPosition {
        let (x, y) = self.mini_tiles.coords(index);
        WalkPosition::new(x as i32, y as i32)
    }

    pub fn mini_tiles(&self) -> &Grid<MiniTile> {
        &self.mini_tiles
    }

    pub fn tiles(&self) -> &Grid<Tile> {
        &self.tiles
    }

    /// All mini tile positions in raster order.
    pub fn walk_positions(&self) -> impl Iterator<Item = WalkPosition> {
        let (w, h) = self.walk_size();
        (0..h).flat_map(move |y| (0..w).map(move |x| WalkPosition::new(x, y)))
    }

    /// All tile positions in raster order.
    pub fn tile_positions(&self) -> impl Iterator<Item = TilePosition> {
        let (w, h) = self.tile_size();
        (0..h).flat_map(move |y| (0..w).map(move |x| TilePosition::new(x, y)))
    }

    /// Valid 4-neighbors of `w`, in raster order.
    pub fn neighbors_4(&self, w: WalkPosition) -> impl Iterator<Item = WalkPosition> + '_ {
        NEIGHBORS_4
            .iter()
            .map(move |&d| w + d)
            .filter(move |n| self.valid_walk(*n))
    }

    /// Valid 8-neighbors of `w`, in raster order.
    pub fn neighbors_8(&self, w: WalkPosition) -> impl Iterator<Item = WalkPosition> + '_ {
        NEIGHBORS_8
            .iter()
            .map(move |&d| w + d)
            .filter(move |n| self.valid_walk(*n))
    }

    /// The mini tiles covered by the tile rectangle at `top_left` of `size`
    /// tiles, clipped to the map.
    pub fn mini_tiles_of_rect(
        &self,
        top_left: TilePosition,
        size: (i32, i32),
    ) -> impl Iterator<Item = WalkPosition> + '_ {
        let origin = WalkPosition::from(top_left);
        let (w, h) = (size.0 * MINI_TILES_PER_TILE, size.1 * MINI_TILES_PER_TILE);
        (0..h)
            .flat_map(move |dy| (0..w).map(move |dx| origin + (dx, dy)))
            .filter(move |p| self.valid_walk(*p))
    }

    /// Breadth-first search over 8-neighbors starting at `start`. Returns
    /// the first position satisfying `find`; only positions satisfying
    /// `visit` are expanded.
    pub fn breadth_first_search<F, V>(&self, start: WalkPosition, find: F, visit: V) -> Option<WalkPosition>
    where
        F: Fn(WalkPosition, &MiniTile) -> bool,
        V: Fn(WalkPosition, &MiniTile) -> bool,
    {
        if !self.valid_walk(start) {
            return None;
        }

        if find(start, self.mini_tile(start)) {
            return Some(start);
        }

        let mut visited: FnvHashSet<WalkPosition> = FnvHashSet::default();
        let mut to_visit = VecDeque::new();

        visited.insert(start);
        to_visit.push_back(start);

        while let Some(current) = to_visit.pop_front() {
            for next in self.neighbors_8(current) {
                if !visited.insert(next) {
                    continue;
                }

                let mini_tile = self.mini_tile(next);
                if find(next, mini_tile) {
                    return Some(next);
                }

                if visit(next, mini_tile) {
                    to_visit.push_back(next);
                }
            }
        }

        None
    }

    /// The area of `w`, or of the nearest mini tile that has one.
    pub fn nearest_area(&self, w: WalkPosition) -> Option<AreaId> {
        self.breadth_first_search(w, |_, m| m.area_id().is_some(), |_, _| true)
            .and_then(|p| self.mini_tile(p).area_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_encodings() {
        assert_eq!(Altitude::Unset.value(), -1);
        assert_eq!(Altitude::Sea.value(), 0);
        assert_eq!(Altitude::SeaOrLake.value(), 1);
        assert_eq!(Altitude::Height(42).value(), 42);
        assert_eq!(AreaTag::Unwalkable.value(), 0);
        assert_eq!(AreaTag::Area(AreaId::new(3)).value(), 3);
        assert_eq!(AreaTag::Tiny(-4).value(), -4);
        assert_eq!(AreaTag::Blocked.value(), i32::MIN);
    }

    #[test]
    fn mini_tile_lifecycle() {
        let mut sea = MiniTile::default();
        sea.set_walkable(false);
        assert!(sea.sea_or_lake());
        sea.set_sea();
        assert!(sea.sea() && !sea.lake());
        sea.set_lake();
        assert!(sea.lake() && sea.altitude_missing());
        sea.set_altitude(16);
        assert_eq!(sea.altitude(), Altitude::Height(16));

        let mut ground = MiniTile::default();
        assert!(ground.walkable() && ground.area_id_missing());
        ground.set_area_id(AreaId::new(1));
        ground.replace_area_id(AreaTag::Area(AreaId::new(2)));
        ground.replace_area_id(AreaTag::Tiny(-2));
        assert_eq!(ground.area().value(), -2);
    }

    #[test]
    #[should_panic]
    fn area_id_is_assigned_once() {
        let mut m = MiniTile::default();
        m.set_area_id(AreaId::new(1));
        m.set_area_id(AreaId::new(2));
    }

    #[test]
    #[should_panic]
    fn altitude_is_assigned_once() {
        let mut m = MiniTile::default();
        m.set_altitude(8);
        m.set_altitude(16);
    }

    #[test]
    #[should_panic]
    fn tiny_ids_cannot_be_replaced() {
        let mut m = MiniTile::default();
        m.set_area_id(AreaId::new(1));
        m.replace_area_id(AreaTag::Tiny(-2));
        m.replace_area_id(AreaTag::Area(AreaId::new(1)));
    }

    #[test]
    fn grid_neighbors_are_clipped() {
        let grid = TerrainGrid::new(2, 2);
        assert_eq!(grid.walk_size(), (8, 8));
        assert_eq!(grid.neighbors_4(WalkPosition::new(0, 0)).count(), 2);
        assert_eq!(grid.neighbors_8(WalkPosition::new(3, 3)).count(), 8);
        assert_eq!(
            grid.mini_tiles_of_rect(TilePosition::new(1, 1), (2, 2)).count(),
            16
        );
    }

    #[test]
    fn nearest_area_searches_outwards() {
        let mut grid = TerrainGrid::new(2, 2);
        grid.mini_tile_mut(WalkPosition::new(6, 1)).set_area_id(AreaId::new(4));
        assert_eq!(grid.nearest_area(WalkPosition::new(1, 1)), Some(AreaId::new(4)));
        assert_eq!(grid.nearest_area(WalkPosition::new(-1, 1)), None);
    }
}
