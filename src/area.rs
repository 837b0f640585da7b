use crate::base::Base;
use crate::chokepoint::ChokePointId;
use crate::location::*;
use crate::resource::ResourceId;
use crate::terrain::Tile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of an [`Area`]. Ids are dense and start at 1.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(u32);

impl AreaId {
    pub fn new(value: u32) -> Self {
        assert!(value > 0, "area ids start at 1");
        AreaId(value)
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Position of the area in the area list.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

/// Identifies a set of areas that can reach one another through unblocked
/// chokepoints.
pub type GroupId = u32;

/// A maximal connected walkable region of the map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Area {
    id: AreaId,
    group_id: GroupId,
    top: WalkPosition,
    max_altitude: u16,
    mini_tiles: usize,
    tiles: Vec<TilePosition>,
    top_left: TilePosition,
    bottom_right: TilePosition,
    buildable_tiles: usize,
    high_ground_tiles: usize,
    very_high_ground_tiles: usize,
    chokepoints_by_area: BTreeMap<AreaId, Vec<ChokePointId>>,
    accessible_neighbors: Vec<AreaId>,
    minerals: Vec<ResourceId>,
    geysers: Vec<ResourceId>,
    bases: Vec<Base>,
}

impl Area {
    pub(crate) fn new(id: AreaId, top: WalkPosition, max_altitude: u16, mini_tiles: usize) -> Self {
        Area {
            id,
            group_id: 0,
            top,
            max_altitude,
            mini_tiles,
            tiles: Vec::new(),
            top_left: TilePosition::new(i16::MAX as i32, i16::MAX as i32),
            bottom_right: TilePosition::new(i16::MIN as i32, i16::MIN as i32),
            buildable_tiles: 0,
            high_ground_tiles: 0,
            very_high_ground_tiles: 0,
            chokepoints_by_area: BTreeMap::new(),
            accessible_neighbors: Vec::new(),
            minerals: Vec::new(),
            geysers: Vec::new(),
            bases: Vec::new(),
        }
    }

    pub fn id(&self) -> AreaId {
        self.id
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// The mini tile of highest altitude in the area.
    pub fn top(&self) -> WalkPosition {
        self.top
    }

    pub fn max_altitude(&self) -> u16 {
        self.max_altitude
    }

    pub fn mini_tile_count(&self) -> usize {
        self.mini_tiles
    }

    /// Tiles fully covered by this area, in raster order.
    pub fn tiles(&self) -> &[TilePosition] {
        &self.tiles
    }

    /// Bounding box of the area's tiles (inclusive).
    pub fn top_left(&self) -> TilePosition {
        self.top_left
    }

    pub fn bottom_right(&self) -> TilePosition {
        self.bottom_right
    }

    pub fn buildable_tile_count(&self) -> usize {
        self.buildable_tiles
    }

    pub fn high_ground_percentage(&self) -> u32 {
        self.percentage_of_tiles(self.high_ground_tiles)
    }

    pub fn very_high_ground_percentage(&self) -> u32 {
        self.percentage_of_tiles(self.very_high_ground_tiles)
    }

    pub fn low_ground_percentage(&self) -> u32 {
        let low = self.tiles.len() - self.high_ground_tiles - self.very_high_ground_tiles;
        self.percentage_of_tiles(low)
    }

    fn percentage_of_tiles(&self, count: usize) -> u32 {
        if self.tiles.is_empty() {
            0
        } else {
            (count * 100 / self.tiles.len()) as u32
        }
    }

    /// Chokepoints to each neighboring area.
    pub fn chokepoints_by_area(&self) -> &BTreeMap<AreaId, Vec<ChokePointId>> {
        &self.chokepoints_by_area
    }

    /// Every chokepoint of this area, ordered by neighboring area.
    pub fn chokepoints(&self) -> impl Iterator<Item = ChokePointId> + '_ {
        self.chokepoints_by_area.values().flatten().copied()
    }

    pub fn chokepoints_with(&self, neighbor: AreaId) -> &[ChokePointId] {
        self.chokepoints_by_area
            .get(&neighbor)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn neighbors(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.chokepoints_by_area.keys().copied()
    }

    /// Neighbours reachable through at least one unblocked chokepoint.
    pub fn accessible_neighbors(&self) -> &[AreaId] {
        &self.accessible_neighbors
    }

    pub fn minerals(&self) -> &[ResourceId] {
        &self.minerals
    }

    pub fn geysers(&self) -> &[ResourceId] {
        &self.geysers
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    pub(crate) fn add_tile_information(&mut self, position: TilePosition, tile: &Tile) {
        self.tiles.push(position);
        if tile.buildable() {
            self.buildable_tiles += 1;
        }
        match tile.ground_height() {
            1 => self.high_ground_tiles += 1,
            2 => self.very_high_ground_tiles += 1,
            _ => {}
        }

        self.top_left = TilePosition::new(
            self.top_left.x().min(position.x()),
            self.top_left.y().min(position.y()),
        );
        self.bottom_right = TilePosition::new(
            self.bottom_right.x().max(position.x()),
            self.bottom_right.y().max(position.y()),
        );
    }

    /// Called once every tile of the area went through
    /// `add_tile_information`.
    pub(crate) fn post_collect_information(&mut self) {
        assert!(
            self.mini_tiles > 0,
            "area {:?} has no mini tiles",
            self.id
        );

        // Areas made only of partial tiles still get a box around their top.
        if self.tiles.is_empty() {
            let t = TilePosition::from(self.top);
            self.top_left = t;
            self.bottom_right = t;
        }
    }

    pub(crate) fn add_chokepoint(&mut self, neighbor: AreaId, chokepoint: ChokePointId) {
        self.chokepoints_by_area
            .entry(neighbor)
            .or_default()
            .push(chokepoint);
    }

    pub(crate) fn set_group_id(&mut self, group_id: GroupId) {
        self.group_id = group_id;
    }

    pub(crate) fn set_accessible_neighbors(&mut self, neighbors: Vec<AreaId>) {
        self.accessible_neighbors = neighbors;
    }

    pub(crate) fn add_mineral(&mut self, mineral: ResourceId) {
        self.minerals.push(mineral);
    }

    pub(crate) fn add_geyser(&mut self, geyser: ResourceId) {
        self.geysers.push(geyser);
    }

    pub(crate) fn add_base(&mut self, base: Base) {
        self.bases.push(base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_information_updates_bounds_and_counts() {
        let mut area = Area::new(AreaId::new(1), WalkPosition::new(9, 9), 40, 80);
        let tile = Tile::default();
        area.add_tile_information(TilePosition::new(4, 2), &tile);
        area.add_tile_information(TilePosition::new(1, 5), &tile);
        area.post_collect_information();

        assert_eq!(area.tiles().len(), 2);
        assert_eq!(area.top_left(), TilePosition::new(1, 2));
        assert_eq!(area.bottom_right(), TilePosition::new(4, 5));
        assert_eq!(area.buildable_tile_count(), 0);
        assert_eq!(area.low_ground_percentage(), 100);
    }

    #[test]
    fn area_without_whole_tiles_is_boxed_around_its_top() {
        let mut area = Area::new(AreaId::new(2), WalkPosition::new(9, 13), 16, 70);
        area.post_collect_information();
        assert_eq!(area.top_left(), TilePosition::new(2, 3));
        assert_eq!(area.bottom_right(), TilePosition::new(2, 3));
    }

    #[test]
    #[should_panic]
    fn area_ids_are_positive() {
        AreaId::new(0);
    }
}
