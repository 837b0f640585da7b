use crate::area::AreaId;
use crate::constants::*;
use crate::location::*;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(u32);

impl ResourceId {
    pub(crate) fn new(index: usize) -> Self {
        ResourceId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum ResourceKind {
    Mineral,
    Geyser,
}

impl ResourceKind {
    /// Footprint in tiles.
    pub fn size(self) -> (i32, i32) {
        match self {
            ResourceKind::Mineral => (MINERAL_WIDTH, MINERAL_HEIGHT),
            ResourceKind::Geyser => (GEYSER_WIDTH, GEYSER_HEIGHT),
        }
    }
}

/// A neutral resource as reported by the map data source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub kind: ResourceKind,
    pub top_left: TilePosition,
    pub amount: u32,
    pub initial_amount: u32,
}

impl ResourceInfo {
    pub fn mineral(top_left: TilePosition, amount: u32) -> Self {
        ResourceInfo {
            kind: ResourceKind::Mineral,
            top_left,
            amount,
            initial_amount: amount,
        }
    }

    pub fn geyser(top_left: TilePosition, amount: u32) -> Self {
        ResourceInfo {
            kind: ResourceKind::Geyser,
            top_left,
            amount,
            initial_amount: amount,
        }
    }
}

/// A resource once placed on the analysed map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    kind: ResourceKind,
    top_left: TilePosition,
    amount: u32,
    initial_amount: u32,
    area: Option<AreaId>,
    blocking: bool,
    blocked_areas: Vec<AreaId>,
    #[serde(skip)]
    doors: Vec<WalkPosition>,
}

impl Resource {
    pub(crate) fn new(id: ResourceId, info: &ResourceInfo) -> Self {
        Resource {
            id,
            kind: info.kind,
            top_left: info.top_left,
            amount: info.amount,
            initial_amount: info.initial_amount,
            area: None,
            blocking: false,
            blocked_areas: Vec::new(),
            doors: Vec::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn is_mineral(&self) -> bool {
        self.kind == ResourceKind::Mineral
    }

    pub fn is_geyser(&self) -> bool {
        self.kind == ResourceKind::Geyser
    }

    pub fn top_left(&self) -> TilePosition {
        self.top_left
    }

    pub fn size(&self) -> (i32, i32) {
        self.kind.size()
    }

    /// Last tile of the footprint (inclusive).
    pub fn bottom_right(&self) -> TilePosition {
        let (w, h) = self.size();
        self.top_left + (w - 1, h - 1)
    }

    /// Pixel center of the footprint.
    pub fn center(&self) -> Position {
        let (w, h) = self.size();
        Position::from(self.top_left) + (w * TILE_SIZE / 2, h * TILE_SIZE / 2)
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn initial_amount(&self) -> u32 {
        self.initial_amount
    }

    pub fn area(&self) -> Option<AreaId> {
        self.area
    }

    /// Whether the resource separates walkable regions from each other.
    pub fn blocking(&self) -> bool {
        self.blocking
    }

    /// Areas adjoining a blocking resource, one per side it blocks.
    pub fn blocked_areas(&self) -> &[AreaId] {
        &self.blocked_areas
    }

    /// Every tile of the footprint, in raster order.
    pub fn tiles(&self) -> impl Iterator<Item = TilePosition> {
        let top_left = self.top_left;
        let (w, h) = self.size();
        (0..h).flat_map(move |dy| (0..w).map(move |dx| top_left + (dx, dy)))
    }

    pub(crate) fn doors(&self) -> &[WalkPosition] {
        &self.doors
    }

    pub(crate) fn set_blocking(&mut self, doors: Vec<WalkPosition>) {
        self.blocking = true;
        self.doors = doors;
    }

    pub(crate) fn set_blocked_areas(&mut self, areas: Vec<AreaId>) {
        self.blocked_areas = areas;
    }

    pub(crate) fn set_area(&mut self, area: Option<AreaId>) {
        self.area = area;
    }
}
