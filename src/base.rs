use crate::area::AreaId;
use crate::constants::*;
use crate::location::*;
use crate::resource::ResourceId;
use serde::{Deserialize, Serialize};

/// A suggested command center location and the resources it would mine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Base {
    area: AreaId,
    location: TilePosition,
    minerals: Vec<ResourceId>,
    geysers: Vec<ResourceId>,
    blocking_minerals: Vec<ResourceId>,
    score: i32,
    starting: bool,
}

impl Base {
    pub(crate) fn new(
        area: AreaId,
        location: TilePosition,
        minerals: Vec<ResourceId>,
        geysers: Vec<ResourceId>,
        blocking_minerals: Vec<ResourceId>,
        score: i32,
    ) -> Self {
        Base {
            area,
            location,
            minerals,
            geysers,
            blocking_minerals,
            score,
            starting: false,
        }
    }

    pub fn area(&self) -> AreaId {
        self.area
    }

    /// Top-left tile of the command center footprint.
    pub fn location(&self) -> TilePosition {
        self.location
    }

    /// Pixel center of the command center footprint.
    pub fn center(&self) -> Position {
        Position::from(self.location)
            + (
                COMMAND_CENTER_WIDTH * TILE_SIZE / 2,
                COMMAND_CENTER_HEIGHT * TILE_SIZE / 2,
            )
    }

    pub fn minerals(&self) -> &[ResourceId] {
        &self.minerals
    }

    pub fn geysers(&self) -> &[ResourceId] {
        &self.geysers
    }

    /// Tiny minerals in the way of the command center that must be mined out
    /// before building.
    pub fn blocking_minerals(&self) -> &[ResourceId] {
        &self.blocking_minerals
    }

    /// Sum of the resource potential under the footprint when chosen.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Whether this base sits on one of the map's starting locations.
    pub fn starting(&self) -> bool {
        self.starting
    }

    pub(crate) fn set_starting(&mut self) {
        self.starting = true;
    }
}
