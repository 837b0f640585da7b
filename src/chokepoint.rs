use crate::area::AreaId;
use crate::location::*;
use crate::resource::ResourceId;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChokePointId(u32);

impl ChokePointId {
    pub(crate) fn new(index: usize) -> Self {
        ChokePointId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Representative nodes of a chokepoint's geometry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum ChokePointNode {
    End1,
    Middle,
    End2,
}

/// A narrow passage between two areas.
///
/// Frontier chokepoints carry the clustered frontier mini tiles as their
/// geometry. Pseudo chokepoints stand in for a blocking resource and have a
/// single-position geometry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChokePoint {
    id: ChokePointId,
    areas: (AreaId, AreaId),
    geometry: Vec<WalkPosition>,
    nodes: [WalkPosition; 3],
    blocking_resource: Option<ResourceId>,
}

impl ChokePoint {
    pub(crate) fn new(
        id: ChokePointId,
        areas: (AreaId, AreaId),
        geometry: Vec<WalkPosition>,
        middle: WalkPosition,
        blocking_resource: Option<ResourceId>,
    ) -> Self {
        assert!(!geometry.is_empty(), "chokepoint {:?} has no geometry", id);
        assert!(areas.0 < areas.1, "chokepoint areas {:?} are not ordered", areas);

        let end1 = geometry[0];
        let end2 = geometry[geometry.len() - 1];

        ChokePoint {
            id,
            areas,
            geometry,
            nodes: [end1, middle, end2],
            blocking_resource,
        }
    }

    pub fn id(&self) -> ChokePointId {
        self.id
    }

    /// The two areas joined by this chokepoint, lowest id first.
    pub fn areas(&self) -> (AreaId, AreaId) {
        self.areas
    }

    pub fn geometry(&self) -> &[WalkPosition] {
        &self.geometry
    }

    pub fn pos(&self, node: ChokePointNode) -> WalkPosition {
        match node {
            ChokePointNode::End1 => self.nodes[0],
            ChokePointNode::Middle => self.nodes[1],
            ChokePointNode::End2 => self.nodes[2],
        }
    }

    /// The middle node, used as the chokepoint's position in distance
    /// computations.
    pub fn center(&self) -> WalkPosition {
        self.nodes[1]
    }

    pub fn blocking_resource(&self) -> Option<ResourceId> {
        self.blocking_resource
    }

    pub fn blocked(&self) -> bool {
        self.blocking_resource.is_some()
    }

    /// The area on the other side of the chokepoint from `area`.
    pub fn other_area(&self, area: AreaId) -> Option<AreaId> {
        if area == self.areas.0 {
            Some(self.areas.1)
        } else if area == self.areas.1 {
            Some(self.areas.0)
        } else {
            None
        }
    }
}
