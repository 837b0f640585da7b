//! The area graph: areas as nodes, chokepoints as edges, with precomputed
//! ground distances between every pair of chokepoints.

use crate::area::*;
use crate::chokepoint::*;
use crate::distance::UNREACHABLE;
use pathfinding::prelude::{build_path, dijkstra_all};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Graph {
    areas: Vec<Area>,
    chokepoints: Vec<ChokePoint>,
    /// Row-major, `chokepoints.len()` squared.
    distances: Vec<u32>,
    paths: Vec<Vec<ChokePointId>>,
}

impl Graph {
    pub(crate) fn new(
        areas: Vec<Area>,
        chokepoints: Vec<ChokePoint>,
        distances: Vec<u32>,
        paths: Vec<Vec<ChokePointId>>,
    ) -> Self {
        let n = chokepoints.len();
        assert_eq!(distances.len(), n * n, "chokepoint distance matrix size");
        assert_eq!(paths.len(), n * n, "chokepoint path matrix size");

        Graph {
            areas,
            chokepoints,
            distances,
            paths,
        }
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id.index())
    }

    pub fn chokepoints(&self) -> &[ChokePoint] {
        &self.chokepoints
    }

    pub fn chokepoint(&self, id: ChokePointId) -> Option<&ChokePoint> {
        self.chokepoints.get(id.index())
    }

    /// Chokepoints joining `a` and `b`, in either order.
    pub fn chokepoints_between(&self, a: AreaId, b: AreaId) -> &[ChokePointId] {
        self.area(a).map(|area| area.chokepoints_with(b)).unwrap_or(&[])
    }

    /// Shortest ground distance in pixels between two chokepoints, walking
    /// through areas and unblocked chokepoints.
    pub fn distance(&self, from: ChokePointId, to: ChokePointId) -> u32 {
        let n = self.chokepoints.len();
        if from.index() >= n || to.index() >= n {
            return UNREACHABLE;
        }
        self.distances[from.index() * n + to.index()]
    }

    /// Chokepoints crossed going from `from` to `to`, both included. Empty
    /// when unreachable.
    pub fn path(&self, from: ChokePointId, to: ChokePointId) -> &[ChokePointId] {
        let n = self.chokepoints.len();
        if from.index() >= n || to.index() >= n {
            return &[];
        }
        &self.paths[from.index() * n + to.index()]
    }

    pub fn compute_distances_from_chokepoint(&self, start: ChokePointId, targets: &[ChokePointId]) -> Vec<u32> {
        targets.iter().map(|t| self.distance(start, *t)).collect()
    }

    pub fn group_count(&self) -> usize {
        self.areas
            .iter()
            .map(|a| a.group_id())
            .max()
            .unwrap_or(0) as usize
    }
}

/// All-pairs shortest paths over the chokepoint graph, given the direct
/// distances between chokepoints that share an area.
pub(crate) fn all_pairs(n: usize, direct: &[u32]) -> (Vec<u32>, Vec<Vec<ChokePointId>>) {
    let mut distances = vec![UNREACHABLE; n * n];
    let mut paths = vec![Vec::new(); n * n];

    for from in 0..n {
        let parents = dijkstra_all(&from, |&current: &usize| {
            (0..n)
                .filter(move |&next| next != current)
                .filter_map(move |next| {
                    let d = direct[current * n + next];
                    if d == UNREACHABLE {
                        None
                    } else {
                        Some((next, d))
                    }
                })
                .collect::<Vec<_>>()
        });

        distances[from * n + from] = 0;
        paths[from * n + from] = vec![ChokePointId::new(from)];

        for (&to, &(_, cost)) in parents.iter() {
            if to == from {
                continue;
            }
            distances[from * n + to] = cost;
            paths[from * n + to] = build_path(&to, &parents)
                .into_iter()
                .map(ChokePointId::new)
                .collect();
        }
    }

    (distances, paths)
}

/// Connected components of the area graph over unblocked chokepoints.
/// Group ids start at 1.
pub(crate) fn compute_groups(areas: &mut [Area], chokepoints: &[ChokePoint]) {
    for area in areas.iter_mut() {
        let accessible: Vec<AreaId> = area
            .chokepoints_by_area()
            .iter()
            .filter(|(_, ids)| ids.iter().any(|id| !chokepoints[id.index()].blocked()))
            .map(|(neighbor, _)| *neighbor)
            .collect();
        area.set_accessible_neighbors(accessible);
    }

    let mut next_group = 1;
    for start in 0..areas.len() {
        if areas[start].group_id() != 0 {
            continue;
        }

        let mut to_visit = VecDeque::new();
        areas[start].set_group_id(next_group);
        to_visit.push_back(start);

        while let Some(current) = to_visit.pop_front() {
            let neighbors = areas[current].accessible_neighbors().to_vec();
            for neighbor in neighbors {
                let area = &mut areas[neighbor.index()];
                if area.group_id() == 0 {
                    area.set_group_id(next_group);
                    to_visit.push_back(neighbor.index());
                }
            }
        }

        next_group += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_pairs_follows_shared_areas() {
        // 0 - 1 - 2, with no direct 0 - 2 connection.
        let n = 3;
        let mut direct = vec![UNREACHABLE; n * n];
        let mut link = |a: usize, b: usize, d: u32| {
            direct[a * n + b] = d;
            direct[b * n + a] = d;
        };
        link(0, 1, 100);
        link(1, 2, 40);

        let (distances, paths) = all_pairs(n, &direct);

        assert_eq!(distances[2], 140);
        assert_eq!(distances[2 * n], 140);
        assert_eq!(distances[n + 1], 0);
        assert_eq!(
            paths[2],
            vec![ChokePointId::new(0), ChokePointId::new(1), ChokePointId::new(2)]
        );
    }

    #[test]
    fn isolated_chokepoints_are_unreachable() {
        let n = 2;
        let direct = vec![0, UNREACHABLE, UNREACHABLE, 0];
        let (distances, paths) = all_pairs(n, &direct);
        assert_eq!(distances[1], UNREACHABLE);
        assert!(paths[1].is_empty());
    }
}
