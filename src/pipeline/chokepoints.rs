//! Chokepoint extraction from the raw frontier and blocking resources, and
//! the chokepoint distance matrix.

use super::BuildContext;
use crate::area::*;
use crate::chokepoint::*;
use crate::distance::{self, UNREACHABLE};
use crate::graph;
use crate::location::*;
use crate::resource::ResourceId;
use crate::terrain::*;
use log::*;
use std::collections::{BTreeMap, VecDeque};

pub fn run(ctx: &mut BuildContext) {
    let mut pending = frontier_chokepoints(ctx);
    pending.extend(blocking_chokepoints(ctx));
    pending.sort_by_key(|chokepoint| chokepoint.areas);

    for (index, chokepoint) in pending.into_iter().enumerate() {
        let id = ChokePointId::new(index);
        let (a, b) = chokepoint.areas;
        ctx.areas[a.index()].add_chokepoint(b, id);
        ctx.areas[b.index()].add_chokepoint(a, id);
        ctx.chokepoints.push(ChokePoint::new(
            id,
            chokepoint.areas,
            chokepoint.geometry,
            chokepoint.middle,
            chokepoint.blocking_resource,
        ));
    }

    compute_chokepoint_distances(ctx);
    graph::compute_groups(&mut ctx.areas, &ctx.chokepoints);
}

struct PendingChokePoint {
    areas: (AreaId, AreaId),
    geometry: Vec<WalkPosition>,
    middle: WalkPosition,
    blocking_resource: Option<ResourceId>,
}

fn frontier_chokepoints(ctx: &BuildContext) -> Vec<PendingChokePoint> {
    let area_count = ctx.areas.len();

    let mut by_pair: BTreeMap<(AreaId, AreaId), Vec<WalkPosition>> = BTreeMap::new();
    for &((a, b), w) in ctx.raw_frontier.iter() {
        let pair = if a < b { (a, b) } else { (b, a) };
        if pair.1.index() >= area_count {
            warn!("Frontier position {:?} refers to unknown area {:?}", w, pair.1);
            continue;
        }
        by_pair.entry(pair).or_default().push(w);
    }

    let mut pending = Vec::new();

    for (pair, positions) in by_pair {
        let clusters = cluster_frontier(&positions, ctx.config.cluster_min_distance);
        trace!(
            "Areas {:?}: {} frontier positions in {} clusters",
            pair,
            positions.len(),
            clusters.len()
        );

        for cluster in clusters {
            let geometry: Vec<WalkPosition> = cluster.into_iter().collect();
            let middle = middle_node(&ctx.grid, &geometry);
            pending.push(PendingChokePoint {
                areas: pair,
                geometry,
                middle,
                blocking_resource: None,
            });
        }
    }

    pending
}

/// Groups frontier positions into chains. A position extends the first chain
/// whose front or back is within `max_distance` (queen-wise), on the nearer
/// end.
fn cluster_frontier(positions: &[WalkPosition], max_distance: i32) -> Vec<VecDeque<WalkPosition>> {
    let mut clusters: Vec<VecDeque<WalkPosition>> = Vec::new();

    'positions: for &w in positions {
        for cluster in clusters.iter_mut() {
            let (front, back) = match (cluster.front(), cluster.back()) {
                (Some(front), Some(back)) => (*front, *back),
                _ => continue,
            };

            let to_front = w.chebyshev_distance(front);
            let to_back = w.chebyshev_distance(back);

            if to_front.min(to_back) <= max_distance {
                if to_front < to_back {
                    cluster.push_front(w);
                } else {
                    cluster.push_back(w);
                }
                continue 'positions;
            }
        }

        clusters.push(VecDeque::from(vec![w]));
    }

    clusters
}

/// Starts at the middle of the geometry and climbs towards higher altitude.
fn middle_node(grid: &TerrainGrid, geometry: &[WalkPosition]) -> WalkPosition {
    let altitude = |i: usize| grid.mini_tile(geometry[i]).altitude().height();

    let mut i = geometry.len() / 2;
    while i > 0 && altitude(i - 1) > altitude(i) {
        i -= 1;
    }
    while i + 1 < geometry.len() && altitude(i + 1) > altitude(i) {
        i += 1;
    }

    geometry[i]
}

/// One pseudo chokepoint per pair of areas a blocking resource separates.
fn blocking_chokepoints(ctx: &mut BuildContext) -> Vec<PendingChokePoint> {
    let mut pending = Vec::new();

    for resource in ctx.resources.iter_mut().filter(|r| r.blocking()) {
        let mut blocked_areas: Vec<AreaId> = Vec::new();
        for door in resource.doors() {
            if let Some(area) = ctx.grid.nearest_area(*door) {
                if !blocked_areas.contains(&area) {
                    blocked_areas.push(area);
                }
            }
        }

        let center = WalkPosition::from(resource.center());
        let position = ctx
            .grid
            .breadth_first_search(center, |_, m| m.walkable(), |_, _| true)
            .unwrap_or(center);

        for (i, &a) in blocked_areas.iter().enumerate() {
            for &b in blocked_areas[..i].iter() {
                pending.push(PendingChokePoint {
                    areas: if a < b { (a, b) } else { (b, a) },
                    geometry: vec![position],
                    middle: position,
                    blocking_resource: Some(resource.id()),
                });
            }
        }

        trace!(
            "Blocking resource {:?} separates {:?}",
            resource.id(),
            blocked_areas
        );
        resource.set_blocked_areas(blocked_areas);
    }

    pending
}

/// Distances between chokepoints sharing an area, walking inside that area,
/// then shortest paths over the whole chokepoint graph. Blocked chokepoints
/// are never crossed.
fn compute_chokepoint_distances(ctx: &mut BuildContext) {
    let n = ctx.chokepoints.len();
    let mut direct = vec![UNREACHABLE; n * n];
    for i in 0..n {
        direct[i * n + i] = 0;
    }

    for area in ctx.areas.iter() {
        let ids: Vec<ChokePointId> = area
            .chokepoints()
            .filter(|id| !ctx.chokepoints[id.index()].blocked())
            .collect();

        for (k, from) in ids.iter().enumerate() {
            let targets = &ids[k + 1..];
            if targets.is_empty() {
                continue;
            }

            let positions: Vec<WalkPosition> = targets
                .iter()
                .map(|t| ctx.chokepoints[t.index()].center())
                .collect();

            let distances = distance::compute_distances(
                &ctx.grid,
                ctx.chokepoints[from.index()].center(),
                &positions,
                distance::within_area(area.id()),
            );

            for (to, d) in targets.iter().zip(distances) {
                let forward = from.index() * n + to.index();
                let backward = to.index() * n + from.index();
                if d < direct[forward] {
                    direct[forward] = d;
                    direct[backward] = d;
                }
            }
        }
    }

    let (distances, paths) = graph::all_pairs(n, &direct);
    ctx.chokepoint_distances = distances;
    ctx.chokepoint_paths = paths;
}
