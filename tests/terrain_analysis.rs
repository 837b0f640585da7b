use rts_terrain::*;

use std::collections::HashSet;

fn island_with_two_minerals() -> MapData {
    let mut map = MapData::new(24, 24);
    map.add_land(TilePosition::new(2, 2), (20, 20))
        .add_mineral(TilePosition::new(8, 9), 1500)
        .add_mineral(TilePosition::new(14, 9), 1500);
    map
}

fn two_islands_with_corridor() -> MapData {
    let mut map = MapData::new(40, 20);
    map.add_land(TilePosition::new(2, 2), (12, 16))
        .add_land(TilePosition::new(26, 2), (12, 16))
        .set_walkable(WalkPosition::new(56, 39), (48, 3), true);
    map
}

/// A map source whose mini tile grid disagrees with its tile grid.
struct Misaligned;

impl MapDataSource for Misaligned {
    fn tile_size(&self) -> (usize, usize) {
        (10, 10)
    }

    fn walk_size(&self) -> (usize, usize) {
        (40, 39)
    }

    fn is_walkable(&self, _w: WalkPosition) -> bool {
        true
    }

    fn is_buildable(&self, _t: TilePosition) -> bool {
        true
    }

    fn ground_height(&self, _t: TilePosition) -> u8 {
        0
    }

    fn resources(&self) -> &[ResourceInfo] {
        &[]
    }
}

#[test]
fn one_landmass_one_base() {
    let analysis = analyze_map(&island_with_two_minerals()).unwrap();

    assert_eq!(analysis.areas().len(), 1);
    assert!(analysis.chokepoints().is_empty());

    let bases: Vec<&Base> = analysis.bases().collect();
    assert_eq!(bases.len(), 1);

    let mut minerals = bases[0].minerals().to_vec();
    minerals.sort();
    let expected: Vec<ResourceId> = analysis.minerals().map(|r| r.id()).collect();
    assert_eq!(minerals, expected);
    assert!(bases[0].geysers().is_empty());
    assert!(bases[0].score() > 0);
    assert!(!bases[0].starting());

    for tile in analysis.areas()[0].tiles() {
        assert_eq!(analysis.grid().tile(*tile).internal_data(), 0);
    }
}

#[test]
fn corridor_makes_one_chokepoint() {
    let analysis = analyze_map(&two_islands_with_corridor()).unwrap();

    assert_eq!(analysis.areas().len(), 2);
    assert_eq!(analysis.chokepoints().len(), 1);

    let cp = &analysis.chokepoints()[0];
    let center = cp.center();
    assert!((56..=103).contains(&center.x()));
    assert!((39..=41).contains(&center.y()));
    assert!(analysis.grid().mini_tile(center).walkable());

    let (a, b) = cp.areas();
    assert_eq!(analysis.graph().chokepoints_between(a, b), &[cp.id()]);
    assert_eq!(analysis.graph().group_count(), 1);

    let d = analysis.ground_distance(WalkPosition::new(30, 40), WalkPosition::new(130, 40));
    assert!(matches!(d, Some(d) if d != UNREACHABLE));
}

#[test]
fn no_ground_between_islands() {
    let mut map = MapData::new(40, 20);
    map.add_land(TilePosition::new(2, 2), (12, 16))
        .add_land(TilePosition::new(26, 2), (12, 16));
    let analysis = analyze_map(&map).unwrap();

    let west = WalkPosition::new(30, 40);
    let east = WalkPosition::new(130, 40);

    assert_eq!(analysis.compute_distances(west, &[east, west]), vec![UNREACHABLE, 0]);
    assert_eq!(analysis.graph().group_count(), 2);
}

#[test]
fn misaligned_grids_are_rejected() {
    match analyze_map(&Misaligned) {
        Err(AnalysisError::InvalidDimensions { tiles, mini_tiles }) => {
            assert_eq!(tiles, (10, 10));
            assert_eq!(mini_tiles, (40, 39));
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("misaligned map was accepted"),
    }
}

#[test]
fn base_creation_can_be_disabled() {
    let analysis = AnalyzerBuilder::new()
        .create_bases(false)
        .analyze(&island_with_two_minerals())
        .unwrap();

    assert_eq!(analysis.bases().count(), 0);
    assert_eq!(analysis.areas()[0].minerals().len(), 2);
}

#[test]
fn config_round_trips_through_json() {
    let config = AnalysisConfig {
        min_tiles_between_bases: 14,
        ..AnalysisConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: AnalysisConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let analysis = AnalyzerBuilder::new()
        .config(parsed)
        .analyze(&island_with_two_minerals())
        .unwrap();
    assert_eq!(analysis.config().min_tiles_between_bases, 14);
}

#[test]
fn starting_location_marks_its_base() {
    let location = {
        let analysis = analyze_map(&island_with_two_minerals()).unwrap();
        let location = analysis.bases().next().map(|b| b.location()).unwrap();
        location
    };

    let mut map = island_with_two_minerals();
    map.add_starting_location(location);
    let analysis = analyze_map(&map).unwrap();

    let base = analysis.bases().next().unwrap();
    assert_eq!(base.location(), location);
    assert!(base.starting());
    assert_eq!(analysis.starting_locations(), &[location]);
}

#[test]
fn ascii_map_properties() {
    let map = MapData::from_tile_rows(&[
        "##########################",
        "#........................#",
        "#..m.....................#",
        "#........................#",
        "#........,,,,,,..........#",
        "#........,,,,,,..........#",
        "#........................#",
        "#........................#",
        "#.........hhhhhh.........#",
        "#.........hhhhhh.........#",
        "#.........hhhhhh.........#",
        "#........................#",
        "#........................#",
        "#........................#",
        "#...................g....#",
        "#........................#",
        "#........................#",
        "##########################",
    ]);
    let analysis = analyze_map(&map).unwrap();
    let grid = analysis.grid();

    // Buildable tiles are walkable throughout.
    for t in grid.tile_positions() {
        if grid.tile(t).buildable() {
            for y in 0..4 {
                for x in 0..4 {
                    let w = WalkPosition::from(t) + (x, y);
                    assert!(grid.mini_tile(w).walkable(), "{:?}", w);
                }
            }
        }
    }

    // Walkable mini tiles belong to an area or a tiny region.
    for w in grid.walk_positions() {
        let mini_tile = grid.mini_tile(w);
        if mini_tile.walkable() {
            assert_ne!(mini_tile.area().value(), 0, "{:?}", w);
        }
    }

    // Resources go to at most one base, in their own area.
    let mut assigned = HashSet::new();
    for base in analysis.bases() {
        for id in base.minerals().iter().chain(base.geysers()) {
            assert!(assigned.insert(*id), "{:?} assigned twice", id);
            let resource = analysis.resource(*id).unwrap();
            assert_eq!(resource.area(), Some(base.area()));
        }
    }

    let high = analysis.areas().iter().map(|a| a.high_ground_percentage()).max();
    assert!(matches!(high, Some(p) if p > 0));
}
