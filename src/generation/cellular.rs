//! Cellular automata cave generation
//!
//! Random fill, majority-rule smoothing, removal of small wall and ground
//! regions, then a room graph that carves passages until every room can be
//! reached from the largest one.

use log::{debug, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::shapes::{bresenham_line, filled_circle};
use super::CaveGenerator;
use crate::cave::{CellKind, Grid};
use crate::error::{GenerationError, Result};
use crate::regions::extract_all_regions;
use crate::seeds::CaveSeeds;
use crate::tilemap::{Neighbor, Tilemap};

/// Configuration for cellular automata caves
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellularAutomataConfig {
    pub width: usize,
    pub height: usize,
    /// Explicit master seed; a fresh one is drawn per run when absent
    pub seed: Option<u64>,
    /// Chance (0-100) that an interior cell starts as ground
    pub fill_percent: u32,
    /// Number of smoothing passes
    pub smooth_iterations: usize,
    /// A cell becomes wall with more wall neighbours than this, ground with fewer
    pub wall_majority: usize,
    /// Wall regions smaller than this are opened up
    pub wall_threshold: usize,
    /// Ground regions smaller than this are filled in
    pub ground_threshold: usize,
    pub min_passage_radius: i32,
    pub max_passage_radius: i32,
}

impl Default for CellularAutomataConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            seed: None,
            fill_percent: 80,
            smooth_iterations: 5,
            wall_majority: 4,
            wall_threshold: 50,
            ground_threshold: 30,
            min_passage_radius: 1,
            max_passage_radius: 2,
        }
    }
}

impl CellularAutomataConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width < 3 || self.height < 3 {
            return Err(GenerationError::invalid(format!(
                "cave must be at least 3x3, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fill_percent > 100 {
            return Err(GenerationError::invalid("fill_percent must be within 0-100"));
        }
        if self.wall_majority > 8 {
            return Err(GenerationError::invalid("wall_majority cannot exceed the 8 Moore neighbours"));
        }
        // Radius 0 disks along a diagonal line leave gaps between 4-connected regions
        if self.min_passage_radius < 1 || self.min_passage_radius > self.max_passage_radius {
            return Err(GenerationError::invalid(format!(
                "passage radius range {}..={} must start at 1 or more and be non-empty",
                self.min_passage_radius, self.max_passage_radius
            )));
        }
        Ok(())
    }
}

/// Cellular automata generator; owns the last grid it built.
pub struct CellularAutomata {
    config: CellularAutomataConfig,
    grid: Option<Grid>,
    last_seed: Option<u64>,
}

impl CellularAutomata {
    pub fn new(config: CellularAutomataConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            grid: None,
            last_seed: None,
        })
    }

    pub fn config(&self) -> &CellularAutomataConfig {
        &self.config
    }
}

impl CaveGenerator for CellularAutomata {
    fn generate(&mut self) -> Result<Grid> {
        let seeds = CaveSeeds::resolve(self.config.seed);
        let grid = build_cave(&self.config, &seeds);

        self.last_seed = Some(seeds.master);
        self.grid = Some(grid.clone());
        Ok(grid)
    }

    fn clear(&mut self) {
        self.grid = None;
    }

    fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    fn last_seed(&self) -> Option<u64> {
        self.last_seed
    }
}

fn build_cave(config: &CellularAutomataConfig, seeds: &CaveSeeds) -> Grid {
    let mut layout_rng = seeds.layout_rng();
    let mut carving_rng = seeds.carving_rng();

    let mut grid = seed_noise(config, &mut layout_rng);
    for _ in 0..config.smooth_iterations {
        smooth(&mut grid, config.wall_majority);
    }
    debug!(
        "Smoothed {} times: {} ground cells",
        config.smooth_iterations,
        grid.count(CellKind::Ground)
    );

    let mut rooms = filter_regions(&mut grid, config);
    debug!("{} rooms survived region filtering", rooms.len());

    let passages = connect_rooms(&mut grid, &mut rooms, config, &mut carving_rng);
    info!(
        "Cellular automata cave {}x{} (seed {}): {} rooms, {} passages",
        grid.width, grid.height, seeds.master, rooms.len(), passages
    );

    grid
}

/// Random ground/wall fill with a solid border.
fn seed_noise(config: &CellularAutomataConfig, rng: &mut ChaCha8Rng) -> Grid {
    let mut grid: Grid = Tilemap::new_with(config.width, config.height, CellKind::Wall);

    for y in 0..config.height {
        for x in 0..config.width {
            if grid.is_border_cell(x, y) {
                continue;
            }
            if rng.gen_range(0..100) < config.fill_percent {
                grid.set(x, y, CellKind::Ground);
            }
        }
    }

    grid
}

/// One in-place smoothing pass in row-major order.
fn smooth(grid: &mut Grid, wall_majority: usize) {
    for y in 0..grid.height {
        for x in 0..grid.width {
            let walls = count_wall_neighbors(grid, x, y);
            let next = smoothed_kind(*grid.get(x, y), walls, wall_majority);
            grid.set(x, y, next);
        }
    }
}

/// Majority rule; a cell exactly at the threshold keeps its kind.
fn smoothed_kind(current: CellKind, walls: usize, wall_majority: usize) -> CellKind {
    if walls > wall_majority {
        CellKind::Wall
    } else if walls < wall_majority {
        CellKind::Ground
    } else {
        current
    }
}

/// Walls among the 8 surrounding cells; the edge of the map counts as wall.
fn count_wall_neighbors(grid: &Grid, x: usize, y: usize) -> usize {
    grid.moore(x, y)
        .filter(|n| match *n {
            Neighbor::OnGrid(nx, ny) => *grid.get(nx, ny) == CellKind::Wall,
            Neighbor::OffGrid(..) => true,
        })
        .count()
}

/// A ground region large enough to keep, with its bordering walls.
#[derive(Clone, Debug)]
struct Room {
    size: usize,
    /// Interior wall cells 4-adjacent to the room
    boundary: Vec<(usize, usize)>,
    connected: Vec<usize>,
    reachable_from_main: bool,
}

impl Room {
    fn new(cells: &[(usize, usize)], grid: &Grid) -> Self {
        let mut boundary: Vec<(usize, usize)> = cells
            .iter()
            .flat_map(|&(x, y)| grid.on_grid_von_neumann(x, y))
            .filter(|&(nx, ny)| *grid.get(nx, ny) == CellKind::Wall && !grid.is_border_cell(nx, ny))
            .collect();
        boundary.sort_unstable();
        boundary.dedup();

        Self {
            size: cells.len(),
            boundary,
            connected: Vec::new(),
            reachable_from_main: false,
        }
    }

    fn is_connected(&self, other: usize) -> bool {
        self.connected.contains(&other)
    }
}

/// Drop small wall and ground regions and return the surviving rooms,
/// largest first. The border ring is never opened.
fn filter_regions(grid: &mut Grid, config: &CellularAutomataConfig) -> Vec<Room> {
    for region in extract_all_regions(grid, CellKind::Wall) {
        if region.len() < config.wall_threshold {
            for &(x, y) in &region.cells {
                if !grid.is_border_cell(x, y) {
                    grid.set(x, y, CellKind::Ground);
                }
            }
        }
    }

    let mut kept = Vec::new();
    for region in extract_all_regions(grid, CellKind::Ground) {
        if region.len() < config.ground_threshold {
            for &(x, y) in &region.cells {
                grid.set(x, y, CellKind::Wall);
            }
        } else {
            kept.push(region);
        }
    }

    // Boundaries are taken once every small region is filled in
    let mut rooms: Vec<Room> = kept.iter().map(|region| Room::new(&region.cells, grid)).collect();
    rooms.sort_by(|a, b| b.size.cmp(&a.size));
    rooms
}

/// Closest pair of boundary cells between a room in `from` and a room in `to`
/// that are not yet connected.
struct Link {
    a: usize,
    b: usize,
    cell_a: (usize, usize),
    cell_b: (usize, usize),
}

fn nearest_link(rooms: &[Room], from: &[usize], to: &[usize]) -> Option<Link> {
    let mut best: Option<(usize, Link)> = None;

    for &a in from {
        for &b in to {
            if a == b || rooms[a].is_connected(b) {
                continue;
            }
            for &cell_a in &rooms[a].boundary {
                for &cell_b in &rooms[b].boundary {
                    let dx = cell_a.0.abs_diff(cell_b.0);
                    let dy = cell_a.1.abs_diff(cell_b.1);
                    let dist = dx * dx + dy * dy;

                    if best.as_ref().map_or(true, |(d, _)| dist < *d) {
                        best = Some((dist, Link { a, b, cell_a, cell_b }));
                    }
                }
            }
        }
    }

    best.map(|(_, link)| link)
}

/// Record a connection, spreading main-room reachability across it.
fn link_rooms(rooms: &mut [Room], a: usize, b: usize) {
    if rooms[a].reachable_from_main {
        mark_reachable(rooms, b);
    } else if rooms[b].reachable_from_main {
        mark_reachable(rooms, a);
    }
    rooms[a].connected.push(b);
    rooms[b].connected.push(a);
}

fn mark_reachable(rooms: &mut [Room], start: usize) {
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if rooms[i].reachable_from_main {
            continue;
        }
        rooms[i].reachable_from_main = true;
        stack.extend(rooms[i].connected.iter().copied());
    }
}

/// Connect the room graph and return the number of passages carved.
fn connect_rooms(
    grid: &mut Grid,
    rooms: &mut [Room],
    config: &CellularAutomataConfig,
    rng: &mut ChaCha8Rng,
) -> usize {
    if rooms.is_empty() {
        return 0;
    }
    rooms[0].reachable_from_main = true;

    let all: Vec<usize> = (0..rooms.len()).collect();
    let mut passages = 0;

    // Every isolated room links to its nearest neighbour
    loop {
        let mut linked_any = false;
        for a in 0..rooms.len() {
            if !rooms[a].connected.is_empty() {
                continue;
            }
            if let Some(link) = nearest_link(rooms, &[a], &all) {
                carve_passage(grid, &link, config, rng);
                link_rooms(rooms, link.a, link.b);
                passages += 1;
                linked_any = true;
            }
        }
        if !linked_any {
            break;
        }
    }

    // Then attach unreachable clusters to the main room's cluster, nearest first
    loop {
        let (reachable, unreachable): (Vec<usize>, Vec<usize>) =
            all.iter().copied().partition(|&i| rooms[i].reachable_from_main);
        if unreachable.is_empty() {
            break;
        }
        match nearest_link(rooms, &unreachable, &reachable) {
            Some(link) => {
                carve_passage(grid, &link, config, rng);
                link_rooms(rooms, link.a, link.b);
                passages += 1;
            }
            None => break,
        }
    }

    passages
}

/// Stamp a ground disk at every point of the line between the link cells.
fn carve_passage(grid: &mut Grid, link: &Link, config: &CellularAutomataConfig, rng: &mut ChaCha8Rng) {
    let radius = rng.gen_range(config.min_passage_radius..=config.max_passage_radius);
    let line = bresenham_line(
        link.cell_a.0 as i32,
        link.cell_a.1 as i32,
        link.cell_b.0 as i32,
        link.cell_b.1 as i32,
    );

    for (px, py) in line {
        for (cx, cy) in filled_circle(px, py, radius) {
            if grid.is_on_grid(cx, cy) && !grid.is_border_cell(cx as usize, cy as usize) {
                grid.set(cx as usize, cy as usize, CellKind::Ground);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::find_path_cost;
    use rand::SeedableRng;

    fn generate(config: CellularAutomataConfig) -> Grid {
        CellularAutomata::new(config).unwrap().generate().unwrap()
    }

    #[test]
    fn test_small_fixed_seed_scenario() {
        let config = CellularAutomataConfig {
            width: 20,
            height: 20,
            seed: Some(2024),
            fill_percent: 80,
            smooth_iterations: 5,
            ..Default::default()
        };

        let grid = generate(config.clone());
        assert_eq!(grid, generate(config.clone()));

        for (x, y, &kind) in grid.iter() {
            if grid.is_border_cell(x, y) {
                assert_eq!(kind, CellKind::Wall, "border cell ({}, {}) opened", x, y);
            }
        }

        let rooms = extract_all_regions(&grid, CellKind::Ground);
        assert!(rooms.iter().any(|r| r.len() >= config.ground_threshold));
    }

    #[test]
    fn test_all_rooms_reachable_after_connection() {
        for seed in 0..6 {
            // Low fill leaves many separate caves to join
            let config = CellularAutomataConfig {
                width: 60,
                height: 45,
                seed: Some(seed),
                fill_percent: 55,
                ground_threshold: 10,
                wall_threshold: 10,
                ..Default::default()
            };
            let grid = generate(config);

            let regions = extract_all_regions(&grid, CellKind::Ground);
            assert_eq!(regions.len(), 1, "seed {} left {} ground regions", seed, regions.len());
        }
    }

    #[test]
    fn test_path_exists_between_far_ground_cells() {
        let grid = generate(CellularAutomataConfig {
            seed: Some(8),
            fill_percent: 55,
            ground_threshold: 10,
            wall_threshold: 10,
            ..Default::default()
        });

        let ground: Vec<(usize, usize)> = grid
            .iter()
            .filter(|(_, _, &k)| k == CellKind::Ground)
            .map(|(x, y, _)| (x, y))
            .collect();
        let first = ground[0];
        let last = ground[ground.len() - 1];
        assert!(find_path_cost(&grid, first, last).is_some());
    }

    #[test]
    fn test_smooth_rule_uses_threshold() {
        assert_eq!(smoothed_kind(CellKind::Ground, 5, 4), CellKind::Wall);
        assert_eq!(smoothed_kind(CellKind::Wall, 3, 4), CellKind::Ground);
        assert_eq!(smoothed_kind(CellKind::Wall, 4, 4), CellKind::Wall);
        assert_eq!(smoothed_kind(CellKind::Ground, 4, 4), CellKind::Ground);
        // The looser variant flips at 2
        assert_eq!(smoothed_kind(CellKind::Ground, 3, 2), CellKind::Wall);
    }

    #[test]
    fn test_off_grid_counts_as_wall() {
        let mut grid: Grid = Tilemap::new_with(5, 5, CellKind::Ground);
        for (x, y) in [(1, 1), (2, 1), (3, 1), (1, 2)] {
            grid.set(x, y, CellKind::Wall);
        }
        assert_eq!(count_wall_neighbors(&grid, 2, 2), 4);
        assert_eq!(count_wall_neighbors(&grid, 0, 0), 6);
        assert_eq!(count_wall_neighbors(&grid, 4, 4), 5);
    }

    #[test]
    fn test_seed_noise_has_solid_border() {
        let config = CellularAutomataConfig {
            width: 12,
            height: 9,
            fill_percent: 100,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let grid = seed_noise(&config, &mut rng);

        assert_eq!(grid.count(CellKind::Ground), 10 * 7);
        assert!(grid.iter().all(|(x, y, &k)| grid.is_border_cell(x, y) == (k == CellKind::Wall)));
    }

    #[test]
    fn test_small_regions_are_filtered() {
        let mut grid: Grid = Tilemap::new_with(12, 12, CellKind::Wall);
        // A 2x2 pocket and a 5x5 cave
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            grid.set(x, y, CellKind::Ground);
        }
        for y in 5..10 {
            for x in 5..10 {
                grid.set(x, y, CellKind::Ground);
            }
        }

        let config = CellularAutomataConfig {
            wall_threshold: 0,
            ground_threshold: 5,
            ..Default::default()
        };
        let rooms = filter_regions(&mut grid, &config);

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].size, 25);
        assert_eq!(*grid.get(1, 1), CellKind::Wall);
        // 5 cells on each side of the square
        assert_eq!(rooms[0].boundary.len(), 20);
    }

    #[test]
    fn test_link_spreads_reachability() {
        let grid: Grid = Tilemap::new_with(4, 4, CellKind::Wall);
        let mut rooms: Vec<Room> = (0..4).map(|_| Room::new(&[], &grid)).collect();
        rooms[0].reachable_from_main = true;

        link_rooms(&mut rooms, 2, 3);
        assert!(!rooms[2].reachable_from_main && !rooms[3].reachable_from_main);

        link_rooms(&mut rooms, 3, 0);
        assert_eq!(rooms.iter().filter(|r| r.reachable_from_main).count(), 3);
        assert!(!rooms[1].reachable_from_main);
    }

    #[test]
    fn test_rejects_zero_passage_radius() {
        let config = CellularAutomataConfig {
            min_passage_radius: 0,
            ..Default::default()
        };
        assert!(CellularAutomata::new(config).is_err());
    }
}
