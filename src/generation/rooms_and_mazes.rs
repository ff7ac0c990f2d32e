//! Rooms and mazes
//!
//! Rectangular rooms are scattered over an empty grid, the space between them
//! is filled with one-cell-wide maze corridors, and then every separate patch
//! is joined through single-cell doors. Finally corridor spurs are pruned so
//! only loops and through passages remain.

use std::collections::VecDeque;

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::CaveGenerator;
use crate::cave::{CellKind, Grid};
use crate::error::{GenerationError, Result};
use crate::regions::extract_all_regions;
use crate::seeds::CaveSeeds;
use crate::tilemap::{Tilemap, VON_NEUMANN_OFFSETS};

/// Working state of a cell while the layout is being built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum MazeTile {
    /// Not yet claimed by a room or the maze
    #[default]
    Null,
    /// Room interior or carved maze cell not yet joined to the main area
    SemiGround,
    Ground,
    /// Maze frontier
    SemiWall,
    Wall,
    /// Wall cell that could become a door
    Connection,
    Door,
}

impl MazeTile {
    fn is_walkable(self) -> bool {
        matches!(self, MazeTile::Ground | MazeTile::Door)
    }

    fn to_cell_kind(self) -> CellKind {
        match self {
            MazeTile::Ground => CellKind::Ground,
            MazeTile::Door => CellKind::Door,
            _ => CellKind::Wall,
        }
    }
}

type MazeMap = Tilemap<MazeTile>;

/// Configuration for rooms-and-mazes layouts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomsAndMazesConfig {
    pub width: usize,
    pub height: usize,
    pub seed: Option<u64>,
    /// Force the outer ring of the grid to wall before anything is placed
    pub surround_with_walls: bool,
    /// Room sizes include the wall perimeter
    pub min_room_size: usize,
    pub max_room_size: usize,
    pub max_rooms: usize,
    pub room_attempts: usize,
    /// Whole-layout retries before giving up
    pub max_generation_attempts: usize,
}

impl Default for RoomsAndMazesConfig {
    fn default() -> Self {
        Self {
            width: 41,
            height: 41,
            seed: None,
            surround_with_walls: false,
            min_room_size: 5,
            max_room_size: 9,
            max_rooms: 10,
            room_attempts: 200,
            max_generation_attempts: 16,
        }
    }
}

impl RoomsAndMazesConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width < 3 || self.height < 3 {
            return Err(GenerationError::invalid(format!(
                "grid must be at least 3x3, got {}x{}",
                self.width, self.height
            )));
        }
        if self.min_room_size < 3 {
            return Err(GenerationError::invalid("min_room_size must be at least 3"));
        }
        if self.min_room_size > self.max_room_size {
            return Err(GenerationError::invalid("min_room_size exceeds max_room_size"));
        }
        if self.max_room_size > self.width.min(self.height) {
            return Err(GenerationError::invalid(format!(
                "max_room_size {} does not fit in a {}x{} grid",
                self.max_room_size, self.width, self.height
            )));
        }
        if self.max_generation_attempts == 0 {
            return Err(GenerationError::invalid("max_generation_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Rooms-and-mazes generator.
pub struct RoomsAndMazes {
    config: RoomsAndMazesConfig,
    grid: Option<Grid>,
    last_seed: Option<u64>,
}

impl RoomsAndMazes {
    pub fn new(config: RoomsAndMazesConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            grid: None,
            last_seed: None,
        })
    }

    pub fn config(&self) -> &RoomsAndMazesConfig {
        &self.config
    }
}

impl CaveGenerator for RoomsAndMazes {
    fn generate(&mut self) -> Result<Grid> {
        let seeds = CaveSeeds::resolve(self.config.seed);
        let grid = build_layout(&self.config, &seeds)?;

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

/// Run the full pipeline, retrying until the layout passes validation.
fn build_layout(config: &RoomsAndMazesConfig, seeds: &CaveSeeds) -> Result<Grid> {
    let mut room_rng = seeds.layout_rng();
    let mut maze_rng = seeds.carving_rng();
    let mut repair_rng = seeds.repair_rng();

    for attempt in 1..=config.max_generation_attempts {
        let mut map = initialize(config);
        let rooms = place_rooms(&mut map, config, &mut room_rng);
        debug!("Attempt {}: placed {} rooms", attempt, rooms);

        grow_maze(&mut map, &mut maze_rng);
        let doors = connect_regions(&mut map, &mut repair_rng);
        clean(&mut map);
        let pruned = remove_dead_ends(&mut map, &mut repair_rng);
        debug!("Attempt {}: {} doors, {} dead-end cells pruned", attempt, doors, pruned);

        if is_valid(&map) {
            info!(
                "Rooms and mazes {}x{} (seed {}): {} rooms, {} doors after {} attempt(s)",
                map.width, map.height, seeds.master, rooms, doors, attempt
            );
            return Ok(map.map(|tile| tile.to_cell_kind()));
        }
        warn!("Layout attempt {} failed validation, retrying", attempt);
    }

    Err(GenerationError::GenerationExhausted {
        attempts: config.max_generation_attempts,
    })
}

fn initialize(config: &RoomsAndMazesConfig) -> MazeMap {
    let mut map = MazeMap::new(config.width, config.height);

    if config.surround_with_walls {
        for y in 0..map.height {
            for x in 0..map.width {
                if map.is_border_cell(x, y) {
                    map.set(x, y, MazeTile::Wall);
                }
            }
        }
    }

    map
}

/// Scatter walled rooms over unclaimed space. Returns the number placed.
fn place_rooms(map: &mut MazeMap, config: &RoomsAndMazesConfig, rng: &mut ChaCha8Rng) -> usize {
    let mut placed = 0;

    for _ in 0..config.room_attempts {
        if placed >= config.max_rooms {
            break;
        }

        let room_w = rng.gen_range(config.min_room_size..=config.max_room_size);
        let room_h = rng.gen_range(config.min_room_size..=config.max_room_size);
        let x0 = rng.gen_range(0..=map.width - room_w);
        let y0 = rng.gen_range(0..=map.height - room_h);

        // Only the interior has to be free; perimeters may be shared
        let fits = (y0 + 1..y0 + room_h - 1)
            .all(|y| (x0 + 1..x0 + room_w - 1).all(|x| *map.get(x, y) == MazeTile::Null));
        if !fits {
            continue;
        }

        for y in y0..y0 + room_h {
            for x in x0..x0 + room_w {
                let perimeter = x == x0 || y == y0 || x == x0 + room_w - 1 || y == y0 + room_h - 1;
                let tile = if perimeter { MazeTile::Wall } else { MazeTile::SemiGround };
                map.set(x, y, tile);
            }
        }
        placed += 1;
    }

    placed
}

/// Fill every unclaimed cell with randomly grown maze trees.
///
/// A frontier cell touched by two carved cells turns to wall, which keeps
/// corridors one cell wide.
fn grow_maze(map: &mut MazeMap, rng: &mut ChaCha8Rng) {
    let mut unclaimed: Vec<(usize, usize)> = map
        .iter()
        .filter(|(_, _, tile)| **tile == MazeTile::Null)
        .map(|(x, y, _)| (x, y))
        .collect();
    unclaimed.shuffle(rng);

    let mut trees = 0;
    for (sx, sy) in unclaimed {
        if *map.get(sx, sy) != MazeTile::Null {
            continue;
        }
        trees += 1;

        map.set(sx, sy, MazeTile::SemiWall);
        let mut frontier = vec![(sx, sy)];

        while !frontier.is_empty() {
            let (x, y) = frontier.swap_remove(rng.gen_range(0..frontier.len()));
            if *map.get(x, y) != MazeTile::SemiWall {
                continue;
            }
            map.set(x, y, MazeTile::SemiGround);

            for (nx, ny) in map.on_grid_von_neumann(x, y).collect::<Vec<_>>() {
                match *map.get(nx, ny) {
                    MazeTile::Null => {
                        map.set(nx, ny, MazeTile::SemiWall);
                        frontier.push((nx, ny));
                    }
                    MazeTile::SemiWall => map.set(nx, ny, MazeTile::Wall),
                    _ => {}
                }
            }
        }
    }

    debug!("Grew {} maze trees", trees);
}

/// Tiles of the four cardinal neighbours in N, E, S, W order; `None` off-grid.
fn cardinal_tiles(map: &MazeMap, x: usize, y: usize) -> [Option<MazeTile>; 4] {
    VON_NEUMANN_OFFSETS.map(|(dx, dy)| map.try_get(x as i32 + dx, y as i32 + dy).copied())
}

/// A wall cell separating the joined area from an unjoined patch: one axis
/// has `Ground` and `SemiGround` on opposite sides, the other axis is walled.
fn is_connection(map: &MazeMap, x: usize, y: usize) -> bool {
    if !matches!(*map.get(x, y), MazeTile::Wall | MazeTile::Connection) {
        return false;
    }

    let [n, e, s, w] = cardinal_tiles(map, x, y);
    let wall = Some(MazeTile::Wall);
    let bridges = |a: Option<MazeTile>, b: Option<MazeTile>| {
        matches!(
            (a, b),
            (Some(MazeTile::Ground), Some(MazeTile::SemiGround)) | (Some(MazeTile::SemiGround), Some(MazeTile::Ground))
        )
    };

    (bridges(n, s) && e == wall && w == wall) || (bridges(e, w) && n == wall && s == wall)
}

/// Flood the 4-connected patch at `(x, y)` with `color`, returning the
/// distinct neighbouring cells that are neither the patch nor `color`.
fn paint(map: &mut MazeMap, x: usize, y: usize, color: MazeTile) -> Vec<(usize, usize)> {
    let target = *map.get(x, y);
    let mut boundary = Vec::new();
    if target == color {
        return boundary;
    }

    let mut queue = VecDeque::from([(x, y)]);
    map.set(x, y, color);

    while let Some((cx, cy)) = queue.pop_front() {
        for (nx, ny) in map.on_grid_von_neumann(cx, cy).collect::<Vec<_>>() {
            let tile = *map.get(nx, ny);
            if tile == target {
                map.set(nx, ny, color);
                queue.push_back((nx, ny));
            } else if tile != color {
                boundary.push((nx, ny));
            }
        }
    }

    boundary.sort_unstable();
    boundary.dedup();
    boundary
}

/// Mark connection candidates among `boundary`, demoting stale ones to wall.
fn update_connections(map: &mut MazeMap, boundary: &[(usize, usize)], connections: &mut Vec<(usize, usize)>) {
    for &(x, y) in boundary {
        if is_connection(map, x, y) {
            map.set(x, y, MazeTile::Connection);
            connections.push((x, y));
        } else if *map.get(x, y) == MazeTile::Connection {
            map.set(x, y, MazeTile::Wall);
        }
    }
}

/// Join every room and maze patch to the first one through doors.
/// Returns the number of doors opened.
fn connect_regions(map: &mut MazeMap, rng: &mut ChaCha8Rng) -> usize {
    let Some((sx, sy, _)) = map.iter().find(|(_, _, tile)| **tile == MazeTile::SemiGround) else {
        return 0;
    };

    let boundary = paint(map, sx, sy, MazeTile::Ground);
    let mut connections = Vec::new();
    update_connections(map, &boundary, &mut connections);

    let mut doors = 0;
    while !connections.is_empty() {
        let (x, y) = connections.swap_remove(rng.gen_range(0..connections.len()));
        if *map.get(x, y) != MazeTile::Connection || !is_connection(map, x, y) {
            continue;
        }

        let far_side = map
            .on_grid_von_neumann(x, y)
            .find(|&(nx, ny)| *map.get(nx, ny) == MazeTile::SemiGround);
        let Some((fx, fy)) = far_side else {
            continue;
        };

        map.set(x, y, MazeTile::Door);
        doors += 1;

        let boundary = paint(map, fx, fy, MazeTile::Ground);
        update_connections(map, &boundary, &mut connections);
    }

    doors
}

/// Turn every leftover working tile into wall.
fn clean(map: &mut MazeMap) {
    for (_, _, tile) in map.iter_mut() {
        if !matches!(*tile, MazeTile::Ground | MazeTile::Wall | MazeTile::Door) {
            *tile = MazeTile::Wall;
        }
    }
}

/// Walkable cell with at most one walkable cardinal neighbour (off-grid blocks).
fn is_dead_end(map: &MazeMap, x: usize, y: usize) -> bool {
    let blocked = cardinal_tiles(map, x, y)
        .iter()
        .filter(|tile| !tile.is_some_and(MazeTile::is_walkable))
        .count();
    blocked >= 3
}

/// Wall up dead ends until none remain. Returns the number of cells removed.
fn remove_dead_ends(map: &mut MazeMap, rng: &mut ChaCha8Rng) -> usize {
    let mut dead_ends: Vec<(usize, usize)> = map
        .iter()
        .filter(|(x, y, tile)| tile.is_walkable() && is_dead_end(map, *x, *y))
        .map(|(x, y, _)| (x, y))
        .collect();

    let mut removed = 0;
    while !dead_ends.is_empty() {
        let (x, y) = dead_ends.swap_remove(rng.gen_range(0..dead_ends.len()));
        if !map.get(x, y).is_walkable() || !is_dead_end(map, x, y) {
            continue;
        }

        map.set(x, y, MazeTile::Wall);
        removed += 1;

        for (nx, ny) in map.on_grid_von_neumann(x, y) {
            if map.get(nx, ny).is_walkable() && is_dead_end(map, nx, ny) {
                dead_ends.push((nx, ny));
            }
        }
    }

    removed
}

/// Only public tiles, no dead ends, and one non-empty walkable area.
fn is_valid(map: &MazeMap) -> bool {
    let only_public = map
        .iter()
        .all(|(_, _, tile)| matches!(tile, MazeTile::Ground | MazeTile::Wall | MazeTile::Door));
    let no_dead_ends = map
        .iter()
        .all(|(x, y, tile)| !tile.is_walkable() || !is_dead_end(map, x, y));
    let walkable = map.map(|tile| tile.is_walkable());

    only_public && no_dead_ends && extract_all_regions(&walkable, true).len() == 1
}
