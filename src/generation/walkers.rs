//! Branching walker cave generation
//!
//! A population of floor makers wanders a square grid of wall, carving floor
//! as it goes. Walkers clone themselves while the population is small and die
//! off as it grows, until the requested number of cells has been opened.

use log::{debug, info, warn};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::CaveGenerator;
use crate::cave::{CellKind, Grid};
use crate::error::{GenerationError, Result};
use crate::seeds::CaveSeeds;
use crate::tilemap::Tilemap;

/// Facing of a walker. North (`Up`) is `y + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    fn rotate(self, quarter_turns: usize) -> Direction {
        Self::ALL[(self as usize + quarter_turns) % 4]
    }

    pub fn turn_right(self) -> Direction {
        self.rotate(1)
    }

    pub fn turn_left(self) -> Direction {
        self.rotate(3)
    }

    pub fn reverse(self) -> Direction {
        self.rotate(2)
    }

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }
}

/// Configuration for branching walker caves
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Number of cells to open; also sizes the grid
    pub cave_size: usize,
    pub seed: Option<u64>,
    /// Base chance of cloning a walker after it moves
    pub spawn_chance: f32,
    /// Base chance of removing a walker after it moves
    pub destroy_chance: f32,
    pub max_walkers: usize,
    pub start_direction: Direction,
    /// Relative weights of carving a 1x1, 2x2 or 3x3 square
    pub carve_weights: [u32; 3],
    pub forward_weight: u32,
    /// Weight of a 90 degree turn, left or right with equal odds
    pub turn_weight: u32,
    pub reverse_weight: u32,
    /// Generations before giving up on reaching `cave_size`
    pub max_ticks: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            cave_size: 120,
            seed: None,
            spawn_chance: 0.8,
            destroy_chance: 0.2,
            max_walkers: 5,
            start_direction: Direction::Up,
            carve_weights: [1, 0, 0],
            forward_weight: 3,
            turn_weight: 1,
            reverse_weight: 0,
            max_ticks: 200_000,
        }
    }
}

impl WalkerConfig {
    /// Edge of the square grid: `ceil(log2(cave_size)) * 5`.
    pub fn grid_edge(&self) -> usize {
        (self.cave_size as f64).log2().ceil() as usize * 5
    }

    pub fn validate(&self) -> Result<()> {
        if self.cave_size < 2 {
            return Err(GenerationError::invalid("cave_size must be at least 2"));
        }
        let edge = self.grid_edge();
        if self.cave_size > edge * edge {
            return Err(GenerationError::invalid(format!(
                "cave_size {} does not fit in the derived {}x{} grid",
                self.cave_size, edge, edge
            )));
        }
        if self.max_walkers == 0 {
            return Err(GenerationError::invalid("max_walkers must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.spawn_chance) || !(0.0..=1.0).contains(&self.destroy_chance) {
            return Err(GenerationError::invalid("spawn and destroy chances must be within 0-1"));
        }
        check_weights("carve_weights", &self.carve_weights)?;
        check_weights(
            "movement weights",
            &[self.forward_weight, self.turn_weight, self.reverse_weight],
        )?;
        if self.max_ticks == 0 {
            return Err(GenerationError::invalid("max_ticks must be at least 1"));
        }
        Ok(())
    }
}

/// Weights must have a non-zero total that fits in a `u32`.
fn check_weights(name: &str, weights: &[u32]) -> Result<()> {
    match weights.iter().try_fold(0u32, |total, &w| total.checked_add(w)) {
        Some(0) => Err(GenerationError::invalid(format!("{} must not all be zero", name))),
        Some(_) => Ok(()),
        None => Err(GenerationError::invalid(format!("{} overflow when summed", name))),
    }
}

/// A single floor maker.
#[derive(Clone, Debug, PartialEq)]
struct Walker {
    x: usize,
    y: usize,
    direction: Direction,
}

impl Walker {
    /// Carve, turn, then step once, staying on the grid.
    /// Returns the number of cells that were wall before carving.
    fn act(&mut self, grid: &mut Grid, config: &WalkerConfig, rng: &mut ChaCha8Rng) -> usize {
        let size = pick_weighted(&config.carve_weights, rng) + 1;
        let painted = carve_square(grid, self.x, self.y, size);

        let movement = [config.forward_weight, config.turn_weight, config.reverse_weight];
        self.direction = match pick_weighted(&movement, rng) {
            0 => self.direction,
            1 if rng.gen_bool(0.5) => self.direction.turn_right(),
            1 => self.direction.turn_left(),
            _ => self.direction.reverse(),
        };

        let (dx, dy) = self.direction.offset();
        self.x = (self.x as i32 + dx).clamp(0, grid.width as i32 - 1) as usize;
        self.y = (self.y as i32 + dy).clamp(0, grid.height as i32 - 1) as usize;

        painted
    }
}

/// Index of the weighted choice. Weights were checked by [`check_weights`].
fn pick_weighted(weights: &[u32], rng: &mut ChaCha8Rng) -> usize {
    let total: u32 = weights.iter().sum();
    let mut roll = rng.gen_range(0..total);

    for (i, &weight) in weights.iter().enumerate() {
        if roll < weight {
            return i;
        }
        roll -= weight;
    }
    weights.len() - 1
}

/// Open a `size` x `size` square anchored at its lower-left corner.
fn carve_square(grid: &mut Grid, x: usize, y: usize, size: usize) -> usize {
    let mut painted = 0;

    for cy in y..(y + size).min(grid.height) {
        for cx in x..(x + size).min(grid.width) {
            if *grid.get(cx, cy) != CellKind::Ground {
                grid.set(cx, cy, CellKind::Ground);
                painted += 1;
            }
        }
    }

    painted
}

/// State of a run in flight.
struct WalkerRun {
    seed: u64,
    grid: Grid,
    walkers: Vec<Walker>,
    painted: usize,
    ticks: usize,
    population_rng: ChaCha8Rng,
    movement_rng: ChaCha8Rng,
}

/// Branching walker generator.
///
/// A run can be driven all at once with [`CaveGenerator::generate`] or one
/// generation at a time with [`BranchingWalkers::begin`] and
/// [`BranchingWalkers::tick`]. A second run cannot start while one is in flight.
pub struct BranchingWalkers {
    config: WalkerConfig,
    run: Option<WalkerRun>,
    grid: Option<Grid>,
    last_seed: Option<u64>,
}

impl BranchingWalkers {
    pub fn new(config: WalkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            run: None,
            grid: None,
            last_seed: None,
        })
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Start a run with one walker in the middle of an all-wall grid.
    pub fn begin(&mut self) -> Result<()> {
        if self.run.is_some() {
            return Err(GenerationError::ReentrantCallRejected);
        }

        let seeds = CaveSeeds::resolve(self.config.seed);
        let edge = self.config.grid_edge();
        debug!("Walker grid {}x{} for {} cells", edge, edge, self.config.cave_size);

        self.run = Some(WalkerRun {
            seed: seeds.master,
            grid: Tilemap::new_with(edge, edge, CellKind::Wall),
            walkers: vec![Walker {
                x: edge / 2,
                y: edge / 2,
                direction: self.config.start_direction,
            }],
            painted: 0,
            ticks: 0,
            population_rng: seeds.layout_rng(),
            movement_rng: seeds.carving_rng(),
        });
        Ok(())
    }

    /// Advance the run by one generation. Returns the finished grid once the
    /// painted count reaches `cave_size`, `None` while work remains.
    ///
    /// # Panics
    ///
    /// Panics if no run is in flight; call [`BranchingWalkers::begin`] first.
    pub fn tick(&mut self) -> Result<Option<Grid>> {
        let config = &self.config;
        let Some(run) = self.run.as_mut() else {
            panic!("tick called with no walker run in progress");
        };

        if run.ticks >= config.max_ticks {
            warn!("Walkers stalled at {}/{} cells", run.painted, config.cave_size);
            let attempts = run.ticks;
            self.run = None;
            return Err(GenerationError::GenerationExhausted { attempts });
        }
        run.ticks += 1;

        let max_walkers = config.max_walkers as f32;
        let mut i = 0;
        while i < run.walkers.len() {
            run.painted += run.walkers[i].act(&mut run.grid, config, &mut run.movement_rng);

            let count = run.walkers.len() as f32;
            if run.population_rng.gen::<f32>() < config.spawn_chance * (1.0 - count / max_walkers) {
                let clone = run.walkers[i].clone();
                run.walkers.push(clone);
            }

            let count = run.walkers.len() as f32;
            if run.population_rng.gen::<f32>() < config.destroy_chance * ((count - 1.0) / max_walkers) {
                run.walkers.remove(i);
            } else {
                i += 1;
            }
        }

        if run.painted < config.cave_size {
            return Ok(None);
        }

        let Some(run) = self.run.take() else {
            return Ok(None);
        };
        info!(
            "Walker cave {}x{} (seed {}): {} cells in {} generations",
            run.grid.width, run.grid.height, run.seed, run.painted, run.ticks
        );
        self.last_seed = Some(run.seed);
        self.grid = Some(run.grid.clone());
        Ok(Some(run.grid))
    }

    /// Abandon the run in flight, if any.
    pub fn abort(&mut self) {
        self.run = None;
    }
}

impl CaveGenerator for BranchingWalkers {
    fn generate(&mut self) -> Result<Grid> {
        self.begin()?;
        loop {
            if let Some(grid) = self.tick()? {
                return Ok(grid);
            }
        }
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
