//! Cave generation algorithms
//!
//! Three independent generators share one surface, [`CaveGenerator`]:
//!
//! - Cellular automata smoothing with room-graph connection
//! - Branching random walkers ("floor makers")
//! - Room placement plus maze growth with door repair
//!
//! A caller picks an [`AlgorithmConfig`], builds a [`Generator`] from it and
//! receives a [`Grid`]. Every run is reproducible from the seed it reports.

pub mod cellular;
pub mod rooms_and_mazes;
pub mod shapes;
pub mod walkers;

use serde::{Deserialize, Serialize};

use crate::cave::Grid;
use crate::error::Result;
use crate::seeds::CaveSeeds;

pub use cellular::{CellularAutomata, CellularAutomataConfig};
pub use rooms_and_mazes::{RoomsAndMazes, RoomsAndMazesConfig};
pub use walkers::{BranchingWalkers, Direction, WalkerConfig};

/// Common operations of every cave generator.
pub trait CaveGenerator {
    /// Run the algorithm and hand back the new grid. A copy stays available
    /// through [`CaveGenerator::grid`] until [`CaveGenerator::clear`].
    fn generate(&mut self) -> Result<Grid>;

    /// Drop the current grid. Calling it twice is harmless.
    fn clear(&mut self);

    /// The most recently generated grid.
    fn grid(&self) -> Option<&Grid>;

    /// Master seed of the most recent run.
    fn last_seed(&self) -> Option<u64>;
}

/// Configuration for one of the generators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    CellularAutomata(CellularAutomataConfig),
    BranchingWalkers(WalkerConfig),
    RoomsAndMazes(RoomsAndMazesConfig),
}

impl AlgorithmConfig {
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmConfig::CellularAutomata(_) => "cellular automata",
            AlgorithmConfig::BranchingWalkers(_) => "branching walkers",
            AlgorithmConfig::RoomsAndMazes(_) => "rooms and mazes",
        }
    }

    pub fn seed(&self) -> Option<u64> {
        match self {
            AlgorithmConfig::CellularAutomata(c) => c.seed,
            AlgorithmConfig::BranchingWalkers(c) => c.seed,
            AlgorithmConfig::RoomsAndMazes(c) => c.seed,
        }
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        match self {
            AlgorithmConfig::CellularAutomata(c) => c.seed = seed,
            AlgorithmConfig::BranchingWalkers(c) => c.seed = seed,
            AlgorithmConfig::RoomsAndMazes(c) => c.seed = seed,
        }
    }
}

/// The closed set of generators.
pub enum Generator {
    CellularAutomata(CellularAutomata),
    BranchingWalkers(BranchingWalkers),
    RoomsAndMazes(RoomsAndMazes),
}

impl Generator {
    /// Build a generator, validating its configuration first.
    pub fn new(config: AlgorithmConfig) -> Result<Self> {
        Ok(match config {
            AlgorithmConfig::CellularAutomata(c) => Generator::CellularAutomata(CellularAutomata::new(c)?),
            AlgorithmConfig::BranchingWalkers(c) => Generator::BranchingWalkers(BranchingWalkers::new(c)?),
            AlgorithmConfig::RoomsAndMazes(c) => Generator::RoomsAndMazes(RoomsAndMazes::new(c)?),
        })
    }

    fn inner(&self) -> &dyn CaveGenerator {
        match self {
            Generator::CellularAutomata(g) => g,
            Generator::BranchingWalkers(g) => g,
            Generator::RoomsAndMazes(g) => g,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn CaveGenerator {
        match self {
            Generator::CellularAutomata(g) => g,
            Generator::BranchingWalkers(g) => g,
            Generator::RoomsAndMazes(g) => g,
        }
    }
}

impl CaveGenerator for Generator {
    fn generate(&mut self) -> Result<Grid> {
        self.inner_mut().generate()
    }

    fn clear(&mut self) {
        self.inner_mut().clear()
    }

    fn grid(&self) -> Option<&Grid> {
        self.inner().grid()
    }

    fn last_seed(&self) -> Option<u64> {
        self.inner().last_seed()
    }
}

/// A generated grid together with the seed that reproduces it.
#[derive(Clone, Debug)]
pub struct GeneratedCave {
    pub seed: u64,
    pub grid: Grid,
}

/// One-shot generation: build the generator, run it once.
pub fn generate_cave(config: &AlgorithmConfig) -> Result<GeneratedCave> {
    let seed = CaveSeeds::resolve(config.seed()).master;
    let mut config = config.clone();
    config.set_seed(Some(seed));

    let mut generator = Generator::new(config)?;
    let grid = generator.generate()?;
    Ok(GeneratedCave { seed, grid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cave::CellKind;

    fn all_configs(seed: u64) -> Vec<AlgorithmConfig> {
        vec![
            AlgorithmConfig::CellularAutomata(CellularAutomataConfig {
                width: 40,
                height: 30,
                seed: Some(seed),
                ..Default::default()
            }),
            AlgorithmConfig::BranchingWalkers(WalkerConfig {
                cave_size: 150,
                seed: Some(seed),
                ..Default::default()
            }),
            AlgorithmConfig::RoomsAndMazes(RoomsAndMazesConfig {
                width: 31,
                height: 25,
                seed: Some(seed),
                ..Default::default()
            }),
        ]
    }

    #[test]
    fn test_only_public_kinds_leave_generators() {
        for seed in 0..4 {
            for config in all_configs(seed) {
                let cave = generate_cave(&config).unwrap();
                assert!(cave
                    .grid
                    .cells()
                    .all(|c| matches!(c.kind, CellKind::Ground | CellKind::Wall | CellKind::Door)));
                assert!(cave.grid.count(CellKind::Ground) > 0, "{} produced no ground", config.name());
            }
        }
    }

    #[test]
    fn test_clear_then_generate_replays_seed() {
        for config in all_configs(11) {
            let mut generator = Generator::new(config).unwrap();
            let first = generator.generate().unwrap();
            generator.clear();
            assert!(generator.grid().is_none());
            generator.clear();
            let second = generator.generate().unwrap();

            assert_eq!(first, second);
            assert_eq!(generator.last_seed(), Some(11));
            assert_eq!(generator.grid(), Some(&second));
        }
    }

    #[test]
    fn test_missing_seed_is_reported() {
        let mut config = all_configs(0).remove(0);
        config.set_seed(None);

        let cave = generate_cave(&config).unwrap();
        config.set_seed(Some(cave.seed));
        let replay = generate_cave(&config).unwrap();

        assert_eq!(cave.grid, replay.grid);
    }

    #[test]
    fn test_config_json_roundtrip_uses_defaults() {
        let json = r#"{ "algorithm": "rooms_and_mazes", "width": 21, "seed": 5 }"#;
        let config: AlgorithmConfig = serde_json::from_str(json).unwrap();

        match &config {
            AlgorithmConfig::RoomsAndMazes(c) => {
                assert_eq!(c.width, 21);
                assert_eq!(c.height, RoomsAndMazesConfig::default().height);
                assert_eq!(c.seed, Some(5));
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_fails_before_generation() {
        let config = AlgorithmConfig::CellularAutomata(CellularAutomataConfig {
            width: 0,
            ..Default::default()
        });
        assert!(matches!(
            Generator::new(config),
            Err(crate::error::GenerationError::InvalidConfiguration(_))
        ));
    }
}
