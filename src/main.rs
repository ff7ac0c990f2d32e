use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cavegen::generation::{CellularAutomataConfig, RoomsAndMazesConfig, WalkerConfig};
use cavegen::seeds::CaveSeeds;
use cavegen::stats::layout_stats;
use cavegen::{generate_cave, AlgorithmConfig, CellKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    /// Cellular automata smoothing with connected rooms
    Cellular,
    /// Branching floor makers
    Walkers,
    /// Rooms joined by one-cell mazes
    Rooms,
}

#[derive(Parser, Debug)]
#[command(name = "cavegen")]
#[command(about = "Generate procedural 2D caves and dungeons")]
struct Args {
    /// Generation algorithm (ignored when --config is given)
    #[arg(value_enum, default_value_t = Algorithm::Cellular)]
    algorithm: Algorithm,

    /// JSON configuration file, tagged with "algorithm"
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Text phrase hashed into the seed
    #[arg(long, conflicts_with = "seed")]
    seed_phrase: Option<String>,

    /// Width of the grid in cells
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the grid in cells
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Cells to open with the walkers algorithm
    #[arg(long)]
    cave_size: Option<usize>,

    /// Print layout statistics over this many sampled path pairs
    #[arg(long, value_name = "PAIRS")]
    stats: Option<usize>,

    /// Do not print the grid
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Enable debug messages
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = build_config(args)?;

    println!("Generating {} cave", config.name());
    let start = Instant::now();
    let cave = generate_cave(&config)?;
    let elapsed = start.elapsed();

    let grid = &cave.grid;
    println!("Seed: {}", cave.seed);
    println!("Grid size: {}x{}", grid.width, grid.height);
    println!(
        "Generated in {:.2?}: {} ground, {} wall, {} door cells",
        elapsed,
        grid.count(CellKind::Ground),
        grid.count(CellKind::Wall),
        grid.count(CellKind::Door)
    );

    if !args.quiet {
        println!();
        print!("{}", grid);
    }

    if let Some(pairs) = args.stats {
        let mut rng = ChaCha8Rng::seed_from_u64(cave.seed);
        let stats = layout_stats(grid, &mut rng, pairs);

        println!();
        println!("Diversity:");
        println!("  Open: {}", stats.open);
        println!("  Wall adjacent: {}", stats.wall_adjacent);
        println!("  Corridor: {}", stats.corridor);
        println!("  Corner: {}", stats.corner);
        println!("  Dead end: {}", stats.dead_end);
        match stats.complexity {
            Some(c) => println!("Complexity: {:.2} over {} pairs", c, stats.sampled_pairs),
            None => println!("Complexity: not enough connected ground"),
        }
    }

    Ok(())
}

/// Start from the config file or the algorithm defaults, then apply overrides.
fn build_config(args: &Args) -> Result<AlgorithmConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => match args.algorithm {
            Algorithm::Cellular => AlgorithmConfig::CellularAutomata(CellularAutomataConfig::default()),
            Algorithm::Walkers => AlgorithmConfig::BranchingWalkers(WalkerConfig::default()),
            Algorithm::Rooms => AlgorithmConfig::RoomsAndMazes(RoomsAndMazesConfig::default()),
        },
    };

    match &mut config {
        AlgorithmConfig::CellularAutomata(c) => {
            c.width = args.width.unwrap_or(c.width);
            c.height = args.height.unwrap_or(c.height);
        }
        AlgorithmConfig::RoomsAndMazes(c) => {
            c.width = args.width.unwrap_or(c.width);
            c.height = args.height.unwrap_or(c.height);
        }
        AlgorithmConfig::BranchingWalkers(c) => {
            c.cave_size = args.cave_size.unwrap_or(c.cave_size);
            if args.width.is_some() || args.height.is_some() {
                log::warn!("Walker grids are sized from --cave-size; ignoring width and height");
            }
        }
    }

    if let Some(phrase) = &args.seed_phrase {
        config.set_seed(Some(CaveSeeds::from_phrase(phrase).master));
    } else if args.seed.is_some() {
        config.set_seed(args.seed);
    }

    Ok(config)
}
