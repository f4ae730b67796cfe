use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use evo_track::simulation::params::Params;
use evo_track::simulation::population::Population;
use evo_track::simulation::track::Track;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "evo-track",
    version,
    about = "Evolve neural-network runners on a walled track"
)]
struct Cli {
    /// Parameter file (JSON). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Track file (JSON). The built-in square circuit is used when omitted.
    #[arg(long)]
    track: Option<PathBuf>,

    /// Continue from a saved population instead of starting fresh.
    #[arg(long, conflicts_with_all = ["config", "track"])]
    resume: Option<PathBuf>,

    /// Generations to run after the founders.
    #[arg(long, default_value_t = 100)]
    generations: u32,

    /// Seed for the random number generator; overrides the parameter file.
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the final population. Defaults to a timestamped file in `saves/`.
    #[arg(long)]
    save: Option<PathBuf>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn default_save_path() -> PathBuf {
    PathBuf::from("saves").join(format!("population-{}.json", Local::now().format("%Y%m%d-%H%M%S")))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let (mut population, resumed) = match &cli.resume {
        Some(path) => {
            let population = Population::load_from_file(path)
                .with_context(|| format!("failed to load population from {}", path.display()))?;
            (population, true)
        }
        None => {
            let params = match &cli.config {
                Some(path) => Params::load_from_file(path)
                    .with_context(|| format!("failed to load parameters from {}", path.display()))?,
                None => Params::default(),
            };
            let track = match &cli.track {
                Some(path) => Track::load_from_file(path)
                    .with_context(|| format!("failed to load track from {}", path.display()))?,
                None => Track::default_track(),
            };
            (Population::new(params, track)?, false)
        }
    };

    let seed = cli
        .seed
        .or(population.params().rng_seed)
        .unwrap_or_else(rand::random);
    info!(seed, "random number generator seeded");
    let mut rng = SmallRng::seed_from_u64(seed);

    if resumed && !population.runners().is_empty() {
        info!(generation = population.generation(), "resuming population");
        // Runners are loaded without their test-run state
        population.force_retest();
    } else {
        population.new_simulation(&mut rng)?;
    }

    for _ in 0..cli.generations {
        population.advance_generation(&mut rng)?;
    }

    let save_path = cli.save.unwrap_or_else(default_save_path);
    if let Some(dir) = save_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    population
        .save_to_file(&save_path)
        .with_context(|| format!("failed to save population to {}", save_path.display()))?;
    info!(path = %save_path.display(), "population saved");

    Ok(())
}
