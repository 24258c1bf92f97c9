use clap::Parser;
use log;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use rusty_lif::error::SNNError;
use rusty_lif::simulator::{Simulation, SimulationConfig};

#[derive(Parser, Debug)]
struct Args {
    /// A JSON file with the simulation parameters (defaults are used for missing fields)
    #[arg(long)]
    config: Option<PathBuf>,
    /// The seed used for weight sampling and input encoding, overrides the one in the config file
    #[arg(long)]
    seed: Option<u64>,
    /// The log level
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<(), SNNError> {
    let args = Args::parse();

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build();
    let log_config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(args.log_level))
        .map_err(|e| SNNError::IOError(e.to_string()))?;
    log4rs::init_config(log_config).map_err(|e| SNNError::IOError(e.to_string()))?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load_from(path)?,
        None => SimulationConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    log::info!("Simulation config: {:?}", config);

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut simulation = Simulation::build(config, &mut rng)?;

    println!("Starting...");
    simulation.run()?;
    println!("Finished!");

    if let Some(monitor) = simulation.monitor() {
        println!("{}", monitor);
    }
    Ok(())
}
