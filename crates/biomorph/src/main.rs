use anyhow::Context;
use biomorph::{AppConfig, Runner};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (RON); `biomorph.ron` is used when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the simulation's random stream
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Number of random founders
    #[arg(long)]
    organisms: Option<usize>,

    /// Ticks between statistics lines (0 disables them)
    #[arg(long)]
    report_every: Option<u64>,

    /// Reaction table (RON) applied over the built-in rules
    #[arg(long)]
    reactions: Option<PathBuf>,

    /// Print the reaction table in effect as RON and exit
    #[arg(long)]
    dump_reactions: bool,

    /// Log per-organism events
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.run.ticks = ticks;
    }
    if let Some(organisms) = args.organisms {
        config.world.initial_organisms = organisms;
    }
    if let Some(report_every) = args.report_every {
        config.run.report_every = report_every;
    }
    if args.reactions.is_some() {
        config.run.reaction_table = args.reactions;
    }

    let mut runner = Runner::new(&config).context("Failed to set up the world")?;

    if args.dump_reactions {
        println!("{}", runner.reaction_table_ron()?);
        return Ok(());
    }

    log::info!(
        "Starting Biomorph (seed {}, {} ticks, {} founders)",
        config.run.seed,
        config.run.ticks,
        config.world.initial_organisms
    );

    let summary = runner.run();
    runner.report();
    log::info!(
        "Finished after {} ticks{}",
        summary.ticks,
        if summary.extinct { " (extinct)" } else { "" }
    );

    Ok(())
}
