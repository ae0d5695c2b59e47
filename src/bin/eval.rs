use category_builder::eval::{self, AnalogyOutcome, AnalogyReport, MapParams, SynsetData, MAP_EXPANSION_SIZE, MAX_POSITION};
use category_builder::{AnalogyEngine, CategoryExpander, Config, Result, TableStore};

use clap::{Parser, Subcommand};
use log::{error, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;


// offline quality checks over a built store.
// treated as binary executable so it can be ran independently from main

#[derive(Parser)]
#[command(name = "eval")]
#[command(about = "Analogy accuracy and set-expansion MAP over a built store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON parameter file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the tables (overrides the config)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Accuracy on a file of `A B C D` problems grouped under `: name` lines
    Analogy {
        filename: PathBuf,

        /// Squash for combining scores
        #[arg(long)]
        squash: Option<f64>,

        /// How many features to use for the expansion of B
        #[arg(long, default_value_t = 200)]
        semantic_n: usize,

        /// Seed for shuffling the problems
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Mean average precision of expansions from random seeds, one synset per line
    Expansion {
        filename: PathBuf,

        /// How many random seed sets to try
        #[arg(long, default_value_t = 50)]
        iterations: usize,

        /// If positive, seeds are drawn only from the first this many synsets
        #[arg(long, default_value_t = 0)]
        seeds_in_top_n: usize,

        /// If positive, each list is scored against this many synsets
        #[arg(long, default_value_t = 0)]
        map_n: usize,

        /// The rho param
        #[arg(long)]
        rho: Option<f64>,

        /// How many features to use
        #[arg(short, long)]
        n: Option<usize>,

        /// How many items of each expansion are scored
        #[arg(long, default_value_t = MAP_EXPANSION_SIZE)]
        expansion_size: usize,

        /// Seed for drawing the seed sets
        #[arg(long)]
        seed: Option<u64>,
    },
}


fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default()
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let timer = Instant::now();
    let store = Arc::new(TableStore::open(&config.data_dir)?);
    info!("opened store in {} seconds ...", timer.elapsed().as_secs());

    match cli.command {
        Commands::Analogy { filename, squash, semantic_n, seed } => {
            let squash = squash.unwrap_or(config.query.squash);
            let mut rng = seeded_rng(seed);
            let engine = AnalogyEngine::new(store);
            for mut set in eval::read_analogy_data(&filename)? {
                if set.is_skipped() {
                    println!("SKIPPING {}", set.name);
                    continue;
                }
                set.problems.shuffle(&mut rng);
                for reverse in [true, false] {
                    let report = eval::evaluate_analogies(&engine, &set, squash, semantic_n, reverse)?;
                    print_analogy_report(&report);
                }
            }
        },
        Commands::Expansion { filename, iterations, seeds_in_top_n, map_n, rho, n, expansion_size, seed } => {
            let data = SynsetData::read(&filename)?;
            let params = MapParams {
                iterations,
                seeds_in_top_n,
                map_n,
                rho: rho.unwrap_or(config.query.rho),
                n: n.unwrap_or(config.query.n),
                expansion_size,
            };
            let mut rng = seeded_rng(seed);

            let expander = CategoryExpander::new(store);
            let report = eval::evaluate_map(&expander, &data, &params, &mut rng)?;

            for iteration in &report.iterations {
                println!("{:.3}\t{}", iteration.score, iteration.seeds.join(", "));
                for intrusion in &iteration.intrusions {
                    println!("\t{:>3} {:.3} {}", intrusion.position, intrusion.badness, intrusion.item);
                }
            }
            println!("MAP = {:.4} over {} iterations", report.map_score(), report.iterations.len());
            println!("Worst intruders:");
            for (item, badness) in report.top_intrusions(20) {
                println!("\t{:.3}\t{}", badness, item);
            }
        }
    }

    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy()
    }
}

fn print_analogy_report(report: &AnalogyReport) {

    println!("=========  {} ============", report.name);
    let mut correct = 0;
    for (i, result) in report.results.iter().enumerate() {
        match &result.outcome {
            AnalogyOutcome::Solved { position, intruders } => {
                if *position == 0 {
                    correct += 1;
                }
                println!("{} : {} :: {} : {}\tat {}\t[{}]", result.lhs_1, result.rhs_1, result.lhs_2, result.rhs_2, position, intruders.join(", "));
            },
            AnalogyOutcome::Failed => {
                println!("{} : {} :: {} : {}\tFAILED", result.lhs_1, result.rhs_1, result.lhs_2, result.rhs_2);
            }
        }
        info!("current precision {}/{}", correct, i + 1);
    }

    for pos in 1..=MAX_POSITION {
        println!("correct within {}: {}", pos, report.correct_at_pos[pos]);
    }
    println!("accuracy for {}: {:.4}", report.name, report.accuracy());
}
