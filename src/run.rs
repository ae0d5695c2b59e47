use crate::aggregate::{rank, RankedList};
use crate::analogy::AnalogyEngine;
use crate::config::Config;
use crate::cooccur::CooccurrenceLookup;
use crate::error::Result;
use crate::expand::CategoryExpander;
use crate::feature::FeatureFilter;
use crate::ingest::Ingest;
use crate::inspect::RowInspector;
use crate::store::{Row, TableStore};

use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;


#[derive(Parser)]
#[command(name = "category_builder")]
#[command(version)]
#[command(about = "Category expansion and analogies over item/feature co-occurrence matrices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON parameter file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the tables (overrides the config)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the tables from the released CSV matrices
    Ingest,

    /// Expand seed items into their category
    Expand {
        /// The rho param
        #[arg(long)]
        rho: Option<f64>,

        /// How many features to use
        #[arg(short, long)]
        n: Option<usize>,

        /// How many items to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print a single comma separated line
        #[arg(long)]
        cutpaste: bool,

        /// Seeds to expand
        #[arg(required = true)]
        seeds: Vec<String>,
    },

    /// Items that co-occur with a seed
    Cooccur {
        /// How many items to print
        #[arg(short, long)]
        limit: Option<usize>,

        seed: String,
    },

    /// Complete A:B::C:? given B and C
    Analogy {
        /// Squash for combining scores
        #[arg(long)]
        squash: Option<f64>,

        /// How many features to use for the expansion of B
        #[arg(long)]
        semantic_n: Option<usize>,

        /// How many answers to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// The B in A:B::C:?
        b: String,

        /// The C in A:B::C:?
        c: String,
    },

    /// Print a raw row
    Row(RowArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct RowTarget {
    /// Features of an item
    #[arg(long)]
    item: Option<String>,

    /// Items of a feature
    #[arg(long)]
    feature: Option<String>,

    /// Contextual features of an item, from the derived table
    #[arg(long)]
    cooc: Option<String>,
}

#[derive(Args)]
struct RowArgs {
    #[command(flatten)]
    target: RowTarget,

    /// Keep syntactic features only (with --item)
    #[arg(long, conflicts_with = "contextual")]
    syntactic: bool,

    /// Keep contextual features only (with --item)
    #[arg(long)]
    contextual: bool,
}


pub struct Run {}

impl Run {

    pub fn run() -> Result<()> {

        let cli = Cli::parse();
        let level = if cli.verbose { "info" } else { "warn" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

        let mut config = match &cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default()
        };
        if let Some(data_dir) = cli.data_dir {
            config.data_dir = data_dir;
        }

        if let Commands::Ingest = cli.command {
            let timer = Instant::now();
            Ingest::run(&config)?;
            info!("finished ingest, took {} seconds ...", timer.elapsed().as_secs());
            return Ok(());
        }

        let timer = Instant::now();
        let store = Arc::new(TableStore::open(&config.data_dir)?);
        info!("opened store in {} seconds ...", timer.elapsed().as_secs());
        let query = &config.query;

        match cli.command {
            Commands::Ingest => Ok(()),
            Commands::Expand { rho, n, limit, cutpaste, seeds } => {
                let expander = CategoryExpander::new(store);
                let items = expander.expand(seeds.as_slice(), rho.unwrap_or(query.rho), n.unwrap_or(query.n))?;
                let limit = limit.unwrap_or(query.expansion_size);
                if cutpaste {
                    let keys: Vec<&str> = items.iter().take(limit).map(|(k, _)| k.as_str()).collect();
                    println!("{}", keys.join(", "));
                } else {
                    print_ranked(&items, limit);
                }
                Ok(())
            },
            Commands::Cooccur { limit, seed } => {
                let lookup = CooccurrenceLookup::new(store);
                let items = lookup.cooccurring(&seed)?;
                print_ranked(&items, limit.unwrap_or(query.expansion_size));
                Ok(())
            },
            Commands::Analogy { squash, semantic_n, limit, b, c } => {
                let engine = AnalogyEngine::new(store);
                let items = engine.analogy(&b, &c, squash.unwrap_or(query.squash), semantic_n.unwrap_or(query.semantic_n))?;
                for (item, score) in items.iter().take(limit.unwrap_or(query.analogy_size)) {
                    println!("{:5.3}\t\t{}", score, item);
                }
                Ok(())
            },
            Commands::Row(args) => {
                let inspector = RowInspector::new(store);
                let filter = if args.syntactic {
                    Some(FeatureFilter::Syntactic)
                } else if args.contextual {
                    Some(FeatureFilter::Contextual)
                } else {
                    None
                };
                let row = match (args.target.item, args.target.feature, args.target.cooc) {
                    (Some(item), _, _) => inspector.item_features(&item, filter)?,
                    (_, Some(feature), _) => inspector.feature_items(&feature)?,
                    (_, _, Some(item)) => inspector.item_contextual_features(&item)?,
                    _ => Row::new()
                };
                print_row(row);
                Ok(())
            }
        }
    }
}


fn print_ranked(items: &RankedList, limit: usize) {
    for (item, score) in items.iter().take(limit) {
        println!("{}\t{}", score, item);
    }
}

fn print_row(row: Row) {
    for (key, weight) in rank(row) {
        println!("{}\t{}", weight, key);
    }
}
