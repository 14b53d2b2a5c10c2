use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use procurement_bisbm::cluster::detector::{run_trials, DetectionParams, ExternalCommand};
use procurement_bisbm::config::Config;
use procurement_bisbm::data::loader::load_records;
use procurement_bisbm::graph::KeyOrder;
use procurement_bisbm::pipeline::{self, Prepared};
use procurement_bisbm::storage;

#[derive(Parser, Debug)]
#[clap(
    name = "procurement-bisbm",
    about = "Vendor/product graph preparation for bipartite stochastic block models"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0", global = true)]
    threads: usize,

    /// Verbose logging
    #[clap(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the edgelist, types and index tables for the detector
    Prepare {
        #[clap(flatten)]
        input: InputArgs,
    },

    /// Attach a detector's assignment file back to vendor and product keys
    Attach {
        #[clap(flatten)]
        input: InputArgs,

        /// File with one cluster id per line, in node id order
        #[clap(long)]
        assignment: PathBuf,
    },

    /// Prepare, run an external detector per trial, and attach each result
    Run {
        #[clap(flatten)]
        input: InputArgs,

        /// Community counts as KA:KB; repeat for parallel trials
        #[clap(long = "trial", required = true)]
        trials: Vec<DetectionParams>,

        /// Disable degree correction
        #[clap(long)]
        no_deg_corr: bool,

        /// Detector program
        #[clap(long)]
        detector: String,

        /// Detector arguments; {edgelist} {types} {output} {ka} {kb} {deg_corr} are substituted
        #[clap(last = true)]
        detector_args: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Path to input Parquet or CSV file
    #[clap(long)]
    input: PathBuf,

    /// Output directory for results
    #[clap(long, default_value = "bisbm_results")]
    output_dir: PathBuf,

    /// JSON configuration file; flags below override it
    #[clap(long)]
    config: Option<PathBuf>,

    /// Minimum purchase count for a record to be included
    #[clap(long)]
    min_purchases: Option<i64>,

    #[clap(long)]
    vendor_column: Option<String>,

    #[clap(long)]
    product_column: Option<String>,

    #[clap(long)]
    count_column: Option<String>,

    #[clap(long)]
    amount_column: Option<String>,

    /// Order keys by their string form even when numeric
    #[clap(long)]
    lexical_keys: bool,
}

impl InputArgs {
    /// Without `--config`, `reuse_saved` picks up the `config.json` of an
    /// earlier run in the output directory
    fn config(&self, reuse_saved: bool) -> Result<Config> {
        let mut config = match (&self.config, reuse_saved) {
            (Some(path), _) => Config::from_json_file(path)?,
            (None, true) => Config::resolve(None, &self.output_dir)?,
            (None, false) => Config::default(),
        };

        if let Some(min_purchases) = self.min_purchases {
            config.min_purchases = min_purchases;
        }
        if let Some(name) = &self.vendor_column {
            config.columns.vendor_key = name.clone();
        }
        if let Some(name) = &self.product_column {
            config.columns.product_key = name.clone();
        }
        if let Some(name) = &self.count_column {
            config.columns.purchase_count = name.clone();
        }
        if let Some(name) = &self.amount_column {
            config.columns.amount = name.clone();
        }
        if self.lexical_keys {
            config.key_order = KeyOrder::Lexical;
        }

        Ok(config)
    }

    /// Load and prepare the input; nothing is written on failure
    fn prepare(&self, reuse_saved: bool) -> Result<(Config, Prepared)> {
        let config = self.config(reuse_saved)?;
        let records = load_records(&self.input, &config.columns)?;
        let prepared = pipeline::prepare(&records, &config)?;
        Ok((config, prepared))
    }
}

fn write_prepared(config: &Config, prepared: &Prepared, output_dir: &Path) -> Result<()> {
    prepared.write(output_dir)?;
    config.save(output_dir)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    match args.command {
        Command::Prepare { input } => {
            let (config, prepared) = input.prepare(false)?;
            write_prepared(&config, &prepared, &input.output_dir)?;
        }

        Command::Attach { input, assignment } => {
            let (_, prepared) = input.prepare(true)?;
            let assignment = storage::read_assignment(&assignment)?;
            pipeline::attach(&prepared, &assignment)?.write(&input.output_dir)?;
        }

        Command::Run {
            input,
            mut trials,
            no_deg_corr,
            detector,
            detector_args,
        } => {
            for trial in &mut trials {
                trial.deg_corr = !no_deg_corr;
            }

            let (config, prepared) = input.prepare(false)?;
            write_prepared(&config, &prepared, &input.output_dir)?;

            let detector = ExternalCommand::new(
                detector,
                detector_args,
                input.output_dir.join("work"),
            );
            let results = run_trials(&detector, &prepared.edges, &prepared.types, &trials)?;

            for (params, assignment) in results {
                let trial_dir = input.output_dir.join(params.label());
                pipeline::attach(&prepared, &assignment)?.write(&trial_dir)?;
            }
        }
    }

    log::info!("Done");

    Ok(())
}
