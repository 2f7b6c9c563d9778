use crate::circuit::BitFlipSimulator;
use crate::config::*;
use crate::decoding_graph::*;
use crate::error::*;
use crate::mwpm_solver::*;
use crate::threshold::*;
use crate::util::*;
use clap::Parser;
use clap::Subcommand;
use std::fs;

#[derive(Parser, Clone)]
#[clap(author = clap::crate_authors!(", "))]
#[clap(version = env!("CARGO_PKG_VERSION"))]
#[clap(about = "Threshold of the repetition code under bit-flip noise, decoded by minimum-weight perfect matching")]
#[clap(color = clap::ColorChoice::Auto)]
#[clap(propagate_version = true)]
#[clap(subcommand_required = true)]
#[clap(arg_required_else_help = true)]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// sweep code distances and physical error rates, then search for the threshold crossing
    Estimate(EstimateParameters),
    /// logical error rate of a single (d, p, q) point
    Rate {
        #[clap(flatten)]
        point: PointParameters,
        /// the number of shots to sample
        #[clap(short = 'r', long, default_value_t = 100_000)]
        n_runs: usize,
        /// seed of the shot sampler
        #[clap(long, default_value_t = 42)]
        seed: u64,
        /// maximum half weight of edges
        #[clap(long, default_value_t = 500)]
        max_half_weight: usize,
    },
    /// print the decoding graph of (d, p, q) as JSON
    Graph {
        #[clap(flatten)]
        point: PointParameters,
    },
}

#[derive(Parser, Clone)]
pub struct PointParameters {
    /// code distance
    #[clap(value_parser)]
    d: usize,
    /// physical error rate of data qubits
    #[clap(value_parser)]
    p: f64,
    /// physical error rate of ancilla qubits, equal to p when not given
    #[clap(short = 'q', long)]
    q: Option<f64>,
}

#[derive(Parser, Clone)]
pub struct EstimateParameters {
    /// code distances, e.g. `-d 3,5,7`; overrides the sweep configuration
    #[clap(short = 'd', long, value_delimiter = ',')]
    distances: Vec<usize>,
    /// physical error rates, e.g. `-p 0.05,0.1`; overrides the sweep configuration
    #[clap(short = 'p', long, value_delimiter = ',')]
    probabilities: Vec<f64>,
    /// shots per (distance, probability); overrides the sweep configuration
    #[clap(short = 'r', long)]
    n_runs: Option<usize>,
    /// seed of the shot sampler; overrides the sweep configuration
    #[clap(long)]
    seed: Option<u64>,
    /// the configuration of the sweep, see `SweepConfig`
    #[clap(long, default_value_t = ("{}").to_string())]
    sweep_config: String,
    /// write the full report as JSON to this file
    #[clap(short = 'o', long)]
    output: Option<String>,
    /// hide the progress bar; also hidden when `NO_PROGRESS_BAR` is set
    #[clap(long, action)]
    no_progress: bool,
}

impl EstimateParameters {
    pub fn sweep_config(&self) -> Result<SweepConfig> {
        let value: serde_json::Value = serde_json::from_str(&self.sweep_config)
            .map_err(|error| ThresholdError::Configuration(format!("sweep config is not JSON: {error}")))?;
        let mut config = SweepConfig::from_json(value)?;
        if !self.distances.is_empty() {
            config.distances = self.distances.clone();
        }
        if !self.probabilities.is_empty() {
            config.probabilities = Some(self.probabilities.clone());
        }
        if let Some(n_runs) = self.n_runs {
            config.n_runs = n_runs;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }

    pub fn run(self) -> Result<()> {
        let config = self.sweep_config()?;
        log::debug!("sweep config: {}", serde_json::to_string(&config)?);
        let show_progress = !self.no_progress && !env_is_set("NO_PROGRESS_BAR");
        let estimator = ThresholdEstimator::from_config(&config).with_progress(show_progress);
        let report = estimator.estimate(&config.distances, &config.probabilities(), config.n_runs)?;
        println!("{report}");
        if let Some(output) = self.output.as_ref() {
            fs::write(output, serde_json::to_string_pretty(&report)?)?;
            log::info!("report written to {output}");
        }
        Ok(())
    }
}

impl PointParameters {
    fn q(&self) -> f64 {
        self.q.unwrap_or(self.p)
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Estimate(parameters) => parameters.run(),
            Commands::Rate {
                point,
                n_runs,
                seed,
                max_half_weight,
            } => {
                let matcher = BlossomMatcher::new(BlossomConfig {
                    max_half_weight,
                    ..BlossomConfig::default()
                });
                let estimator = ThresholdEstimator::new(BitFlipSimulator::new(), matcher).with_seed(seed);
                let result = estimator.logical_error_rate(point.d, point.p, point.q(), n_runs)?;
                println!("{}", serde_json::to_string(&result)?);
                Ok(())
            }
            Commands::Graph { point } => {
                let graph = DecodingGraph::build(point.d, point.p, point.q())?;
                println!("{}", serde_json::to_string_pretty(&graph)?);
                Ok(())
            }
        }
    }
}

pub fn execute_in_cli<'a>(iter: impl Iterator<Item = &'a String> + Clone, print_command: bool) -> Result<()> {
    if print_command {
        print!("[command]");
        for word in iter.clone() {
            if word.contains(char::is_whitespace) {
                print!("'{word}' ")
            } else {
                print!("{word} ")
            }
        }
        println!();
    }
    Cli::parse_from(iter).run()
}
