//! Threshold Estimation
//!
//! Sweeps the physical error rate and the code distance, measures the logical error rate of each
//! (distance, probability) batch with Monte Carlo sampling and matching, and looks for the first
//! probability at which every larger distance does worse than the smaller one.
//!
//! The crossing search is a heuristic: it only fires when the comparison at the last distance is
//! actually made (the previous distance saw at least one failure) and every comparison made at that
//! probability favored the smaller distance. The threshold is reported as the midpoint between that
//! probability and the previous one. The last probability of the sweep is never tested.
//!

use crate::circuit::*;
use crate::config::*;
use crate::decoding_graph::*;
use crate::defects::*;
use crate::error::*;
use crate::mwpm_solver::*;
use crate::stats::*;
use parking_lot::Mutex;
use pbr::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;

/// first crossing of a logical error rate table, `rates[distance_index][probability_index]`
pub fn find_crossing(probabilities: &[f64], rates: &[Vec<f64>]) -> Option<f64> {
    for row in rates.iter() {
        assert_eq!(row.len(), probabilities.len(), "every distance needs one rate per probability");
    }
    for i in 0..probabilities.len().saturating_sub(1) {
        let mut previous_rate = -1.;
        let mut all_distances = true;
        for (distance_index, row) in rates.iter().enumerate() {
            let rate = row[i];
            if i > 0 && previous_rate > 0. {
                if previous_rate < rate {
                    if distance_index == rates.len() - 1 && all_distances {
                        return Some((probabilities[i - 1] + probabilities[i]) / 2.);
                    }
                } else {
                    all_distances = false;
                }
            }
            previous_rate = rate;
        }
    }
    None
}

#[derive(Debug, Clone, Serialize)]
pub struct LogicalErrorTable {
    pub distances: Vec<usize>,
    pub probabilities: Vec<f64>,
    /// `points[distance_index][probability_index]`
    pub points: Vec<Vec<LogicalErrorPoint>>,
}

impl LogicalErrorTable {
    pub fn rates(&self) -> Vec<Vec<f64>> {
        self.points
            .iter()
            .map(|row| row.iter().map(|point| point.logical_error_rate).collect())
            .collect()
    }

    pub fn get(&self, distance: usize, probability_index: usize) -> Option<&LogicalErrorPoint> {
        let distance_index = self.distances.iter().position(|&d| d == distance)?;
        self.points[distance_index].get(probability_index)
    }

    pub fn find_crossing(&self) -> Option<f64> {
        find_crossing(&self.probabilities, &self.rates())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdReport {
    pub table: LogicalErrorTable,
    /// `None` when no crossing happens in the swept range
    pub threshold: Option<f64>,
}

impl std::fmt::Display for ThresholdReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>10}", "p")?;
        for d in self.table.distances.iter() {
            write!(f, " {:>12}", format!("d = {d}"))?;
        }
        writeln!(f)?;
        for (i, p) in self.table.probabilities.iter().enumerate() {
            write!(f, "{p:>10.5}")?;
            for row in self.table.points.iter() {
                write!(f, " {:>12.4e}", row[i].logical_error_rate)?;
            }
            writeln!(f)?;
        }
        match self.threshold {
            Some(threshold) => write!(f, "estimated threshold: {threshold:.5}"),
            None => write!(f, "estimated threshold: undefined (no crossing in the swept range)"),
        }
    }
}

/// drives the sampler and the matching oracle over a sweep
pub struct ThresholdEstimator<S: CircuitSimulator, M: MatchingOracle> {
    pub simulator: S,
    pub oracle: M,
    pub seed: u64,
    /// run the (distance, probability) batches concurrently; each batch is already parallel over its
    /// shots and holds every record of the batch in memory
    pub parallel: bool,
    /// show a progress bar on stdout
    pub progress: bool,
}

impl ThresholdEstimator<BitFlipSimulator, BlossomMatcher> {
    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(BitFlipSimulator::new(), BlossomMatcher::new(config.blossom.clone()))
            .with_seed(config.seed)
            .with_parallel(config.parallel)
    }
}

impl<S: CircuitSimulator, M: MatchingOracle> ThresholdEstimator<S, M> {
    pub fn new(simulator: S, oracle: M) -> Self {
        Self {
            simulator,
            oracle,
            seed: 42,
            parallel: false,
            progress: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// sample, extract, decode and score one batch of `n_runs` shots
    pub fn logical_error_rate(&self, d: usize, p: f64, q: f64, n_runs: usize) -> Result<LogicalErrorPoint> {
        if n_runs == 0 {
            return Err(ThresholdError::InsufficientSamples {
                distance: d,
                probability: p,
            });
        }
        let graph = DecodingGraph::build(d, p, q)?;
        let circuit = self.simulator.describe(d, p, q).map_err(|error| error.in_batch(d, p))?;
        let records = self
            .simulator
            .sample(&circuit, n_runs, self.seed)
            .map_err(|error| error.in_batch(d, p))?;
        if records.len() != n_runs {
            return Err(ThresholdError::external(
                ExternalService::Sampler,
                format!("asked for {n_runs} shots but got {}", records.len()),
            )
            .in_batch(d, p));
        }
        let defects = extract_batch(&records, d)?;
        let corrections = self
            .oracle
            .decode_batch(&graph, &defects)
            .map_err(|error| error.in_batch(d, p))?;
        if corrections.len() != n_runs {
            return Err(ThresholdError::external(
                ExternalService::MatchingOracle,
                format!("decoded {} shots out of {n_runs}", corrections.len()),
            )
            .in_batch(d, p));
        }
        let mut failures = 0;
        for (shot, (record, correction)) in records.iter().zip(corrections.iter()).enumerate() {
            if correction.len() != d {
                return Err(ThresholdError::external(
                    ExternalService::MatchingOracle,
                    format!("correction of shot {shot} has {} bits, expected {d}", correction.len()),
                )
                .in_batch(d, p));
            }
            let data = final_data(record, d)?;
            let parity = data
                .iter()
                .zip(correction.iter())
                .fold(false, |parity, (&outcome, &flip)| parity ^ outcome ^ flip);
            if parity {
                failures += 1;
            }
        }
        let point = LogicalErrorPoint::new(d, p, q, n_runs, failures);
        log::info!(
            "d = {d}, p = {p:.5}, q = {q:.5}: pL = {:.4e} ({failures}/{n_runs})",
            point.logical_error_rate
        );
        Ok(point)
    }

    /// the logical error rate of every (distance, probability) pair, data and ancilla at the same rate;
    /// the first failing batch aborts the sweep
    pub fn sweep(&self, distances: &[usize], probabilities: &[f64], n_runs: usize) -> Result<LogicalErrorTable> {
        validate_sweep(distances, probabilities)?;
        if n_runs == 0 {
            return Err(ThresholdError::InsufficientSamples {
                distance: distances[0],
                probability: probabilities[0],
            });
        }
        let pairs: Vec<(usize, f64)> = distances
            .iter()
            .flat_map(|&d| probabilities.iter().map(move |&p| (d, p)))
            .collect();
        log::debug!(
            "sweeping {} distances x {} probabilities with {n_runs} shots each",
            distances.len(),
            probabilities.len()
        );
        let progress_bar = if self.progress {
            let mut progress_bar = ProgressBar::new(pairs.len() as u64);
            progress_bar.message("threshold sweep ");
            Some(Mutex::new(progress_bar))
        } else {
            None
        };
        let run_pair = |&(d, p): &(usize, f64)| {
            let point = self.logical_error_rate(d, p, p, n_runs);
            if let Some(progress_bar) = progress_bar.as_ref() {
                progress_bar.lock().inc();
            }
            point
        };
        let points: Vec<LogicalErrorPoint> = if self.parallel {
            pairs.par_iter().map(run_pair).collect::<Result<_>>()?
        } else {
            pairs.iter().map(run_pair).collect::<Result<_>>()?
        };
        if let Some(progress_bar) = progress_bar {
            progress_bar.into_inner().finish();
        }
        let points = points
            .chunks(probabilities.len())
            .map(|row| row.to_vec())
            .collect();
        Ok(LogicalErrorTable {
            distances: distances.to_vec(),
            probabilities: probabilities.to_vec(),
            points,
        })
    }

    pub fn estimate(&self, distances: &[usize], probabilities: &[f64], n_runs: usize) -> Result<ThresholdReport> {
        let table = self.sweep(distances, probabilities, n_runs)?;
        let threshold = table.find_crossing();
        match threshold {
            Some(threshold) => log::info!("estimated threshold: {threshold:.5}"),
            None => log::info!("no threshold crossing in the swept range"),
        }
        Ok(ThresholdReport { table, threshold })
    }
}
