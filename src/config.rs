//! Sweep configuration, given on the command line as a JSON object; every field has a default
//!

use crate::error::*;
use crate::mwpm_solver::BlossomConfig;
use crate::util::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    #[serde(default = "sweep_default_configs::distances")]
    pub distances: Vec<usize>,
    /// explicit list of physical error rates; overrides `p_min`, `p_max` and `p_count`
    pub probabilities: Option<Vec<f64>>,
    #[serde(default = "sweep_default_configs::p_min")]
    pub p_min: f64,
    #[serde(default = "sweep_default_configs::p_max")]
    pub p_max: f64,
    #[serde(default = "sweep_default_configs::p_count")]
    pub p_count: usize,
    /// shots per (distance, probability)
    #[serde(default = "sweep_default_configs::n_runs")]
    pub n_runs: usize,
    #[serde(default = "sweep_default_configs::seed")]
    pub seed: u64,
    /// run the (distance, probability) batches concurrently; off by default since every batch is
    /// already parallel over its shots
    #[serde(default = "sweep_default_configs::parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub blossom: BlossomConfig,
}

pub mod sweep_default_configs {
    pub fn distances() -> Vec<usize> {
        vec![3, 5, 7, 9]
    }
    pub fn p_min() -> f64 {
        0.05
    }
    pub fn p_max() -> f64 {
        0.15
    }
    pub fn p_count() -> usize {
        20
    }
    pub fn n_runs() -> usize {
        1_000_000
    }
    pub fn seed() -> u64 {
        42
    }
    pub fn parallel() -> bool {
        false
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            distances: sweep_default_configs::distances(),
            probabilities: None,
            p_min: sweep_default_configs::p_min(),
            p_max: sweep_default_configs::p_max(),
            p_count: sweep_default_configs::p_count(),
            n_runs: sweep_default_configs::n_runs(),
            seed: sweep_default_configs::seed(),
            parallel: sweep_default_configs::parallel(),
            blossom: BlossomConfig::default(),
        }
    }
}

impl SweepConfig {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|error| ThresholdError::Configuration(error.to_string()))
    }

    pub fn probabilities(&self) -> Vec<f64> {
        match &self.probabilities {
            Some(probabilities) => probabilities.clone(),
            None => linspace(self.p_min, self.p_max, self.p_count),
        }
    }
}

/// distances must be distinct and at least 2, probabilities must lie in [0, 1]
pub fn validate_sweep(distances: &[usize], probabilities: &[f64]) -> Result<()> {
    if distances.is_empty() || probabilities.is_empty() {
        return Err(ThresholdError::Configuration(
            "a sweep needs at least one distance and one probability".to_string(),
        ));
    }
    for (index, &d) in distances.iter().enumerate() {
        if d < 2 {
            return Err(ThresholdError::Configuration(format!(
                "code distance must be at least 2, got {d}"
            )));
        }
        if distances[..index].contains(&d) {
            return Err(ThresholdError::Configuration(format!("distance {d} appears twice")));
        }
    }
    for &p in probabilities.iter() {
        check_probability("physical error rate", p)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_defaults() {
        // cargo test config_defaults -- --nocapture
        let config = SweepConfig::from_json(json!({})).unwrap();
        assert_eq!(config.distances, vec![3, 5, 7, 9]);
        assert_eq!(config.n_runs, 1_000_000);
        assert_eq!(config.seed, 42);
        assert_eq!(config.blossom.max_half_weight, 500);
        assert!(!config.parallel);
        assert!(config.blossom.parallel);
        let probabilities = config.probabilities();
        assert_eq!(probabilities.len(), 20);
        assert_eq!(probabilities, SweepConfig::default().probabilities());
    }

    #[test]
    fn config_overrides() {
        // cargo test config_overrides -- --nocapture
        let config = SweepConfig::from_json(json!({
            "distances": [3, 5],
            "probabilities": [0.1, 0.2],
            "n_runs": 10,
            "blossom": { "parallel": false }
        }))
        .unwrap();
        assert_eq!(config.probabilities(), vec![0.1, 0.2]);
        assert_eq!(config.n_runs, 10);
        assert!(!config.blossom.parallel);
        assert_eq!(config.blossom.max_half_weight, 500);
        assert!(matches!(
            SweepConfig::from_json(json!({ "distance": [3] })),
            Err(ThresholdError::Configuration(_))
        ));
    }

    #[test]
    fn config_validate_sweep() {
        // cargo test config_validate_sweep -- --nocapture
        assert!(validate_sweep(&[3, 5, 7], &[0.1, 0.2]).is_ok());
        assert!(validate_sweep(&[], &[0.1]).is_err());
        assert!(validate_sweep(&[3], &[]).is_err());
        assert!(validate_sweep(&[1, 3], &[0.1]).is_err());
        assert!(validate_sweep(&[3, 5, 3], &[0.1]).is_err());
        assert!(validate_sweep(&[3, 5], &[0.1, 1.2]).is_err());
    }
}
