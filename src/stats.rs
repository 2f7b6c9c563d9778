//! Logical error statistics of one (distance, probability) batch.

use serde::Serialize;

/// z-score of a 95% confidence interval
pub const Z_95: f64 = 1.96;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalErrorPoint {
    pub distance: usize,
    /// physical error rate of data qubits
    pub p: f64,
    /// physical error rate of ancilla qubits
    pub q: f64,
    pub shots: usize,
    /// shots whose corrected logical outcome is flipped
    pub failures: usize,
    /// pL = failures / shots
    pub logical_error_rate: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

impl LogicalErrorPoint {
    /// `shots` must be positive; the sweep rejects empty batches before getting here
    pub fn new(distance: usize, p: f64, q: f64, shots: usize, failures: usize) -> Self {
        assert!(shots > 0, "a logical error rate needs at least one shot");
        assert!(failures <= shots);
        let (ci_low, ci_high) = wilson_ci(failures, shots, Z_95);
        Self {
            distance,
            p,
            q,
            shots,
            failures,
            logical_error_rate: failures as f64 / shots as f64,
            ci_low,
            ci_high,
        }
    }
}

/// Wilson score interval of a binomial proportion; (0, 1) when there is no trial
pub fn wilson_ci(successes: usize, trials: usize, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 1.0);
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let spread = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt() / denominator;
    ((center - spread).max(0.0), (center + spread).min(1.0))
}
