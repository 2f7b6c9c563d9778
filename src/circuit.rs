//! Circuit Description and Shot Sampling
//!
//! The noisy syndrome extraction circuit of the repetition code and a sampler that runs it.
//! Both live behind [`CircuitSimulator`] so that the threshold sweep can be driven by any simulator,
//! including deterministic fakes in tests.
//!
//! The bundled [`BitFlipSimulator`] is exact for this circuit: every qubit starts in |0>, the only
//! noise is X flips and the only gate is CNOT, so each qubit stays a classical bit.
//!

use crate::defects::MeasurementRecord;
use crate::error::*;
use crate::layout::*;
use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Instruction {
    /// reset to |0>
    Reset(usize),
    /// flip with the given probability
    XError { qubit: usize, probability: f64 },
    Cnot { control: usize, target: usize },
    /// Z-basis measurement, appended to the record
    Measure(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSpec {
    pub qubit_num: usize,
    pub instructions: Vec<Instruction>,
}

impl CircuitSpec {
    pub fn measurement_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|instruction| matches!(instruction, Instruction::Measure(_)))
            .count()
    }
}

/// distance-d repetition code with d - 1 syndrome rounds and a final data measurement;
/// data qubits sit at even indices and ancillas at odd indices of a 2d - 1 qubit chain
pub fn describe_repetition_circuit(d: usize, p: f64, q: f64) -> Result<CircuitSpec> {
    let layout = SpaceTimeLayout::new(d)?;
    check_probability("data error probability p", p)?;
    check_probability("ancilla error probability q", q)?;
    let qubit_num = 2 * d - 1;
    let mut instructions: Vec<Instruction> = (0..qubit_num).map(Instruction::Reset).collect();
    for _ in 0..layout.ancillas() {
        for qubit in 0..qubit_num {
            let probability = if qubit % 2 == 0 { p } else { q };
            instructions.push(Instruction::XError { qubit, probability });
        }
        for ancilla in (1..qubit_num).step_by(2) {
            instructions.push(Instruction::Cnot {
                control: ancilla - 1,
                target: ancilla,
            });
            instructions.push(Instruction::Cnot {
                control: ancilla + 1,
                target: ancilla,
            });
            instructions.push(Instruction::Measure(ancilla));
            instructions.push(Instruction::Reset(ancilla));
        }
    }
    for data in (0..qubit_num).step_by(2) {
        instructions.push(Instruction::XError {
            qubit: data,
            probability: p,
        });
        instructions.push(Instruction::Measure(data));
    }
    let circuit = CircuitSpec { qubit_num, instructions };
    debug_assert_eq!(circuit.measurement_count(), layout.record_length());
    Ok(circuit)
}

/// describes and samples the noisy circuit of a distance-d code
pub trait CircuitSimulator: Sync {
    type Circuit: Send + Sync;

    fn describe(&self, d: usize, p: f64, q: f64) -> Result<Self::Circuit>;

    /// deterministic given the seed; one record per shot, in measurement order
    fn sample(&self, circuit: &Self::Circuit, n_runs: usize, seed: u64) -> Result<Vec<MeasurementRecord>>;
}

/// exact classical simulation of X noise on CNOT circuits
#[derive(Debug, Clone, Default)]
pub struct BitFlipSimulator {}

impl BitFlipSimulator {
    pub fn new() -> Self {
        Self {}
    }

    /// one shot; the generator of shot `k` is seeded with `seed + k` so that shots are independent
    /// of how they are scheduled across threads
    pub fn run_shot(circuit: &CircuitSpec, seed: u64) -> MeasurementRecord {
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let mut qubits = vec![false; circuit.qubit_num];
        let mut record = Vec::with_capacity(circuit.measurement_count());
        for instruction in circuit.instructions.iter() {
            match *instruction {
                Instruction::Reset(qubit) => qubits[qubit] = false,
                Instruction::XError { qubit, probability } => {
                    if rng.gen::<f64>() < probability {
                        qubits[qubit] = !qubits[qubit];
                    }
                }
                Instruction::Cnot { control, target } => qubits[target] ^= qubits[control],
                Instruction::Measure(qubit) => record.push(qubits[qubit]),
            }
        }
        record
    }
}

impl CircuitSimulator for BitFlipSimulator {
    type Circuit = CircuitSpec;

    fn describe(&self, d: usize, p: f64, q: f64) -> Result<CircuitSpec> {
        describe_repetition_circuit(d, p, q)
    }

    fn sample(&self, circuit: &CircuitSpec, n_runs: usize, seed: u64) -> Result<Vec<MeasurementRecord>> {
        if let Some(qubit) = circuit.instructions.iter().find_map(|instruction| match *instruction {
            Instruction::Reset(qubit) | Instruction::Measure(qubit) | Instruction::XError { qubit, .. } => {
                (qubit >= circuit.qubit_num).then_some(qubit)
            }
            Instruction::Cnot { control, target } => {
                (control >= circuit.qubit_num || target >= circuit.qubit_num).then_some(control.max(target))
            }
        }) {
            return Err(ThresholdError::external(
                ExternalService::Sampler,
                format!("circuit addresses qubit {qubit} but only has {}", circuit.qubit_num),
            ));
        }
        Ok((0..n_runs)
            .into_par_iter()
            .map(|shot| Self::run_shot(circuit, seed.wrapping_add(shot as u64)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defects::*;

    #[test]
    fn circuit_measurement_count_matches_record() {
        // cargo test circuit_measurement_count_matches_record -- --nocapture
        for d in [2, 3, 5, 7, 9] {
            let circuit = describe_repetition_circuit(d, 0.1, 0.1).unwrap();
            assert_eq!(circuit.qubit_num, 2 * d - 1);
            assert_eq!(circuit.measurement_count(), (d - 1) * (d - 1) + d);
        }
        assert!(describe_repetition_circuit(1, 0.1, 0.1).is_err());
        assert!(describe_repetition_circuit(3, 0.1, 2.).is_err());
    }

    #[test]
    fn circuit_noiseless_samples_are_zero() {
        // cargo test circuit_noiseless_samples_are_zero -- --nocapture
        let simulator = BitFlipSimulator::new();
        let circuit = simulator.describe(5, 0., 0.).unwrap();
        let records = simulator.sample(&circuit, 50, 42).unwrap();
        assert_eq!(records.len(), 50);
        for record in records.iter() {
            assert_eq!(record.len(), 21);
            assert!(record.iter().all(|&bit| !bit));
        }
    }

    #[test]
    fn circuit_ancilla_flip_is_measurement_error() {
        // cargo test circuit_ancilla_flip_is_measurement_error -- --nocapture
        // q = 1 flips every ancilla right after its reset, so every syndrome bit reads 1
        let d = 5;
        let simulator = BitFlipSimulator::new();
        let circuit = simulator.describe(d, 0., 1.).unwrap();
        let record = &simulator.sample(&circuit, 1, 0).unwrap()[0];
        let ancilla_bits = (d - 1) * (d - 1);
        assert!(record[..ancilla_bits].iter().all(|&bit| bit));
        assert!(record[ancilla_bits..].iter().all(|&bit| !bit));
        let defects = extract(record, d).unwrap();
        assert!(defects.row(0).iter().all(|&bit| bit));
        assert!(defects.row(d - 1).iter().all(|&bit| bit));
        assert_eq!(defects.count_ones(), 2 * (d - 1));
    }

    #[test]
    fn circuit_data_flip_every_round() {
        // cargo test circuit_data_flip_every_round -- --nocapture
        // p = 1 flips every data qubit d times in total: d - 1 rounds plus the final flip
        let d = 4;
        let simulator = BitFlipSimulator::new();
        let circuit = simulator.describe(d, 1., 0.).unwrap();
        let record = &simulator.sample(&circuit, 1, 0).unwrap()[0];
        let data = final_data(record, d).unwrap();
        assert!(data.iter().all(|&bit| bit == (d % 2 == 1)));
        // neighbors always agree, so no syndrome ever fires
        assert!(record[..(d - 1) * (d - 1)].iter().all(|&bit| !bit));
    }

    #[test]
    fn circuit_sampling_deterministic() {
        // cargo test circuit_sampling_deterministic -- --nocapture
        let simulator = BitFlipSimulator::new();
        let circuit = simulator.describe(5, 0.1, 0.1).unwrap();
        let first = simulator.sample(&circuit, 200, 42).unwrap();
        let second = simulator.sample(&circuit, 200, 42).unwrap();
        assert_eq!(first, second);
        let other = simulator.sample(&circuit, 200, 43).unwrap();
        assert_ne!(first, other);
        // shot k of seed s is shot k - 1 of seed s + 1
        assert_eq!(first[1..], other[..199]);
    }

    #[test]
    fn circuit_rejects_out_of_range_qubit() {
        // cargo test circuit_rejects_out_of_range_qubit -- --nocapture
        let circuit = CircuitSpec {
            qubit_num: 2,
            instructions: vec![Instruction::Reset(0), Instruction::Measure(2)],
        };
        assert!(matches!(
            BitFlipSimulator::new().sample(&circuit, 1, 0),
            Err(ThresholdError::ExternalService {
                service: ExternalService::Sampler,
                ..
            })
        ));
    }
}
