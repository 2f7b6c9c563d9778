//! Defect Extraction
//!
//! Turns the raw measurement record of one shot into the space-time defect lattice consumed by the decoder.
//! The record holds (d - 1) rounds of (d - 1) ancilla outcomes followed by the d final data outcomes;
//! the final data outcomes are projected onto one more syndrome round so that the lattice has exactly d rows.
//!

use crate::error::*;
use crate::layout::*;
use rayon::prelude::*;

/// raw bits of one shot, in measurement order
pub type MeasurementRecord = Vec<bool>;

/// syndrome value of each ancilla at each time step, the last row projected from the data qubits
pub type SyndromeLattice = BitLattice;

/// syndrome changes in time
pub type DefectLattice = BitLattice;

fn check_record(record: &[bool], layout: &SpaceTimeLayout) -> Result<()> {
    if record.len() != layout.record_length() {
        return Err(ThresholdError::Shape {
            distance: layout.distance(),
            expected: layout.record_length(),
            actual: record.len(),
            shot: None,
        });
    }
    Ok(())
}

/// the final d bits of a record, i.e. the data qubit outcomes
pub fn final_data(record: &[bool], d: usize) -> Result<&[bool]> {
    let layout = SpaceTimeLayout::new(d)?;
    check_record(record, &layout)?;
    Ok(&record[record.len() - d..])
}

pub fn syndrome_lattice(record: &[bool], d: usize) -> Result<SyndromeLattice> {
    let layout = SpaceTimeLayout::new(d)?;
    check_record(record, &layout)?;
    let ancillas = layout.ancillas();
    let (ancilla_block, data_block) = record.split_at(ancillas * ancillas);
    let mut syndrome = SyndromeLattice::zeros(layout);
    for t in 0..ancillas {
        for i in 0..ancillas {
            syndrome.set(t, i, ancilla_block[t * ancillas + i]);
        }
    }
    let projected = layout.rounds() - 1;
    for i in 0..ancillas {
        syndrome.set(projected, i, data_block[i] ^ data_block[i + 1]);
    }
    Ok(syndrome)
}

pub fn extract(record: &[bool], d: usize) -> Result<DefectLattice> {
    let syndrome = syndrome_lattice(record, d)?;
    let layout = *syndrome.layout();
    let mut defects = DefectLattice::zeros(layout);
    for i in 0..layout.ancillas() {
        defects.set(0, i, syndrome.get(0, i));
    }
    for t in 1..layout.rounds() {
        for i in 0..layout.ancillas() {
            defects.set(t, i, syndrome.get(t, i) ^ syndrome.get(t - 1, i));
        }
    }
    Ok(defects)
}

/// extract every shot of a batch in parallel, keeping shot order
pub fn extract_batch(records: &[MeasurementRecord], d: usize) -> Result<Vec<DefectLattice>> {
    records
        .par_iter()
        .enumerate()
        .map(|(shot, record)| {
            extract(record, d).map_err(|error| match error {
                ThresholdError::Shape {
                    distance,
                    expected,
                    actual,
                    ..
                } => ThresholdError::Shape {
                    distance,
                    expected,
                    actual,
                    shot: Some(shot),
                },
                other => other,
            })
        })
        .collect()
}
