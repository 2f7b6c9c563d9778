//! Space-Time Layout
//!
//! The single place that knows how a (time, ancilla) coordinate maps to a flat index.
//! Both the defect extractor and the decoding graph builder go through [`SpaceTimeLayout::index`],
//! so a defect vector and the vertices of the decoding graph always agree.
//!

use crate::error::*;
use serde::Serialize;

/// shape of the space-time lattice of a distance-d repetition code with d rounds of syndrome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SpaceTimeLayout {
    d: usize,
}

impl SpaceTimeLayout {
    /// d = 1 has no ancilla and is rejected
    pub fn new(d: usize) -> Result<Self> {
        if d < 2 {
            return Err(ThresholdError::Configuration(format!(
                "code distance must be at least 2, got {d}"
            )));
        }
        Ok(Self { d })
    }

    pub fn distance(&self) -> usize {
        self.d
    }

    /// number of time steps: d - 1 measured rounds plus the projected round
    pub fn rounds(&self) -> usize {
        self.d
    }

    pub fn ancillas(&self) -> usize {
        self.d - 1
    }

    pub fn node_count(&self) -> usize {
        self.rounds() * self.ancillas()
    }

    /// (d - 1) rounds of (d - 1) ancilla bits followed by d data bits
    pub fn record_length(&self) -> usize {
        self.ancillas() * self.ancillas() + self.d
    }

    /// row-major over (t, i)
    #[inline]
    pub fn index(&self, t: usize, i: usize) -> usize {
        assert!(t < self.rounds(), "time step {t} out of range for d = {}", self.d);
        assert!(i < self.ancillas(), "ancilla {i} out of range for d = {}", self.d);
        self.ancillas() * t + i
    }

    /// inverse of [`Self::index`]
    pub fn position(&self, index: usize) -> (usize, usize) {
        assert!(index < self.node_count(), "index {index} out of range for d = {}", self.d);
        (index / self.ancillas(), index % self.ancillas())
    }
}

/// an owned rounds x ancillas bit buffer laid out by a [`SpaceTimeLayout`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitLattice {
    layout: SpaceTimeLayout,
    bits: Vec<bool>,
}

impl BitLattice {
    pub fn zeros(layout: SpaceTimeLayout) -> Self {
        Self {
            layout,
            bits: vec![false; layout.node_count()],
        }
    }

    pub fn layout(&self) -> &SpaceTimeLayout {
        &self.layout
    }

    pub fn get(&self, t: usize, i: usize) -> bool {
        self.bits[self.layout.index(t, i)]
    }

    pub fn set(&mut self, t: usize, i: usize, value: bool) {
        let index = self.layout.index(t, i);
        self.bits[index] = value;
    }

    pub fn row(&self, t: usize) -> &[bool] {
        let begin = self.layout.index(t, 0);
        &self.bits[begin..begin + self.layout.ancillas()]
    }

    /// flattened in the same order as the decoding graph vertices
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&bit| bit).count()
    }

    /// flat indices of the set bits, ascending
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(index, &bit)| if bit { Some(index) } else { None })
    }
}
