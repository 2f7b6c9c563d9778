//! Decoding Graph
//!
//! The weighted matching graph of the repetition code with d - 1 noisy syndrome rounds.
//! Vertices are the (t, i) positions of the defect lattice plus a left and a right boundary vertex.
//! Edges carry the probability of the physical error they model and, when that error flips a data
//! qubit, the fault id of the data qubit, which is the bit of the logical correction the edge toggles.
//!

use crate::error::*;
use crate::layout::*;
use serde::Serialize;

/// probabilities are clamped into this range before computing weights
pub const MIN_PROBABILITY: f64 = 1e-10;
pub const MAX_PROBABILITY: f64 = 0.5;

/// weight of an edge given its error probability; see [`MIN_PROBABILITY`] and [`MAX_PROBABILITY`].
/// p = 0 gives a heavy but finite edge; p > 0.5 would give a negative weight and is clamped to 0
pub fn weight_of_p(p: f64) -> f64 {
    let p = p.clamp(MIN_PROBABILITY, MAX_PROBABILITY);
    ((1. - p) / p).ln()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoundarySide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeEndpoint {
    Node(usize),
    Boundary(BoundarySide),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeKind {
    /// data qubit flip between two neighboring ancillas
    SpaceLike,
    /// ancilla measurement error between two consecutive rounds
    TimeLike,
    /// data qubit flip at an open end of the chain
    Boundary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodingEdge {
    pub kind: EdgeKind,
    pub vertices: (usize, EdgeEndpoint),
    pub probability: f64,
    /// the logical correction bit toggled when the edge is matched; time-like edges never toggle one
    pub fault_id: Option<usize>,
}

impl DecodingEdge {
    /// fault ids as a set: empty or a single id
    pub fn fault_ids(&self) -> impl Iterator<Item = usize> {
        self.fault_id.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodingGraph {
    pub layout: SpaceTimeLayout,
    pub p: f64,
    pub q: f64,
    pub edges: Vec<DecodingEdge>,
}

impl DecodingGraph {
    /// p is the data qubit flip probability, q the ancilla measurement flip probability
    pub fn build(d: usize, p: f64, q: f64) -> Result<Self> {
        let layout = SpaceTimeLayout::new(d)?;
        check_probability("data error probability p", p)?;
        check_probability("ancilla error probability q", q)?;
        let ancillas = layout.ancillas();
        let mut edges = Vec::with_capacity(Self::expected_edge_count(d));
        for t in 0..layout.rounds() {
            for i in 1..ancillas {
                edges.push(DecodingEdge {
                    kind: EdgeKind::SpaceLike,
                    vertices: (layout.index(t, i - 1), EdgeEndpoint::Node(layout.index(t, i))),
                    probability: p,
                    fault_id: Some(i),
                });
            }
            edges.push(DecodingEdge {
                kind: EdgeKind::Boundary,
                vertices: (layout.index(t, 0), EdgeEndpoint::Boundary(BoundarySide::Left)),
                probability: p,
                fault_id: Some(0),
            });
            edges.push(DecodingEdge {
                kind: EdgeKind::Boundary,
                vertices: (
                    layout.index(t, ancillas - 1),
                    EdgeEndpoint::Boundary(BoundarySide::Right),
                ),
                probability: p,
                fault_id: Some(d - 1),
            });
        }
        for t in 1..layout.rounds() {
            for i in 0..ancillas {
                edges.push(DecodingEdge {
                    kind: EdgeKind::TimeLike,
                    vertices: (layout.index(t - 1, i), EdgeEndpoint::Node(layout.index(t, i))),
                    probability: q,
                    fault_id: None,
                });
            }
        }
        debug_assert_eq!(edges.len(), Self::expected_edge_count(d));
        log::debug!("decoding graph d = {d}, p = {p}, q = {q}: {} edges", edges.len());
        Ok(Self { layout, p, q, edges })
    }

    /// (d - 2) space-like and 2 boundary edges per round, d - 1 time-like edges per round transition
    pub fn expected_edge_count(d: usize) -> usize {
        (d - 2) * d + 2 * d + (d - 1) * (d - 1)
    }

    pub fn distance(&self) -> usize {
        self.layout.distance()
    }

    /// number of non-boundary vertices, the length of a flattened defect vector
    pub fn node_count(&self) -> usize {
        self.layout.node_count()
    }

    pub fn count_kind(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|edge| edge.kind == kind).count()
    }

    pub fn boundary_edges_of(&self, node: usize) -> impl Iterator<Item = &DecodingEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.kind == EdgeKind::Boundary && edge.vertices.0 == node)
    }

    /// integer half weights for a matching solver that requires non-negative integers;
    /// scaled so that the heaviest edge gets `max_half_weight` and no edge gets less than 1
    pub fn half_weights(&self, max_half_weight: usize) -> Vec<usize> {
        let weights: Vec<f64> = self.edges.iter().map(|edge| weight_of_p(edge.probability)).collect();
        let max_weight = weights.iter().cloned().fold(0., f64::max);
        weights
            .into_iter()
            .map(|weight| {
                if max_weight <= 0. {
                    return 1;
                }
                let half_weight = ((max_half_weight as f64) * weight / max_weight).round() as usize;
                std::cmp::max(half_weight, 1)
            })
            .collect()
    }
}
