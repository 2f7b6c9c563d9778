//! Minimum-Weight Perfect Matching
//!
//! The matching oracle consumed by the threshold sweep and its implementation on top of the
//! fusion-blossom serial solver. A decoded shot is reported as a logical correction: one bit per
//! fault id, toggled by every matched edge that carries that fault id.
//!

use crate::decoding_graph::*;
use crate::defects::DefectLattice;
use crate::error::*;
use derivative::Derivative;
use fusion_blossom::mwpm_solver::{PrimalDualSolver, SolverSerial};
use fusion_blossom::util::{SolverInitializer, SyndromePattern, VertexIndex, VertexNum, Weight};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// one bit per fault id 0..d
pub type LogicalCorrection = Vec<bool>;

pub trait MatchingOracle: Sync {
    /// one correction per defect lattice, in the same order; an empty batch yields no corrections
    fn decode_batch(&self, graph: &DecodingGraph, defects: &[DefectLattice]) -> Result<Vec<LogicalCorrection>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlossomConfig {
    /// integer half weight given to the heaviest edge
    #[serde(default = "blossom_default_configs::max_half_weight")]
    pub max_half_weight: usize,
    /// decode shots on the rayon thread pool, one solver per worker
    #[serde(default = "blossom_default_configs::parallel")]
    pub parallel: bool,
}

pub mod blossom_default_configs {
    pub fn max_half_weight() -> usize {
        500
    }
    pub fn parallel() -> bool {
        true
    }
}

impl Default for BlossomConfig {
    fn default() -> Self {
        Self {
            max_half_weight: blossom_default_configs::max_half_weight(),
            parallel: blossom_default_configs::parallel(),
        }
    }
}

/// the decoding graph in the form the solver takes, with the fault id of each solver edge
#[derive(Derivative)]
#[derivative(Debug)]
pub struct BlossomGraph {
    #[derivative(Debug = "ignore")]
    pub initializer: SolverInitializer,
    pub fault_ids: Vec<Option<usize>>,
    pub node_count: usize,
    pub distance: usize,
}

impl BlossomGraph {
    #[allow(clippy::unnecessary_cast)]
    pub fn new(graph: &DecodingGraph, max_half_weight: usize) -> Self {
        let node_count = graph.node_count();
        let left_boundary = node_count;
        let right_boundary = node_count + 1;
        let half_weights = graph.half_weights(max_half_weight);
        let weighted_edges = graph
            .edges
            .iter()
            .zip(half_weights)
            .map(|(edge, half_weight)| {
                let (a, b) = edge.vertices;
                let b = match b {
                    EdgeEndpoint::Node(node) => node,
                    EdgeEndpoint::Boundary(BoundarySide::Left) => left_boundary,
                    EdgeEndpoint::Boundary(BoundarySide::Right) => right_boundary,
                };
                // the solver requires even weights
                (a as VertexIndex, b as VertexIndex, (2 * half_weight) as Weight)
            })
            .collect();
        let initializer = SolverInitializer::new(
            (node_count + 2) as VertexNum,
            weighted_edges,
            vec![left_boundary as VertexIndex, right_boundary as VertexIndex],
        );
        Self {
            initializer,
            fault_ids: graph.edges.iter().map(|edge| edge.fault_id).collect(),
            node_count,
            distance: graph.distance(),
        }
    }

    fn check(&self, defects: &DefectLattice) -> Result<()> {
        if defects.as_slice().len() != self.node_count {
            return Err(ThresholdError::external(
                ExternalService::MatchingOracle,
                format!(
                    "defect vector of length {} does not fit a graph of {} vertices",
                    defects.as_slice().len(),
                    self.node_count
                ),
            ));
        }
        Ok(())
    }

    #[allow(clippy::unnecessary_cast)]
    pub fn decode(&self, solver: &mut SolverSerial, defects: &DefectLattice) -> LogicalCorrection {
        let defect_vertices: Vec<VertexIndex> = defects.ones().map(|index| index as VertexIndex).collect();
        let mut correction = vec![false; self.distance];
        if defect_vertices.is_empty() {
            return correction;
        }
        solver.solve(&SyndromePattern::new_vertices(defect_vertices));
        for edge_index in solver.subgraph() {
            if let Some(fault_id) = self.fault_ids[edge_index as usize] {
                correction[fault_id] = !correction[fault_id];
            }
        }
        solver.clear();
        correction
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlossomMatcher {
    pub config: BlossomConfig,
}

impl BlossomMatcher {
    pub fn new(config: BlossomConfig) -> Self {
        Self { config }
    }
}

impl MatchingOracle for BlossomMatcher {
    fn decode_batch(&self, graph: &DecodingGraph, defects: &[DefectLattice]) -> Result<Vec<LogicalCorrection>> {
        let blossom_graph = BlossomGraph::new(graph, self.config.max_half_weight);
        for lattice in defects.iter() {
            blossom_graph.check(lattice)?;
        }
        let initializer = &blossom_graph.initializer;
        if self.config.parallel {
            Ok(defects
                .par_iter()
                .map_init(
                    || SolverSerial::new(initializer),
                    |solver, lattice| blossom_graph.decode(solver, lattice),
                )
                .collect())
        } else {
            let mut solver = SolverSerial::new(initializer);
            Ok(defects
                .iter()
                .map(|lattice| blossom_graph.decode(&mut solver, lattice))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::*;

    fn defects_at(d: usize, positions: &[(usize, usize)]) -> DefectLattice {
        let mut defects = DefectLattice::zeros(SpaceTimeLayout::new(d).unwrap());
        for &(t, i) in positions {
            defects.set(t, i, true);
        }
        defects
    }

    fn matchers() -> Vec<BlossomMatcher> {
        vec![
            BlossomMatcher::default(),
            BlossomMatcher::new(BlossomConfig {
                max_half_weight: 500,
                parallel: false,
            }),
        ]
    }

    #[test]
    fn mwpm_solver_no_defects() {
        // cargo test mwpm_solver_no_defects -- --nocapture
        let graph = DecodingGraph::build(5, 0.1, 0.1).unwrap();
        for matcher in matchers() {
            let corrections = matcher.decode_batch(&graph, &[defects_at(5, &[])]).unwrap();
            assert_eq!(corrections, vec![vec![false; 5]]);
            assert!(matcher.decode_batch(&graph, &[]).unwrap().is_empty());
        }
    }

    #[test]
    fn mwpm_solver_single_data_error() {
        // cargo test mwpm_solver_single_data_error -- --nocapture
        let d = 5;
        let graph = DecodingGraph::build(d, 0.1, 0.1).unwrap();
        for matcher in matchers() {
            // interior data qubit 2 flipped before the first round
            let corrections = matcher
                .decode_batch(&graph, &[defects_at(d, &[(0, 1), (0, 2)])])
                .unwrap();
            assert_eq!(corrections[0], vec![false, false, true, false, false]);
            // left-most and right-most data qubits are matched to the boundaries
            let corrections = matcher
                .decode_batch(&graph, &[defects_at(d, &[(2, 0)]), defects_at(d, &[(3, 3)])])
                .unwrap();
            assert_eq!(corrections[0], vec![true, false, false, false, false]);
            assert_eq!(corrections[1], vec![false, false, false, false, true]);
        }
    }

    #[test]
    fn mwpm_solver_measurement_error_no_correction() {
        // cargo test mwpm_solver_measurement_error_no_correction -- --nocapture
        let d = 5;
        let graph = DecodingGraph::build(d, 0.1, 0.1).unwrap();
        for matcher in matchers() {
            let corrections = matcher
                .decode_batch(&graph, &[defects_at(d, &[(1, 2), (2, 2)])])
                .unwrap();
            assert_eq!(corrections[0], vec![false; d]);
        }
    }

    #[test]
    fn mwpm_solver_batch_order() {
        // cargo test mwpm_solver_batch_order -- --nocapture
        let d = 7;
        let graph = DecodingGraph::build(d, 0.05, 0.05).unwrap();
        let batch: Vec<DefectLattice> = (0..64).map(|shot| defects_at(d, &[(shot % d, 2), (shot % d, 3)])).collect();
        for matcher in matchers() {
            let corrections = matcher.decode_batch(&graph, &batch).unwrap();
            assert_eq!(corrections.len(), 64);
            for correction in corrections.iter() {
                assert_eq!(correction.iter().filter(|&&bit| bit).count(), 1);
                assert!(correction[3]);
            }
        }
    }

    #[test]
    fn mwpm_solver_rejects_mismatched_defects() {
        // cargo test mwpm_solver_rejects_mismatched_defects -- --nocapture
        let graph = DecodingGraph::build(5, 0.1, 0.1).unwrap();
        let result = BlossomMatcher::default().decode_batch(&graph, &[defects_at(3, &[(0, 0)])]);
        assert!(matches!(
            result,
            Err(ThresholdError::ExternalService {
                service: ExternalService::MatchingOracle,
                ..
            })
        ));
    }

    #[test]
    fn mwpm_solver_blossom_graph_vertices() {
        // cargo test mwpm_solver_blossom_graph_vertices -- --nocapture
        let graph = DecodingGraph::build(3, 0.1, 0.2).unwrap();
        let blossom_graph = BlossomGraph::new(&graph, 500);
        assert_eq!(blossom_graph.initializer.vertex_num as usize, 6 + 2);
        assert_eq!(blossom_graph.initializer.weighted_edges.len(), graph.edges.len());
        assert_eq!(blossom_graph.initializer.virtual_vertices.len(), 2);
        for (_, _, weight) in blossom_graph.initializer.weighted_edges.iter() {
            assert!(*weight > 0 && *weight % 2 == 0);
        }
        println!("{blossom_graph:?}");
    }
}
