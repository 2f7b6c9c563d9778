pub mod circuit;
pub mod cli;
pub mod config;
pub mod decoding_graph;
pub mod defects;
pub mod error;
pub mod layout;
pub mod mwpm_solver;
pub mod stats;
pub mod threshold;
pub mod util;
