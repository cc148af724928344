mod graph;
mod paths;

pub use graph::WeightedGraph;
