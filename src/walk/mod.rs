mod builder;
mod network;

pub use builder::{WalkGraph, WalkGraphBuilder};
pub use network::{LineNetwork, WalkNetworkProvider};
