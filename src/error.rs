use thiserror::Error;

use crate::types::RegionId;

/// Failure taxonomy of the engine.
///
/// Only `SchemaMismatch` is fatal to a batch. Every other variant is recorded
/// against the smallest affected unit (a region, a stop pair) and the batch
/// carries on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LivabilityError {
    /// Missing or empty geometry, or an unusable source row.
    #[error("data error: {0}")]
    Data(String),

    /// Region and population key sets differ.
    #[error("region/population key sets differ: {only_regions:?} only in regions, {only_population:?} only in population")]
    SchemaMismatch {
        only_regions: Vec<RegionId>,
        only_population: Vec<RegionId>,
    },

    /// The walk network provider had nothing usable for a region.
    #[error("no walkable network for region {region_id}: {reason}")]
    GraphUnavailable { region_id: RegionId, reason: String },

    /// No route between two graph nodes.
    #[error("no path between nodes {from} and {to}")]
    NoPath { from: usize, to: usize },

    /// Unknown id, or a coordinate outside every region boundary.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reprojection between the geographic and metric references failed.
    #[error("projection failed: {0}")]
    Projection(String),
}

pub type Result<T> = std::result::Result<T, LivabilityError>;
