#![doc = "Livability indicators: green space, transit accessibility and the composite ICVU index"]
mod access;
mod config;
mod error;
mod geom;
mod graph;
mod green;
mod index;
mod pipeline;
mod types;
mod walk;

pub mod io;

#[doc(inline)]
pub use access::AccessibilityScorer;

#[doc(inline)]
pub use config::{
    AccessConfig, CompositeWeights, InjectedPopulation, LivabilityConfig, NameRemap, SourceFields,
    SourceFixups, DEFAULT_METRIC_CRS,
};

#[doc(inline)]
pub use error::{LivabilityError, Result};

#[doc(inline)]
pub use geom::{intersection_areas, GeometryProjector, PointResolver, GEOGRAPHIC_CRS};

#[doc(inline)]
pub use graph::WeightedGraph;

#[doc(inline)]
pub use green::{
    apply_per_capita, apply_population_fixups, compute_green_ratios, join_population, per_capita,
    GreenBatch, SkippedRegion,
};

#[doc(inline)]
pub use index::{icvu, merge_composite, Snapshot, SnapshotStore};

#[doc(inline)]
pub use pipeline::{projector_for, regions_bounds, run_access_pipeline, run_green_pipeline, BatchReport};

#[doc(inline)]
pub use types::{
    AccessRecord, AccessState, CompositeRecord, GreenRecord, GreenSpace, Keyed, Network,
    PopulationRecord, Region, RegionId, RegionReport, RouteType, TransitStop,
};

#[doc(inline)]
pub use walk::{LineNetwork, WalkGraph, WalkGraphBuilder, WalkNetworkProvider};
