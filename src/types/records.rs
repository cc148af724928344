use serde::{Deserialize, Serialize};

use crate::types::{RegionId, RouteType};

/// A per-region output row.
pub trait Keyed {
    fn region_id(&self) -> RegionId;
    fn name(&self) -> &str;
}

macro_rules! impl_keyed {
    ($($ty:ty),*) => {$(
        impl Keyed for $ty {
            #[inline] fn region_id(&self) -> RegionId { self.region_id }
            #[inline] fn name(&self) -> &str { &self.name }
        }
    )*};
}

impl_keyed!(GreenRecord, AccessRecord, CompositeRecord, RegionReport);

/// Green-space indicators of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenRecord {
    pub region_id: RegionId,
    pub name: String,
    pub area_imputed: f64,
    pub green_area_m2: Option<f64>,
    pub green_ratio: Option<f64>,
    pub population: Option<f64>,
    pub green_area_per_capita_m2: Option<f64>,
}

/// Terminal state of the accessibility computation for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum AccessState {
    Scored,
    ScoredNoStops,
    SkippedNoGeometry,
    SkippedNoGraph(String),
}

/// Transit accessibility indicators of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub region_id: RegionId,
    pub name: String,
    pub centroid_distance: Option<f64>,
    pub centroid_estimated_time: Option<f64>,
    pub centroid_route_type: Option<RouteType>,
    /// Id of the stop behind `centroid_distance`.
    pub centroid_stop_id: Option<String>,
    pub num_stops: Option<usize>,
    pub accessibility_percentage: Option<f64>,
    pub state: AccessState,
}

impl AccessRecord {
    /// A record with every indicator unset.
    pub fn empty(region_id: RegionId, name: impl Into<String>, state: AccessState) -> Self {
        Self {
            region_id,
            name: name.into(),
            centroid_distance: None,
            centroid_estimated_time: None,
            centroid_route_type: None,
            centroid_stop_id: None,
            num_stops: None,
            accessibility_percentage: None,
            state,
        }
    }
}

/// Composite livability index of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRecord {
    pub region_id: RegionId,
    pub name: String,
    pub icvu: f64,
}

/// Everything known about one region, as served to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionReport {
    pub region_id: RegionId,
    pub name: String,
    pub green: Option<GreenRecord>,
    pub access: Option<AccessRecord>,
}
