use geo::{CoordsIter, MultiPolygon};
use serde::{Deserialize, Serialize};

use crate::types::RegionId;

/// An administrative neighborhood. The boundary is in whatever reference the holder
/// is working in: geographic on input/output, metric inside the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub boundary: Option<MultiPolygon<f64>>,
}

impl Region {
    pub fn new(id: impl Into<RegionId>, name: impl Into<String>, boundary: Option<MultiPolygon<f64>>) -> Self {
        Self { id: id.into(), name: name.into(), boundary }
    }

    /// The boundary, if present and non-empty.
    #[inline]
    pub fn geometry(&self) -> Option<&MultiPolygon<f64>> {
        self.boundary.as_ref().filter(|shape| shape.coords_count() > 0)
    }
}

/// A green space footprint; carries no attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct GreenSpace {
    pub boundary: MultiPolygon<f64>,
}

/// One row of the population source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub region_id: RegionId,
    pub name: String,
    pub population: f64,
}
