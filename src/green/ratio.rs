use geo::{Area, MultiPolygon};
use tracing::{debug, warn};

use crate::{
    error::LivabilityError,
    geom::intersection_areas,
    types::{GreenRecord, GreenSpace, Region, RegionId},
};

/// A region left out of a batch, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRegion {
    pub region_id: RegionId,
    pub name: String,
    pub error: LivabilityError,
}

/// Output of the green-ratio step: one record per usable region, plus the regions skipped.
#[derive(Debug, Clone, Default)]
pub struct GreenBatch {
    pub records: Vec<GreenRecord>,
    pub skipped: Vec<SkippedRegion>,
}

/// Compute `area_imputed`, `green_area_m2` and `green_ratio` for every region.
///
/// Both inputs must already be in the metric reference. Regions with a missing or empty
/// boundary are reported as `DataError`s and skipped; the rest of the batch is unaffected.
pub fn compute_green_ratios(regions: &[Region], green: &[GreenSpace]) -> GreenBatch {
    let mut batch = GreenBatch::default();
    let mut usable: Vec<&Region> = Vec::with_capacity(regions.len());

    for region in regions {
        if region.geometry().is_some() {
            usable.push(region);
            continue;
        }
        warn!(region_id = %region.id, name = %region.name, "[green] region has no geometry, skipping");
        batch.skipped.push(SkippedRegion {
            region_id: region.id,
            name: region.name.clone(),
            error: LivabilityError::Data(format!("region {} ({}) has no geometry", region.id, region.name)),
        });
    }

    let keyed: Vec<(RegionId, MultiPolygon<f64>)> = usable.iter()
        .filter_map(|region| region.geometry().map(|shape| (region.id, shape.clone())))
        .collect();
    let features = green.iter().map(|space| space.boundary.clone()).collect::<Vec<_>>();
    let areas = intersection_areas(&keyed, &features);
    debug!(regions = keyed.len(), features = features.len(), overlapping = areas.len(), "[green] overlay complete");

    for (region, (region_id, shape)) in usable.iter().zip(keyed.iter()) {
        let area_imputed = shape.unsigned_area();
        let green_area_m2 = areas.get(region_id).copied();
        let green_ratio = green_area_m2.filter(|_| area_imputed > 0.0).map(|green| green / area_imputed);

        batch.records.push(GreenRecord {
            region_id: *region_id,
            name: region.name.clone(),
            area_imputed,
            green_area_m2,
            green_ratio,
            population: None,
            green_area_per_capita_m2: None,
        });
    }

    batch
}

impl GreenBatch {
    /// Ids of the regions skipped in this batch.
    pub fn skipped_ids(&self) -> Vec<RegionId> {
        self.skipped.iter().map(|skip| skip.region_id).collect()
    }
}
