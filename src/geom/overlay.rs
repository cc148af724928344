use std::collections::BTreeMap;

use geo::{Area, BooleanOps, BoundingRect, MultiPolygon};

use crate::{geom::Geometries, types::RegionId};

/// Overlay `features` on the keyed `regions` and sum the intersection areas per region key.
///
/// Both collections must be in the metric reference. A region that no feature overlaps is
/// absent from the result, which downstream code reads as "no data" rather than zero.
/// Overlapping features are not dissolved first, so shared footprint is counted once per feature.
pub fn intersection_areas(regions: &[(RegionId, MultiPolygon<f64>)], features: &[MultiPolygon<f64>]) -> BTreeMap<RegionId, f64> {
    let geoms = Geometries::new(regions.iter().map(|(_, shape)| shape.clone()).collect());
    let mut areas = BTreeMap::new();

    for feature in features {
        let Some(rect) = feature.bounding_rect() else { continue };

        for idx in geoms.query(&rect) {
            let piece = geoms.shapes()[idx].intersection(feature);
            if piece.0.is_empty() { continue }

            *areas.entry(regions[idx].0).or_insert(0.0) += piece.unsigned_area();
        }
    }

    areas
}
