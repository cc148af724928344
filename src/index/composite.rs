use std::collections::BTreeMap;

use crate::{
    config::CompositeWeights,
    types::{AccessRecord, CompositeRecord, GreenRecord},
};

/// `alpha * green_ratio + beta * accessibility_percentage / 100`; a null component counts as 0.
#[inline]
pub fn icvu(green_ratio: Option<f64>, accessibility_percentage: Option<f64>, weights: CompositeWeights) -> f64 {
    weights.alpha * green_ratio.unwrap_or(0.0) + weights.beta * accessibility_percentage.unwrap_or(0.0) / 100.0
}

/// Inner-join green and access records by region id and compute the composite index.
/// Output follows the order of `green`; regions missing from either side are left out.
pub fn merge_composite(green: &[GreenRecord], access: &[AccessRecord], weights: CompositeWeights) -> Vec<CompositeRecord> {
    let access = access.iter().map(|record| (record.region_id, record)).collect::<BTreeMap<_, _>>();

    green.iter()
        .filter_map(|g| {
            let a = access.get(&g.region_id)?;
            Some(CompositeRecord {
                region_id: g.region_id,
                name: g.name.clone(),
                icvu: icvu(g.green_ratio, a.accessibility_percentage, weights),
            })
        })
        .collect()
}
