use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use anyhow::Context;
use geo::Validation;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    config::CompositeWeights,
    error::{LivabilityError, Result},
    geom::PointResolver,
    index::merge_composite,
    io,
    types::{AccessRecord, CompositeRecord, GreenRecord, Region, RegionId, RegionReport},
};

/// Immutable result set of one batch run, served to readers.
///
/// Region boundaries are geographic. Built once, then only read; a newer run produces a new
/// snapshot which replaces this one through a [`SnapshotStore`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    regions: Vec<Region>,
    resolver: PointResolver,
    by_id: BTreeMap<RegionId, usize>,
    green: Vec<GreenRecord>,
    access: BTreeMap<RegionId, AccessRecord>,
}

impl Snapshot {
    pub fn new(regions: Vec<Region>, green: Vec<GreenRecord>, access: Vec<AccessRecord>) -> Self {
        let mut by_id = BTreeMap::new();
        for (i, region) in regions.iter().enumerate() {
            by_id.entry(region.id).or_insert(i);
        }

        Self {
            resolver: PointResolver::new(&regions),
            regions,
            by_id,
            green,
            access: access.into_iter().map(|record| (record.region_id, record)).collect(),
        }
    }

    /// Load a snapshot from the green and access outputs of a batch run.
    /// Boundaries come from the green file, falling back to the access file for regions it lacks.
    pub fn from_files(green_path: &Path, access_path: &Path) -> anyhow::Result<Self> {
        let (mut regions, green) = io::read_records::<GreenRecord>(green_path)
            .context("[index::snapshot] Failed to load green records")?;
        let (access_regions, access) = io::read_records::<AccessRecord>(access_path)
            .context("[index::snapshot] Failed to load access records")?;

        for region in access_regions {
            match regions.iter_mut().find(|known| known.id == region.id) {
                Some(known) if known.geometry().is_none() => known.boundary = region.boundary,
                Some(_) => {}
                None => regions.push(region),
            }
        }

        info!(regions = regions.len(), green = green.len(), access = access.len(), "[index::snapshot] loaded snapshot");
        Ok(Self::new(regions, green, access))
    }

    #[inline] pub fn len(&self) -> usize { self.regions.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    #[inline] pub fn regions(&self) -> &[Region] { &self.regions }

    /// Full record of one region.
    pub fn region(&self, id: RegionId) -> Result<RegionReport> {
        let &idx = self.by_id.get(&id)
            .ok_or_else(|| LivabilityError::NotFound(format!("region {id}")))?;
        let region = &self.regions[idx];

        Ok(RegionReport {
            region_id: id,
            name: region.name.clone(),
            green: self.green.iter().find(|record| record.region_id == id).cloned(),
            access: self.access.get(&id).cloned(),
        })
    }

    /// Full record of the region containing `(lon, lat)`.
    pub fn region_at(&self, lon: f64, lat: f64) -> Result<RegionReport> {
        let idx = self.resolver.resolve_index(lon, lat)
            .ok_or_else(|| LivabilityError::NotFound(format!("no region contains ({lon}, {lat})")))?;
        debug!(lon, lat, region_id = %self.regions[idx].id, "[index::snapshot] resolved point");
        self.region(self.regions[idx].id)
    }

    /// Composite index of every region with both green and access records.
    pub fn composite(&self, weights: CompositeWeights) -> Vec<CompositeRecord> {
        let access = self.access.values().cloned().collect::<Vec<_>>();
        merge_composite(&self.green, &access, weights)
    }

    /// Composite index as a FeatureCollection; regions with a null or invalid boundary are left out.
    pub fn composite_features(&self, weights: CompositeWeights) -> anyhow::Result<Value> {
        let mut features = Vec::new();
        for record in self.composite(weights) {
            let boundary = self.by_id.get(&record.region_id)
                .and_then(|&idx| self.regions[idx].geometry())
                .filter(|shape| shape.is_valid());
            let Some(boundary) = boundary else {
                debug!(region_id = %record.region_id, "[index::snapshot] no valid boundary, leaving out of the collection");
                continue;
            };

            let properties = json!({ "region_id": record.region_id, "name": record.name, "icvu": record.icvu });
            features.push(io::feature(properties, Some(boundary))?);
        }

        Ok(io::feature_collection(features))
    }
}

/// Holder of the snapshot currently being served.
///
/// Readers clone the inner `Arc` and keep working on it even after a newer snapshot is swapped in.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)) }
    }

    /// The snapshot being served right now.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the served snapshot, returning the previous one.
    pub fn swap(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    use crate::types::AccessState;

    fn cell(id: i64, x: f64) -> Region {
        Region::new(RegionId(id), format!("cell {id}"), Some(MultiPolygon(vec![polygon![
            (x: x, y: 39.46), (x: x + 0.01, y: 39.46), (x: x + 0.01, y: 39.47), (x: x, y: 39.47),
        ]])))
    }

    fn bowtie(id: i64) -> Region {
        Region::new(RegionId(id), "bowtie", Some(MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0),
        ]])))
    }

    fn green(id: i64, ratio: f64) -> GreenRecord {
        GreenRecord {
            region_id: RegionId(id),
            name: format!("cell {id}"),
            area_imputed: 100.0,
            green_area_m2: Some(100.0 * ratio),
            green_ratio: Some(ratio),
            population: Some(10.0),
            green_area_per_capita_m2: Some(10.0 * ratio),
        }
    }

    fn access(id: i64, pct: f64) -> AccessRecord {
        AccessRecord { accessibility_percentage: Some(pct), num_stops: Some(1), ..AccessRecord::empty(RegionId(id), format!("cell {id}"), AccessState::Scored) }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![cell(1, -0.40), cell(2, -0.39), Region::new(RegionId(3), "void", None), bowtie(4)],
            vec![green(1, 0.1), green(2, 0.2), green(3, 0.3), green(4, 0.4)],
            vec![access(1, 50.0), access(2, 100.0), access(3, 10.0), access(4, 20.0)],
        )
    }

    #[test]
    fn region_by_id_carries_both_record_sets() {
        let report = snapshot().region(RegionId(2)).unwrap();
        assert_eq!(report.name, "cell 2");
        assert_eq!(report.green.unwrap().green_ratio, Some(0.2));
        assert_eq!(report.access.unwrap().accessibility_percentage, Some(100.0));
    }

    #[test]
    fn unknown_id_is_not_found() {
        assert!(matches!(snapshot().region(RegionId(99)), Err(LivabilityError::NotFound(_))));
    }

    #[test]
    fn region_at_resolves_the_containing_region() {
        let snapshot = snapshot();
        assert_eq!(snapshot.region_at(-0.385, 39.465).unwrap().region_id, RegionId(2));
        assert!(matches!(snapshot.region_at(-30.0, 35.0), Err(LivabilityError::NotFound(_))));
    }

    #[test]
    fn composite_features_skip_missing_and_invalid_boundaries() {
        let collection = snapshot().composite_features(CompositeWeights::new(1.0, 0.0)).unwrap();
        let features = collection["features"].as_array().unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["region_id"], 1);
        assert_eq!(features[1]["properties"]["icvu"], 0.2);
        assert_eq!(features[1]["geometry"]["type"], "MultiPolygon");
        assert_eq!(collection["crs"]["properties"]["name"], "EPSG:4326");
    }

    #[test]
    fn composite_covers_every_joined_region() {
        assert_eq!(snapshot().composite(CompositeWeights::default()).len(), 4);
    }

    #[test]
    fn swapped_store_keeps_old_snapshot_alive_for_readers() {
        let store = SnapshotStore::new(snapshot());
        let before = store.load();

        let old = store.swap(Snapshot::new(vec![cell(7, 0.0)], vec![], vec![]));
        assert!(Arc::ptr_eq(&before, &old));
        assert_eq!(before.len(), 4);
        assert_eq!(store.load().len(), 1);
        assert!(store.load().region(RegionId(7)).is_ok());
    }
}
