//! Batch runs: green indicators and transit accessibility, each from geographic inputs to one
//! record per region plus a [`BatchReport`].

use std::collections::BTreeSet;

use geo::Rect;
use tracing::{info, warn};

use crate::{
    access::AccessibilityScorer,
    config::LivabilityConfig,
    error::{LivabilityError, Result},
    geom::{Geometries, GeometryProjector},
    green::{apply_per_capita, compute_green_ratios, join_population, SkippedRegion},
    types::{AccessRecord, AccessState, GreenRecord, GreenSpace, PopulationRecord, Region, RegionId, TransitStop},
    walk::WalkNetworkProvider,
};

/// Outcome counts of one batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub total: usize,
    pub scored: usize,
    pub scored_no_stops: usize,
    pub skipped: Vec<SkippedRegion>,
    /// Population rows dropped because their region was skipped.
    pub withdrawn_population: Vec<RegionId>,
}

impl BatchReport {
    fn from_access(records: &[AccessRecord]) -> Self {
        let mut report = Self { total: records.len(), ..Self::default() };
        for record in records {
            match &record.state {
                AccessState::Scored => report.scored += 1,
                AccessState::ScoredNoStops => report.scored_no_stops += 1,
                AccessState::SkippedNoGeometry => report.skipped.push(SkippedRegion {
                    region_id: record.region_id,
                    name: record.name.clone(),
                    error: LivabilityError::Data(format!("region {} has no geometry", record.region_id)),
                }),
                AccessState::SkippedNoGraph(reason) => report.skipped.push(SkippedRegion {
                    region_id: record.region_id,
                    name: record.name.clone(),
                    error: LivabilityError::GraphUnavailable { region_id: record.region_id, reason: reason.clone() },
                }),
            }
        }
        report
    }

    fn log(&self, batch: &str) {
        info!(
            batch,
            total = self.total,
            scored = self.scored,
            scored_no_stops = self.scored_no_stops,
            skipped = self.skipped.len(),
            withdrawn_population = self.withdrawn_population.len(),
            "[pipeline] batch finished"
        );
    }
}

/// Lon/lat extent of every region boundary.
pub fn regions_bounds(regions: &[Region]) -> Option<Rect<f64>> {
    Geometries::new(regions.iter().filter_map(|region| region.geometry().cloned()).collect()).bounds()
}

/// The projector configured by `metric_crs`, with "auto" resolved against the region extent.
pub fn projector_for(config: &LivabilityConfig, regions: &[Region]) -> Result<GeometryProjector> {
    GeometryProjector::from_config(&config.metric_crs, regions_bounds(regions))
}

/// Reproject region boundaries; a boundary that fails to project is dropped with a warning.
fn regions_to_metric(projector: &GeometryProjector, regions: &[Region]) -> Vec<Region> {
    regions.iter()
        .map(|region| {
            let boundary = region.geometry().and_then(|shape| match projector.to_metric(shape) {
                Ok(shape) => Some(shape),
                Err(e) => {
                    warn!(region_id = %region.id, "[pipeline] {e}");
                    None
                }
            });
            Region::new(region.id, region.name.clone(), boundary)
        })
        .collect()
}

/// Region ids must be unique; overlay areas and joins are keyed by them.
fn ensure_unique_ids(regions: &[Region]) -> Result<()> {
    let mut seen = BTreeSet::new();
    let duplicates = regions.iter()
        .filter(|region| !seen.insert(region.id))
        .map(|region| region.id)
        .collect::<BTreeSet<_>>();

    if duplicates.is_empty() {
        return Ok(());
    }
    Err(LivabilityError::Data(format!("duplicate region ids: {:?}", duplicates.iter().map(|id| id.get()).collect::<Vec<_>>())))
}

/// Green ratio, population join and per-capita green area for every region.
///
/// Only duplicate region ids or a population/region key mismatch fail the batch. Regions skipped for bad geometry have
/// their population row withdrawn before the strict join; the withdrawal is listed in the report.
pub fn run_green_pipeline(
    regions: &[Region],
    green: &[GreenSpace],
    mut population: Vec<PopulationRecord>,
    projector: &GeometryProjector,
) -> Result<(Vec<GreenRecord>, BatchReport)> {
    ensure_unique_ids(regions)?;
    let metric_regions = regions_to_metric(projector, regions);
    let metric_green = green.iter()
        .filter_map(|space| match projector.to_metric(&space.boundary) {
            Ok(boundary) => Some(GreenSpace { boundary }),
            Err(e) => {
                warn!("[pipeline] dropping green space: {e}");
                None
            }
        })
        .collect::<Vec<_>>();

    let batch = compute_green_ratios(&metric_regions, &metric_green);

    let skipped = batch.skipped_ids().into_iter().collect::<BTreeSet<_>>();
    let mut withdrawn = Vec::new();
    population.retain(|row| {
        let keep = !skipped.contains(&row.region_id);
        if !keep {
            warn!(region_id = %row.region_id, name = %row.name, "[pipeline] withdrawing population row of skipped region");
            withdrawn.push(row.region_id);
        }
        keep
    });

    let records = apply_per_capita(join_population(batch.records, &population)?);

    let report = BatchReport {
        total: regions.len(),
        scored: records.len(),
        scored_no_stops: 0,
        skipped: batch.skipped,
        withdrawn_population: withdrawn,
    };
    report.log("green");
    Ok((records, report))
}

/// Transit accessibility for every region, one record per input region in input order.
///
/// `provider` answers in the metric reference of `projector`. Duplicate region ids fail the batch.
pub fn run_access_pipeline<P>(
    regions: &[Region],
    stops: &[TransitStop],
    provider: &P,
    projector: &GeometryProjector,
    config: &LivabilityConfig,
) -> Result<(Vec<AccessRecord>, BatchReport)>
where P: WalkNetworkProvider + ?Sized
{
    ensure_unique_ids(regions)?;
    let metric_regions = regions_to_metric(projector, regions);
    let metric_stops = stops.iter()
        .filter_map(|stop| match projector.to_metric(&stop.location) {
            Ok(location) => Some(TransitStop { location, ..stop.clone() }),
            Err(e) => {
                warn!(stop_id = %stop.stop_id, "[pipeline] dropping stop: {e}");
                None
            }
        })
        .collect::<Vec<_>>();

    let scorer = AccessibilityScorer::new(&metric_stops, &config.access);
    let records = scorer.score_all(&metric_regions, provider, config.access.parallel);

    let report = BatchReport::from_access(&records);
    report.log("access");
    Ok((records, report))
}
