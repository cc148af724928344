use std::collections::BTreeSet;

use geo::{BoundingRect, Centroid, Contains, Coord, MultiPolygon};
use rayon::prelude::*;
use rstar::{primitives::GeomWithData, RTree, AABB};
use tracing::{debug, warn};

use crate::{
    config::AccessConfig,
    error::LivabilityError,
    types::{AccessRecord, AccessState, Region, RouteType, TransitStop},
    walk::{WalkGraph, WalkGraphBuilder, WalkNetworkProvider},
};

type IndexedStop = GeomWithData<[f64; 2], usize>;

/// Scores transit accessibility one region at a time against a fixed stop set.
///
/// Regions and stops must be in the metric reference. Every region gets its own walk graph,
/// which is dropped as soon as the region is scored.
#[derive(Debug)]
pub struct AccessibilityScorer<'a> {
    stops: &'a [TransitStop],
    index: RTree<IndexedStop>,
    builder: WalkGraphBuilder,
    threshold_distance: f64,
    average_walk_speed: f64,
}

/// Indicators measured on one non-empty walk graph.
#[derive(Debug, Clone, PartialEq)]
struct Measures {
    centroid_distance: Option<f64>,
    centroid_route_type: Option<RouteType>,
    centroid_stop_id: Option<String>,
    accessibility_percentage: Option<f64>,
}

impl<'a> AccessibilityScorer<'a> {
    pub fn new(stops: &'a [TransitStop], config: &AccessConfig) -> Self {
        let index = RTree::bulk_load(stops.iter().enumerate()
            .map(|(i, stop)| GeomWithData::new([stop.location.x(), stop.location.y()], i))
            .collect());

        Self {
            stops,
            index,
            builder: WalkGraphBuilder::new(config),
            threshold_distance: config.threshold_distance,
            average_walk_speed: config.average_walk_speed,
        }
    }

    /// Indices (input order) of the stops strictly inside `boundary`.
    pub fn local_stops(&self, boundary: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(rect) = boundary.bounding_rect() else { return Vec::new() };
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        let mut local = self.index.locate_in_envelope_intersecting(&envelope)
            .map(|stop| stop.data)
            .filter(|&i| boundary.contains(&self.stops[i].location))
            .collect::<Vec<_>>();
        local.sort_unstable();
        local
    }

    /// Run the per-region state machine and return the region's record.
    pub fn score<P>(&self, region: &Region, provider: &P) -> AccessRecord
    where P: WalkNetworkProvider + ?Sized
    {
        let Some(boundary) = region.geometry() else {
            warn!(region_id = %region.id, name = %region.name, "[access] region has no geometry, skipping");
            return AccessRecord::empty(region.id, &region.name, AccessState::SkippedNoGeometry);
        };

        let graph = match provider.walk_lines(boundary) {
            Ok(lines) => self.builder.build(boundary, &lines),
            Err(e) => return self.no_graph(region, format!("{e:#}")),
        };
        if graph.is_empty() {
            return self.no_graph(region, "walk network is empty inside the boundary".to_string());
        }

        let Some(centroid) = boundary.centroid() else {
            warn!(region_id = %region.id, "[access] region has no centroid, skipping");
            return AccessRecord::empty(region.id, &region.name, AccessState::SkippedNoGeometry);
        };

        let local = self.local_stops(boundary);
        let num_stops = local.len();
        debug!(region_id = %region.id, nodes = graph.node_count(), edges = graph.graph().edge_count(), num_stops, "[access] walk graph built");

        if local.is_empty() {
            return AccessRecord {
                num_stops: Some(0),
                ..AccessRecord::empty(region.id, &region.name, AccessState::ScoredNoStops)
            };
        }

        let measures = self.measure(&graph, centroid.0, &local);
        AccessRecord {
            region_id: region.id,
            name: region.name.clone(),
            centroid_distance: measures.centroid_distance,
            centroid_estimated_time: measures.centroid_distance.map(|d| d / self.average_walk_speed),
            centroid_route_type: measures.centroid_route_type,
            centroid_stop_id: measures.centroid_stop_id,
            num_stops: Some(num_stops),
            accessibility_percentage: measures.accessibility_percentage,
            state: AccessState::Scored,
        }
    }

    /// Score every region, in input order. With `parallel`, regions are spread over the rayon pool.
    pub fn score_all<P>(&self, regions: &[Region], provider: &P, parallel: bool) -> Vec<AccessRecord>
    where P: WalkNetworkProvider + ?Sized
    {
        if parallel {
            regions.par_iter().map(|region| self.score(region, provider)).collect()
        } else {
            regions.iter().map(|region| self.score(region, provider)).collect()
        }
    }

    fn no_graph(&self, region: &Region, reason: String) -> AccessRecord {
        let err = LivabilityError::GraphUnavailable { region_id: region.id, reason: reason.clone() };
        warn!(region_id = %region.id, name = %region.name, "[access] {err}");
        AccessRecord::empty(region.id, &region.name, AccessState::SkippedNoGraph(reason))
    }

    fn measure(&self, graph: &WalkGraph, centroid: Coord<f64>, local: &[usize]) -> Measures {
        let weighted = graph.graph();
        let stop_nodes = local.iter()
            .filter_map(|&i| graph.nearest_node(self.stops[i].location.0).map(|node| (i, node)))
            .collect::<Vec<_>>();

        // Nearest stop to the centroid; first in input order wins ties.
        let mut nearest: Option<(f64, usize)> = None;
        if let Some(source) = graph.nearest_node(centroid) {
            let dist = weighted.shortest_distances(source, None);
            for &(i, node) in &stop_nodes {
                let d = dist[node];
                if !d.is_finite() {
                    debug!(stop_id = %self.stops[i].stop_id, "[access] {}", LivabilityError::NoPath { from: source, to: node });
                    continue;
                }
                if nearest.is_none_or(|(best, _)| d < best) {
                    nearest = Some((d, i));
                }
            }
        }

        let mut covered = vec![false; graph.node_count()];
        let sources = stop_nodes.iter().map(|&(_, node)| node).collect::<BTreeSet<_>>();
        for source in sources {
            let dist = weighted.shortest_distances(source, Some(self.threshold_distance));
            for (flag, d) in covered.iter_mut().zip(dist) {
                if d <= self.threshold_distance { *flag = true }
            }
        }
        let count = covered.iter().filter(|&&flag| flag).count();

        Measures {
            centroid_distance: nearest.map(|(d, _)| d),
            centroid_route_type: nearest.and_then(|(_, i)| self.stops[i].route_type),
            centroid_stop_id: nearest.map(|(_, i)| self.stops[i].stop_id.clone()),
            accessibility_percentage: (graph.node_count() > 0)
                .then(|| 100.0 * count as f64 / graph.node_count() as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use geo::{line_string, polygon, LineString, Point};

    use crate::{types::Network, walk::LineNetwork};

    fn square(size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: size, y: 0.0), (x: size, y: size), (x: 0.0, y: size)]])
    }

    fn region() -> Region {
        Region::new(7, "block", Some(square(400.0)))
    }

    // A plus sign through the centroid (200, 200), arms of 150 m, nodes every 50 m.
    fn plus() -> LineNetwork {
        let horizontal: LineString<f64> = (1..8).map(|i| (i as f64 * 50.0, 200.0)).collect();
        let vertical: LineString<f64> = (1..8).map(|i| (200.0, i as f64 * 50.0)).collect();
        LineNetwork::new(vec![horizontal, vertical])
    }

    fn stop(id: &str, x: f64, y: f64, route_type: Option<RouteType>) -> TransitStop {
        TransitStop { stop_id: id.to_string(), location: Point::new(x, y), network: Network::Bus, route_type }
    }

    fn config(threshold_distance: f64) -> AccessConfig {
        AccessConfig { threshold_distance, simplify: false, ..AccessConfig::default() }
    }

    struct Unavailable;

    impl WalkNetworkProvider for Unavailable {
        fn walk_lines(&self, _: &MultiPolygon<f64>) -> anyhow::Result<Vec<LineString<f64>>> {
            bail!("provider offline")
        }
    }

    #[test]
    fn zero_local_stops_scores_without_indicators() {
        let stops = [stop("far", 900.0, 900.0, Some(RouteType::Bus))];
        let record = AccessibilityScorer::new(&stops, &config(300.0)).score(&region(), &plus());

        assert_eq!(record.state, AccessState::ScoredNoStops);
        assert_eq!(record.num_stops, Some(0));
        assert_eq!(record.centroid_distance, None);
        assert_eq!(record.centroid_stop_id, None);
        assert_eq!(record.accessibility_percentage, None);
    }

    #[test]
    fn stop_at_the_centroid_node_is_zero_distance() {
        let stops = [stop("center", 200.0, 200.0, Some(RouteType::Subway))];
        let record = AccessibilityScorer::new(&stops, &config(300.0)).score(&region(), &plus());

        assert_eq!(record.state, AccessState::Scored);
        assert_eq!(record.centroid_distance, Some(0.0));
        assert_eq!(record.centroid_estimated_time, Some(0.0));
        assert_eq!(record.centroid_route_type, Some(RouteType::Subway));
        assert_eq!(record.accessibility_percentage, Some(100.0));
    }

    #[test]
    fn nearest_stop_sets_distance_time_mode_and_id() {
        let stops = [
            stop("east", 351.0, 201.0, Some(RouteType::Bus)),
            stop("north", 200.0, 302.0, Some(RouteType::Tram)),
        ];
        let record = AccessibilityScorer::new(&stops, &config(300.0)).score(&region(), &plus());

        assert_eq!(record.num_stops, Some(2));
        assert_eq!(record.centroid_distance, Some(100.0));
        assert_eq!(record.centroid_estimated_time, Some(100.0 / 1.5));
        assert_eq!(record.centroid_route_type, Some(RouteType::Tram));
        assert_eq!(record.centroid_stop_id.as_deref(), Some("north"));
    }

    #[test]
    fn equal_distances_keep_the_first_stop() {
        let stops = [
            stop("west", 100.0, 200.0, Some(RouteType::Bus)),
            stop("east", 300.0, 200.0, Some(RouteType::Tram)),
        ];
        let record = AccessibilityScorer::new(&stops, &config(300.0)).score(&region(), &plus());
        assert_eq!(record.centroid_route_type, Some(RouteType::Bus));
        assert_eq!(record.centroid_stop_id.as_deref(), Some("west"));
    }

    #[test]
    fn coverage_is_monotonic_in_threshold() {
        let stops = [stop("edge", 50.0, 200.0, Some(RouteType::Bus))];
        let mut last = 0.0;
        for threshold in [0.0, 50.0, 120.0, 250.0, 400.0] {
            let record = AccessibilityScorer::new(&stops, &config(threshold)).score(&region(), &plus());
            let pct = record.accessibility_percentage.unwrap();
            assert!(pct >= last, "{pct} < {last} at threshold {threshold}");
            last = pct;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        // 13 nodes; the stop at the western end reaches 50 and 100 m along the arm.
        let stops = [stop("edge", 50.0, 200.0, None)];
        let record = AccessibilityScorer::new(&stops, &config(100.0)).score(&region(), &plus());
        assert_eq!(record.accessibility_percentage, Some(100.0 * 3.0 / 13.0));
    }

    #[test]
    fn disconnected_stop_still_covers_its_component() {
        let network = LineNetwork::new(vec![
            line_string![(x: 150.0, y: 200.0), (x: 250.0, y: 200.0)],
            line_string![(x: 20.0, y: 20.0), (x: 60.0, y: 20.0)],
        ]);
        let stops = [stop("island", 20.0, 20.0, Some(RouteType::Bus))];
        let record = AccessibilityScorer::new(&stops, &config(300.0)).score(&region(), &network);

        assert_eq!(record.state, AccessState::Scored);
        assert_eq!(record.num_stops, Some(1));
        assert_eq!(record.centroid_distance, None);
        assert_eq!(record.centroid_estimated_time, None);
        assert_eq!(record.accessibility_percentage, Some(50.0));
    }

    #[test]
    fn unmapped_route_type_stays_unknown() {
        let stops = [stop("mystery", 200.0, 200.0, RouteType::from_code(7))];
        let record = AccessibilityScorer::new(&stops, &config(300.0)).score(&region(), &plus());
        assert_eq!(record.centroid_distance, Some(0.0));
        assert_eq!(record.centroid_route_type, None);
    }

    #[test]
    fn missing_geometry_is_skipped() {
        let record = AccessibilityScorer::new(&[], &config(300.0)).score(&Region::new(1, "void", None), &plus());
        assert_eq!(record.state, AccessState::SkippedNoGeometry);
        assert_eq!(record.num_stops, None);
    }

    #[test]
    fn provider_failure_and_empty_graph_are_skipped() {
        let scorer = AccessibilityScorer::new(&[], &config(300.0));

        let record = scorer.score(&region(), &Unavailable);
        assert_eq!(record.state, AccessState::SkippedNoGraph("provider offline".to_string()));

        let record = scorer.score(&region(), &LineNetwork::new(vec![]));
        assert!(matches!(record.state, AccessState::SkippedNoGraph(_)));
        assert_eq!(record.accessibility_percentage, None);
    }

    #[test]
    fn parallel_scoring_keeps_input_order() {
        let stops = [stop("center", 200.0, 200.0, Some(RouteType::Bus))];
        let regions = (0..16i64)
            .map(|i| if i % 3 == 0 { Region::new(i, "void", None) } else { Region::new(i, format!("r{i}"), Some(square(400.0))) })
            .collect::<Vec<_>>();
        let scorer = AccessibilityScorer::new(&stops, &config(300.0));

        let serial = scorer.score_all(&regions, &plus(), false);
        let parallel = scorer.score_all(&regions, &plus(), true);
        assert_eq!(serial, parallel);
        assert!(parallel.iter().zip(&regions).all(|(record, region)| record.region_id == region.id));
    }
}
