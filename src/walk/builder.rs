use std::collections::BTreeMap;

use ahash::AHashMap;
use geo::{Coord, Euclidean, Distance, Intersects, LineString, MultiPolygon, Point};
use rstar::{primitives::GeomWithData, RTree};
use smallvec::SmallVec;

use crate::{config::AccessConfig, graph::WeightedGraph};

type IndexedNode = GeomWithData<[f64; 2], usize>;

/// Pedestrian graph of one region, in the metric reference. Edge weights are lengths in meters.
#[derive(Debug, Clone)]
pub struct WalkGraph {
    coords: Vec<Coord<f64>>,
    graph: WeightedGraph,
    index: RTree<IndexedNode>,
}

impl WalkGraph {
    fn new(coords: Vec<Coord<f64>>, graph: WeightedGraph) -> Self {
        let index = RTree::bulk_load(coords.iter().enumerate()
            .map(|(i, coord)| GeomWithData::new([coord.x, coord.y], i))
            .collect());
        Self { coords, graph, index }
    }

    #[inline] pub fn node_count(&self) -> usize { self.coords.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.coords.is_empty() }

    #[inline] pub fn graph(&self) -> &WeightedGraph { &self.graph }

    /// Index of the node closest (Euclidean) to `coord`.
    #[inline]
    pub fn nearest_node(&self, coord: Coord<f64>) -> Option<usize> {
        self.index.nearest_neighbor(&[coord.x, coord.y]).map(|node| node.data)
    }
}

/// Builds a [`WalkGraph`] from raw polylines, bounded to one region polygon.
///
/// Segments are kept when both endpoints lie inside or on the boundary. An endpoint within
/// `snap_tolerance` of an existing node reuses the closest such node, parallel edges keep the
/// shortest length, and with `simplify` chains of degree-2 nodes collapse into a single edge.
#[derive(Debug, Clone)]
pub struct WalkGraphBuilder {
    snap_tolerance: f64,
    simplify: bool,
}

impl WalkGraphBuilder {
    pub fn new(config: &AccessConfig) -> Self {
        Self { snap_tolerance: config.snap_tolerance.max(1e-9), simplify: config.simplify }
    }

    #[inline]
    fn cell(&self, coord: Coord<f64>) -> (i64, i64) {
        ((coord.x / self.snap_tolerance).round() as i64, (coord.y / self.snap_tolerance).round() as i64)
    }

    /// Closest existing node within `snap_tolerance` of `coord`, looking at its cell and the 8 around it.
    fn snap(&self, cells: &AHashMap<(i64, i64), SmallVec<[u32; 2]>>, coords: &[Coord<f64>], coord: Coord<f64>) -> Option<u32> {
        let (cx, cy) = self.cell(coord);
        let mut best: Option<(f64, u32)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(nodes) = cells.get(&(cx + dx, cy + dy)) else { continue };
                for &node in nodes {
                    let d = Euclidean.distance(Point::from(coords[node as usize]), Point::from(coord));
                    if d <= self.snap_tolerance && best.is_none_or(|(b, n)| (d, node) < (b, n)) {
                        best = Some((d, node));
                    }
                }
            }
        }
        best.map(|(_, node)| node)
    }

    pub fn build(&self, boundary: &MultiPolygon<f64>, lines: &[LineString<f64>]) -> WalkGraph {
        let mut cells: AHashMap<(i64, i64), SmallVec<[u32; 2]>> = AHashMap::new();
        let mut coords: Vec<Coord<f64>> = Vec::new();
        let mut edges: BTreeMap<(u32, u32), f64> = BTreeMap::new();

        for line in lines {
            for segment in line.lines() {
                // Existing nodes are inside by construction; only new endpoints need the test.
                let within = [segment.start, segment.end].into_iter().all(|coord| {
                    self.snap(&cells, &coords, coord).is_some() || boundary.intersects(&Point::from(coord))
                });
                if !within { continue }

                let mut node_for = |coord: Coord<f64>| self.snap(&cells, &coords, coord).unwrap_or_else(|| {
                    coords.push(coord);
                    let node = (coords.len() - 1) as u32;
                    cells.entry(self.cell(coord)).or_default().push(node);
                    node
                });
                let a = node_for(segment.start);
                let b = node_for(segment.end);
                if a == b { continue }

                let length = Euclidean.distance(Point::from(segment.start), Point::from(segment.end));
                let entry = edges.entry((a.min(b), a.max(b))).or_insert(f64::INFINITY);
                *entry = entry.min(length);
            }
        }

        if self.simplify {
            let (coords, edges) = simplify(coords, &edges);
            let graph = WeightedGraph::from_edge_list(coords.len(), &edges);
            WalkGraph::new(coords, graph)
        } else {
            let list = edges.into_iter().map(|((a, b), w)| (a, b, w)).collect::<Vec<_>>();
            let graph = WeightedGraph::from_edge_list(coords.len(), &list);
            WalkGraph::new(coords, graph)
        }
    }
}

/// Contract chains of degree-2 nodes. Nodes of degree other than 2 are kept, and every
/// self-contained ring keeps one anchor node.
fn simplify(coords: Vec<Coord<f64>>, edges: &BTreeMap<(u32, u32), f64>) -> (Vec<Coord<f64>>, Vec<(u32, u32, f64)>) {
    let mut adjacency: Vec<SmallVec<[(usize, f64); 4]>> = vec![SmallVec::new(); coords.len()];
    for (&(a, b), &w) in edges {
        adjacency[a as usize].push((b as usize, w));
        adjacency[b as usize].push((a as usize, w));
    }

    let mut keep = adjacency.iter().map(|adj| adj.len() != 2).collect::<Vec<_>>();
    let mut visited = vec![false; coords.len()];
    let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();

    // Follow the chain from `start` through `first` until reaching a kept node.
    let mut walk = |start: usize, first: (usize, f64), keep: &[bool], visited: &mut [bool]| {
        let (mut prev, (mut current, mut length)) = (start, first);
        while !keep[current] {
            visited[current] = true;
            let Some(&(next, w)) = adjacency[current].iter().find(|(n, _)| *n != prev) else { break };
            length += w;
            prev = current;
            current = next;
        }
        if current != start {
            let entry = merged.entry((start.min(current), start.max(current))).or_insert(f64::INFINITY);
            *entry = entry.min(length);
        }
    };

    for node in 0..coords.len() {
        if !keep[node] { continue }
        for &first in &adjacency[node] { walk(node, first, &keep, &mut visited) }
    }

    // Rings made only of degree-2 nodes were never reached; anchor each one.
    for node in 0..coords.len() {
        if keep[node] || visited[node] { continue }
        keep[node] = true;
        visited[node] = true;
        for &first in &adjacency[node] { walk(node, first, &keep, &mut visited) }
    }

    let mut remap = vec![u32::MAX; coords.len()];
    let mut kept = Vec::new();
    for (node, coord) in coords.into_iter().enumerate() {
        if keep[node] {
            remap[node] = kept.len() as u32;
            kept.push(coord);
        }
    }

    let list = merged.into_iter()
        .map(|((a, b), w)| (remap[a], remap[b], w))
        .collect();

    (kept, list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon};

    fn square(size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: size, y: 0.0), (x: size, y: size), (x: 0.0, y: size)]])
    }

    fn builder(simplify: bool) -> WalkGraphBuilder {
        WalkGraphBuilder::new(&AccessConfig { simplify, ..AccessConfig::default() })
    }

    #[test]
    fn shared_vertices_become_one_node() {
        let lines = [
            line_string![(x: 10.0, y: 50.0), (x: 50.0, y: 50.0), (x: 90.0, y: 50.0)],
            line_string![(x: 50.0, y: 10.0), (x: 50.0, y: 50.0), (x: 50.0, y: 90.0)],
        ];
        let graph = builder(false).build(&square(100.0), &lines);
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.graph().degree(1), 4);
        assert!((graph.graph().total_length() - 160.0).abs() < 1e-9);
    }

    #[test]
    fn segments_leaving_the_region_are_dropped() {
        let lines = [line_string![(x: 10.0, y: 10.0), (x: 60.0, y: 10.0), (x: 160.0, y: 10.0)]];
        let graph = builder(false).build(&square(100.0), &lines);
        assert_eq!(graph.node_count(), 2);
        assert!((graph.graph().total_length() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn boundary_vertices_are_inside() {
        let lines = [line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)]];
        let graph = builder(false).build(&square(100.0), &lines);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn nearby_endpoints_are_snapped() {
        let lines = [
            line_string![(x: 10.0, y: 10.0), (x: 20.0, y: 10.0)],
            line_string![(x: 20.1, y: 10.1), (x: 20.0, y: 30.0)],
        ];
        let graph = builder(false).build(&square(100.0), &lines);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn snapping_reaches_across_cell_edges() {
        // 20.24 and 20.26 round into different 0.5 m cells but are 0.02 m apart.
        let lines = [
            line_string![(x: 10.0, y: 10.0), (x: 20.24, y: 10.0)],
            line_string![(x: 20.26, y: 10.0), (x: 30.0, y: 10.0)],
        ];
        let graph = builder(false).build(&square(100.0), &lines);
        assert_eq!(graph.node_count(), 3);
        let d = graph.graph().shortest_distance(0, 2).unwrap();
        assert!((d - 19.98).abs() < 1e-9, "distance {d}");
    }

    #[test]
    fn parallel_edges_keep_the_shortest() {
        let lines = [
            line_string![(x: 10.0, y: 10.0), (x: 40.0, y: 10.0)],
            line_string![(x: 40.0, y: 10.0), (x: 10.0, y: 10.0)],
        ];
        let graph = builder(false).build(&square(100.0), &lines);
        assert_eq!(graph.graph().degree(0), 1);
        assert_eq!(graph.graph().shortest_distance(0, 1), Ok(30.0));
    }

    #[test]
    fn simplify_contracts_interstitial_nodes() {
        let lines = [line_string![(x: 10.0, y: 10.0), (x: 20.0, y: 10.0), (x: 30.0, y: 10.0), (x: 30.0, y: 40.0)]];
        let graph = builder(true).build(&square(100.0), &lines);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.graph().shortest_distance(0, 1), Ok(50.0));
    }

    #[test]
    fn simplify_keeps_junctions() {
        let lines = [
            line_string![(x: 10.0, y: 50.0), (x: 30.0, y: 50.0), (x: 50.0, y: 50.0), (x: 70.0, y: 50.0), (x: 90.0, y: 50.0)],
            line_string![(x: 50.0, y: 50.0), (x: 50.0, y: 90.0)],
        ];
        let graph = builder(true).build(&square(100.0), &lines);
        // Two western/eastern dead ends, the junction, and the northern dead end.
        assert_eq!(graph.node_count(), 4);
        assert!((graph.graph().total_length() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn simplify_anchors_isolated_rings() {
        let ring = [line_string![(x: 10.0, y: 10.0), (x: 20.0, y: 10.0), (x: 20.0, y: 20.0), (x: 10.0, y: 20.0), (x: 10.0, y: 10.0)]];
        let graph = builder(true).build(&square(100.0), &ring);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.graph().edge_count(), 0);
    }

    #[test]
    fn no_lines_build_an_empty_graph() {
        let graph = builder(true).build(&square(100.0), &[]);
        assert!(graph.is_empty());
        assert_eq!(graph.nearest_node(Coord { x: 1.0, y: 1.0 }), None);
    }

    #[test]
    fn nearest_node_is_euclidean() {
        let lines = [line_string![(x: 10.0, y: 10.0), (x: 90.0, y: 10.0)]];
        let graph = builder(false).build(&square(100.0), &lines);
        assert_eq!(graph.nearest_node(Coord { x: 80.0, y: 40.0 }), Some(1));
        assert_eq!(graph.nearest_node(Coord { x: 0.0, y: 0.0 }), Some(0));
    }
}
