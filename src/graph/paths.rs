use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{error::{LivabilityError, Result}, graph::WeightedGraph};

/// Min-heap entry for Dijkstra's algorithm.
#[derive(Copy, Clone, Eq, PartialEq)]
struct Entry {
    dist_bits: u64, // f64::to_bits() is monotone for non-negative values
    node: usize,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse so the smallest distance pops first.
        other.dist_bits.cmp(&self.dist_bits)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl WeightedGraph {
    /// Single-source shortest path lengths from `source` to every node.
    /// Unreachable nodes (and, with `limit`, nodes farther than `limit`) are `f64::INFINITY`.
    /// Edge weights must be non-negative.
    pub fn shortest_distances(&self, source: usize, limit: Option<f64>) -> Vec<f64> {
        let mut dist = vec![f64::INFINITY; self.node_count()];
        self.dijkstra(source, limit, None, &mut dist);
        dist
    }

    /// Shortest path length between two nodes.
    pub fn shortest_distance(&self, source: usize, target: usize) -> Result<f64> {
        let mut dist = vec![f64::INFINITY; self.node_count()];
        self.dijkstra(source, None, Some(target), &mut dist);
        match dist[target] {
            d if d.is_finite() => Ok(d),
            _ => Err(LivabilityError::NoPath { from: source, to: target }),
        }
    }

    fn dijkstra(&self, source: usize, limit: Option<f64>, target: Option<usize>, dist: &mut [f64]) {
        let limit = limit.unwrap_or(f64::INFINITY);
        let mut settled = vec![false; self.node_count()];
        let mut heap = BinaryHeap::new();

        dist[source] = 0.0;
        heap.push(Entry { dist_bits: 0f64.to_bits(), node: source });

        while let Some(Entry { dist_bits, node }) = heap.pop() {
            if settled[node] { continue }
            settled[node] = true;
            if target == Some(node) { break }

            let d = f64::from_bits(dist_bits);
            for (next, weight) in self.edges_with_weights(node) {
                debug_assert!(weight >= 0.0, "negative edge weight {weight}");
                let candidate = d + weight;
                if candidate > limit || candidate >= dist[next] { continue }
                dist[next] = candidate;
                heap.push(Entry { dist_bits: candidate.to_bits(), node: next });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //  0 --1.0-- 1 --1.0-- 2
    //  |                   |
    //  +-------5.0---------+        3 --2.0-- 4   (separate component)
    fn make_test_graph() -> WeightedGraph {
        WeightedGraph::from_edge_list(5, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 5.0), (3, 4, 2.0)])
    }

    #[test]
    fn distances_take_the_cheaper_route() {
        let dist = make_test_graph().shortest_distances(0, None);
        assert_eq!(&dist[..3], &[0.0, 1.0, 2.0]);
        assert!(dist[3].is_infinite() && dist[4].is_infinite());
    }

    #[test]
    fn limit_cuts_off_far_nodes() {
        let dist = make_test_graph().shortest_distances(0, Some(1.5));
        assert_eq!(dist[1], 1.0);
        assert!(dist[2].is_infinite());
    }

    #[test]
    fn limit_is_inclusive() {
        let dist = make_test_graph().shortest_distances(0, Some(2.0));
        assert_eq!(dist[2], 2.0);
    }

    #[test]
    fn point_to_point_distance() {
        let graph = make_test_graph();
        assert_eq!(graph.shortest_distance(2, 0), Ok(2.0));
        assert_eq!(graph.shortest_distance(3, 3), Ok(0.0));
    }

    #[test]
    fn disconnected_pair_is_no_path() {
        let graph = make_test_graph();
        assert_eq!(graph.shortest_distance(0, 4), Err(LivabilityError::NoPath { from: 0, to: 4 }));
    }
}
