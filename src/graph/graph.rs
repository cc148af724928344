/// A weighted, undirected graph in compressed sparse row format.
/// Each undirected edge is stored once per endpoint.
#[derive(Debug, Default, Clone)]
pub struct WeightedGraph {
    size: usize,
    offsets: Vec<u32>,
    edges: Vec<u32>,
    edge_weights: Vec<f64>,
}

impl WeightedGraph {
    /// Construct a graph from adjacency lists and matching edge weights.
    pub fn new(num_nodes: usize, edges: &[Vec<u32>], edge_weights: &[Vec<f64>]) -> Self {
        assert!(edges.len() == num_nodes, "edges.len() must equal num_nodes");
        assert!(edge_weights.len() == num_nodes, "edge_weights.len() must equal num_nodes");
        edges.iter().zip(edge_weights.iter()).enumerate().for_each(|(i, (edges, weights))| {
            assert!(edges.len() == weights.len(), "edges[{i}].len() must equal edge_weights[{i}].len()");
        });

        Self {
            size: num_nodes,
            offsets: std::iter::once(0u32).chain(
                edges.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            edges: edges.iter().flatten().copied().collect(),
            edge_weights: edge_weights.iter().flatten().copied().collect(),
        }
    }

    /// Construct a graph from a list of undirected `(u, v, weight)` edges.
    pub fn from_edge_list(num_nodes: usize, list: &[(u32, u32, f64)]) -> Self {
        let mut edges = vec![Vec::new(); num_nodes];
        let mut weights = vec![Vec::new(); num_nodes];
        for &(u, v, w) in list {
            edges[u as usize].push(v);
            weights[u as usize].push(w);
            if u != v {
                edges[v as usize].push(u);
                weights[v as usize].push(w);
            }
        }
        Self::new(num_nodes, &edges, &weights)
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.size }

    /// Get the number of directed edge entries (twice the undirected edge count).
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Check if the graph has no nodes.
    #[inline] pub fn is_empty(&self) -> bool { self.size == 0 }

    /// Get the range of edges for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get an iterator over the neighbors and edge weights of a given node.
    #[inline]
    pub fn edges_with_weights(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.range(node).map(move |v| (self.edges[v] as usize, self.edge_weights[v]))
    }

    /// Sum of undirected edge weights.
    pub fn total_length(&self) -> f64 {
        self.edge_weights.iter().sum::<f64>() / 2.0
    }
}
