use anyhow::{bail, Result};
use geo::{BoundingRect, LineString, MultiPolygon};
use rstar::{primitives::{GeomWithData, Rectangle}, RTree, AABB};

/// Source of raw walkable polylines for one region.
///
/// Implementations receive the region boundary in the metric reference and return polylines in
/// the same reference. An error means "no usable network" for that region only; the caller
/// records it and moves on. Remote implementations must bound their own retries and timeouts.
pub trait WalkNetworkProvider: Sync {
    fn walk_lines(&self, boundary: &MultiPolygon<f64>) -> Result<Vec<LineString<f64>>>;
}

type IndexedLine = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// In-memory walkable network (metric reference), answered by bounding-box lookups.
#[derive(Debug, Clone)]
pub struct LineNetwork {
    lines: Vec<LineString<f64>>,
    rtree: RTree<IndexedLine>,
}

impl LineNetwork {
    pub fn new(lines: Vec<LineString<f64>>) -> Self {
        let rtree: RTree<IndexedLine> = RTree::bulk_load(
            lines.iter().enumerate()
                .filter_map(|(i, line)| line.bounding_rect()
                    .map(|rect| GeomWithData::new(Rectangle::<[f64; 2]>::from_corners(rect.min().into(), rect.max().into()), i)))
                .collect()
        );
        Self { lines, rtree }
    }

    #[inline] pub fn is_empty(&self) -> bool { self.lines.is_empty() }
}

impl WalkNetworkProvider for LineNetwork {
    fn walk_lines(&self, boundary: &MultiPolygon<f64>) -> Result<Vec<LineString<f64>>> {
        let Some(rect) = boundary.bounding_rect() else { bail!("[walk::network] region has no extent") };
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());

        let mut indices = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|line| line.data)
            .collect::<Vec<_>>();
        indices.sort_unstable();

        Ok(indices.into_iter().map(|i| self.lines[i].clone()).collect())
    }
}
