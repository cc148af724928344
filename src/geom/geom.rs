use geo::{BoundingRect, Coord, MultiPolygon, Rect};
use rstar::{primitives::{GeomWithData, Rectangle}, RTree, RTreeObject, AABB};

/// Bounding rectangle of a shape, tagged with the shape's slot.
type IndexedRect = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// An indexed collection of MultiPolygons. Empty shapes keep their slot but are never returned by queries.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<IndexedRect>,
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    pub(crate) fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect()
                        .map(|rect| GeomWithData::new(Rectangle::from_corners(rect.min().into(), rect.max().into()), i)))
                    .collect()
            ),
            shapes,
        }
    }

    /// Get the number of shapes (including empty ones).
    #[inline] pub(crate) fn len(&self) -> usize { self.shapes.len() }

    /// Get a reference to the list of shapes.
    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Indices of shapes whose bounding box intersects `rect`, in ascending order.
    pub(crate) fn query(&self, rect: &Rect<f64>) -> Vec<usize> {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut indices = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect::<Vec<_>>();
        indices.sort_unstable();
        indices
    }

    /// Indices of shapes whose bounding box contains `coord`, in ascending order.
    pub(crate) fn query_point(&self, coord: Coord<f64>) -> Vec<usize> {
        self.query(&Rect::new(coord, coord))
    }

    /// Bounding rectangle of all non-empty shapes.
    pub(crate) fn bounds(&self) -> Option<Rect<f64>> {
        if self.rtree.size() == 0 { return None }
        let envelope = self.rtree.root().envelope();
        Some(Rect::new(Coord::from(envelope.lower()), Coord::from(envelope.upper())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Coord};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size), (x: x, y: y),
        ]])
    }

    #[test]
    fn empty_shapes_keep_their_slot() {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 1.0), MultiPolygon(vec![]), square(5.0, 5.0, 1.0)]);
        assert_eq!(geoms.len(), 3);
        assert_eq!(geoms.query_point(Coord { x: 5.5, y: 5.5 }), vec![2]);
    }

    #[test]
    fn query_returns_sorted_indices() {
        let geoms = Geometries::new(vec![square(2.0, 0.0, 2.0), square(0.0, 0.0, 2.0), square(9.0, 9.0, 1.0)]);
        let rect = Rect::new(Coord { x: 1.0, y: 1.0 }, Coord { x: 3.0, y: 1.5 });
        assert_eq!(geoms.query(&rect), vec![0, 1]);
    }

    #[test]
    fn bounds_cover_all_shapes() {
        let geoms = Geometries::new(vec![square(-1.0, 0.0, 1.0), square(3.0, 4.0, 2.0)]);
        let bounds = geoms.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: -1.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 5.0, y: 6.0 });
        assert!(Geometries::new(vec![]).bounds().is_none());
        assert!(Geometries::new(vec![MultiPolygon(vec![])]).bounds().is_none());
    }
}
