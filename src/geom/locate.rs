use geo::{Contains, Coord, MultiPolygon, Point};

use crate::{geom::Geometries, types::{Region, RegionId}};

/// Point-in-polygon lookup over a region collection in the geographic reference.
#[derive(Debug, Clone)]
pub struct PointResolver {
    ids: Vec<RegionId>,
    geoms: Geometries,
}

impl PointResolver {
    /// Index `regions`; regions without geometry are kept but can never match.
    pub fn new(regions: &[Region]) -> Self {
        Self {
            ids: regions.iter().map(|region| region.id).collect(),
            geoms: Geometries::new(regions.iter()
                .map(|region| region.geometry().cloned().unwrap_or_else(|| MultiPolygon(vec![])))
                .collect()),
        }
    }

    /// Position (in the input order) of the first region whose interior contains the point.
    pub fn resolve_index(&self, lon: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lon, lat);
        self.geoms.query_point(Coord { x: lon, y: lat }).into_iter()
            .find(|&idx| self.geoms.shapes()[idx].contains(&point))
    }

    /// Id of the first region whose interior contains `(lon, lat)`, or None when outside all of them.
    /// Points lying exactly on a boundary, shared or not, are not contained and resolve to None.
    /// Overlapping interiors resolve to the earlier region.
    #[inline]
    pub fn resolve(&self, lon: f64, lat: f64) -> Option<RegionId> {
        self.resolve_index(lon, lat).map(|idx| self.ids[idx])
    }

    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}
