use geo::{Coord, MapCoords, Rect};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::error::{LivabilityError, Result};

/// PROJ.4 definition of the geographic reference used for every input and output (WGS84 lon/lat).
pub const GEOGRAPHIC_CRS: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Moves geometries between the geographic reference (degrees) and a planar metric reference (meters).
/// All area and length arithmetic happens on the metric side.
pub struct GeometryProjector {
    geographic: Proj4,
    metric: Proj4,
    metric_def: String,
}

impl GeometryProjector {
    /// Build a projector to the metric reference given by a PROJ.4 string.
    pub fn new(metric_def: &str) -> Result<Self> {
        let build = |proj_string: &str| Proj4::from_proj_string(proj_string)
            .map_err(|e| LivabilityError::Projection(format!("failed to build PROJ.4 '{proj_string}': {e}")));

        Ok(Self {
            geographic: build(GEOGRAPHIC_CRS)?,
            metric: build(metric_def)?,
            metric_def: metric_def.to_string(),
        })
    }

    /// Build a projector from a config value: a PROJ.4 string, or "auto" to pick the UTM zone
    /// containing the center of `bounds` (lon/lat).
    pub fn from_config(metric_crs: &str, bounds: Option<Rect<f64>>) -> Result<Self> {
        if metric_crs.eq_ignore_ascii_case("auto") {
            Self::new(&Self::utm_proj4(bounds))
        } else {
            Self::new(metric_crs)
        }
    }

    /// PROJ.4 string of the UTM zone containing the center of `bounds`.
    /// - north: +zone=zz, south: +zone=zz +south
    pub fn utm_proj4(bounds: Option<Rect<f64>>) -> String {
        let center = bounds.map(|b| b.center())
            .unwrap_or(Coord { x: -3.0, y: 40.0 }); // Iberian fallback, zone 30N

        let zone = (((center.x + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u32;
        let south = if center.y >= 0.0 { "" } else { " +south" };

        format!("+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs +type=crs")
    }

    /// The PROJ.4 definition of the metric reference.
    #[inline] pub fn metric_def(&self) -> &str { &self.metric_def }

    /// Reproject a single coordinate from lon/lat degrees to meters.
    pub fn forward(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(&self.geographic, &self.metric, &mut point)
            .map_err(|e| LivabilityError::Projection(format!("({}, {}) to metric: {e}", coord.x, coord.y)))?;
        Ok(Coord { x: point.0, y: point.1 })
    }

    /// Reproject a single coordinate from meters to lon/lat degrees.
    pub fn inverse(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = (coord.x, coord.y, 0.0);
        transform(&self.metric, &self.geographic, &mut point)
            .map_err(|e| LivabilityError::Projection(format!("({}, {}) to geographic: {e}", coord.x, coord.y)))?;
        Ok(Coord { x: point.0.to_degrees(), y: point.1.to_degrees() })
    }

    /// Reproject any geometry from the geographic to the metric reference.
    pub fn to_metric<G>(&self, geometry: &G) -> Result<G>
    where G: MapCoords<f64, f64, Output = G>
    {
        geometry.try_map_coords(|coord| self.forward(coord))
    }

    /// Reproject any geometry from the metric back to the geographic reference.
    pub fn to_geographic<G>(&self, geometry: &G) -> Result<G>
    where G: MapCoords<f64, f64, Output = G>
    {
        geometry.try_map_coords(|coord| self.inverse(coord))
    }

    /// Reproject a collection of geometries to the metric reference.
    pub fn all_to_metric<G>(&self, geometries: &[G]) -> Result<Vec<G>>
    where G: MapCoords<f64, f64, Output = G>
    {
        geometries.iter().map(|geometry| self.to_metric(geometry)).collect()
    }
}
