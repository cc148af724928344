mod geom;
mod locate;
mod overlay;
mod proj;

pub(crate) use geom::Geometries;
pub use locate::PointResolver;
pub use overlay::intersection_areas;
pub use proj::{GeometryProjector, GEOGRAPHIC_CRS};
