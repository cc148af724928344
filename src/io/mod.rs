//! Readers for the external sources and writers for the batch outputs, organized by format.
//!
//! - `geojson` - region, green-space and walk-network sources; record feature collections
//! - `csv` - population table
//! - `gtfs` - transit feeds (directory or zip archive)

mod csv;
mod geojson;
mod gtfs;

pub use csv::read_population;
pub use geojson::{
    feature, feature_collection, read_green_spaces, read_records, read_regions, read_walk_lines,
    write_feature_collection, write_records,
};
pub use gtfs::{read_gtfs, read_transit};
