mod network;
mod records;
mod region;
mod region_id;
mod route_type;

pub use network::{Network, TransitStop};
pub use records::{AccessRecord, AccessState, CompositeRecord, GreenRecord, Keyed, RegionReport};
pub use region::{GreenSpace, PopulationRecord, Region};
pub use region_id::RegionId;
pub use route_type::RouteType;
