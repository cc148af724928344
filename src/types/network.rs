use std::fmt;

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::types::RouteType;

/// Transit network a stop was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Bus,
    Rail,
}

impl Network {
    pub fn to_str(&self) -> &'static str {
        match self {
            Network::Bus => "bus",
            Network::Rail => "rail",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.to_str()) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitStop {
    pub stop_id: String,
    pub location: Point<f64>, // (lon, lat) on input, metric inside the engine
    pub network: Network,
    pub route_type: Option<RouteType>,
}
