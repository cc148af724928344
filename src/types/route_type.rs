use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical transit mode of a stop, collapsed from GTFS (basic and extended) route type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteType {
    Tram,
    Subway,
    Railway,
    Bus,
    Ferry,
    Trolleybus,
}

impl RouteType {
    /// Map a raw route type code. Codes outside the vocabulary are unknown, not an error.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 | 900         => Some(RouteType::Tram),
            1 | 401         => Some(RouteType::Subway),
            2 | 100 | 109 | 400 => Some(RouteType::Railway),
            3 | 700 | 717   => Some(RouteType::Bus),
            4 | 1000        => Some(RouteType::Ferry),
            11              => Some(RouteType::Trolleybus),
            _               => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            RouteType::Tram => "Tram",
            RouteType::Subway => "Subway",
            RouteType::Railway => "Railway",
            RouteType::Bus => "Bus",
            RouteType::Ferry => "Ferry",
            RouteType::Trolleybus => "Trolleybus",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.to_str()) }
}
