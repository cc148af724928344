use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable integer key of a region, shared by every dataset that is joined to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub i64);

impl RegionId {
    #[inline] pub fn get(self) -> i64 { self.0 }

    /// Parse a source key, accepting integers, integral floats and numeric strings ("0101", "12.0").
    pub fn parse_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(RegionId),
            serde_json::Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64))
                    .map(RegionId)
            }
            _ => None,
        }
    }
}

impl From<i64> for RegionId {
    fn from(id: i64) -> Self { Self(id) }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}
