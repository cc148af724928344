use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::RegionId;

/// ETRS89 / UTM zone 30N (EPSG:25830), the metric reference of the source city.
pub const DEFAULT_METRIC_CRS: &str = "+proj=utm +zone=30 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs +type=crs";

/// Top-level engine configuration. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivabilityConfig {
    /// PROJ.4 definition of the metric reference, or "auto" for a UTM zone chosen from the data.
    pub metric_crs: String,
    pub access: AccessConfig,
    pub weights: CompositeWeights,
    pub fields: SourceFields,
    pub fixups: SourceFixups,
}

impl Default for LivabilityConfig {
    fn default() -> Self {
        Self {
            metric_crs: DEFAULT_METRIC_CRS.to_string(),
            access: AccessConfig::default(),
            weights: CompositeWeights::default(),
            fields: SourceFields::default(),
            fixups: SourceFixups::default(),
        }
    }
}

impl LivabilityConfig {
    /// Read a JSON config file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[config] Failed to open config file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[config] Failed to parse config file: {}", path.display()))
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Walk graph and accessibility scoring constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Walking distance (m) within which a node counts as covered by a stop.
    pub threshold_distance: f64,
    /// Average walking speed (m/s) used to turn distances into times.
    pub average_walk_speed: f64,
    /// Polyline endpoints closer than this (m) become the same graph node.
    pub snap_tolerance: f64,
    /// Contract chains of degree-2 nodes into single edges.
    pub simplify: bool,
    /// Score regions on the rayon thread pool.
    pub parallel: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            threshold_distance: 300.0,
            average_walk_speed: 1.5,
            snap_tolerance: 0.5,
            simplify: true,
            parallel: false,
        }
    }
}

/// Weights of the composite index. Values outside [0, 1] are accepted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub alpha: f64,
    pub beta: f64,
}

impl CompositeWeights {
    pub fn new(alpha: f64, beta: f64) -> Self { Self { alpha, beta } }
}

impl Default for CompositeWeights {
    fn default() -> Self { Self { alpha: 0.7, beta: 0.5 } }
}

/// Property and column names of the external sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFields {
    pub region_id: String,
    pub region_name: String,
    pub population_id: String,
    pub population_name: String,
    pub population: String,
}

impl Default for SourceFields {
    fn default() -> Self {
        Self {
            region_id: "coddistbar".to_string(),
            region_name: "nombre".to_string(),
            population_id: "coddistbar".to_string(),
            population_name: "nombre_barrio".to_string(),
            population: "population".to_string(),
        }
    }
}

/// Assign `id` to every row whose name is `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRemap {
    pub name: String,
    pub id: RegionId,
}

/// Population row added when its region id is missing from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectedPopulation {
    pub id: RegionId,
    pub name: String,
    pub population: f64,
}

/// Known corrections to the upstream datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFixups {
    pub region_remaps: Vec<NameRemap>,
    pub population_remaps: Vec<NameRemap>,
    pub injected_population: Vec<InjectedPopulation>,
}

impl SourceFixups {
    /// No corrections at all.
    pub fn none() -> Self {
        Self { region_remaps: Vec::new(), population_remaps: Vec::new(), injected_population: Vec::new() }
    }

    #[inline]
    pub fn region_id_for(&self, name: &str) -> Option<RegionId> {
        self.region_remaps.iter().find(|remap| remap.name == name).map(|remap| remap.id)
    }

    #[inline]
    pub fn population_id_for(&self, name: &str) -> Option<RegionId> {
        self.population_remaps.iter().find(|remap| remap.name == name).map(|remap| remap.id)
    }
}

impl Default for SourceFixups {
    fn default() -> Self {
        Self {
            region_remaps: vec![NameRemap { name: "MAHUELLA-TAULADELLA".to_string(), id: RegionId(1234) }],
            population_remaps: vec![NameRemap { name: "MAUELLA".to_string(), id: RegionId(1234) }],
            injected_population: vec![InjectedPopulation {
                id: RegionId(175),
                name: "RAFALELL-VISTABELLA".to_string(),
                population: 59.0,
            }],
        }
    }
}
