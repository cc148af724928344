use std::{collections::{BTreeMap, BTreeSet}, fs::{self, File}, io::BufWriter, path::Path};

use anyhow::{bail, Context, Result};
use ::geojson::{FeatureCollection, GeoJson};
use geo::{Geometry, LineString, MultiLineString, MultiPolygon};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::{
    config::{SourceFields, SourceFixups},
    types::{GreenSpace, Keyed, Region, RegionId},
};

/// Reads a GeoJSON FeatureCollection from `path`.
fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("[io::geojson] Failed to read GeoJSON file: {}", path.display()))?;
    let geojson = text.parse::<GeoJson>()
        .with_context(|| format!("[io::geojson] Failed to parse GeoJSON from {}", path.display()))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => bail!("[io::geojson] {} is not a FeatureCollection", path.display()),
    }
}

/// Convert a GeoJSON geometry to a MultiPolygon; other geometry types yield None.
fn to_multipolygon(geometry: ::geojson::Geometry) -> Result<Option<MultiPolygon<f64>>> {
    let geometry = Geometry::<f64>::try_from(geometry.value)
        .context("[io::geojson] Invalid geometry")?;

    Ok(match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon(vec![polygon])),
        Geometry::MultiPolygon(multi) => Some(multi),
        _ => None,
    })
}

/// Read the region source. Ids come from `fields.region_id` unless the region's name has a remap;
/// features without a usable id, or whose id (after remaps) repeats an earlier feature's, are
/// skipped with a warning. Features without geometry are kept with `boundary = None`.
pub fn read_regions(path: &Path, fields: &SourceFields, fixups: &SourceFixups) -> Result<Vec<Region>> {
    let collection = read_collection(path)?;
    let mut regions = Vec::with_capacity(collection.features.len());
    let mut seen = BTreeSet::new();

    for (i, feature) in collection.features.into_iter().enumerate() {
        let property = |key: &str| feature.properties.as_ref().and_then(|props| props.get(key));

        let name = match property(&fields.region_name) {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let id = fixups.region_id_for(&name)
            .or_else(|| property(&fields.region_id).and_then(RegionId::parse_value));
        let Some(id) = id else {
            warn!(feature = i, name = %name, field = %fields.region_id, "[io::geojson] region has no usable id, skipping");
            continue;
        };

        let boundary = match feature.geometry {
            Some(geometry) => to_multipolygon(geometry)
                .with_context(|| format!("[io::geojson] Region {id} ({name}) in {}", path.display()))?,
            None => None,
        };
        if boundary.is_none() {
            warn!(region_id = %id, name = %name, "[io::geojson] region has no polygon geometry");
        }

        if !seen.insert(id) {
            warn!(region_id = %id, name = %name, "[io::geojson] duplicate region id, skipping");
            continue;
        }
        regions.push(Region::new(id, name, boundary));
    }

    info!(count = regions.len(), path = %path.display(), "[io::geojson] loaded regions");
    Ok(regions)
}

/// Read the green-space source; only polygonal features are kept.
pub fn read_green_spaces(path: &Path) -> Result<Vec<GreenSpace>> {
    let collection = read_collection(path)?;
    let mut spaces = Vec::with_capacity(collection.features.len());

    for (i, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else { continue };
        match to_multipolygon(geometry)? {
            Some(boundary) => spaces.push(GreenSpace { boundary }),
            None => debug!(feature = i, "[io::geojson] green feature is not polygonal, skipping"),
        }
    }

    info!(count = spaces.len(), path = %path.display(), "[io::geojson] loaded green spaces");
    Ok(spaces)
}

/// Read walkable polylines from LineString/MultiLineString features.
pub fn read_walk_lines(path: &Path) -> Result<Vec<LineString<f64>>> {
    let collection = read_collection(path)?;
    let mut lines = Vec::new();

    for feature in collection.features {
        let Some(geometry) = feature.geometry else { continue };
        match Geometry::<f64>::try_from(geometry.value).context("[io::geojson] Invalid walk geometry")? {
            Geometry::LineString(line) => lines.push(line),
            Geometry::MultiLineString(MultiLineString(parts)) => lines.extend(parts),
            _ => {}
        }
    }

    info!(count = lines.len(), path = %path.display(), "[io::geojson] loaded walk lines");
    Ok(lines)
}

/// One GeoJSON feature with the given properties; a missing boundary becomes a null geometry.
pub fn feature(properties: Value, boundary: Option<&MultiPolygon<f64>>) -> Result<Value> {
    let geometry = match boundary {
        Some(shape) => serde_json::to_value(::geojson::Geometry::new(::geojson::Value::from(shape)))
            .context("[io::geojson] Failed to serialize geometry")?,
        None => Value::Null,
    };

    Ok(json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": properties,
    }))
}

/// A FeatureCollection tagged with the geographic reference.
pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "EPSG:4326" } },
        "features": features,
    })
}

/// Write a FeatureCollection to `path` as JSON.
pub fn write_feature_collection(path: &Path, collection: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("[io::geojson] Failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("[io::geojson] Failed to create {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), collection)
        .with_context(|| format!("[io::geojson] Failed to write {}", path.display()))
}

/// Write per-region records as features; each record's properties are its fields, the geometry
/// is the (geographic) boundary of the region with the same id.
pub fn write_records<T: Serialize + Keyed>(path: &Path, records: &[T], regions: &[Region]) -> Result<()> {
    let boundaries = regions.iter()
        .filter_map(|region| region.geometry().map(|shape| (region.id, shape)))
        .collect::<BTreeMap<_, _>>();

    let features = records.iter()
        .map(|record| {
            let properties = serde_json::to_value(record)
                .with_context(|| format!("[io::geojson] Failed to serialize record {}", record.region_id()))?;
            feature(properties, boundaries.get(&record.region_id()).copied())
        })
        .collect::<Result<Vec<_>>>()?;

    write_feature_collection(path, &feature_collection(features))?;
    info!(count = records.len(), path = %path.display(), "[io::geojson] wrote records");
    Ok(())
}

/// Read records written by [`write_records`], along with the region boundaries they carry.
pub fn read_records<T: DeserializeOwned + Keyed>(path: &Path) -> Result<(Vec<Region>, Vec<T>)> {
    let collection = read_collection(path)?;
    let mut regions = Vec::with_capacity(collection.features.len());
    let mut records = Vec::with_capacity(collection.features.len());

    for (i, feature) in collection.features.into_iter().enumerate() {
        let properties = Value::Object(feature.properties.unwrap_or_else(Map::new));
        let record: T = serde_json::from_value(properties)
            .with_context(|| format!("[io::geojson] Feature {i} in {} is not a valid record", path.display()))?;
        let boundary = match feature.geometry {
            Some(geometry) => to_multipolygon(geometry)?,
            None => None,
        };

        regions.push(Region::new(record.region_id(), record.name(), boundary));
        records.push(record);
    }

    Ok((regions, records))
}
