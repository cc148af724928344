use std::{fs::{self, File}, io::{Cursor, Read}, path::{Path, PathBuf}};

use ahash::AHashMap;
use anyhow::{Context, Result};
use geo::Point;
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, DataType, StringChunked}};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::types::{Network, RouteType, TransitStop};

/// A GTFS feed, either unpacked in a directory or as the original zip archive.
enum Feed {
    Dir(PathBuf),
    Zip(ZipArchive<File>),
}

impl Feed {
    fn open(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(Feed::Dir(path.to_path_buf()));
        }
        let file = File::open(path)
            .with_context(|| format!("[io::gtfs] Failed to open GTFS feed: {}", path.display()))?;
        let archive = ZipArchive::new(file)
            .with_context(|| format!("[io::gtfs] {} is neither a directory nor a zip archive", path.display()))?;
        Ok(Feed::Zip(archive))
    }

    fn bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        match self {
            Feed::Dir(dir) => fs::read(dir.join(name))
                .with_context(|| format!("[io::gtfs] Failed to read {name} from {}", dir.display())),
            Feed::Zip(archive) => {
                let mut entry = archive.by_name(name)
                    .with_context(|| format!("[io::gtfs] Archive has no {name}"))?;
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut bytes)
                    .with_context(|| format!("[io::gtfs] Failed to unpack {name}"))?;
                Ok(bytes)
            }
        }
    }

    /// Read one GTFS table with every column as a string.
    fn table(&mut self, name: &str) -> Result<DataFrame> {
        let mut bytes = self.bytes(name)?;
        if bytes.starts_with(b"\xEF\xBB\xBF") {
            bytes.drain(..3);
        }

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .with_context(|| format!("[io::gtfs] Failed to parse {name}"))
    }
}

fn strings<'a>(df: &'a DataFrame, table: &str, column: &str) -> Result<&'a StringChunked> {
    df.column(column)
        .with_context(|| format!("[io::gtfs] {table} has no '{column}' column"))?
        .str()
        .with_context(|| format!("[io::gtfs] {table}.{column} is not text"))
}

/// Read the stops of one GTFS feed, each tagged with `network` and the mode of the routes
/// calling at it (stop -> trip -> route). Stops no trip calls at are dropped; a stop served by
/// several modes takes the smallest route-type code that maps to a [`RouteType`], falling back
/// to an unmapped code only when none of its codes map.
pub fn read_gtfs(path: &Path, network: Network) -> Result<Vec<TransitStop>> {
    let mut feed = Feed::open(path)?;
    let stops = feed.table("stops.txt")?;
    let routes = feed.table("routes.txt")?;
    let trips = feed.table("trips.txt")?;
    let stop_times = feed.table("stop_times.txt")?;

    let route_codes = routes.column("route_type")
        .context("[io::gtfs] routes.txt has no 'route_type' column")?
        .cast(&DataType::Int64)?;
    let route_type: AHashMap<&str, i64> = strings(&routes, "routes.txt", "route_id")?.into_iter()
        .zip(route_codes.i64()?.into_iter())
        .filter_map(|(route, code)| Some((route?, code?)))
        .collect();

    let trip_code: AHashMap<&str, i64> = strings(&trips, "trips.txt", "trip_id")?.into_iter()
        .zip(strings(&trips, "trips.txt", "route_id")?.into_iter())
        .filter_map(|(trip, route)| Some((trip?, *route_type.get(route?)?)))
        .collect();

    // Mapped codes first, then the smaller code.
    let rank = |code: i64| (RouteType::from_code(code).is_none(), code);
    let mut stop_code: AHashMap<&str, i64> = AHashMap::new();
    for (trip, stop) in strings(&stop_times, "stop_times.txt", "trip_id")?.into_iter()
        .zip(strings(&stop_times, "stop_times.txt", "stop_id")?.into_iter())
    {
        let (Some(trip), Some(stop)) = (trip, stop) else { continue };
        let Some(&code) = trip_code.get(trip) else { continue };
        stop_code.entry(stop)
            .and_modify(|c| if rank(code) < rank(*c) { *c = code })
            .or_insert(code);
    }

    let lats = stops.column("stop_lat").context("[io::gtfs] stops.txt has no 'stop_lat' column")?.cast(&DataType::Float64)?;
    let lons = stops.column("stop_lon").context("[io::gtfs] stops.txt has no 'stop_lon' column")?.cast(&DataType::Float64)?;

    let mut result = Vec::with_capacity(stop_code.len());
    let mut unserved = 0usize;
    for ((stop_id, lat), lon) in strings(&stops, "stops.txt", "stop_id")?.into_iter()
        .zip(lats.f64()?.into_iter())
        .zip(lons.f64()?.into_iter())
    {
        let Some(stop_id) = stop_id else { continue };
        let Some(&code) = stop_code.get(stop_id) else {
            unserved += 1;
            continue;
        };
        let (Some(lat), Some(lon)) = (lat, lon) else {
            warn!(stop_id, %network, "[io::gtfs] stop has no coordinates, skipping");
            continue;
        };

        let route_type = RouteType::from_code(code);
        if route_type.is_none() {
            debug!(stop_id, code, "[io::gtfs] unmapped route type");
        }
        result.push(TransitStop { stop_id: stop_id.to_string(), location: Point::new(lon, lat), network, route_type });
    }

    info!(%network, stops = result.len(), unserved, path = %path.display(), "[io::gtfs] loaded stops");
    Ok(result)
}

/// Read the bus and rail feeds and concatenate them, bus first.
pub fn read_transit(bus: &Path, rail: &Path) -> Result<Vec<TransitStop>> {
    let mut stops = read_gtfs(bus, Network::Bus)?;
    stops.extend(read_gtfs(rail, Network::Rail)?);
    Ok(stops)
}
