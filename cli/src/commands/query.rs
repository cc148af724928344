use anyhow::{bail, Result};
use livability::{RegionId, Snapshot};
use serde_json::Value;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::QueryArgs) -> Result<()> {
    let snapshot = Snapshot::from_files(&args.green, &args.access)?;

    let report = match (args.id, args.lon, args.lat) {
        (Some(id), _, _) => snapshot.region(RegionId(id))?,
        (None, Some(lon), Some(lat)) => snapshot.region_at(lon, lat)?,
        _ => bail!("[query] Provide either --id or both --lon and --lat"),
    };

    let mut value = serde_json::to_value(&report)?;
    // Unknown mode is shown by name rather than as null.
    if let Some(route_type) = value.pointer_mut("/access/centroid_route_type").filter(|v| v.is_null()) {
        *route_type = Value::String("Unknown".to_string());
    }

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
